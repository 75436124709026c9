use crate::api::{Employee, EmployeeStatus, EmployeeUpdate, Lead, RecipientType, TipSubmission};
use crate::database::{apply_update, Database, EMPLOYEE_EXISTS, EMPLOYEE_NOT_FOUND, TIP_NOT_FOUND};
use crate::errors::{Error, Result};
use log::debug;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// Contains the SQL queries used to interact with the database
pub mod sql_queries {
    /// `seq` keeps insertion order, `id` is the identifier exposed through the API
    pub const CREATE_TABLES: &str = "
        CREATE TABLE IF NOT EXISTS employees (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            surname TEXT,
            phone TEXT,
            status TEXT NOT NULL,
            photo TEXT,
            goal TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS leads (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            workplace TEXT NOT NULL,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS tips (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            code TEXT NOT NULL,
            amount INTEGER NOT NULL,
            rating INTEGER NOT NULL,
            comment TEXT,
            recipient_type TEXT NOT NULL,
            waiter_id TEXT,
            waiter_name TEXT,
            restaurant_name TEXT,
            created_at TEXT NOT NULL
        );";

    pub const INSERT_EMPLOYEE: &str = "INSERT INTO employees (id, name, surname, phone, status, photo, goal) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";
    pub const SELECT_EMPLOYEES: &str =
        "SELECT id, name, surname, phone, status, photo, goal FROM employees ORDER BY seq";
    pub const SELECT_EMPLOYEE: &str =
        "SELECT id, name, surname, phone, status, photo, goal FROM employees WHERE id = ?1";
    pub const UPDATE_EMPLOYEE: &str =
        "UPDATE employees SET status = ?2, photo = ?3, phone = ?4, goal = ?5 WHERE id = ?1";

    pub const INSERT_LEAD: &str = "INSERT INTO leads (id, workplace, name, phone, email, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
    pub const SELECT_LEADS: &str =
        "SELECT id, workplace, name, phone, email, created_at FROM leads ORDER BY seq";

    pub const INSERT_TIP: &str = "INSERT INTO tips (id, code, amount, rating, comment, recipient_type, waiter_id, waiter_name, restaurant_name, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";
    pub const SELECT_TIPS: &str = "SELECT id, code, amount, rating, comment, recipient_type, waiter_id, waiter_name, restaurant_name, created_at FROM tips ORDER BY seq";
    pub const SELECT_TIP: &str = "SELECT id, code, amount, rating, comment, recipient_type, waiter_id, waiter_name, restaurant_name, created_at FROM tips WHERE id = ?1";
}

pub struct SQLiteConnection {
    conn: Connection,
}

impl SQLiteConnection {
    /// Open (or create) the database stored at the given path.
    ///
    /// `:memory:` opens a private in-memory database.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = if path.as_os_str() == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(sql_queries::CREATE_TABLES)?;
        debug!("Database schema ready");
        Ok(SQLiteConnection { conn })
    }
}

impl Database for SQLiteConnection {
    fn new() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn list_employees(&self) -> Result<Vec<Employee>> {
        let mut stmt = self.conn.prepare(sql_queries::SELECT_EMPLOYEES)?;
        let rows = stmt.query_map([], employee_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_employee(&self, id: &str) -> Result<Employee> {
        select_employee(&self.conn, id)
    }

    fn insert_employee(&mut self, employee: &Employee) -> Result<()> {
        let inserted = self.conn.execute(
            sql_queries::INSERT_EMPLOYEE,
            params![
                employee.id,
                employee.name,
                employee.surname,
                employee.phone,
                employee.status,
                employee.photo,
                employee.goal
            ],
        );
        match inserted {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::Validation(EMPLOYEE_EXISTS.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update_employee(&mut self, id: &str, update: &EmployeeUpdate) -> Result<Employee> {
        let tx = self.conn.transaction()?;
        let mut employee = select_employee(&tx, id)?;
        apply_update(&mut employee, update);
        tx.execute(
            sql_queries::UPDATE_EMPLOYEE,
            params![
                employee.id,
                employee.status,
                employee.photo,
                employee.phone,
                employee.goal
            ],
        )?;
        tx.commit()?;
        Ok(employee)
    }

    fn insert_lead(&mut self, lead: &Lead) -> Result<()> {
        self.conn.execute(
            sql_queries::INSERT_LEAD,
            params![
                lead.id,
                lead.workplace,
                lead.name,
                lead.phone,
                lead.email,
                lead.created_at
            ],
        )?;
        Ok(())
    }

    fn list_leads(&self) -> Result<Vec<Lead>> {
        let mut stmt = self.conn.prepare(sql_queries::SELECT_LEADS)?;
        let rows = stmt.query_map([], |row| {
            Ok(Lead {
                id: row.get(0)?,
                workplace: row.get(1)?,
                name: row.get(2)?,
                phone: row.get(3)?,
                email: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn insert_tip(&mut self, tip: &TipSubmission) -> Result<()> {
        self.conn.execute(
            sql_queries::INSERT_TIP,
            params![
                tip.id,
                tip.code,
                tip.amount,
                tip.rating,
                tip.comment,
                tip.recipient_type,
                tip.waiter_id,
                tip.waiter_name,
                tip.restaurant_name,
                tip.created_at
            ],
        )?;
        Ok(())
    }

    fn get_tip(&self, id: &str) -> Result<TipSubmission> {
        self.conn
            .query_row(sql_queries::SELECT_TIP, params![id], tip_from_row)
            .optional()?
            .ok_or_else(|| Error::NotFound(TIP_NOT_FOUND.to_string()))
    }

    fn list_tips(&self) -> Result<Vec<TipSubmission>> {
        let mut stmt = self.conn.prepare(sql_queries::SELECT_TIPS)?;
        let rows = stmt.query_map([], tip_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn select_employee(conn: &Connection, id: &str) -> Result<Employee> {
    conn.query_row(sql_queries::SELECT_EMPLOYEE, params![id], employee_from_row)
        .optional()?
        .ok_or_else(|| Error::NotFound(EMPLOYEE_NOT_FOUND.to_string()))
}

fn employee_from_row(row: &Row) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get(0)?,
        name: row.get(1)?,
        surname: row.get(2)?,
        phone: row.get(3)?,
        status: row.get(4)?,
        photo: row.get(5)?,
        goal: row.get(6)?,
    })
}

fn tip_from_row(row: &Row) -> rusqlite::Result<TipSubmission> {
    Ok(TipSubmission {
        id: row.get(0)?,
        code: row.get(1)?,
        amount: row.get(2)?,
        rating: row.get(3)?,
        comment: row.get(4)?,
        recipient_type: row.get(5)?,
        waiter_id: row.get(6)?,
        waiter_name: row.get(7)?,
        restaurant_name: row.get(8)?,
        created_at: row.get(9)?,
    })
}

impl ToSql for EmployeeStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for EmployeeStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let status = value.as_str()?;
        EmployeeStatus::parse(status)
            .ok_or_else(|| FromSqlError::Other(format!("unknown employee status '{}'", status).into()))
    }
}

impl ToSql for RecipientType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for RecipientType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let kind = value.as_str()?;
        RecipientType::parse(kind)
            .ok_or_else(|| FromSqlError::Other(format!("unknown recipient type '{}'", kind).into()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::database::{default_roster, seed_employees};
    use chrono::{TimeZone, Utc};

    fn tip(id: &str, code: &str, rating: u8) -> TipSubmission {
        TipSubmission {
            id: id.to_string(),
            code: code.to_string(),
            amount: 250,
            rating,
            comment: Some("Спасибо!".to_string()),
            recipient_type: RecipientType::Waiter,
            waiter_id: Some("ALEX001".to_string()),
            waiter_name: Some("Алексей Петров".to_string()),
            restaurant_name: Some("Ресторан \"У Моря\"".to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 12, 19, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_tips_round_trip() {
        let mut db = SQLiteConnection::new().unwrap();
        db.insert_tip(&tip("first", "TEST001", 5)).unwrap();
        db.insert_tip(&tip("second", "TEST002", 3)).unwrap();
        db.insert_tip(&tip("third", "TEST001", 4)).unwrap();

        assert_eq!(db.get_tip("second").unwrap(), tip("second", "TEST002", 3));
        assert!(matches!(db.get_tip("missing"), Err(Error::NotFound(_))));

        let ids: Vec<_> = db.list_tips().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_employees() {
        let mut db = SQLiteConnection::new().unwrap();
        seed_employees(&mut db, &default_roster()).unwrap();

        let employees = db.list_employees().unwrap();
        assert_eq!(employees, default_roster());
        assert_eq!(
            db.get_employee("MIKHAIL003").unwrap().status,
            EmployeeStatus::Inactive
        );
        assert!(matches!(
            db.insert_employee(&default_roster()[1]),
            Err(Error::Validation(_))
        ));

        let update = EmployeeUpdate {
            status: Some(EmployeeStatus::Active),
            photo: Some("/photos/mikhail.jpg".to_string()),
            ..Default::default()
        };
        let updated = db.update_employee("MIKHAIL003", &update).unwrap();
        assert_eq!(updated.status, EmployeeStatus::Active);
        assert_eq!(db.get_employee("MIKHAIL003").unwrap(), updated);
        assert!(matches!(
            db.update_employee("NOBODY", &update),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_leads() {
        let mut db = SQLiteConnection::new().unwrap();
        let lead = Lead {
            id: "lead1".to_string(),
            workplace: "Кафе".to_string(),
            name: "Ольга".to_string(),
            phone: "+7 900 000 00 00".to_string(),
            email: "olga@example.com".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 12, 19, 9, 0, 0).unwrap(),
        };
        db.insert_lead(&lead).unwrap();
        assert_eq!(db.list_leads().unwrap(), vec![lead]);
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tipjar.sqlite3");

        {
            let mut db = SQLiteConnection::open(&path).unwrap();
            db.insert_tip(&tip("kept", "ORDER123", 5)).unwrap();
        }

        let db = SQLiteConnection::open(&path).unwrap();
        assert_eq!(db.get_tip("kept").unwrap().code, "ORDER123");
    }
}
