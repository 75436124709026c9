use crate::api::{Employee, EmployeeStatus, EmployeeUpdate};
use crate::errors::Result;
use log::info;
use std::path::Path;

#[allow(clippy::module_inception)]
mod database;
pub use database::Database;

pub mod sqlite;

pub const EMPLOYEE_NOT_FOUND: &str = "Сотрудник не найден";
pub const EMPLOYEE_EXISTS: &str = "Сотрудник уже существует";
pub const TIP_NOT_FOUND: &str = "Чаевые не найдены";

/// Staff the server starts with when no roster file is given
pub fn default_roster() -> Vec<Employee> {
    vec![
        Employee {
            id: "ALEX001".to_string(),
            name: "Алексей".to_string(),
            surname: Some("Петров".to_string()),
            phone: Some("+7 999 111 22 33".to_string()),
            status: EmployeeStatus::Active,
            photo: None,
            goal: "Коплю на обучение в кулинарной школе".to_string(),
        },
        Employee {
            id: "ANNA002".to_string(),
            name: "Анна".to_string(),
            surname: Some("Иванова".to_string()),
            phone: Some("+7 999 123 45 67".to_string()),
            status: EmployeeStatus::Active,
            photo: None,
            goal: "Накопить на отпуск".to_string(),
        },
        Employee {
            id: "MIKHAIL003".to_string(),
            name: "Михаил".to_string(),
            surname: Some("Сидоров".to_string()),
            phone: Some("+7 999 234 56 78".to_string()),
            status: EmployeeStatus::Inactive,
            photo: None,
            goal: "Покупка автомобиля".to_string(),
        },
    ]
}

/// Read a roster from a JSON array of employees
pub fn load_roster(path: &Path) -> Result<Vec<Employee>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Insert the roster if the database has no employee yet.
///
/// Returns the number of employees inserted.
pub fn seed_employees(db: &mut dyn Database, roster: &[Employee]) -> Result<usize> {
    if !db.list_employees()?.is_empty() {
        return Ok(0);
    }
    for employee in roster {
        db.insert_employee(employee)?;
    }
    info!("Seeded {} employees", roster.len());
    Ok(roster.len())
}

/// Apply the fields present in the update to the employee
pub(crate) fn apply_update(employee: &mut Employee, update: &EmployeeUpdate) {
    if let Some(goal) = &update.goal {
        employee.goal = goal.clone();
    }
    if let Some(status) = update.status {
        employee.status = status;
    }
    if let Some(photo) = &update.photo {
        employee.photo = Some(photo.clone());
    }
    if let Some(phone) = &update.phone {
        employee.phone = Some(phone.clone());
    }
}

pub mod mock {

    use super::*;
    use crate::api::{Lead, TipSubmission};
    use crate::errors::Error;

    /// In-memory database, used by tests
    #[derive(Default)]
    pub struct MockDB {
        employees: Vec<Employee>,
        leads: Vec<Lead>,
        tips: Vec<TipSubmission>,
    }

    impl Database for MockDB {
        fn new() -> Result<Self> {
            Ok(MockDB::default())
        }

        fn list_employees(&self) -> Result<Vec<Employee>> {
            Ok(self.employees.clone())
        }

        fn get_employee(&self, id: &str) -> Result<Employee> {
            self.employees
                .iter()
                .find(|employee| employee.id == id)
                .cloned()
                .ok_or_else(|| Error::NotFound(EMPLOYEE_NOT_FOUND.to_string()))
        }

        fn insert_employee(&mut self, employee: &Employee) -> Result<()> {
            if self.employees.iter().any(|e| e.id == employee.id) {
                return Err(Error::Validation(EMPLOYEE_EXISTS.to_string()));
            }
            self.employees.push(employee.clone());
            Ok(())
        }

        fn update_employee(&mut self, id: &str, update: &EmployeeUpdate) -> Result<Employee> {
            let employee = self
                .employees
                .iter_mut()
                .find(|employee| employee.id == id)
                .ok_or_else(|| Error::NotFound(EMPLOYEE_NOT_FOUND.to_string()))?;
            apply_update(employee, update);
            Ok(employee.clone())
        }

        fn insert_lead(&mut self, lead: &Lead) -> Result<()> {
            self.leads.push(lead.clone());
            Ok(())
        }

        fn list_leads(&self) -> Result<Vec<Lead>> {
            Ok(self.leads.clone())
        }

        fn insert_tip(&mut self, tip: &TipSubmission) -> Result<()> {
            self.tips.push(tip.clone());
            Ok(())
        }

        fn get_tip(&self, id: &str) -> Result<TipSubmission> {
            self.tips
                .iter()
                .find(|tip| tip.id == id)
                .cloned()
                .ok_or_else(|| Error::NotFound(TIP_NOT_FOUND.to_string()))
        }

        fn list_tips(&self) -> Result<Vec<TipSubmission>> {
            Ok(self.tips.clone())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::api::RecipientType;
        use chrono::Utc;

        fn tip(id: &str, code: &str, amount: i64) -> TipSubmission {
            TipSubmission {
                id: id.to_string(),
                code: code.to_string(),
                amount,
                rating: 5,
                comment: None,
                recipient_type: RecipientType::Team,
                waiter_id: None,
                waiter_name: None,
                restaurant_name: None,
                created_at: Utc::now(),
            }
        }

        #[test]
        fn test_mock_db() {
            let mut db = MockDB::new().unwrap();
            assert_eq!(seed_employees(&mut db, &default_roster()).unwrap(), 3);
            assert_eq!(seed_employees(&mut db, &default_roster()).unwrap(), 0);

            assert_eq!(db.get_employee("ANNA002").unwrap().name, "Анна");
            assert!(matches!(db.get_employee("NOBODY"), Err(Error::NotFound(_))));
            assert!(matches!(
                db.insert_employee(&default_roster()[0]),
                Err(Error::Validation(_))
            ));

            db.insert_tip(&tip("a", "TEST001", 100)).unwrap();
            db.insert_tip(&tip("b", "TEST002", 200)).unwrap();
            db.insert_tip(&tip("c", "TEST001", 300)).unwrap();

            let amounts: Vec<i64> = db.list_tips().unwrap().iter().map(|t| t.amount).collect();
            assert_eq!(amounts, vec![100, 200, 300]);
            assert_eq!(db.get_tip("b").unwrap().amount, 200);
            assert!(matches!(db.get_tip("z"), Err(Error::NotFound(_))));
        }

        #[test]
        fn test_mock_update_employee() {
            let mut db = MockDB::new().unwrap();
            seed_employees(&mut db, &default_roster()).unwrap();

            let update = EmployeeUpdate {
                status: Some(EmployeeStatus::Inactive),
                goal: Some("Новая цель".to_string()),
                ..Default::default()
            };
            let updated = db.update_employee("ALEX001", &update).unwrap();
            assert_eq!(updated.status, EmployeeStatus::Inactive);
            assert_eq!(updated.goal, "Новая цель");
            assert_eq!(updated.surname.as_deref(), Some("Петров"));
            assert_eq!(db.get_employee("ALEX001").unwrap(), updated);

            assert!(matches!(
                db.update_employee("NOBODY", &update),
                Err(Error::NotFound(_))
            ));
        }
    }
}
