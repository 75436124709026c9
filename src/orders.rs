// Orders come from a deterministic mock keyed by the order code

use crate::api::{
    EmployeeStatus, Order, OrderData, OrderItem, Recipient, TeamRecipient, WaiterRecipient,
};
use crate::database::Database;
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use regex::Regex;
use std::sync::OnceLock;

pub const ORDER_NOT_FOUND: &str = "Заказ не найден";
pub const MISSING_CODE: &str = "Код заказа не указан";

pub const TEAM_NAME: &str = "Команда ресторана";
pub const TEAM_GOAL: &str = "Улучшение сервиса и качества обслуживания";

/// Codes starting with this are tips for the whole team
pub const TEAM_PREFIX: &str = "TEAM";

const RESTAURANT: &str = "Ресторан \"У Моря\"";
const TABLE_NUMBER: &str = "15";

fn code_format() -> &'static Regex {
    static FORMAT: OnceLock<Regex> = OnceLock::new();
    FORMAT.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{3,32}$").expect("valid order code regex"))
}

/// Waiter name, waiter id and bill amount for a code
fn mock_details(code: &str) -> (Option<(&'static str, &'static str)>, u64) {
    match code {
        "TEST001" => (Some(("Алексей Петров", "ALEX001")), 2500),
        "TEST002" => (Some(("Михаил Сидоров", "MIKHAIL003")), 3200),
        "TEST003" => (Some(("Анна Иванова", "ANNA002")), 1800),
        c if c.starts_with(TEAM_PREFIX) => (None, 2500),
        _ => (Some(("Алексей Петров", "ALEX001")), 2500),
    }
}

/// Look up the order for a code, as of `now`
pub fn lookup_order(code: &str, now: DateTime<Utc>) -> Result<Order> {
    let code = code.trim();
    if code.is_empty() {
        return Err(Error::Validation(MISSING_CODE.to_string()));
    }
    if !code_format().is_match(code) {
        debug!("Unknown order code format: {:?}", code);
        return Err(Error::NotFound(ORDER_NOT_FOUND.to_string()));
    }

    let (waiter, order_amount) = mock_details(code);
    Ok(Order {
        restaurant: RESTAURANT.to_string(),
        order_number: code.to_string(),
        order_date: now,
        table_number: TABLE_NUMBER.to_string(),
        items: vec![
            item("Стейк из говядины", 1800),
            item("Картофель по-деревенски", 400),
            item("Салат Цезарь", 300),
        ],
        order_amount,
        waiter: waiter.map(|(name, _)| name.to_string()),
        waiter_id: waiter.map(|(_, id)| id.to_string()),
    })
}

fn item(name: &str, unit_price: u64) -> OrderItem {
    OrderItem {
        name: name.to_string(),
        quantity: 1,
        unit_price,
    }
}

/// The team, used whenever no active waiter can receive the tip
pub fn team_recipient() -> Recipient {
    Recipient::Team(TeamRecipient {
        name: TEAM_NAME.to_string(),
        goal: TEAM_GOAL.to_string(),
        status: EmployeeStatus::Active,
    })
}

/// Decide who receives tips for a waiter id.
///
/// Only an active employee is ever returned as a waiter. A missing, unknown or inactive waiter,
/// or a storage failure, falls back to the team so that the guest can always tip someone.
pub fn resolve_recipient(db: &dyn Database, waiter_id: Option<&str>) -> Recipient {
    let Some(waiter_id) = waiter_id else {
        return team_recipient();
    };

    match db.get_employee(waiter_id) {
        Ok(employee) if employee.status == EmployeeStatus::Active => {
            Recipient::Waiter(WaiterRecipient {
                id: employee.id,
                name: employee.name,
                surname: employee.surname,
                photo: employee.photo,
                goal: employee.goal,
                status: employee.status,
            })
        }
        Ok(employee) => {
            debug!(
                "Employee {} is {}, tips go to the team",
                employee.id,
                employee.status.as_str()
            );
            team_recipient()
        }
        Err(Error::NotFound(_)) => {
            debug!("Employee {} not found, tips go to the team", waiter_id);
            team_recipient()
        }
        Err(err) => {
            warn!("Failed to read employee {}: {}", waiter_id, err);
            team_recipient()
        }
    }
}

/// Order plus recipient, as shown on the tipping page
pub fn order_data(db: &dyn Database, code: &str, now: DateTime<Utc>) -> Result<OrderData> {
    let order = lookup_order(code, now)?;
    let recipient = resolve_recipient(db, order.waiter_id.as_deref());
    Ok(OrderData { order, recipient })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::EmployeeUpdate;
    use crate::database::mock::MockDB;
    use crate::database::{default_roster, seed_employees};

    fn seeded() -> MockDB {
        let mut db = MockDB::new().unwrap();
        seed_employees(&mut db, &default_roster()).unwrap();
        db
    }

    #[test]
    fn test_known_codes() {
        let now = Utc::now();
        let order = lookup_order("TEST001", now).unwrap();
        assert_eq!(order.order_amount, 2500);
        assert_eq!(order.waiter_id.as_deref(), Some("ALEX001"));
        assert_eq!(order.order_number, "TEST001");
        assert_eq!(order.order_date, now);
        assert_eq!(order.items.len(), 3);

        assert_eq!(lookup_order("TEST002", now).unwrap().order_amount, 3200);
        assert_eq!(lookup_order("TEST003", now).unwrap().order_amount, 1800);
        assert_eq!(
            lookup_order("ORDER123", now).unwrap().waiter_id.as_deref(),
            Some("ALEX001")
        );
        assert_eq!(lookup_order("TEAM001", now).unwrap().waiter_id, None);
    }

    #[test]
    fn test_lookup_is_deterministic() {
        let now = Utc::now();
        assert_eq!(
            lookup_order("ABC-42", now).unwrap(),
            lookup_order("ABC-42", now).unwrap()
        );
    }

    #[test]
    fn test_unknown_codes() {
        let now = Utc::now();
        assert!(matches!(lookup_order("", now), Err(Error::Validation(_))));
        assert!(matches!(lookup_order("   ", now), Err(Error::Validation(_))));
        assert!(matches!(lookup_order("ab", now), Err(Error::NotFound(_))));
        assert!(matches!(lookup_order("bad code!", now), Err(Error::NotFound(_))));
        assert!(matches!(
            lookup_order(&"X".repeat(33), now),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_active_waiter_is_resolved() {
        let db = seeded();
        match resolve_recipient(&db, Some("ALEX001")) {
            Recipient::Waiter(waiter) => {
                assert_eq!(waiter.id, "ALEX001");
                assert_eq!(waiter.name, "Алексей");
                assert_eq!(waiter.status, EmployeeStatus::Active);
            }
            other => panic!("expected a waiter, got {:?}", other),
        }
    }

    #[test]
    fn test_team_fallback() {
        let mut db = seeded();
        assert_eq!(resolve_recipient(&db, Some("MIKHAIL003")), team_recipient());
        assert_eq!(resolve_recipient(&db, Some("NOBODY")), team_recipient());
        assert_eq!(resolve_recipient(&db, None), team_recipient());

        db.update_employee(
            "ANNA002",
            &EmployeeUpdate {
                status: Some(EmployeeStatus::NotFound),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(resolve_recipient(&db, Some("ANNA002")), team_recipient());
    }

    #[test]
    fn test_order_data() {
        let db = seeded();
        let data = order_data(&db, "TEST001", Utc::now()).unwrap();
        assert_eq!(data.order.order_amount, 2500);
        assert!(matches!(data.recipient, Recipient::Waiter(ref w) if w.id == "ALEX001"));

        let data = order_data(&db, "TEST002", Utc::now()).unwrap();
        assert_eq!(data.recipient, team_recipient());
    }
}
