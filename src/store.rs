// Validation in front of the database

use crate::api::{
    Employee, EmployeeUpdate, Lead, NewLead, NewTip, RecipientType, TipCreated, TipSubmission,
};
use crate::calculator;
use crate::database::Database;
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::{distributions::Alphanumeric, Rng};

pub const MISSING_FIELDS: &str = "Не все обязательные поля заполнены";
pub const INVALID_DATA: &str = "Некорректные данные";
pub const MISSING_LEAD_FIELDS: &str = "Заполните все поля";

pub const MAX_RATING: i64 = 5;
pub const MAX_TIP_AMOUNT: i64 = calculator::MAX_AMOUNT as i64;
pub const MAX_COMMENT_CHARS: usize = 500;
pub const MAX_GOAL_CHARS: usize = 200;

const ID_LENGTH: usize = 12;

/// Opaque random identifier for new records
pub fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LENGTH)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect()
}

/// Page the guest lands on after a successful submission
pub fn success_url(tip_id: &str) -> String {
    format!("/tip/success?tipId={}", tip_id)
}

fn missing() -> Error {
    Error::Validation(MISSING_FIELDS.to_string())
}

fn invalid() -> Error {
    Error::Validation(INVALID_DATA.to_string())
}

/// Empty strings count as absent, like on the web form
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Check a submission and turn it into the record to store
pub fn validate_tip(tip: NewTip, id: String, now: DateTime<Utc>) -> Result<TipSubmission> {
    let code = non_empty(tip.code).ok_or_else(missing)?;
    let amount = tip.amount.filter(|a| *a != 0).ok_or_else(missing)?;
    let rating = tip.rating.filter(|r| *r != 0).ok_or_else(missing)?;
    let recipient_type = non_empty(tip.recipient_type).ok_or_else(missing)?;

    if !(1..=MAX_TIP_AMOUNT).contains(&amount) || !(1..=MAX_RATING).contains(&rating) {
        return Err(invalid());
    }
    let recipient_type = RecipientType::parse(&recipient_type).ok_or_else(invalid)?;
    let comment = non_empty(tip.comment);
    if comment
        .as_ref()
        .is_some_and(|c| c.chars().count() > MAX_COMMENT_CHARS)
    {
        return Err(invalid());
    }

    Ok(TipSubmission {
        id,
        code,
        amount,
        rating: rating as u8,
        comment,
        recipient_type,
        waiter_id: non_empty(tip.waiter_id),
        waiter_name: non_empty(tip.waiter_name),
        restaurant_name: non_empty(tip.restaurant_name),
        created_at: now,
    })
}

/// Validate and append a tip. Nothing is stored when validation fails.
pub fn submit_tip(db: &mut dyn Database, tip: NewTip, now: DateTime<Utc>) -> Result<TipCreated> {
    let record = validate_tip(tip, generate_id(), now)?;
    db.insert_tip(&record)?;
    info!(
        "Tip {} of {} for order {} ({})",
        record.id,
        record.amount,
        record.code,
        record.recipient_type.as_str()
    );
    Ok(TipCreated {
        ok: true,
        redirect_url: success_url(&record.id),
        tip_id: record.id,
    })
}

pub fn find_tip(db: &dyn Database, tip_id: &str) -> Result<TipSubmission> {
    db.get_tip(tip_id)
}

/// Record a connection request
pub fn capture_lead(db: &mut dyn Database, form: NewLead, now: DateTime<Utc>) -> Result<Lead> {
    if form.values().iter().any(|v| v.trim().is_empty()) {
        return Err(Error::Validation(MISSING_LEAD_FIELDS.to_string()));
    }
    let lead = Lead {
        id: generate_id(),
        workplace: form.workplace,
        name: form.name,
        phone: form.phone,
        email: form.email,
        created_at: now,
    };
    db.insert_lead(&lead)?;
    info!("Lead {} from {}", lead.id, lead.workplace);
    Ok(lead)
}

/// Add an employee to the roster
pub fn onboard_employee(db: &mut dyn Database, employee: Employee) -> Result<Employee> {
    if employee.id.trim().is_empty() || employee.name.trim().is_empty() {
        return Err(missing());
    }
    if employee.goal.chars().count() > MAX_GOAL_CHARS {
        return Err(invalid());
    }
    db.insert_employee(&employee)?;
    info!("Employee {} onboarded", employee.id);
    Ok(employee)
}

/// Edit an employee profile
pub fn update_profile(
    db: &mut dyn Database,
    employee_id: &str,
    update: &EmployeeUpdate,
) -> Result<Employee> {
    if update
        .goal
        .as_ref()
        .is_some_and(|goal| goal.chars().count() > MAX_GOAL_CHARS)
    {
        debug!("Goal too long for employee {}", employee_id);
        return Err(invalid());
    }
    db.update_employee(employee_id, update)
}
