// This file contains the types exchanged through the API, shared by the server and the client
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A line of an order
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    /// Price of a single unit, in rubles
    pub unit_price: u64,
}

/// An order, as returned by the lookup
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub restaurant: String,
    /// The code the order was looked up with
    pub order_number: String,
    /// Time of the lookup
    pub order_date: DateTime<Utc>,
    pub table_number: String,
    pub items: Vec<OrderItem>,
    /// Bill amount in rubles, base of the percentage quick-picks
    pub order_amount: u64,
    /// Display name of the waiter who served the table, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiter_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    Inactive,
    /// Invited but never registered
    NotFound,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::Inactive => "inactive",
            EmployeeStatus::NotFound => "not_found",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(EmployeeStatus::Active),
            "inactive" => Some(EmployeeStatus::Inactive),
            "not_found" => Some(EmployeeStatus::NotFound),
            _ => None,
        }
    }
}

/// A member of the restaurant staff
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(alias = "code")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default = "default_status")]
    pub status: EmployeeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// What the employee is saving up for, shown to guests
    #[serde(default)]
    pub goal: String,
}

fn default_status() -> EmployeeStatus {
    EmployeeStatus::Active
}

/// Body of a profile update. Absent fields are left untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EmployeeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaiterRecipient {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub goal: String,
    pub status: EmployeeStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TeamRecipient {
    pub name: String,
    pub goal: String,
    pub status: EmployeeStatus,
}

/// Who receives the tip
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Recipient {
    Waiter(WaiterRecipient),
    Team(TeamRecipient),
}

impl Recipient {
    pub fn recipient_type(&self) -> RecipientType {
        match self {
            Recipient::Waiter(_) => RecipientType::Waiter,
            Recipient::Team(_) => RecipientType::Team,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecipientType {
    Waiter,
    Team,
}

impl RecipientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipientType::Waiter => "waiter",
            RecipientType::Team => "team",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiter" => Some(RecipientType::Waiter),
            "team" => Some(RecipientType::Team),
            _ => None,
        }
    }
}

/// An order together with whoever should receive the tip for it
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OrderData {
    #[serde(flatten)]
    pub order: Order,
    pub recipient: Recipient,
}

/// Body of a new tip request.
///
/// Everything is optional at this level so that missing fields can be reported with the same
/// message as the web form does, instead of a generic deserialization failure.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTip {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiter_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_name: Option<String>,
}

/// A stored tip. Never modified after creation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TipSubmission {
    /// Opaque identifier, given by the server on creation
    pub id: String,
    /// Code of the order the tip was left for
    pub code: String,
    /// Amount in whole rubles
    pub amount: i64,
    /// 1 to 5 stars
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub recipient_type: RecipientType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiter_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Answer to a successful tip submission
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TipCreated {
    pub ok: bool,
    pub tip_id: String,
    /// Where the guest should be sent next
    pub redirect_url: String,
}

/// A restaurant asking to be connected
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub workplace: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Fields of the connection form. Sent form-encoded, not as JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLead {
    pub workplace: String,
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl NewLead {
    pub const FIELDS: [&'static str; 4] = ["workplace", "name", "phone", "email"];

    /// Field values in the order of FIELDS
    pub fn values(&self) -> [&str; 4] {
        [
            self.workplace.as_str(),
            self.name.as_str(),
            self.phone.as_str(),
            self.email.as_str(),
        ]
    }
}

/// Amounts shown to the guest before paying
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TipQuote {
    pub base: u64,
    pub tip_amount: u64,
    /// Percentage of the base the tip represents, for display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u64>,
    pub commission: u64,
    pub pay_commission: bool,
    /// What the guest actually pays
    pub total: u64,
}

/// Aggregated tips of one employee over a period
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TipStats {
    pub employee_id: String,
    pub period: String,
    pub count: usize,
    pub total: i64,
    pub average: i64,
    pub tips: Vec<TipSubmission>,
}

/// Error body, returned with every 4xx and 5xx answer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorBody {
            ok: false,
            error: error.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Ack {
    pub ok: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EmployeesResponse {
    pub employees: Vec<Employee>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EmployeeResponse {
    pub ok: bool,
    pub employee: Employee,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub ok: bool,
    pub order_data: OrderData,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TipResponse {
    pub ok: bool,
    pub tip: TipSubmission,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatsResponse {
    pub ok: bool,
    pub stats: TipStats,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QuoteResponse {
    pub ok: bool,
    pub quote: TipQuote,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_recipient_is_tagged_by_type() {
        let team = Recipient::Team(TeamRecipient {
            name: "Команда ресторана".to_string(),
            goal: "goal".to_string(),
            status: EmployeeStatus::Active,
        });
        let json = serde_json::to_value(&team).unwrap();
        assert_eq!(json["type"], "team");
        assert_eq!(json["status"], "active");

        let waiter: Recipient = serde_json::from_str(
            r#"{"type":"waiter","id":"ALEX001","name":"Алексей","goal":"Отпуск","status":"active"}"#,
        )
        .unwrap();
        assert_eq!(waiter.recipient_type(), RecipientType::Waiter);
    }

    #[test]
    fn test_employee_accepts_code_alias() {
        let employee: Employee =
            serde_json::from_str(r#"{"code":"1001","name":"Алексей"}"#).unwrap();
        assert_eq!(employee.id, "1001");
        assert_eq!(employee.status, EmployeeStatus::Active);
        assert_eq!(employee.goal, "");
    }

    #[test]
    fn test_new_tip_uses_camel_case() {
        let tip: NewTip = serde_json::from_str(
            r#"{"code":"TEST001","amount":250,"rating":5,"recipientType":"waiter","waiterId":"ALEX001"}"#,
        )
        .unwrap();
        assert_eq!(tip.recipient_type.as_deref(), Some("waiter"));
        assert_eq!(tip.waiter_id.as_deref(), Some("ALEX001"));
        assert_eq!(tip.comment, None);
    }

    #[test]
    fn test_order_data_is_flattened() {
        let data = OrderData {
            order: Order {
                restaurant: "R".to_string(),
                order_number: "TEST001".to_string(),
                order_date: Utc::now(),
                table_number: "15".to_string(),
                items: vec![],
                order_amount: 2500,
                waiter: None,
                waiter_id: None,
            },
            recipient: Recipient::Team(TeamRecipient {
                name: "T".to_string(),
                goal: "G".to_string(),
                status: EmployeeStatus::Active,
            }),
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["orderAmount"], 2500);
        assert_eq!(json["recipient"]["type"], "team");
        assert!(json.get("waiterId").is_none());
    }
}
