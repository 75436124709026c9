use crate::api::{Employee, EmployeeUpdate, Lead, TipSubmission};
use crate::errors::Result;

/// Trait hiding the storage implementation
///
/// The mock keeps everything in memory for unit tests, SQLite is what the server runs on.
/// Every write touches a single record, so a failed write never leaves a collection half updated.
pub trait Database {
    /// Create a new empty database
    fn new() -> Result<Self>
    where
        Self: Sized;

    /// All employees, in onboarding order
    fn list_employees(&self) -> Result<Vec<Employee>>;

    /// Retrieve the employee with the given id
    ///
    /// Should return a NotFound error if no employee has this id
    fn get_employee(&self, id: &str) -> Result<Employee>;

    /// Insert a new employee
    ///
    /// Should return a Validation error if the id is already taken
    fn insert_employee(&mut self, employee: &Employee) -> Result<()>;

    /// Apply a partial update to an employee and return the updated record
    fn update_employee(&mut self, id: &str, update: &EmployeeUpdate) -> Result<Employee>;

    /// Append a lead
    fn insert_lead(&mut self, lead: &Lead) -> Result<()>;

    /// All leads, in capture order
    fn list_leads(&self) -> Result<Vec<Lead>>;

    /// Append a tip
    fn insert_tip(&mut self, tip: &TipSubmission) -> Result<()>;

    /// Retrieve a tip by its id
    ///
    /// Should return a NotFound error if the tip does not exist
    fn get_tip(&self, id: &str) -> Result<TipSubmission>;

    /// All tips, in submission order
    fn list_tips(&self) -> Result<Vec<TipSubmission>>;
}
