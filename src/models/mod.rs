mod account;
mod department;
mod employee;
mod performance;

pub use account::{is_valid_email, Account, Role};
pub use department::{Department, DEFAULT_DEPARTMENTS};
pub use employee::{validate_employee_id, Employee, EmployeeChanges};
pub use performance::{EntryKind, Performance};
