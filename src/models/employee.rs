use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{TrackerError, TrackerResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// External identifier, unique across the store
    pub employee_id: String,
    pub name: String,
    /// Name of the department this employee belongs to
    pub department: String,
    pub position: String,
    /// Running total of all ledger points; maintained by the write path only
    pub points: f64,
    pub project_code: Option<String>,
    pub coordinator_name: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn new(employee_id: String, name: String, department: String, position: String) -> Self {
        let now = Utc::now();
        Self {
            employee_id: employee_id.trim().to_string(),
            name: name.trim().to_string(),
            department,
            position: position.trim().to_string(),
            points: 0.0,
            project_code: None,
            coordinator_name: None,
            password_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check required fields before the employee is written.
    pub fn validate(&self) -> TrackerResult<()> {
        validate_employee_id(&self.employee_id)?;
        if self.name.trim().is_empty() {
            return Err(TrackerError::invalid("name is required"));
        }
        if self.department.trim().is_empty() {
            return Err(TrackerError::invalid("department is required"));
        }
        if self.position.trim().is_empty() {
            return Err(TrackerError::invalid("position is required"));
        }
        Ok(())
    }
}

/// Partial update for the descriptive fields of an employee.
///
/// The points counter is deliberately absent: it only moves through ledger writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeChanges {
    pub name: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub project_code: Option<String>,
    pub coordinator_name: Option<String>,
    pub password: Option<String>,
}

impl EmployeeChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.department.is_none()
            && self.position.is_none()
            && self.project_code.is_none()
            && self.coordinator_name.is_none()
            && self.password.is_none()
    }

    /// Apply the non-credential fields. Returns the new department name if it changed.
    pub fn apply(&self, employee: &mut Employee) -> Option<String> {
        if let Some(ref name) = self.name {
            employee.name = name.trim().to_string();
        }
        if let Some(ref position) = self.position {
            employee.position = position.trim().to_string();
        }
        if let Some(ref code) = self.project_code {
            employee.project_code = non_empty(code);
        }
        if let Some(ref coordinator) = self.coordinator_name {
            employee.coordinator_name = non_empty(coordinator);
        }
        employee.updated_at = Utc::now();

        match self.department {
            Some(ref dept) if *dept != employee.department => {
                employee.department = dept.clone();
                Some(dept.clone())
            }
            _ => None,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn employee_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]{0,63}$").expect("valid regex"))
}

/// Employee ids are short tokens: letters, digits, `_`, `.` and `-`.
pub fn validate_employee_id(employee_id: &str) -> TrackerResult<()> {
    if employee_id.trim().is_empty() {
        return Err(TrackerError::invalid("employee_id is required"));
    }
    if !employee_id_pattern().is_match(employee_id) {
        return Err(TrackerError::invalid(format!(
            "employee_id '{}' may only contain letters, digits, '_', '.' and '-'",
            employee_id
        )));
    }
    Ok(())
}
