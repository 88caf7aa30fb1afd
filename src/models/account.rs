use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a login account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Employee => "employee",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "admin" => Self::Admin,
            "manager" => Self::Manager,
            _ => Self::Employee,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A login identity. Accounts act on behalf of an employee through `employee_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub is_verified: bool,
    #[serde(skip)]
    pub verify_otp: Option<String>,
    #[serde(skip)]
    pub verify_otp_expires_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub reset_otp: Option<String>,
    #[serde(skip)]
    pub reset_otp_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
            password_hash,
            role: Role::default(),
            employee_id: None,
            department: None,
            is_verified: false,
            verify_otp: None,
            verify_otp_expires_at: None,
            reset_otp: None,
            reset_otp_expires_at: None,
            created_at: Utc::now(),
        }
    }
}

/// Loose email shape check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);
    !local.is_empty() && !domain.is_empty() && domain.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("MANAGER"), Role::Manager);
        assert_eq!(Role::parse("employee"), Role::Employee);
        assert_eq!(Role::parse("unknown"), Role::Employee);
    }

    #[test]
    fn test_account_new_normalizes_email() {
        let a = Account::new("Ann".into(), " Ann@Example.COM ".into(), "h".into());
        assert_eq!(a.email, "ann@example.com");
        assert_eq!(a.role, Role::Employee);
        assert!(!a.is_verified);
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("ab.co"));
    }
}
