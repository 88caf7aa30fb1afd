use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Departments seeded by the initial migration.
pub const DEFAULT_DEPARTMENTS: &[&str] = &["MKT 1", "MKT 2", "MKT3", "MKT4"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: Uuid,
    /// Unique; employees reference departments by this name
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Department {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            description: None,
            created_at: Utc::now(),
        }
    }
}
