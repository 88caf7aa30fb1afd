//! Error taxonomy for the tracker core.
//!
//! Every failure the core can report to a caller maps to one variant here.
//! Nothing is retried internally; the HTTP layer turns variants into status
//! codes via [`TrackerError::status_code`].

/// Result alias used across the library.
pub type TrackerResult<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{0}")]
    Conflict(String),

    #[error("You do not have permission to access this resource")]
    AccessDenied,

    #[error("Please verify your account first")]
    UnverifiedAccount,

    #[error("{0}")]
    Unauthenticated(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No employees found in department {0}")]
    EmptyDepartment(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

impl TrackerError {
    pub fn employee_not_found(employee_id: &str) -> Self {
        Self::NotFound {
            entity: "Employee",
            key: employee_id.to_string(),
        }
    }

    pub fn record_not_found(record_id: impl ToString) -> Self {
        Self::NotFound {
            entity: "Performance record",
            key: record_id.to_string(),
        }
    }

    pub fn department_not_found(key: impl ToString) -> Self {
        Self::NotFound {
            entity: "Department",
            key: key.to_string(),
        }
    }

    pub fn account_not_found(key: impl ToString) -> Self {
        Self::NotFound {
            entity: "Account",
            key: key.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// HTTP status code reported for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } | Self::EmptyDepartment(_) => 404,
            Self::Conflict(_) => 409,
            Self::AccessDenied | Self::UnverifiedAccount => 403,
            Self::Unauthenticated(_) => 401,
            Self::InvalidInput(_) => 400,
            Self::Storage(_) | Self::Export(_) | Self::PasswordHash(_) => 500,
        }
    }

    /// Map a UNIQUE constraint violation to `Conflict`, leaving other errors as storage errors.
    pub(crate) fn from_unique(err: rusqlite::Error, message: impl Into<String>) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(message.into())
            }
            other => Self::Storage(other),
        }
    }
}
