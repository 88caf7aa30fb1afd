//! Password hashing with bcrypt.

use crate::error::{TrackerError, TrackerResult};

pub const MIN_PASSWORD_LEN: usize = 6;

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

pub fn validate_password(password: &str) -> TrackerResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(TrackerError::invalid(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> TrackerResult<String> {
    validate_password(password)?;
    Ok(bcrypt::hash(password, HASH_COST)?)
}

/// Check `password` against a stored bcrypt hash. Malformed stored values
/// never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}
