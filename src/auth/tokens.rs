//! Bearer token generation and validation for API sessions.

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::{TrackerError, TrackerResult};

/// Prefix for session tokens.
const TOKEN_PREFIX: &str = "pt_";

/// Length of the random portion of the token (in bytes, hex-encoded = 2x chars).
const TOKEN_RANDOM_BYTES: usize = 24;

/// A freshly issued session token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The complete token handed to the client (e.g. "pt_abc123...")
    pub token: String,
    /// SHA-256 hash for storage
    pub hash: String,
    /// First 11 chars for display (e.g. "pt_abc12345")
    pub prefix: String,
}

pub fn generate_session_token() -> IssuedToken {
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..TOKEN_RANDOM_BYTES).map(|_| rng.gen()).collect();
    let token = format!("{}{}", TOKEN_PREFIX, hex::encode(&random_bytes));

    IssuedToken {
        hash: hash_token(&token),
        prefix: token.chars().take(11).collect(),
        token,
    }
}

/// Hash a token for storage and lookup.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Validate token format (prefix, length, hex body).
pub fn validate_token_format(token: &str) -> TrackerResult<()> {
    if !token.starts_with(TOKEN_PREFIX) {
        return Err(TrackerError::Unauthenticated(format!(
            "Invalid token format: must start with '{}'",
            TOKEN_PREFIX
        )));
    }

    let expected_len = TOKEN_PREFIX.len() + (TOKEN_RANDOM_BYTES * 2);
    if token.len() != expected_len {
        return Err(TrackerError::Unauthenticated(format!(
            "Invalid token format: expected {} characters, got {}",
            expected_len,
            token.len()
        )));
    }

    if !token[TOKEN_PREFIX.len()..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TrackerError::Unauthenticated(
            "Invalid token format: contains non-hex characters".to_string(),
        ));
    }

    Ok(())
}
