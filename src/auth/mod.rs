//! Accounts, sessions and one-time codes.
//!
//! Passwords are stored as bcrypt hashes ([`password`]); sessions
//! are opaque `pt_` bearer tokens of which only the SHA-256 hash is persisted
//! ([`tokens`]); verification and reset codes go out through an
//! [`otp::OtpSender`].

pub mod otp;
pub mod password;
pub mod tokens;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{Database, Session};
use crate::error::{TrackerError, TrackerResult};
use crate::models::{is_valid_email, Account, Role};

pub use otp::{LogOtpSender, OtpPurpose, OtpSender};

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub account: Account,
}

/// Self-service signup: an unverified `employee` account, logged in.
pub fn register(
    db: &Database,
    registration: &Registration,
    session_lifetime: Duration,
) -> TrackerResult<LoginResult> {
    let name = registration.name.trim();
    if name.is_empty() {
        return Err(TrackerError::invalid("name is required"));
    }
    if !is_valid_email(registration.email.trim()) {
        return Err(TrackerError::invalid("a valid email is required"));
    }
    if let Some(ref dept) = registration.department {
        db.require_department_name(dept)?;
    }

    let hash = password::hash_password(&registration.password)?;
    let mut account = Account::new(name.to_string(), registration.email.clone(), hash);
    account.department = registration.department.clone();
    db.insert_account(&account)?;

    issue_session(db, account, session_lifetime)
}

/// Operator-created account. Accounts made this way are verified up front.
pub fn create_account(
    db: &Database,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
    employee_id: Option<&str>,
) -> TrackerResult<Account> {
    if name.trim().is_empty() {
        return Err(TrackerError::invalid("name is required"));
    }
    if !is_valid_email(email.trim()) {
        return Err(TrackerError::invalid("a valid email is required"));
    }

    let mut account = Account::new(
        name.to_string(),
        email.to_string(),
        password::hash_password(password)?,
    );
    account.role = role;
    account.is_verified = true;
    if let Some(employee_id) = employee_id {
        let employee = db.require_employee(employee_id)?;
        account.employee_id = Some(employee.employee_id);
        account.department = Some(employee.department);
    }
    db.insert_account(&account)?;
    Ok(account)
}

/// Point an account at the employee it acts as (or detach it).
pub fn link_employee(
    db: &Database,
    account_id: Uuid,
    employee_id: Option<&str>,
) -> TrackerResult<Account> {
    let mut account = require_account(db, account_id)?;
    match employee_id {
        Some(employee_id) => {
            let employee = db.require_employee(employee_id)?;
            account.employee_id = Some(employee.employee_id);
            account.department = Some(employee.department);
        }
        None => account.employee_id = None,
    }
    db.update_account(&account)?;
    Ok(account)
}

pub fn login(
    db: &Database,
    email: &str,
    password: &str,
    session_lifetime: Duration,
) -> TrackerResult<LoginResult> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(TrackerError::invalid("Please provide both email and password"));
    }
    let account = db
        .get_account_by_email(email)?
        .filter(|a| password::verify_password(password, &a.password_hash))
        .ok_or_else(|| TrackerError::Unauthenticated("Invalid credentials".to_string()))?;

    issue_session(db, account, session_lifetime)
}

fn issue_session(
    db: &Database,
    account: Account,
    session_lifetime: Duration,
) -> TrackerResult<LoginResult> {
    let issued = tokens::generate_session_token();
    let session = Session::new(account.id, issued.prefix, session_lifetime);
    db.insert_session(&session, &issued.hash)?;
    tracing::info!(account_id = %account.id, "session issued");

    Ok(LoginResult {
        token: issued.token,
        expires_at: session.expires_at,
        account,
    })
}

pub fn logout(db: &Database, token: &str) -> TrackerResult<()> {
    db.revoke_session(&tokens::hash_token(token))?;
    Ok(())
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve a bearer token to its account.
pub fn authenticate(db: &Database, token: Option<&str>, now: DateTime<Utc>) -> TrackerResult<Account> {
    let token =
        token.ok_or_else(|| TrackerError::Unauthenticated("Not Authorized. Login Again".into()))?;
    tokens::validate_token_format(token)?;

    db.find_active_session(&tokens::hash_token(token), now)?
        .map(|(_, account)| account)
        .ok_or_else(|| TrackerError::Unauthenticated("Session expired. Login Again".into()))
}

fn require_account(db: &Database, account_id: Uuid) -> TrackerResult<Account> {
    db.get_account(account_id)?
        .ok_or_else(|| TrackerError::account_not_found(account_id))
}

// ==================== ONE-TIME CODES ====================

pub fn send_verify_otp(
    db: &Database,
    account_id: Uuid,
    sender: &dyn OtpSender,
) -> TrackerResult<()> {
    let mut account = require_account(db, account_id)?;
    if account.is_verified {
        return Err(TrackerError::Conflict("Account Already Verified".to_string()));
    }

    let code = otp::generate_otp();
    account.verify_otp = Some(code.clone());
    account.verify_otp_expires_at = Some(Utc::now() + OtpPurpose::VerifyAccount.ttl());
    db.update_account(&account)?;

    sender.send(&account.email, OtpPurpose::VerifyAccount, &code)
}

pub fn verify_account(db: &Database, account_id: Uuid, code: &str) -> TrackerResult<Account> {
    let mut account = require_account(db, account_id)?;
    otp::check_otp(
        account.verify_otp.as_deref(),
        account.verify_otp_expires_at,
        code,
        Utc::now(),
    )?;

    account.is_verified = true;
    account.verify_otp = None;
    account.verify_otp_expires_at = None;
    db.update_account(&account)?;
    tracing::info!(account_id = %account.id, "account verified");
    Ok(account)
}

pub fn send_reset_otp(db: &Database, email: &str, sender: &dyn OtpSender) -> TrackerResult<()> {
    if email.trim().is_empty() {
        return Err(TrackerError::invalid("Email is required"));
    }
    let mut account = db
        .get_account_by_email(email)?
        .ok_or_else(|| TrackerError::account_not_found(email.trim()))?;

    let code = otp::generate_otp();
    account.reset_otp = Some(code.clone());
    account.reset_otp_expires_at = Some(Utc::now() + OtpPurpose::ResetPassword.ttl());
    db.update_account(&account)?;

    sender.send(&account.email, OtpPurpose::ResetPassword, &code)
}

/// Set a new password with a reset code. Every open session is revoked.
pub fn reset_password(
    db: &Database,
    email: &str,
    code: &str,
    new_password: &str,
) -> TrackerResult<()> {
    let mut account = db
        .get_account_by_email(email)?
        .ok_or_else(|| TrackerError::account_not_found(email.trim()))?;
    otp::check_otp(
        account.reset_otp.as_deref(),
        account.reset_otp_expires_at,
        code,
        Utc::now(),
    )?;

    account.password_hash = password::hash_password(new_password)?;
    account.reset_otp = None;
    account.reset_otp_expires_at = None;
    db.update_account(&account)?;
    let revoked = db.revoke_account_sessions(account.id)?;
    tracing::info!(account_id = %account.id, revoked, "password reset");
    Ok(())
}
