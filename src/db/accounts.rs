use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Row};
use serde::Serialize;
use uuid::Uuid;

use super::{parse_datetime, parse_uuid, Database};
use crate::error::{TrackerError, TrackerResult};
use crate::models::{Account, Role};

const ACCOUNT_COLUMNS: &str = "id, name, email, password_hash, role, employee_id, department, \
     is_verified, verify_otp, verify_otp_expires_at, reset_otp, reset_otp_expires_at, created_at";

/// A bearer-token login. Only the SHA-256 hash of the token is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub account_id: Uuid,
    pub token_prefix: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(account_id: Uuid, token_prefix: String, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_id,
            token_prefix,
            created_at: now,
            expires_at: now + lifetime,
            revoked_at: None,
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

impl Database {
    // ==================== ACCOUNTS ====================

    pub fn insert_account(&self, account: &Account) -> TrackerResult<()> {
        self.conn
            .execute(
                &format!(
                    "INSERT INTO accounts ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    ACCOUNT_COLUMNS
                ),
                params![
                    account.id.to_string(),
                    account.name,
                    account.email,
                    account.password_hash,
                    account.role.as_str(),
                    account.employee_id,
                    account.department,
                    account.is_verified as i32,
                    account.verify_otp,
                    account.verify_otp_expires_at.map(|t| t.to_rfc3339()),
                    account.reset_otp,
                    account.reset_otp_expires_at.map(|t| t.to_rfc3339()),
                    account.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| TrackerError::from_unique(e, "User already exists"))?;
        tracing::info!(account_id = %account.id, role = %account.role, "account created");
        Ok(())
    }

    pub fn get_account(&self, id: Uuid) -> TrackerResult<Option<Account>> {
        let result = self.conn.query_row(
            &format!("SELECT {} FROM accounts WHERE id = ?", ACCOUNT_COLUMNS),
            [id.to_string()],
            row_to_account,
        );

        match result {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_account_by_email(&self, email: &str) -> TrackerResult<Option<Account>> {
        let email = email.trim().to_lowercase();
        let result = self.conn.query_row(
            &format!("SELECT {} FROM accounts WHERE email = ?", ACCOUNT_COLUMNS),
            [email],
            row_to_account,
        );

        match result {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_accounts(&self) -> TrackerResult<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM accounts ORDER BY created_at",
            ACCOUNT_COLUMNS
        ))?;
        let accounts = stmt
            .query_map([], row_to_account)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(accounts)
    }

    /// Persist every mutable column of `account`.
    pub fn update_account(&self, account: &Account) -> TrackerResult<()> {
        let rows = self.conn.execute(
            "UPDATE accounts SET name = ?, password_hash = ?, role = ?, employee_id = ?,
             department = ?, is_verified = ?, verify_otp = ?, verify_otp_expires_at = ?,
             reset_otp = ?, reset_otp_expires_at = ? WHERE id = ?",
            params![
                account.name,
                account.password_hash,
                account.role.as_str(),
                account.employee_id,
                account.department,
                account.is_verified as i32,
                account.verify_otp,
                account.verify_otp_expires_at.map(|t| t.to_rfc3339()),
                account.reset_otp,
                account.reset_otp_expires_at.map(|t| t.to_rfc3339()),
                account.id.to_string(),
            ],
        )?;
        if rows == 0 {
            return Err(TrackerError::account_not_found(account.id));
        }
        Ok(())
    }

    pub fn set_account_role(&self, id: Uuid, role: Role) -> TrackerResult<Account> {
        let mut account = self
            .get_account(id)?
            .ok_or_else(|| TrackerError::account_not_found(id))?;
        account.role = role;
        self.update_account(&account)?;
        tracing::info!(account_id = %id, role = %role, "account role changed");
        Ok(account)
    }

    // ==================== SESSIONS ====================

    pub fn insert_session(&self, session: &Session, token_hash: &str) -> TrackerResult<()> {
        self.conn.execute(
            "INSERT INTO sessions (id, account_id, token_hash, token_prefix, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                session.id.to_string(),
                session.account_id.to_string(),
                token_hash,
                session.token_prefix,
                session.created_at.to_rfc3339(),
                session.expires_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// The unrevoked, unexpired session for a token hash and its account.
    pub fn find_active_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> TrackerResult<Option<(Session, Account)>> {
        let result = self.conn.query_row(
            "SELECT id, account_id, token_prefix, created_at, expires_at, revoked_at
             FROM sessions WHERE token_hash = ? AND revoked_at IS NULL",
            [token_hash],
            row_to_session,
        );

        let session = match result {
            Ok(session) => session,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if !session.is_active(now) {
            return Ok(None);
        }

        Ok(self
            .get_account(session.account_id)?
            .map(|account| (session, account)))
    }

    pub fn revoke_session(&self, token_hash: &str) -> TrackerResult<bool> {
        let rows = self.conn.execute(
            "UPDATE sessions SET revoked_at = ? WHERE token_hash = ? AND revoked_at IS NULL",
            params![Utc::now().to_rfc3339(), token_hash],
        )?;
        Ok(rows > 0)
    }

    pub fn revoke_account_sessions(&self, account_id: Uuid) -> TrackerResult<usize> {
        let rows = self.conn.execute(
            "UPDATE sessions SET revoked_at = ? WHERE account_id = ? AND revoked_at IS NULL",
            params![Utc::now().to_rfc3339(), account_id.to_string()],
        )?;
        Ok(rows)
    }

    /// Drop sessions that expired before `now` or were revoked.
    pub fn purge_sessions(&self, now: DateTime<Utc>) -> TrackerResult<usize> {
        let rows = self.conn.execute(
            "DELETE FROM sessions WHERE expires_at <= ? OR revoked_at IS NOT NULL",
            [now.to_rfc3339()],
        )?;
        Ok(rows)
    }
}

fn parse_optional_datetime(value: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_datetime).transpose()
}

fn row_to_account(row: &Row) -> rusqlite::Result<Account> {
    let id: String = row.get(0)?;
    let role: String = row.get(4)?;
    let is_verified: i32 = row.get(7)?;
    let created_at: String = row.get(12)?;
    Ok(Account {
        id: parse_uuid(&id)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: Role::parse(&role),
        employee_id: row.get(5)?,
        department: row.get(6)?,
        is_verified: is_verified != 0,
        verify_otp: row.get(8)?,
        verify_otp_expires_at: parse_optional_datetime(row.get(9)?)?,
        reset_otp: row.get(10)?,
        reset_otp_expires_at: parse_optional_datetime(row.get(11)?)?,
        created_at: parse_datetime(&created_at)?,
    })
}

fn row_to_session(row: &Row) -> rusqlite::Result<Session> {
    let id: String = row.get(0)?;
    let account_id: String = row.get(1)?;
    let created_at: String = row.get(3)?;
    let expires_at: String = row.get(4)?;
    Ok(Session {
        id: parse_uuid(&id)?,
        account_id: parse_uuid(&account_id)?,
        token_prefix: row.get(2)?,
        created_at: parse_datetime(&created_at)?,
        expires_at: parse_datetime(&expires_at)?,
        revoked_at: parse_optional_datetime(row.get(5)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(email: &str) -> Account {
        Account::new("Ann".into(), email.into(), "salt$hash".into())
    }

    #[test]
    fn test_account_crud() {
        let db = Database::open_memory().unwrap();
        let mut a = account("Ann@Example.com");
        db.insert_account(&a).unwrap();

        let found = db.get_account_by_email("ann@example.COM").unwrap().unwrap();
        assert_eq!(found.id, a.id);
        assert_eq!(found.role, Role::Employee);

        a.is_verified = true;
        a.employee_id = Some("E1".into());
        a.reset_otp = Some("123456".into());
        a.reset_otp_expires_at = Some(Utc::now());
        db.update_account(&a).unwrap();

        let reloaded = db.get_account(a.id).unwrap().unwrap();
        assert!(reloaded.is_verified);
        assert_eq!(reloaded.employee_id.as_deref(), Some("E1"));
        assert_eq!(reloaded.reset_otp.as_deref(), Some("123456"));

        let promoted = db.set_account_role(a.id, Role::Manager).unwrap();
        assert_eq!(promoted.role, Role::Manager);
        assert_eq!(db.list_accounts().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let db = Database::open_memory().unwrap();
        db.insert_account(&account("a@b.co")).unwrap();
        let err = db.insert_account(&account("A@B.co")).unwrap_err();
        assert!(matches!(err, TrackerError::Conflict(_)));
    }

    #[test]
    fn test_session_lifecycle() {
        let db = Database::open_memory().unwrap();
        let a = account("a@b.co");
        db.insert_account(&a).unwrap();

        let session = Session::new(a.id, "pt_1234".into(), Duration::days(7));
        db.insert_session(&session, "hash-1").unwrap();

        let now = Utc::now();
        let (found, owner) = db.find_active_session("hash-1", now).unwrap().unwrap();
        assert_eq!(found.id, session.id);
        assert_eq!(owner.id, a.id);

        // expired
        assert!(db
            .find_active_session("hash-1", now + Duration::days(8))
            .unwrap()
            .is_none());

        assert!(db.revoke_session("hash-1").unwrap());
        assert!(!db.revoke_session("hash-1").unwrap());
        assert!(db.find_active_session("hash-1", now).unwrap().is_none());
        assert_eq!(db.purge_sessions(now).unwrap(), 1);
    }

    #[test]
    fn test_revoke_account_sessions() {
        let db = Database::open_memory().unwrap();
        let a = account("a@b.co");
        db.insert_account(&a).unwrap();
        for hash in ["h1", "h2"] {
            db.insert_session(&Session::new(a.id, "pt_x".into(), Duration::days(1)), hash)
                .unwrap();
        }
        assert_eq!(db.revoke_account_sessions(a.id).unwrap(), 2);
        assert!(db.find_active_session("h2", Utc::now()).unwrap().is_none());
    }
}
