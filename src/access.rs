//! Role-based access policy.
//!
//! One function, [`authorize`], decides every request from the caller's role,
//! identity and verification state plus the employee the operation targets.
//! It has no dependency on storage or transport.

use uuid::Uuid;

use crate::error::{TrackerError, TrackerResult};
use crate::models::{Account, Role};

/// What the caller wants to do to the target employee's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Read one employee's profile or ledger
    Read,
    /// Read data spanning employees (lists, department reports, leaderboards)
    ReadAll,
    /// Add ledger entries for an employee
    Write,
    /// Change existing employee profiles or ledger entries
    Amend,
    /// Remove employees or ledger entries
    Delete,
    /// Create employees, manage departments and accounts, reconcile counters
    Administer,
}

impl Action {
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Write | Self::Amend | Self::Delete | Self::Administer)
    }
}

/// The authenticated identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub account_id: Option<Uuid>,
    pub role: Role,
    pub employee_id: Option<String>,
    pub is_verified: bool,
}

impl Caller {
    pub fn from_account(account: &Account) -> Self {
        Self {
            account_id: Some(account.id),
            role: account.role,
            employee_id: account.employee_id.clone(),
            is_verified: account.is_verified,
        }
    }

    /// The local operator running CLI commands against the database file.
    pub fn operator() -> Self {
        Self {
            account_id: None,
            role: Role::Admin,
            employee_id: None,
            is_verified: true,
        }
    }

    fn is_self(&self, target: Option<&str>) -> bool {
        matches!((self.employee_id.as_deref(), target), (Some(me), Some(t)) if me == t)
    }
}

/// Allow or deny `action` by `caller` on data owned by employee `target`.
///
/// Mutating actions by unverified accounts fail with `UnverifiedAccount`
/// before the role check runs.
pub fn authorize(caller: &Caller, action: Action, target: Option<&str>) -> TrackerResult<()> {
    if action.is_mutating() && !caller.is_verified {
        return Err(TrackerError::UnverifiedAccount);
    }

    let allowed = match (caller.role, action) {
        (Role::Admin, _) => true,
        (Role::Manager, Action::Delete | Action::Administer) => false,
        (Role::Manager, _) => true,
        (Role::Employee, Action::Read | Action::Write) => caller.is_self(target),
        (Role::Employee, _) => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(TrackerError::AccessDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> Caller {
        Caller {
            account_id: Some(Uuid::new_v4()),
            role,
            employee_id: Some("SELF".to_string()),
            is_verified: true,
        }
    }

    #[test]
    fn test_read_and_delete_matrix() {
        // (role, target, action, allowed)
        let cases = [
            (Role::Admin, "SELF", Action::Read, true),
            (Role::Admin, "OTHER", Action::Read, true),
            (Role::Manager, "SELF", Action::Read, true),
            (Role::Manager, "OTHER", Action::Read, true),
            (Role::Employee, "SELF", Action::Read, true),
            (Role::Employee, "OTHER", Action::Read, false),
            (Role::Admin, "SELF", Action::Delete, true),
            (Role::Admin, "OTHER", Action::Delete, true),
            (Role::Manager, "SELF", Action::Delete, false),
            (Role::Manager, "OTHER", Action::Delete, false),
            (Role::Employee, "SELF", Action::Delete, false),
            (Role::Employee, "OTHER", Action::Delete, false),
        ];

        for (role, target, action, allowed) in cases {
            let result = authorize(&caller(role), action, Some(target));
            if allowed {
                assert!(result.is_ok(), "{:?} {:?} on {} should pass", role, action, target);
            } else {
                assert!(
                    matches!(result, Err(TrackerError::AccessDenied)),
                    "{:?} {:?} on {} should be denied",
                    role,
                    action,
                    target
                );
            }
        }
    }

    #[test]
    fn test_employee_writes_only_own_records() {
        let me = caller(Role::Employee);
        assert!(authorize(&me, Action::Write, Some("SELF")).is_ok());
        assert!(authorize(&me, Action::Write, Some("OTHER")).is_err());
        assert!(authorize(&me, Action::Amend, Some("SELF")).is_err());
        assert!(authorize(&me, Action::ReadAll, None).is_err());
    }

    #[test]
    fn test_employee_without_link_is_denied() {
        let mut me = caller(Role::Employee);
        me.employee_id = None;
        assert!(matches!(
            authorize(&me, Action::Read, Some("SELF")),
            Err(TrackerError::AccessDenied)
        ));
        assert!(authorize(&me, Action::Read, None).is_err());
    }

    #[test]
    fn test_manager_cannot_administer() {
        let m = caller(Role::Manager);
        assert!(authorize(&m, Action::Amend, Some("OTHER")).is_ok());
        assert!(authorize(&m, Action::ReadAll, None).is_ok());
        assert!(authorize(&m, Action::Administer, None).is_err());
    }

    #[test]
    fn test_unverified_cannot_mutate() {
        let mut admin = caller(Role::Admin);
        admin.is_verified = false;
        assert!(authorize(&admin, Action::Read, Some("OTHER")).is_ok());
        assert!(matches!(
            authorize(&admin, Action::Write, Some("OTHER")),
            Err(TrackerError::UnverifiedAccount)
        ));
        assert!(matches!(
            authorize(&admin, Action::Delete, Some("OTHER")),
            Err(TrackerError::UnverifiedAccount)
        ));
    }

    #[test]
    fn test_operator_is_verified_admin() {
        let op = Caller::operator();
        assert!(authorize(&op, Action::Administer, None).is_ok());
    }
}
