use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use uuid::Uuid;

use super::display::print_accounts;
use super::ui::prompt_new_password;
use crate::auth;
use crate::db::Database;
use crate::error::TrackerError;
use crate::models::{Account, Role};

#[derive(Args)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub command: AccountCommands,
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a verified login account (prompts for the password)
    Create {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        /// admin, manager or employee
        #[arg(short, long, default_value = "employee")]
        role: String,
        /// Employee this account acts as
        #[arg(long)]
        employee: Option<String>,
    },
    /// List accounts
    List,
    /// Change an account's role
    Role {
        /// Account email or id
        account: String,
        /// admin, manager or employee
        role: String,
    },
    /// Mark an account verified without a one-time code
    Verify {
        /// Account email or id
        account: String,
    },
    /// Link an account to an employee, or unlink with --clear
    Link {
        /// Account email or id
        account: String,
        employee_id: Option<String>,
        #[arg(long)]
        clear: bool,
    },
    /// Revoke every session of an account
    Logout {
        /// Account email or id
        account: String,
    },
}

pub fn run_account(db: &Database, args: AccountArgs) -> Result<()> {
    match args.command {
        AccountCommands::Create {
            name,
            email,
            role,
            employee,
        } => {
            let role = parse_role(&role)?;
            let password = prompt_new_password("Password:")?;
            let account =
                auth::create_account(db, &name, &email, &password, role, employee.as_deref())?;
            println!("Created {} account for {} ({})", account.role, account.name, account.email);
        }
        AccountCommands::List => {
            print_accounts(&db.list_accounts()?);
        }
        AccountCommands::Role { account, role } => {
            let account = resolve(db, &account)?;
            let updated = db.set_account_role(account.id, parse_role(&role)?)?;
            println!("{} is now {}", updated.email, updated.role);
        }
        AccountCommands::Verify { account } => {
            let mut account = resolve(db, &account)?;
            if account.is_verified {
                println!("{} is already verified.", account.email);
                return Ok(());
            }
            account.is_verified = true;
            account.verify_otp = None;
            account.verify_otp_expires_at = None;
            db.update_account(&account)?;
            println!("Verified {}", account.email);
        }
        AccountCommands::Link {
            account,
            employee_id,
            clear,
        } => {
            let account = resolve(db, &account)?;
            let target = match (employee_id.as_deref(), clear) {
                (Some(id), false) => Some(id),
                (None, true) => None,
                _ => return Err(anyhow!("Pass an employee id or --clear, not both.")),
            };
            let updated = auth::link_employee(db, account.id, target)?;
            match updated.employee_id {
                Some(ref id) => println!("{} now acts as employee {}", updated.email, id),
                None => println!("{} is no longer linked to an employee", updated.email),
            }
        }
        AccountCommands::Logout { account } => {
            let account = resolve(db, &account)?;
            let revoked = db.revoke_account_sessions(account.id)?;
            println!("Revoked {} session(s) for {}", revoked, account.email);
        }
    }
    Ok(())
}

/// Strict role parsing; `Role::parse` falls back to employee for stored values.
fn parse_role(input: &str) -> Result<Role> {
    match input.trim().to_lowercase().as_str() {
        "admin" => Ok(Role::Admin),
        "manager" => Ok(Role::Manager),
        "employee" => Ok(Role::Employee),
        other => Err(anyhow!(
            "Unknown role '{}'. Use admin, manager or employee.",
            other
        )),
    }
}

fn resolve(db: &Database, identifier: &str) -> Result<Account> {
    let found = match Uuid::parse_str(identifier.trim()) {
        Ok(id) => db.get_account(id)?,
        Err(_) => db.get_account_by_email(identifier)?,
    };
    found.ok_or_else(|| TrackerError::account_not_found(identifier.trim()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role_is_strict() {
        assert_eq!(parse_role("Manager").unwrap(), Role::Manager);
        assert_eq!(parse_role(" admin ").unwrap(), Role::Admin);
        assert!(parse_role("boss").is_err());
    }

    #[test]
    fn test_resolve_by_email_or_id() {
        let db = Database::open_memory().unwrap();
        let account =
            auth::create_account(&db, "Ann", "ann@example.com", "secret1", Role::Manager, None)
                .unwrap();

        assert_eq!(resolve(&db, "ANN@example.com").unwrap().id, account.id);
        assert_eq!(resolve(&db, &account.id.to_string()).unwrap().id, account.id);
        assert!(resolve(&db, "bob@example.com").is_err());
    }
}
