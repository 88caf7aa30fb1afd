//! Maintenance commands: counter reconciliation and stored settings.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::{self, ServerConfig, KNOWN_SETTINGS};
use crate::db::Database;

#[derive(Args)]
pub struct ReconcileArgs {
    /// Rewrite drifting counters from the ledger
    #[arg(long)]
    pub fix: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show effective configuration and stored settings
    Show,
    /// Store a setting
    Set { key: String, value: String },
    /// Remove a stored setting
    Unset { key: String },
}

/// Compare each employee's points counter with their ledger sum.
pub fn run_reconcile(db: &Database, args: ReconcileArgs) -> Result<()> {
    let drifts = db.reconcile_points(args.fix)?;

    if drifts.is_empty() {
        println!("All counters match the ledger.");
        return Ok(());
    }

    println!(
        "{:<12}  {:>12}  {:>12}  {:>12}",
        "EMPLOYEE", "COUNTER", "LEDGER", "DRIFT"
    );
    for d in &drifts {
        println!(
            "{:<12}  {:>12.2}  {:>12.2}  {:>+12.2}",
            d.employee_id,
            d.stored,
            d.ledger,
            d.difference()
        );
    }
    println!();

    if args.fix {
        println!("Fixed {} counter(s).", drifts.len());
    } else {
        println!(
            "{} counter(s) out of sync. Run with --fix to repair.",
            drifts.len()
        );
    }
    Ok(())
}

pub fn run_config(db: &Database, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let effective = ServerConfig::load(db)?;
            println!("Effective configuration");
            println!("───────────────────────");
            println!("Port:          {}", effective.port);
            println!("Session days:  {}", effective.session_days);
            println!();

            let stored = db.list_settings()?;
            if stored.is_empty() {
                println!("No stored settings. Known keys: {}", KNOWN_SETTINGS.join(", "));
            } else {
                println!("Stored settings");
                for (key, value) in stored {
                    println!("  {} = {}", key, value);
                }
            }
        }
        ConfigCommands::Set { key, value } => {
            config::validate_setting(&key, &value)?;
            db.set_setting(&key, value.trim())?;
            println!("Set {} = {}", key, value.trim());
        }
        ConfigCommands::Unset { key } => {
            if db.delete_setting(&key)? {
                println!("Removed {}", key);
            } else {
                println!("{} was not set", key);
            }
        }
    }
    Ok(())
}
