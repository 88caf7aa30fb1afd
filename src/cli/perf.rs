use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};
use uuid::Uuid;

use super::display::print_performance;
use super::ui::{confirm, parse_date};
use crate::db::{Database, LedgerQuery};
use crate::models::{EntryKind, Performance};

#[derive(Args)]
pub struct PerfArgs {
    #[command(subcommand)]
    pub command: PerfCommands,
}

#[derive(Subcommand)]
pub enum PerfCommands {
    /// Add a ledger entry (several per day are allowed)
    Record {
        employee_id: String,
        #[arg(short, long)]
        points: f64,
        #[arg(short, long, default_value_t = 0.0)]
        sales: f64,
        /// Entry date, YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Set the day's entry, replacing any existing one for that day
    Submit {
        employee_id: String,
        #[arg(short, long)]
        points: f64,
        /// Sales amount (kept from the existing entry when omitted)
        #[arg(short, long)]
        sales: Option<f64>,
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Add a points entry with a description
    Points {
        employee_id: String,
        points: f64,
        #[arg(short = 'm', long)]
        description: String,
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Change the points or sales of an entry
    Update {
        /// Entry id or unique id prefix
        id: String,
        #[arg(short, long)]
        points: f64,
        #[arg(short, long)]
        sales: Option<f64>,
    },
    /// Delete an entry
    Delete {
        /// Entry id or unique id prefix
        id: String,
        #[arg(short, long)]
        force: bool,
    },
    /// List ledger entries, newest first
    List {
        #[arg(short, long)]
        employee: Option<String>,
        /// Start date, YYYY-MM-DD
        #[arg(long)]
        from: Option<String>,
        /// End date, YYYY-MM-DD
        #[arg(long)]
        to: Option<String>,
        /// performance or points
        #[arg(short, long)]
        kind: Option<String>,
    },
}

pub fn run_perf(db: &Database, args: PerfArgs) -> Result<()> {
    match args.command {
        PerfCommands::Record {
            employee_id,
            points,
            sales,
            date,
        } => {
            let record = db.record_performance(&employee_id, date_or_today(date)?, points, sales)?;
            print_written("Recorded", &record);
        }
        PerfCommands::Submit {
            employee_id,
            points,
            sales,
            date,
        } => {
            let submission = db.submit_daily_points(&employee_id, date_or_today(date)?, points, sales)?;
            let verb = if submission.created { "Recorded" } else { "Replaced" };
            print_written(verb, &submission.record);
        }
        PerfCommands::Points {
            employee_id,
            points,
            description,
            date,
        } => {
            let record = db.submit_points(&employee_id, date_or_today(date)?, points, &description)?;
            print_written("Submitted", &record);
        }
        PerfCommands::Update { id, points, sales } => {
            let id = resolve_record(db, &id)?;
            let record = db.update_performance(id, points, sales)?;
            print_written("Updated", &record);
        }
        PerfCommands::Delete { id, force } => {
            let id = resolve_record(db, &id)?;
            let record = db
                .get_performance(id)?
                .ok_or_else(|| anyhow!("No ledger entry with id {}", id))?;
            print_performance(std::slice::from_ref(&record));
            println!();

            if !force && !confirm("Delete this entry?").unwrap_or(false) {
                println!("Cancelled.");
                return Ok(());
            }

            db.delete_performance(id)?;
            println!("Deleted.");
        }
        PerfCommands::List {
            employee,
            from,
            to,
            kind,
        } => {
            let query = LedgerQuery {
                employee_id: employee,
                start_date: from.as_deref().map(parse_date).transpose()?,
                end_date: to.as_deref().map(parse_date).transpose()?,
                kind: kind.as_deref().map(EntryKind::parse).transpose()?,
            };
            print_performance(&db.list_performance(&query)?);
        }
    }
    Ok(())
}

fn date_or_today(date: Option<String>) -> Result<NaiveDate> {
    match date {
        Some(raw) => parse_date(&raw),
        None => Ok(Local::now().date_naive()),
    }
}

fn print_written(verb: &str, record: &Performance) {
    println!(
        "{} {:.2} points for {} on {} ({:.2}% of daily target)",
        verb, record.daily_points, record.employee_id, record.date, record.daily_progress
    );
    println!("Entry: {}", record.id);
}

/// Accept a full entry id or a prefix that matches exactly one entry.
fn resolve_record(db: &Database, identifier: &str) -> Result<Uuid> {
    let identifier = identifier.trim().to_lowercase();
    if let Ok(id) = Uuid::parse_str(&identifier) {
        return Ok(id);
    }
    if identifier.len() < 4 {
        return Err(anyhow!("Id prefix '{}' is too short", identifier));
    }

    let matches: Vec<Uuid> = db
        .list_performance(&LedgerQuery::default())?
        .into_iter()
        .map(|r| r.id)
        .filter(|id| id.to_string().starts_with(&identifier))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(anyhow!("No ledger entry matches '{}'", identifier)),
        _ => Err(anyhow!(
            "'{}' matches {} entries; use more characters",
            identifier,
            matches.len()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Employee;

    #[test]
    fn test_resolve_record_by_prefix() {
        let db = Database::open_memory().unwrap();
        db.insert_employee(&Employee::new(
            "E1".into(),
            "Ann".into(),
            "MKT 1".into(),
            "Rep".into(),
        ))
        .unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let record = db.record_performance("E1", date, 10.0, 0.0).unwrap();

        let full = record.id.to_string();
        assert_eq!(resolve_record(&db, &full).unwrap(), record.id);
        assert_eq!(resolve_record(&db, &full[..8]).unwrap(), record.id);
        assert!(resolve_record(&db, "abc").is_err());
    }
}
