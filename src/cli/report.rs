use anyhow::Result;
use chrono::{Datelike, Local};
use clap::{Args, Subcommand};
use std::fs;
use std::path::PathBuf;

use super::display::{
    print_dashboard, print_department_report, print_department_summary, print_employee_report,
    print_filtered_report, print_history, print_leaderboard, print_monthly_progress,
    print_monthly_report,
};
use super::ui::parse_date;
use crate::db::Database;
use crate::scoring::{monthly_report_csv, Period, ReportFilter};

#[derive(Args)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub command: ReportCommands,
}

/// Year and month selection, defaulting to the current month.
#[derive(Args, Clone, Copy)]
pub struct MonthArgs {
    #[arg(short, long)]
    pub year: Option<i32>,
    /// Month number, 1-12
    #[arg(short, long)]
    pub month: Option<u32>,
}

impl MonthArgs {
    fn resolve(&self) -> (i32, u32) {
        let today = Local::now().date_naive();
        (
            self.year.unwrap_or_else(|| today.year()),
            self.month.unwrap_or_else(|| today.month()),
        )
    }
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Every employee's month against the target
    Monthly {
        #[command(flatten)]
        month: MonthArgs,
        /// Write CSV instead of a table ("-" for stdout)
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
    },
    /// One employee's month, day by day
    Employee {
        employee_id: String,
        #[command(flatten)]
        month: MonthArgs,
    },
    /// One department's month
    Department {
        department: String,
        #[command(flatten)]
        month: MonthArgs,
    },
    /// Department summary with per-employee progress
    Summary {
        department: String,
        #[command(flatten)]
        month: MonthArgs,
    },
    /// Rank a department's employees over a period
    Leaderboard {
        department: String,
        /// daily, weekly or monthly
        #[arg(short, long, default_value = "monthly")]
        period: String,
    },
    /// Monthly progress for one employee
    Progress {
        employee_id: String,
        #[command(flatten)]
        month: MonthArgs,
    },
    /// An employee's entries over a date range
    History {
        employee_id: String,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    /// Statistics over a filtered set of entries
    Filtered {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(short, long)]
        department: Option<String>,
        #[arg(short, long)]
        employee: Option<String>,
    },
    /// Headline counts and recent activity
    Dashboard,
}

pub fn run_report(db: &Database, args: ReportArgs) -> Result<()> {
    match args.command {
        ReportCommands::Monthly { month, csv } => {
            let (year, month) = month.resolve();
            let report = db.monthly_report(year, month)?;
            match csv {
                Some(path) => {
                    let body = monthly_report_csv(&report)?;
                    if path.as_os_str() == "-" {
                        print!("{}", body);
                    } else {
                        fs::write(&path, body)?;
                        println!(
                            "Wrote {} row(s) to {}",
                            report.rows.len(),
                            path.display()
                        );
                    }
                }
                None => print_monthly_report(&report),
            }
        }
        ReportCommands::Employee { employee_id, month } => {
            let (year, month) = month.resolve();
            print_employee_report(&db.employee_report(&employee_id, year, month)?);
        }
        ReportCommands::Department { department, month } => {
            let (year, month) = month.resolve();
            print_department_report(&db.department_report(&department, year, month)?);
        }
        ReportCommands::Summary { department, month } => {
            let (year, month) = month.resolve();
            print_department_summary(&db.department_summary(&department, year, month)?);
        }
        ReportCommands::Leaderboard { department, period } => {
            let period = Period::parse(&period)?;
            let today = Local::now().date_naive();
            print_leaderboard(&db.leaderboard(&department, period, today)?);
        }
        ReportCommands::Progress { employee_id, month } => {
            let (year, month) = month.resolve();
            print_monthly_progress(&db.monthly_progress(&employee_id, year, month)?);
        }
        ReportCommands::History {
            employee_id,
            from,
            to,
        } => {
            let history = db.employee_history(
                &employee_id,
                from.as_deref().map(parse_date).transpose()?,
                to.as_deref().map(parse_date).transpose()?,
            )?;
            print_history(&history);
        }
        ReportCommands::Filtered {
            from,
            to,
            department,
            employee,
        } => {
            let filter = ReportFilter {
                start_date: from.as_deref().map(parse_date).transpose()?,
                end_date: to.as_deref().map(parse_date).transpose()?,
                department,
                employee_id: employee,
            };
            print_filtered_report(&db.filtered_report(&filter)?);
        }
        ReportCommands::Dashboard => {
            print_dashboard(&db.dashboard_stats()?);
        }
    }
    Ok(())
}
