use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod account;
pub mod admin;
pub mod department;
pub mod display;
pub mod employee;
pub mod perf;
pub mod report;
pub mod serve;
pub mod ui;

pub use account::{run_account, AccountArgs};
pub use admin::{run_config, run_reconcile, ConfigArgs, ReconcileArgs};
pub use department::{run_department, DepartmentArgs};
pub use employee::{run_employee, EmployeeArgs};
pub use perf::{run_perf, PerfArgs};
pub use report::{run_report, ReportArgs};
pub use serve::{run_serve, ServeArgs};

#[derive(Parser)]
#[command(name = "perftrack")]
#[command(about = "Employee performance tracking: daily points, monthly targets and leaderboards")]
#[command(version)]
pub struct Cli {
    /// Database file (default: $PERFTRACK_DB, then the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    Serve(ServeArgs),
    /// Manage employees
    Employee(EmployeeArgs),
    /// Manage departments
    Department(DepartmentArgs),
    /// Record and edit ledger entries
    Perf(PerfArgs),
    /// Progress, summaries, leaderboards and exports
    Report(ReportArgs),
    /// Manage login accounts
    Account(AccountArgs),
    /// Check points counters against the ledger
    Reconcile(ReconcileArgs),
    /// Show or change stored settings
    Config(ConfigArgs),
}
