//! Target arithmetic and ledger aggregation.
//!
//! [`calculator`] derives per-entry fields, [`aggregate`] reduces entries into
//! progress, summaries and leaderboards, and [`reports`] builds the monthly
//! and dashboard views on top of both.

pub mod aggregate;
pub mod calculator;
pub mod reports;

pub use aggregate::{
    department_summary, filtered_report, leaderboard, monthly_progress, DepartmentSummary,
    FilteredReport, Leaderboard, MonthlyProgress, Period, ReportFilter,
};
pub use calculator::{compute_derived, DerivedPerformance, MONTHLY_TARGET};
pub use reports::{
    dashboard_stats, department_report, employee_history, employee_report, monthly_report,
    monthly_report_csv, DashboardStats, DepartmentReport, EmployeeHistory, EmployeeReport, MonthlyReport,
    TargetStatus,
};
