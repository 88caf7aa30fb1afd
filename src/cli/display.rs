//! Plain-text tables for CLI output.

use crate::models::{Account, Department, Employee, Performance};
use crate::scoring::{
    DashboardStats, DepartmentReport, DepartmentSummary, EmployeeHistory, EmployeeReport,
    FilteredReport, Leaderboard, MonthlyProgress, MonthlyReport,
};

/// Truncate to `max` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let text: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", text.trim_end())
    } else {
        s.to_string()
    }
}

fn rule(widths: &[usize]) -> String {
    widths
        .iter()
        .map(|w| "─".repeat(*w))
        .collect::<Vec<_>>()
        .join("  ")
}

fn title(text: &str) {
    println!("{}", text);
    println!("{}", "─".repeat(text.chars().count()));
}

pub fn print_employee(employee: &Employee) {
    println!("{}\n", employee.name);
    println!("  ID:           {}", employee.employee_id);
    println!("  Department:   {}", employee.department);
    println!("  Position:     {}", employee.position);
    println!("  Points:       {:.2}", employee.points);
    if let Some(ref code) = employee.project_code {
        println!("  Project:      {}", code);
    }
    if let Some(ref coordinator) = employee.coordinator_name {
        println!("  Coordinator:  {}", coordinator);
    }
    println!("  Created:      {}", employee.created_at.format("%Y-%m-%d"));
}

pub fn print_employees(employees: &[Employee]) {
    if employees.is_empty() {
        println!("No employees found.");
        return;
    }
    println!(
        "{:<12}  {:<24}  {:<10}  {:<18}  {:>10}",
        "ID", "NAME", "DEPT", "POSITION", "POINTS"
    );
    println!("{}", rule(&[12, 24, 10, 18, 10]));
    for e in employees {
        println!(
            "{:<12}  {:<24}  {:<10}  {:<18}  {:>10.2}",
            truncate(&e.employee_id, 12),
            truncate(&e.name, 24),
            truncate(&e.department, 10),
            truncate(&e.position, 18),
            e.points
        );
    }
    println!("\n{} employee(s)", employees.len());
}

pub fn print_departments(departments: &[Department]) {
    if departments.is_empty() {
        println!("No departments found.");
        return;
    }
    println!("{:<36}  {:<12}  {}", "ID", "NAME", "DESCRIPTION");
    println!("{}", rule(&[36, 12, 30]));
    for d in departments {
        println!(
            "{:<36}  {:<12}  {}",
            d.id,
            truncate(&d.name, 12),
            d.description.as_deref().map(|s| truncate(s, 40)).unwrap_or_default()
        );
    }
}

pub fn print_performance(records: &[Performance]) {
    if records.is_empty() {
        println!("No ledger entries found.");
        return;
    }
    println!(
        "{:<8}  {:<12}  {:<10}  {:<11}  {:>9}  {:>11}  {:>8}  {:>8}",
        "ID", "EMPLOYEE", "DATE", "KIND", "POINTS", "SALES", "RATIO%", "DAILY%"
    );
    println!("{}", rule(&[8, 12, 10, 11, 9, 11, 8, 8]));
    for r in records {
        let id = r.id.to_string();
        println!(
            "{:<8}  {:<12}  {:<10}  {:<11}  {:>9.2}  {:>11.2}  {:>8.2}  {:>8.2}",
            &id[..8],
            truncate(&r.employee_id, 12),
            r.date.format("%Y-%m-%d"),
            r.kind.as_str(),
            r.daily_points,
            r.sales_amount,
            r.ratio,
            r.daily_progress
        );
    }
}

pub fn print_accounts(accounts: &[Account]) {
    if accounts.is_empty() {
        println!("No accounts found.");
        return;
    }
    println!(
        "{:<36}  {:<28}  {:<8}  {:<12}  {}",
        "ID", "EMAIL", "ROLE", "EMPLOYEE", "VERIFIED"
    );
    println!("{}", rule(&[36, 28, 8, 12, 8]));
    for a in accounts {
        println!(
            "{:<36}  {:<28}  {:<8}  {:<12}  {}",
            a.id,
            truncate(&a.email, 28),
            a.role.as_str(),
            a.employee_id.as_deref().unwrap_or("-"),
            if a.is_verified { "yes" } else { "no" }
        );
    }
}

pub fn print_monthly_progress(progress: &MonthlyProgress) {
    title(&format!(
        "{} - {}-{:02}",
        progress.employee_id, progress.year, progress.month
    ));
    println!("Total points:   {:.2}", progress.total_points);
    println!("Progress:       {:.2}%", progress.monthly_progress);
    println!();
    print_performance(&progress.performances);
}

pub fn print_department_summary(summary: &DepartmentSummary) {
    title(&format!(
        "{} - {}-{:02}",
        summary.department, summary.year, summary.month
    ));
    println!("Employees:        {}", summary.total_employees);
    println!("Total points:     {:.2}", summary.total_points);
    println!("Average progress: {:.2}%", summary.average_progress);
    println!();
    println!("{:<12}  {:<24}  {:>10}  {:>9}", "ID", "NAME", "POINTS", "PROGRESS");
    println!("{}", rule(&[12, 24, 10, 9]));
    for e in &summary.employee_performance {
        println!(
            "{:<12}  {:<24}  {:>10.2}  {:>8.2}%",
            truncate(&e.employee_id, 12),
            truncate(&e.name, 24),
            e.progress.total_points,
            e.progress.monthly_progress
        );
    }
}

pub fn print_leaderboard(board: &Leaderboard) {
    title(&format!(
        "{} leaderboard ({}: {} to {})",
        board.department,
        board.period.as_str(),
        board.start_date,
        board.end_date
    ));
    if board.leaderboard.is_empty() {
        println!("No employees in this department.");
        return;
    }
    println!(
        "{:>4}  {:<12}  {:<24}  {:>10}  {:>11}  {:>7}",
        "RANK", "ID", "NAME", "POINTS", "SALES", "ENTRIES"
    );
    println!("{}", rule(&[4, 12, 24, 10, 11, 7]));
    for (rank, e) in board.leaderboard.iter().enumerate() {
        println!(
            "{:>4}  {:<12}  {:<24}  {:>10.2}  {:>11.2}  {:>7}",
            rank + 1,
            truncate(&e.employee_id, 12),
            truncate(&e.name, 24),
            e.total_points,
            e.total_sales,
            e.record_count
        );
    }
}

pub fn print_monthly_report(report: &MonthlyReport) {
    title(&format!(
        "Monthly report {}-{:02} ({} days)",
        report.year, report.month, report.days_in_month
    ));
    if report.rows.is_empty() {
        println!("No employees.");
        return;
    }
    println!(
        "{:<12}  {:<20}  {:<10}  {:>10}  {:>11}  {:>8}  {:>8}  {:>4}  {}",
        "ID", "NAME", "DEPT", "POINTS", "SALES", "RATIO%", "TARGET%", "DAYS", "STATUS"
    );
    println!("{}", rule(&[12, 20, 10, 10, 11, 8, 8, 4, 11]));
    for r in &report.rows {
        println!(
            "{:<12}  {:<20}  {:<10}  {:>10.2}  {:>11.2}  {:>8.2}  {:>8.2}  {:>4}  {}",
            truncate(&r.employee_id, 12),
            truncate(&r.name, 20),
            truncate(&r.department, 10),
            r.total_points,
            r.total_sales,
            r.average_ratio,
            r.target_percentage,
            r.days_logged,
            r.status.as_str()
        );
    }
}

pub fn print_employee_report(report: &EmployeeReport) {
    let s = &report.summary;
    title(&format!(
        "{} ({}) - {}-{:02}",
        report.employee.name, report.employee.employee_id, report.year, report.month
    ));
    println!("Department:     {}", report.employee.department);
    println!("Position:       {}", report.employee.position);
    println!("Total points:   {:.2}", s.total_points);
    println!("Total sales:    {:.2}", s.total_sales);
    println!("Average ratio:  {:.2}%", s.average_ratio);
    println!("Target:         {:.2}% ({})", s.target_percentage, s.status.as_str());
    println!("Remaining:      {:.2}", s.remaining_points);
    println!("Days logged:    {}/{}", s.days_logged, s.days_in_month);

    if report.daily_records.is_empty() {
        return;
    }
    println!();
    println!(
        "{:<10}  {:>9}  {:>11}  {:>8}  {:>8}  {:>9}",
        "DATE", "POINTS", "SALES", "RATIO%", "DAILY%", "SURPLUS"
    );
    println!("{}", rule(&[10, 9, 11, 8, 8, 9]));
    for d in &report.daily_records {
        println!(
            "{:<10}  {:>9.2}  {:>11.2}  {:>8.2}  {:>8.2}  {:>9.2}",
            d.date.format("%Y-%m-%d"),
            d.daily_points,
            d.sales_amount,
            d.ratio,
            d.daily_progress,
            d.surplus
        );
    }
}

pub fn print_department_report(report: &DepartmentReport) {
    let s = &report.summary;
    title(&format!(
        "{} - {}-{:02}",
        report.department, report.year, report.month
    ));
    println!("Employees:      {}", s.total_employees);
    println!("Total points:   {:.2}", s.total_points);
    println!("Total sales:    {:.2}", s.total_sales);
    println!("Ratio:          {:.2}%", s.ratio);
    println!(
        "Achieved:       {} of {} ({:.2}%)",
        s.achieved_target, s.total_employees, s.achievement_rate
    );
    println!();
    for r in &report.employees {
        println!(
            "  {:<12}  {:<20}  {:>10.2}  {:>8.2}%  {}",
            truncate(&r.employee_id, 12),
            truncate(&r.name, 20),
            r.total_points,
            r.target_percentage,
            r.status.as_str()
        );
    }
}

pub fn print_history(history: &EmployeeHistory) {
    title(&format!(
        "{} ({}) history",
        history.employee.name, history.employee.employee_id
    ));
    let from = history.start_date.map(|d| d.to_string()).unwrap_or_else(|| "start".into());
    let to = history.end_date.map(|d| d.to_string()).unwrap_or_else(|| "today".into());
    println!("Range:          {} to {}", from, to);
    println!("Entries:        {}", history.record_count);
    println!("Total points:   {:.2}", history.total_points);
    println!("Total sales:    {:.2}", history.total_sales);
    println!();
    print_performance(&history.performances);
}

pub fn print_filtered_report(report: &FilteredReport) {
    let s = &report.performance_stats;
    title("Performance report");
    println!("Entries:          {}", s.total_records);
    println!("Average points:   {:.2}", s.average_points);
    println!("Total sales:      {:.2}", s.total_sales);
    println!("Average progress: {:.2}%", s.average_progress);

    if !report.department_stats.is_empty() {
        println!("\nBy department:");
        for d in &report.department_stats {
            println!("  {:<12}  {:>10.2}", truncate(&d.name, 12), d.average_score);
        }
    }

    if !report.employee_stats.is_empty() {
        println!("\nBy employee:");
        for e in &report.employee_stats {
            println!(
                "  {:<12}  {:<20}  {:<10}  {:>10.2}  {:>11.2}  {:>7.2}%",
                truncate(&e.employee_id, 12),
                truncate(&e.name, 20),
                truncate(&e.department, 10),
                e.average_points,
                e.total_sales,
                e.target_progress
            );
        }
    }
}

pub fn print_dashboard(stats: &DashboardStats) {
    title("Dashboard");
    println!("Employees:        {}", stats.total_employees);
    println!("Ledger entries:   {}", stats.total_performance);
    println!("Average points:   {:.2}", stats.average_score);

    if !stats.recent_activity.is_empty() {
        println!("\nRecent activity:");
        for r in &stats.recent_activity {
            println!(
                "  {}  {:<12}  {:>9.2} pts  {:>11.2} sales",
                r.date.format("%Y-%m-%d"),
                truncate(&r.employee_id, 12),
                r.daily_points,
                r.sales_amount
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer name", 8), "a much…");
        assert_eq!(truncate("ÄÖÜäöü", 4), "ÄÖÜ…");
    }

    #[test]
    fn test_rule_widths() {
        assert_eq!(rule(&[2, 3]), "──  ───");
    }
}
