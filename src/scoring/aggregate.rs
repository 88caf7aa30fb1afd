//! Reductions over ledger entries: monthly progress, department summaries,
//! leaderboards and filtered reports.
//!
//! Functions take the rows they need as slices and never touch storage, so the
//! same code serves the CLI, the HTTP API and tests. Callers may pass a wider
//! set of rows than needed; every function re-applies its own filters.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use super::calculator::{month_bounds, monthly_progress as progress_of};
use crate::error::{TrackerError, TrackerResult};
use crate::models::{Department, Employee, Performance};

/// Number of entries returned as `recent_performance` in a filtered report.
pub const RECENT_LIMIT: usize = 10;

pub(crate) fn sum_points<'a>(records: impl IntoIterator<Item = &'a Performance>) -> f64 {
    records.into_iter().map(|r| r.daily_points).sum()
}

pub(crate) fn sum_sales<'a>(records: impl IntoIterator<Item = &'a Performance>) -> f64 {
    records.into_iter().map(|r| r.sales_amount).sum()
}

pub(crate) fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Descending by a float key; NaN-free input compares totally.
pub(crate) fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Employees of one department, ordered by employee id.
pub(crate) fn department_members<'a>(department: &str, employees: &'a [Employee]) -> Vec<&'a Employee> {
    let mut members: Vec<&Employee> = employees
        .iter()
        .filter(|e| e.department == department)
        .collect();
    members.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));
    members
}

// ==================== MONTHLY PROGRESS ====================

/// One employee's points for a calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProgress {
    pub employee_id: String,
    pub year: i32,
    pub month: u32,
    pub total_points: f64,
    pub monthly_progress: f64,
    pub performances: Vec<Performance>,
}

pub fn monthly_progress(
    employee_id: &str,
    year: i32,
    month: u32,
    records: &[Performance],
    monthly_target: f64,
) -> TrackerResult<MonthlyProgress> {
    let (first, last) = month_bounds(year, month)?;

    let mut performances: Vec<Performance> = records
        .iter()
        .filter(|r| r.employee_id == employee_id && r.date >= first && r.date <= last)
        .cloned()
        .collect();
    performances.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));

    let total_points = sum_points(&performances);
    Ok(MonthlyProgress {
        employee_id: employee_id.to_string(),
        year,
        month,
        total_points,
        monthly_progress: progress_of(total_points, monthly_target)?,
        performances,
    })
}

// ==================== DEPARTMENT SUMMARY ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeMonthly {
    pub employee_id: String,
    pub name: String,
    #[serde(flatten)]
    pub progress: MonthlyProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentSummary {
    pub department: String,
    pub year: i32,
    pub month: u32,
    pub total_employees: usize,
    pub total_points: f64,
    pub average_progress: f64,
    pub employee_performance: Vec<EmployeeMonthly>,
}

/// Monthly summary of every employee in `department`.
///
/// `average_progress` is the department's combined points over the combined
/// target of all its employees.
pub fn department_summary(
    department: &str,
    year: i32,
    month: u32,
    employees: &[Employee],
    records: &[Performance],
    monthly_target: f64,
) -> TrackerResult<DepartmentSummary> {
    let members = department_members(department, employees);
    if members.is_empty() {
        return Err(TrackerError::EmptyDepartment(department.to_string()));
    }

    let employee_performance = members
        .iter()
        .map(|e| {
            Ok(EmployeeMonthly {
                employee_id: e.employee_id.clone(),
                name: e.name.clone(),
                progress: monthly_progress(&e.employee_id, year, month, records, monthly_target)?,
            })
        })
        .collect::<TrackerResult<Vec<_>>>()?;

    let total_points: f64 = employee_performance
        .iter()
        .map(|e| e.progress.total_points)
        .sum();
    let combined_target = members.len() as f64 * monthly_target;

    Ok(DepartmentSummary {
        department: department.to_string(),
        year,
        month,
        total_employees: members.len(),
        total_points,
        average_progress: progress_of(total_points, combined_target)?,
        employee_performance,
    })
}

// ==================== LEADERBOARD ====================

/// Time window selector for leaderboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> TrackerResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(TrackerError::invalid(format!(
                "period must be daily, weekly or monthly, got '{}'",
                other
            ))),
        }
    }

    /// Inclusive `(start, end)` days of the window ending `today`.
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = match self {
            Self::Daily => today,
            Self::Weekly => today - Duration::days(7),
            Self::Monthly => today.with_day(1).unwrap_or(today),
        };
        (start, today)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub employee_id: String,
    pub name: String,
    pub position: String,
    pub total_points: f64,
    pub total_sales: f64,
    pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub department: String,
    pub period: Period,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Rank a department's employees by points within the period window.
///
/// Employees without entries in the window are left out. Ties keep employee-id
/// order (the sort is stable over members sorted by id).
pub fn leaderboard(
    department: &str,
    period: Period,
    today: NaiveDate,
    employees: &[Employee],
    records: &[Performance],
) -> TrackerResult<Leaderboard> {
    let members = department_members(department, employees);
    if members.is_empty() {
        return Err(TrackerError::EmptyDepartment(department.to_string()));
    }

    let (start_date, end_date) = period.window(today);

    let mut by_employee: HashMap<&str, Vec<&Performance>> = HashMap::new();
    for record in records {
        if record.date >= start_date && record.date <= end_date {
            by_employee
                .entry(record.employee_id.as_str())
                .or_default()
                .push(record);
        }
    }

    let mut entries: Vec<LeaderboardEntry> = members
        .iter()
        .filter_map(|e| {
            let rows = by_employee.get(e.employee_id.as_str())?;
            Some(LeaderboardEntry {
                employee_id: e.employee_id.clone(),
                name: e.name.clone(),
                position: e.position.clone(),
                total_points: sum_points(rows.iter().copied()),
                total_sales: sum_sales(rows.iter().copied()),
                record_count: rows.len(),
            })
        })
        .collect();
    entries.sort_by(|a, b| desc(a.total_points, b.total_points));

    Ok(Leaderboard {
        department: department.to_string(),
        period,
        start_date,
        end_date,
        leaderboard: entries,
    })
}

// ==================== FILTERED REPORT ====================

/// Optional filters for [`filtered_report`]; each one applies independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub department: Option<String>,
    pub employee_id: Option<String>,
}

impl ReportFilter {
    fn matches(&self, record: &Performance, departments_by_employee: &HashMap<&str, &str>) -> bool {
        if let Some(start) = self.start_date {
            if record.date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if record.date > end {
                return false;
            }
        }
        if let Some(ref employee_id) = self.employee_id {
            if record.employee_id != *employee_id {
                return false;
            }
        }
        if let Some(ref department) = self.department {
            match departments_by_employee.get(record.employee_id.as_str()) {
                Some(dept) if *dept == department.as_str() => {}
                _ => return false,
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub total_records: usize,
    pub average_points: f64,
    pub total_sales: f64,
    pub average_progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentStat {
    pub name: String,
    pub average_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeStat {
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub average_points: f64,
    pub total_sales: f64,
    pub target_progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentEntry {
    pub id: uuid::Uuid,
    pub employee_id: String,
    pub date: NaiveDate,
    pub daily_points: f64,
    pub sales_amount: f64,
}

impl From<&Performance> for RecentEntry {
    fn from(p: &Performance) -> Self {
        Self {
            id: p.id,
            employee_id: p.employee_id.clone(),
            date: p.date,
            daily_points: p.daily_points,
            sales_amount: p.sales_amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredReport {
    pub filter: ReportFilter,
    pub performance_stats: PerformanceStats,
    pub department_stats: Vec<DepartmentStat>,
    pub employee_stats: Vec<EmployeeStat>,
    pub recent_performance: Vec<RecentEntry>,
}

/// Newest first: by date, then by creation time.
pub(crate) fn sort_newest_first(records: &mut [&Performance]) {
    records.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
}

/// Aggregate statistics over the entries matching `filter`.
///
/// Department and employee breakdowns cover every known department and
/// employee; those without matching entries report zeros.
pub fn filtered_report(
    filter: &ReportFilter,
    employees: &[Employee],
    departments: &[Department],
    records: &[Performance],
) -> FilteredReport {
    let departments_by_employee: HashMap<&str, &str> = employees
        .iter()
        .map(|e| (e.employee_id.as_str(), e.department.as_str()))
        .collect();

    let mut matched: Vec<&Performance> = records
        .iter()
        .filter(|r| filter.matches(r, &departments_by_employee))
        .collect();
    sort_newest_first(&mut matched);

    let total_records = matched.len();
    let performance_stats = PerformanceStats {
        total_records,
        average_points: mean(sum_points(matched.iter().copied()), total_records),
        total_sales: sum_sales(matched.iter().copied()),
        average_progress: mean(matched.iter().map(|r| r.daily_progress).sum(), total_records),
    };

    let department_stats = departments
        .iter()
        .map(|d| {
            let rows: Vec<&Performance> = matched
                .iter()
                .copied()
                .filter(|r| departments_by_employee.get(r.employee_id.as_str()) == Some(&d.name.as_str()))
                .collect();
            DepartmentStat {
                name: d.name.clone(),
                average_score: mean(sum_points(rows.iter().copied()), rows.len()),
            }
        })
        .collect();

    let mut employee_stats: Vec<EmployeeStat> = employees
        .iter()
        .map(|e| {
            let rows: Vec<&Performance> = matched
                .iter()
                .copied()
                .filter(|r| r.employee_id == e.employee_id)
                .collect();
            EmployeeStat {
                employee_id: e.employee_id.clone(),
                name: e.name.clone(),
                department: e.department.clone(),
                average_points: mean(sum_points(rows.iter().copied()), rows.len()),
                total_sales: sum_sales(rows.iter().copied()),
                target_progress: mean(rows.iter().map(|r| r.daily_progress).sum(), rows.len()),
            }
        })
        .collect();
    employee_stats.sort_by(|a, b| desc(a.average_points, b.average_points));

    let recent_performance = matched
        .iter()
        .take(RECENT_LIMIT)
        .map(|r| RecentEntry::from(*r))
        .collect();

    FilteredReport {
        filter: filter.clone(),
        performance_stats,
        department_stats,
        employee_stats,
        recent_performance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::calculator::MONTHLY_TARGET;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn emp(id: &str, dept: &str) -> Employee {
        Employee::new(id.into(), format!("Name {}", id), dept.into(), "Rep".into())
    }

    fn rec(id: &str, date: NaiveDate, points: f64, sales: f64) -> Performance {
        Performance::new(id.into(), date, points, sales).unwrap()
    }

    #[test]
    fn test_monthly_progress_scenario() {
        let records = vec![
            rec("E1", day(2024, 3, 1), 1000.0, 0.0),
            rec("E1", day(2024, 3, 15), 2000.0, 0.0),
            rec("E1", day(2024, 3, 31), 3000.0, 0.0),
            rec("E1", day(2024, 4, 1), 9999.0, 0.0),
            rec("E1", day(2024, 2, 29), 9999.0, 0.0),
            rec("E2", day(2024, 3, 10), 9999.0, 0.0),
        ];
        let p = monthly_progress("E1", 2024, 3, &records, MONTHLY_TARGET).unwrap();
        assert_eq!(p.total_points, 6000.0);
        assert_eq!(p.monthly_progress, 25.0);
        assert_eq!(p.performances.len(), 3);
        assert_eq!(p.performances[0].date, day(2024, 3, 1));
    }

    #[test]
    fn test_monthly_progress_rejects_bad_month() {
        assert!(matches!(
            monthly_progress("E1", 2024, 13, &[], MONTHLY_TARGET),
            Err(TrackerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_department_summary() {
        let employees = vec![emp("E1", "MKT 1"), emp("E2", "MKT 1"), emp("E3", "MKT 2")];
        let records = vec![
            rec("E1", day(2024, 3, 1), 6000.0, 0.0),
            rec("E2", day(2024, 3, 2), 6000.0, 0.0),
            rec("E3", day(2024, 3, 2), 6000.0, 0.0),
        ];
        let s = department_summary("MKT 1", 2024, 3, &employees, &records, MONTHLY_TARGET).unwrap();
        assert_eq!(s.total_employees, 2);
        assert_eq!(s.total_points, 12000.0);
        assert_eq!(s.average_progress, 25.0);
        assert_eq!(s.employee_performance.len(), 2);
    }

    #[test]
    fn test_department_summary_empty() {
        let employees = vec![emp("E1", "MKT 1")];
        let result = department_summary("MKT4", 2024, 3, &employees, &[], MONTHLY_TARGET);
        assert!(matches!(result, Err(TrackerError::EmptyDepartment(ref d)) if d == "MKT4"));
    }

    #[test]
    fn test_period_window() {
        let today = day(2024, 3, 20);
        assert_eq!(Period::Daily.window(today), (today, today));
        assert_eq!(Period::Weekly.window(today), (day(2024, 3, 13), today));
        assert_eq!(Period::Monthly.window(today), (day(2024, 3, 1), today));
    }

    #[test]
    fn test_period_parse() {
        assert_eq!(Period::parse("weekly").unwrap(), Period::Weekly);
        assert_eq!(Period::parse("").unwrap(), Period::Daily);
        assert!(Period::parse("yearly").is_err());
    }

    #[test]
    fn test_leaderboard_ordering() {
        let today = day(2024, 3, 20);
        let employees = vec![emp("A", "MKT 1"), emp("B", "MKT 1"), emp("C", "MKT 1")];
        let records = vec![
            rec("A", today, 300.0, 10.0),
            rec("B", today, 100.0, 0.0),
            rec("C", today, 150.0, 0.0),
            rec("C", today, 50.0, 5.0),
            rec("A", day(2024, 3, 19), 1000.0, 0.0),
        ];
        let board = leaderboard("MKT 1", Period::Daily, today, &employees, &records).unwrap();
        let totals: Vec<f64> = board.leaderboard.iter().map(|e| e.total_points).collect();
        assert_eq!(totals, vec![300.0, 200.0, 100.0]);
        assert_eq!(board.leaderboard[1].employee_id, "C");
        assert_eq!(board.leaderboard[1].record_count, 2);
        assert_eq!(board.leaderboard[1].total_sales, 5.0);
    }

    #[test]
    fn test_leaderboard_ties_keep_id_order_and_skip_idle() {
        let today = day(2024, 3, 20);
        let employees = vec![emp("Z", "MKT 1"), emp("M", "MKT 1"), emp("A", "MKT 1")];
        let records = vec![rec("Z", today, 100.0, 0.0), rec("A", today, 100.0, 0.0)];
        let board = leaderboard("MKT 1", Period::Weekly, today, &employees, &records).unwrap();
        let ids: Vec<&str> = board.leaderboard.iter().map(|e| e.employee_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "Z"]);
    }

    #[test]
    fn test_leaderboard_empty_department() {
        let result = leaderboard("MKT4", Period::Daily, day(2024, 1, 1), &[], &[]);
        assert!(matches!(result, Err(TrackerError::EmptyDepartment(_))));
    }

    #[test]
    fn test_filtered_report() {
        let employees = vec![emp("E1", "MKT 1"), emp("E2", "MKT 2")];
        let departments = vec![Department::new("MKT 1".into()), Department::new("MKT 2".into())];
        let records = vec![
            rec("E1", day(2024, 3, 1), 100.0, 50.0),
            rec("E1", day(2024, 3, 2), 300.0, 50.0),
            rec("E2", day(2024, 3, 3), 900.0, 0.0),
            rec("E2", day(2024, 5, 3), 900.0, 0.0),
        ];

        let filter = ReportFilter {
            start_date: Some(day(2024, 3, 1)),
            end_date: Some(day(2024, 3, 31)),
            ..Default::default()
        };
        let report = filtered_report(&filter, &employees, &departments, &records);
        assert_eq!(report.performance_stats.total_records, 3);
        assert!((report.performance_stats.average_points - 433.333).abs() < 0.001);
        assert_eq!(report.performance_stats.total_sales, 100.0);
        assert_eq!(report.department_stats[0].average_score, 200.0);
        assert_eq!(report.department_stats[1].average_score, 900.0);
        assert_eq!(report.employee_stats[0].employee_id, "E2");
        assert_eq!(report.recent_performance[0].date, day(2024, 3, 3));

        let by_dept = ReportFilter {
            department: Some("MKT 1".into()),
            ..Default::default()
        };
        let report = filtered_report(&by_dept, &employees, &departments, &records);
        assert_eq!(report.performance_stats.total_records, 2);
        assert_eq!(report.employee_stats[1].average_points, 0.0);
    }

    #[test]
    fn test_filtered_report_empty_is_zero_not_nan() {
        let report = filtered_report(&ReportFilter::default(), &[], &[], &[]);
        assert_eq!(report.performance_stats.total_records, 0);
        assert_eq!(report.performance_stats.average_points, 0.0);
        assert_eq!(report.performance_stats.average_progress, 0.0);
    }

    #[test]
    fn test_recent_limit() {
        let employees = vec![emp("E1", "MKT 1")];
        let records: Vec<Performance> = (1..=15)
            .map(|d| rec("E1", day(2024, 1, d), d as f64, 0.0))
            .collect();
        let report = filtered_report(&ReportFilter::default(), &employees, &[], &records);
        assert_eq!(report.recent_performance.len(), RECENT_LIMIT);
        assert_eq!(report.recent_performance[0].date, day(2024, 1, 15));
    }
}
