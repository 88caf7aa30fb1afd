//! Monthly, per-employee and per-department reports, employee history and
//! dashboard statistics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::aggregate::{
    department_members, desc, mean, sort_newest_first, sum_points, sum_sales, RecentEntry,
};
use super::calculator::{daily_target, days_in_month, month_bounds, monthly_progress};
use crate::error::{TrackerError, TrackerResult};
use crate::models::{Employee, Performance};

/// Number of entries listed as recent activity on the dashboard.
pub const DASHBOARD_RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetStatus {
    Achieved,
    #[serde(rename = "In Progress")]
    InProgress,
}

impl TargetStatus {
    pub fn from_percentage(target_percentage: f64) -> Self {
        if target_percentage >= 100.0 {
            Self::Achieved
        } else {
            Self::InProgress
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Achieved => "Achieved",
            Self::InProgress => "In Progress",
        }
    }
}

/// Identifying fields of an employee, without the counter or credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRef {
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub position: String,
}

impl From<&Employee> for EmployeeRef {
    fn from(e: &Employee) -> Self {
        Self {
            employee_id: e.employee_id.clone(),
            name: e.name.clone(),
            department: e.department.clone(),
            position: e.position.clone(),
        }
    }
}

fn month_rows<'a>(
    employee_id: &str,
    first: NaiveDate,
    last: NaiveDate,
    records: &'a [Performance],
) -> Vec<&'a Performance> {
    let mut rows: Vec<&Performance> = records
        .iter()
        .filter(|r| r.employee_id == employee_id && r.date >= first && r.date <= last)
        .collect();
    rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
    rows
}

// ==================== MONTHLY REPORT ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReportRow {
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub position: String,
    pub total_points: f64,
    pub total_sales: f64,
    pub average_ratio: f64,
    pub target_percentage: f64,
    pub days_logged: usize,
    pub status: TargetStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    pub rows: Vec<MonthlyReportRow>,
}

fn monthly_row(
    employee: &Employee,
    first: NaiveDate,
    last: NaiveDate,
    records: &[Performance],
    monthly_target: f64,
) -> TrackerResult<MonthlyReportRow> {
    let rows = month_rows(&employee.employee_id, first, last, records);
    let total_points = sum_points(rows.iter().copied());
    let target_percentage = monthly_progress(total_points, monthly_target)?;

    Ok(MonthlyReportRow {
        employee_id: employee.employee_id.clone(),
        name: employee.name.clone(),
        department: employee.department.clone(),
        position: employee.position.clone(),
        total_points,
        total_sales: sum_sales(rows.iter().copied()),
        average_ratio: mean(rows.iter().map(|r| r.ratio).sum(), rows.len()),
        target_percentage,
        days_logged: rows.len(),
        status: TargetStatus::from_percentage(target_percentage),
    })
}

/// One row per employee for the month, in employee-id order.
pub fn monthly_report(
    year: i32,
    month: u32,
    employees: &[Employee],
    records: &[Performance],
    monthly_target: f64,
) -> TrackerResult<MonthlyReport> {
    let (first, last) = month_bounds(year, month)?;

    let mut sorted: Vec<&Employee> = employees.iter().collect();
    sorted.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));

    let rows = sorted
        .into_iter()
        .map(|e| monthly_row(e, first, last, records, monthly_target))
        .collect::<TrackerResult<Vec<_>>>()?;

    Ok(MonthlyReport {
        year,
        month,
        days_in_month: days_in_month(first),
        rows,
    })
}

// ==================== EMPLOYEE REPORT ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeReportSummary {
    pub total_points: f64,
    pub total_sales: f64,
    pub average_ratio: f64,
    pub target_percentage: f64,
    pub days_logged: usize,
    pub days_in_month: u32,
    pub remaining_points: f64,
    pub status: TargetStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub daily_points: f64,
    pub sales_amount: f64,
    pub ratio: f64,
    pub daily_progress: f64,
    pub daily_target: f64,
    /// Points above (positive) or below (negative) the daily target
    pub surplus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeReport {
    pub employee: EmployeeRef,
    pub year: i32,
    pub month: u32,
    pub summary: EmployeeReportSummary,
    pub daily_records: Vec<DailyRow>,
}

pub fn employee_report(
    employee: &Employee,
    year: i32,
    month: u32,
    records: &[Performance],
    monthly_target: f64,
) -> TrackerResult<EmployeeReport> {
    let (first, last) = month_bounds(year, month)?;
    let rows = month_rows(&employee.employee_id, first, last, records);
    let target = daily_target(first, monthly_target)?;

    let total_points = sum_points(rows.iter().copied());
    let target_percentage = monthly_progress(total_points, monthly_target)?;

    let daily_records = rows
        .iter()
        .map(|r| DailyRow {
            date: r.date,
            daily_points: r.daily_points,
            sales_amount: r.sales_amount,
            ratio: r.ratio,
            daily_progress: r.daily_progress,
            daily_target: target,
            surplus: r.daily_points - target,
        })
        .collect();

    Ok(EmployeeReport {
        employee: EmployeeRef::from(employee),
        year,
        month,
        summary: EmployeeReportSummary {
            total_points,
            total_sales: sum_sales(rows.iter().copied()),
            average_ratio: mean(rows.iter().map(|r| r.ratio).sum(), rows.len()),
            target_percentage,
            days_logged: rows.len(),
            days_in_month: days_in_month(first),
            remaining_points: monthly_target - total_points,
            status: TargetStatus::from_percentage(target_percentage),
        },
        daily_records,
    })
}

// ==================== DEPARTMENT REPORT ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentReportSummary {
    pub total_points: f64,
    pub total_sales: f64,
    /// Department points over department sales as a percentage; 0 without sales
    pub ratio: f64,
    pub total_employees: usize,
    pub achieved_target: usize,
    pub achievement_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentReport {
    pub department: String,
    pub year: i32,
    pub month: u32,
    pub summary: DepartmentReportSummary,
    pub employees: Vec<MonthlyReportRow>,
}

pub fn department_report(
    department: &str,
    year: i32,
    month: u32,
    employees: &[Employee],
    records: &[Performance],
    monthly_target: f64,
) -> TrackerResult<DepartmentReport> {
    let (first, last) = month_bounds(year, month)?;
    let members = department_members(department, employees);
    if members.is_empty() {
        return Err(TrackerError::EmptyDepartment(department.to_string()));
    }

    let mut rows = members
        .iter()
        .map(|e| monthly_row(e, first, last, records, monthly_target))
        .collect::<TrackerResult<Vec<_>>>()?;
    rows.sort_by(|a, b| desc(a.total_points, b.total_points));

    let total_points: f64 = rows.iter().map(|r| r.total_points).sum();
    let total_sales: f64 = rows.iter().map(|r| r.total_sales).sum();
    let achieved_target = rows
        .iter()
        .filter(|r| r.status == TargetStatus::Achieved)
        .count();
    let ratio = if total_sales > 0.0 {
        (total_points / total_sales) * 100.0
    } else {
        0.0
    };

    Ok(DepartmentReport {
        department: department.to_string(),
        year,
        month,
        summary: DepartmentReportSummary {
            total_points,
            total_sales,
            ratio,
            total_employees: rows.len(),
            achieved_target,
            achievement_rate: achieved_target as f64 / rows.len() as f64 * 100.0,
        },
        employees: rows,
    })
}

// ==================== EMPLOYEE HISTORY ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeHistory {
    pub employee: EmployeeRef,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub performances: Vec<Performance>,
    pub total_points: f64,
    pub total_sales: f64,
    pub record_count: usize,
}

/// An employee's entries in an optional date range, newest first.
pub fn employee_history(
    employee: &Employee,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    records: &[Performance],
) -> EmployeeHistory {
    let mut rows: Vec<&Performance> = records
        .iter()
        .filter(|r| r.employee_id == employee.employee_id)
        .filter(|r| start_date.map_or(true, |s| r.date >= s))
        .filter(|r| end_date.map_or(true, |e| r.date <= e))
        .collect();
    sort_newest_first(&mut rows);

    EmployeeHistory {
        employee: EmployeeRef::from(employee),
        start_date,
        end_date,
        total_points: sum_points(rows.iter().copied()),
        total_sales: sum_sales(rows.iter().copied()),
        record_count: rows.len(),
        performances: rows.into_iter().cloned().collect(),
    }
}

// ==================== DASHBOARD ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_employees: usize,
    pub total_performance: usize,
    /// Mean daily points across the whole ledger, rounded
    pub average_score: f64,
    pub recent_activity: Vec<RecentEntry>,
}

pub fn dashboard_stats(employees: &[Employee], records: &[Performance]) -> DashboardStats {
    let mut rows: Vec<&Performance> = records.iter().collect();
    sort_newest_first(&mut rows);

    DashboardStats {
        total_employees: employees.len(),
        total_performance: records.len(),
        average_score: mean(sum_points(records), records.len()).round(),
        recent_activity: rows
            .into_iter()
            .take(DASHBOARD_RECENT_LIMIT)
            .map(RecentEntry::from)
            .collect(),
    }
}

// ==================== CSV EXPORT ====================

/// The monthly report as CSV, one line per employee after a header.
pub fn monthly_report_csv(report: &MonthlyReport) -> TrackerResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in &report.rows {
        writer
            .serialize(row)
            .map_err(|e| TrackerError::Export(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| TrackerError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| TrackerError::Export(e.to_string()))
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
    fn test_monthly_report_status() {
        let employees = vec![emp("E2", "MKT 1"), emp("E1", "MKT 1")];
        let records = vec![
            rec("E1", day(2024, 6, 1), 24000.0, 1000.0),
            rec("E2", day(2024, 6, 2), 1000.0, 0.0),
        ];
        let report = monthly_report(2024, 6, &employees, &records, MONTHLY_TARGET).unwrap();
        assert_eq!(report.days_in_month, 30);
        assert_eq!(report.rows[0].employee_id, "E1");
        assert_eq!(report.rows[0].status, TargetStatus::Achieved);
        assert_eq!(report.rows[1].status, TargetStatus::InProgress);
        assert_eq!(report.rows[0].average_ratio, 2400.0);
    }

    #[test]
    fn test_employee_report() {
        let e = emp("E1", "MKT 1");
        let records = vec![
            rec("E1", day(2024, 6, 2), 1000.0, 0.0),
            rec("E1", day(2024, 6, 1), 600.0, 0.0),
        ];
        let report = employee_report(&e, 2024, 6, &records, MONTHLY_TARGET).unwrap();
        assert_eq!(report.summary.total_points, 1600.0);
        assert_eq!(report.summary.remaining_points, 22400.0);
        assert_eq!(report.summary.days_logged, 2);
        assert_eq!(report.daily_records[0].date, day(2024, 6, 1));
        assert_eq!(report.daily_records[0].surplus, -200.0);
        assert_eq!(report.daily_records[1].surplus, 200.0);
    }

    #[test]
    fn test_department_report() {
        let employees = vec![emp("E1", "MKT 1"), emp("E2", "MKT 1")];
        let records = vec![
            rec("E1", day(2024, 6, 1), 24000.0, 48000.0),
            rec("E2", day(2024, 6, 1), 12000.0, 0.0),
        ];
        let report = department_report("MKT 1", 2024, 6, &employees, &records, MONTHLY_TARGET).unwrap();
        assert_eq!(report.summary.total_points, 36000.0);
        assert_eq!(report.summary.achieved_target, 1);
        assert_eq!(report.summary.achievement_rate, 50.0);
        assert_eq!(report.summary.ratio, 75.0);
    }

    #[test]
    fn test_department_report_empty() {
        let result = department_report("MKT4", 2024, 6, &[], &[], MONTHLY_TARGET);
        assert!(matches!(result, Err(TrackerError::EmptyDepartment(_))));
    }

    #[test]
    fn test_employee_history_range() {
        let e = emp("E1", "MKT 1");
        let records = vec![
            rec("E1", day(2024, 6, 1), 10.0, 1.0),
            rec("E1", day(2024, 6, 5), 20.0, 2.0),
            rec("E1", day(2024, 6, 9), 30.0, 3.0),
            rec("E2", day(2024, 6, 5), 99.0, 0.0),
        ];
        let h = employee_history(&e, Some(day(2024, 6, 2)), None, &records);
        assert_eq!(h.record_count, 2);
        assert_eq!(h.total_points, 50.0);
        assert_eq!(h.total_sales, 5.0);
        assert_eq!(h.performances[0].date, day(2024, 6, 9));
    }

    #[test]
    fn test_dashboard_stats() {
        let employees = vec![emp("E1", "MKT 1")];
        let records: Vec<Performance> = (1..=7)
            .map(|d| rec("E1", day(2024, 6, d), 10.0 * d as f64, 0.0))
            .collect();
        let stats = dashboard_stats(&employees, &records);
        assert_eq!(stats.total_employees, 1);
        assert_eq!(stats.total_performance, 7);
        assert_eq!(stats.average_score, 40.0);
        assert_eq!(stats.recent_activity.len(), DASHBOARD_RECENT_LIMIT);
        assert_eq!(stats.recent_activity[0].date, day(2024, 6, 7));
    }

    #[test]
    fn test_target_status_serialization() {
        let json = serde_json::to_string(&TargetStatus::InProgress).unwrap();
        assert_eq!(json, r#""In Progress""#);
    }

    #[test]
    fn test_monthly_report_csv() {
        let employees = vec![emp("E1", "MKT 1")];
        let records = vec![rec("E1", day(2024, 6, 1), 24000.0, 0.0)];
        let report = monthly_report(2024, 6, &employees, &records, MONTHLY_TARGET).unwrap();

        let csv = monthly_report_csv(&report).unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("employee_id,name,department,position,total_points"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("E1,Name E1,MKT 1,Rep,24000"));
        assert!(row.ends_with("Achieved"));
        assert!(lines.next().is_none());
    }
}
