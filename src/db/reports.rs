//! Load ledger rows for a report window and hand them to [`crate::scoring`].

use chrono::NaiveDate;

use super::{Database, LedgerQuery};
use crate::error::TrackerResult;
use crate::models::Performance;
use crate::scoring::calculator::{month_bounds, MONTHLY_TARGET};
use crate::scoring::{aggregate, reports};
use crate::scoring::{
    DashboardStats, DepartmentReport, DepartmentSummary, EmployeeHistory, EmployeeReport,
    FilteredReport, Leaderboard, MonthlyProgress, MonthlyReport, Period, ReportFilter,
};

impl Database {
    fn month_records(
        &self,
        employee_id: Option<&str>,
        year: i32,
        month: u32,
    ) -> TrackerResult<Vec<Performance>> {
        let (first, last) = month_bounds(year, month)?;
        let query = LedgerQuery {
            employee_id: employee_id.map(str::to_string),
            ..LedgerQuery::between(first, last)
        };
        self.list_performance(&query)
    }

    pub fn monthly_progress(
        &self,
        employee_id: &str,
        year: i32,
        month: u32,
    ) -> TrackerResult<MonthlyProgress> {
        let records = self.month_records(Some(employee_id), year, month)?;
        aggregate::monthly_progress(employee_id, year, month, &records, MONTHLY_TARGET)
    }

    pub fn department_summary(
        &self,
        department: &str,
        year: i32,
        month: u32,
    ) -> TrackerResult<DepartmentSummary> {
        let employees = self.list_employees_by_department(department)?;
        let records = self.month_records(None, year, month)?;
        aggregate::department_summary(department, year, month, &employees, &records, MONTHLY_TARGET)
    }

    pub fn leaderboard(
        &self,
        department: &str,
        period: Period,
        today: NaiveDate,
    ) -> TrackerResult<Leaderboard> {
        let employees = self.list_employees_by_department(department)?;
        let (start, end) = period.window(today);
        let records = self.list_performance(&LedgerQuery::between(start, end))?;
        aggregate::leaderboard(department, period, today, &employees, &records)
    }

    pub fn filtered_report(&self, filter: &ReportFilter) -> TrackerResult<FilteredReport> {
        let employees = self.list_employees()?;
        let departments = self.list_departments()?;
        let records = self.list_performance(&LedgerQuery {
            employee_id: filter.employee_id.clone(),
            start_date: filter.start_date,
            end_date: filter.end_date,
            kind: None,
        })?;
        Ok(aggregate::filtered_report(filter, &employees, &departments, &records))
    }

    pub fn monthly_report(&self, year: i32, month: u32) -> TrackerResult<MonthlyReport> {
        let employees = self.list_employees()?;
        let records = self.month_records(None, year, month)?;
        reports::monthly_report(year, month, &employees, &records, MONTHLY_TARGET)
    }

    pub fn employee_report(
        &self,
        employee_id: &str,
        year: i32,
        month: u32,
    ) -> TrackerResult<EmployeeReport> {
        let employee = self.require_employee(employee_id)?;
        let records = self.month_records(Some(employee_id), year, month)?;
        reports::employee_report(&employee, year, month, &records, MONTHLY_TARGET)
    }

    pub fn department_report(
        &self,
        department: &str,
        year: i32,
        month: u32,
    ) -> TrackerResult<DepartmentReport> {
        let employees = self.list_employees_by_department(department)?;
        let records = self.month_records(None, year, month)?;
        reports::department_report(department, year, month, &employees, &records, MONTHLY_TARGET)
    }

    pub fn employee_history(
        &self,
        employee_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> TrackerResult<EmployeeHistory> {
        let employee = self.require_employee(employee_id)?;
        let records = self.list_performance(&LedgerQuery {
            employee_id: Some(employee_id.to_string()),
            start_date,
            end_date,
            kind: None,
        })?;
        Ok(reports::employee_history(&employee, start_date, end_date, &records))
    }

    pub fn dashboard_stats(&self) -> TrackerResult<DashboardStats> {
        let employees = self.list_employees()?;
        let records = self.list_performance(&LedgerQuery::default())?;
        Ok(reports::dashboard_stats(&employees, &records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;
    use crate::models::Employee;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn add(db: &Database, id: &str, name: &str, dept: &str) {
        db.insert_employee(&Employee::new(id.into(), name.into(), dept.into(), "Rep".into()))
            .unwrap();
    }

    #[test]
    fn test_march_progress_is_quarter_of_target() {
        let db = Database::open_memory().unwrap();
        add(&db, "E1", "Ann", "MKT 1");
        for (d, pts) in [(3, 1000.0), (12, 2000.0), (28, 3000.0)] {
            db.record_performance("E1", day(2024, 3, d), pts, 0.0).unwrap();
        }
        db.record_performance("E1", day(2024, 4, 1), 999.0, 0.0).unwrap();

        let progress = db.monthly_progress("E1", 2024, 3).unwrap();
        assert_eq!(progress.total_points, 6000.0);
        assert_eq!(progress.monthly_progress, 25.0);
        assert_eq!(progress.performances.len(), 3);
        assert_eq!(progress.performances[0].date, day(2024, 3, 3));
    }

    #[test]
    fn test_month_out_of_range_is_invalid() {
        let db = Database::open_memory().unwrap();
        assert!(matches!(
            db.monthly_progress("E1", 2024, 13),
            Err(TrackerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty_department_summary() {
        let db = Database::open_memory().unwrap();
        let err = db.department_summary("MKT4", 2024, 3).unwrap_err();
        assert!(matches!(err, TrackerError::EmptyDepartment(_)));
        assert_eq!(err.status_code(), 404);
        assert!(db.leaderboard("MKT4", Period::Daily, day(2024, 3, 1)).is_err());
    }

    #[test]
    fn test_leaderboard_orders_by_points() {
        let db = Database::open_memory().unwrap();
        add(&db, "A", "Ann", "MKT 2");
        add(&db, "B", "Bob", "MKT 2");
        add(&db, "C", "Cid", "MKT 2");
        add(&db, "X", "Out", "MKT3");
        let today = day(2024, 6, 20);
        db.record_performance("A", today, 300.0, 0.0).unwrap();
        db.record_performance("B", today, 100.0, 0.0).unwrap();
        db.record_performance("C", day(2024, 6, 18), 200.0, 0.0).unwrap();
        db.record_performance("X", today, 900.0, 0.0).unwrap();

        let daily = db.leaderboard("MKT 2", Period::Daily, today).unwrap();
        let totals: Vec<f64> = daily.leaderboard.iter().map(|e| e.total_points).collect();
        assert_eq!(totals, vec![300.0, 100.0]);

        let weekly = db.leaderboard("MKT 2", Period::Weekly, today).unwrap();
        let totals: Vec<f64> = weekly.leaderboard.iter().map(|e| e.total_points).collect();
        assert_eq!(totals, vec![300.0, 200.0, 100.0]);
    }

    #[test]
    fn test_department_summary_average() {
        let db = Database::open_memory().unwrap();
        add(&db, "E1", "Ann", "MKT 1");
        add(&db, "E2", "Bob", "MKT 1");
        db.record_performance("E1", day(2024, 3, 5), 12000.0, 0.0).unwrap();

        let summary = db.department_summary("MKT 1", 2024, 3).unwrap();
        assert_eq!(summary.total_employees, 2);
        assert_eq!(summary.total_points, 12000.0);
        assert_eq!(summary.average_progress, 25.0);
    }

    #[test]
    fn test_employee_report_requires_employee() {
        let db = Database::open_memory().unwrap();
        assert!(matches!(
            db.employee_report("ghost", 2024, 3),
            Err(TrackerError::NotFound { .. })
        ));
        assert!(db.employee_history("ghost", None, None).is_err());
    }

    #[test]
    fn test_filtered_report_and_dashboard() {
        let db = Database::open_memory().unwrap();
        add(&db, "E1", "Ann", "MKT 1");
        add(&db, "E2", "Bob", "MKT 2");
        db.record_performance("E1", day(2024, 3, 1), 100.0, 0.0).unwrap();
        db.record_performance("E2", day(2024, 3, 2), 300.0, 0.0).unwrap();
        db.record_performance("E2", day(2024, 5, 2), 500.0, 0.0).unwrap();

        let filter = ReportFilter {
            end_date: Some(day(2024, 3, 31)),
            ..Default::default()
        };
        let report = db.filtered_report(&filter).unwrap();
        assert_eq!(report.performance_stats.total_records, 2);
        assert_eq!(report.recent_performance.len(), 2);

        let stats = db.dashboard_stats().unwrap();
        assert_eq!(stats.total_employees, 2);
        assert_eq!(stats.total_performance, 3);
    }
}
