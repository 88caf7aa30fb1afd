use chrono::Utc;
use rusqlite::{params, Row};

use super::{parse_datetime, Database};
use crate::error::{TrackerError, TrackerResult};
use crate::models::{Employee, EmployeeChanges};

const EMPLOYEE_COLUMNS: &str = "employee_id, name, department, position, points, project_code, \
     coordinator_name, password_hash, created_at, updated_at";

impl Database {
    // ==================== EMPLOYEE CREATE ====================

    /// Insert a new employee and return the stored row. Entries left behind
    /// by a deleted employee with the same id count toward the new counter.
    pub fn insert_employee(&self, employee: &Employee) -> TrackerResult<Employee> {
        employee.validate()?;
        self.require_department_name(&employee.department)?;

        let tx = self.begin_write()?;
        let carried: f64 = tx.query_row(
            "SELECT COALESCE(SUM(daily_points), 0) FROM performance WHERE employee_id = ?",
            [&employee.employee_id],
            |row| row.get(0),
        )?;

        let mut stored = employee.clone();
        stored.points = carried;
        tx.execute(
            &format!(
                "INSERT INTO employees ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                EMPLOYEE_COLUMNS
            ),
            params![
                stored.employee_id,
                stored.name,
                stored.department,
                stored.position,
                stored.points,
                stored.project_code,
                stored.coordinator_name,
                stored.password_hash,
                stored.created_at.to_rfc3339(),
                stored.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| {
            TrackerError::from_unique(e, format!("Employee ID {} already exists", stored.employee_id))
        })?;
        tx.commit()?;

        if carried != 0.0 {
            tracing::info!(employee_id = %stored.employee_id, points = carried, "existing ledger entries attached to new employee");
        }
        tracing::info!(employee_id = %stored.employee_id, department = %stored.department, "employee created");
        Ok(stored)
    }

    // ==================== EMPLOYEE READ ====================

    pub fn get_employee(&self, employee_id: &str) -> TrackerResult<Option<Employee>> {
        let result = self.conn.query_row(
            &format!("SELECT {} FROM employees WHERE employee_id = ?", EMPLOYEE_COLUMNS),
            [employee_id],
            row_to_employee,
        );

        match result {
            Ok(employee) => Ok(Some(employee)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`Database::get_employee`] but absent employees are an error.
    pub fn require_employee(&self, employee_id: &str) -> TrackerResult<Employee> {
        self.get_employee(employee_id)?
            .ok_or_else(|| TrackerError::employee_not_found(employee_id))
    }

    /// All employees ordered by employee id.
    pub fn list_employees(&self) -> TrackerResult<Vec<Employee>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM employees ORDER BY employee_id",
            EMPLOYEE_COLUMNS
        ))?;
        let employees = stmt
            .query_map([], row_to_employee)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(employees)
    }

    pub fn list_employees_by_department(&self, department: &str) -> TrackerResult<Vec<Employee>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM employees WHERE department = ? ORDER BY employee_id",
            EMPLOYEE_COLUMNS
        ))?;
        let employees = stmt
            .query_map([department], row_to_employee)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(employees)
    }

    pub fn count_employees(&self) -> TrackerResult<u32> {
        let count: u32 = self
            .conn
            .query_row("SELECT COUNT(*) FROM employees", [], |row| row.get(0))?;
        Ok(count)
    }

    // ==================== EMPLOYEE UPDATE ====================

    /// Apply profile changes. The points counter is never touched here and
    /// `changes.password` is ignored; see [`Database::set_employee_password`].
    pub fn update_employee(
        &self,
        employee_id: &str,
        changes: &EmployeeChanges,
    ) -> TrackerResult<Employee> {
        let mut employee = self.require_employee(employee_id)?;

        if let Some(dept) = changes.apply(&mut employee) {
            self.require_department_name(&dept)?;
        }
        employee.validate()?;

        self.conn.execute(
            "UPDATE employees SET name = ?, department = ?, position = ?, project_code = ?,
             coordinator_name = ?, updated_at = ? WHERE employee_id = ?",
            params![
                employee.name,
                employee.department,
                employee.position,
                employee.project_code,
                employee.coordinator_name,
                employee.updated_at.to_rfc3339(),
                employee.employee_id,
            ],
        )?;
        Ok(employee)
    }

    pub fn set_employee_password(&self, employee_id: &str, password_hash: &str) -> TrackerResult<()> {
        let rows = self.conn.execute(
            "UPDATE employees SET password_hash = ?, updated_at = ? WHERE employee_id = ?",
            params![password_hash, Utc::now().to_rfc3339(), employee_id],
        )?;
        if rows == 0 {
            return Err(TrackerError::employee_not_found(employee_id));
        }
        Ok(())
    }

    // ==================== EMPLOYEE DELETE ====================

    /// Remove the employee row. Ledger entries are kept as orphans and still
    /// appear in history and range reports.
    pub fn delete_employee(&self, employee_id: &str) -> TrackerResult<Employee> {
        let employee = self.require_employee(employee_id)?;
        self.conn
            .execute("DELETE FROM employees WHERE employee_id = ?", [employee_id])?;
        tracing::info!(employee_id, "employee deleted");
        Ok(employee)
    }
}

fn row_to_employee(row: &Row) -> rusqlite::Result<Employee> {
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;
    Ok(Employee {
        employee_id: row.get(0)?,
        name: row.get(1)?,
        department: row.get(2)?,
        position: row.get(3)?,
        points: row.get(4)?,
        project_code: row.get(5)?,
        coordinator_name: row.get(6)?,
        password_hash: row.get(7)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}
