use rusqlite::{params, Row, TransactionBehavior};
use uuid::Uuid;

use super::{parse_datetime, parse_uuid, Database};
use crate::error::{TrackerError, TrackerResult};
use crate::models::Department;

impl Database {
    // ==================== DEPARTMENT CREATE ====================

    pub fn insert_department(&self, dept: &Department) -> TrackerResult<()> {
        if dept.name.trim().is_empty() {
            return Err(TrackerError::invalid("department name is required"));
        }
        self.conn
            .execute(
                "INSERT INTO departments (id, name, description, created_at) VALUES (?, ?, ?, ?)",
                params![
                    dept.id.to_string(),
                    dept.name,
                    dept.description,
                    dept.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| {
                TrackerError::from_unique(e, format!("Department '{}' already exists", dept.name))
            })?;
        tracing::info!(department = %dept.name, "department created");
        Ok(())
    }

    // ==================== DEPARTMENT READ ====================

    pub fn list_departments(&self) -> TrackerResult<Vec<Department>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, created_at FROM departments ORDER BY name")?;
        let depts = stmt
            .query_map([], row_to_department)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(depts)
    }

    pub fn get_department(&self, id: Uuid) -> TrackerResult<Option<Department>> {
        let result = self.conn.query_row(
            "SELECT id, name, description, created_at FROM departments WHERE id = ?",
            [id.to_string()],
            row_to_department,
        );

        match result {
            Ok(dept) => Ok(Some(dept)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_department_by_name(&self, name: &str) -> TrackerResult<Option<Department>> {
        let result = self.conn.query_row(
            "SELECT id, name, description, created_at FROM departments WHERE name = ?",
            [name],
            row_to_department,
        );

        match result {
            Ok(dept) => Ok(Some(dept)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fail with `NotFound` unless a department with this name exists.
    pub(crate) fn require_department_name(&self, name: &str) -> TrackerResult<()> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM departments WHERE name = ?)",
            [name],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(TrackerError::department_not_found(name))
        }
    }

    // ==================== DEPARTMENT UPDATE ====================

    /// Rename and/or re-describe a department. A rename is carried over to
    /// every employee in the same transaction.
    pub fn update_department(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> TrackerResult<Department> {
        let mut dept = self
            .get_department(id)?
            .ok_or_else(|| TrackerError::department_not_found(id))?;
        let old_name = dept.name.clone();

        if let Some(name) = name {
            let name = name.trim();
            if name.is_empty() {
                return Err(TrackerError::invalid("department name is required"));
            }
            dept.name = name.to_string();
        }
        if let Some(description) = description {
            let description = description.trim();
            dept.description = if description.is_empty() {
                None
            } else {
                Some(description.to_string())
            };
        }

        let tx = rusqlite::Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "UPDATE departments SET name = ?, description = ? WHERE id = ?",
            params![dept.name, dept.description, dept.id.to_string()],
        )
        .map_err(|e| {
            TrackerError::from_unique(e, format!("Department '{}' already exists", dept.name))
        })?;

        if dept.name != old_name {
            let moved = tx.execute(
                "UPDATE employees SET department = ? WHERE department = ?",
                params![dept.name, old_name],
            )?;
            tracing::info!(from = %old_name, to = %dept.name, employees = moved, "department renamed");
        }
        tx.commit()?;

        Ok(dept)
    }

    // ==================== DEPARTMENT DELETE ====================

    /// Employees keep the deleted name; it is no longer accepted on new writes.
    pub fn delete_department(&self, id: Uuid) -> TrackerResult<Department> {
        let dept = self
            .get_department(id)?
            .ok_or_else(|| TrackerError::department_not_found(id))?;
        self.conn
            .execute("DELETE FROM departments WHERE id = ?", [id.to_string()])?;
        tracing::info!(department = %dept.name, "department deleted");
        Ok(dept)
    }
}

fn row_to_department(row: &Row) -> rusqlite::Result<Department> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(3)?;
    Ok(Department {
        id: parse_uuid(&id)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_datetime(&created_at)?,
    })
}
