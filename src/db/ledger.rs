//! Ledger write path.
//!
//! Every mutation runs in a `BEGIN IMMEDIATE` transaction that covers both
//! the `performance` row and the owning employee's `points` counter, so the
//! counter always equals the sum of that employee's entries.

use chrono::{NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use serde::Serialize;
use uuid::Uuid;

use super::{format_date, parse_date, parse_datetime, parse_kind, parse_uuid, Database};
use crate::error::{TrackerError, TrackerResult};
use crate::models::{EntryKind, Performance};

/// Counter drift below this is float noise, not a discrepancy.
const DRIFT_EPSILON: f64 = 1e-6;

const RECORD_COLUMNS: &str = "id, employee_id, date, daily_points, sales_amount, kind, description, \
     monthly_target, daily_target, daily_progress, ratio, created_at, updated_at";

/// Filters for listing ledger entries. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerQuery {
    pub employee_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub kind: Option<EntryKind>,
}

impl LedgerQuery {
    pub fn employee(employee_id: &str) -> Self {
        Self {
            employee_id: Some(employee_id.to_string()),
            ..Default::default()
        }
    }

    pub fn between(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
            ..Default::default()
        }
    }
}

/// Outcome of an upsert-by-day submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub record: Performance,
    /// false when an existing entry for the day was overwritten
    pub created: bool,
}

/// An employee whose stored counter disagrees with their ledger sum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointsDrift {
    pub employee_id: String,
    pub stored: f64,
    pub ledger: f64,
}

impl PointsDrift {
    pub fn difference(&self) -> f64 {
        self.stored - self.ledger
    }
}

impl Database {
    pub(super) fn begin_write(&self) -> TrackerResult<Transaction<'_>> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    // ==================== RECORD CREATE ====================

    /// Append an entry for an existing employee and add its points to their
    /// counter. Same-day entries are allowed on this path.
    pub fn record_performance(
        &self,
        employee_id: &str,
        date: NaiveDate,
        daily_points: f64,
        sales_amount: f64,
    ) -> TrackerResult<Performance> {
        let record = Performance::new(employee_id.to_string(), date, daily_points, sales_amount)?;

        let tx = self.begin_write()?;
        require_employee_row(&tx, employee_id)?;
        insert_record(&tx, &record)?;
        adjust_points(&tx, employee_id, record.daily_points)?;
        tx.commit()?;

        tracing::debug!(record_id = %record.id, employee_id, points = daily_points, "performance recorded");
        Ok(record)
    }

    /// Legacy points submission: a `points` entry with a description.
    pub fn submit_points(
        &self,
        employee_id: &str,
        date: NaiveDate,
        points: f64,
        description: &str,
    ) -> TrackerResult<Performance> {
        let description = description.trim();
        if description.is_empty() {
            return Err(TrackerError::invalid("description is required"));
        }
        let record =
            Performance::points(employee_id.to_string(), date, points, description.to_string())?;

        let tx = self.begin_write()?;
        require_employee_row(&tx, employee_id)?;
        insert_record(&tx, &record)?;
        adjust_points(&tx, employee_id, record.daily_points)?;
        tx.commit()?;

        tracing::debug!(record_id = %record.id, employee_id, points, "points submitted");
        Ok(record)
    }

    /// Upsert-by-day: overwrite the employee's `performance` entry for `date`
    /// if there is one, otherwise insert. `sales_amount` of `None` keeps the
    /// stored value (or 0 for a new entry).
    pub fn submit_daily_points(
        &self,
        employee_id: &str,
        date: NaiveDate,
        daily_points: f64,
        sales_amount: Option<f64>,
    ) -> TrackerResult<Submission> {
        let tx = self.begin_write()?;
        require_employee_row(&tx, employee_id)?;

        let existing = find_day_entry(&tx, employee_id, date)?;
        let submission = match existing {
            Some(mut record) => {
                let delta = daily_points - record.daily_points;
                record.set_values(daily_points, sales_amount)?;
                write_record(&tx, &record)?;
                adjust_points(&tx, employee_id, delta)?;
                Submission {
                    record,
                    created: false,
                }
            }
            None => {
                let record = Performance::new(
                    employee_id.to_string(),
                    date,
                    daily_points,
                    sales_amount.unwrap_or(0.0),
                )?;
                insert_record(&tx, &record)?;
                adjust_points(&tx, employee_id, record.daily_points)?;
                Submission {
                    record,
                    created: true,
                }
            }
        };
        tx.commit()?;

        tracing::debug!(
            record_id = %submission.record.id,
            employee_id,
            created = submission.created,
            "daily points submitted"
        );
        Ok(submission)
    }

    // ==================== RECORD UPDATE ====================

    /// Replace an entry's points (and sales when given), keeping its date.
    /// The counter moves by the difference.
    pub fn update_performance(
        &self,
        record_id: Uuid,
        daily_points: f64,
        sales_amount: Option<f64>,
    ) -> TrackerResult<Performance> {
        let tx = self.begin_write()?;
        let mut record = load_record(&tx, record_id)?
            .ok_or_else(|| TrackerError::record_not_found(record_id))?;

        let delta = daily_points - record.daily_points;
        record.set_values(daily_points, sales_amount)?;
        write_record(&tx, &record)?;
        adjust_points(&tx, &record.employee_id, delta)?;
        tx.commit()?;

        tracing::debug!(record_id = %record_id, delta, "performance updated");
        Ok(record)
    }

    // ==================== RECORD DELETE ====================

    pub fn delete_performance(&self, record_id: Uuid) -> TrackerResult<Performance> {
        let tx = self.begin_write()?;
        let record = load_record(&tx, record_id)?
            .ok_or_else(|| TrackerError::record_not_found(record_id))?;

        tx.execute("DELETE FROM performance WHERE id = ?", [record_id.to_string()])?;
        adjust_points(&tx, &record.employee_id, -record.daily_points)?;
        tx.commit()?;

        tracing::debug!(record_id = %record_id, employee_id = %record.employee_id, "performance deleted");
        Ok(record)
    }

    // ==================== RECORD READ ====================

    pub fn get_performance(&self, record_id: Uuid) -> TrackerResult<Option<Performance>> {
        load_record(&self.conn, record_id)
    }

    /// Matching entries, newest date first.
    pub fn list_performance(&self, query: &LedgerQuery) -> TrackerResult<Vec<Performance>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(ref employee_id) = query.employee_id {
            clauses.push("employee_id = ?");
            values.push(employee_id.clone());
        }
        if let Some(start) = query.start_date {
            clauses.push("date >= ?");
            values.push(format_date(start));
        }
        if let Some(end) = query.end_date {
            clauses.push("date <= ?");
            values.push(format_date(end));
        }
        if let Some(kind) = query.kind {
            clauses.push("kind = ?");
            values.push(kind.as_str().to_string());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM performance {} ORDER BY date DESC, created_at DESC",
            RECORD_COLUMNS, where_sql
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(values.iter()), row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn count_performance(&self) -> TrackerResult<u32> {
        let count: u32 = self
            .conn
            .query_row("SELECT COUNT(*) FROM performance", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Sum of an employee's ledger entries (what the counter should hold).
    pub fn ledger_points(&self, employee_id: &str) -> TrackerResult<f64> {
        let total: f64 = self.conn.query_row(
            "SELECT COALESCE(SUM(daily_points), 0) FROM performance WHERE employee_id = ?",
            [employee_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    // ==================== RECONCILE ====================

    /// Compare every employee's counter with their ledger sum. With `fix`,
    /// drifting counters are rewritten in the same transaction.
    pub fn reconcile_points(&self, fix: bool) -> TrackerResult<Vec<PointsDrift>> {
        let tx = self.begin_write()?;

        let drifts: Vec<PointsDrift> = {
            let mut stmt = tx.prepare(
                "SELECT e.employee_id, e.points, COALESCE(SUM(p.daily_points), 0)
                 FROM employees e
                 LEFT JOIN performance p ON p.employee_id = e.employee_id
                 GROUP BY e.employee_id
                 ORDER BY e.employee_id",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(PointsDrift {
                        employee_id: row.get(0)?,
                        stored: row.get(1)?,
                        ledger: row.get(2)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter()
                .filter(|d| d.difference().abs() > DRIFT_EPSILON)
                .collect()
        };

        if fix {
            let now = Utc::now().to_rfc3339();
            for drift in &drifts {
                tx.execute(
                    "UPDATE employees SET points = ?, updated_at = ? WHERE employee_id = ?",
                    params![drift.ledger, now, drift.employee_id],
                )?;
            }
        }
        tx.commit()?;

        if !drifts.is_empty() {
            tracing::warn!(count = drifts.len(), fixed = fix, "points counters out of sync with ledger");
        }
        Ok(drifts)
    }
}

// ==================== TRANSACTION HELPERS ====================

fn require_employee_row(conn: &Connection, employee_id: &str) -> TrackerResult<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE employee_id = ?)",
        [employee_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(TrackerError::employee_not_found(employee_id))
    }
}

/// Move the counter by `delta`. Entries of deleted employees have no
/// counter left to move, so zero affected rows is fine.
fn adjust_points(conn: &Connection, employee_id: &str, delta: f64) -> TrackerResult<()> {
    if delta == 0.0 {
        return Ok(());
    }
    conn.execute(
        "UPDATE employees SET points = points + ?, updated_at = ? WHERE employee_id = ?",
        params![delta, Utc::now().to_rfc3339(), employee_id],
    )?;
    Ok(())
}

fn insert_record(conn: &Connection, record: &Performance) -> TrackerResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO performance ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            RECORD_COLUMNS
        ),
        params![
            record.id.to_string(),
            record.employee_id,
            format_date(record.date),
            record.daily_points,
            record.sales_amount,
            record.kind.as_str(),
            record.description,
            record.monthly_target,
            record.daily_target,
            record.daily_progress,
            record.ratio,
            record.created_at.to_rfc3339(),
            record.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn write_record(conn: &Connection, record: &Performance) -> TrackerResult<()> {
    conn.execute(
        "UPDATE performance SET daily_points = ?, sales_amount = ?, daily_target = ?,
         daily_progress = ?, ratio = ?, updated_at = ? WHERE id = ?",
        params![
            record.daily_points,
            record.sales_amount,
            record.daily_target,
            record.daily_progress,
            record.ratio,
            record.updated_at.to_rfc3339(),
            record.id.to_string(),
        ],
    )?;
    Ok(())
}

fn load_record(conn: &Connection, record_id: Uuid) -> TrackerResult<Option<Performance>> {
    let result = conn.query_row(
        &format!("SELECT {} FROM performance WHERE id = ?", RECORD_COLUMNS),
        [record_id.to_string()],
        row_to_record,
    );

    match result {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn find_day_entry(
    conn: &Connection,
    employee_id: &str,
    date: NaiveDate,
) -> TrackerResult<Option<Performance>> {
    let result = conn.query_row(
        &format!(
            "SELECT {} FROM performance
             WHERE employee_id = ? AND date = ? AND kind = 'performance'
             ORDER BY created_at LIMIT 1",
            RECORD_COLUMNS
        ),
        params![employee_id, format_date(date)],
        row_to_record,
    );

    match result {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn row_to_record(row: &Row) -> rusqlite::Result<Performance> {
    let id: String = row.get(0)?;
    let date: String = row.get(2)?;
    let kind: String = row.get(5)?;
    let created_at: String = row.get(11)?;
    let updated_at: String = row.get(12)?;
    Ok(Performance {
        id: parse_uuid(&id)?,
        employee_id: row.get(1)?,
        date: parse_date(&date)?,
        daily_points: row.get(3)?,
        sales_amount: row.get(4)?,
        kind: parse_kind(&kind)?,
        description: row.get(6)?,
        monthly_target: row.get(7)?,
        daily_target: row.get(8)?,
        daily_progress: row.get(9)?,
        ratio: row.get(10)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}
