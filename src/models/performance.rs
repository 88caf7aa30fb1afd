use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TrackerError, TrackerResult};
use crate::scoring::calculator::{compute_derived, MONTHLY_TARGET};

/// Which submission style produced a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Daily performance observation (points plus sales)
    #[default]
    Performance,
    /// Free-form points award with a description
    Points,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::Points => "points",
        }
    }

    pub fn parse(s: &str) -> TrackerResult<Self> {
        match s {
            "performance" => Ok(Self::Performance),
            "points" => Ok(Self::Points),
            other => Err(TrackerError::invalid(format!(
                "unknown entry kind '{}' (expected performance or points)",
                other
            ))),
        }
    }
}

/// One ledger entry: a single day's observation for one employee.
///
/// `daily_target`, `daily_progress` and `ratio` are derived; they are filled by
/// [`Performance::recompute`] and never taken from callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub id: Uuid,
    pub employee_id: String,
    pub date: NaiveDate,
    pub daily_points: f64,
    pub sales_amount: f64,
    pub kind: EntryKind,
    pub description: Option<String>,
    pub monthly_target: f64,
    pub daily_target: f64,
    pub daily_progress: f64,
    pub ratio: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Performance {
    /// Build a new entry with derived fields already computed.
    pub fn new(
        employee_id: String,
        date: NaiveDate,
        daily_points: f64,
        sales_amount: f64,
    ) -> TrackerResult<Self> {
        let now = Utc::now();
        let mut perf = Self {
            id: Uuid::new_v4(),
            employee_id,
            date,
            daily_points,
            sales_amount,
            kind: EntryKind::Performance,
            description: None,
            monthly_target: MONTHLY_TARGET,
            daily_target: 0.0,
            daily_progress: 0.0,
            ratio: 0.0,
            created_at: now,
            updated_at: now,
        };
        perf.recompute()?;
        Ok(perf)
    }

    /// Build a points entry (legacy submission style).
    pub fn points(
        employee_id: String,
        date: NaiveDate,
        points: f64,
        description: String,
    ) -> TrackerResult<Self> {
        let mut perf = Self::new(employee_id, date, points, 0.0)?;
        perf.kind = EntryKind::Points;
        perf.description = Some(description);
        Ok(perf)
    }

    /// Recompute derived fields from points, sales and date.
    pub fn recompute(&mut self) -> TrackerResult<()> {
        let derived = compute_derived(
            self.daily_points,
            self.sales_amount,
            self.date,
            self.monthly_target,
        )?;
        self.daily_target = derived.daily_target;
        self.daily_progress = derived.daily_progress;
        self.ratio = derived.ratio;
        Ok(())
    }

    /// Replace the raw inputs and recompute. Sales stay unchanged when `None`.
    pub fn set_values(&mut self, daily_points: f64, sales_amount: Option<f64>) -> TrackerResult<()> {
        self.daily_points = daily_points;
        if let Some(sales) = sales_amount {
            self.sales_amount = sales;
        }
        self.recompute()?;
        self.updated_at = Utc::now();
        Ok(())
    }
}
