//! Daily target, progress and ratio derivation.
//!
//! Everything here is a pure function of its inputs.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult};

/// Monthly points quota every employee is measured against.
pub const MONTHLY_TARGET: f64 = 24000.0;

/// Fields derived from a raw daily observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedPerformance {
    pub daily_target: f64,
    pub daily_progress: f64,
    pub ratio: f64,
}

/// Number of days (28-31) in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        // Only reachable at the edge of chrono's representable range
        _ => 31,
    }
}

/// First and last day of a month, validating `month` is 1-12.
pub fn month_bounds(year: i32, month: u32) -> TrackerResult<(NaiveDate, NaiveDate)> {
    if !(1..=12).contains(&month) {
        return Err(TrackerError::invalid(format!("month must be 1-12, got {}", month)));
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| TrackerError::invalid(format!("year {} out of range", year)))?;
    let last = first
        .with_day(days_in_month(first))
        .ok_or_else(|| TrackerError::invalid(format!("year {} out of range", year)))?;
    Ok((first, last))
}

fn check_target(monthly_target: f64) -> TrackerResult<()> {
    if !monthly_target.is_finite() || monthly_target <= 0.0 {
        return Err(TrackerError::invalid(format!(
            "monthly target must be positive (division undefined for {})",
            monthly_target
        )));
    }
    Ok(())
}

fn check_amount(name: &str, value: f64) -> TrackerResult<()> {
    if !value.is_finite() {
        return Err(TrackerError::invalid(format!("{} must be a number", name)));
    }
    if value < 0.0 {
        return Err(TrackerError::invalid(format!("{} cannot be negative", name)));
    }
    Ok(())
}

/// `monthly_target / days_in_month(date)`.
pub fn daily_target(date: NaiveDate, monthly_target: f64) -> TrackerResult<f64> {
    check_target(monthly_target)?;
    Ok(monthly_target / days_in_month(date) as f64)
}

/// Derive the daily target, daily progress and ratio for one observation.
///
/// Ratio is 0 when there are no sales.
pub fn compute_derived(
    daily_points: f64,
    sales_amount: f64,
    date: NaiveDate,
    monthly_target: f64,
) -> TrackerResult<DerivedPerformance> {
    check_amount("daily_points", daily_points)?;
    check_amount("sales_amount", sales_amount)?;

    let daily_target = daily_target(date, monthly_target)?;
    let daily_progress = (daily_points / daily_target) * 100.0;
    let ratio = if sales_amount > 0.0 {
        (daily_points / sales_amount) * 100.0
    } else {
        0.0
    };

    Ok(DerivedPerformance {
        daily_target,
        daily_progress,
        ratio,
    })
}

/// Percentage of `monthly_target` reached by `total_points`.
pub fn monthly_progress(total_points: f64, monthly_target: f64) -> TrackerResult<f64> {
    check_target(monthly_target)?;
    Ok((total_points / monthly_target) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(day(2024, 1, 15)), 31);
        assert_eq!(days_in_month(day(2024, 2, 1)), 29);
        assert_eq!(days_in_month(day(2023, 2, 28)), 28);
        assert_eq!(days_in_month(day(2024, 4, 30)), 30);
        assert_eq!(days_in_month(day(2024, 12, 31)), 31);
    }

    #[test]
    fn test_daily_target_thirty_day_month() {
        let derived = compute_derived(0.0, 0.0, day(2024, 6, 3), MONTHLY_TARGET).unwrap();
        assert_eq!(derived.daily_target, 800.0);
    }

    #[test]
    fn test_daily_target_thirty_one_day_month() {
        let derived = compute_derived(0.0, 0.0, day(2024, 7, 3), MONTHLY_TARGET).unwrap();
        assert!((derived.daily_target - 774.19).abs() < 0.01);
    }

    #[test]
    fn test_daily_progress() {
        let derived = compute_derived(1200.0, 0.0, day(2024, 6, 3), MONTHLY_TARGET).unwrap();
        assert_eq!(derived.daily_progress, 150.0);
    }

    #[test]
    fn test_ratio_zero_without_sales() {
        for points in [0.0, 1.0, 500.0, 99999.0] {
            let derived = compute_derived(points, 0.0, day(2024, 6, 3), MONTHLY_TARGET).unwrap();
            assert_eq!(derived.ratio, 0.0);
        }
    }

    #[test]
    fn test_ratio_with_sales() {
        let derived = compute_derived(250.0, 1000.0, day(2024, 6, 3), MONTHLY_TARGET).unwrap();
        assert_eq!(derived.ratio, 25.0);
    }

    #[test]
    fn test_deterministic() {
        let a = compute_derived(777.7, 1234.5, day(2024, 3, 9), MONTHLY_TARGET).unwrap();
        let b = compute_derived(777.7, 1234.5, day(2024, 3, 9), MONTHLY_TARGET).unwrap();
        assert_eq!(a.daily_target.to_bits(), b.daily_target.to_bits());
        assert_eq!(a.daily_progress.to_bits(), b.daily_progress.to_bits());
        assert_eq!(a.ratio.to_bits(), b.ratio.to_bits());
    }

    #[test]
    fn test_non_positive_target_rejected() {
        assert!(matches!(
            compute_derived(10.0, 0.0, day(2024, 6, 3), 0.0),
            Err(TrackerError::InvalidInput(_))
        ));
        assert!(compute_derived(10.0, 0.0, day(2024, 6, 3), -5.0).is_err());
        assert!(compute_derived(10.0, 0.0, day(2024, 6, 3), f64::NAN).is_err());
        assert!(monthly_progress(10.0, 0.0).is_err());
    }

    #[test]
    fn test_invalid_amounts_rejected() {
        assert!(compute_derived(-1.0, 0.0, day(2024, 6, 3), MONTHLY_TARGET).is_err());
        assert!(compute_derived(1.0, -0.5, day(2024, 6, 3), MONTHLY_TARGET).is_err());
        assert!(compute_derived(f64::INFINITY, 0.0, day(2024, 6, 3), MONTHLY_TARGET).is_err());
    }

    #[test]
    fn test_monthly_progress() {
        assert_eq!(monthly_progress(6000.0, MONTHLY_TARGET).unwrap(), 25.0);
        assert_eq!(monthly_progress(0.0, MONTHLY_TARGET).unwrap(), 0.0);
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds(2024, 2).unwrap(), (day(2024, 2, 1), day(2024, 2, 29)));
        assert_eq!(month_bounds(2023, 12).unwrap(), (day(2023, 12, 1), day(2023, 12, 31)));
        assert!(month_bounds(2024, 0).is_err());
        assert!(month_bounds(2024, 13).is_err());
    }
}
