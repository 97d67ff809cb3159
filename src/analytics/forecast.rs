use std::collections::HashSet;

use crate::error::{AppError, Result};
use crate::types::{DailyRevenue, Transaction};

/// Naive next-day estimate: the mean daily total across the supplied series.
/// A short series is averaged as-is; only an empty one is rejected.
pub fn forecast_next_day(series: &[DailyRevenue]) -> Result<f64> {
    if series.is_empty() {
        return Err(AppError::InsufficientData { required: 1, available: 0 });
    }
    let total: f64 = series.iter().map(|d| d.total_amount).sum();
    Ok(total / series.len() as f64)
}

/// Distinct dates that carry at least one sale, zero-amount sales included.
pub fn active_days(transactions: &[Transaction]) -> usize {
    transactions.iter().map(|t| t.date).collect::<HashSet<_>>().len()
}
