use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};

use crate::error::{AppError, Result};
use crate::types::{DailyRevenue, ProductRanking, Transaction};

/// Inclusive `[start, end]` of a `days`-long window ending at `end`.
/// None for a zero-length window.
pub fn window_bounds(end: NaiveDate, days: u32) -> Option<(NaiveDate, NaiveDate)> {
    let span = u64::from(days.checked_sub(1)?);
    let start = end.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN);
    Some((start, end))
}

/// One entry per calendar day of the window, ascending, with zero for days
/// without sales. Transactions outside the window are ignored.
pub fn daily_revenue(
    transactions: &[Transaction],
    window_end: NaiveDate,
    window_days: u32,
) -> Vec<DailyRevenue> {
    let Some((start, end)) = window_bounds(window_end, window_days) else {
        return Vec::new();
    };

    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.date >= start && t.date <= end) {
        *totals.entry(t.date).or_insert(0.0) += t.amount;
    }

    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| DailyRevenue {
            date,
            total_amount: totals.get(&date).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Mean `amount` per transaction.
pub fn average_check(transactions: &[Transaction]) -> Result<f64> {
    if transactions.is_empty() {
        return Err(AppError::EmptyData("no transactions to average"));
    }
    let total: f64 = transactions.iter().map(|t| t.amount).sum();
    Ok(total / transactions.len() as f64)
}

/// Products by summed amount, highest first; equal totals ordered by name.
/// Returns at most `n` entries.
pub fn top_products(transactions: &[Transaction], n: usize) -> Vec<ProductRanking> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for t in transactions {
        *totals.entry(t.product.as_str()).or_insert(0.0) += t.amount;
    }

    let mut ranked: Vec<ProductRanking> = totals
        .into_iter()
        .map(|(product, total_amount)| ProductRanking {
            product: product.to_string(),
            total_amount,
        })
        .collect();
    ranked.sort_by(rank_order);
    ranked.truncate(n);
    ranked
}

fn rank_order(a: &ProductRanking, b: &ProductRanking) -> Ordering {
    b.total_amount
        .total_cmp(&a.total_amount)
        .then_with(|| a.product.cmp(&b.product))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(date: NaiveDate, product: &str, amount: f64) -> Transaction {
        Transaction {
            date,
            product: product.to_string(),
            quantity: 1,
            amount,
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            sale(ymd(2024, 1, 1), "Widget", 20.0),
            sale(ymd(2024, 1, 3), "Gadget", 15.0),
            sale(ymd(2024, 1, 3), "Widget", 5.0),
            sale(ymd(2024, 1, 5), "Doohickey", 25.0),
            sale(ymd(2023, 12, 20), "Gizmo", 99.0),
        ]
    }

    #[test]
    fn daily_series_is_fixed_length_ascending_and_zero_filled() {
        let series = daily_revenue(&sample(), ymd(2024, 1, 7), 7);

        assert_eq!(series.len(), 7);
        assert_eq!(series.first().unwrap().date, ymd(2024, 1, 1));
        assert_eq!(series.last().unwrap().date, ymd(2024, 1, 7));
        assert!(series.windows(2).all(|w| w[0].date < w[1].date));

        let totals: Vec<f64> = series.iter().map(|d| d.total_amount).collect();
        assert_eq!(totals, vec![20.0, 0.0, 20.0, 0.0, 25.0, 0.0, 0.0]);
    }

    #[test]
    fn daily_series_with_no_data_is_all_zero() {
        let series = daily_revenue(&[], ymd(2024, 3, 1), 5);
        assert_eq!(series.len(), 5);
        assert_eq!(series[0].date, ymd(2024, 2, 26));
        assert!(series.iter().all(|d| d.total_amount == 0.0));
    }

    #[test]
    fn zero_day_window_is_empty() {
        assert!(daily_revenue(&sample(), ymd(2024, 1, 7), 0).is_empty());
        assert_eq!(window_bounds(ymd(2024, 1, 7), 0), None);
        assert_eq!(window_bounds(ymd(2024, 1, 7), 1), Some((ymd(2024, 1, 7), ymd(2024, 1, 7))));
    }

    #[test]
    fn average_check_is_mean_amount() {
        let avg = average_check(&sample()).unwrap();
        assert!((avg - 164.0 / 5.0).abs() < 1e-9);
    }

    #[test]
    fn average_check_of_nothing_is_empty_data() {
        assert!(matches!(average_check(&[]), Err(AppError::EmptyData(_))));
    }

    #[test]
    fn top_products_sorted_and_truncated() {
        let top = top_products(&sample(), 3);
        let names: Vec<_> = top.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(names, vec!["Gizmo", "Doohickey", "Widget"]);
        assert_eq!(top[2].total_amount, 25.0);
        assert!(top.windows(2).all(|w| w[0].total_amount >= w[1].total_amount));

        assert_eq!(top_products(&sample(), 10).len(), 4);
        assert!(top_products(&sample(), 0).is_empty());
        assert!(top_products(&[], 3).is_empty());
    }

    #[test]
    fn ties_break_by_product_name() {
        let txs = vec![
            sale(ymd(2024, 1, 1), "Zeta", 10.0),
            sale(ymd(2024, 1, 1), "Alpha", 10.0),
            sale(ymd(2024, 1, 1), "Mid", 10.0),
        ];
        let names: Vec<_> = top_products(&txs, 3).into_iter().map(|p| p.product).collect();
        assert_eq!(names, vec!["Alpha", "Mid", "Zeta"]);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let txs = sample();
        assert_eq!(daily_revenue(&txs, ymd(2024, 1, 7), 7), daily_revenue(&txs, ymd(2024, 1, 7), 7));
        assert_eq!(top_products(&txs, 3), top_products(&txs, 3));
    }
}
