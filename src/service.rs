use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::analytics::{active_days, average_check, daily_revenue, forecast_next_day, top_products, window_bounds};
use crate::config::Config;
use crate::db::TransactionStore;
use crate::error::{AppError, Result};
use crate::ingest::Normalizer;
use crate::types::{Forecast, ImportResult, Report, Transaction};

/// The three operations offered to the transport layer: ingest, report, forecast.
/// Every date-dependent call takes its reference day explicitly.
pub struct SalesService {
    store: TransactionStore,
    normalizer: Normalizer,
    report_window_days: u32,
    top_products: usize,
    forecast_min_active_days: usize,
}

impl SalesService {
    pub fn new(store: TransactionStore, cfg: &Config) -> Self {
        Self {
            store,
            normalizer: Normalizer::new(cfg.date_formats.as_slice()),
            report_window_days: cfg.report_window_days,
            top_products: cfg.top_products,
            forecast_min_active_days: cfg.forecast_min_active_days,
        }
    }

    pub fn store(&self) -> &TransactionStore {
        &self.store
    }

    /// Every stored sale, oldest first.
    pub async fn transactions(&self) -> Result<Vec<Transaction>> {
        self.store.query_all().await
    }

    /// Normalizes and stores one CSV upload. A schema or storage failure imports
    /// nothing; bad rows are skipped and listed in the result.
    pub async fn ingest(&self, csv: &[u8]) -> Result<ImportResult> {
        let normalized = self.normalizer.normalize(csv).map_err(|e| {
            warn!("upload rejected: {e}");
            e
        })?;

        let imported_count = self.store.append(&normalized.transactions).await?;
        let rejected = normalized.rejected.len();

        info!(
            event = "IMPORT",
            bytes = csv.len(),
            rows = normalized.total_rows(),
            imported = imported_count,
            rejected,
            "IMPORT | {} rows imported, {} rejected",
            imported_count,
            rejected,
        );

        Ok(ImportResult {
            imported_count,
            rejected_rows: normalized.rejected,
        })
    }

    /// Daily series over the trailing window ending at `as_of`, plus average check
    /// and top products over every sale dated on or before `as_of`.
    pub async fn build_report(&self, as_of: NaiveDate) -> Result<Report> {
        let history = self.store.query_until(as_of).await?;
        if history.is_empty() {
            return Err(AppError::EmptyData("no sales recorded yet"));
        }

        let report = Report {
            as_of,
            daily_revenue: daily_revenue(&history, as_of, self.report_window_days),
            average_check: average_check(&history)?,
            top_products: top_products(&history, self.top_products),
        };
        debug!(%as_of, transactions = history.len(), "report built");
        Ok(report)
    }

    /// Mean of the zero-filled trailing window ending at `as_of`, as the estimate
    /// for the following day.
    pub async fn forecast(&self, as_of: NaiveDate) -> Result<Forecast> {
        let (start, end) = window_bounds(as_of, self.report_window_days).ok_or(
            AppError::InsufficientData {
                required: self.forecast_min_active_days,
                available: 0,
            },
        )?;
        let transactions = self.store.query_range(start, end).await?;
        let series = daily_revenue(&transactions, as_of, self.report_window_days);

        let available = active_days(&transactions);
        if available < self.forecast_min_active_days {
            return Err(AppError::InsufficientData {
                required: self.forecast_min_active_days,
                available,
            });
        }

        let date = as_of
            .succ_opt()
            .ok_or_else(|| AppError::BadRequest(format!("no day follows {as_of}")))?;
        let forecast = forecast_next_day(&series)?;
        debug!(%date, forecast, days = series.len(), "forecast computed");

        Ok(Forecast {
            date,
            forecast,
            days_used: series.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RowError, RowErrorReason};
    use std::time::Duration;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn service_with(cfg: Config) -> SalesService {
        let store = TransactionStore::in_memory(Duration::from_secs(5)).await.unwrap();
        SalesService::new(store, &cfg)
    }

    async fn service() -> SalesService {
        service_with(Config::default()).await
    }

    const WEEK_CSV: &str = "\
date,product,quantity,amount
2024-01-01,Coffee,10,100
2024-01-02,Coffee,10,120
2024-01-02,Cake,4,80
2024-01-03,Tea,5,150
2024-01-04,Cake,5,100
2024-01-05,Tea,1,50
2024-01-06,Coffee,20,200
2024-01-07,Cake,10,200
";

    #[tokio::test]
    async fn ingest_reports_imported_and_rejected_rows() {
        let svc = service().await;
        let csv = "Date,Product,Quantity,Amount\n2024-01-01,Widget,2,20.0\nbad-date,Gadget,1,10.0\n";

        let result = svc.ingest(csv.as_bytes()).await.unwrap();

        assert_eq!(result.imported_count, 1);
        assert_eq!(
            result.rejected_rows,
            vec![RowError { reason: RowErrorReason::BadDate, line_number: 2 }]
        );
        assert_eq!(svc.store().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn schema_error_imports_nothing() {
        let svc = service().await;
        let err = svc
            .ingest(b"date,product,qty\n2024-01-01,Widget,2\n")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Schema { .. }));
        assert_eq!(svc.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn report_over_a_week() {
        let svc = service().await;
        svc.ingest(WEEK_CSV.as_bytes()).await.unwrap();

        let report = svc.build_report(ymd(2024, 1, 7)).await.unwrap();

        let totals: Vec<f64> = report.daily_revenue.iter().map(|d| d.total_amount).collect();
        assert_eq!(totals, vec![100.0, 200.0, 150.0, 100.0, 50.0, 200.0, 200.0]);
        assert!((report.average_check - 1000.0 / 8.0).abs() < 1e-9);

        let top: Vec<_> = report
            .top_products
            .iter()
            .map(|p| (p.product.as_str(), p.total_amount))
            .collect();
        assert_eq!(top, vec![("Coffee", 420.0), ("Cake", 380.0), ("Tea", 200.0)]);
    }

    #[tokio::test]
    async fn report_ignores_sales_after_as_of() {
        let svc = service().await;
        svc.ingest(WEEK_CSV.as_bytes()).await.unwrap();

        let report = svc.build_report(ymd(2024, 1, 3)).await.unwrap();
        assert_eq!(report.daily_revenue.len(), 7);
        assert_eq!(report.daily_revenue.last().unwrap().date, ymd(2024, 1, 3));
        // Jan 1..3 only: 100 + 120 + 80 + 150 over 4 sales.
        assert!((report.average_check - 112.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn report_on_empty_store_is_no_data() {
        let svc = service().await;
        let err = svc.build_report(ymd(2024, 1, 7)).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyData(_)));
    }

    #[tokio::test]
    async fn forecast_is_mean_of_trailing_week() {
        let svc = service().await;
        svc.ingest(WEEK_CSV.as_bytes()).await.unwrap();

        let f = svc.forecast(ymd(2024, 1, 7)).await.unwrap();
        assert_eq!(f.date, ymd(2024, 1, 8));
        assert_eq!(f.days_used, 7);
        assert!((f.forecast - 1000.0 / 7.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn forecast_without_recent_sales_is_insufficient() {
        let svc = service().await;
        svc.ingest(WEEK_CSV.as_bytes()).await.unwrap();

        let err = svc.forecast(ymd(2024, 3, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientData { required: 1, available: 0 }));
    }

    #[tokio::test]
    async fn zero_amount_sales_count_as_activity() {
        let svc = service().await;
        svc.ingest(b"date,product,quantity,amount\n2024-01-07,Free,1,0\n")
            .await
            .unwrap();

        let report = svc.build_report(ymd(2024, 1, 7)).await.unwrap();
        assert_eq!(report.average_check, 0.0);

        let f = svc.forecast(ymd(2024, 1, 7)).await.unwrap();
        assert_eq!(f.forecast, 0.0);
        assert_eq!(f.date, ymd(2024, 1, 8));
    }

    #[tokio::test]
    async fn transactions_lists_everything_oldest_first() {
        let svc = service().await;
        svc.ingest(WEEK_CSV.as_bytes()).await.unwrap();

        let all = svc.transactions().await.unwrap();
        assert_eq!(all.len(), 8);
        assert_eq!(all.first().unwrap().date, ymd(2024, 1, 1));
        assert_eq!(all.last().unwrap().date, ymd(2024, 1, 7));
    }

    #[tokio::test]
    async fn forecast_honours_minimum_active_days() {
        let cfg = Config {
            forecast_min_active_days: 3,
            ..Config::default()
        };
        let svc = service_with(cfg).await;
        svc.ingest(b"date,product,quantity,amount\n2024-01-06,A,1,10\n2024-01-07,B,1,20\n")
            .await
            .unwrap();

        let err = svc.forecast(ymd(2024, 1, 7)).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientData { required: 3, available: 2 }));
    }
}
