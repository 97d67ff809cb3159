use std::time::Duration;

use crate::error::{AppError, Result};

pub const DEFAULT_DB_PATH: &str = "db/database.db";

/// Number of trailing calendar days shown in a report and averaged by the forecast.
pub const REPORT_WINDOW_DAYS: u32 = 7;

/// Number of ranked products included in a report.
pub const TOP_PRODUCTS: usize = 3;

/// Upper bound for any single storage call (milliseconds).
pub const STORAGE_TIMEOUT_MS: u64 = 5_000;

/// Days with at least one sale required inside the window before a forecast is produced.
pub const FORECAST_MIN_ACTIVE_DAYS: usize = 1;

/// Largest accepted upload body (bytes).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Accepted date layouts, tried in order. Date-only and datetime patterns may be mixed;
/// datetime matches are truncated to their calendar date.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%Y%m%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub log_level: String,
    pub api_port: u16,
    pub storage_timeout_ms: u64,
    /// Trailing window for the daily revenue series (REPORT_WINDOW_DAYS)
    pub report_window_days: u32,
    /// Ranked products per report (TOP_PRODUCTS)
    pub top_products: usize,
    /// Minimum days with sales inside the window before forecasting (FORECAST_MIN_ACTIVE_DAYS)
    pub forecast_min_active_days: usize,
    /// chrono patterns for the date column (DATE_FORMATS, comma-separated)
    pub date_formats: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            log_level: "info".to_string(),
            api_port: 3000,
            storage_timeout_ms: STORAGE_TIMEOUT_MS,
            report_window_days: REPORT_WINDOW_DAYS,
            top_products: TOP_PRODUCTS,
            forecast_min_active_days: FORECAST_MIN_ACTIVE_DAYS,
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let report_window_days = parse_or(&lookup, "REPORT_WINDOW_DAYS", defaults.report_window_days)?;
        if report_window_days == 0 {
            return Err(AppError::Config("REPORT_WINDOW_DAYS must be at least 1".to_string()));
        }

        let date_formats = match lookup("DATE_FORMATS") {
            Some(raw) => {
                let formats: Vec<String> = raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if formats.is_empty() {
                    return Err(AppError::Config("DATE_FORMATS must list at least one pattern".to_string()));
                }
                formats
            }
            None => defaults.date_formats,
        };

        Ok(Self {
            db_path: lookup("DB_PATH")
                .or_else(|| lookup("ANALBOT_DB_PATH"))
                .unwrap_or(defaults.db_path),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            api_port: parse_or(&lookup, "API_PORT", defaults.api_port)?,
            storage_timeout_ms: parse_or(&lookup, "STORAGE_TIMEOUT_MS", defaults.storage_timeout_ms)?,
            report_window_days,
            top_products: parse_or(&lookup, "TOP_PRODUCTS", defaults.top_products)?,
            forecast_min_active_days: parse_or(
                &lookup,
                "FORECAST_MIN_ACTIVE_DAYS",
                defaults.forecast_min_active_days,
            )?,
            date_formats,
        })
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{key} must be a valid number, got {raw:?}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let cfg = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.db_path, DEFAULT_DB_PATH);
        assert_eq!(cfg.report_window_days, 7);
        assert_eq!(cfg.top_products, 3);
        assert_eq!(cfg.date_formats.len(), DEFAULT_DATE_FORMATS.len());
    }

    #[test]
    fn legacy_db_path_variable_is_honoured() {
        let cfg = Config::from_lookup(lookup_from(&[("ANALBOT_DB_PATH", "/tmp/sales.db")])).unwrap();
        assert_eq!(cfg.db_path, "/tmp/sales.db");

        let cfg = Config::from_lookup(lookup_from(&[
            ("ANALBOT_DB_PATH", "/tmp/legacy.db"),
            ("DB_PATH", "/tmp/new.db"),
        ]))
        .unwrap();
        assert_eq!(cfg.db_path, "/tmp/new.db");
    }

    #[test]
    fn invalid_numbers_are_config_errors() {
        let err = Config::from_lookup(lookup_from(&[("API_PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("REPORT_WINDOW_DAYS", "0")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn date_formats_override() {
        let cfg = Config::from_lookup(lookup_from(&[("DATE_FORMATS", "%d.%m.%Y, %Y-%m-%d")])).unwrap();
        assert_eq!(cfg.date_formats, vec!["%d.%m.%Y", "%Y-%m-%d"]);
    }
}
