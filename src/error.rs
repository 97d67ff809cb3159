use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    /// One or more required CSV columns are absent. Nothing from the upload is imported.
    #[error("Schema error: missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage timeout: {op} exceeded {timeout_ms}ms")]
    StorageTimeout { op: &'static str, timeout_ms: u64 },

    #[error("No data: {0}")]
    EmptyData(&'static str),

    #[error("Insufficient data: need {required} day(s) with sales, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Failures of the persistence layer, regardless of which variant carried them.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            AppError::Storage(_)
                | AppError::StorageTimeout { .. }
                | AppError::Database(_)
                | AppError::Migration(_)
        )
    }

    /// "No data" conditions that callers render differently from a zero result.
    pub fn is_no_data(&self) -> bool {
        matches!(self, AppError::EmptyData(_) | AppError::InsufficientData { .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::Schema { .. } | AppError::Csv(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            _ if self.is_no_data() => StatusCode::NOT_FOUND,
            AppError::StorageTimeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ if self.is_storage() => {
                error!("storage failure: {self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
