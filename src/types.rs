use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// One validated sale. Only the normalizer constructs these from CSV input, and
/// a stored transaction is never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Serialized as ISO `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub product: String,
    pub quantity: u32,
    pub amount: f64,
}

// ---------------------------------------------------------------------------
// Import outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorReason {
    BadDate,
    BadQuantity,
    BadAmount,
    EmptyProduct,
    /// Row has fewer cells than the highest mapped column.
    MissingField,
    /// Row could not be decoded at all (e.g. invalid UTF-8).
    MalformedRow,
}

impl std::fmt::Display for RowErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RowErrorReason::BadDate => "bad_date",
            RowErrorReason::BadQuantity => "bad_quantity",
            RowErrorReason::BadAmount => "bad_amount",
            RowErrorReason::EmptyProduct => "empty_product",
            RowErrorReason::MissingField => "missing_field",
            RowErrorReason::MalformedRow => "malformed_row",
        };
        write!(f, "{s}")
    }
}

/// A rejected data row. `line_number` counts data lines from 1, so the first line
/// after the header is line 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub reason: RowErrorReason,
    pub line_number: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub imported_count: usize,
    pub rejected_rows: Vec<RowError>,
}

// ---------------------------------------------------------------------------
// Derived analytics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRanking {
    pub product: String,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub as_of: NaiveDate,
    /// Trailing window ending at `as_of`, ascending, zero-filled.
    pub daily_revenue: Vec<DailyRevenue>,
    /// Mean sale amount over every transaction dated on or before `as_of`.
    pub average_check: f64,
    pub top_products: Vec<ProductRanking>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// The day being forecast (`as_of + 1`).
    pub date: NaiveDate,
    pub forecast: f64,
    /// Length of the daily series the mean was taken over.
    pub days_used: usize,
}
