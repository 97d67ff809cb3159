//! Row types for the `sales` table (see migrations/0001_create_sales.sql).
use chrono::NaiveDate;

use crate::error::AppError;
use crate::types::Transaction;

pub const ISO_DATE: &str = "%Y-%m-%d";

#[derive(Debug, sqlx::FromRow)]
pub struct SaleRow {
    pub id: i64,
    pub date: String,
    pub product: String,
    pub quantity: i64,
    pub amount: f64,
}

impl TryFrom<SaleRow> for Transaction {
    type Error = AppError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(&row.date, ISO_DATE).map_err(|e| {
            AppError::Storage(format!("sales row {} has unreadable date {:?}: {e}", row.id, row.date))
        })?;
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            AppError::Storage(format!("sales row {} has out-of-range quantity {}", row.id, row.quantity))
        })?;
        Ok(Transaction {
            date,
            product: row.product,
            quantity,
            amount: row.amount,
        })
    }
}
