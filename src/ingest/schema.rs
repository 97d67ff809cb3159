//! Header resolution: maps canonical sale fields to column positions.

use csv::StringRecord;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Product,
    Quantity,
    Amount,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Date, Field::Product, Field::Quantity, Field::Amount];

    pub fn name(self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Product => "product",
            Field::Quantity => "quantity",
            Field::Amount => "amount",
        }
    }

    /// Accepted header spellings, lowercase. The canonical name is always first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Date => &["date", "day", "sale_date", "дата"],
            Field::Product => &["product", "item", "name", "товар"],
            Field::Quantity => &["quantity", "qty", "count", "количество"],
            Field::Amount => &["amount", "sum", "total", "revenue", "сумма"],
        }
    }

    fn matches(self, header: &str) -> bool {
        let normalized = header.trim().trim_start_matches('\u{feff}').to_lowercase();
        self.aliases().iter().any(|alias| *alias == normalized)
    }
}

/// Column index of each required field within a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub product: usize,
    pub quantity: usize,
    pub amount: usize,
}

impl ColumnMap {
    /// Resolves every required field against the header row. The first matching
    /// column wins; unmatched columns are ignored.
    pub fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |field: Field| headers.iter().position(|h| field.matches(h));

        let mut missing = Vec::new();
        let mut slots = [0usize; 4];
        for (slot, field) in slots.iter_mut().zip(Field::ALL) {
            match find(field) {
                Some(idx) => *slot = idx,
                None => missing.push(field.name().to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(AppError::Schema { missing });
        }

        let [date, product, quantity, amount] = slots;
        Ok(Self { date, product, quantity, amount })
    }
}
