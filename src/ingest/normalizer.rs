use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::error::Result;
use crate::ingest::dates::DateParser;
use crate::ingest::schema::ColumnMap;
use crate::types::{RowError, RowErrorReason, Transaction};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Valid transactions plus per-row rejections from one upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub transactions: Vec<Transaction>,
    pub rejected: Vec<RowError>,
}

impl Normalized {
    /// Data rows seen, blank lines excluded.
    pub fn total_rows(&self) -> usize {
        self.transactions.len() + self.rejected.len()
    }
}

/// Turns raw CSV bytes into validated transactions. Pure: never touches storage.
#[derive(Debug, Clone)]
pub struct Normalizer {
    dates: DateParser,
}

impl Normalizer {
    pub fn new<S: AsRef<str>>(date_formats: &[S]) -> Self {
        Self {
            dates: DateParser::new(date_formats),
        }
    }

    /// Fails only when the header is unusable. Bad data rows are collected in
    /// `Normalized::rejected` and never abort the batch.
    pub fn normalize(&self, raw: &[u8]) -> Result<Normalized> {
        let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);

        let mut rdr = ReaderBuilder::new()
            .delimiter(sniff_delimiter(raw))
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(raw);

        let columns = ColumnMap::resolve(rdr.headers()?)?;

        // Data rows are numbered by ordinal after the header, so blank lines and
        // quoted multi-line cells never shift the reported position.
        let mut line_number = 0u64;
        let mut out = Normalized::default();
        for record in rdr.records() {
            match record {
                Ok(rec) => {
                    if is_blank(&rec) {
                        continue;
                    }
                    line_number += 1;
                    match self.parse_row(&rec, &columns) {
                        Ok(tx) => out.transactions.push(tx),
                        Err(reason) => {
                            debug!(line_number, %reason, "rejected CSV row");
                            out.rejected.push(RowError { reason, line_number });
                        }
                    }
                }
                Err(e) => {
                    line_number += 1;
                    debug!(line_number, error = %e, "undecodable CSV row");
                    out.rejected.push(RowError {
                        reason: RowErrorReason::MalformedRow,
                        line_number,
                    });
                }
            }
        }

        Ok(out)
    }

    fn parse_row(
        &self,
        rec: &StringRecord,
        columns: &ColumnMap,
    ) -> std::result::Result<Transaction, RowErrorReason> {
        let cell = |idx: usize| rec.get(idx).ok_or(RowErrorReason::MissingField);

        let date = self
            .dates
            .parse(cell(columns.date)?)
            .ok_or(RowErrorReason::BadDate)?;

        let product = cell(columns.product)?;
        if product.is_empty() {
            return Err(RowErrorReason::EmptyProduct);
        }

        let quantity = parse_quantity(cell(columns.quantity)?).ok_or(RowErrorReason::BadQuantity)?;

        let amount = parse_amount(cell(columns.amount)?).ok_or(RowErrorReason::BadAmount)?;

        Ok(Transaction {
            date,
            product: product.to_string(),
            quantity,
            amount,
        })
    }
}

/// Non-negative finite decimal. A lone decimal comma (`12,50`) is accepted.
fn parse_amount(raw: &str) -> Option<f64> {
    let value = match raw.parse::<f64>() {
        Ok(v) => v,
        Err(_) if raw.matches(',').count() == 1 && !raw.contains('.') => {
            raw.replace(',', ".").parse::<f64>().ok()?
        }
        Err(_) => return None,
    };
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Whole number of units. Integral decimals such as `2.0` or `2,0` are accepted.
fn parse_quantity(raw: &str) -> Option<u32> {
    if let Ok(n) = raw.parse::<u32>() {
        return Some(n);
    }
    parse_amount(raw)
        .filter(|v| v.fract() == 0.0 && *v <= f64::from(u32::MAX))
        .map(|v| v as u32)
}

/// `;` when the header line uses it exclusively, otherwise `,`.
fn sniff_delimiter(raw: &[u8]) -> u8 {
    let header = raw
        .split(|&b| b == b'\n')
        .find(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
        .unwrap_or(&[]);
    if header.contains(&b';') && !header.contains(&b',') {
        b';'
    } else {
        b','
    }
}

/// A whitespace-only line trims down to a single empty field. Rows with
/// delimiters but empty cells (`,,,`) are data and go through validation.
fn is_blank(rec: &StringRecord) -> bool {
    rec.len() == 1 && rec.get(0).is_some_and(str::is_empty)
}
