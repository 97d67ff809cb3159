use chrono::{NaiveDate, NaiveDateTime};

/// Parses date cells against an ordered list of chrono patterns.
#[derive(Debug, Clone)]
pub struct DateParser {
    formats: Vec<String>,
}

impl DateParser {
    pub fn new<S: AsRef<str>>(formats: &[S]) -> Self {
        Self {
            formats: formats.iter().map(|f| f.as_ref().to_string()).collect(),
        }
    }

    /// First pattern that parses wins. Datetime patterns are truncated to the date.
    pub fn parse(&self, raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        self.formats.iter().find_map(|fmt| {
            NaiveDate::parse_from_str(raw, fmt)
                .ok()
                .or_else(|| NaiveDateTime::parse_from_str(raw, fmt).ok().map(|dt| dt.date()))
        })
    }
}
