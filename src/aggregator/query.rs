//! Trip search query parameters and their validation.
//!
//! Parameters arrive as optional strings so that every problem can be
//! reported at once instead of failing on the first missing field.

use serde::Deserialize;

/// Raw query string of the trip endpoints. Unknown parameters are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripQueryParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
}

/// A validated trip search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripQuery {
    pub from: String,
    pub to: String,
    pub date: String,
}

impl TripQueryParams {
    /// Validate, returning every message on failure.
    pub fn validate(self) -> Result<TripQuery, Vec<String>> {
        let mut errors = Vec::new();

        let from = required(self.from, "From location must be provided", &mut errors);
        let to = required(self.to, "To location must be provided", &mut errors);
        let date = required(self.date, "Date must be provided", &mut errors);
        if let Some(d) = &date {
            if !is_iso_date(d) {
                errors.push("Date must be in YYYY-MM-DD format".to_string());
            }
        }

        match (from, to, date) {
            (Some(from), Some(to), Some(date)) if errors.is_empty() => Ok(TripQuery { from, to, date }),
            _ => Err(errors),
        }
    }
}

fn required(value: Option<String>, message: &str, errors: &mut Vec<String>) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.push(message.to_string());
            None
        }
    }
}

/// `YYYY-MM-DD`, digits only. Calendar validity is left to the services.
fn is_iso_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
