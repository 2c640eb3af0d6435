//! # Utilities Module
//!
//! This module contains helper functions and utilities used
//! across the backend service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Cents per currency unit.
pub const CENTS: i64 = 100;

/// Format an amount in cents as a human-readable string.
///
/// ## Examples
///
/// ```rust,ignore
/// assert_eq!(format_money(100), "1.00");
/// assert_eq!(format_money(123_456_789), "1,234,567.89");
/// assert_eq!(format_money(-5_050), "-50.50");
/// ```
pub fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let whole = abs / CENTS as u64;
    let frac = abs % CENTS as u64;

    // Add commas
    let whole_str = whole.to_string();
    let mut grouped = String::with_capacity(whole_str.len() + whole_str.len() / 3);
    for (i, c) in whole_str.chars().enumerate() {
        if i > 0 && (whole_str.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}{}.{:02}", sign, grouped, frac)
}

/// Parse a decimal amount ("1234.5", "1,234.50") into cents.
///
/// At most two decimals are accepted. Negative amounts are rejected.
pub fn parse_money(amount_str: &str) -> Result<i64, String> {
    let cleaned = amount_str.trim().replace(',', "");
    if cleaned.starts_with('-') {
        return Err("Amount cannot be negative".to_string());
    }

    let invalid = || format!("Invalid amount: {}", amount_str.trim());

    let (whole, frac) = match cleaned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if frac.len() > 2 {
        return Err(format!("Amount has more than two decimals: {}", amount_str.trim()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => frac.parse().map_err(|_| invalid())?,
    };

    whole
        .checked_mul(CENTS)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| format!("Amount too large: {}", amount_str.trim()))
}

/// Deserialize a money field given as a JSON number or string into cents.
pub fn deserialize_money<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let text = match &value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected an amount, found {}",
                other
            )))
        }
    };
    parse_money(&text).map_err(serde::de::Error::custom)
}

/// Generate an invoice number: `FACT-YYYYMMDD-XXXXXX`.
///
/// The suffix is six upper-case hex characters taken from a random UUID,
/// so callers must still check for collisions.
pub fn generate_invoice_number(date: NaiveDate) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!(
        "FACT-{}-{}",
        date.format("%Y%m%d"),
        simple[..6].to_uppercase()
    )
}

/// Format a sale timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn format_sale_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Trim a string and return `None` if nothing is left.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Require a non-blank string of at most `max_len` characters.
///
/// Problems are pushed onto `problems`; the trimmed value is returned either way.
pub fn require_text(
    problems: &mut Vec<String>,
    field: &str,
    value: &str,
    max_len: Option<usize>,
) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        problems.push(format!("{} is required", field));
    } else if let Some(max) = max_len {
        if trimmed.chars().count() > max {
            problems.push(format!("{} must be at most {} characters", field, max));
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0), "0.00");
        assert_eq!(format_money(5), "0.05");
        assert_eq!(format_money(100), "1.00");
        assert_eq!(format_money(99_999), "999.99");
        assert_eq!(format_money(100_000), "1,000.00");
        assert_eq!(format_money(123_456_789), "1,234,567.89");
        assert_eq!(format_money(-5_050), "-50.50");
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("100").unwrap(), 10_000);
        assert_eq!(parse_money("1.5").unwrap(), 150);
        assert_eq!(parse_money("1,234.56").unwrap(), 123_456);
        assert_eq!(parse_money(".25").unwrap(), 25);
        assert!(parse_money("-1").is_err());
        assert!(parse_money("1.234").is_err());
        assert!(parse_money("abc").is_err());
        assert!(parse_money("").is_err());
    }

    #[test]
    fn test_deserialize_money_accepts_numbers_and_strings() {
        #[derive(Deserialize)]
        struct Body {
            #[serde(deserialize_with = "deserialize_money")]
            price: i64,
        }

        let body: Body = serde_json::from_str(r#"{"price": 25000.5}"#).unwrap();
        assert_eq!(body.price, 2_500_050);
        let body: Body = serde_json::from_str(r#"{"price": "1,000"}"#).unwrap();
        assert_eq!(body.price, 100_000);
        assert!(serde_json::from_str::<Body>(r#"{"price": true}"#).is_err());
    }

    #[test]
    fn test_invoice_number_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let number = generate_invoice_number(date);

        assert!(number.starts_with("FACT-20240309-"));
        let suffix = &number["FACT-20240309-".len()..];
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_format_sale_date() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_sale_date(ts), "2024-01-02 03:04:05");
    }

    #[test]
    fn test_require_text() {
        let mut problems = Vec::new();
        assert_eq!(require_text(&mut problems, "name", "  Ana ", Some(10)), "Ana");
        require_text(&mut problems, "nit", "   ", None);
        require_text(&mut problems, "make", "abcdef", Some(3));
        assert_eq!(problems, vec!["nit is required", "make must be at most 3 characters"]);

        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some(" a@b.c ")), Some("a@b.c".to_string()));
    }
}
