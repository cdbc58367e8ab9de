//! Text cleaning and best-effort type coercion.
//!
//! Nothing in here fails: a value that cannot be parsed becomes
//! [`Value::Null`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use super::model::Value;

/// Enquiry exports, tried in order; the first one that parses any cell of
/// the column is used for the whole column.
pub const STAMPED_DATE_FORMATS: &[&str] = &[
    "%d-%b-%Y %I:%M %p", // 20-Feb-2025 2:40 PM
    "%d-%b-%Y %H:%M",    // 20-Feb-2025 14:40
    "%d-%m-%Y %H:%M",    // 20-02-2025 14:40
    "%m-%d-%Y %H:%M",    // 02-20-2025 14:40
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M",
    "%m-%d-%Y %H:%M:%S",
    "%m-%d-%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d-%b-%Y %I:%M %p",
    "%d-%b-%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d-%b-%Y",
    "%d-%b-%y",
    "%d %b %Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d.%m.%Y",
];

// ---------------------------------------------------------------------------
// Export artifacts
// ---------------------------------------------------------------------------

/// Strip `="`, `""` and `"` sequences left in header names by spreadsheet
/// exports.
pub fn clean_header(raw: &str) -> String {
    raw.replace("=\"", "")
        .replace("\"\"", "")
        .replace('"', "")
        .trim()
        .to_string()
}

/// Strip quote and equals artifacts from a cell and trim it.
/// Returns `None` for cells that are empty afterwards.
pub fn clean_cell(raw: &str) -> Option<String> {
    let cleaned = raw
        .replace("=\"", "")
        .replace("\"\"", "")
        .replace('"', "")
        .replace('=', "");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// Parse an amount such as `₹ 2,50,000`, `$1,200.50` or `Rs. 300000`.
pub fn parse_currency(raw: &str) -> Option<f64> {
    let mut s = raw.trim();
    for prefix in ["Rs.", "Rs", "INR", "₹", "$"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim_start();
        }
    }
    let digits: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse `78.5` or `78.5 %`.
pub fn parse_percentage(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let s = s.strip_suffix('%').unwrap_or(s).trim_end();
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Cell-level guess for undeclared columns: number if it parses, else text.
pub fn guess(cell: &str) -> Value {
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Value::Number(v),
        _ => Value::Text(cell.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Best-effort parse over the common export layouts. Ambiguous numeric
/// dates read month-first, with slashes or dashes; day-first is only used
/// when the month-first reading is impossible.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Parse one column of enquiry timestamps.
///
/// Each format of [`STAMPED_DATE_FORMATS`] is tried over the whole column;
/// the first to parse at least one cell is applied to every cell. If none
/// does, every cell goes through [`parse_date`].
pub fn parse_stamped_column(cells: &[Option<String>]) -> Vec<Value> {
    for fmt in STAMPED_DATE_FORMATS {
        let parsed: Vec<Option<NaiveDateTime>> = cells
            .iter()
            .map(|c| {
                c.as_deref()
                    .and_then(|s| NaiveDateTime::parse_from_str(s, fmt).ok())
            })
            .collect();
        if parsed.iter().any(Option::is_some) {
            log::debug!("enquiry dates parsed with format {fmt}");
            return parsed
                .into_iter()
                .map(|d| d.map(Value::Date).unwrap_or(Value::Null))
                .collect();
        }
    }
    cells
        .iter()
        .map(|c| {
            c.as_deref()
                .and_then(parse_date)
                .map(Value::Date)
                .unwrap_or(Value::Null)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn cleans_spreadsheet_artifacts() {
        assert_eq!(clean_header("=\"Allotment Status\""), "Allotment Status");
        assert_eq!(clean_cell("=\"Allotted\""), Some("Allotted".to_string()));
        assert_eq!(clean_cell("\"\"B.Tech\"\""), Some("B.Tech".to_string()));
        assert_eq!(clean_cell("  "), None);
        assert_eq!(clean_cell("=\"\""), None);
    }

    #[test]
    fn currency_accepts_symbols_and_separators() {
        assert_eq!(parse_currency("₹ 2,50,000"), Some(250000.0));
        assert_eq!(parse_currency("$1,200.50"), Some(1200.5));
        assert_eq!(parse_currency("Rs. 300000"), Some(300000.0));
        assert_eq!(parse_currency("unknown"), None);
    }

    #[test]
    fn percentage_accepts_suffix() {
        assert_eq!(parse_percentage("78.5%"), Some(78.5));
        assert_eq!(parse_percentage("91 %"), Some(91.0));
        assert_eq!(parse_percentage("n/a"), None);
    }

    #[test]
    fn best_effort_dates() {
        let d = parse_date("2025-06-14").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2025, 6, 14));

        let d = parse_date("06/14/2025").unwrap();
        assert_eq!((d.month(), d.day()), (6, 14));

        let d = parse_date("06-07-2025").unwrap();
        assert_eq!((d.month(), d.day()), (6, 7));
        let d = parse_date("25-07-2025").unwrap();
        assert_eq!((d.month(), d.day()), (7, 25));

        let d = parse_date("14-Jun-2025").unwrap();
        assert_eq!((d.month(), d.day()), (6, 14));

        let d = parse_date("2025-06-14 09:30:00").unwrap();
        assert_eq!(d.hour(), 9);

        assert!(parse_date("not a date").is_none());
    }

    #[test]
    fn stamped_column_uses_first_matching_format() {
        let cells = vec![
            Some("20-Feb-2025 2:40 PM".to_string()),
            Some("21-Feb-2025 14:40".to_string()),
            None,
        ];
        let out = parse_stamped_column(&cells);
        assert_eq!(out[0].as_date().unwrap().hour(), 14);
        // the 12-hour format won, so the 24-hour cell does not match it
        assert!(out[1].is_null());
        assert!(out[2].is_null());
    }

    #[test]
    fn stamped_column_numeric_day_first() {
        let cells = vec![Some("03-02-2025 10:15".to_string())];
        let d = parse_stamped_column(&cells)[0].as_date().unwrap();
        assert_eq!((d.day(), d.month()), (3, 2));
    }

    #[test]
    fn stamped_column_falls_back_to_best_effort() {
        let cells = vec![Some("2025-02-20".to_string()), Some("garbage".to_string())];
        let out = parse_stamped_column(&cells);
        assert_eq!(out[0].as_date().unwrap().day(), 20);
        assert!(out[1].is_null());
    }

    #[test]
    fn guesses_numbers_for_undeclared_columns() {
        assert_eq!(guess("42"), Value::Number(42.0));
        assert_eq!(guess("B.Sc"), Value::Text("B.Sc".into()));
    }
}
