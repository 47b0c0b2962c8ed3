// Portal value handling: numbers sent as strings, ids sent as floats,
// `09-Jan-2026` dates. Also the percentage and formatting helpers shared by
// the metric and report layers.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};
use serde_json::Value;

/// Date layout used by every date column of the portal exports, e.g.
/// `09-Jan-2026`.
pub const PORTAL_DATE_FORMAT: &str = "%d-%b-%Y";

/// Amount text as the portal writes it: padded, with Indian or western
/// comma grouping. Anything containing letters (`NA`, `Nil`) is `None`.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let digits: String = s?.trim().chars().filter(|&c| c != ',').collect();
    if digits.is_empty() || digits.bytes().any(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Amount columns come through either as JSON numbers or as strings.
pub fn value_to_f64(v: Option<&Value>) -> Option<f64> {
    match v? {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_f64_safe(Some(s)),
        _ => None,
    }
}

/// Textual view of an identifier or label column.
///
/// Numbers are rendered without a trailing `.0` so that a work id exported
/// as `12345.0` in one table joins with `12345` in another. Blank strings
/// and nulls are `None`.
pub fn value_to_text(v: Option<&Value>) -> Option<String> {
    let text = match v? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => format!("{}", f as i64),
                    Some(f) => f.to_string(),
                    None => n.to_string(),
                }
            }
        }
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Rupees to integer paise. Missing or negative-zero values become 0.
pub fn to_paise(rupees: Option<f64>) -> i64 {
    match rupees {
        Some(r) => (r * 100.0).round() as i64,
        None => 0,
    }
}

pub fn paise_to_rupees(paise: i64) -> f64 {
    paise as f64 / 100.0
}

pub fn parse_portal_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, PORTAL_DATE_FORMAT).ok()
}

/// `part / whole * 100`, with a zero (or negative) denominator mapped to 0.
pub fn pct(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    let v = part / whole * 100.0;
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

pub fn pct_of_counts(part: usize, whole: usize) -> f64 {
    pct(part as f64, whole as f64)
}

pub fn pct_of_paise(part: i64, whole: i64) -> f64 {
    pct(part as f64, whole as f64)
}

/// Ratio that has no meaningful sentinel: `None` when undefined.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let v = numerator / denominator;
    v.is_finite().then_some(v)
}

/// Fixed decimals with `en` thousands grouping, e.g. `1,234,567.89`.
/// Values that round to zero never carry a minus sign.
pub fn format_number(n: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, n.abs());
    let (whole, frac) = match fixed.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (fixed.as_str(), None),
    };
    let grouped = whole.parse::<u64>().unwrap_or(0).to_formatted_string(&Locale::en);
    let sign = if n < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        "-"
    } else {
        ""
    };
    match frac {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Currency column rendering: paise in, rupees with two decimals out.
pub fn format_rupees(paise: i64) -> String {
    format_number(paise_to_rupees(paise), 2)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
