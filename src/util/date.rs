use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Abbreviated month names for pt-BR, January first.
const MONTHS_PT_BR: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateFormatError {
    #[error("Unparseable timestamp: {0:?}")]
    Parse(String),
}

/// Formats an ISO-8601 timestamp as `dd MMM yyyy` with pt-BR month names.
///
/// The calendar date is read in the timestamp's own offset; no conversion to
/// UTC or to the host's zone happens. Accepted shapes:
///
/// - RFC 3339: `2021-01-15T00:00:00Z`, `2021-01-15T10:00:00.123-03:00`
/// - offset without a colon, as the CMS emits it: `2021-03-25T19:25:28+0000`
/// - naive datetime: `2021-01-15T08:30:00`
/// - bare date: `2021-01-15`
///
/// # Errors
///
/// Returns [`DateFormatError::Parse`] for anything else. Callers rendering a
/// page should prefer [`format_date_or`] and show a placeholder.
///
/// # Examples
///
/// ```
/// use spacetraveling::util::format_date;
///
/// assert_eq!(format_date("2021-01-15T00:00:00Z").unwrap(), "15 jan 2021");
/// assert_eq!(format_date("2021-03-25T19:25:28+0000").unwrap(), "25 mar 2021");
/// assert!(format_date("ontem").is_err());
/// ```
pub fn format_date(timestamp: &str) -> Result<String, DateFormatError> {
    let date = parse_calendar_date(timestamp.trim())
        .ok_or_else(|| DateFormatError::Parse(timestamp.to_string()))?;

    // month0() is always 0..=11
    let month = MONTHS_PT_BR[date.month0() as usize];
    Ok(format!("{:02} {} {}", date.day(), month, date.year()))
}

/// Like [`format_date`], but absent or unparseable timestamps yield
/// `placeholder` instead of an error.
pub fn format_date_or(timestamp: Option<&str>, placeholder: &str) -> String {
    let Some(ts) = timestamp else {
        return placeholder.to_string();
    };

    match format_date(ts) {
        Ok(formatted) => formatted,
        Err(e) => {
            tracing::debug!(error = %e, "Falling back to date placeholder");
            placeholder.to_string()
        }
    }
}

fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
