use chrono::NaiveDate;
use tracing::error;

/// Strip the numeric `"N. "` prefix the quote API puts on its field labels, e.g. `"1. open"` ->
/// `"open"`. Labels without such a prefix are returned unchanged, so applying it twice is the
/// same as applying it once.
///
/// ```
/// use quotes_warehouse::schema::common::strip_label_prefix;
///
/// assert_eq!(strip_label_prefix("1. open"), "open");
/// assert_eq!(strip_label_prefix("open"), "open");
/// ```
pub fn strip_label_prefix(label: &str) -> &str {
    match label.split_once(". ") {
        Some((prefix, name))
            if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) =>
        {
            name
        }
        _ => label,
    }
}

/// Convert a &str to a chrono::NaiveDate (so that it can inserted directly as DATE)
pub fn convert_date_type(str_date: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(str_date, "%Y-%m-%d").map_err(|e| {
        error!("failed to parse date string; expected form YYYY-MM-DD - received: {str_date}");
        e
    })
}
