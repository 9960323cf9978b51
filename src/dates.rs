use chrono::{DateTime, NaiveDate, NaiveDateTime};

// Tried in order; month-first wins over day-first for ambiguous input.
// Formats starting with %Y only apply when the text opens with a 4-digit year.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%y %H:%M",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m-%d-%Y %H:%M:%S",
    "%m-%d-%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%b %d %Y %H:%M:%S",
    "%b %d %Y %H:%M",
    "%b %d, %Y %H:%M:%S",
    "%b %d, %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Coerce a cell to a calendar date
///
/// Accepts the common spreadsheet and ISO layouts; a time of day, if
/// present, is discarded. Anything unrecognised yields `None` so callers
/// can treat it as a missing value.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use csv_desk::dates::parse_date;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
/// assert_eq!(parse_date("2024-03-05 18:45:00"), Some(day));
/// assert_eq!(parse_date("03/05/2024"), Some(day));
/// assert_eq!(parse_date("not a date"), None);
/// ```
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // Only the calendar day matters, so a trailing UTC marker is dropped
    let text = text.strip_suffix("UTC").map(str::trim_end).unwrap_or(text);

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }

    let year_first = text.len() >= 4 && text.as_bytes()[..4].iter().all(u8::is_ascii_digit);
    let applies = |fmt: &&&str| fmt.starts_with("%Y") == year_first;

    DATETIME_FORMATS
        .iter()
        .filter(applies)
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .filter(applies)
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn iso_variants() {
        assert_eq!(parse_date("2024-01-31"), ymd(2024, 1, 31));
        assert_eq!(parse_date("2024-01-31 23:59:59"), ymd(2024, 1, 31));
        assert_eq!(parse_date("2024-01-31T08:00:00.250"), ymd(2024, 1, 31));
        assert_eq!(parse_date("2024-01-31T08:00:00+05:30"), ymd(2024, 1, 31));
        assert_eq!(parse_date("2024/01/31 10:15"), ymd(2024, 1, 31));
        assert_eq!(parse_date("  2024-01-31  "), ymd(2024, 1, 31));
    }

    #[test]
    fn compact_and_labelled_forms() {
        assert_eq!(parse_date("20240131"), ymd(2024, 1, 31));
        assert_eq!(parse_date("2024-01-31 08:00:00 UTC"), ymd(2024, 1, 31));
        assert_eq!(parse_date("Jan 31 2024 10:00"), ymd(2024, 1, 31));
        assert_eq!(parse_date("January 31, 2024 10:00:05"), ymd(2024, 1, 31));
        assert_eq!(parse_date("UTC"), None);
    }

    #[test]
    fn slashes_are_month_first() {
        assert_eq!(parse_date("02/03/2024"), ymd(2024, 2, 3));
        assert_eq!(parse_date("2/3/24"), ymd(2024, 2, 3));
        assert_eq!(parse_date("12/25/2023 7:30 PM"), ymd(2023, 12, 25));
    }

    #[test]
    fn dashes_fall_back_to_day_first() {
        assert_eq!(parse_date("02-03-2024"), ymd(2024, 2, 3));
        assert_eq!(parse_date("25-12-2023"), ymd(2023, 12, 25));
        assert_eq!(parse_date("25.12.2023 08:00"), ymd(2023, 12, 25));
    }

    #[test]
    fn month_names() {
        assert_eq!(parse_date("March 5, 2024"), ymd(2024, 3, 5));
        assert_eq!(parse_date("5 Mar 2024"), ymd(2024, 3, 5));
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date("31/31/2024"), None);
    }
}
