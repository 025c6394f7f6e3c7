//! HTTP-date parsing and formatting.
//!
//! Accepts the three forms of RFC 7231 §7.1.1.1 and RFC 2822 numeric offsets.
//! The leading weekday is only matched as a word. Always produces IMF-fixdate.

use chrono::{DateTime, NaiveDateTime, Utc};

const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

// Date parts once the leading weekday token is removed. The weekday itself is
// not checked against the calendar date.
const IMF_DATE_PART: &str = "%d %b %Y %H:%M:%S GMT";
const RFC_850_DATE_PART: &str = "%d-%b-%y %H:%M:%S GMT";
const ASCTIME_DATE_PART: &str = "%b %e %H:%M:%S %Y";
const RFC_2822_DATE_PART: &str = "%d %b %Y %H:%M:%S %z";

/// Parses an HTTP-date header value. Returns `None` for anything unrecognised.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    parse_after_weekday(value).or_else(|| {
        DateTime::parse_from_rfc2822(value)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

fn parse_after_weekday(value: &str) -> Option<DateTime<Utc>> {
    if let Some((weekday, rest)) = value.split_once(',') {
        if !is_weekday_token(weekday) {
            return None;
        }
        let rest = rest.trim_start();
        return [IMF_DATE_PART, RFC_850_DATE_PART]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(rest, format).ok())
            .map(|naive| naive.and_utc())
            .or_else(|| {
                DateTime::parse_from_str(rest, RFC_2822_DATE_PART)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            });
    }

    let (weekday, rest) = value.split_once(' ')?;
    if !is_weekday_token(weekday) {
        return None;
    }
    NaiveDateTime::parse_from_str(rest.trim_start(), ASCTIME_DATE_PART)
        .ok()
        .map(|naive| naive.and_utc())
}

fn is_weekday_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphabetic())
}

/// Formats an instant as IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(instant: DateTime<Utc>) -> String {
    instant.format(IMF_FIXDATE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rfc_example() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap()
    }

    #[test]
    fn test_parse_imf_fixdate() {
        assert_eq!(
            parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"),
            Some(rfc_example())
        );
        assert_eq!(
            parse_http_date("  Sun, 06 Nov 1994 08:49:37 GMT "),
            Some(rfc_example())
        );
    }

    #[test]
    fn test_parse_obsolete_formats() {
        assert_eq!(
            parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"),
            Some(rfc_example())
        );
        assert_eq!(
            parse_http_date("Sun Nov  6 08:49:37 1994"),
            Some(rfc_example())
        );
    }

    #[test]
    fn test_parse_numeric_offset_falls_back_to_rfc2822() {
        assert_eq!(
            parse_http_date("Sun, 06 Nov 1994 09:49:37 +0100"),
            Some(rfc_example())
        );
    }

    #[test]
    fn test_weekday_is_not_checked_against_date() {
        // 6 Nov 1994 was a Sunday.
        assert_eq!(
            parse_http_date("Mon, 06 Nov 1994 08:49:37 GMT"),
            Some(rfc_example())
        );
        assert_eq!(
            parse_http_date("Friday, 06-Nov-94 08:49:37 GMT"),
            Some(rfc_example())
        );
        assert_eq!(
            parse_http_date("Tue Nov  6 08:49:37 1994"),
            Some(rfc_example())
        );
        assert_eq!(
            parse_http_date("Wed, 06 Nov 1994 09:49:37 +0100"),
            Some(rfc_example())
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_http_date(""), None);
        assert_eq!(parse_http_date("0"), None);
        assert_eq!(parse_http_date("-1"), None);
        assert_eq!(parse_http_date("yesterday"), None);
        assert_eq!(parse_http_date("12, 06 Nov 1994 08:49:37 GMT"), None);
    }

    #[test]
    fn test_format_is_imf_fixdate() {
        assert_eq!(format_http_date(rfc_example()), "Sun, 06 Nov 1994 08:49:37 GMT");
        let formatted = format_http_date(rfc_example());
        assert_eq!(parse_http_date(&formatted), Some(rfc_example()));
    }
}
