//! Spreadsheet serial date conversion.
//!
//! Serial dates count days from a reference epoch, with the time of day as
//! the fractional part. Serial 1 is 1900-01-01, and the producing
//! application believes 1900 was a leap year: serial 60 is the nonexistent
//! 1900-02-29. Serials above 59 are therefore one day "ahead" of the
//! calendar and are counted from 1899-12-30 instead of 1899-12-31.

use crate::error::{Error, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};

const SECONDS_PER_DAY: i64 = 86_400;

/// Last serial day that precedes the phantom 1900-02-29.
const LAST_DAY_BEFORE_LEAP_BUG: i64 = 59;

/// Convert the textual form of a serial date into a date string.
///
/// Whole days produce `YYYY-MM-DD`; any time of day produces an RFC 3339
/// UTC timestamp `YYYY-MM-DDTHH:MM:SSZ`. The time is rounded to the
/// nearest second.
///
/// # Example
///
/// ```
/// use unxlsx::serial_to_date;
///
/// assert_eq!(serial_to_date("43489")?, "2019-01-24");
/// assert_eq!(serial_to_date("43489.25")?, "2019-01-24T06:00:00Z");
/// # Ok::<(), unxlsx::Error>(())
/// ```
pub fn serial_to_date(text: &str) -> Result<String> {
    let serial: f64 = text
        .trim()
        .parse()
        .map_err(|_| Error::InvalidNumericFormat(text.to_string()))?;
    if !serial.is_finite() {
        return Err(Error::InvalidNumericFormat(text.to_string()));
    }

    let total_seconds = (serial * SECONDS_PER_DAY as f64).round();
    if total_seconds.abs() > i64::MAX as f64 / 2.0 {
        return Err(Error::InvalidNumericFormat(text.to_string()));
    }
    let total_seconds = total_seconds as i64;

    let days = total_seconds.div_euclid(SECONDS_PER_DAY);
    let seconds = total_seconds.rem_euclid(SECONDS_PER_DAY);

    let timestamp = epoch_for(days)
        .and_then(|epoch| epoch.checked_add_signed(Duration::try_seconds(total_seconds)?))
        .ok_or_else(|| Error::InvalidNumericFormat(text.to_string()))?;

    Ok(format_timestamp(timestamp, seconds == 0))
}

/// Epoch (serial day 0) used for a given whole day count.
fn epoch_for(days: i64) -> Option<NaiveDateTime> {
    let (year, month, day) = if (0..=LAST_DAY_BEFORE_LEAP_BUG).contains(&days) {
        (1899, 12, 31)
    } else {
        (1899, 12, 30)
    };
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
}

fn format_timestamp(timestamp: NaiveDateTime, date_only: bool) -> String {
    if date_only {
        timestamp.format("%Y-%m-%d").to_string()
    } else {
        timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

/// Check whether a number format code denotes a date or time.
///
/// This is a heuristic over the format mini-language: any occurrence of
/// `d`, `m`, `h`, `y` or `s` (case-insensitive) counts, including inside
/// quoted literals, escapes and bracketed sections. A purely textual
/// format such as `"Y"0` or a colour tag like `[Red]` is therefore
/// classified as a date.
pub fn is_date_format_code(code: &str) -> bool {
    code.chars()
        .any(|c| matches!(c.to_ascii_lowercase(), 'd' | 'm' | 'h' | 'y' | 's'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_to_date_fixtures() {
        let fixtures = [
            ("43489", "2019-01-24"),
            ("43489.0", "2019-01-24"),
            ("-100", "1899-09-21"),
            ("-100.0", "1899-09-21"),
            ("43489.25", "2019-01-24T06:00:00Z"),
            ("43489.5", "2019-01-24T12:00:00Z"),
            ("43489.99999", "2019-01-24T23:59:59Z"),
            ("-100.25", "1899-09-20T18:00:00Z"),
        ];

        for (input, expected) in fixtures {
            assert_eq!(serial_to_date(input).unwrap(), expected, "serial {input}");
        }
    }

    #[test]
    fn test_leap_year_bug_boundary() {
        assert_eq!(serial_to_date("1").unwrap(), "1900-01-01");
        assert_eq!(serial_to_date("2").unwrap(), "1900-01-02");
        assert_eq!(serial_to_date("59").unwrap(), "1900-02-28");
        // Serial 60 is the phantom 1900-02-29, counted from the shifted epoch.
        assert_eq!(serial_to_date("60").unwrap(), "1900-02-28");
        assert_eq!(serial_to_date("61").unwrap(), "1900-03-01");
        assert_eq!(serial_to_date("44197").unwrap(), "2021-01-01");
        assert_eq!(serial_to_date("45658").unwrap(), "2025-01-01");
    }

    #[test]
    fn test_day_zero_and_small_fractions() {
        assert_eq!(serial_to_date("0").unwrap(), "1899-12-31");
        assert_eq!(serial_to_date("0.5").unwrap(), "1899-12-31T12:00:00Z");
        assert_eq!(serial_to_date("59.75").unwrap(), "1900-02-28T18:00:00Z");
    }

    #[test]
    fn test_time_rounding_carries() {
        // 0.0000115740... days is one second; just under it rounds up.
        assert_eq!(serial_to_date("1.0000115").unwrap(), "1900-01-01T00:00:01Z");
        // 1:59:59.6 rounds into the next hour.
        let serial = 44197.0 + (7199.6 / 86400.0);
        assert_eq!(
            serial_to_date(&serial.to_string()).unwrap(),
            "2021-01-01T02:00:00Z"
        );
    }

    #[test]
    fn test_invalid_serials() {
        for input in ["wat", "100.25.25", "", "inf", "NaN", "1e400"] {
            assert!(
                matches!(serial_to_date(input), Err(Error::InvalidNumericFormat(_))),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_out_of_range_serial() {
        assert!(matches!(
            serial_to_date("1e15"),
            Err(Error::InvalidNumericFormat(_))
        ));
    }

    #[test]
    fn test_is_date_format_code() {
        let cases = [
            ("DD/MM/YYYY", true),
            ("hh:mm:ss", true),
            ("YYYY-MM-DD", true),
            ("[mm]:ss", true),
            ("[Red]hh:dd;[Red]", true),
            ("mmmm\\ d\\,\\ yyyy", true),
            ("000,00,00%", false),
            ("potato", false),
            ("0.00E+00", false),
            ("#,##0", false),
            ("", false),
        ];

        for (code, expected) in cases {
            assert_eq!(is_date_format_code(code), expected, "code {code:?}");
        }
    }

    #[test]
    fn test_is_date_format_code_scans_literals() {
        // Quoted and escaped literals are not excluded.
        assert!(is_date_format_code(r#"0.00" YYY""#));
        assert!(is_date_format_code(r#""Y"YYYY"Y""#));
        assert!(is_date_format_code(r"0.00\Y"));
        assert!(is_date_format_code("0;[Red]0"));
    }
}
