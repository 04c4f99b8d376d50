//! DTSTART / DTEND value parsing.
//!
//! Only the basic iCalendar forms are accepted. Anything else is an error,
//! never a guess:
//!
//! | Form               | Meaning                                    |
//! |--------------------|--------------------------------------------|
//! | `YYYYMMDDThhmmssZ` | UTC instant                                |
//! | `YYYYMMDDThhmmss`  | floating, read in the configured timezone  |
//! | `YYYYMMDD`         | date, midnight in the configured timezone  |

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Result, ScheduleError};

const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";
const DATE_FORMAT: &str = "%Y%m%d";

/// Parse an iCalendar timestamp. Floating values are interpreted in `tz`.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidTimestamp`] if the value is not one of the
/// accepted forms, or if a floating local time does not exist (or is
/// ambiguous) in `tz`.
pub fn parse_ics_timestamp(value: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let invalid = |reason: &str| ScheduleError::InvalidTimestamp(format!("'{value}': {reason}"));

    if !value.is_ascii() {
        return Err(invalid("expected YYYYMMDD, YYYYMMDDThhmmss or YYYYMMDDThhmmssZ"));
    }

    match value.len() {
        16 if value.ends_with('Z') => {
            let naive = NaiveDateTime::parse_from_str(&value[..15], DATE_TIME_FORMAT)
                .map_err(|e| invalid(&e.to_string()))?;
            Ok(naive.and_utc())
        }
        15 => {
            let naive = NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
                .map_err(|e| invalid(&e.to_string()))?;
            localize(naive, tz).ok_or_else(|| invalid("nonexistent or ambiguous local time"))
        }
        8 => {
            let date = NaiveDate::parse_from_str(value, DATE_FORMAT)
                .map_err(|e| invalid(&e.to_string()))?;
            localize(date.and_time(chrono::NaiveTime::MIN), tz)
                .ok_or_else(|| invalid("nonexistent or ambiguous local midnight"))
        }
        _ => Err(invalid(
            "expected YYYYMMDD, YYYYMMDDThhmmss or YYYYMMDDThhmmssZ",
        )),
    }
}

fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_parse_utc_form() {
        let dt = parse_ics_timestamp("20240101T090000Z", Tz::UTC).unwrap();
        assert_eq!(dt, utc(2024, 1, 1, 9, 0, 0));
    }

    #[test]
    fn test_utc_form_ignores_configured_zone() {
        let dt = parse_ics_timestamp("20240101T090000Z", chrono_tz::Europe::Paris).unwrap();
        assert_eq!(dt, utc(2024, 1, 1, 9, 0, 0));
    }

    #[test]
    fn test_parse_floating_in_utc() {
        let dt = parse_ics_timestamp("20240101T090000", Tz::UTC).unwrap();
        assert_eq!(dt, utc(2024, 1, 1, 9, 0, 0));
    }

    #[test]
    fn test_parse_floating_in_paris() {
        // January: CET, UTC+1
        let dt = parse_ics_timestamp("20240101T090000", chrono_tz::Europe::Paris).unwrap();
        assert_eq!(dt, utc(2024, 1, 1, 8, 0, 0));
        // July: CEST, UTC+2
        let dt = parse_ics_timestamp("20240701T090000", chrono_tz::Europe::Paris).unwrap();
        assert_eq!(dt, utc(2024, 7, 1, 7, 0, 0));
    }

    #[test]
    fn test_parse_date_only() {
        let dt = parse_ics_timestamp("20240315", Tz::UTC).unwrap();
        assert_eq!(dt, utc(2024, 3, 15, 0, 0, 0));
    }

    #[test]
    fn test_nonexistent_local_time_rejected() {
        // 2024-03-31 02:30 does not exist in Paris (spring forward).
        let err = parse_ics_timestamp("20240331T023000", chrono_tz::Europe::Paris).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_rejects_other_formats() {
        for bad in [
            "",
            "2024-01-01T09:00:00Z",
            "2024-01-01",
            "20240101T0900",
            "20241301T090000Z",
            "20240101T250000",
            "20240101X090000",
            "tomorrow",
            " 20240101T090000Z",
            "2024010éT09000",
        ] {
            let result = parse_ics_timestamp(bad, Tz::UTC);
            assert!(
                matches!(result, Err(ScheduleError::InvalidTimestamp(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_error_message_names_value() {
        let err = parse_ics_timestamp("soon", Tz::UTC).unwrap_err().to_string();
        assert!(err.contains("Invalid timestamp"), "got: {err}");
        assert!(err.contains("'soon'"), "got: {err}");
    }
}
