use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parses a course date leniently. Anything unrecognised becomes `None`, never an error.
///
/// Timestamps without an offset are read as UTC; bare dates are midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    tracing::debug!(value, "unparseable course date treated as absent");
    None
}

pub fn parse_optional(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(parse_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn accepts_rfc3339_with_offset() {
        let parsed = parse_timestamp("2025-02-10T09:30:00+02:00");
        assert_eq!(
            parsed,
            Utc.with_ymd_and_hms(2025, 2, 10, 7, 30, 0).single()
        );
    }

    #[test]
    fn bare_dates_are_midnight_utc() {
        assert_eq!(
            parse_timestamp("2024-10-01"),
            Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).single()
        );
    }

    #[test]
    fn naive_datetimes_are_read_as_utc() {
        assert_eq!(
            parse_timestamp("2024-10-01 12:00:00"),
            Utc.with_ymd_and_hms(2024, 10, 1, 12, 0, 0).single()
        );
    }

    #[test]
    fn malformed_values_become_absent() {
        assert_eq!(parse_timestamp("not-a-date"), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("2024-13-45"), None);
        assert_eq!(parse_optional(None), None);
    }
}
