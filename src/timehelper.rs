use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Formats accepted for user-supplied datetimes (search form, CLI flags).
pub const DATETIME_INPUT_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d"];

pub fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
}

/// Tries each format in turn. A bare date parses to midnight.
pub fn try_to_parse_date_time(value: &str, formats: &[&str]) -> Result<NaiveDateTime, String> {
    let mut last_err = None;
    for format in formats {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
        match NaiveDate::parse_from_str(value, format) {
            Ok(date) => return Ok(date.and_hms_opt(0, 0, 0).unwrap()),
            Err(err) => last_err = Some(err),
        }
    }
    Err(format!(
        "failed to parse date: {}, error: {}",
        value,
        last_err.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Returns every day of the inclusive range `[from, to]`.
pub fn generate_date_range(from: &str, to: &str) -> Result<Vec<NaiveDate>, String> {
    let from = parse_date(from).map_err(|e| format!("invalid start date {}: {}", from, e))?;
    let to = parse_date(to).map_err(|e| format!("invalid end date {}: {}", to, e))?;

    if to < from {
        return Err(format!("end date {} is before start date {}", to, from));
    }

    let mut days = Vec::new();
    let mut day = from;
    while day <= to {
        days.push(day);
        day += Duration::days(1);
    }

    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_range_is_inclusive() {
        let range = generate_date_range("2025-12-27", "2025-12-30").unwrap();
        assert_eq!(range.len(), 4);
        assert_eq!(range[0], NaiveDate::from_ymd_opt(2025, 12, 27).unwrap());
        assert_eq!(range[3], NaiveDate::from_ymd_opt(2025, 12, 30).unwrap());
    }

    #[test]
    fn date_range_single_day() {
        let range = generate_date_range("2025-12-27", "2025-12-27").unwrap();
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn date_range_rejects_reversed_bounds() {
        assert!(generate_date_range("2025-12-30", "2025-12-27").is_err());
    }

    #[test]
    fn parses_datetime_with_fallback_formats() {
        let parsed = try_to_parse_date_time("2027-01-01 12:30", &DATETIME_INPUT_FORMATS).unwrap();
        assert_eq!(
            parsed,
            NaiveDate::from_ymd_opt(2027, 1, 1)
                .unwrap()
                .and_hms_opt(12, 30, 0)
                .unwrap()
        );

        let midnight = try_to_parse_date_time("2027-01-01", &DATETIME_INPUT_FORMATS).unwrap();
        assert_eq!(
            midnight,
            NaiveDate::from_ymd_opt(2027, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }
}
