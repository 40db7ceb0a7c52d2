use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse time string in HH:MM format
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Hour-of-day component of an HH:MM string
pub fn start_hour(time_str: &str) -> Option<u32> {
    parse_time(time_str).map(|(hour, _)| hour)
}

/// Parse a date already in canonical YYYY-MM-DD form
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()
}

/// Normalize any date representation the booking service is known to emit
/// (pure date, RFC 3339 datetime with offset, or bare datetime) to the
/// canonical YYYY-MM-DD form. Offset datetimes resolve to the UTC calendar
/// day. Returns None when the value does not parse; such values stay as-is
/// in the record and surface in the "unknown" view bucket.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();

    // Already canonical; keeps normalization idempotent
    if let Some(date) = parse_date(raw) {
        return Some(date.format("%Y-%m-%d").to_string());
    }

    // Datetime with an offset or Z suffix
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc).date_naive().format("%Y-%m-%d").to_string());
    }

    // Bare datetime, no offset to apply
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.date().format("%Y-%m-%d").to_string());
        }
    }

    None
}
