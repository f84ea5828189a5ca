use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parses the loosely formatted timestamps found in listing data. Dashes
/// become slashes and the RFC 3339 'T'/'Z' markers become spaces before
/// parsing, so "2023-06-15T10:30:00Z", "2023/06/15 10:30" and a bare
/// "2023-06-15" all resolve. Timestamps without an offset are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let normalized: String = value
        .chars()
        .map(|c| match c {
            '-' => '/',
            'T' | 'Z' => ' ',
            other => other,
        })
        .collect();
    let normalized = normalized.trim();
    if normalized.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_str(normalized, "%Y/%m/%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(normalized, "%Y/%m/%d %H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(normalized, "%Y/%m/%d %H:%M") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(normalized, "%Y/%m/%d") {
        let dt = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&dt));
    }
    None
}

/// Buckets a timestamp into a coarse relative-age label against `now`.
/// Unparseable and future timestamps yield None. An age of exactly 31 days
/// also yields None: it sits between the week bucket (under 31 days) and
/// the month bucket (over 31 days), and callers fall back to the raw value.
pub fn pretty_date(value: &str, now: DateTime<Utc>) -> Option<String> {
    let date = parse_timestamp(value)?;
    let diff = (now - date).num_milliseconds() as f64 / 1000.0;
    let day_diff = (diff / 86_400.0).floor();

    if day_diff < 0.0 {
        return None;
    }

    if day_diff == 0.0 {
        if diff < 60.0 {
            return Some("just now".to_string());
        }
        if diff < 120.0 {
            return Some("1 minute ago".to_string());
        }
        if diff < 3_600.0 {
            return Some(format!("{} minutes ago", (diff / 60.0).floor() as i64));
        }
        if diff < 7_200.0 {
            return Some("1 hour ago".to_string());
        }
        if diff < 86_400.0 {
            return Some(format!("{} hours ago", (diff / 3_600.0).floor() as i64));
        }
    }
    if day_diff == 1.0 {
        return Some("Yesterday".to_string());
    }
    if day_diff < 7.0 {
        return Some(format!("{} days ago", day_diff as i64));
    }
    if day_diff < 31.0 {
        return Some(format!("{} weeks ago", (day_diff / 7.0).ceil() as i64));
    }
    if day_diff > 31.0 {
        return Some(format!("{} months ago", (day_diff / 31.0).round() as i64));
    }

    None
}

pub fn pretty_date_now(value: &str) -> Option<String> {
    pretty_date(value, Utc::now())
}
