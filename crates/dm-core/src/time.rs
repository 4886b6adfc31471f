//! UTC timestamp parsing and ISO-8601 rendering.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Render a timestamp as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_utc(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a timestamp as returned by the directory service.
///
/// Accepts RFC 3339 with any offset, naive `YYYY-MM-DDTHH:MM:SS[.f]` (taken
/// as UTC) and bare dates. The directory's "unset" sentinel
/// `0001-01-01T00:00:00Z` parses to `None`.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })?;

    if parsed.timestamp() <= UNSET_SENTINEL_SECS {
        return None;
    }
    Some(parsed)
}

// 0001-01-01T00:00:00Z
const UNSET_SENTINEL_SECS: i64 = -62_135_596_800;
