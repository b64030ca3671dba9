use crate::types::{NormalizedRecord, RawEntry};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Formats that carry their own offset.
const OFFSET_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// Formats without offset; read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%a, %d %b %Y %H:%M:%S",
    "%a, %d %b %Y %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
    "%B %d, %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%d %B %Y", "%B %d, %Y", "%b %d, %Y"];

/// Turns a raw feed item into a fully populated record. Total: every field has
/// a value whatever the input looks like.
///
/// `fetch_time` stands in for a missing or unreadable publication date.
/// `matched_query` is left empty; the filter stamps it on acceptance.
pub fn normalize(raw: &RawEntry, source_name: &str, fetch_time: DateTime<Utc>) -> NormalizedRecord {
    let timestamp = raw
        .published
        .as_deref()
        .and_then(parse_published)
        .unwrap_or(fetch_time);

    NormalizedRecord {
        timestamp,
        title: text_or_empty(raw.title.as_deref()),
        summary: text_or_empty(raw.summary.as_deref()),
        url: text_or_empty(raw.link.as_deref()),
        source_name: source_name.to_string(),
        thumbnail_url: resolve_thumbnail(raw).unwrap_or_default(),
        matched_query: String::new(),
    }
}

fn text_or_empty(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

/// First hit wins: media thumbnail, then media content, then an enclosure
/// link whose MIME type names an image.
pub fn resolve_thumbnail(raw: &RawEntry) -> Option<String> {
    let non_empty = |s: &&String| !s.trim().is_empty();

    raw.media_thumbnails
        .iter()
        .find(non_empty)
        .or_else(|| raw.media_contents.iter().find(non_empty))
        .or_else(|| {
            raw.links
                .iter()
                .find(|l| {
                    l.rel.as_deref() == Some("enclosure")
                        && l.media_type.as_deref().is_some_and(|t| t.contains("image"))
                        && !l.href.trim().is_empty()
                })
                .map(|l| &l.href)
        })
        .map(|s| s.trim().to_string())
}

/// Lenient date reader for the many shapes feeds put in their date fields.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive = strip_utc_suffix(s);
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(naive, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

fn strip_utc_suffix(s: &str) -> &str {
    for suffix in [" UTC", " GMT", " Z", "Z"] {
        if let Some(stripped) = s.strip_suffix(suffix) {
            return stripped.trim_end();
        }
    }
    s
}
