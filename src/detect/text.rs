//! Detectors for small token formats: UUID, URL, Unix timestamp, hex color.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::detection::{DetectedFormat, Detection};

#[allow(clippy::expect_used)]
static UUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("UUID regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static HEX_COLOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
        .expect("hex color regex is valid") // Static pattern, safe to panic
});

/// Unix seconds for 2001-09-09; earlier 10-digit values are unlikely timestamps.
const MIN_TIMESTAMP_SECS: u64 = 1_000_000_000;

/// Unix seconds for 2286-11-20, the last 10-digit second.
const MAX_TIMESTAMP_SECS: u64 = 9_999_999_999;

/// Detects an RFC 4122 UUID.
#[must_use]
pub fn detect_uuid(input: &str) -> Option<Detection> {
    if UUID_PATTERN.is_match(input) {
        Some(Detection::new(DetectedFormat::Uuid, 0.99))
    } else {
        None
    }
}

/// Detects a single URL.
///
/// Scheme-less `www.` input is accepted at reduced confidence.
#[must_use]
pub fn detect_url(input: &str) -> Option<Detection> {
    if input.contains(char::is_whitespace) {
        return None;
    }

    if let Ok(parsed) = Url::parse(input) {
        if matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some() {
            return Some(Detection::new(DetectedFormat::Url, 0.95));
        }
        return None;
    }

    if input.starts_with("www.") && input.len() > 8 && input.contains('.') {
        return Some(Detection::new(DetectedFormat::Url, 0.7));
    }

    None
}

/// Detects a Unix timestamp in seconds (10 digits) or milliseconds (13 digits).
#[must_use]
pub fn detect_timestamp(input: &str) -> Option<Detection> {
    if !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let value: u64 = input.parse().ok()?;
    let seconds = match input.len() {
        10 => value,
        13 => value / 1000,
        _ => return None,
    };

    if (MIN_TIMESTAMP_SECS..=MAX_TIMESTAMP_SECS).contains(&seconds) {
        Some(Detection::new(DetectedFormat::Timestamp, 0.85))
    } else {
        None
    }
}

/// Detects a `#`-prefixed hex color code.
#[must_use]
pub fn detect_hex_color(input: &str) -> Option<Detection> {
    if !HEX_COLOR_PATTERN.is_match(input) {
        return None;
    }
    // #RRGGBB is the canonical form; short and alpha forms are still common.
    let confidence = if input.len() == 7 { 0.97 } else { 0.9 };
    Some(Detection::new(DetectedFormat::HexColor, confidence))
}
