//! Base64 detection with decoded-payload chaining.

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use regex::Regex;
use tracing::trace;

use super::detection::{DetectedFormat, Detection};

/// Minimum input length considered; anything shorter is more likely a word.
const MIN_LENGTH: usize = 8;

/// Base confidence for input that merely decodes.
const CONFIDENCE_BASE: f64 = 0.6;

/// Confidence when the decoded payload is readable text.
const CONFIDENCE_TEXT_PAYLOAD: f64 = 0.75;

/// Confidence when the decoded payload is a JSON document.
const CONFIDENCE_JSON_PAYLOAD: f64 = 0.9;

#[allow(clippy::expect_used)]
static STANDARD_ALPHABET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9+/]+={0,2}$").expect("base64 alphabet regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static URL_SAFE_ALPHABET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("base64url alphabet regex is valid") // Static pattern, safe to panic
});

/// Detects whether the input looks like a Base64 payload.
///
/// English words are valid Base64 more often than users expect, so
/// single-case alphabetic input without padding is rejected up front. When
/// the decoded bytes parse as a JSON object or array, the detection chains
/// to the JSON formatter.
#[must_use]
pub fn detect_base64(input: &str) -> Option<Detection> {
    if input.len() < MIN_LENGTH {
        return None;
    }

    let decoded = decode_candidate(input)?;

    let has_padding = input.ends_with('=');
    if !has_padding && looks_like_a_word(input) {
        trace!("rejecting single-case alphabetic input as likely natural text");
        return None;
    }

    if let Ok(text) = std::str::from_utf8(&decoded) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
            if value.is_object() || value.is_array() {
                return Some(
                    Detection::new(DetectedFormat::Base64, CONFIDENCE_JSON_PAYLOAD)
                        .with_chain("json-formatter"),
                );
            }
        }
        if text.chars().all(|c| !c.is_control() || c.is_whitespace()) {
            return Some(Detection::new(DetectedFormat::Base64, CONFIDENCE_TEXT_PAYLOAD));
        }
    }

    Some(Detection::new(DetectedFormat::Base64, CONFIDENCE_BASE))
}

/// Tries the standard alphabet first, then base64url.
fn decode_candidate(input: &str) -> Option<Vec<u8>> {
    if STANDARD_ALPHABET.is_match(input) && input.len() % 4 == 0 {
        if let Ok(decoded) = STANDARD.decode(input) {
            return Some(decoded);
        }
    }
    // base64url only counts when it actually uses the URL-safe characters,
    // otherwise every hex string would qualify.
    if URL_SAFE_ALPHABET.is_match(input) && (input.contains('-') || input.contains('_')) {
        if let Ok(decoded) = URL_SAFE_NO_PAD.decode(input) {
            return Some(decoded);
        }
    }
    None
}

/// True for unpadded input that reads like an ordinary word or identifier.
fn looks_like_a_word(input: &str) -> bool {
    input.chars().all(|c| c.is_ascii_lowercase())
        || input.chars().all(|c| c.is_ascii_uppercase())
}
