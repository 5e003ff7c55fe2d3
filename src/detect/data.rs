//! Detectors for structured data formats: JSON, SQL, XML/HTML, and CSV.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::detection::{DetectedFormat, Detection};

/// Confidence for input that parses as a JSON object or array.
const CONFIDENCE_VALID_JSON: f64 = 0.98;

/// Confidence for brace-delimited input that fails to parse.
/// Still worth sending to the formatter, which reports the syntax error.
const CONFIDENCE_BROKEN_JSON: f64 = 0.5;

#[allow(clippy::expect_used)]
static SQL_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^\s*(?:SELECT\s.+\sFROM\s|INSERT\s+INTO\s|UPDATE\s.+\sSET\s|DELETE\s+FROM\s|CREATE\s+(?:TABLE|INDEX|VIEW)\s|ALTER\s+TABLE\s|DROP\s+(?:TABLE|INDEX|VIEW)\s)",
    )
    .expect("SQL statement regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static SQL_KEYWORD_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:SELECT|INSERT|UPDATE|DELETE|CREATE|ALTER|DROP|WITH)\b")
        .expect("SQL keyword regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static MARKUP_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*<(?:!DOCTYPE\s|!doctype\s|\?xml|[a-zA-Z][a-zA-Z0-9:_-]*[\s>/]).*>\s*$")
        .expect("markup tag regex is valid") // Static pattern, safe to panic
});

/// Detects whether the input is a JSON document.
///
/// Only objects and arrays qualify: a bare quoted string or number is valid
/// JSON but reporting it as such would hijack nearly every input.
#[must_use]
pub fn detect_json(input: &str) -> Option<Detection> {
    let first = input.chars().next()?;
    if first != '{' && first != '[' {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(input) {
        Ok(value) if value.is_object() || value.is_array() => {
            Some(Detection::new(DetectedFormat::Json, CONFIDENCE_VALID_JSON))
        }
        Ok(_) => None,
        Err(e) => {
            trace!(error = %e, "brace-delimited input failed JSON parse");
            Some(Detection::new(DetectedFormat::Json, CONFIDENCE_BROKEN_JSON))
        }
    }
}

/// Detects whether the input is a SQL statement.
#[must_use]
pub fn detect_sql(input: &str) -> Option<Detection> {
    if SQL_STATEMENT.is_match(input) {
        return Some(Detection::new(DetectedFormat::Sql, 0.9));
    }
    if SQL_KEYWORD_START.is_match(input) {
        // A leading keyword alone ("select a file") is weak evidence.
        return Some(Detection::new(DetectedFormat::Sql, 0.55));
    }
    None
}

/// Detects whether the input is XML or HTML markup.
#[must_use]
pub fn detect_markup(input: &str) -> Option<Detection> {
    if !MARKUP_TAG.is_match(input) {
        return None;
    }
    let lowered = input.trim_start().to_ascii_lowercase();
    let confidence = if lowered.starts_with("<!doctype") || lowered.starts_with("<?xml") || lowered.starts_with("<html") {
        0.95
    } else {
        0.8
    };
    Some(Detection::new(DetectedFormat::Markup, confidence))
}

/// Detects whether the input is CSV.
///
/// Requires at least two lines with a consistent, non-zero comma count.
#[must_use]
pub fn detect_csv(input: &str) -> Option<Detection> {
    // Structured formats with commas (JSON, markup) are handled elsewhere.
    if input.starts_with('{') || input.starts_with('[') || input.starts_with('<') {
        return None;
    }

    let lines: Vec<&str> = input.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return None;
    }

    let commas = lines[0].matches(',').count();
    if commas == 0 {
        return None;
    }
    if !lines.iter().all(|l| l.matches(',').count() == commas) {
        return None;
    }

    // A header row of bare identifiers is a strong signal.
    let header_like = lines[0]
        .split(',')
        .all(|cell| {
            let cell = cell.trim();
            !cell.is_empty()
                && cell
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ' ')
        });

    let confidence = if header_like { 0.8 } else { 0.7 };
    Some(Detection::new(DetectedFormat::Csv, confidence))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== JSON Tests ====================

    #[test]
    fn test_detect_json_object() {
        let detection = detect_json(r#"{"name":"toolslab","tools":42}"#).unwrap();
        assert_eq!(detection.format, DetectedFormat::Json);
        assert!(detection.confidence > 0.9);
    }

    #[test]
    fn test_detect_json_array() {
        let detection = detect_json(r#"[1, 2, 3]"#).unwrap();
        assert!(detection.confidence > 0.9);
    }

    #[test]
    fn test_detect_json_quoted_scalar_is_not_json() {
        assert!(detect_json(r#""hello""#).is_none());
        assert!(detect_json("42").is_none());
        assert!(detect_json("true").is_none());
    }

    #[test]
    fn test_detect_json_broken_braces_low_confidence() {
        let detection = detect_json(r#"{"name": "unterminated"#).unwrap();
        assert!((detection.confidence - CONFIDENCE_BROKEN_JSON).abs() < f64::EPSILON);
    }

    #[test]
    fn test_detect_json_plain_text_is_none() {
        assert!(detect_json("just some words").is_none());
    }

    #[test]
    fn test_detect_json_empty_is_none() {
        assert!(detect_json("").is_none());
    }

    // ==================== SQL Tests ====================

    #[test]
    fn test_detect_sql_select() {
        let detection = detect_sql("SELECT id, name FROM users WHERE active = 1").unwrap();
        assert_eq!(detection.format, DetectedFormat::Sql);
        assert!(detection.confidence >= 0.9);
    }

    #[test]
    fn test_detect_sql_lowercase_and_multiline() {
        let detection = detect_sql("select *\nfrom submission_queue\norder by id").unwrap();
        assert!(detection.confidence >= 0.9);
    }

    #[test]
    fn test_detect_sql_insert_update_delete_ddl() {
        assert!(detect_sql("INSERT INTO t (a) VALUES (1)").unwrap().confidence >= 0.9);
        assert!(detect_sql("UPDATE t SET a = 1").unwrap().confidence >= 0.9);
        assert!(detect_sql("DELETE FROM t WHERE a = 1").unwrap().confidence >= 0.9);
        assert!(detect_sql("CREATE TABLE t (a INTEGER)").unwrap().confidence >= 0.9);
    }

    #[test]
    fn test_detect_sql_keyword_only_is_weak() {
        let detection = detect_sql("select a file from the menu... just kidding").unwrap();
        assert!(detection.confidence >= 0.9, "SELECT..FROM pattern matches");

        let weak = detect_sql("update your browser").unwrap();
        assert!(weak.confidence < 0.6);
    }

    #[test]
    fn test_detect_sql_plain_text_is_none() {
        assert!(detect_sql("hello world").is_none());
    }

    // ==================== Markup Tests ====================

    #[test]
    fn test_detect_markup_html_document() {
        let detection = detect_markup("<!DOCTYPE html><html><body></body></html>").unwrap();
        assert_eq!(detection.format, DetectedFormat::Markup);
        assert!(detection.confidence >= 0.9);
    }

    #[test]
    fn test_detect_markup_xml_declaration() {
        let detection = detect_markup(r#"<?xml version="1.0"?><root/>"#).unwrap();
        assert!(detection.confidence >= 0.9);
    }

    #[test]
    fn test_detect_markup_fragment() {
        let detection = detect_markup("<div class=\"card\">hello</div>").unwrap();
        assert!(detection.confidence >= 0.7);
    }

    #[test]
    fn test_detect_markup_comparison_is_none() {
        assert!(detect_markup("a < b").is_none());
        assert!(detect_markup("x <y").is_none());
    }

    // ==================== CSV Tests ====================

    #[test]
    fn test_detect_csv_with_header() {
        let detection = detect_csv("name,age,city\nalice,30,rome\nbob,25,milan").unwrap();
        assert_eq!(detection.format, DetectedFormat::Csv);
        assert!(detection.confidence >= 0.8);
    }

    #[test]
    fn test_detect_csv_without_header_boost() {
        let detection = detect_csv("\"a b\",1!,x\n\"c d\",2?,y").unwrap();
        assert!(detection.confidence >= 0.7);
        assert!(detection.confidence < 0.8);
    }

    #[test]
    fn test_detect_csv_single_line_is_none() {
        assert!(detect_csv("a,b,c").is_none());
    }

    #[test]
    fn test_detect_csv_inconsistent_columns_is_none() {
        assert!(detect_csv("a,b,c\nd,e").is_none());
    }

    #[test]
    fn test_detect_csv_no_commas_is_none() {
        assert!(detect_csv("line one\nline two").is_none());
    }

    #[test]
    fn test_detect_csv_skips_json_like_input() {
        assert!(detect_csv("{\"a\":1,\n\"b\":2}").is_none());
    }
}
