//! Types representing format detections and detection results.

use std::fmt;

use serde::Serialize;

/// A text format the detection engine can recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedFormat {
    /// JSON object or array.
    Json,
    /// JSON Web Token (three base64url segments).
    Jwt,
    /// Base64-encoded payload.
    Base64,
    /// RFC 4122 UUID.
    Uuid,
    /// HTTP/HTTPS URL.
    Url,
    /// SQL statement.
    Sql,
    /// XML or HTML markup.
    Markup,
    /// Comma-separated values.
    Csv,
    /// Unix timestamp (seconds or milliseconds).
    Timestamp,
    /// Hex color code (`#RGB`, `#RRGGBB`, `#RRGGBBAA`).
    HexColor,
    /// Fallback when nothing else matched.
    PlainText,
}

impl DetectedFormat {
    /// Returns the human-readable format name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Jwt => "JWT",
            Self::Base64 => "Base64",
            Self::Uuid => "UUID",
            Self::Url => "URL",
            Self::Sql => "SQL",
            Self::Markup => "XML/HTML",
            Self::Csv => "CSV",
            Self::Timestamp => "Unix timestamp",
            Self::HexColor => "hex color",
            Self::PlainText => "plain text",
        }
    }

    /// Returns the slug of the tool that handles this format.
    #[must_use]
    pub fn tool_slug(&self) -> &'static str {
        match self {
            Self::Json => "json-formatter",
            Self::Jwt => "jwt-decoder",
            Self::Base64 => "base64-decoder",
            Self::Uuid => "uuid-inspector",
            Self::Url => "url-parser",
            Self::Sql => "sql-formatter",
            Self::Markup => "html-entities",
            Self::Csv => "csv-to-json",
            Self::Timestamp => "timestamp-converter",
            Self::HexColor => "color-picker",
            Self::PlainText => "text-diff",
        }
    }

    /// Tie-break rank for equal confidences: more specific formats first.
    ///
    /// Guarantees, among other things, that a JWT outranks the Base64
    /// detection its segments also satisfy.
    #[must_use]
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Jwt => 10,
            Self::Uuid => 9,
            Self::HexColor => 8,
            Self::Timestamp => 7,
            Self::Url => 6,
            Self::Json => 5,
            Self::Sql => 4,
            Self::Csv => 3,
            Self::Markup => 2,
            Self::Base64 => 1,
            Self::PlainText => 0,
        }
    }
}

impl fmt::Display for DetectedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single format detection with its confidence and tool suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    /// The detected format.
    pub format: DetectedFormat,
    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Slug of the tool that handles this format.
    pub tool: &'static str,
    /// Optional follow-up tool for the decoded/derived payload
    /// (e.g. Base64 whose decoded bytes are JSON).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<&'static str>,
}

impl Detection {
    /// Creates a detection for a format, clamping confidence into `[0.0, 1.0]`.
    #[must_use]
    pub fn new(format: DetectedFormat, confidence: f64) -> Self {
        Self {
            format,
            confidence: confidence.clamp(0.0, 1.0),
            tool: format.tool_slug(),
            chain: None,
        }
    }

    /// Adds a chained-tool suggestion.
    #[must_use]
    pub fn with_chain(mut self, chain: &'static str) -> Self {
        self.chain = Some(chain);
        self
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.0}%) -> {}",
            self.format,
            self.confidence * 100.0,
            self.tool
        )?;
        if let Some(chain) = self.chain {
            write!(f, " -> {chain}")?;
        }
        Ok(())
    }
}

/// Ranked detections for one input, best first.
#[derive(Debug, Default, Serialize)]
pub struct DetectionResult {
    /// Detections ordered by confidence descending.
    pub detections: Vec<Detection>,
}

impl DetectionResult {
    /// Creates an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing was detected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Returns the number of detections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    /// Returns the highest-ranked detection, if any.
    #[must_use]
    pub fn best(&self) -> Option<&Detection> {
        self.detections.first()
    }
}
