//! Registry of known IndexNow search-engine endpoints.
//!
//! Every participating engine exposes `POST https://<host>/indexnow`. The
//! shared `api.indexnow.org` relay forwards submissions to all participants,
//! so it is the default; the individual engines remain selectable for callers
//! that want to target one directly.

use std::fmt;

/// A search engine that accepts IndexNow submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchEngine {
    /// Shared relay that fans out to all participating engines (default).
    IndexNow,
    /// Microsoft Bing.
    Bing,
    /// Seznam.cz.
    Seznam,
    /// Yandex.
    Yandex,
    /// Naver.
    Naver,
}

impl SearchEngine {
    /// All known engines, in submission preference order.
    pub const ALL: &'static [Self] = &[
        Self::IndexNow,
        Self::Bing,
        Self::Seznam,
        Self::Yandex,
        Self::Naver,
    ];

    /// Returns the endpoint host for this engine.
    #[must_use]
    pub fn host(&self) -> &'static str {
        match self {
            Self::IndexNow => "api.indexnow.org",
            Self::Bing => "www.bing.com",
            Self::Seznam => "search.seznam.cz",
            Self::Yandex => "yandex.com",
            Self::Naver => "searchadvisor.naver.com",
        }
    }

    /// Returns the full submission URL for this engine.
    #[must_use]
    pub fn submit_url(&self) -> String {
        format!("https://{}/indexnow", self.host())
    }

    /// Returns the short identifier used on the CLI and in the submission log.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IndexNow => "indexnow",
            Self::Bing => "bing",
            Self::Seznam => "seznam",
            Self::Yandex => "yandex",
            Self::Naver => "naver",
        }
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::IndexNow
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SearchEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "indexnow" | "api.indexnow.org" => Ok(Self::IndexNow),
            "bing" | "www.bing.com" => Ok(Self::Bing),
            "seznam" | "search.seznam.cz" => Ok(Self::Seznam),
            "yandex" | "yandex.com" => Ok(Self::Yandex),
            "naver" | "searchadvisor.naver.com" => Ok(Self::Naver),
            other => Err(format!(
                "unknown search engine: {other} (expected one of: indexnow, bing, seznam, yandex, naver)"
            )),
        }
    }
}
