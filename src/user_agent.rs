//! Shared User-Agent string for outbound IndexNow submission requests.
//!
//! Single source for project URL and UA format so all submission traffic
//! stays consistent and easy to update (good citizenship; RFC 9308).

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://toolslab.dev";

/// Default User-Agent for IndexNow submission requests (identifies the tool).
#[must_use]
pub(crate) fn default_submit_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("toolslab/{version} (indexnow-submitter; +{PROJECT_UA_URL})")
}
