//! User-Agent string for every request the tool makes.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/album-dl";

/// Default User-Agent for page and image requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("album-dl/{version} (+{PROJECT_UA_URL})")
}
