//! Fixed User-Agent sent with every page and image request.
//!
//! Blog hosts commonly refuse or degrade responses to non-browser agents, so
//! all traffic identifies as a desktop browser.

/// Browser User-Agent attached to every request.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";

/// Returns the User-Agent used by the fetcher.
#[must_use]
pub(crate) fn default_user_agent() -> &'static str {
    BROWSER_USER_AGENT
}
