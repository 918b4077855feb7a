//! Navigation tokens sent back by the presentation adapter.
//!
//! Accepted forms:
//!
//! - `TOGGLE_VIEW` or `__toggle__`: flip trace and diagram
//! - `__suggest__`: request suggestions
//! - `navigate://<path>:<line>`: percent-encoded target
//! - anything else: URL-safe base64 of `<path>:<line>`, padding optional
//!
//! Lines in tokens are one-based.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::error::NavError;
use crate::location::SourceLocation;

/// Distinguished token that toggles the display mode.
pub const TOGGLE_VIEW: &str = "TOGGLE_VIEW";
const TOGGLE_LINK: &str = "__toggle__";
const SUGGEST_LINK: &str = "__suggest__";
const NAVIGATE_SCHEME: &str = "navigate://";

/// A decoded user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavRequest {
    Toggle,
    Suggest,
    /// Jump to a source location (zero-based line).
    Open(SourceLocation),
}

impl NavRequest {
    pub fn decode(token: &str) -> Result<Self, NavError> {
        let token = token.trim();
        if let Some(request) = control_token(token) {
            return Ok(request);
        }
        if let Some(target) = token.strip_prefix(NAVIGATE_SCHEME) {
            if let Some(request) = control_token(target) {
                return Ok(request);
            }
            let decoded = urlencoding::decode(target)?;
            return parse_target(&decoded).map(NavRequest::Open);
        }
        let bytes = URL_SAFE_NO_PAD.decode(token.trim_end_matches('='))?;
        let text = String::from_utf8(bytes)?;
        parse_target(&text).map(NavRequest::Open)
    }

    /// Base64 token for `location`, as embedded by the adapter.
    #[must_use]
    pub fn encode(location: &SourceLocation) -> String {
        URL_SAFE.encode(format!("{}:{}", location.path, location.display_line()))
    }

    /// `navigate://` link for `location`.
    #[must_use]
    pub fn link(location: &SourceLocation) -> String {
        format!(
            "{NAVIGATE_SCHEME}{}:{}",
            urlencoding::encode(location.path.as_str()),
            location.display_line()
        )
    }
}

fn control_token(token: &str) -> Option<NavRequest> {
    match token {
        TOGGLE_VIEW | TOGGLE_LINK => Some(NavRequest::Toggle),
        SUGGEST_LINK => Some(NavRequest::Suggest),
        _ => None,
    }
}

fn parse_target(text: &str) -> Result<SourceLocation, NavError> {
    let (path, line) = text.rsplit_once(':').ok_or(NavError::MissingSeparator)?;
    if path.is_empty() {
        return Err(NavError::EmptyPath);
    }
    let line = line
        .parse::<u32>()
        .ok()
        .filter(|line| *line > 0)
        .ok_or_else(|| NavError::InvalidLine(line.to_string()))?;
    Ok(SourceLocation::new(path, line - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_tokens_are_checked_before_decoding() {
        assert_eq!(NavRequest::decode("TOGGLE_VIEW").unwrap(), NavRequest::Toggle);
        assert_eq!(
            NavRequest::decode("navigate://__toggle__").unwrap(),
            NavRequest::Toggle
        );
        assert_eq!(NavRequest::decode("__suggest__").unwrap(), NavRequest::Suggest);
    }

    #[test]
    fn base64_tokens_with_and_without_padding() {
        let location = SourceLocation::new("/src/Main.kt", 41);
        let token = NavRequest::encode(&location);
        assert_eq!(
            NavRequest::decode(&token).unwrap(),
            NavRequest::Open(location.clone())
        );
        assert_eq!(
            NavRequest::decode(token.trim_end_matches('=')).unwrap(),
            NavRequest::Open(location)
        );
    }

    #[test]
    fn navigate_links_are_percent_decoded() {
        let location = SourceLocation::new("/my src/C:Main.kt", 0);
        assert_eq!(
            NavRequest::decode(&NavRequest::link(&location)).unwrap(),
            NavRequest::Open(location)
        );
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let encode = |text: &str| URL_SAFE.encode(text);
        assert!(matches!(
            NavRequest::decode("***"),
            Err(NavError::Base64(_))
        ));
        assert!(matches!(
            NavRequest::decode(&encode("no-separator")),
            Err(NavError::MissingSeparator)
        ));
        assert!(matches!(
            NavRequest::decode(&encode(":3")),
            Err(NavError::EmptyPath)
        ));
        assert!(matches!(
            NavRequest::decode(&encode("A.kt:0")),
            Err(NavError::InvalidLine(_))
        ));
        assert!(matches!(
            NavRequest::decode(&encode("A.kt:-1")),
            Err(NavError::InvalidLine(_))
        ));
        assert!(matches!(
            NavRequest::decode(&URL_SAFE.encode([0xff, 0xfe, b':', b'1'])),
            Err(NavError::Utf8(_))
        ));
    }
}
