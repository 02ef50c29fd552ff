use once_cell::sync::Lazy;
use regex::Regex;

use crate::AuthError;

static CSRF_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r#""SNlM0e":"([^"]+)""#).unwrap());
static SESSION_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r#""FdrFJe":"([^"]+)""#).unwrap());

/// Secondary tokens embedded in the NotebookLM page bootstrap data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTokens {
    pub csrf_token: String,
    pub session_id: Option<String>,
}

/// Scan an authenticated page for its tokens.
///
/// The CSRF marker is mandatory. The session id marker is optional: calls
/// succeed without it, just less reliably.
pub fn extract_tokens(html: &str) -> Result<PageTokens, AuthError> {
    let csrf_token = CSRF_PATTERN
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            AuthError::expired(
                "CSRF token (SNlM0e) not found in page: cookies may be expired or for the wrong account",
            )
        })?;

    let session_id = SESSION_PATTERN
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    Ok(PageTokens {
        csrf_token,
        session_id,
    })
}
