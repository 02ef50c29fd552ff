use nblm_auth::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Credential store failure: no cookie, or the cookie no longer works.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The endpoint answered with a login page instead of RPC data.
    #[error("{0}")]
    CredentialExpired(String),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("API returned HTTP {status}: {preview}")]
    UpstreamStatus { status: u16, preview: String },

    /// 401/403 from the API. Tokens were refreshed once (`refresh` is `None`)
    /// or the refresh failed too.
    #[error("{}", upstream_auth_message(.status, .refresh))]
    UpstreamAuth {
        status: u16,
        refresh: Option<AuthError>,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout")]
    Timeout,
}

fn upstream_auth_message(status: &u16, refresh: &Option<AuthError>) -> String {
    match refresh {
        None => format!("API returned {status}: tokens refreshed, please retry the operation"),
        Some(error) => format!("API returned {status} and token refresh failed: {error}"),
    }
}

impl RpcError {
    pub fn decode(message: impl Into<String>) -> Self {
        RpcError::Decode(message.into())
    }

    /// Errors that point at the credentials rather than the request.
    pub fn is_auth_related(&self) -> bool {
        matches!(
            self,
            RpcError::Auth(_) | RpcError::CredentialExpired(_) | RpcError::UpstreamAuth { .. }
        )
    }

    /// True when tokens were refreshed and re-issuing the same call may succeed.
    pub fn should_retry(&self) -> bool {
        matches!(self, RpcError::UpstreamAuth { refresh: None, .. })
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            RpcError::Timeout
        } else {
            RpcError::Network(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_auth_after_successful_refresh_asks_for_retry() {
        let err = RpcError::UpstreamAuth {
            status: 403,
            refresh: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("tokens refreshed"));
        assert!(msg.contains("retry"));
        assert!(err.should_retry());
        assert!(err.is_auth_related());
    }

    #[test]
    fn upstream_auth_with_failed_refresh_names_both() {
        let err = RpcError::UpstreamAuth {
            status: 401,
            refresh: Some(AuthError::expired("CSRF token (SNlM0e) not found in page")),
        };
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("token refresh failed"));
        assert!(msg.contains("SNlM0e"));
        assert!(!err.should_retry());
    }

    #[test]
    fn auth_errors_convert_transparently() {
        let err: RpcError = AuthError::CredentialMissing.into();
        assert!(err.is_auth_related());
        assert_eq!(err.to_string(), AuthError::CredentialMissing.to_string());
    }

    #[test]
    fn decode_is_not_auth_related() {
        assert!(!RpcError::decode("bad").is_auth_related());
        assert!(!RpcError::Timeout.should_retry());
    }
}
