#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error(
        "no authentication cookies configured: provide them via NOTEBOOKLM_COOKIES \
         or the credential update call"
    )]
    CredentialMissing,

    #[error("{0}")]
    CredentialExpired(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl AuthError {
    pub fn expired(message: impl Into<String>) -> Self {
        AuthError::CredentialExpired(message.into())
    }

    /// Whether supplying new cookies is the only way forward.
    pub fn needs_new_credentials(&self) -> bool {
        matches!(
            self,
            AuthError::CredentialMissing | AuthError::CredentialExpired(_)
        )
    }
}
