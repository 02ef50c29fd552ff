use nblm_core::wire::{BASE_URL, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::extract::{extract_tokens, PageTokens};
use crate::AuthError;

const PAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    NoCredentials,
    CredentialsSetTokensPending,
    Authenticated,
}

impl AuthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStatus::NoCredentials => "no_credentials",
            AuthStatus::CredentialsSetTokensPending => "credentials_set_tokens_pending",
            AuthStatus::Authenticated => "authenticated",
        }
    }
}

impl std::fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A consistent view of every credential, read under one lock acquisition.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSnapshot {
    pub cookie: String,
    pub csrf_token: String,
    pub session_id: String,
}

impl std::fmt::Debug for CredentialSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSnapshot")
            .field("cookie_len", &self.cookie.len())
            .field("csrf_len", &self.csrf_token.len())
            .field("has_session", &!self.session_id.is_empty())
            .finish()
    }
}

#[derive(Default)]
struct CredentialState {
    cookie: String,
    csrf_token: String,
    session_id: String,
}

impl CredentialState {
    fn clear_tokens(&mut self) {
        self.csrf_token.clear();
        self.session_id.clear();
    }

    fn snapshot(&self) -> CredentialSnapshot {
        CredentialSnapshot {
            cookie: self.cookie.clone(),
            csrf_token: self.csrf_token.clone(),
            session_id: self.session_id.clone(),
        }
    }

    fn apply(&mut self, tokens: PageTokens) {
        self.csrf_token = tokens.csrf_token;
        self.session_id = tokens.session_id.unwrap_or_default();
    }
}

/// Thread-safe holder of the cookie and the two tokens derived from it.
///
/// One `RwLock` guards all fields. Extraction runs while the write lock is
/// held, so concurrent callers queue behind a single page fetch and then see
/// its result instead of fetching again.
pub struct CredentialStore {
    state: RwLock<CredentialState>,
    client: reqwest::Client,
    base_url: String,
    page_timeout: Duration,
    extractions: AtomicUsize,
}

impl CredentialStore {
    /// Pass an empty cookie when it will be supplied later through
    /// [`CredentialStore::set_credentials`].
    pub fn new(cookie: impl Into<String>) -> Self {
        Self::with_base_url(cookie, BASE_URL)
    }

    pub fn with_base_url(cookie: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PAGE_FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|error| {
                tracing::warn!(%error, "failed to build page client, using defaults");
                reqwest::Client::new()
            });
        Self {
            state: RwLock::new(CredentialState {
                cookie: cookie.into().trim().to_string(),
                ..Default::default()
            }),
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_timeout: PAGE_FETCH_TIMEOUT,
            extractions: AtomicUsize::new(0),
        }
    }

    /// Deadline for one page fetch, applied per request.
    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- Mutation ------------------------------------------------------------

    /// Replace the cookie. Cached tokens belong to the old cookie and are
    /// dropped so the next call re-extracts.
    pub async fn set_credentials(&self, cookie: impl Into<String>) {
        let mut state = self.state.write().await;
        state.cookie = cookie.into().trim().to_string();
        state.clear_tokens();
        tracing::info!(cookie_len = state.cookie.len(), "auth cookies updated");
    }

    /// Inject tokens directly. Empty values leave the stored value untouched.
    pub async fn set_tokens(&self, csrf_token: &str, session_id: &str) {
        let mut state = self.state.write().await;
        if !csrf_token.is_empty() {
            state.csrf_token = csrf_token.to_string();
        }
        if !session_id.is_empty() {
            state.session_id = session_id.to_string();
        }
    }

    /// Extract tokens unless a CSRF token is already cached.
    pub async fn ensure_tokens(&self) -> Result<(), AuthError> {
        self.ensured_snapshot().await.map(|_| ())
    }

    /// Like [`CredentialStore::ensure_tokens`], but also returns the
    /// credentials read under the same lock, so a concurrent
    /// `set_credentials` cannot leave the caller with a cookie and no token.
    pub async fn ensured_snapshot(&self) -> Result<CredentialSnapshot, AuthError> {
        let mut state = self.state.write().await;
        if state.cookie.is_empty() {
            return Err(AuthError::CredentialMissing);
        }
        if state.csrf_token.is_empty() {
            let tokens = self.fetch_tokens(&state.cookie).await?;
            state.apply(tokens);
        }
        Ok(state.snapshot())
    }

    /// Discard cached tokens and extract fresh ones.
    ///
    /// On failure the tokens stay cleared. Dropping the future before it
    /// completes leaves the store as it was.
    pub async fn refresh_tokens(&self) -> Result<(), AuthError> {
        let mut state = self.state.write().await;
        if state.cookie.is_empty() {
            return Err(AuthError::CredentialMissing);
        }
        let fetched = self.fetch_tokens(&state.cookie).await;
        match fetched {
            Ok(tokens) => {
                state.apply(tokens);
                Ok(())
            }
            Err(error) => {
                state.clear_tokens();
                Err(error)
            }
        }
    }

    // -- Accessors -----------------------------------------------------------

    pub async fn has_credentials(&self) -> bool {
        !self.state.read().await.cookie.is_empty()
    }

    pub async fn cookie(&self) -> String {
        self.state.read().await.cookie.clone()
    }

    pub async fn csrf_token(&self) -> String {
        self.state.read().await.csrf_token.clone()
    }

    pub async fn session_id(&self) -> String {
        self.state.read().await.session_id.clone()
    }

    pub async fn snapshot(&self) -> CredentialSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn status(&self) -> AuthStatus {
        let state = self.state.read().await;
        if state.cookie.is_empty() {
            AuthStatus::NoCredentials
        } else if state.csrf_token.is_empty() {
            AuthStatus::CredentialsSetTokensPending
        } else {
            AuthStatus::Authenticated
        }
    }

    /// Number of page fetches issued so far.
    pub fn extraction_count(&self) -> usize {
        self.extractions.load(Ordering::Relaxed)
    }

    // -- Extraction ----------------------------------------------------------

    // Callers hold the write lock.
    async fn fetch_tokens(&self, cookie: &str) -> Result<PageTokens, AuthError> {
        self.extractions.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("extracting auth tokens from NotebookLM page");

        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .header("Cookie", cookie)
            .header("User-Agent", USER_AGENT)
            .timeout(self.page_timeout)
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("fetching NotebookLM page: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(AuthError::expired(format!(
                "NotebookLM returned HTTP {}: cookies may be expired or invalid",
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Network(format!("reading NotebookLM page body: {e}")))?;

        let tokens = extract_tokens(&body)?;
        tracing::debug!(
            csrf_len = tokens.csrf_token.len(),
            has_session = tokens.session_id.is_some(),
            "auth tokens extracted"
        );
        Ok(tokens)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("base_url", &self.base_url)
            .field("extractions", &self.extraction_count())
            .finish_non_exhaustive()
    }
}
