use nblm_auth::CredentialStore;
use nblm_config::Config;
use nblm_core::wire::{
    notebook_path, rpc, BATCH_EXECUTE_PATH, DEFAULT_BUILD_LABEL, FORM_CONTENT_TYPE,
    STREAM_QUERY_PATH,
};
use nblm_core::{conversation_id, RequestCounter};
use reqwest::header::{CONTENT_TYPE, COOKIE, ORIGIN, REFERER};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::envelope::{
    batch_query, build_chat_envelope, build_envelope, chat_params, chat_query, form_body,
};
use crate::stream::scan_stream;
use crate::value::{parse_source_entries, path, SourceEntry};
use crate::{batch, RpcError};

const RPC_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(120);
const BODY_PREVIEW_BYTES: usize = 500;

/// Result of a chat query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub conversation_id: String,
    pub is_follow_up: bool,
}

#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Sources to ground the answer in. `None` means every source in the
    /// notebook, looked up with an extra RPC.
    pub source_ids: Option<Vec<String>>,
    /// Continue an existing conversation. `None` or empty starts a new one.
    pub conversation_id: Option<String>,
    pub timeout: Option<Duration>,
}

/// Issues batchexecute RPCs and chat queries on behalf of one credential set.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct Client {
    auth: Arc<CredentialStore>,
    http: reqwest::Client,
    base_url: String,
    build_label: String,
    rpc_timeout: Duration,
    request_ids: RequestCounter,
}

impl Client {
    pub fn new(auth: Arc<CredentialStore>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(RPC_TIMEOUT)
            .build()
            .unwrap_or_else(|error| {
                tracing::warn!(%error, "failed to build RPC client, using defaults");
                reqwest::Client::new()
            });
        let base_url = auth.base_url().to_string();
        Self {
            auth,
            http,
            base_url,
            build_label: DEFAULT_BUILD_LABEL.to_string(),
            rpc_timeout: RPC_TIMEOUT,
            request_ids: RequestCounter::new(),
        }
    }

    /// Deadline for one batchexecute call, applied per request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    /// Override the frontend build label. Empty keeps the default.
    pub fn with_build_label(mut self, build_label: impl Into<String>) -> Self {
        let build_label = build_label.into();
        if !build_label.is_empty() {
            self.build_label = build_label;
        }
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_ids(mut self, request_ids: RequestCounter) -> Self {
        self.request_ids = request_ids;
        self
    }

    /// Build a store and client from layered configuration, seeding any
    /// pre-extracted tokens.
    pub async fn from_config(config: &Config) -> Self {
        let auth = match config.base_url.as_deref() {
            Some(base_url) => CredentialStore::with_base_url(config.cookies(), base_url),
            None => CredentialStore::new(config.cookies()),
        };
        auth.set_tokens(
            config.csrf_token.as_deref().unwrap_or_default(),
            config.session_id.as_deref().unwrap_or_default(),
        )
        .await;
        Self::new(Arc::new(auth)).with_build_label(config.build_label.clone().unwrap_or_default())
    }

    pub fn auth(&self) -> &Arc<CredentialStore> {
        &self.auth
    }

    pub fn build_label(&self) -> &str {
        &self.build_label
    }

    // -- Batchexecute --------------------------------------------------------

    /// Call one RPC and return its decoded payload (possibly null).
    ///
    /// On 401/403 the tokens are refreshed once and the call fails with
    /// [`RpcError::UpstreamAuth`]; the caller decides whether to re-issue it.
    pub async fn execute<P>(&self, rpc_id: &str, params: &P, source_path: &str) -> Result<Value, RpcError>
    where
        P: Serialize + ?Sized,
    {
        let creds = self.auth.ensured_snapshot().await?;
        let f_req = build_envelope(rpc_id, params)?;
        let request_id = self.request_ids.next();
        let query = batch_query(
            rpc_id,
            &self.build_label,
            request_id,
            &creds.session_id,
            source_path,
        );
        tracing::debug!(rpc_id, source_path, request_id, "executing RPC");

        let (status, body) = self
            .post(
                BATCH_EXECUTE_PATH,
                &query,
                form_body(&f_req, &creds.csrf_token, false),
                &creds.cookie,
                self.rpc_timeout,
            )
            .await?;
        self.check_status(status, &body).await?;

        batch::demux(&body, rpc_id)
    }

    // -- Streamed chat -------------------------------------------------------

    /// Ask a question of a notebook and return the final answer text.
    pub async fn query(
        &self,
        notebook_id: &str,
        text: &str,
        options: QueryOptions,
    ) -> Result<QueryAnswer, RpcError> {
        self.auth.ensure_tokens().await?;

        let timeout = options.timeout.unwrap_or(DEFAULT_QUERY_TIMEOUT);
        let source_ids = match options.source_ids {
            Some(ids) => ids,
            None => self.notebook_source_ids(notebook_id).await?,
        };
        let (conversation_id, is_follow_up) =
            match options.conversation_id.filter(|id| !id.is_empty()) {
                Some(id) => (id, true),
                None => (conversation_id(), false),
            };

        let f_req = build_chat_envelope(&chat_params(&source_ids, text, &conversation_id));
        // The source lookup may have spanned a credential swap.
        let creds = self.auth.ensured_snapshot().await?;
        let request_id = self.request_ids.next();
        let query = chat_query(&self.build_label, request_id, &creds.session_id);
        tracing::debug!(
            notebook_id,
            sources = source_ids.len(),
            is_follow_up,
            request_id,
            "sending query"
        );

        let (status, body) = self
            .post(
                STREAM_QUERY_PATH,
                &query,
                form_body(&f_req, &creds.csrf_token, true),
                &creds.cookie,
                timeout,
            )
            .await?;
        self.check_status(status, &body).await?;

        let answer = scan_stream(&body);
        if answer.is_empty() {
            tracing::warn!(notebook_id, "query stream contained no answer text");
        }
        Ok(QueryAnswer {
            answer,
            conversation_id,
            is_follow_up,
        })
    }

    /// Sources of a notebook, in display order.
    pub async fn notebook_sources(&self, notebook_id: &str) -> Result<Vec<SourceEntry>, RpcError> {
        let params = json!([notebook_id, null, [2], null, 0]);
        let payload = self
            .execute(rpc::GET_NOTEBOOK, &params, &notebook_path(notebook_id))
            .await?;
        Ok(parse_source_entries(path(&payload, &[0, 1])))
    }

    pub async fn notebook_source_ids(&self, notebook_id: &str) -> Result<Vec<String>, RpcError> {
        let sources = self.notebook_sources(notebook_id).await?;
        Ok(sources.into_iter().map(|entry| entry.id).collect())
    }

    // -- Transport -----------------------------------------------------------

    async fn post(
        &self,
        endpoint: &str,
        query: &[(&'static str, String)],
        body: String,
        cookie: &str,
        timeout: Duration,
    ) -> Result<(u16, String), RpcError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, endpoint))
            .query(query)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(COOKIE, cookie)
            .header(ORIGIN, self.base_url.as_str())
            .header(REFERER, format!("{}/", self.base_url))
            .header("X-Same-Domain", "1")
            .timeout(timeout)
            .body(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }

    async fn check_status(&self, status: u16, body: &str) -> Result<(), RpcError> {
        match status {
            200 => Ok(()),
            401 | 403 => {
                tracing::warn!(status, "API rejected credentials, refreshing tokens");
                let refresh = self.auth.refresh_tokens().await.err();
                if let Some(error) = &refresh {
                    tracing::warn!(%error, "token refresh failed");
                }
                Err(RpcError::UpstreamAuth { status, refresh })
            }
            _ => Err(RpcError::UpstreamStatus {
                status,
                preview: preview(body),
            }),
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("build_label", &self.build_label)
            .finish_non_exhaustive()
    }
}

fn preview(body: &str) -> String {
    if body.len() <= BODY_PREVIEW_BYTES {
        return body.to_string();
    }
    let mut end = BODY_PREVIEW_BYTES;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
