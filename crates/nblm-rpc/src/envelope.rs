//! Request encoding for the batchexecute and streamed-chat endpoints.

use nblm_core::wire::{ENVELOPE_TAG, LOCALE};
use serde::Serialize;
use serde_json::{json, Value};

use crate::RpcError;

/// A single call recovered from an `f.req` field.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeCall {
    pub rpc_id: String,
    /// The parameters exactly as encoded in the inner string.
    pub encoded_params: String,
}

impl EnvelopeCall {
    pub fn params(&self) -> Result<Value, RpcError> {
        serde_json::from_str(&self.encoded_params)
            .map_err(|e| RpcError::decode(format!("envelope params are not JSON: {e}")))
    }
}

/// Build the `f.req` value for one RPC.
///
/// The parameters are serialized to a JSON string first, and that string is
/// placed inside `[[[rpc_id, params, null, "generic"]]]`, which is then
/// serialized again.
pub fn build_envelope<P: Serialize + ?Sized>(rpc_id: &str, params: &P) -> Result<String, RpcError> {
    let encoded_params = serde_json::to_string(params)
        .map_err(|e| RpcError::MalformedEnvelope(format!("encoding params for {rpc_id}: {e}")))?;
    let envelope = json!([[[rpc_id, encoded_params, null, ENVELOPE_TAG]]]);
    Ok(envelope.to_string())
}

/// Inverse of [`build_envelope`] for single-call envelopes.
pub fn parse_envelope(f_req: &str) -> Result<EnvelopeCall, RpcError> {
    let outer: Value = serde_json::from_str(f_req)
        .map_err(|e| RpcError::MalformedEnvelope(format!("f.req is not JSON: {e}")))?;
    let call = outer
        .get(0)
        .and_then(|calls| calls.get(0))
        .ok_or_else(|| RpcError::MalformedEnvelope("f.req holds no call".to_string()))?;
    match (call.get(0).and_then(Value::as_str), call.get(1).and_then(Value::as_str)) {
        (Some(rpc_id), Some(encoded_params)) => Ok(EnvelopeCall {
            rpc_id: rpc_id.to_string(),
            encoded_params: encoded_params.to_string(),
        }),
        _ => Err(RpcError::MalformedEnvelope(
            "call is not [rpcId, params, ...]".to_string(),
        )),
    }
}

/// Chat request parameters, positional:
/// `[sources, text, history, [2, null, [1]], conversation_id]`, where each
/// source is wrapped as `[[[id]]]`.
pub fn chat_params(source_ids: &[String], text: &str, conversation_id: &str) -> Value {
    let sources: Vec<Value> = source_ids.iter().map(|id| json!([[id]])).collect();
    json!([sources, text, null, [2, null, [1]], conversation_id])
}

/// Build the `f.req` value for the streamed chat endpoint: `[null, json(params)]`.
pub fn build_chat_envelope(params: &Value) -> String {
    json!([null, params.to_string()]).to_string()
}

/// Query string for a batchexecute call.
pub fn batch_query(
    rpc_id: &str,
    build_label: &str,
    request_id: u64,
    session_id: &str,
    source_path: &str,
) -> Vec<(&'static str, String)> {
    let mut query = vec![("rpcids", rpc_id.to_string())];
    if !source_path.is_empty() {
        query.push(("source-path", source_path.to_string()));
    }
    query.extend([
        ("bl", build_label.to_string()),
        ("hl", LOCALE.to_string()),
        ("rt", "c".to_string()),
        ("_reqid", request_id.to_string()),
    ]);
    if !session_id.is_empty() {
        query.push(("f.sid", session_id.to_string()));
    }
    query
}

/// Query string for the streamed chat endpoint.
pub fn chat_query(build_label: &str, request_id: u64, session_id: &str) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("bl", build_label.to_string()),
        ("hl", LOCALE.to_string()),
        ("_reqid", request_id.to_string()),
        ("rt", "c".to_string()),
    ];
    if !session_id.is_empty() {
        query.push(("f.sid", session_id.to_string()));
    }
    query
}

/// URL-encode `f.req` and `at` as a form body. The chat endpoint expects a
/// trailing `&`.
pub fn form_body(f_req: &str, csrf_token: &str, trailing_separator: bool) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    serializer.append_pair("f.req", f_req);
    if !csrf_token.is_empty() {
        serializer.append_pair("at", csrf_token);
    }
    let mut body = serializer.finish();
    if trailing_separator {
        body.push('&');
    }
    body
}
