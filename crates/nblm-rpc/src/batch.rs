//! Framing and demultiplexing of batchexecute responses.
//!
//! A response body looks like:
//!
//! ```text
//! )]}'
//! 123
//! [["wrb.fr","rpcId","<payload as JSON string>",null,...]]
//! 25
//! [["di",42],["af.httprm",41,"...",1]]
//! ```
//!
//! Byte-count lines are ignored; every line starting with `[` is parsed as a
//! JSON array of entries. Only `wrb.fr` entries carry RPC results.

use nblm_core::wire::{RESPONSE_MARKER, XSSI_PREFIX};
use serde_json::Value;

use crate::RpcError;

/// One `wrb.fr` entry, with its payload still in raw form.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEntry {
    pub rpc_id: String,
    /// Position 2 of the entry: a JSON-encoded string, or null.
    pub raw_payload: Value,
}

impl ResponseEntry {
    /// Parse the payload. A null payload is a valid, empty result.
    pub fn decode(&self) -> Result<Value, RpcError> {
        match &self.raw_payload {
            Value::Null => Ok(Value::Null),
            Value::String(encoded) => serde_json::from_str(encoded).map_err(|e| {
                RpcError::decode(format!("payload for RPC {} is not JSON: {e}", self.rpc_id))
            }),
            _ => Err(RpcError::decode(format!(
                "payload for RPC {} is neither a string nor null",
                self.rpc_id
            ))),
        }
    }

    fn has_usable_payload(&self) -> bool {
        matches!(self.raw_payload, Value::Null | Value::String(_))
    }
}

/// Drop the anti-XSSI prefix through its line break, if a line break occurs
/// within the first ten bytes.
pub fn strip_xssi_prefix(body: &str) -> &str {
    match body.as_bytes().iter().take(10).position(|&b| b == b'\n') {
        Some(newline) => &body[newline + 1..],
        None => body.strip_prefix(XSSI_PREFIX).unwrap_or(body),
    }
}

/// Login pages come back with status 200, so the body has to be sniffed.
pub(crate) fn looks_like_html(body: &str) -> bool {
    let trimmed = body.trim_start().as_bytes();
    match trimmed {
        [b'<', b'!', ..] => true,
        [b'<', rest @ ..] => rest
            .get(..4)
            .is_some_and(|tag| tag.eq_ignore_ascii_case(b"html")),
        _ => false,
    }
}

/// Every `wrb.fr` entry in the body, in order. Lines that fail to parse are
/// skipped.
pub fn entries(body: &str) -> Vec<ResponseEntry> {
    scan_entries(strip_xssi_prefix(body))
}

// Expects the prefix to be gone already: stripping twice could eat a short
// data line.
fn scan_entries(framed: &str) -> Vec<ResponseEntry> {
    let mut found = Vec::new();
    for line in framed.lines() {
        let line = line.trim();
        if !line.starts_with('[') {
            continue;
        }
        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        for item in items {
            let Value::Array(mut fields) = item else {
                continue;
            };
            if fields.len() < 3 || fields[0].as_str() != Some(RESPONSE_MARKER) {
                continue;
            }
            let Some(rpc_id) = fields[1].as_str().map(str::to_string) else {
                continue;
            };
            found.push(ResponseEntry {
                rpc_id,
                raw_payload: fields.swap_remove(2),
            });
        }
    }
    found
}

/// Extract the payload of the first `wrb.fr` entry addressed to `rpc_id`.
pub fn demux(body: &str, rpc_id: &str) -> Result<Value, RpcError> {
    let framed = strip_xssi_prefix(body);
    if framed.trim().is_empty() {
        return Err(RpcError::decode(format!(
            "empty response body for RPC {rpc_id}"
        )));
    }
    // Sniff both sides of the strip: a login page may arrive behind the
    // prefix, and a bare page may itself break within its first ten bytes.
    if looks_like_html(framed) || looks_like_html(body) {
        return Err(RpcError::CredentialExpired(
            "received HTML instead of API response: cookies may be expired".to_string(),
        ));
    }

    let entry = scan_entries(framed)
        .into_iter()
        .find(|entry| entry.rpc_id == rpc_id && entry.has_usable_payload())
        .ok_or_else(|| {
            RpcError::decode(format!(
                "no response found for RPC {rpc_id} in batch response"
            ))
        })?;
    entry.decode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_prefix_through_first_newline() {
        assert_eq!(strip_xssi_prefix(")]}'\n[1]"), "[1]");
        assert_eq!(strip_xssi_prefix(")]}'\r\n[1]"), "[1]");
        assert_eq!(strip_xssi_prefix("[1]"), "[1]");
        assert_eq!(strip_xssi_prefix(")]}'[1]"), "[1]");
        // A newline past the first ten bytes belongs to the content.
        assert_eq!(
            strip_xssi_prefix("[1,2,3,4,5,6]\n[7]"),
            "[1,2,3,4,5,6]\n[7]"
        );
    }

    #[test]
    fn demux_full_body() {
        let body = ")]}'\n23\n[[\"wrb.fr\",\"R1\",\"[\\\"ok\\\"]\",null]]\n5\n[[\"di\",1]]";
        assert_eq!(demux(body, "R1").unwrap(), json!(["ok"]));
    }

    #[test]
    fn demux_picks_matching_rpc_id() {
        let body = concat!(
            ")]}'\n",
            "40\n",
            r#"[["wrb.fr","A","[1]",null],["wrb.fr","B","[2]",null]]"#,
            "\n"
        );
        assert_eq!(demux(body, "B").unwrap(), json!([2]));
        assert_eq!(demux(body, "A").unwrap(), json!([1]));
    }

    #[test]
    fn demux_null_payload_is_success() {
        let body = ")]}'\n[[\"wrb.fr\",\"R1\",null,null,null,[16],\"generic\"]]";
        assert_eq!(demux(body, "R1").unwrap(), Value::Null);
    }

    #[test]
    fn demux_missing_id_is_decode_error() {
        let body = ")]}'\n[[\"wrb.fr\",\"OTHER\",\"[1]\"]]";
        match demux(body, "R1") {
            Err(RpcError::Decode(msg)) => {
                assert!(msg.contains("no response found for RPC R1"), "{msg}")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn demux_empty_after_prefix_is_decode_error() {
        for body in [")]}'\n", ")]}'\n  \n\t", "", "   "] {
            match demux(body, "R1") {
                Err(RpcError::Decode(msg)) => {
                    assert!(msg.contains("empty response body for RPC R1"), "{msg}")
                }
                other => panic!("unexpected result for {body:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn demux_html_behind_prefix_is_credential_expired() {
        for body in [
            ")]}'\n<!DOCTYPE html><html><body>Sign in</body></html>",
            ")]}'\n\n  <html lang=\"en\">",
            "<html>\n<body>Sign in</body></html>",
        ] {
            match demux(body, "R1") {
                Err(RpcError::CredentialExpired(msg)) => assert!(msg.contains("HTML")),
                other => panic!("unexpected result for {body:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn demux_returns_payload_from_the_only_matching_line() {
        let mut body = String::from(")]}'\n");
        for (i, id) in ["A", "B", "R1", "C", "D"].iter().enumerate() {
            let line = serde_json::json!([["wrb.fr", id, format!("[{i}]"), null]]).to_string();
            body.push_str(&format!("{}\n{}\n", line.len(), line));
        }
        body.push_str("25\n[[\"di\",7],[\"af.httprm\",6]]\n");

        assert_eq!(demux(&body, "R1").unwrap(), json!([2]));
        assert_eq!(demux(&body, "D").unwrap(), json!([4]));
    }

    #[test]
    fn demux_keeps_short_first_data_line() {
        // The first data line fits in ten bytes, so it must not be taken for
        // a second prefix.
        let body = ")]}'\n[[\"wrb.fr\",\"R\",\"1\"]]";
        assert_eq!(demux(body, "R").unwrap(), json!(1));
    }

    #[test]
    fn demux_skips_unparsable_lines() {
        let body = ")]}'\n[not json\n[[\"wrb.fr\",\"R1\",\"{\\\"a\\\":1}\"]]";
        assert_eq!(demux(body, "R1").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn demux_html_is_credential_expired() {
        for body in [
            "<!DOCTYPE html><html>Sign in</html>",
            "  \n<html><body>login</body></html>",
            "<HTML>",
        ] {
            match demux(body, "R1") {
                Err(RpcError::CredentialExpired(msg)) => assert!(msg.contains("HTML")),
                other => panic!("unexpected result for {body:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn demux_invalid_payload_json_is_decode_error() {
        let body = ")]}'\n[[\"wrb.fr\",\"R1\",\"[unterminated\"]]";
        assert!(matches!(demux(body, "R1"), Err(RpcError::Decode(_))));
    }

    #[test]
    fn entries_lists_only_wrb_fr() {
        let body = ")]}'\n[[\"wrb.fr\",\"A\",\"[]\"],[\"di\",5],[\"af.httprm\",4,\"x\",1]]";
        let found = entries(body);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rpc_id, "A");
        assert_eq!(found[0].decode().unwrap(), json!([]));
    }

    #[test]
    fn html_sniffing_ignores_json() {
        assert!(!looks_like_html(")]}'\n[]"));
        assert!(!looks_like_html("<"));
        assert!(looks_like_html("<!-- comment -->"));
    }
}
