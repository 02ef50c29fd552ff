//! Answer extraction from the streamed chat endpoint.
//!
//! The stream is a sequence of chunks, each optionally preceded by a
//! byte-count line. Every chunk repeats the answer generated so far, so the
//! final answer is the longest text seen. Chunks flagged as non-answer
//! carry the model's intermediate "thinking" and only serve as a fallback.

use nblm_core::wire::{RESPONSE_MARKER, XSSI_PREFIX};
use serde_json::Value;

use crate::value::{as_int, as_str, at};

/// Texts this short are status fragments, not answers.
const MIN_TEXT_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Answer,
    Thinking,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingChunk {
    pub text: String,
    pub kind: SpanKind,
}

/// Pull the text span out of one chunk line, if it has a usable one.
///
/// Inside each `wrb.fr` entry the payload is `[[text, _, _, _, flags], ...]`;
/// the span is an answer when the last element of `flags` is `1`.
pub fn scan_chunk(line: &str) -> Option<StreamingChunk> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(line) else {
        return None;
    };
    items.iter().find_map(|item| {
        if as_str(at(item, 0)) != RESPONSE_MARKER {
            return None;
        }
        let encoded = at(item, 2).as_str()?;
        let payload: Value = serde_json::from_str(encoded).ok()?;
        let first = at(&payload, 0);
        let text = as_str(at(first, 0));
        if text.chars().count() <= MIN_TEXT_CHARS {
            return None;
        }
        let is_answer = at(first, 4)
            .as_array()
            .and_then(|flags| flags.last())
            .is_some_and(|flag| as_int(flag) == 1);
        Some(StreamingChunk {
            text: text.to_string(),
            kind: if is_answer {
                SpanKind::Answer
            } else {
                SpanKind::Thinking
            },
        })
    })
}

/// Incremental scanner: feed lines as they arrive, then [`finish`].
///
/// [`finish`]: StreamScanner::finish
#[derive(Debug, Default)]
pub struct StreamScanner {
    expect_chunk: bool,
    longest_answer: String,
    longest_thinking: String,
}

impl StreamScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed_line(&mut self, line: &str) {
        // The line after a byte count is a chunk regardless of its shape.
        if self.expect_chunk {
            self.expect_chunk = false;
            self.consider(line);
            return;
        }
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if line.bytes().all(|b| b.is_ascii_digit()) {
            self.expect_chunk = true;
            return;
        }
        self.consider(line);
    }

    fn consider(&mut self, line: &str) {
        let Some(chunk) = scan_chunk(line) else {
            return;
        };
        let slot = match chunk.kind {
            SpanKind::Answer => &mut self.longest_answer,
            SpanKind::Thinking => &mut self.longest_thinking,
        };
        if chunk.text.chars().count() > slot.chars().count() {
            *slot = chunk.text;
        }
    }

    /// Longest answer, else longest thinking text, else empty.
    pub fn finish(self) -> String {
        if self.longest_answer.is_empty() {
            self.longest_thinking
        } else {
            self.longest_answer
        }
    }
}

/// Scan a complete streamed body for its final answer.
pub fn scan_stream(body: &str) -> String {
    let body = body.strip_prefix(XSSI_PREFIX).unwrap_or(body).trim();
    let mut scanner = StreamScanner::new();
    for line in body.split('\n') {
        scanner.feed_line(line);
    }
    scanner.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunk(text: &str, answer: bool) -> String {
        let flags = if answer { json!([null, 1]) } else { json!([null, 2]) };
        let payload = json!([[text, null, null, null, flags]]).to_string();
        json!([["wrb.fr", null, payload]]).to_string()
    }

    fn framed(chunks: &[String]) -> String {
        let mut body = String::from(")]}'\n");
        for c in chunks {
            body.push_str(&format!("{}\n{}\n", c.len(), c));
        }
        body
    }

    #[test]
    fn longest_answer_wins() {
        let short = "a".repeat(25);
        let long = "b".repeat(40);
        let body = framed(&[chunk(&short, true), chunk(&long, true)]);
        assert_eq!(scan_stream(&body), long);
    }

    #[test]
    fn answer_preferred_over_longer_thinking() {
        let answer = "a".repeat(30);
        let thinking = "t".repeat(50);
        let body = framed(&[chunk(&thinking, false), chunk(&answer, true)]);
        assert_eq!(scan_stream(&body), answer);
    }

    #[test]
    fn thinking_is_fallback() {
        let thinking = "t".repeat(50);
        let body = framed(&[chunk(&thinking, false)]);
        assert_eq!(scan_stream(&body), thinking);
    }

    #[test]
    fn short_texts_are_ignored() {
        let body = framed(&[chunk(&"x".repeat(20), true)]);
        assert_eq!(scan_stream(&body), "");
        assert!(scan_chunk(&chunk(&"x".repeat(21), true)).is_some());
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        // 20 chars but 40 bytes: still too short.
        assert!(scan_chunk(&chunk(&"é".repeat(20), true)).is_none());

        // More bytes, fewer chars: the ASCII answer is the longer one.
        let wide = "é".repeat(22);
        let ascii = "a".repeat(30);
        let body = framed(&[chunk(&ascii, true), chunk(&wide, true)]);
        assert_eq!(scan_stream(&body), ascii);
    }

    #[test]
    fn unframed_chunks_are_scanned_too() {
        let answer = "an answer that is long enough";
        let body = format!("{}\n\n{}", chunk("a shorter answer text!", true), chunk(answer, true));
        assert_eq!(scan_stream(&body), answer);
    }

    #[test]
    fn empty_and_garbage_bodies_yield_empty() {
        assert_eq!(scan_stream(""), "");
        assert_eq!(scan_stream(")]}'"), "");
        assert_eq!(scan_stream(")]}'\n12\nnot json\n99"), "");
    }

    #[test]
    fn chunk_without_flags_is_thinking() {
        let payload = json!([["a text comfortably over twenty chars"]]).to_string();
        let line = json!([["wrb.fr", null, payload]]).to_string();
        let chunk = scan_chunk(&line).unwrap();
        assert_eq!(chunk.kind, SpanKind::Thinking);
    }

    #[test]
    fn scan_chunk_skips_entries_without_text() {
        let payload = json!([["long enough answer text for the scan", null, null, null, [1]]])
            .to_string();
        let line = json!([["di", 4], ["wrb.fr", null, null], ["wrb.fr", null, payload]]).to_string();
        let chunk = scan_chunk(&line).unwrap();
        assert_eq!(chunk.kind, SpanKind::Answer);
        assert_eq!(chunk.text, "long enough answer text for the scan");
    }
}
