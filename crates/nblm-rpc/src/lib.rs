//! Client for the NotebookLM batchexecute RPC dialect.
//!
//! Requests are wrapped in a doubly JSON-encoded envelope and posted as a
//! form; responses arrive line-framed behind an anti-XSSI prefix and are
//! demultiplexed per RPC id. Payloads are positional arrays, navigated with
//! the tolerant helpers in [`value`].

pub mod batch;
pub mod client;
pub mod envelope;
pub mod error;
pub mod stream;
pub mod value;

pub use batch::{demux, entries, strip_xssi_prefix, ResponseEntry};
pub use client::{Client, QueryAnswer, QueryOptions};
pub use envelope::{build_envelope, parse_envelope, EnvelopeCall};
pub use error::RpcError;
pub use stream::{scan_chunk, scan_stream, SpanKind, StreamScanner, StreamingChunk};
pub use value::{
    as_array, as_int, as_str, at, parse_source_entries, path, recursive_text_extract, text_spans,
    SourceEntry,
};
