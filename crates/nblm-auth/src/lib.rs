//! Credential lifecycle for the NotebookLM batchexecute API.
//!
//! The browser cookie is the only credential supplied from outside. The CSRF
//! token and session id are scraped from the NotebookLM page on first use and
//! cached until the cookie changes or a refresh is forced.

mod error;
mod extract;
mod store;

pub use error::AuthError;
pub use extract::{extract_tokens, PageTokens};
pub use store::{AuthStatus, CredentialSnapshot, CredentialStore};
