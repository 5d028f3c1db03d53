// Path: crates/clients/src/lib.rs
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # Forum Bridge Clients
//!
//! Concrete implementations of the `bridge-api` collaborator traits:
//!
//! - [`DiscordForum`]: the Discord REST API (v10) for forum channels and threads.
//! - [`StacksChain`]: a Stacks node API for tip height and read-only parameter calls.
//! - [`RestProposalStore`]: a PostgREST-compatible table of proposal records.
//! - [`MemoryProposalStore`]: a process-local store for development runs.

pub mod chain;
pub mod forum;
pub mod store;

pub use chain::StacksChain;
pub use forum::DiscordForum;
pub use store::{MemoryProposalStore, RestProposalStore};

use bridge_types::error::BridgeError;
use std::time::Duration;

/// Per-request timeout shared by every adapter.
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A printable, single-line prefix of an HTTP body for error messages.
pub(crate) fn ascii_snippet(body: &str) -> String {
    let s = body.trim();
    let s: String = s.chars().take(160).collect();
    s.replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Turns a non-2xx response into an `ExternalService` error carrying the
/// status and a body snippet.
pub(crate) async fn check_status(
    service: &'static str,
    what: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, BridgeError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(BridgeError::external(
        service,
        format!("HTTP {} from {}: {}", status.as_u16(), what, ascii_snippet(&body)),
    ))
}

pub(crate) fn build_client(
    service: &'static str,
    builder: reqwest::ClientBuilder,
) -> Result<reqwest::Client, BridgeError> {
    builder
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| BridgeError::external(service, format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_snippet_escapes_and_truncates() {
        let body = format!("line one\nline two\t{}", "x".repeat(400));
        let snippet = ascii_snippet(&body);
        assert!(snippet.starts_with("line one\\nline two\\t"));
        assert!(!snippet.contains('\n'));
        assert!(snippet.len() < 200);
    }
}
