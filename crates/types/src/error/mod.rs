// Path: crates/types/src/error/mod.rs
//! Core error types for the proposal forum bridge.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Failure to extract proposal parameters from a transaction description.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// No `(<identifier>,` token was found.
    #[error("no proposal identifier in description")]
    MissingIdentifier,
    /// No `u<digits>)` token was found.
    #[error("no start height in description")]
    MissingStartHeight,
    /// The start height literal does not fit in 64 bits.
    #[error("start height '{0}' is out of range")]
    HeightOutOfRange(String),
}

impl ErrorCode for ParseFailure {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingIdentifier => "PARSE_MISSING_IDENTIFIER",
            Self::MissingStartHeight => "PARSE_MISSING_START_HEIGHT",
            Self::HeightOutOfRange(_) => "PARSE_HEIGHT_OUT_OF_RANGE",
        }
    }
}

/// The top-level error taxonomy shared by ingestion, reconciliation and adapters.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The event description did not match the expected token grammar.
    #[error("Malformed event: {0}")]
    MalformedEvent(#[from] ParseFailure),
    /// A required record or resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
    /// A call to the store, the forum or the chain failed.
    #[error("{service} call failed: {message}")]
    ExternalService {
        /// Which collaborator failed (`store`, `forum`, `chain`).
        service: &'static str,
        /// Human-readable failure detail.
        message: String,
    },
    /// The loaded configuration is incomplete or invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl BridgeError {
    /// Shorthand for an [`BridgeError::ExternalService`] error.
    pub fn external(service: &'static str, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service,
            message: message.into(),
        }
    }

    /// Coarse classification used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedEvent(_) => "malformed_event",
            Self::NotFound(_) => "not_found",
            Self::ExternalService { .. } => "external_service",
            Self::Config(_) => "config",
        }
    }
}

impl ErrorCode for BridgeError {
    fn code(&self) -> &'static str {
        match self {
            Self::MalformedEvent(_) => "BRIDGE_MALFORMED_EVENT",
            Self::NotFound(_) => "BRIDGE_NOT_FOUND",
            Self::ExternalService { service, .. } => match *service {
                "store" => "BRIDGE_STORE_UNAVAILABLE",
                "forum" => "BRIDGE_FORUM_UNAVAILABLE",
                "chain" => "BRIDGE_CHAIN_UNAVAILABLE",
                _ => "BRIDGE_EXTERNAL_SERVICE",
            },
            Self::Config(_) => "BRIDGE_CONFIG_INVALID",
        }
    }
}
