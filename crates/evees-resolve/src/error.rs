//! Error types for resolution

use evees_core::{ContentAddress, StoreError};
use serde::Serialize;
use thiserror::Error;

/// Errors that abort a single resolution
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The perspective is unknown to the index
    #[error("Perspective not found: {0}")]
    PerspectiveNotFound(ContentAddress),

    /// The head address does not resolve in the content store
    #[error("Head object not found: {0}")]
    HeadNotFound(ContentAddress),

    /// The caller's cancellation signal fired mid-traversal
    #[error("Resolution cancelled")]
    Cancelled,

    /// Collaborator failure, passed through unchanged
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// A link whose target is absent from the content store
///
/// Recorded inside an otherwise successful result; never aborts resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("Dangling link to {address} at depth {depth}")]
pub struct DanglingLink {
    pub address: ContentAddress,
    /// Hops from the head at which the link was followed
    pub depth: u32,
}
