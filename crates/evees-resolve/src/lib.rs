//! # Evees Resolve
//!
//! Resolves perspectives into the content-addressed graph they point to.
//!
//! - [`expand`]: the link expander, a pure function over a fetched object
//! - [`ResolutionEngine`]: breadth-first, depth-bounded, deduplicated
//!   traversal from a head address
//! - [`Resolver`]: the two operations exposed upward,
//!   [`resolve_perspective`](Resolver::resolve_perspective) and
//!   [`explore`](Resolver::explore)
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use evees_core::{DataPayload, Perspective, ResolveOptions};
//! use evees_resolve::Resolver;
//! use evees_storage::{InMemoryContentStore, InMemoryPerspectiveIndex};
//! use tokio_util::sync::CancellationToken;
//!
//! let content = Arc::new(InMemoryContentStore::new());
//! let a = content.put(DataPayload::text("a paragraph 1"));
//! let t = content.put(DataPayload::text_node("a title", vec![a]));
//!
//! let index = Arc::new(InMemoryPerspectiveIndex::new());
//! let id = index.create(Perspective::new("doc", "wiki", "local", "did:alice", 0), t)?;
//!
//! let resolver = Resolver::new(content, index);
//! let result = resolver
//!     .resolve_perspective(&id, ResolveOptions::new(1, true), &CancellationToken::new())
//!     .await?;
//! assert_eq!(result.graph.linked.len(), 1);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod expand;
pub mod result;
pub mod search;

pub use config::ResolverConfig;
pub use engine::ResolutionEngine;
pub use error::{DanglingLink, ResolveError};
pub use expand::expand;
pub use result::{ExploreHit, LinkedEntities, Resolved, ResolutionResult, ResolvedGraph};
pub use search::Resolver;

pub use tokio_util::sync::CancellationToken;
