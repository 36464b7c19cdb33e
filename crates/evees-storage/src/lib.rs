//! # Evees Storage
//!
//! Backends for the two collaborators the resolution engine reads from.
//!
//! ## Features
//!
//! - **InMemoryContentStore**: DashMap-backed content store with fetch counters
//! - **InMemoryPerspectiveIndex**: DashMap-backed perspective index with search
//! - **BlobContentStore**: File-based content-addressed store, verified on load
//! - **PersistentPerspectiveIndex**: Append-only log replayed into memory on open
//!
//! ## Example
//!
//! ```rust,ignore
//! use evees_core::{ContentStore, DataPayload, Perspective, PerspectiveIndex};
//! use evees_storage::{InMemoryContentStore, InMemoryPerspectiveIndex};
//!
//! #[tokio::main]
//! async fn main() {
//!     let content = InMemoryContentStore::new();
//!     let par = content.put(DataPayload::text("a paragraph"));
//!     let doc = content.put(DataPayload::text_node("a title", vec![par]));
//!
//!     let index = InMemoryPerspectiveIndex::new();
//!     let perspective = Perspective::new("draft", "wiki", "local", "did:alice", 0);
//!     let id = index.create(perspective, doc.clone()).unwrap();
//!
//!     let record = index.get_head(&id).await.unwrap();
//!     assert_eq!(record.head, doc);
//! }
//! ```

pub mod blobs;
pub mod memory;
pub mod persistent;

// Re-exports
pub use blobs::{BlobContentStore, BlobStoreConfig};
pub use memory::{InMemoryContentStore, InMemoryPerspectiveIndex};
pub use persistent::PersistentPerspectiveIndex;

pub use evees_core::StoreError;
