//! Content-addressed blob storage
//!
//! File-based [`ContentStore`](evees_core::ContentStore) that keeps each
//! content object in its own file, named by its address.

mod store;

pub use store::{BlobContentStore, BlobStoreConfig};
