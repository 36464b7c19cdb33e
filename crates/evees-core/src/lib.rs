//! # Evees Core
//!
//! Core types, content addressing, and collaborator traits for resolving
//! perspectives into the content-addressed data graph they point to.
//!
//! ## Key Types
//!
//! - [`ContentAddress`]: Opaque, hashable address of an immutable object
//! - [`Data`] / [`DataPayload`]: Immutable content objects (`Text`, `TextNode`)
//! - [`Perspective`] / [`PerspectiveRecord`]: Named mutable pointer and its current head
//! - [`ResolveOptions`]: Depth bound and entity inlining for a resolution
//! - [`SearchFilter`]: Metadata predicates used to select perspectives
//!
//! ## Key Traits
//!
//! - [`ContentStore`]: Fetches content objects by address
//! - [`PerspectiveIndex`]: Looks up perspective heads and searches metadata

pub mod address;
pub mod data;
pub mod error;
pub mod filter;
pub mod options;
pub mod perspective;
pub mod traits;

pub use address::ContentAddress;
pub use data::{Data, DataPayload};
pub use error::StoreError;
pub use filter::SearchFilter;
pub use options::ResolveOptions;
pub use perspective::{Perspective, PerspectiveRecord};
pub use traits::{ContentStore, PerspectiveIndex};
