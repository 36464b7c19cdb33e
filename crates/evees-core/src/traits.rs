//! Collaborator traits
//!
//! The resolution engine only reads through these traits. Implementations
//! are expected to be internally synchronized and safe to share across
//! concurrent resolutions.

use std::sync::Arc;

use async_trait::async_trait;

use crate::address::ContentAddress;
use crate::data::Data;
use crate::error::StoreError;
use crate::filter::SearchFilter;
use crate::perspective::PerspectiveRecord;

/// Read access to immutable content objects
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch the object stored at `address`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no object has this address.
    async fn get(&self, address: &ContentAddress) -> Result<Data, StoreError>;

    /// Check whether an object exists without returning it
    async fn contains(&self, address: &ContentAddress) -> Result<bool, StoreError> {
        match self.get(address).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Lookup and search over perspectives
#[async_trait]
pub trait PerspectiveIndex: Send + Sync {
    /// Get a perspective and its current head
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the perspective does not exist.
    async fn get_head(&self, id: &ContentAddress) -> Result<PerspectiveRecord, StoreError>;

    /// Find perspectives matching `filter`, in index order
    ///
    /// `caller` identifies who is asking; implementations may use it to
    /// scope visibility. Zero matches is an empty vector, not an error.
    async fn search(
        &self,
        filter: &SearchFilter,
        caller: Option<&str>,
    ) -> Result<Vec<PerspectiveRecord>, StoreError>;
}

#[async_trait]
impl<T: ContentStore + ?Sized> ContentStore for Arc<T> {
    async fn get(&self, address: &ContentAddress) -> Result<Data, StoreError> {
        (**self).get(address).await
    }

    async fn contains(&self, address: &ContentAddress) -> Result<bool, StoreError> {
        (**self).contains(address).await
    }
}

#[async_trait]
impl<T: PerspectiveIndex + ?Sized> PerspectiveIndex for Arc<T> {
    async fn get_head(&self, id: &ContentAddress) -> Result<PerspectiveRecord, StoreError> {
        (**self).get_head(id).await
    }

    async fn search(
        &self,
        filter: &SearchFilter,
        caller: Option<&str>,
    ) -> Result<Vec<PerspectiveRecord>, StoreError> {
        (**self).search(filter, caller).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that the collaborator traits are object-safe
    fn _assert_object_safe(_: &dyn ContentStore, _: &dyn PerspectiveIndex) {}

    struct Empty;

    #[async_trait]
    impl ContentStore for Empty {
        async fn get(&self, address: &ContentAddress) -> Result<Data, StoreError> {
            Err(StoreError::not_found(address.as_str()))
        }
    }

    #[tokio::test]
    async fn test_default_contains_maps_not_found() {
        let store = Arc::new(Empty);
        assert!(!store.contains(&ContentAddress::new("x")).await.unwrap());
    }
}
