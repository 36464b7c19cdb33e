//! In-memory storage implementations
//!
//! DashMap-backed implementations of the collaborator traits, suitable for
//! tests, simulations and as the replay target of the persistent index.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use evees_core::{
    ContentAddress, ContentStore, Data, DataPayload, Perspective, PerspectiveIndex,
    PerspectiveRecord, SearchFilter, StoreError,
};
use tracing::{debug, trace};

/// In-memory implementation of [`ContentStore`]
///
/// Counts every `get` so callers can observe how often each address is
/// fetched. `contains` is not counted as a fetch.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    objects: DashMap<ContentAddress, Data>,
    /// Total number of `get` calls
    fetches: AtomicUsize,
    /// `get` calls per address, including misses
    fetches_by_address: DashMap<ContentAddress, usize>,
}

impl InMemoryContentStore {
    /// Create a new empty content store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a payload and return its address
    ///
    /// Storing the same payload twice yields the same address and keeps a
    /// single copy.
    pub fn put(&self, payload: DataPayload) -> ContentAddress {
        let data = Data::new(payload);
        let address = data.id.clone();
        self.objects.entry(address.clone()).or_insert_with(|| {
            trace!(address = %address.short(), "Stored object");
            data
        });
        address
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Total number of fetches served (hits and misses)
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of fetches of a single address
    pub fn fetches_of(&self, address: &ContentAddress) -> usize {
        self.fetches_by_address
            .get(address)
            .map(|count| *count)
            .unwrap_or(0)
    }

    /// Reset the fetch counters
    pub fn reset_fetch_counts(&self) {
        self.fetches.store(0, Ordering::SeqCst);
        self.fetches_by_address.clear();
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn get(&self, address: &ContentAddress) -> Result<Data, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *self
            .fetches_by_address
            .entry(address.clone())
            .or_insert(0) += 1;

        self.objects
            .get(address)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::not_found(address.as_str()))
    }

    async fn contains(&self, address: &ContentAddress) -> Result<bool, StoreError> {
        Ok(self.objects.contains_key(address))
    }
}

/// In-memory implementation of [`PerspectiveIndex`]
///
/// Search results are ordered by creation timestamp, then by id. When a
/// content store is attached, the text predicate also matches the head
/// object's text.
#[derive(Default)]
pub struct InMemoryPerspectiveIndex {
    records: DashMap<ContentAddress, PerspectiveRecord>,
    content: Option<Arc<dyn ContentStore>>,
}

impl std::fmt::Debug for InMemoryPerspectiveIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPerspectiveIndex")
            .field("records", &self.records.len())
            .field("content", &self.content.is_some())
            .finish()
    }
}

impl InMemoryPerspectiveIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index that matches search text against head content
    pub fn with_content(content: Arc<dyn ContentStore>) -> Self {
        Self {
            records: DashMap::new(),
            content: Some(content),
        }
    }

    /// Register a perspective pointing at `head`
    ///
    /// Creating an already known perspective leaves its current head
    /// untouched and returns the same id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Integrity`] if the perspective id does not match
    /// its fields.
    pub fn create(
        &self,
        perspective: Perspective,
        head: ContentAddress,
    ) -> Result<ContentAddress, StoreError> {
        if !perspective.verify() {
            return Err(StoreError::Integrity {
                expected: perspective.expected_id().to_string(),
                actual: perspective.id.to_string(),
            });
        }

        let id = perspective.id.clone();
        self.records.entry(id.clone()).or_insert_with(|| {
            debug!(perspective = %id.short(), head = %head.short(), "Created perspective");
            PerspectiveRecord::new(perspective, head)
        });
        Ok(id)
    }

    /// Point an existing perspective at a new head (last writer wins)
    pub fn set_head(&self, id: &ContentAddress, head: ContentAddress) -> Result<(), StoreError> {
        let mut record = self
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(id.as_str()))?;
        debug!(perspective = %id.short(), head = %head.short(), "Updated head");
        record.head = head;
        Ok(())
    }

    /// Insert a record as-is, replacing any previous one
    pub(crate) fn insert_record(&self, record: PerspectiveRecord) {
        self.records.insert(record.id().clone(), record);
    }

    /// Whether a perspective is known
    pub fn contains(&self, id: &ContentAddress) -> bool {
        self.records.contains_key(id)
    }

    /// Copy of every record, in no particular order
    pub(crate) fn records(&self) -> Vec<PerspectiveRecord> {
        self.records.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Number of known perspectives
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    async fn head_text(&self, head: &ContentAddress) -> Result<Option<String>, StoreError> {
        let Some(content) = &self.content else {
            return Ok(None);
        };
        match content.get(head).await {
            Ok(data) => Ok(Some(data.text().to_string())),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl PerspectiveIndex for InMemoryPerspectiveIndex {
    async fn get_head(&self, id: &ContentAddress) -> Result<PerspectiveRecord, StoreError> {
        self.records
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::not_found(id.as_str()))
    }

    async fn search(
        &self,
        filter: &SearchFilter,
        caller: Option<&str>,
    ) -> Result<Vec<PerspectiveRecord>, StoreError> {
        let mut candidates: Vec<PerspectiveRecord> = self
            .records
            .iter()
            .filter(|entry| filter.matches_metadata(&entry.perspective))
            .map(|entry| entry.value().clone())
            .collect();
        candidates.sort_by(|a, b| {
            (a.perspective.timestamp, a.id()).cmp(&(b.perspective.timestamp, b.id()))
        });

        let mut matches = Vec::with_capacity(candidates.len());
        for record in candidates {
            let head_text = if filter.text.is_some() {
                self.head_text(&record.head).await?
            } else {
                None
            };
            if filter.matches_text(&record.perspective, head_text.as_deref()) {
                matches.push(record);
            }
        }

        let matches = filter.paginate(matches);
        trace!(caller = ?caller, matches = matches.len(), "Searched perspectives");
        Ok(matches)
    }
}
