//! Breadth-first, depth-bounded resolution
//!
//! The head sits at depth 0. Objects at depth `1..=levels` are reported in
//! the linked map; objects at depth `levels` are not expanded further.
//! Addresses are marked visited when first discovered, so every address is
//! fetched at most once per call no matter how many parents reference it.

use std::collections::HashSet;
use std::future::Future;

use evees_core::{ContentAddress, ContentStore, Data, PerspectiveRecord, ResolveOptions, StoreError};
use futures::StreamExt;
use futures::stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use crate::config::ResolverConfig;
use crate::error::{DanglingLink, ResolveError};
use crate::expand::expand;
use crate::result::{LinkedEntities, Resolved, ResolutionResult, ResolvedGraph};

/// Resolves head addresses against a [`ContentStore`]
#[derive(Debug)]
pub struct ResolutionEngine<C> {
    content: C,
    config: ResolverConfig,
}

impl<C: ContentStore> ResolutionEngine<C> {
    /// Create an engine with default concurrency limits
    pub fn new(content: C) -> Self {
        Self::with_config(content, ResolverConfig::default())
    }

    pub fn with_config(content: C, config: ResolverConfig) -> Self {
        Self { content, config }
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the graph under `head`
    ///
    /// # Errors
    ///
    /// - [`ResolveError::HeadNotFound`] if `head` is absent
    /// - [`ResolveError::Cancelled`] if `cancel` fires before completion
    /// - [`ResolveError::Store`] for any other collaborator failure
    ///
    /// Absent link targets are recorded in [`ResolvedGraph::dangling`].
    #[instrument(skip_all, fields(head = %head.short(), levels = options.levels, entities = options.entities))]
    pub async fn resolve(
        &self,
        head: &ContentAddress,
        options: ResolveOptions,
        cancel: &CancellationToken,
    ) -> Result<ResolvedGraph, ResolveError> {
        if options.levels == 0 && !options.entities {
            if !cancellable(cancel, self.content.contains(head)).await?? {
                return Err(ResolveError::HeadNotFound(head.clone()));
            }
            return Ok(ResolvedGraph {
                head: Resolved::Address(head.clone()),
                linked: LinkedEntities::default(),
                dangling: Vec::new(),
            });
        }

        let head_data = match cancellable(cancel, self.content.get(head)).await? {
            Ok(data) => data,
            Err(StoreError::NotFound(_)) => return Err(ResolveError::HeadNotFound(head.clone())),
            Err(e) => return Err(e.into()),
        };

        let mut visited: HashSet<ContentAddress> = HashSet::from([head.clone()]);
        let mut linked = LinkedEntities::default();
        let mut dangling = Vec::new();

        let mut frontier = Vec::new();
        if options.levels > 0 {
            discover(&head_data, &mut visited, &mut frontier);
        }

        let mut depth = 1;
        while !frontier.is_empty() && depth <= options.levels {
            let expand_further = depth < options.levels;
            let mut next = Vec::new();

            if options.entities || expand_further {
                let fetched = cancellable(cancel, self.fetch_level(&frontier)).await?;
                for (address, outcome) in fetched {
                    match outcome {
                        Ok(data) => {
                            if expand_further {
                                discover(&data, &mut visited, &mut next);
                            }
                            let entry = if options.entities {
                                Resolved::Entity(data)
                            } else {
                                Resolved::Address(address)
                            };
                            linked.insert(entry);
                        }
                        Err(StoreError::NotFound(_)) => {
                            warn!(address = %address, depth, "Dangling link");
                            dangling.push(DanglingLink { address, depth });
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            } else {
                // Last level without bodies: report addresses unfetched
                for address in frontier {
                    linked.insert(Resolved::Address(address));
                }
            }

            trace!(depth, discovered = next.len(), "Level complete");
            frontier = next;
            depth += 1;
        }

        debug!(
            linked = linked.len(),
            dangling = dangling.len(),
            "Resolved graph"
        );

        let head = if options.entities {
            Resolved::Entity(head_data)
        } else {
            Resolved::Address(head.clone())
        };
        Ok(ResolvedGraph {
            head,
            linked,
            dangling,
        })
    }

    /// Resolve a perspective record, attaching its metadata to the result
    pub async fn resolve_record(
        &self,
        record: PerspectiveRecord,
        options: ResolveOptions,
        cancel: &CancellationToken,
    ) -> Result<ResolutionResult, ResolveError> {
        let graph = self.resolve(&record.head, options, cancel).await?;
        Ok(ResolutionResult {
            perspective: record.perspective,
            graph,
        })
    }

    /// Fetch one frontier concurrently, returning outcomes in frontier order
    async fn fetch_level(
        &self,
        frontier: &[ContentAddress],
    ) -> Vec<(ContentAddress, Result<Data, StoreError>)> {
        let content = &self.content;
        stream::iter(frontier.iter().cloned())
            .map(move |address| async move {
                let outcome = content.get(&address).await;
                (address, outcome)
            })
            .buffered(self.config.fetch_limit())
            .collect()
            .await
    }
}

/// Queue the unvisited links of `data`, marking them visited
fn discover(data: &Data, visited: &mut HashSet<ContentAddress>, queue: &mut Vec<ContentAddress>) {
    for link in expand(data) {
        if visited.insert(link.clone()) {
            queue.push(link.clone());
        }
    }
}

/// Race `fut` against the cancellation signal
pub(crate) async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, ResolveError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ResolveError::Cancelled),
        output = fut => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evees_core::DataPayload;
    use evees_storage::InMemoryContentStore;
    use std::sync::Arc;

    struct Doc {
        store: Arc<InMemoryContentStore>,
        a: ContentAddress,
        b: ContentAddress,
        t: ContentAddress,
    }

    fn doc() -> Doc {
        let store = Arc::new(InMemoryContentStore::new());
        let a = store.put(DataPayload::text("a paragraph 1"));
        let b = store.put(DataPayload::text("a paragraph 2"));
        let t = store.put(DataPayload::text_node("a title", vec![a.clone(), b.clone()]));
        Doc { store, a, b, t }
    }

    #[tokio::test]
    async fn test_levels_one_inlines_children() {
        let doc = doc();
        let engine = ResolutionEngine::new(doc.store.clone());

        let graph = engine
            .resolve(&doc.t, ResolveOptions::new(1, true), &CancellationToken::new())
            .await
            .unwrap();

        let head = graph.head.data().unwrap();
        assert_eq!(head.id, doc.t);
        assert_eq!(expand(head), &[doc.a.clone(), doc.b.clone()]);
        assert_eq!(graph.linked.get(&doc.a).unwrap().text(), "a paragraph 1");
        assert_eq!(graph.linked.get(&doc.b).unwrap().text(), "a paragraph 2");
        assert!(!graph.is_partial());
    }

    #[tokio::test]
    async fn test_levels_zero_fetches_head_only() {
        let doc = doc();
        let engine = ResolutionEngine::new(doc.store.clone());

        let graph = engine
            .resolve(&doc.t, ResolveOptions::new(0, true), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(graph.head.address(), &doc.t);
        assert!(graph.linked.is_empty());
        assert_eq!(doc.store.fetch_count(), 1);
        assert_eq!(doc.store.fetches_of(&doc.a), 0);
    }

    #[tokio::test]
    async fn test_address_only_head_is_not_fetched() {
        let doc = doc();
        let engine = ResolutionEngine::new(doc.store.clone());

        let graph = engine
            .resolve(&doc.t, ResolveOptions::head_only(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(graph.head, Resolved::Address(doc.t.clone()));
        assert_eq!(doc.store.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_head() {
        let doc = doc();
        let engine = ResolutionEngine::new(doc.store.clone());
        let missing = ContentAddress::new("missing");

        for options in [ResolveOptions::head_only(), ResolveOptions::new(2, true)] {
            let err = engine
                .resolve(&missing, options, &CancellationToken::new())
                .await
                .unwrap_err();
            assert_eq!(err, ResolveError::HeadNotFound(missing.clone()));
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let doc = doc();
        let engine = ResolutionEngine::new(doc.store.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = engine
            .resolve(&doc.t, ResolveOptions::new(1, true), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::Cancelled);
        assert_eq!(doc.store.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_addresses_without_entities() {
        let doc = doc();
        let engine = ResolutionEngine::new(doc.store.clone());

        let graph = engine
            .resolve(&doc.t, ResolveOptions::new(1, false), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(graph.head, Resolved::Address(doc.t.clone()));
        let addresses: Vec<_> = graph.linked.addresses().cloned().collect();
        assert_eq!(addresses, vec![doc.a.clone(), doc.b.clone()]);
        assert!(graph.linked.get(&doc.a).is_none());
        // Leaves at the last level are reported without being fetched
        assert_eq!(doc.store.fetches_of(&doc.a), 0);
        assert_eq!(doc.store.fetches_of(&doc.t), 1);
    }
}
