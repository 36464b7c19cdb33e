//! Single-perspective and search-driven resolution
//!
//! [`Resolver`] pairs a [`PerspectiveIndex`] with a [`ResolutionEngine`] and
//! exposes the two operations callers use: resolve one perspective by id,
//! or resolve every perspective a search filter selects.

use evees_core::{
    ContentAddress, ContentStore, PerspectiveIndex, ResolveOptions, SearchFilter, StoreError,
};
use futures::StreamExt;
use futures::stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::config::ResolverConfig;
use crate::engine::{ResolutionEngine, cancellable};
use crate::error::ResolveError;
use crate::result::{ExploreHit, ResolutionResult};

/// Resolves perspectives by id or by search
#[derive(Debug)]
pub struct Resolver<C, P> {
    engine: ResolutionEngine<C>,
    index: P,
}

impl<C: ContentStore, P: PerspectiveIndex> Resolver<C, P> {
    /// Create a resolver with default concurrency limits
    pub fn new(content: C, index: P) -> Self {
        Self::with_config(content, index, ResolverConfig::default())
    }

    pub fn with_config(content: C, index: P, config: ResolverConfig) -> Self {
        Self {
            engine: ResolutionEngine::with_config(content, config),
            index,
        }
    }

    pub fn engine(&self) -> &ResolutionEngine<C> {
        &self.engine
    }

    pub fn index(&self) -> &P {
        &self.index
    }

    /// Resolve one perspective by id
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::PerspectiveNotFound`] if the index does not
    /// know `id`, plus any error from [`ResolutionEngine::resolve`].
    #[instrument(skip_all, fields(perspective = %id.short()))]
    pub async fn resolve_perspective(
        &self,
        id: &ContentAddress,
        options: ResolveOptions,
        cancel: &CancellationToken,
    ) -> Result<ResolutionResult, ResolveError> {
        let record = match cancellable(cancel, self.index.get_head(id)).await? {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => {
                return Err(ResolveError::PerspectiveNotFound(id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        self.engine.resolve_record(record, options, cancel).await
    }

    /// Resolve every perspective matching `filter`, in index order
    ///
    /// Perspectives are resolved concurrently up to
    /// [`ResolverConfig::max_concurrent_resolutions`]; results are assembled
    /// in the order the index returned them. A failure resolving one
    /// perspective is kept in its [`ExploreHit`] and does not affect the
    /// others. Cancellation aborts the whole batch.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Cancelled`] on cancellation and
    /// [`ResolveError::Store`] if the index search itself fails.
    #[instrument(skip_all, fields(caller = ?caller, levels = options.levels))]
    pub async fn explore(
        &self,
        filter: &SearchFilter,
        options: ResolveOptions,
        caller: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ExploreHit>, ResolveError> {
        let records = cancellable(cancel, self.index.search(filter, caller)).await??;
        debug!(matches = records.len(), "Search complete");

        if records.is_empty() {
            return Ok(Vec::new());
        }

        let engine = &self.engine;
        let hits: Vec<ExploreHit> = cancellable(
            cancel,
            stream::iter(records)
                .map(move |record| async move {
                    let perspective = record.perspective.clone();
                    let outcome = engine.resolve_record(record, options, cancel).await;
                    ExploreHit {
                        perspective,
                        outcome,
                    }
                })
                .buffered(engine.config().resolution_limit())
                .collect(),
        )
        .await?;

        if hits
            .iter()
            .any(|hit| matches!(hit.outcome, Err(ResolveError::Cancelled)))
        {
            return Err(ResolveError::Cancelled);
        }

        let failed = hits.iter().filter(|hit| hit.outcome.is_err()).count();
        info!(hits = hits.len(), failed, "Explore complete");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evees_core::{DataPayload, Perspective};
    use evees_storage::{InMemoryContentStore, InMemoryPerspectiveIndex};
    use std::sync::Arc;

    fn resolver() -> (
        Resolver<Arc<InMemoryContentStore>, Arc<InMemoryPerspectiveIndex>>,
        ContentAddress,
    ) {
        let content = Arc::new(InMemoryContentStore::new());
        let index = Arc::new(InMemoryPerspectiveIndex::new());
        let head = content.put(DataPayload::text("hello"));
        let id = index
            .create(Perspective::new("p", "ctx", "local", "did:a", 1), head)
            .unwrap();
        (Resolver::new(content, index), id)
    }

    #[tokio::test]
    async fn test_resolve_perspective() {
        let (resolver, id) = resolver();

        let result = resolver
            .resolve_perspective(&id, ResolveOptions::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.perspective.id, id);
        assert_eq!(result.graph.head.data().unwrap().text(), "hello");
    }

    #[tokio::test]
    async fn test_unknown_perspective() {
        let (resolver, _) = resolver();
        let unknown = ContentAddress::new("unknown");

        let err = resolver
            .resolve_perspective(&unknown, ResolveOptions::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::PerspectiveNotFound(unknown));
    }

    #[tokio::test]
    async fn test_explore_zero_matches() {
        let (resolver, _) = resolver();

        let hits = resolver
            .explore(
                &SearchFilter::new().with_context("nothing"),
                ResolveOptions::default(),
                None,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_explore_cancelled() {
        let (resolver, _) = resolver();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = resolver
            .explore(&SearchFilter::new(), ResolveOptions::default(), None, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::Cancelled);
    }
}
