//! Store-backed application behind the CLI subcommands

use std::sync::Arc;

use evees_core::{
    ContentAddress, ContentStore, DataPayload, Perspective, ResolveOptions, SearchFilter,
    StoreError,
};
use evees_resolve::{CancellationToken, ExploreHit, ResolutionResult, ResolveError, Resolver};
use evees_storage::{BlobContentStore, BlobStoreConfig, PersistentPerspectiveIndex};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::EveesConfig;

/// Errors surfaced by [`App`]
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A head must reference an object that exists
    #[error("Head object not found: {0}")]
    MissingHead(ContentAddress),
}

/// Fields of a perspective to create
#[derive(Debug, Clone)]
pub struct NewPerspective {
    pub name: String,
    pub context: String,
    pub creator_id: String,
    /// Creation time (Unix millis); now if unset
    pub timestamp: Option<i64>,
    pub head: ContentAddress,
}

type FileResolver = Resolver<Arc<BlobContentStore>, PersistentPerspectiveIndex>;

/// Blob content store and persistent index under one data directory
pub struct App {
    content: Arc<BlobContentStore>,
    resolver: FileResolver,
    defaults: ResolveOptions,
    origin: String,
}

impl App {
    /// Open (or create) the stores under `config.data_dir`
    pub async fn open(config: &EveesConfig) -> Result<Self, StoreError> {
        let content = Arc::new(
            BlobContentStore::new(BlobStoreConfig::with_base_dir(config.objects_dir())).await?,
        );
        let index =
            PersistentPerspectiveIndex::open_with_content(config.perspectives_dir(), content.clone())
                .await?;

        info!(data_dir = %config.data_dir.display(), perspectives = index.len(), "Opened stores");

        Ok(Self {
            resolver: Resolver::with_config(content.clone(), index, config.resolver),
            content,
            defaults: config.resolve,
            origin: config.origin.clone(),
        })
    }

    /// Configured options with per-command overrides applied
    pub fn options(&self, levels: Option<u32>, entities: Option<bool>) -> ResolveOptions {
        ResolveOptions {
            levels: levels.unwrap_or(self.defaults.levels),
            entities: entities.unwrap_or(self.defaults.entities),
        }
    }

    /// Store a text leaf
    pub async fn put_text(&self, text: &str) -> Result<ContentAddress, StoreError> {
        self.content.put(DataPayload::text(text)).await
    }

    /// Store a text node; links to absent objects are allowed but logged
    pub async fn put_node(
        &self,
        text: &str,
        links: Vec<ContentAddress>,
    ) -> Result<ContentAddress, StoreError> {
        for link in &links {
            if !self.content.contains(link).await? {
                warn!(link = %link, "Text node links to an absent object");
            }
        }
        self.content.put(DataPayload::text_node(text, links)).await
    }

    /// Create a perspective pointing at an existing object
    ///
    /// The perspective's origin is this store's configured origin.
    pub async fn create_perspective(&self, new: NewPerspective) -> Result<ContentAddress, AppError> {
        self.require_object(&new.head).await?;

        let timestamp = new
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        let perspective = Perspective::new(
            new.name,
            new.context,
            self.origin.as_str(),
            new.creator_id,
            timestamp,
        );
        Ok(self.resolver.index().create(perspective, new.head).await?)
    }

    /// Move a perspective's head to an existing object
    pub async fn set_head(&self, id: &ContentAddress, head: ContentAddress) -> Result<(), AppError> {
        self.require_object(&head).await?;
        Ok(self.resolver.index().set_head(id, head).await?)
    }

    pub async fn resolve(
        &self,
        id: &ContentAddress,
        options: ResolveOptions,
        cancel: &CancellationToken,
    ) -> Result<ResolutionResult, ResolveError> {
        self.resolver.resolve_perspective(id, options, cancel).await
    }

    pub async fn explore(
        &self,
        filter: &SearchFilter,
        options: ResolveOptions,
        caller: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ExploreHit>, ResolveError> {
        self.resolver.explore(filter, options, caller, cancel).await
    }

    async fn require_object(&self, address: &ContentAddress) -> Result<(), AppError> {
        if self.content.contains(address).await? {
            Ok(())
        } else {
            Err(AppError::MissingHead(address.clone()))
        }
    }
}

/// JSON view of an explore batch; failed slots carry an `error` string
pub fn explore_json(hits: &[ExploreHit]) -> Result<Value, serde_json::Error> {
    hits.iter()
        .map(|hit| match &hit.outcome {
            Ok(result) => serde_json::to_value(result),
            Err(e) => Ok(json!({
                "perspective": serde_json::to_value(&hit.perspective)?,
                "error": e.to_string(),
            })),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}
