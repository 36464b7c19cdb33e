//! Configuration for the resolution engine

use serde::{Deserialize, Serialize};

/// Concurrency limits for resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Fetches issued concurrently within one traversal level
    pub max_concurrent_fetches: usize,
    /// Perspectives resolved concurrently by `explore`
    pub max_concurrent_resolutions: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 16,
            max_concurrent_resolutions: 8,
        }
    }
}

impl ResolverConfig {
    /// Set the per-level fetch concurrency
    pub fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = limit;
        self
    }

    /// Set the batch resolution concurrency
    pub fn with_max_concurrent_resolutions(mut self, limit: usize) -> Self {
        self.max_concurrent_resolutions = limit;
        self
    }

    pub(crate) fn fetch_limit(&self) -> usize {
        self.max_concurrent_fetches.max(1)
    }

    pub(crate) fn resolution_limit(&self) -> usize {
        self.max_concurrent_resolutions.max(1)
    }
}
