//! Resolution options

use serde::{Deserialize, Serialize};

/// How far and how fully a perspective is resolved
///
/// The default resolves the head object only (`levels = 0`) and inlines
/// its body (`entities = true`), matching the default used for search hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Maximum number of link hops expanded from the head
    pub levels: u32,
    /// Inline object bodies instead of returning addresses only
    pub entities: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            levels: 0,
            entities: true,
        }
    }
}

impl ResolveOptions {
    pub fn new(levels: u32, entities: bool) -> Self {
        Self { levels, entities }
    }

    /// Set the depth bound
    pub fn with_levels(mut self, levels: u32) -> Self {
        self.levels = levels;
        self
    }

    /// Set whether bodies are inlined
    pub fn with_entities(mut self, entities: bool) -> Self {
        self.entities = entities;
        self
    }

    /// Addresses only, no link expansion
    pub fn head_only() -> Self {
        Self {
            levels: 0,
            entities: false,
        }
    }
}
