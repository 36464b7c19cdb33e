//! Search filters over perspective metadata

use serde::{Deserialize, Serialize};

use crate::perspective::Perspective;

/// Predicates selecting perspectives, plus pagination
///
/// Every predicate is optional; unset predicates match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilter {
    /// Exact context match
    pub context: Option<String>,
    /// Exact creator match
    pub creator_id: Option<String>,
    /// Exact origin match
    pub origin: Option<String>,
    /// Case-insensitive substring of the name or head text
    pub text: Option<String>,
    /// Matches skipped before the first returned one
    pub offset: usize,
    /// Maximum number of matches returned
    pub limit: Option<usize>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_creator(mut self, creator_id: impl Into<String>) -> Self {
        self.creator_id = Some(creator_id.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    /// Check the exact-match metadata predicates
    pub fn matches_metadata(&self, perspective: &Perspective) -> bool {
        let eq = |want: &Option<String>, have: &str| want.as_deref().is_none_or(|w| w == have);

        eq(&self.context, &perspective.context)
            && eq(&self.creator_id, &perspective.creator_id)
            && eq(&self.origin, &perspective.origin)
    }

    /// Check the text predicate against the name and, if known, the head text
    pub fn matches_text(&self, perspective: &Perspective, head_text: Option<&str>) -> bool {
        let Some(needle) = self.text.as_deref() else {
            return true;
        };
        let needle = needle.to_lowercase();
        perspective.name.to_lowercase().contains(&needle)
            || head_text.is_some_and(|t| t.to_lowercase().contains(&needle))
    }

    /// Apply offset and limit to an already-ordered list of matches
    pub fn paginate<T>(&self, matches: Vec<T>) -> Vec<T> {
        let iter = matches.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}
