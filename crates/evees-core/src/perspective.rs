//! Perspectives: named mutable pointers into the data graph

use serde::{Deserialize, Serialize};

use crate::address::{ContentAddress, hash_field};

/// Immutable record of a perspective
///
/// The `id` is derived from the other fields and never changes. The
/// perspective's head lives alongside it in a [`PerspectiveRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perspective {
    pub id: ContentAddress,
    pub name: String,
    /// Grouping/namespace key
    pub context: String,
    /// Source system identifier
    pub origin: String,
    pub creator_id: String,
    /// Creation time (Unix millis)
    pub timestamp: i64,
}

impl Perspective {
    /// Create a perspective, deriving its id from the immutable fields
    pub fn new(
        name: impl Into<String>,
        context: impl Into<String>,
        origin: impl Into<String>,
        creator_id: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        let name = name.into();
        let context = context.into();
        let origin = origin.into();
        let creator_id = creator_id.into();
        let id = Self::compute_id(&name, &context, &origin, &creator_id, timestamp);
        Self {
            id,
            name,
            context,
            origin,
            creator_id,
            timestamp,
        }
    }

    /// Deterministic id for the given immutable fields
    pub fn compute_id(
        name: &str,
        context: &str,
        origin: &str,
        creator_id: &str,
        timestamp: i64,
    ) -> ContentAddress {
        let mut hasher = blake3::Hasher::new();
        hash_field(&mut hasher, b"PERSPECTIVE");
        hash_field(&mut hasher, name.as_bytes());
        hash_field(&mut hasher, context.as_bytes());
        hash_field(&mut hasher, origin.as_bytes());
        hash_field(&mut hasher, creator_id.as_bytes());
        hasher.update(&timestamp.to_le_bytes());
        ContentAddress::from_hasher(&hasher)
    }

    /// The id the fields hash to
    pub fn expected_id(&self) -> ContentAddress {
        Self::compute_id(
            &self.name,
            &self.context,
            &self.origin,
            &self.creator_id,
            self.timestamp,
        )
    }

    /// Whether `id` matches the id recomputed from the fields
    pub fn verify(&self) -> bool {
        self.expected_id() == self.id
    }
}

/// A perspective and the address its head currently points to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerspectiveRecord {
    pub perspective: Perspective,
    pub head: ContentAddress,
}

impl PerspectiveRecord {
    pub fn new(perspective: Perspective, head: ContentAddress) -> Self {
        Self { perspective, head }
    }

    pub fn id(&self) -> &ContentAddress {
        &self.perspective.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp: i64) -> Perspective {
        Perspective::new(
            "test",
            "wikipedia.barack_obama",
            "local",
            "did:method:12345",
            timestamp,
        )
    }

    #[test]
    fn test_id_is_deterministic() {
        assert_eq!(sample(1568027451547).id, sample(1568027451547).id);
        assert_ne!(sample(1568027451547).id, sample(1568027451548).id);
    }

    #[test]
    fn test_verify_detects_changed_fields() {
        let mut perspective = sample(1568027451547);
        assert!(perspective.verify());

        perspective.context = "other".to_string();
        assert!(!perspective.verify());
    }

    #[test]
    fn test_distinct_from_data_address() {
        let p = Perspective::new("", "", "", "", 0);
        let d = crate::DataPayload::text("").address();
        assert_ne!(p.id, d);
    }
}
