//! Immutable content objects

use serde::{Deserialize, Serialize};

use crate::address::{ContentAddress, hash_field};

/// Payload of a content object
///
/// The set of variants is closed: every consumer matches exhaustively, so a
/// new variant is a deliberate, compile-checked extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataPayload {
    /// Leaf text, no links
    Text { text: String },
    /// Text with ordered links to child objects (document order)
    TextNode {
        text: String,
        links: Vec<ContentAddress>,
    },
}

impl DataPayload {
    /// Create a text leaf
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a text node linking to `links` in order
    pub fn text_node(text: impl Into<String>, links: Vec<ContentAddress>) -> Self {
        Self::TextNode {
            text: text.into(),
            links,
        }
    }

    /// The text carried by either variant
    pub fn text_value(&self) -> &str {
        match self {
            Self::Text { text } | Self::TextNode { text, .. } => text,
        }
    }

    /// Compute the content address of this payload
    pub fn address(&self) -> ContentAddress {
        let mut hasher = blake3::Hasher::new();
        match self {
            Self::Text { text } => {
                hash_field(&mut hasher, b"TEXT");
                hash_field(&mut hasher, text.as_bytes());
            }
            Self::TextNode { text, links } => {
                hash_field(&mut hasher, b"TEXT_NODE");
                hash_field(&mut hasher, text.as_bytes());
                hasher.update(&(links.len() as u64).to_le_bytes());
                for link in links {
                    hash_field(&mut hasher, link.as_str().as_bytes());
                }
            }
        }
        ContentAddress::from_hasher(&hasher)
    }
}

/// A content object together with its address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    pub id: ContentAddress,
    pub payload: DataPayload,
}

impl Data {
    /// Wrap a payload, computing its address
    pub fn new(payload: DataPayload) -> Self {
        Self {
            id: payload.address(),
            payload,
        }
    }

    /// Text of the object
    pub fn text(&self) -> &str {
        self.payload.text_value()
    }

    /// Whether `id` matches the address recomputed from the payload
    pub fn verify(&self) -> bool {
        self.payload.address() == self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_payload_identical_address() {
        let a = Data::new(DataPayload::text("a paragraph 1"));
        let b = Data::new(DataPayload::text("a paragraph 1"));
        assert_eq!(a.id, b.id);

        let c = Data::new(DataPayload::text("a paragraph 2"));
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_variant_is_part_of_address() {
        let leaf = DataPayload::text("title");
        let node = DataPayload::text_node("title", vec![]);
        assert_ne!(leaf.address(), node.address());
    }

    #[test]
    fn test_link_order_changes_address() {
        let a = ContentAddress::new("a");
        let b = ContentAddress::new("b");
        let ab = DataPayload::text_node("t", vec![a.clone(), b.clone()]);
        let ba = DataPayload::text_node("t", vec![b, a]);
        assert_ne!(ab.address(), ba.address());
    }

    #[test]
    fn test_verify() {
        let mut data = Data::new(DataPayload::text("original"));
        assert!(data.verify());

        data.payload = DataPayload::text("tampered");
        assert!(!data.verify());
    }

    #[test]
    fn test_json_shape() {
        let data = Data::new(DataPayload::text_node("a title", vec![ContentAddress::new("x")]));
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["payload"]["TEXT_NODE"]["text"], "a title");
        assert_eq!(json["payload"]["TEXT_NODE"]["links"][0], "x");
    }
}
