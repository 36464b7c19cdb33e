//! Resolution result types

use std::collections::HashMap;

use evees_core::{ContentAddress, Data, Perspective};
use serde::{Serialize, Serializer};

use crate::error::{DanglingLink, ResolveError};

/// An address, with its body when entities are inlined
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Resolved {
    Entity(Data),
    Address(ContentAddress),
}

impl Resolved {
    pub fn address(&self) -> &ContentAddress {
        match self {
            Self::Entity(data) => &data.id,
            Self::Address(address) => address,
        }
    }

    /// The body, if it was inlined
    pub fn data(&self) -> Option<&Data> {
        match self {
            Self::Entity(data) => Some(data),
            Self::Address(_) => None,
        }
    }
}

/// Objects reached from the head, keyed by address
///
/// Entries are kept in an arena in discovery order (breadth-first, links in
/// document order) with an address-to-slot index. Each address appears once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkedEntities {
    entries: Vec<Resolved>,
    slots: HashMap<ContentAddress, usize>,
}

impl LinkedEntities {
    /// Add an entry; returns false if the address was already present
    pub(crate) fn insert(&mut self, entry: Resolved) -> bool {
        if self.slots.contains_key(entry.address()) {
            return false;
        }
        self.slots.insert(entry.address().clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    /// Entry for an address
    pub fn entry(&self, address: &ContentAddress) -> Option<&Resolved> {
        self.slots.get(address).map(|&slot| &self.entries[slot])
    }

    /// Inlined body for an address
    pub fn get(&self, address: &ContentAddress) -> Option<&Data> {
        self.entry(address).and_then(Resolved::data)
    }

    pub fn contains(&self, address: &ContentAddress) -> bool {
        self.slots.contains_key(address)
    }

    /// Addresses in discovery order
    pub fn addresses(&self) -> impl Iterator<Item = &ContentAddress> {
        self.entries.iter().map(Resolved::address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resolved> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for LinkedEntities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

/// The head and everything expanded from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedGraph {
    pub head: Resolved,
    /// Objects at depth `1..=levels`, excluding the head
    pub linked: LinkedEntities,
    /// Links that pointed at absent objects
    pub dangling: Vec<DanglingLink>,
}

impl ResolvedGraph {
    /// Whether any link failed to resolve
    pub fn is_partial(&self) -> bool {
        !self.dangling.is_empty()
    }
}

/// A perspective's metadata together with its resolved graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    pub perspective: Perspective,
    #[serde(flatten)]
    pub graph: ResolvedGraph,
}

/// One slot of an `explore` batch
///
/// Failures resolving this perspective stay in this slot.
#[derive(Debug, Clone)]
pub struct ExploreHit {
    pub perspective: Perspective,
    pub outcome: Result<ResolutionResult, ResolveError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use evees_core::DataPayload;

    #[test]
    fn test_linked_entities_dedup_and_order() {
        let a = Data::new(DataPayload::text("a"));
        let b = Data::new(DataPayload::text("b"));

        let mut linked = LinkedEntities::default();
        assert!(linked.insert(Resolved::Entity(b.clone())));
        assert!(linked.insert(Resolved::Address(a.id.clone())));
        assert!(!linked.insert(Resolved::Entity(b.clone())));
        assert!(!linked.insert(Resolved::Entity(a.clone())));

        assert_eq!(linked.len(), 2);
        let order: Vec<_> = linked.addresses().cloned().collect();
        assert_eq!(order, vec![b.id.clone(), a.id.clone()]);
        assert_eq!(linked.get(&b.id), Some(&b));
        assert!(linked.contains(&a.id));
        assert_eq!(linked.get(&a.id), None);
    }

    #[test]
    fn test_serialized_shape() {
        let data = Data::new(DataPayload::text("body"));
        let mut linked = LinkedEntities::default();
        linked.insert(Resolved::Entity(data.clone()));
        linked.insert(Resolved::Address(ContentAddress::new("bare")));

        let json = serde_json::to_value(&linked).unwrap();
        assert_eq!(json[0]["id"], data.id.as_str());
        assert_eq!(json[1], "bare");
    }
}
