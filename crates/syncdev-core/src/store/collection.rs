// ── Keyed entity list ──
//
// Immutable, insertion-ordered set of entities keyed by their id. A new
// list is built for every backend push and swapped into its cell whole.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::CoreError;

/// An entity with a stable identity.
pub trait Keyed {
    type Key: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Human-readable entity kind, used in error messages.
    const KIND: &'static str;

    fn key(&self) -> &Self::Key;
}

/// Insertion-ordered set of entities with O(1) lookups by key.
///
/// Duplicate keys are rejected at construction, so a list can never hold
/// two entries for the same id.
pub struct KeyedList<T: Keyed> {
    items: IndexMap<T::Key, Arc<T>>,
}

impl<T: Keyed> KeyedList<T> {
    pub fn new() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }

    /// Build a list from backend-ordered items, failing on the first
    /// duplicate key.
    pub fn try_from_vec(items: Vec<T>) -> Result<Self, CoreError> {
        let mut map = IndexMap::with_capacity(items.len());
        for item in items {
            let key = item.key().clone();
            if map.contains_key(&key) {
                return Err(CoreError::DuplicateKey {
                    kind: T::KIND,
                    key: key.to_string(),
                });
            }
            map.insert(key, Arc::new(item));
        }
        Ok(Self { items: map })
    }

    pub fn get(&self, key: &T::Key) -> Option<&Arc<T>> {
        self.items.get(key)
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.items.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &T::Key> {
        self.items.keys()
    }

    /// A new list holding only the entries matching `pred`, order kept.
    pub fn filtered(&self, pred: impl Fn(&T) -> bool) -> Self {
        let items = self
            .items
            .iter()
            .filter(|(_, v)| pred(v))
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect();
        Self { items }
    }
}

impl<T: Keyed> Default for KeyedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Keyed> Clone for KeyedList<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<T: Keyed + fmt::Debug> fmt::Debug for KeyedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.values()).finish()
    }
}

/// Order-sensitive: two lists are equal when they hold equal entities in
/// the same order.
impl<T: Keyed + PartialEq> PartialEq for KeyedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .zip(other.items.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && (Arc::ptr_eq(va, vb) || va == vb))
    }
}

impl<T: Keyed + Serialize> Serialize for KeyedList<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.values().map(AsRef::as_ref))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Peer, PeerSet, PeerStatus};

    fn peer(id: &str, status: PeerStatus) -> Peer {
        Peer::new(id, format!("peer {id}"), status)
    }

    #[test]
    fn keeps_backend_order() {
        let set = PeerSet::try_from_vec(vec![
            peer("b", PeerStatus::Online),
            peer("a", PeerStatus::Offline),
        ])
        .unwrap();
        let ids: Vec<&str> = set.keys().map(|k| k.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = PeerSet::try_from_vec(vec![
            peer("a", PeerStatus::Online),
            peer("a", PeerStatus::Offline),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            CoreError::DuplicateKey {
                kind: "peer",
                key: "a".into()
            }
        );
    }

    #[test]
    fn lookup_by_key() {
        let set = PeerSet::try_from_vec(vec![peer("a", PeerStatus::Online)]).unwrap();
        assert!(set.contains(&"a".into()));
        assert_eq!(set.get(&"a".into()).unwrap().name, "peer a");
        assert!(set.get(&"z".into()).is_none());
    }

    #[test]
    fn filtered_keeps_matching_entries() {
        let set = PeerSet::try_from_vec(vec![
            peer("a", PeerStatus::Online),
            peer("b", PeerStatus::Offline),
            peer("c", PeerStatus::Syncing),
        ])
        .unwrap();
        let reachable = set.filtered(|p| p.status.is_reachable());
        assert_eq!(reachable.len(), 2);
        assert!(!reachable.contains(&"b".into()));
    }

    #[test]
    fn equality_is_order_sensitive() {
        let ab = PeerSet::try_from_vec(vec![
            peer("a", PeerStatus::Online),
            peer("b", PeerStatus::Online),
        ])
        .unwrap();
        let ba = PeerSet::try_from_vec(vec![
            peer("b", PeerStatus::Online),
            peer("a", PeerStatus::Online),
        ])
        .unwrap();
        assert_eq!(ab, ab.clone());
        assert_ne!(ab, ba);
    }
}
