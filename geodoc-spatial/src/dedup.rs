//! Reference-deduplicating key map for snapshot serialization.
//!
//! During one snapshot pass every collection that mentions a [`NodeKey`]
//! registers its keys here. Each distinct key is assigned a dense position
//! on first sight and keeps that position for the rest of the pass, so the
//! key itself is written to the stream exactly once.

use indexmap::IndexSet;

use crate::node_key::NodeKey;

/// Bidirectional map between node keys and dense stream positions, valid
/// for a single serialization pass.
#[derive(Debug, Default)]
pub struct KeyDedupMap {
    keys: IndexSet<NodeKey>,
}

impl KeyDedupMap {
    /// Creates an empty dedup map.
    pub fn new() -> Self {
        KeyDedupMap {
            keys: IndexSet::new(),
        }
    }

    /// Registers a key and returns its stable position. The first
    /// registration assigns the next free position; later registrations of
    /// the same key return the same position.
    pub fn position_of(&mut self, key: NodeKey) -> u32 {
        let (position, _) = self.keys.insert_full(key);
        position as u32
    }

    /// Looks up a key by its assigned position.
    pub fn get(&self, position: u32) -> Option<NodeKey> {
        self.keys.get_index(position as usize).copied()
    }

    /// Iterates over the distinct keys in first-assignment order.
    pub fn keys(&self) -> impl Iterator<Item = &NodeKey> {
        self.keys.iter()
    }

    /// Number of distinct keys registered so far.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Checks whether no key has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(position: u64) -> NodeKey {
        NodeKey::from_store_name("store-001", position).unwrap()
    }

    #[test]
    fn test_positions_are_stable_across_collections() {
        let a = key(1);
        let b = key(2);
        let c = key(3);

        let mut map = KeyDedupMap::new();

        // First contributing collection: [A, B, A]
        let first: Vec<u32> = [a, b, a].iter().map(|k| map.position_of(*k)).collect();
        assert_eq!(first, vec![0, 1, 0]);

        // Second contributing collection: [B, C]
        let second: Vec<u32> = [b, c].iter().map(|k| map.position_of(*k)).collect();
        assert_eq!(second, vec![1, 2]);

        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_first_assignment_order() {
        let mut map = KeyDedupMap::new();
        map.position_of(key(5));
        map.position_of(key(3));
        map.position_of(key(5));
        map.position_of(key(9));

        let ordered: Vec<NodeKey> = map.keys().copied().collect();
        assert_eq!(ordered, vec![key(5), key(3), key(9)]);
    }

    #[test]
    fn test_get_by_position() {
        let mut map = KeyDedupMap::new();
        let pos = map.position_of(key(7));
        assert_eq!(map.get(pos), Some(key(7)));
        assert_eq!(map.get(pos + 1), None);
    }

    #[test]
    fn test_empty() {
        let map = KeyDedupMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
    }
}
