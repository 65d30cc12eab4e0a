//! Flyweight handles for document-store nodes.
//!
//! A [`NodeKey`] identifies one node inside one document store without
//! holding a reference to the node itself. Keys are created through the
//! store-name factory and are never mutated; equality and hashing follow
//! the packed native encoding, so a key can be used as a cache or index
//! key and round-tripped through a snapshot.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::errors::{SpatialError, SpatialResult};

/// Number of bits reserved for the node position within the packed value.
const POSITION_BITS: u32 = 48;

/// Largest node position a key can carry.
pub const MAX_POSITION: u64 = (1 << POSITION_BITS) - 1;

/// Flyweight identifier for a document node: the index of its store plus
/// the node's native position inside that store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    store_index: u16,
    position: u64,
}

impl NodeKey {
    /// Creates a key from a store name and a native node position.
    ///
    /// The store name must end in exactly three ASCII digits; those digits
    /// decode to the store index. A fourth trailing digit, a too-short name
    /// or a position that does not fit in 48 bits is a configuration error.
    pub fn from_store_name(store_name: &str, position: u64) -> SpatialResult<Self> {
        let store_index = parse_store_index(store_name)?;
        if position > MAX_POSITION {
            return Err(SpatialError::Configuration(format!(
                "Node position {} exceeds the maximum of {}",
                position, MAX_POSITION
            )));
        }
        Ok(NodeKey {
            store_index,
            position,
        })
    }

    /// Gets the index of the store this key belongs to.
    pub fn store_index(&self) -> u16 {
        self.store_index
    }

    /// Gets the native node position within the store.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Packs this key into its native 64-bit encoding: store index in the
    /// top 16 bits, position in the low 48.
    pub fn as_raw(&self) -> i64 {
        (((self.store_index as u64) << POSITION_BITS) | self.position) as i64
    }

    /// Rebuilds a key from its packed native encoding.
    pub fn from_raw(raw: i64) -> Self {
        let raw = raw as u64;
        NodeKey {
            store_index: (raw >> POSITION_BITS) as u16,
            position: raw & MAX_POSITION,
        }
    }
}

impl Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeKey({}:{})", self.store_index, self.position)
    }
}

/// Parses the store index from the mandatory three-digit name suffix.
fn parse_store_index(store_name: &str) -> SpatialResult<u16> {
    let bytes = store_name.as_bytes();
    if bytes.len() < 3 {
        return Err(SpatialError::Configuration(format!(
            "Store name '{}' is too short for a three-digit suffix",
            store_name
        )));
    }

    let suffix = &bytes[bytes.len() - 3..];
    if !suffix.iter().all(|b| b.is_ascii_digit()) {
        return Err(SpatialError::Configuration(format!(
            "Store name '{}' does not end in three ASCII digits",
            store_name
        )));
    }

    // Exactly three digits: a fourth trailing digit is a misnamed store.
    if bytes.len() > 3 && bytes[bytes.len() - 4].is_ascii_digit() {
        return Err(SpatialError::Configuration(format!(
            "Store name '{}' ends in more than three digits",
            store_name
        )));
    }

    let index = (suffix[0] - b'0') as u16 * 100
        + (suffix[1] - b'0') as u16 * 10
        + (suffix[2] - b'0') as u16;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_factory_decodes_suffix() {
        let key = NodeKey::from_store_name("mystore-007", 42).unwrap();
        assert_eq!(key.store_index(), 7);
        assert_eq!(key.position(), 42);
    }

    #[test]
    fn test_factory_three_digit_name() {
        let key = NodeKey::from_store_name("123", 0).unwrap();
        assert_eq!(key.store_index(), 123);
    }

    #[test]
    fn test_factory_rejects_short_name() {
        let result = NodeKey::from_store_name("ab", 0);
        assert!(matches!(result, Err(SpatialError::Configuration(_))));
    }

    #[test]
    fn test_factory_rejects_non_digit_suffix() {
        let result = NodeKey::from_store_name("mystore-0a7", 0);
        assert!(matches!(result, Err(SpatialError::Configuration(_))));
    }

    #[test]
    fn test_factory_rejects_four_digit_suffix() {
        let result = NodeKey::from_store_name("mystore-0007", 0);
        assert!(matches!(result, Err(SpatialError::Configuration(_))));
    }

    #[test]
    fn test_factory_rejects_oversized_position() {
        let result = NodeKey::from_store_name("mystore-001", MAX_POSITION + 1);
        assert!(matches!(result, Err(SpatialError::Configuration(_))));
    }

    #[test]
    fn test_raw_round_trip() {
        let key = NodeKey::from_store_name("parcels-999", MAX_POSITION).unwrap();
        let restored = NodeKey::from_raw(key.as_raw());
        assert_eq!(key, restored);
        assert_eq!(restored.store_index(), 999);
        assert_eq!(restored.position(), MAX_POSITION);
    }

    #[test]
    fn test_equality_by_encoded_value() {
        let a = NodeKey::from_store_name("roads-001", 5).unwrap();
        let b = NodeKey::from_raw(a.as_raw());
        let c = NodeKey::from_store_name("roads-001", 6).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn test_display() {
        let key = NodeKey::from_store_name("rivers-042", 17).unwrap();
        assert_eq!(format!("{}", key), "NodeKey(42:17)");
    }
}
