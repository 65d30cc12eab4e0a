//! Bounded geometry cache and the memoized per-element transformation.
//!
//! The cache memoizes parsed geometries keyed by [`NodeKey`]. It is
//! strictly bounded: inserting beyond capacity evicts the least recently
//! used entry. Eviction is local to the cache; envelopes and spatial
//! indexes keep their entries regardless of what the cache drops.

use std::num::NonZeroUsize;

use lru::LruCache;
use once_cell::sync::OnceCell;

use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::CacheGeometry;
use crate::node_key::NodeKey;

/// Default capacity used when no explicit bound is configured.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Hit/miss counters of one cache generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Bounded LRU cache of parsed geometries.
pub struct GeometryCache {
    entries: LruCache<NodeKey, CacheGeometry>,
    stats: CacheStats,
}

impl GeometryCache {
    /// Creates a cache holding at most `capacity` geometries.
    pub fn new(capacity: usize) -> SpatialResult<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            SpatialError::Configuration("Geometry cache capacity must be positive".into())
        })?;
        Ok(GeometryCache {
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        })
    }

    /// Looks up a geometry, recording a hit or miss.
    pub fn get(&mut self, key: &NodeKey) -> Option<&CacheGeometry> {
        match self.entries.get(key) {
            Some(geometry) => {
                self.stats.hits += 1;
                Some(geometry)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Inserts or updates a geometry, evicting the least recently used
    /// entry when the cache is full.
    pub fn put(&mut self, key: NodeKey, geometry: CacheGeometry) {
        self.entries.put(key, geometry);
    }

    /// Replaces this cache with a fresh empty one of the given capacity,
    /// discarding all entries and counters.
    pub fn reset(&mut self, capacity: usize) -> SpatialResult<()> {
        *self = GeometryCache::new(capacity)?;
        Ok(())
    }

    /// Number of geometries currently cached.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The configured capacity bound.
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Hit/miss counters since the last reset.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Iterates over the cached entries, most recently used first.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeKey, &CacheGeometry)> {
        self.entries.iter()
    }
}

/// Lazily computed, memoized geometry transformation for one element.
///
/// The first caller computes and stores the outcome, success or failure;
/// concurrent callers block on the cell's internal guard and then observe
/// the stored outcome instead of recomputing.
#[derive(Debug, Default)]
pub struct MemoizedGeometry {
    cell: OnceCell<SpatialResult<CacheGeometry>>,
}

impl MemoizedGeometry {
    /// Creates an unfilled cell.
    pub fn new() -> Self {
        MemoizedGeometry {
            cell: OnceCell::new(),
        }
    }

    /// Returns the memoized outcome, computing it on first use.
    pub fn get_or_compute<F>(&self, compute: F) -> &SpatialResult<CacheGeometry>
    where
        F: FnOnce() -> SpatialResult<CacheGeometry>,
    {
        self.cell.get_or_init(compute)
    }

    /// Returns the outcome if it has been computed already.
    pub fn get(&self) -> Option<&SpatialResult<CacheGeometry>> {
        self.cell.get()
    }
}
