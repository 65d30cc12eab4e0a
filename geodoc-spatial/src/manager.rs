//! The geometry cache/index manager.
//!
//! One manager owns the three structures a validation pass works
//! against: the bounded geometry cache, the unbounded envelope map and
//! the named spatial indexes. The structures have independent lifetimes;
//! in particular, cache eviction never removes envelopes or index
//! entries.
//!
//! The manager follows the single-writer-per-document model: one thread
//! mutates it while evaluating a pass. Index builds and snapshot
//! read/write must not run concurrently with mutation; callers serialize
//! those phases externally.

use std::collections::HashMap;
use std::io::{Read, Write};

use crate::bounding_box::BoundingBox;
use crate::cache::{CacheStats, GeometryCache, DEFAULT_CACHE_CAPACITY};
use crate::errors::SpatialResult;
use crate::geometry::{CacheGeometry, IndexShape};
use crate::index::{IndexedShape, NamedIndexes};
use crate::node_key::NodeKey;
use crate::resolver::{NodeResolver, NodeStream};
use crate::snapshot;

/// Owner of the geometry cache, envelope map and named spatial indexes.
pub struct SpatialCacheManager {
    pub(crate) cache: GeometryCache,
    pub(crate) envelopes: HashMap<NodeKey, BoundingBox>,
    pub(crate) indexes: NamedIndexes,
}

impl SpatialCacheManager {
    /// Creates a manager with the default cache capacity.
    pub fn new() -> Self {
        // The default capacity is non-zero, so this cannot fail.
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
            .unwrap_or_else(|_| unreachable!("default cache capacity is valid"))
    }

    /// Creates a manager whose cache holds at most `capacity` geometries.
    pub fn with_capacity(capacity: usize) -> SpatialResult<Self> {
        Ok(SpatialCacheManager {
            cache: GeometryCache::new(capacity)?,
            envelopes: HashMap::new(),
            indexes: NamedIndexes::new(),
        })
    }

    pub(crate) fn from_cache(cache: GeometryCache) -> Self {
        SpatialCacheManager {
            cache,
            envelopes: HashMap::new(),
            indexes: NamedIndexes::new(),
        }
    }

    // ------------------------------------------------------------------
    // Geometry cache
    // ------------------------------------------------------------------

    /// Looks up a cached geometry, recording a hit or miss.
    pub fn get(&mut self, key: &NodeKey) -> Option<&CacheGeometry> {
        self.cache.get(key)
    }

    /// Inserts or updates a cached geometry, subject to LRU eviction.
    pub fn put(&mut self, key: NodeKey, geometry: CacheGeometry) {
        self.cache.put(key, geometry);
    }

    /// Atomically replaces the cache with a fresh empty one of the given
    /// capacity. Envelopes and indexes are untouched.
    pub fn reset(&mut self, capacity: usize) -> SpatialResult<()> {
        self.cache.reset(capacity)
    }

    /// Number of geometries currently cached.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// The cache's capacity bound.
    pub fn cache_capacity(&self) -> usize {
        self.cache.capacity()
    }

    /// Hit/miss counters of the current cache generation.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // ------------------------------------------------------------------
    // Envelope map
    // ------------------------------------------------------------------

    /// Looks up the envelope recorded for a node.
    pub fn envelope(&self, key: &NodeKey) -> Option<&BoundingBox> {
        self.envelopes.get(key)
    }

    /// Checks whether an envelope is recorded for a node.
    pub fn has_envelope(&self, key: &NodeKey) -> bool {
        self.envelopes.contains_key(key)
    }

    /// Records a node's envelope. The map is unbounded; nothing is ever
    /// evicted automatically.
    pub fn put_envelope(&mut self, key: NodeKey, bbox: BoundingBox) {
        self.envelopes.insert(key, bbox);
    }

    /// Number of recorded envelopes.
    pub fn envelope_count(&self) -> usize {
        self.envelopes.len()
    }

    // ------------------------------------------------------------------
    // Named spatial indexes
    // ------------------------------------------------------------------

    /// Inserts an entry into the live tree for `name`, creating one if
    /// absent.
    pub fn index(&mut self, name: &str, key: NodeKey, shape: IndexShape) {
        self.indexes.insert(name, key, shape);
    }

    /// Appends an entry to the staging list for `name`.
    pub fn stage(&mut self, name: &str, key: NodeKey, shape: IndexShape) {
        self.indexes.stage(name, key, shape);
    }

    /// Bulk-builds the staged entries for `name`.
    pub fn build(&mut self, name: &str) -> SpatialResult<()> {
        self.indexes.build(name)
    }

    /// Discards the built tree for `name`.
    pub fn remove_index(&mut self, name: &str) {
        self.indexes.remove(name);
    }

    /// Entry count for `name`, 0 if the name is unknown.
    pub fn index_size(&self, name: &str) -> usize {
        self.indexes.size(name)
    }

    /// Checks whether `name` has a built tree.
    pub fn is_built(&self, name: &str) -> bool {
        self.indexes.is_built(name)
    }

    /// Keys of every entry in the built tree for `name`.
    pub fn keys_all<'a>(&'a self, name: &str) -> impl Iterator<Item = NodeKey> + 'a {
        self.indexes.keys_all(name)
    }

    /// Keys of the entries intersecting `bbox` in the built tree for
    /// `name`.
    pub fn keys_intersecting<'a>(
        &'a self,
        name: &str,
        bbox: &BoundingBox,
    ) -> impl Iterator<Item = NodeKey> + 'a {
        self.indexes.keys_intersecting(name, bbox)
    }

    /// Resolves every entry of the index `name` into document nodes.
    ///
    /// The stream is lazy, finite and restartable: every call starts a
    /// fresh pass over the index. An unknown name yields an empty stream.
    pub fn query_all<'a, R: NodeResolver>(
        &self,
        name: &str,
        resolver: &'a R,
    ) -> NodeStream<'a, R> {
        NodeStream::new(resolver, self.indexes.keys_all(name).collect())
    }

    /// Resolves the entries of `name` whose shapes intersect `bbox`.
    ///
    /// Same contract as [`SpatialCacheManager::query_all`].
    pub fn query_intersecting<'a, R: NodeResolver>(
        &self,
        name: &str,
        bbox: &BoundingBox,
        resolver: &'a R,
    ) -> NodeStream<'a, R> {
        NodeStream::new(resolver, self.indexes.keys_intersecting(name, bbox).collect())
    }

    pub(crate) fn install_index(&mut self, name: String, entries: Vec<IndexedShape>) {
        self.indexes.install_built(name, entries);
    }

    // ------------------------------------------------------------------
    // Snapshot
    // ------------------------------------------------------------------

    /// Serializes the cache, envelope map and every built index into one
    /// deduplicating binary snapshot.
    pub fn write_snapshot<W: Write>(&self, writer: &mut W) -> SpatialResult<()> {
        snapshot::write_snapshot(self, writer)
    }

    /// Reconstructs a manager from a snapshot stream.
    pub fn read_snapshot<R: Read>(reader: &mut R) -> SpatialResult<Self> {
        snapshot::read_snapshot(reader)
    }
}

impl Default for SpatialCacheManager {
    fn default() -> Self {
        Self::new()
    }
}
