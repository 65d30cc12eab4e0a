//! Deduplicating binary snapshot of the cache/index manager.
//!
//! One snapshot captures the geometry cache, the envelope map and every
//! *built* named index as a single blob. Node keys are deduplicated: the
//! body sections carry dense positions assigned by a [`KeyDedupMap`], and
//! the distinct keys themselves are written once, at the end of the
//! stream, in first-assignment order.
//!
//! Because the positions precede the key list, the reader buffers every
//! section before it can resolve anything. That is a deliberate
//! single-pass-dedup trade-off of the wire format, and the reader is
//! built around it: [`SnapshotReader`] refuses to resolve positions until
//! the reference section has been parsed.
//!
//! Wire layout (big-endian, length-prefixed UTF-8 strings):
//!
//! ```text
//! i32 geomCount,  geomCount × [i32 pos, geometry]
//! i32 envCount,   envCount  × [i32 pos, f64 minx, maxx, miny, maxy]
//! i32 idxNameCount, idxNameCount × [utf name, i32 entryCount,
//!                                    entryCount × [i32 pos, shape]]
//! i32 distinctRefCount, distinctRefCount × i64 rawKey
//! ```

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::bounding_box::BoundingBox;
use crate::cache::{GeometryCache, DEFAULT_CACHE_CAPACITY};
use crate::codec;
use crate::dedup::KeyDedupMap;
use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::{CacheGeometry, IndexShape};
use crate::index::IndexedShape;
use crate::manager::SpatialCacheManager;
use crate::node_key::NodeKey;

/// Writes a snapshot of `manager` to `writer`.
///
/// Staged-only (unbuilt) indexes are not persisted. Any failure aborts
/// the whole write; the stream is then unusable.
pub fn write_snapshot<W: Write>(
    manager: &SpatialCacheManager,
    writer: &mut W,
) -> SpatialResult<()> {
    let mut dedup = KeyDedupMap::new();

    // Cache section.
    codec::write_count(writer, manager.cache.len())?;
    for (key, geometry) in manager.cache.iter() {
        writer.write_i32::<BigEndian>(dedup.position_of(*key) as i32)?;
        codec::encode_geometry(writer, geometry)?;
    }

    // Envelope section.
    codec::write_count(writer, manager.envelopes.len())?;
    for (key, bbox) in &manager.envelopes {
        writer.write_i32::<BigEndian>(dedup.position_of(*key) as i32)?;
        writer.write_f64::<BigEndian>(bbox.min_x)?;
        writer.write_f64::<BigEndian>(bbox.max_x)?;
        writer.write_f64::<BigEndian>(bbox.min_y)?;
        writer.write_f64::<BigEndian>(bbox.max_y)?;
    }

    // Built index sections.
    let names: Vec<&str> = manager.indexes.built_names().collect();
    codec::write_count(writer, names.len())?;
    for name in names {
        codec::write_utf(writer, name)?;
        codec::write_count(writer, manager.indexes.size(name))?;
        for entry in manager.indexes.built_entries(name) {
            writer.write_i32::<BigEndian>(dedup.position_of(entry.key) as i32)?;
            codec::encode_shape(writer, &entry.shape)?;
        }
    }

    // Distinct references, in first-assignment order.
    codec::write_count(writer, dedup.len())?;
    for key in dedup.keys() {
        writer.write_i64::<BigEndian>(key.as_raw())?;
    }

    log::debug!(
        "Snapshot written: {} cached geometries, {} envelopes, {} distinct keys",
        manager.cache.len(),
        manager.envelopes.len(),
        dedup.len()
    );
    Ok(())
}

/// Reads a snapshot and reconstructs a manager from it.
///
/// The cache is freshly sized to hold every restored geometry, with the
/// default capacity as a floor, and each restored index is bulk-built
/// from its resolved entries.
pub fn read_snapshot<R: Read>(reader: &mut R) -> SpatialResult<SpatialCacheManager> {
    let mut snapshot = SnapshotReader::new(reader);
    snapshot.read_geometries()?;
    snapshot.read_envelopes()?;
    snapshot.read_indexes()?;
    snapshot.read_refs()?;
    snapshot.into_manager()
}

/// Buffering reader over the snapshot wire format.
///
/// Sections must be read in stream order; position resolution is only
/// possible after [`SnapshotReader::read_refs`].
pub(crate) struct SnapshotReader<'a, R: Read> {
    reader: &'a mut R,
    geometries: Vec<(i32, CacheGeometry)>,
    envelopes: Vec<(i32, BoundingBox)>,
    indexes: Vec<(String, Vec<(i32, IndexShape)>)>,
    refs: Option<Vec<NodeKey>>,
}

impl<'a, R: Read> SnapshotReader<'a, R> {
    pub(crate) fn new(reader: &'a mut R) -> Self {
        SnapshotReader {
            reader,
            geometries: Vec::new(),
            envelopes: Vec::new(),
            indexes: Vec::new(),
            refs: None,
        }
    }

    /// Buffers the cache section.
    pub(crate) fn read_geometries(&mut self) -> SpatialResult<()> {
        let count = codec::read_count(self.reader)?;
        self.geometries.reserve(count.min(4096));
        for _ in 0..count {
            let position = self.reader.read_i32::<BigEndian>()?;
            let geometry = codec::decode_geometry(self.reader)?;
            self.geometries.push((position, geometry));
        }
        Ok(())
    }

    /// Buffers the envelope section.
    pub(crate) fn read_envelopes(&mut self) -> SpatialResult<()> {
        let count = codec::read_count(self.reader)?;
        self.envelopes.reserve(count.min(4096));
        for _ in 0..count {
            let position = self.reader.read_i32::<BigEndian>()?;
            let min_x = self.reader.read_f64::<BigEndian>()?;
            let max_x = self.reader.read_f64::<BigEndian>()?;
            let min_y = self.reader.read_f64::<BigEndian>()?;
            let max_y = self.reader.read_f64::<BigEndian>()?;
            self.envelopes
                .push((position, BoundingBox::new(min_x, max_x, min_y, max_y)));
        }
        Ok(())
    }

    /// Buffers every named index section.
    pub(crate) fn read_indexes(&mut self) -> SpatialResult<()> {
        let name_count = codec::read_count(self.reader)?;
        for _ in 0..name_count {
            let name = codec::read_utf(self.reader)?;
            let entry_count = codec::read_count(self.reader)?;
            let mut entries = Vec::with_capacity(entry_count.min(4096));
            for _ in 0..entry_count {
                let position = self.reader.read_i32::<BigEndian>()?;
                let shape = codec::decode_shape(self.reader)?;
                entries.push((position, shape));
            }
            self.indexes.push((name, entries));
        }
        Ok(())
    }

    /// Reads the ordered distinct-key list that resolves all buffered
    /// positions.
    pub(crate) fn read_refs(&mut self) -> SpatialResult<()> {
        let count = codec::read_count(self.reader)?;
        let mut refs = Vec::with_capacity(count.min(65_536));
        for _ in 0..count {
            refs.push(NodeKey::from_raw(self.reader.read_i64::<BigEndian>()?));
        }
        self.refs = Some(refs);
        Ok(())
    }

    /// Resolves a buffered position against the reference list.
    pub(crate) fn resolve(&self, position: i32) -> SpatialResult<NodeKey> {
        let refs = self.refs.as_ref().ok_or_else(|| {
            SpatialError::State(
                "Snapshot positions consulted before the reference section was parsed".into(),
            )
        })?;
        usize::try_from(position)
            .ok()
            .and_then(|index| refs.get(index))
            .copied()
            .ok_or_else(|| {
                SpatialError::corrupt(format!(
                    "Snapshot position {} outside the reference list of {} keys",
                    position,
                    refs.len()
                ))
            })
    }

    /// Resolves everything buffered into a fresh manager.
    pub(crate) fn into_manager(self) -> SpatialResult<SpatialCacheManager> {
        let capacity = self.geometries.len().max(DEFAULT_CACHE_CAPACITY);
        let mut cache = GeometryCache::new(capacity)?;
        // Restore in reverse so the entry written first (most recently
        // used at write time) ends up most recently used again.
        for (position, geometry) in self.geometries.iter().rev() {
            cache.put(self.resolve(*position)?, geometry.clone());
        }

        let mut manager = SpatialCacheManager::from_cache(cache);
        for (position, bbox) in &self.envelopes {
            manager.put_envelope(self.resolve(*position)?, bbox.clone());
        }

        for (name, entries) in &self.indexes {
            let mut resolved = Vec::with_capacity(entries.len());
            for (position, shape) in entries {
                resolved.push(IndexedShape::new(self.resolve(*position)?, *shape));
            }
            manager.install_index(name.clone(), resolved);
        }

        log::debug!(
            "Snapshot restored: {} cached geometries, {} envelopes, {} indexes",
            manager.cache.len(),
            manager.envelopes.len(),
            self.indexes.len()
        );
        Ok(manager)
    }
}
