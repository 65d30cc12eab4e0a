//! # GeoDoc Spatial - Geometry Cache and Spatial Indexing for GeoDoc
//!
//! This crate provides the geometry subsystem of the GeoDoc document
//! validation engine: a bounded geometry cache, per-node envelopes,
//! named R-tree indexes and a deduplicating binary snapshot of all
//! three.
//!
//! ## Features
//!
//! - **Node Keys**: Compact `(store, position)` handles that pack into
//!   a single `i64`
//! - **LRU Geometry Cache**: Bounded cache with hit/miss statistics
//! - **Named Spatial Indexes**: R-trees built incrementally or by bulk
//!   loading a staged batch
//! - **Binary Snapshots**: One deduplicated stream for the cache, the
//!   envelope map and every built index
//! - **Curve Linearization**: Chord-error-bounded arc flattening with
//!   orientation normalization
//! - **Node Resolution**: Lazy query streams and a worker-pool batch
//!   drain against the document store
//!
//! ## Quick Start
//!
//! ```rust
//! use geodoc_spatial::{BoundingBox, CacheGeometry, IndexShape, SpatialCacheManager};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manager = SpatialCacheManager::new();
//! let key = geodoc_spatial::NodeKey::from_store_name("parcels-001", 42)?;
//!
//! manager.put(key, CacheGeometry::point(10.0, 20.0, 0.0));
//! manager.stage("parcels", key, IndexShape::point(10.0, 20.0));
//! manager.build("parcels")?;
//!
//! let query = BoundingBox::new(0.0, 100.0, 0.0, 100.0);
//! let hits: Vec<_> = manager.keys_intersecting("parcels", &query).collect();
//! assert_eq!(hits, vec![key]);
//! # Ok(())
//! # }
//! ```

pub mod bounding_box;
pub mod cache;
pub mod codec;
pub mod curve;
pub mod dedup;
pub mod errors;
pub mod geometry;
pub mod index;
pub mod manager;
pub mod node_key;
pub mod resolver;
pub mod snapshot;

pub use bounding_box::BoundingBox;
pub use cache::{CacheStats, GeometryCache, MemoizedGeometry, DEFAULT_CACHE_CAPACITY};
pub use codec::{decode_geometry, decode_shape, encode_geometry, encode_shape};
pub use curve::{
    classify_orientation, ArcLinearizer, ChordArcLinearizer, CurveLinearizer, CurveSegment,
    Orientation, MAX_ARC_STEPS,
};
pub use dedup::KeyDedupMap;
pub use errors::{SpatialError, SpatialResult};
pub use geometry::{CacheGeometry, Coord, IndexShape, PolygonRings};
pub use index::{IndexedShape, NamedIndexes};
pub use manager::SpatialCacheManager;
pub use node_key::NodeKey;
pub use resolver::{resolve_batch, NodeResolver, NodeStream};
