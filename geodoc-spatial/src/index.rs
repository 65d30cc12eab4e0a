//! Named spatial indexes over node keys.
//!
//! Each index name holds at most one of two representations at a time: an
//! append-only *staging list* of `(key, shape)` pairs, or a *built*
//! R-tree. Staged entries become queryable only after [`NamedIndexes::build`],
//! which loads the whole batch in one bulk pass; bulk loading produces a
//! better balanced tree than repeated incremental insertion.
//!
//! Operations on one name are not synchronized against each other. The
//! caller sequences build-before-query and must not stage and build the
//! same name concurrently.

use std::collections::HashMap;

use rstar::{RTree, RTreeObject, AABB};

use crate::bounding_box::BoundingBox;
use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::IndexShape;
use crate::node_key::NodeKey;

/// One spatial index entry: a node key plus its bounding shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedShape {
    pub key: NodeKey,
    pub shape: IndexShape,
}

impl IndexedShape {
    /// Creates an index entry.
    pub fn new(key: NodeKey, shape: IndexShape) -> Self {
        IndexedShape { key, shape }
    }
}

impl RTreeObject for IndexedShape {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.shape.to_aabb()
    }
}

/// The set of named spatial indexes, staged or built.
#[derive(Default)]
pub struct NamedIndexes {
    built: HashMap<String, RTree<IndexedShape>>,
    staged: HashMap<String, Vec<IndexedShape>>,
}

impl NamedIndexes {
    /// Creates an empty index set.
    pub fn new() -> Self {
        NamedIndexes::default()
    }

    /// Inserts an entry directly into the live tree for `name`, creating
    /// an empty tree first if the name is unknown. This is the incremental
    /// growth path; no build step is required afterwards.
    pub fn insert(&mut self, name: &str, key: NodeKey, shape: IndexShape) {
        self.built
            .entry(name.to_string())
            .or_default()
            .insert(IndexedShape::new(key, shape));
    }

    /// Appends an entry to the staging list for `name`. An already-built
    /// tree under the same name is not affected.
    pub fn stage(&mut self, name: &str, key: NodeKey, shape: IndexShape) {
        self.staged
            .entry(name.to_string())
            .or_default()
            .push(IndexedShape::new(key, shape));
    }

    /// Bulk-builds the tree for `name` from its staged entries and
    /// discards the staging list. Fails if the name already has a built
    /// tree; does nothing if nothing is staged.
    pub fn build(&mut self, name: &str) -> SpatialResult<()> {
        if self.built.contains_key(name) {
            return Err(SpatialError::AlreadyBuilt(name.to_string()));
        }
        if let Some(entries) = self.staged.remove(name) {
            log::debug!("Bulk-building spatial index '{}' with {} entries", name, entries.len());
            self.built.insert(name.to_string(), RTree::bulk_load(entries));
        }
        Ok(())
    }

    /// Discards the built tree for `name`. Staged entries, if any, are
    /// untouched.
    pub fn remove(&mut self, name: &str) {
        if self.built.remove(name).is_some() {
            log::debug!("Removed spatial index '{}'", name);
        }
    }

    /// Entry count of `name`: the built tree's size, otherwise the staged
    /// list's length, otherwise 0.
    pub fn size(&self, name: &str) -> usize {
        if let Some(tree) = self.built.get(name) {
            return tree.size();
        }
        self.staged.get(name).map_or(0, Vec::len)
    }

    /// Iterates over every key in the built tree for `name`. Unknown or
    /// unbuilt names yield an empty sequence; every call starts over.
    pub fn keys_all<'a>(&'a self, name: &str) -> impl Iterator<Item = NodeKey> + 'a {
        self.built
            .get(name)
            .into_iter()
            .flat_map(|tree| tree.iter().map(|entry| entry.key))
    }

    /// Iterates over the keys of entries whose shapes intersect `bbox`.
    /// Unknown or unbuilt names yield an empty sequence; every call starts
    /// over.
    pub fn keys_intersecting<'a>(
        &'a self,
        name: &str,
        bbox: &BoundingBox,
    ) -> impl Iterator<Item = NodeKey> + 'a {
        let query = bbox.to_aabb();
        self.built.get(name).into_iter().flat_map(move |tree| {
            tree.locate_in_envelope_intersecting(&query)
                .map(|entry| entry.key)
        })
    }

    /// Names of the built indexes, in no particular order.
    pub fn built_names(&self) -> impl Iterator<Item = &str> {
        self.built.keys().map(String::as_str)
    }

    /// Entries of the built tree for `name`.
    pub(crate) fn built_entries<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = &'a IndexedShape> + 'a {
        self.built.get(name).into_iter().flat_map(|tree| tree.iter())
    }

    /// Installs a tree bulk-loaded elsewhere, e.g. by the snapshot reader.
    pub(crate) fn install_built(&mut self, name: String, entries: Vec<IndexedShape>) {
        self.built.insert(name, RTree::bulk_load(entries));
    }

    /// Checks whether `name` has a built tree.
    pub fn is_built(&self, name: &str) -> bool {
        self.built.contains_key(name)
    }
}
