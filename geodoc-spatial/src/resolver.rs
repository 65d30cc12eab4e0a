//! Node resolution against the document store.
//!
//! The document store itself is an external collaborator; this module
//! only defines the capability ([`NodeResolver`]) plus two consumption
//! patterns: a lazy per-key stream ([`NodeStream`]) used by index
//! queries, and a blocking worker-pool drain ([`resolve_batch`]) for
//! resolving a whole key set at once. The batch drain blocks the caller
//! until every key is resolved or a resolver error ends the pass; there
//! is no mid-resolution cancellation.

use crossbeam_channel::bounded;

use crate::errors::SpatialResult;
use crate::node_key::NodeKey;

/// Resolves a node key to a live document node.
pub trait NodeResolver {
    /// The document node type produced by the store.
    type Node;

    /// Resolves `key`, returning `None` when the store no longer holds
    /// the node.
    fn resolve(&self, key: NodeKey) -> SpatialResult<Option<Self::Node>>;
}

/// Lazy stream of resolved document nodes over a fixed key set.
///
/// Keys that no longer resolve are skipped with a warning; resolver
/// errors are surfaced as stream items. A fresh stream over the same
/// keys restarts from the beginning.
pub struct NodeStream<'a, R: NodeResolver> {
    resolver: &'a R,
    keys: Vec<NodeKey>,
    current: usize,
}

impl<'a, R: NodeResolver> NodeStream<'a, R> {
    /// Creates a stream resolving `keys` in order.
    pub fn new(resolver: &'a R, keys: Vec<NodeKey>) -> Self {
        NodeStream {
            resolver,
            keys,
            current: 0,
        }
    }

    /// Number of keys the stream will visit in total.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

impl<'a, R: NodeResolver> Iterator for NodeStream<'a, R> {
    type Item = SpatialResult<R::Node>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current >= self.keys.len() {
                return None;
            }

            let key = self.keys[self.current];
            self.current += 1;

            match self.resolver.resolve(key) {
                Ok(Some(node)) => return Some(Ok(node)),
                Ok(None) => {
                    log::warn!("Node {} vanished from its store during query", key);
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Resolves a batch of keys through a pool of `workers` threads,
/// blocking until the whole batch is drained.
///
/// Keys are fed through a bounded channel and results are drained with a
/// blocking receive loop. The first resolver error ends collection and
/// propagates; remaining in-flight resolutions finish on their workers
/// but are discarded.
pub fn resolve_batch<R>(resolver: &R, keys: &[NodeKey], workers: usize) -> SpatialResult<Vec<R::Node>>
where
    R: NodeResolver + Sync,
    R::Node: Send,
{
    if keys.is_empty() {
        return Ok(Vec::new());
    }

    let workers = workers.max(1).min(keys.len());
    let (key_tx, key_rx) = bounded::<NodeKey>(workers * 2);
    let (out_tx, out_rx) = bounded::<SpatialResult<Option<R::Node>>>(workers * 2);

    // The channel ends move into the scope so they disconnect before the
    // implicit join, even when an error ends the drain early.
    std::thread::scope(move |scope| {
        for _ in 0..workers {
            let key_rx = key_rx.clone();
            let out_tx = out_tx.clone();
            scope.spawn(move || {
                for key in key_rx.iter() {
                    if out_tx.send(resolver.resolve(key)).is_err() {
                        // The draining side gave up; stop resolving.
                        break;
                    }
                }
            });
        }
        drop(key_rx);
        drop(out_tx);

        scope.spawn(move || {
            for key in keys {
                if key_tx.send(*key).is_err() {
                    break;
                }
            }
        });

        let mut nodes = Vec::with_capacity(keys.len());
        for outcome in out_rx.iter() {
            match outcome? {
                Some(node) => nodes.push(node),
                None => log::warn!("Skipping a node that vanished during batch resolution"),
            }
        }
        Ok(nodes)
    })
}
