//! Focal list store: the authoritative in-memory collection for one view.
//!
//! Each view owns its own [`ListStore`]; there is no cross-view sharing. Every
//! mutating operation publishes a *fresh* snapshot behind an `ArcSwap`, so
//! downstream derivation can rely on reference-level change detection, and an
//! epoch `watch` channel lets observers wake on swaps.

#![forbid(unsafe_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use arc_swap::ArcSwap;
use rustc_hash::FxHashSet;
use tokio::sync::watch;
use tracing::{debug, warn};

use focal_api::{ApiResult, Resource};
use focal_core::{Entity, EntityId, Snapshot};

pub struct ListStore<T: Entity> {
    snap: ArcSwap<Snapshot<T>>,
    // Serializes mutators; readers never block.
    write: Mutex<()>,
    epoch_tx: watch::Sender<u64>,
    epoch_rx: watch::Receiver<u64>,
}

impl<T: Entity> ListStore<T> {
    /// Empty store, epoch 0. Constructed at view mount and dropped with it.
    pub fn new() -> Arc<Self> {
        let (epoch_tx, epoch_rx) = watch::channel(0u64);
        Arc::new(Self {
            snap: ArcSwap::from_pointee(Snapshot::default()),
            write: Mutex::new(()),
            epoch_tx,
            epoch_rx,
        })
    }

    pub fn current(&self) -> Arc<Snapshot<T>> {
        self.snap.load_full()
    }

    pub fn subscribe_epoch(&self) -> watch::Receiver<u64> {
        self.epoch_rx.clone()
    }

    /// Full reload from the remote source. On failure the collection is
    /// replaced with the empty one and the error is returned to the caller;
    /// stale data is never kept silently.
    pub async fn load(&self, source: &dyn Resource<T>) -> ApiResult<Arc<Snapshot<T>>> {
        match source.fetch_collection().await {
            Ok(items) => Ok(self.replace_all(items)),
            Err(e) => {
                warn!(kind = T::KIND.as_str(), error = %e, "store: load failed; clearing collection");
                self.publish(Vec::new());
                Err(e)
            }
        }
    }

    /// Unconditional overwrite, used after a full reload. Duplicate ids are
    /// dropped keeping the first occurrence so the uniqueness invariant holds.
    pub fn replace_all(&self, items: Vec<T>) -> Arc<Snapshot<T>> {
        self.publish(dedup_by_id(items))
    }

    /// Merge a patch into the entity with the given id. No-op (not an error)
    /// when no such entity exists; no snapshot is published in that case.
    pub fn patch(&self, id: EntityId, patch: &T::Patch) -> bool {
        let guard = self.write_lock();
        let cur = self.snap.load_full();
        let Some(pos) = cur.items.iter().position(|t| t.id() == id) else {
            debug!(kind = T::KIND.as_str(), id, "store: patch on absent id ignored");
            return false;
        };
        let mut items = cur.items.clone();
        items[pos].apply_patch(patch);
        self.publish_locked(guard, cur.epoch, items);
        true
    }

    /// Delete the entity with the given id. No-op when absent.
    pub fn remove(&self, id: EntityId) -> bool {
        let guard = self.write_lock();
        let cur = self.snap.load_full();
        if !cur.items.iter().any(|t| t.id() == id) {
            debug!(kind = T::KIND.as_str(), id, "store: remove on absent id ignored");
            return false;
        }
        let items: Vec<T> = cur.items.iter().filter(|t| t.id() != id).cloned().collect();
        self.publish_locked(guard, cur.epoch, items);
        true
    }

    fn publish(&self, items: Vec<T>) -> Arc<Snapshot<T>> {
        let guard = self.write_lock();
        let prev = self.snap.load().epoch;
        self.publish_locked(guard, prev, items)
    }

    fn publish_locked(
        &self,
        _guard: MutexGuard<'_, ()>,
        prev_epoch: u64,
        items: Vec<T>,
    ) -> Arc<Snapshot<T>> {
        let epoch = prev_epoch + 1;
        metrics::gauge!("store_items", items.len() as f64, "kind" => T::KIND.as_str());
        let next = Arc::new(Snapshot { epoch, items });
        self.snap.store(next.clone());
        let _ = self.epoch_tx.send(epoch);
        next
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn dedup_by_id<T: Entity>(items: Vec<T>) -> Vec<T> {
    let total = items.len();
    let mut seen: FxHashSet<EntityId> = FxHashSet::default();
    let mut out = Vec::with_capacity(total);
    for t in items {
        if seen.insert(t.id()) {
            out.push(t);
        }
    }
    if out.len() != total {
        warn!(
            kind = T::KIND.as_str(),
            dropped = total - out.len(),
            "store: duplicate ids dropped on load"
        );
    }
    out
}
