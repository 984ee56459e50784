//! Per-tree storage of hook state, keyed by global key plus slot index.
//!
//! Containers are copy-on-write snapshots: an accepted update produces a new
//! container value rather than mutating the old one, so an in-flight
//! background pass keeps reading the snapshot it started from.

use std::any::Any;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::collections::map::HashMap;
use crate::key::GlobalKey;

pub(crate) type SlotValue = Arc<dyn Any + Send + Sync>;

/// Ordered hook slots for one component instance at one point in time.
#[derive(Clone, Default)]
pub struct StateContainer {
    slots: SmallVec<[SlotValue; 4]>,
}

impl StateContainer {
    pub(crate) fn get(&self, index: usize) -> Option<&SlotValue> {
        self.slots.get(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Return the existing slot value, or run `init` exactly once, store the
    /// result at `index`, and return it.
    ///
    /// # Panics
    /// Panics when `index` skips past the end of the container: hook call
    /// order and count must be stable across renders of one instance.
    pub(crate) fn get_or_create(
        &mut self,
        index: usize,
        init: impl FnOnce() -> SlotValue,
    ) -> SlotValue {
        if let Some(existing) = self.slots.get(index) {
            return Arc::clone(existing);
        }
        assert_eq!(
            index,
            self.slots.len(),
            "hook slot {index} requested but only {} slots exist; \
             hook call order must not change across renders",
            self.slots.len()
        );
        let value = init();
        self.slots.push(Arc::clone(&value));
        value
    }

    /// Store `value` at `index`, replacing an existing slot or appending
    /// when `index` is the next free position.
    pub(crate) fn put(&mut self, index: usize, value: SlotValue) {
        if index == self.slots.len() {
            self.slots.push(value);
            return;
        }
        assert!(
            index < self.slots.len(),
            "hook slot {index} requested but only {} slots exist; \
             hook call order must not change across renders",
            self.slots.len()
        );
        self.slots[index] = value;
    }

    fn replace(&mut self, index: usize, value: SlotValue) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = value;
        }
    }
}

/// A pending mutation for one hook slot: either a literal replacement or a
/// function of the previous value. Function updates exist so queued updates
/// chain read-modify-write instead of overwriting each other.
#[derive(Clone)]
pub(crate) enum UpdateKind {
    Value(SlotValue),
    Function(Arc<dyn Fn(&SlotValue) -> SlotValue + Send + Sync>),
}

#[derive(Clone)]
pub(crate) struct PendingUpdate {
    pub key: GlobalKey,
    pub slot: usize,
    pub kind: UpdateKind,
}

/// Outcome of probing the queue for a can-skip equality check.
pub(crate) enum SkipProbe {
    /// Newest queued literal for the slot.
    Value(SlotValue),
    /// A queued function update makes the outcome unknowable; never skip.
    Blocked,
    /// Nothing queued; compare against the committed value.
    Absent,
}

/// All hook containers plus the queue of not-yet-committed updates.
#[derive(Default)]
pub(crate) struct TreeState {
    containers: HashMap<GlobalKey, StateContainer>,
    pending: Vec<PendingUpdate>,
    /// Total updates drained over the tree's lifetime; lets a commit express
    /// "drain up to the point my snapshot saw" as an absolute watermark.
    drained: usize,
}

impl TreeState {
    pub fn enqueue(&mut self, update: PendingUpdate) {
        self.pending.push(update);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Containers plus every currently queued update folded in FIFO order,
    /// along with the watermark of the last update observed. The queue is
    /// left untouched; a pass that commits hands the watermark back via
    /// [`TreeState::drop_consumed`], so a discarded stale pass never loses
    /// updates and overlapping passes never drain each other's.
    pub fn working_containers(&self) -> (HashMap<GlobalKey, StateContainer>, usize) {
        let mut containers = self.containers.clone();
        for update in &self.pending {
            apply_update(&mut containers, update);
        }
        (containers, self.drained + self.pending.len())
    }

    /// Keys whose queued updates make their committed snapshot stale.
    pub fn dirty_keys(&self) -> Vec<GlobalKey> {
        let mut keys: Vec<GlobalKey> = Vec::new();
        for update in &self.pending {
            if !keys.contains(&update.key) {
                keys.push(update.key.clone());
            }
        }
        keys
    }

    /// Drain every update at or below `watermark`. Updates enqueued after
    /// the watermark's pass snapshotted stay queued.
    pub fn drop_consumed(&mut self, watermark: usize) {
        let count = watermark
            .saturating_sub(self.drained)
            .min(self.pending.len());
        self.pending.drain(..count);
        self.drained += count;
    }

    /// Replace the committed containers with a pass's working set, keeping
    /// only keys that are still part of the committed tree.
    pub fn commit(&mut self, containers: HashMap<GlobalKey, StateContainer>) {
        self.containers = containers;
    }

    pub fn retain_keys(&mut self, is_live: impl Fn(&GlobalKey) -> bool) {
        self.containers.retain(|key, _| is_live(key));
    }

    pub fn committed_value(&self, key: &GlobalKey, slot: usize) -> Option<SlotValue> {
        self.containers
            .get(key)
            .and_then(|container| container.get(slot).cloned())
    }

    /// Probe the queue for the newest update targeting `(key, slot)`.
    pub fn skip_probe(&self, key: &GlobalKey, slot: usize) -> SkipProbe {
        for update in self.pending.iter().rev() {
            if update.key == *key && update.slot == slot {
                return match &update.kind {
                    UpdateKind::Value(value) => SkipProbe::Value(Arc::clone(value)),
                    UpdateKind::Function(_) => SkipProbe::Blocked,
                };
            }
        }
        SkipProbe::Absent
    }
}

fn apply_update(containers: &mut HashMap<GlobalKey, StateContainer>, update: &PendingUpdate) {
    let Some(container) = containers.get_mut(&update.key) else {
        // The instance left the tree between enqueue and this pass.
        log::trace!("dropping state update for removed key {}", update.key);
        return;
    };
    let Some(previous) = container.get(update.slot) else {
        log::trace!(
            "dropping state update for missing slot {}:{}",
            update.key,
            update.slot
        );
        return;
    };
    let next = match &update.kind {
        UpdateKind::Value(value) => Arc::clone(value),
        UpdateKind::Function(f) => f(previous),
    };
    let mut updated = container.clone();
    updated.replace(update.slot, next);
    *container = updated;
}
