//! The user-facing state handle returned by `use_state`.

use std::sync::Arc;

use crate::key::GlobalKey;
use crate::tree::{TreeCore, UpdateMode};
use crate::tree_state::{SkipProbe, SlotValue, UpdateKind};

/// Handle to one hook slot's value.
///
/// The handle is a snapshot plus an address: `get` returns the value the
/// owning render observed, and the update operations enqueue a transition
/// against the owning tree. Handles may be shared with any thread; mutation
/// is enqueue-based, never in place.
pub struct State<T> {
    core: Arc<TreeCore>,
    key: GlobalKey,
    slot: usize,
    value: Arc<T>,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            key: self.key.clone(),
            slot: self.slot,
            value: Arc::clone(&self.value),
        }
    }
}

/// Two handles are equal iff they address the same slot of the same tree and
/// observed equal values; used to detect whether a re-render produced an
/// observable change.
impl<T: PartialEq> PartialEq for State<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
            && self.key == other.key
            && self.slot == other.slot
            && self.value == other.value
    }
}

impl<T> std::fmt::Debug for State<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "State({}:{})", self.key, self.slot)
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> State<T> {
    pub(crate) fn new(core: Arc<TreeCore>, key: GlobalKey, slot: usize, value: Arc<T>) -> Self {
        Self {
            core,
            key,
            slot,
            value,
        }
    }

    pub(crate) fn slot(&self) -> usize {
        self.slot
    }

    /// The value this render observed.
    pub fn get(&self) -> T {
        (*self.value).clone()
    }

    /// Enqueue a replacement value for application on a background layout
    /// pass. Returns immediately. Skipped when the value provably equals the
    /// newest queued (else committed) value.
    pub fn update(&self, value: T) {
        if self.can_skip(&value) {
            log::trace!("skipping no-op state update for {}:{}", self.key, self.slot);
            return;
        }
        self.enqueue(UpdateKind::Value(Arc::new(value)), UpdateMode::Async);
    }

    /// Enqueue a function of the previous value. Function updates observe
    /// the result of earlier queued updates, so read-modify-write chains
    /// compose instead of overwriting each other.
    pub fn update_with(&self, f: impl Fn(&T) -> T + Send + Sync + 'static) {
        self.enqueue(Self::function_kind(f), UpdateMode::Async);
    }

    /// Enqueue a replacement value and run the layout pass on the *current*
    /// thread. Calling this on the UI thread risks dropped frames; it is
    /// intended for background-thread callers.
    pub fn update_sync(&self, value: T) {
        if self.can_skip(&value) {
            log::trace!("skipping no-op state update for {}:{}", self.key, self.slot);
            return;
        }
        self.enqueue(UpdateKind::Value(Arc::new(value)), UpdateMode::Sync);
    }

    /// Function-form counterpart of [`State::update_sync`].
    pub fn update_sync_with(&self, f: impl Fn(&T) -> T + Send + Sync + 'static) {
        self.enqueue(Self::function_kind(f), UpdateMode::Sync);
    }

    fn function_kind(f: impl Fn(&T) -> T + Send + Sync + 'static) -> UpdateKind {
        UpdateKind::Function(Arc::new(move |previous: &SlotValue| {
            let previous = previous
                .downcast_ref::<T>()
                .expect("state slot holds a different type");
            Arc::new(f(previous)) as SlotValue
        }))
    }

    fn enqueue(&self, kind: UpdateKind, mode: UpdateMode) {
        TreeCore::enqueue_update(&self.core, self.key.clone(), self.slot, kind, mode);
    }

    // Compares against the newest queued literal when one exists, else the
    // committed value, else this handle's own snapshot. A queued
    // function-form update blocks skipping because its outcome is unknown
    // until applied.
    fn can_skip(&self, candidate: &T) -> bool {
        match self.core.skip_probe(&self.key, self.slot) {
            SkipProbe::Blocked => false,
            SkipProbe::Value(queued) => queued
                .downcast_ref::<T>()
                .is_some_and(|queued| queued == candidate),
            SkipProbe::Absent => match self.core.committed_value(&self.key, self.slot) {
                Some(committed) => committed
                    .downcast_ref::<T>()
                    .is_some_and(|committed| committed == candidate),
                None => *self.value == *candidate,
            },
        }
    }
}
