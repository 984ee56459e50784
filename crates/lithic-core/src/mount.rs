//! Mounting: reconciling a laid-out tree against live content.
//!
//! Mount state is owned by the UI thread. Each laid-out leaf with a payload
//! becomes a mount item holding the content instance, its bound binders, and
//! its live dynamic bindings. Reconciliation mounts new items, updates kept
//! ones, and unmounts removed ones in reverse mount order.

use indexmap::IndexMap;

use crate::binder::{Binder, Content, ContentCell, LiveBinding};
use crate::collections::map::HashMap;
use crate::error::ComponentError;
use crate::key::GlobalKey;
use crate::mountable::MountPayload;
use crate::resolve::{LayoutResult, PositionedNode};
use lithic_layout::Rect;

const POOL_CAP_PER_KIND: usize = 8;

/// Unbound content instances kept for reuse, bucketed by content kind.
#[derive(Default)]
struct ContentPool {
    buckets: HashMap<&'static str, Vec<Content>>,
}

impl ContentPool {
    fn acquire(&mut self, kind: &'static str) -> Option<Content> {
        self.buckets.get_mut(kind).and_then(Vec::pop)
    }

    fn release(&mut self, kind: &'static str, content: Content) {
        let bucket = self.buckets.entry(kind).or_default();
        if bucket.len() < POOL_CAP_PER_KIND {
            bucket.push(content);
        }
    }
}

/// Counters exposed for tests and instrumentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MountStats {
    pub mounts: usize,
    pub unmounts: usize,
    pub binds: usize,
    pub unbinds: usize,
}

struct MountItem {
    payload: MountPayload,
    cell: ContentCell,
    live: Vec<LiveBinding>,
    rect: Rect,
}

/// Live content for one tree, reconciled against each new layout result.
#[derive(Default)]
pub struct MountState {
    items: IndexMap<GlobalKey, MountItem>,
    pool: ContentPool,
    stats: MountStats,
}

impl MountState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> MountStats {
        self.stats
    }

    pub fn mounted_len(&self) -> usize {
        self.items.len()
    }

    /// Content for the item mounted at `key`, when one exists.
    pub fn content_at(&self, key: &GlobalKey) -> Option<ContentCell> {
        self.items.get(key).map(|item| item.cell.clone())
    }

    pub fn rect_at(&self, key: &GlobalKey) -> Option<Rect> {
        self.items.get(key).map(|item| item.rect)
    }

    /// Reconcile live content against `result`.
    ///
    /// Removed items unmount first, newest first. Kept items with an
    /// unchanged payload only take the new rect; a replaced payload re-binds
    /// the binders whose `should_update` asks for it and swaps dynamic
    /// bindings that no longer match. New items mount last, in traversal
    /// order, reusing pooled content of the same kind where available.
    pub fn mount(&mut self, result: &LayoutResult) -> Result<(), ComponentError> {
        let mut desired: Vec<(GlobalKey, MountPayload, Rect)> = Vec::new();
        collect_mountable(&result.root, &mut desired);

        let keep: Vec<GlobalKey> = desired.iter().map(|(key, _, _)| key.clone()).collect();
        let removed: Vec<GlobalKey> = self
            .items
            .keys()
            .filter(|key| !keep.contains(key))
            .cloned()
            .collect();
        for key in removed.iter().rev() {
            if let Some(item) = self.items.shift_remove(key) {
                self.unmount_item(item);
            }
        }

        // Rebuild in traversal order so later unmounts stay LIFO. A bind
        // failure retires only the failed item: everything already
        // reconciled and everything not yet reached keeps its mounted state,
        // so the host can still tear the tree down cleanly.
        let mut next = IndexMap::with_capacity(desired.len());
        let mut first_error = None;
        for (key, payload, rect) in desired {
            let existing = self.items.shift_remove(&key);
            if first_error.is_some() {
                if let Some(item) = existing {
                    next.insert(key, item);
                }
                continue;
            }
            let reconciled = match existing {
                Some(existing) => self.update_item(existing, payload, rect),
                None => self.mount_item(payload, rect),
            };
            match reconciled {
                Ok(item) => {
                    next.insert(key, item);
                }
                Err(error) => first_error = Some(error),
            }
        }
        debug_assert!(first_error.is_some() || self.items.is_empty());
        self.items = next;
        match first_error {
            None => Ok(()),
            Some(error) => Err(error),
        }
    }

    /// Unmount everything, newest first. Used on tree release.
    pub fn unmount_all(&mut self) {
        while let Some((_, item)) = self.items.pop() {
            self.unmount_item(item);
        }
    }

    fn mount_item(&mut self, payload: MountPayload, rect: Rect) -> Result<MountItem, ComponentError> {
        let content = self
            .pool
            .acquire(payload.content_kind())
            .unwrap_or_else(|| payload.allocator().create_content());
        let cell = ContentCell::new(content);

        for (index, binder) in payload.binders().iter().enumerate() {
            let bound = cell.with_content(|content| binder.bind(content));
            if let Err(error) = bound {
                log::warn!("binder `{}` failed to bind; rolling back", binder.name());
                // Roll back the binders bound so far, newest first, and
                // return the untouched content to the pool.
                for earlier in payload.binders()[..index].iter().rev() {
                    cell.with_content(|content| earlier.unbind(content));
                    self.stats.unbinds += 1;
                }
                if let Some(content) = cell.into_content() {
                    self.pool.release(payload.content_kind(), content);
                }
                return Err(error);
            }
            self.stats.binds += 1;
        }

        let live = payload
            .dynamic_bindings()
            .iter()
            .map(|spec| spec.attach(&cell))
            .collect();

        self.stats.mounts += 1;
        Ok(MountItem {
            payload,
            cell,
            live,
            rect,
        })
    }

    fn update_item(
        &mut self,
        mut item: MountItem,
        payload: MountPayload,
        rect: Rect,
    ) -> Result<MountItem, ComponentError> {
        item.rect = rect;
        if item.payload.id() == payload.id() {
            return Ok(item);
        }

        let previous = item.payload;
        item.payload = payload;

        if previous.binders().len() == item.payload.binders().len() {
            let old_binders = previous.binders();
            let new_binders = item.payload.binders();
            let mut rebound = vec![false; new_binders.len()];
            for (index, (old, new)) in old_binders.iter().zip(new_binders).enumerate() {
                if !new.should_update(&**old) {
                    continue;
                }
                item.cell.with_content(|content| old.unbind(content));
                self.stats.unbinds += 1;
                if let Err(error) = item.cell.with_content(|content| new.bind(content)) {
                    log::warn!("binder `{}` failed to re-bind; retiring content", new.name());
                    // Position `index` is already unbound; unbind whichever
                    // binder is bound at every other position, newest first.
                    for j in (0..new_binders.len()).rev() {
                        if j == index {
                            continue;
                        }
                        let bound: &dyn Binder = if rebound[j] {
                            &*new_binders[j]
                        } else {
                            &*old_binders[j]
                        };
                        item.cell.with_content(|content| bound.unbind(content));
                        self.stats.unbinds += 1;
                    }
                    for mut live in item.live.drain(..).rev() {
                        live.unbind();
                    }
                    let kind = item.payload.content_kind();
                    self.retire_content(item.cell, kind);
                    return Err(error);
                }
                rebound[index] = true;
                self.stats.binds += 1;
            }
        } else {
            for old in previous.binders().iter().rev() {
                item.cell.with_content(|content| old.unbind(content));
                self.stats.unbinds += 1;
            }
            for (index, new) in item.payload.binders().iter().enumerate() {
                if let Err(error) = item.cell.with_content(|content| new.bind(content)) {
                    log::warn!("binder `{}` failed to bind; retiring content", new.name());
                    for earlier in item.payload.binders()[..index].iter().rev() {
                        item.cell.with_content(|content| earlier.unbind(content));
                        self.stats.unbinds += 1;
                    }
                    for mut live in item.live.drain(..).rev() {
                        live.unbind();
                    }
                    let kind = item.payload.content_kind();
                    self.retire_content(item.cell, kind);
                    return Err(error);
                }
                self.stats.binds += 1;
            }
        }

        // Dynamic bindings keep their live subscription when the spec is
        // unchanged; otherwise the old one unbinds (restoring its default)
        // before the replacement attaches.
        let same_shape = previous.dynamic_bindings().len() == item.payload.dynamic_bindings().len()
            && previous
                .dynamic_bindings()
                .iter()
                .zip(item.payload.dynamic_bindings())
                .all(|(old, new)| old.is_same(new));
        if !same_shape {
            for mut live in item.live.drain(..).rev() {
                live.unbind();
            }
            item.live = item
                .payload
                .dynamic_bindings()
                .iter()
                .map(|spec| spec.attach(&item.cell))
                .collect();
        }
        Ok(item)
    }

    fn unmount_item(&mut self, mut item: MountItem) {
        for mut live in item.live.drain(..).rev() {
            live.unbind();
        }
        for binder in item.payload.binders().iter().rev() {
            item.cell.with_content(|content| binder.unbind(content));
            self.stats.unbinds += 1;
        }
        let kind = item.payload.content_kind();
        self.retire_content(item.cell, kind);
    }

    /// Count the unmount and return fully unbound content to the pool.
    fn retire_content(&mut self, cell: ContentCell, kind: &'static str) {
        self.stats.unmounts += 1;
        if let Some(content) = cell.into_content() {
            self.pool.release(kind, content);
        } else {
            log::warn!("content of kind `{kind}` still shared at unmount; not pooled");
        }
    }
}

fn collect_mountable(node: &PositionedNode, out: &mut Vec<(GlobalKey, MountPayload, Rect)>) {
    if let Some(payload) = &node.node.payload {
        out.push((node.node.key.clone(), payload.clone(), node.rect));
    }
    for child in &node.children {
        collect_mountable(child, out);
    }
}
