//! The per-component resolution scope and the thread-local scope stack.
//!
//! A scope is alive for exactly one component's render or prepare call. All
//! hook operations go through the scope at the top of the stack; calling a
//! hook with no active scope is a programmer error and fails fast.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use crate::collections::map::HashMap;
use crate::effects::EffectEntry;
use crate::key::GlobalKey;
use crate::tree::TreeCore;
use crate::tree_state::StateContainer;

pub(crate) type SideEffect = Box<dyn FnOnce() + Send>;

pub(crate) type TreePropMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

pub(crate) struct ScopeInner {
    core: Arc<TreeCore>,
    key: GlobalKey,
    cursor: Cell<usize>,
    container: RefCell<StateContainer>,
    effects: RefCell<Vec<EffectEntry>>,
    side_effects: RefCell<Vec<SideEffect>>,
    tree_props: TreePropMap,
    boundary_slot: Cell<Option<usize>>,
}

/// The context threaded through one component's render/prepare call.
pub struct ResolveScope {
    inner: Rc<ScopeInner>,
}

/// Everything a finished scope hands back to the resolver.
pub(crate) struct ScopeOutput {
    pub container: StateContainer,
    pub effects: Vec<EffectEntry>,
    pub side_effects: Vec<SideEffect>,
    pub boundary_slot: Option<usize>,
}

impl ResolveScope {
    pub(crate) fn new(
        core: Arc<TreeCore>,
        key: GlobalKey,
        container: StateContainer,
        tree_props: TreePropMap,
    ) -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                core,
                key,
                cursor: Cell::new(0),
                container: RefCell::new(container),
                effects: RefCell::new(Vec::new()),
                side_effects: RefCell::new(Vec::new()),
                tree_props,
                boundary_slot: Cell::new(None),
            }),
        }
    }

    /// Key of the component instance this scope belongs to.
    pub fn global_key(&self) -> &GlobalKey {
        &self.inner.key
    }

    pub(crate) fn core(&self) -> &Arc<TreeCore> {
        &self.inner.core
    }

    /// Allocate the next hook slot index for this render.
    pub(crate) fn next_slot(&self) -> usize {
        let slot = self.inner.cursor.get();
        self.inner.cursor.set(slot + 1);
        slot
    }

    pub(crate) fn with_container<R>(&self, f: impl FnOnce(&mut StateContainer) -> R) -> R {
        f(&mut self.inner.container.borrow_mut())
    }

    pub(crate) fn push_effect(&self, entry: EffectEntry) {
        self.inner.effects.borrow_mut().push(entry);
    }

    pub(crate) fn push_side_effect(&self, effect: SideEffect) {
        self.inner.side_effects.borrow_mut().push(effect);
    }

    pub(crate) fn mark_error_boundary(&self, slot: usize) {
        self.inner.boundary_slot.set(Some(slot));
    }

    pub(crate) fn tree_prop(&self, type_id: &TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.inner.tree_props.get(type_id).cloned()
    }

    fn clone_inner(&self) -> Rc<ScopeInner> {
        Rc::clone(&self.inner)
    }

    pub(crate) fn finish(self) -> ScopeOutput {
        let inner = Rc::try_unwrap(self.inner)
            .ok()
            .expect("ResolveScope still referenced after its render returned");
        ScopeOutput {
            container: inner.container.into_inner(),
            effects: inner.effects.into_inner(),
            side_effects: inner.side_effects.into_inner(),
            boundary_slot: inner.boundary_slot.get(),
        }
    }
}

// Thread-local stack of active scopes (safe, no raw pointers). Resolution is
// single-threaded per pass, so a plain stack is enough.
thread_local! {
    static SCOPE_STACK: RefCell<Vec<Rc<ScopeInner>>> = const { RefCell::new(Vec::new()) };
}

/// Guard that pops the scope stack on drop.
#[must_use = "ScopeGuard pops the scope stack on drop"]
pub(crate) struct ScopeGuard;

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SCOPE_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

pub(crate) fn enter(scope: &ResolveScope) -> ScopeGuard {
    SCOPE_STACK.with(|stack| {
        stack.borrow_mut().push(scope.clone_inner());
    });
    ScopeGuard
}

/// Access the innermost active scope.
///
/// # Panics
/// Panics when no render or prepare is running on this thread: hook state
/// must not be creatable without a bound resolution context.
pub(crate) fn with_scope<R>(f: impl FnOnce(&ResolveScope) -> R) -> R {
    SCOPE_STACK.with(|stack| {
        let inner = stack
            .borrow()
            .last()
            .cloned()
            .expect("hook called outside of an active render or prepare");
        let scope = ResolveScope { inner };
        let result = f(&scope);
        // Drop our temporary handle without disturbing the stack entry.
        drop(scope);
        result
    })
}
