//! Hook functions available inside render and prepare.
//!
//! Hooks are addressed by call order: the Nth hook call of a render maps to
//! the Nth slot of the instance's state container, so call order and count
//! must be stable across renders of one instance.

use std::any::TypeId;
use std::sync::{Arc, Mutex};

use crate::effects::{Callback, CleanupFn, Deps, EffectEntry};
use crate::error::ComponentError;
use crate::hash::hash_key;
use crate::scope::with_scope;
use crate::state::State;
use crate::tree_state::SlotValue;

/// Create (first render) or retrieve per-instance state, returning a handle
/// that reads the currently-visible value and enqueues updates.
pub fn use_state<T>(init: impl FnOnce() -> T) -> State<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    with_scope(|scope| {
        let slot = scope.next_slot();
        let value = scope.with_container(|container| {
            container.get_or_create(slot, || Arc::new(init()) as SlotValue)
        });
        let typed = value
            .downcast::<T>()
            .ok()
            .expect("state slot holds a different type; hook order changed across renders");
        State::new(Arc::clone(scope.core()), scope.global_key().clone(), slot, typed)
    })
}

/// Register a side effect that attaches when this render commits and cleans
/// up when the instance leaves the tree or `deps` change.
///
/// Dependency lists are compared with deep equality against the previous
/// render's entry at the same position: unequal runs old cleanup then new
/// attach, equal runs neither. Attach and cleanup run on the UI thread.
pub fn use_effect<D>(deps: D, attach: impl FnOnce() -> Option<CleanupFn> + Send + 'static)
where
    D: PartialEq + Send + 'static,
{
    with_scope(|scope| {
        scope.push_effect(EffectEntry {
            deps: Deps::new(deps),
            attach: Box::new(attach),
        });
    });
}

/// A callback with render-stable identity. The wrapper handed out on the
/// first render is the one every later render sees; only the inner delegate
/// is swapped (on the UI thread, at commit) so the behavior tracks the
/// latest captured props and state.
pub fn use_callback<A, R>(f: impl Fn(A) -> R + Send + Sync + 'static) -> Callback<A, R>
where
    A: 'static,
    R: 'static,
{
    with_scope(|scope| {
        let slot = scope.next_slot();
        let delegate = Arc::new(f);
        let initial = Arc::clone(&delegate);
        let ui_thread = scope.core().main_thread();
        let value = scope.with_container(|container| {
            container.get_or_create(slot, || {
                let seed = Arc::clone(&initial);
                Arc::new(Callback::new(ui_thread, move |arg| seed(arg))) as SlotValue
            })
        });
        let callback = value
            .downcast::<Callback<A, R>>()
            .ok()
            .expect("callback slot holds a different type; hook order changed across renders");
        let callback = (*callback).clone();
        let swap_target = callback.clone();
        scope.push_side_effect(Box::new(move || {
            swap_target.replace_delegate(Box::new(move |arg| delegate(arg)));
        }));
        callback
    })
}

/// A mutable cell with stable identity across renders. Writes do not trigger
/// re-renders; use it for values the render itself must not depend on.
pub struct RefHandle<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for RefHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> RefHandle<T> {
    fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.lock().expect("RefHandle lock poisoned"))
    }

    pub fn set(&self, value: T) {
        *self.inner.lock().expect("RefHandle lock poisoned") = value;
    }
}

impl<T: Clone + Send + 'static> RefHandle<T> {
    pub fn get(&self) -> T {
        self.inner.lock().expect("RefHandle lock poisoned").clone()
    }
}

pub fn use_ref<T: Send + 'static>(init: impl FnOnce() -> T) -> RefHandle<T> {
    with_scope(|scope| {
        let slot = scope.next_slot();
        let value = scope.with_container(|container| {
            container.get_or_create(slot, || Arc::new(RefHandle::new(init())) as SlotValue)
        });
        (*value
            .downcast::<RefHandle<T>>()
            .ok()
            .expect("ref slot holds a different type; hook order changed across renders"))
        .clone()
    })
}

struct CachedSlot<T> {
    deps_key: u64,
    value: T,
}

/// A value computed once per distinct dependency key and reused across
/// renders until the dependencies change.
pub fn use_cached<D, T>(deps: D, compute: impl FnOnce() -> T) -> T
where
    D: std::hash::Hash,
    T: Clone + Send + Sync + 'static,
{
    with_scope(|scope| {
        let slot = scope.next_slot();
        let deps_key = hash_key(&deps);
        scope.with_container(|container| {
            if let Some(existing) = container
                .get(slot)
                .and_then(|value| value.downcast_ref::<CachedSlot<T>>())
            {
                if existing.deps_key == deps_key {
                    return existing.value.clone();
                }
            }
            let value = compute();
            container.put(
                slot,
                Arc::new(CachedSlot {
                    deps_key,
                    value: value.clone(),
                }) as SlotValue,
            );
            value
        })
    })
}

/// Read a typed value provided by an ancestor `Component::tree_prop`.
pub fn use_tree_prop<T: Clone + Send + Sync + 'static>() -> Option<T> {
    with_scope(|scope| {
        scope
            .tree_prop(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>().cloned())
    })
}

/// Handle returned by [`use_error_boundary`].
///
/// While no descendant has failed, `error` is `None`. When a descendant
/// lifecycle callback fails, the nearest boundary's state receives the error
/// and its subtree re-renders, letting the boundary substitute a fallback.
#[derive(Clone)]
pub struct ErrorBoundary {
    state: State<Option<Arc<ComponentError>>>,
}

impl ErrorBoundary {
    pub fn error(&self) -> Option<Arc<ComponentError>> {
        self.state.get()
    }

    /// Clear the captured error so the original subtree renders again.
    pub fn reset(&self) {
        self.state.update(None);
    }
}

/// Register the current component as an error boundary for its descendants.
pub fn use_error_boundary() -> ErrorBoundary {
    let state = use_state::<Option<Arc<ComponentError>>>(|| None);
    with_scope(|scope| scope.mark_error_boundary(state.slot()));
    ErrorBoundary { state }
}
