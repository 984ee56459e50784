//! Binders attach behavior to mounted content.
//!
//! A [`Binder`] is the static kind: bound once at mount, unbound in reverse
//! order at unmount, with `should_update` deciding whether a committed update
//! re-binds. A [`DynamicBindingSpec`] is the dynamic kind: it wires a
//! [`DynamicValue`] to a setter on the content so the property can change
//! without a layout pass, and restores a default when it unbinds.

use std::any::Any;
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, ThreadId};

use crate::dynamic::DynamicValue;
use crate::error::ComponentError;

/// Mounted content instance. In production this wraps a platform View or
/// Drawable; in tests it is a plain struct recording what was set on it.
pub type Content = Box<dyn Any + Send>;

/// Shared handle to one mounted content instance, owned by the mount state.
#[derive(Clone)]
pub struct ContentCell {
    inner: Arc<Mutex<Content>>,
}

/// Non-owning handle held by live dynamic bindings.
#[derive(Clone)]
pub struct WeakContentCell {
    inner: Weak<Mutex<Content>>,
}

impl ContentCell {
    pub fn new(content: Content) -> Self {
        Self {
            inner: Arc::new(Mutex::new(content)),
        }
    }

    pub fn downgrade(&self) -> WeakContentCell {
        WeakContentCell {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Run `f` against the content downcast to `C`. Returns `None` when the
    /// content has a different concrete type.
    pub fn with<C: 'static, R>(&self, f: impl FnOnce(&mut C) -> R) -> Option<R> {
        let mut guard = self.inner.lock().expect("ContentCell lock poisoned");
        guard.downcast_mut::<C>().map(f)
    }

    /// Run `f` against the type-erased content.
    pub fn with_content<R>(&self, f: impl FnOnce(&mut Content) -> R) -> R {
        let mut guard = self.inner.lock().expect("ContentCell lock poisoned");
        f(&mut guard)
    }

    /// Take the content back out, consuming the cell's ownership share.
    pub(crate) fn into_content(self) -> Option<Content> {
        Arc::try_unwrap(self.inner)
            .ok()
            .map(|mutex| mutex.into_inner().expect("ContentCell lock poisoned"))
    }
}

impl WeakContentCell {
    pub fn upgrade(&self) -> Option<ContentCell> {
        self.inner.upgrade().map(|inner| ContentCell { inner })
    }
}

/// Mount-time behavior attached to content by a payload.
pub trait Binder: Send + Sync + 'static {
    fn name(&self) -> &'static str {
        "binder"
    }

    /// Apply this binder's model to freshly mounted content.
    fn bind(&self, content: &mut Content) -> Result<(), ComponentError>;

    /// Undo `bind`. Runs in reverse bind order before the content may be
    /// returned to a reuse pool.
    fn unbind(&self, content: &mut Content);

    /// Whether a committed update requires re-binding, given the binder from
    /// the previous payload at the same position.
    fn should_update(&self, previous: &dyn Binder) -> bool {
        let _ = previous;
        true
    }

    fn as_any(&self) -> &dyn Any;
}

/// Immutable descriptor of one dynamic-value-to-property wiring, created
/// during prepare. Instantiated into a [`LiveBinding`] at mount time.
#[derive(Clone)]
pub struct DynamicBindingSpec {
    attach: Arc<dyn Fn(&ContentCell) -> LiveBinding + Send + Sync>,
}

impl DynamicBindingSpec {
    /// Attach to mounted content: subscribes to the dynamic value and pushes
    /// the current value into the content immediately.
    pub(crate) fn attach(&self, cell: &ContentCell) -> LiveBinding {
        (self.attach)(cell)
    }

    /// Whether two specs describe the same wiring (same underlying closure).
    pub(crate) fn is_same(&self, other: &DynamicBindingSpec) -> bool {
        Arc::ptr_eq(&self.attach, &other.attach)
    }
}

/// A dynamic binding that is currently attached to mounted content.
///
/// `unbind` applies the default value to the content and then detaches from
/// the dynamic value, leaving no listener behind.
pub struct LiveBinding {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl LiveBinding {
    fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    pub(crate) fn unbind(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for LiveBinding {
    fn drop(&mut self) {
        self.unbind();
    }
}

fn assert_mount_thread(home: ThreadId, what: &str) {
    let current = thread::current().id();
    assert_eq!(
        home, current,
        "{what} invoked off the mount thread (bound on {home:?}, called on {current:?})"
    );
}

/// Bind a dynamic value to a plain setter function on content of type `C`.
///
/// On bind the content receives the value's current state; on every `set` it
/// receives the new value; on unbind it receives `default` and the listener
/// detaches.
pub fn bind_dynamic<T, C>(
    value: &DynamicValue<T>,
    default: T,
    setter: fn(&mut C, T),
) -> DynamicBindingSpec
where
    T: Clone + Send + Sync + 'static,
    C: 'static,
{
    let value = value.clone();
    DynamicBindingSpec {
        attach: Arc::new(move |cell: &ContentCell| {
            let home = thread::current().id();
            let weak = cell.downgrade();
            let subscription = value.subscribe(move |new: &T| {
                assert_mount_thread(home, "dynamic binding update");
                if let Some(cell) = weak.upgrade() {
                    cell.with(|content: &mut C| setter(content, new.clone()));
                }
            });
            cell.with(|content: &mut C| setter(content, value.get()));

            let value_for_detach = value.clone();
            let weak_for_detach = cell.downgrade();
            let default = default.clone();
            LiveBinding::new(move || {
                assert_mount_thread(home, "dynamic binding unbind");
                if let Some(cell) = weak_for_detach.upgrade() {
                    cell.with(|content: &mut C| setter(content, default.clone()));
                }
                value_for_detach.unsubscribe(subscription);
            })
        }),
    }
}

/// Bind a dynamic value with a custom apply/unbind closure pair, for
/// properties that need more than a single setter call.
pub fn bind_dynamic_with<T, A, U>(
    value: &DynamicValue<T>,
    on_value: A,
    on_unbind: U,
) -> DynamicBindingSpec
where
    T: Clone + Send + Sync + 'static,
    A: Fn(&ContentCell, &T) + Send + Sync + 'static,
    U: Fn(&ContentCell) + Send + Sync + 'static,
{
    let value = value.clone();
    let on_value = Arc::new(on_value);
    let on_unbind = Arc::new(on_unbind);
    DynamicBindingSpec {
        attach: Arc::new(move |cell: &ContentCell| {
            let home = thread::current().id();
            let weak = cell.downgrade();
            let apply = Arc::clone(&on_value);
            let subscription = value.subscribe(move |new: &T| {
                assert_mount_thread(home, "dynamic binding update");
                if let Some(cell) = weak.upgrade() {
                    apply(&cell, new);
                }
            });
            on_value(cell, &value.get());

            let value_for_detach = value.clone();
            let weak_for_detach = cell.downgrade();
            let restore = Arc::clone(&on_unbind);
            LiveBinding::new(move || {
                assert_mount_thread(home, "dynamic binding unbind");
                if let Some(cell) = weak_for_detach.upgrade() {
                    restore(&cell);
                }
                value_for_detach.unsubscribe(subscription);
            })
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        alpha: f32,
        history: Vec<f32>,
    }

    fn set_alpha(probe: &mut Probe, alpha: f32) {
        probe.alpha = alpha;
        probe.history.push(alpha);
    }

    fn probe_cell() -> ContentCell {
        ContentCell::new(Box::new(Probe {
            alpha: 1.0,
            history: Vec::new(),
        }))
    }

    #[test]
    fn bind_pushes_current_value_and_tracks_sets() {
        let alpha = DynamicValue::new(0.5f32);
        let spec = bind_dynamic(&alpha, 1.0, set_alpha);
        let cell = probe_cell();
        let mut live = spec.attach(&cell);
        assert_eq!(cell.with(|p: &mut Probe| p.alpha), Some(0.5));

        alpha.set(0.3);
        assert_eq!(cell.with(|p: &mut Probe| p.alpha), Some(0.3));

        live.unbind();
        let history = cell.with(|p: &mut Probe| p.history.clone()).unwrap();
        assert_eq!(history, vec![0.5, 0.3, 1.0], "default restored on unbind");
        assert_eq!(alpha.listener_count(), 0, "no listener left behind");
    }

    #[test]
    fn unbind_is_idempotent() {
        let alpha = DynamicValue::new(0.5f32);
        let spec = bind_dynamic(&alpha, 1.0, set_alpha);
        let cell = probe_cell();
        let mut live = spec.attach(&cell);
        live.unbind();
        live.unbind();
        assert_eq!(alpha.listener_count(), 0);
    }

    #[test]
    fn stale_cell_is_ignored_after_content_release() {
        let alpha = DynamicValue::new(0.5f32);
        let spec = bind_dynamic(&alpha, 1.0, set_alpha);
        let cell = probe_cell();
        let mut live = spec.attach(&cell);
        drop(cell);
        // Content is gone; the listener and unbind must tolerate that.
        alpha.set(0.1);
        live.unbind();
        assert_eq!(alpha.listener_count(), 0);
    }

    #[test]
    fn custom_bind_unbind_pair() {
        let value = DynamicValue::new(2.0f32);
        let spec = bind_dynamic_with(
            &value,
            |cell, v: &f32| {
                cell.with(|p: &mut Probe| set_alpha(p, *v * 10.0));
            },
            |cell| {
                cell.with(|p: &mut Probe| set_alpha(p, -1.0));
            },
        );
        let cell = probe_cell();
        let mut live = spec.attach(&cell);
        value.set(3.0);
        live.unbind();
        let history = cell.with(|p: &mut Probe| p.history.clone()).unwrap();
        assert_eq!(history, vec![20.0, 30.0, -1.0]);
    }
}
