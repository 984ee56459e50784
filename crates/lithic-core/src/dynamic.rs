//! Observable value cells that update mounted content without a layout pass.

use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionId(u64);

struct ListenerSet<T> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener<T>)>,
}

impl<T> Default for ListenerSet<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }
}

struct DynamicValueInner<T> {
    value: Mutex<T>,
    listeners: Mutex<ListenerSet<T>>,
    // Thread that owns mutation and notification. Recorded when the first
    // listener attaches, cleared when the last one detaches.
    home: Mutex<Option<ThreadId>>,
}

/// A boxed, observable value cell.
///
/// `get` is allowed from any thread. `set` must happen on the thread that
/// attached the listeners (the UI thread once the value is bound to mounted
/// content); violating that is a programmer error and panics rather than
/// producing nondeterministic visual state. Every `set` synchronously
/// notifies all listeners in attachment order before returning; there is no
/// batching or coalescing.
pub struct DynamicValue<T> {
    inner: Arc<DynamicValueInner<T>>,
}

impl<T> Clone for DynamicValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> DynamicValue<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(DynamicValueInner {
                value: Mutex::new(initial),
                listeners: Mutex::new(ListenerSet::default()),
                home: Mutex::new(None),
            }),
        }
    }

    /// Current value, readable from any thread.
    pub fn get(&self) -> T {
        self.inner
            .value
            .lock()
            .expect("DynamicValue lock poisoned")
            .clone()
    }

    /// Replace the value and synchronously notify all listeners.
    pub fn set(&self, value: T) {
        self.assert_home_thread("set");
        *self
            .inner
            .value
            .lock()
            .expect("DynamicValue lock poisoned") = value.clone();
        // Snapshot the listener list so a listener may detach itself (or a
        // sibling) while the notification pass is running.
        let snapshot: Vec<Listener<T>> = {
            let listeners = self
                .inner
                .listeners
                .lock()
                .expect("DynamicValue listener lock poisoned");
            listeners
                .entries
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect()
        };
        for listener in snapshot {
            listener(&value);
        }
    }

    /// Attach a listener; it is *not* invoked with the current value here.
    /// Binders push the current value themselves when they bind.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let mut listeners = self
            .inner
            .listeners
            .lock()
            .expect("DynamicValue listener lock poisoned");
        if listeners.entries.is_empty() {
            *self.inner.home.lock().expect("DynamicValue home lock") =
                Some(thread::current().id());
        }
        let id = SubscriptionId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        id
    }

    /// Detach a listener. Detaching an id that is not attached is a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut listeners = self
            .inner
            .listeners
            .lock()
            .expect("DynamicValue listener lock poisoned");
        listeners.entries.retain(|(entry_id, _)| *entry_id != id);
        if listeners.entries.is_empty() {
            *self.inner.home.lock().expect("DynamicValue home lock") = None;
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .expect("DynamicValue listener lock poisoned")
            .entries
            .len()
    }

    fn assert_home_thread(&self, operation: &str) {
        let home = *self.inner.home.lock().expect("DynamicValue home lock");
        if let Some(home) = home {
            let current = thread::current().id();
            assert_eq!(
                home, current,
                "DynamicValue::{operation} called off the thread that bound it \
                 (bound on {home:?}, called on {current:?})"
            );
        }
    }
}
