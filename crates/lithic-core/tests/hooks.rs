//! Hook behavior through real renders: callback identity, refs, cached
//! values, and tree props.

mod common;

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{get, put, shared, Label, Shared};
use lithic_core::effects::Callback;
use lithic_core::prelude::*;
use lithic_core::{ResolveScope, State};
use lithic_testing::prelude::*;

struct CallbackHost {
    log: EventLog,
    count: Shared<State<i32>>,
    callback: Shared<Callback<i32, i32>>,
}

impl RenderComponent for CallbackHost {
    fn name(&self) -> &'static str {
        "CallbackHost"
    }

    fn render(&self, _scope: &ResolveScope) -> Result<Component, ComponentError> {
        let count = use_state(|| 0i32);
        let offset = count.get();
        let callback = use_callback(move |x: i32| x + offset);
        put(&self.count, count);
        put(&self.callback, callback);
        Ok(Component::mountable(Label::new("cb", self.log.clone())))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn callback_identity_is_stable_and_behavior_tracks_state() {
    let log = EventLog::new();
    let count = shared();
    let callback = shared();
    let mut tree = TestTree::new(Component::render(CallbackHost {
        log: log.clone(),
        count: count.clone(),
        callback: callback.clone(),
    }));

    let first: Callback<i32, i32> = get(&callback);
    assert_eq!(first.call(10), 10);

    get::<State<i32>>(&count).update(5);
    tree.pump();

    let second: Callback<i32, i32> = get(&callback);
    assert!(first == second, "callback identity changed across renders");
    assert_eq!(first.call(10), 15, "delegate must capture the new state");
}

struct RefHost {
    log: EventLog,
    handle: Shared<lithic_core::RefHandle<Vec<i32>>>,
    count: Shared<State<i32>>,
}

impl RenderComponent for RefHost {
    fn name(&self) -> &'static str {
        "RefHost"
    }

    fn render(&self, _scope: &ResolveScope) -> Result<Component, ComponentError> {
        let count = use_state(|| 0i32);
        let history = use_ref(Vec::new);
        history.with(|h| h.push(count.get()));
        put(&self.handle, history);
        put(&self.count, count);
        Ok(Component::mountable(Label::new("ref", self.log.clone())))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn ref_cell_survives_rerenders_without_triggering_them() {
    let log = EventLog::new();
    let handle = shared();
    let count = shared();
    let mut tree = TestTree::new(Component::render(RefHost {
        log: log.clone(),
        handle: handle.clone(),
        count: count.clone(),
    }));

    get::<State<i32>>(&count).update(1);
    tree.pump();
    get::<State<i32>>(&count).update(2);
    tree.pump();

    let history = get::<lithic_core::RefHandle<Vec<i32>>>(&handle).get();
    assert_eq!(history, vec![0, 1, 2], "one entry per render, same cell");
}

struct CachedHost {
    log: EventLog,
    computes: Arc<AtomicUsize>,
    count: Shared<State<i32>>,
}

impl RenderComponent for CachedHost {
    fn name(&self) -> &'static str {
        "CachedHost"
    }

    fn render(&self, _scope: &ResolveScope) -> Result<Component, ComponentError> {
        let count = use_state(|| 0i32);
        let bucket = count.get() / 2;
        let computes = Arc::clone(&self.computes);
        let expensive: String = use_cached(bucket, move || {
            computes.fetch_add(1, Ordering::SeqCst);
            format!("bucket {bucket}")
        });
        put(&self.count, count);
        Ok(Component::mountable(Label::new(expensive, self.log.clone())))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn cached_value_recomputes_only_when_deps_change() {
    let log = EventLog::new();
    let computes = Arc::new(AtomicUsize::new(0));
    let count = shared();
    let mut tree = TestTree::new(Component::render(CachedHost {
        log: log.clone(),
        computes: Arc::clone(&computes),
        count: count.clone(),
    }));
    assert_eq!(computes.load(Ordering::SeqCst), 1);

    // 0 -> 1: same bucket, no recompute.
    get::<State<i32>>(&count).update(1);
    tree.pump();
    assert_eq!(computes.load(Ordering::SeqCst), 1);

    // 1 -> 2: new bucket.
    get::<State<i32>>(&count).update(2);
    tree.pump();
    assert_eq!(computes.load(Ordering::SeqCst), 2);
}

#[derive(Clone, PartialEq)]
struct Theme {
    accent: String,
}

struct ThemedLabel {
    log: EventLog,
}

impl RenderComponent for ThemedLabel {
    fn name(&self) -> &'static str {
        "ThemedLabel"
    }

    fn render(&self, _scope: &ResolveScope) -> Result<Component, ComponentError> {
        let theme = use_tree_prop::<Theme>().unwrap_or(Theme {
            accent: "plain".to_string(),
        });
        Ok(Component::mountable(Label::new(theme.accent, self.log.clone())))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn tree_prop_reaches_descendants() {
    let log = EventLog::new();
    let tree = TestTree::new(Component::tree_prop(
        Theme {
            accent: "crimson".to_string(),
        },
        Component::render(ThemedLabel { log: log.clone() }),
    ));
    let key = lithic_core::GlobalKey::root()
        .child("TreeProp", 0)
        .child("ThemedLabel", 0)
        .child("Label", 0);
    assert_eq!(
        tree.with_probe(&key, |p| p.label.clone()),
        Some("crimson".to_string())
    );
}

#[test]
fn absent_tree_prop_falls_back() {
    let log = EventLog::new();
    let tree = TestTree::new(Component::render(ThemedLabel { log: log.clone() }));
    let key = lithic_core::GlobalKey::root()
        .child("ThemedLabel", 0)
        .child("Label", 0);
    assert_eq!(
        tree.with_probe(&key, |p| p.label.clone()),
        Some("plain".to_string())
    );
}
