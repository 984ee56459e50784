//! Shared fixture components for the integration tests.

#![allow(dead_code)]

use std::any::Any;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};

use lithic_core::prelude::*;
use lithic_core::ResolveScope;
use lithic_layout::Size;
use lithic_testing::prelude::*;

/// Cell used to smuggle handles out of a render.
pub type Shared<T> = Arc<Mutex<Option<T>>>;

pub fn shared<T>() -> Shared<T> {
    Arc::new(Mutex::new(None))
}

pub fn put<T>(cell: &Shared<T>, value: T) {
    *cell.lock().unwrap() = Some(value);
}

pub fn get<T: Clone>(cell: &Shared<T>) -> T {
    cell.lock().unwrap().clone().expect("handle not captured yet")
}

/// Leaf that mounts a probe carrying its text, 40x10.
#[derive(Clone)]
pub struct Label {
    pub text: String,
    pub log: EventLog,
    pub counter: Option<Arc<AtomicUsize>>,
}

impl Label {
    pub fn new(text: impl Into<String>, log: EventLog) -> Self {
        Self {
            text: text.into(),
            log,
            counter: None,
        }
    }

    pub fn with_counter(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.counter = Some(counter);
        self
    }
}

impl MountableComponent for Label {
    fn name(&self) -> &'static str {
        "Label"
    }

    fn prepare(&self, _scope: &ResolveScope) -> Result<Preparation, ComponentError> {
        let allocator = match &self.counter {
            Some(counter) => ProbeAllocator::with_counter("probe", Arc::clone(counter)),
            None => ProbeAllocator::new("probe"),
        };
        let payload = MountPayload::new(allocator)
            .with_binder(LabelBinder::new(self.text.clone(), self.log.clone()))
            .with_measure(|_, _| Size::new(40.0, 10.0));
        Ok(Preparation::new(payload))
    }

    fn is_equivalent(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Label>()
            .is_some_and(|other| other.text == self.text)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Render component owning one integer state slot; mounts a label with the
/// current count.
pub struct Counter {
    pub log: EventLog,
    pub handle: Shared<State<i32>>,
}

impl RenderComponent for Counter {
    fn name(&self) -> &'static str {
        "Counter"
    }

    fn render(&self, _scope: &ResolveScope) -> Result<Component, ComponentError> {
        let count = use_state(|| 0i32);
        self.log.push(format!("render Counter {}", count.get()));
        put(&self.handle, count.clone());
        Ok(Component::mountable(Label::new(
            count.get().to_string(),
            self.log.clone(),
        )))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
