//! Probe content and binders that record what the pipeline does to them.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use lithic_core::error::{ComponentError, LifecyclePhase};
use lithic_core::{Binder, Content, ContentAllocator};

/// Shared, thread-safe event log for asserting call order across the
/// pipeline's threads.
#[derive(Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries
            .lock()
            .expect("EventLog lock poisoned")
            .push(entry.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.entries.lock().expect("EventLog lock poisoned").clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut self.entries.lock().expect("EventLog lock poisoned"))
    }
}

/// Stand-in for a platform view: plain fields the binders write to.
#[derive(Default)]
pub struct Probe {
    pub label: String,
    pub alpha: f32,
}

/// Allocates [`Probe`] content and counts allocations, so tests can tell a
/// pooled reuse from a fresh allocation.
pub struct ProbeAllocator {
    kind: &'static str,
    created: Arc<AtomicUsize>,
}

impl ProbeAllocator {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            created: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Allocator reporting into an externally owned counter, for components
    /// that build a fresh allocator on every prepare.
    pub fn with_counter(kind: &'static str, created: Arc<AtomicUsize>) -> Self {
        Self { kind, created }
    }

    /// Handle to the allocation counter; stays valid after the allocator
    /// moves into a payload.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.created)
    }
}

impl ContentAllocator for ProbeAllocator {
    fn create_content(&self) -> Content {
        self.created.fetch_add(1, Ordering::SeqCst);
        Box::new(Probe {
            alpha: 1.0,
            ..Probe::default()
        })
    }

    fn content_kind(&self) -> &'static str {
        self.kind
    }
}

/// Sets the probe's label; re-binds only when the text changed.
pub struct LabelBinder {
    pub text: String,
    pub log: EventLog,
}

impl LabelBinder {
    pub fn new(text: impl Into<String>, log: EventLog) -> Self {
        Self {
            text: text.into(),
            log,
        }
    }
}

impl Binder for LabelBinder {
    fn name(&self) -> &'static str {
        "label"
    }

    fn bind(&self, content: &mut Content) -> Result<(), ComponentError> {
        let probe = content.downcast_mut::<Probe>().ok_or_else(|| {
            ComponentError::new("LabelBinder", LifecyclePhase::Bind, "content is not a Probe")
        })?;
        probe.label = self.text.clone();
        self.log.push(format!("bind label={}", self.text));
        Ok(())
    }

    fn unbind(&self, content: &mut Content) {
        if let Some(probe) = content.downcast_mut::<Probe>() {
            probe.label.clear();
        }
        self.log.push(format!("unbind label={}", self.text));
    }

    fn should_update(&self, previous: &dyn Binder) -> bool {
        previous
            .as_any()
            .downcast_ref::<LabelBinder>()
            .map_or(true, |previous| previous.text != self.text)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A binder that fails to bind; used to exercise mount error paths.
pub struct FailingBinder;

impl Binder for FailingBinder {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn bind(&self, _content: &mut Content) -> Result<(), ComponentError> {
        Err(ComponentError::new(
            "FailingBinder",
            LifecyclePhase::Bind,
            "bind refused",
        ))
    }

    fn unbind(&self, _content: &mut Content) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}
