//! The immutable "what to mount" descriptor produced by prepare.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lithic_layout::{MeasureSpec, Size};
use lithic_style::Style;
use smallvec::SmallVec;

use crate::binder::{Binder, Content, DynamicBindingSpec};

static NEXT_RENDER_UNIT_ID: AtomicU64 = AtomicU64::new(1);

/// Generated identity of one payload, used for diffing across renders: a
/// reused payload keeps its id, so mount can tell "same unit" from "new
/// unit" without comparing binder contents.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct RenderUnitId(u64);

impl RenderUnitId {
    fn next() -> Self {
        Self(NEXT_RENDER_UNIT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Allocates content instances for a payload. Content of the same kind may
/// be recycled through the mount state's pool.
pub trait ContentAllocator: Send + Sync + 'static {
    fn create_content(&self) -> Content;

    /// Pooling key: contents sharing a key are interchangeable once unbound.
    fn content_kind(&self) -> &'static str;
}

type MeasureClosure = dyn Fn(MeasureSpec, MeasureSpec) -> Size + Send + Sync;

/// Immutable descriptor of what a mountable component mounts: a content
/// allocator, an ordered binder list, dynamic bindings, and an optional leaf
/// measure function.
#[derive(Clone)]
pub struct MountPayload {
    id: RenderUnitId,
    allocator: Arc<dyn ContentAllocator>,
    binders: SmallVec<[Arc<dyn Binder>; 4]>,
    dynamic_bindings: SmallVec<[DynamicBindingSpec; 2]>,
    measure: Option<Arc<MeasureClosure>>,
}

impl MountPayload {
    pub fn new(allocator: impl ContentAllocator) -> Self {
        Self {
            id: RenderUnitId::next(),
            allocator: Arc::new(allocator),
            binders: SmallVec::new(),
            dynamic_bindings: SmallVec::new(),
            measure: None,
        }
    }

    pub fn with_binder(mut self, binder: impl Binder) -> Self {
        self.binders.push(Arc::new(binder));
        self
    }

    pub fn with_dynamic_binding(mut self, binding: DynamicBindingSpec) -> Self {
        self.dynamic_bindings.push(binding);
        self
    }

    pub fn with_measure(
        mut self,
        measure: impl Fn(MeasureSpec, MeasureSpec) -> Size + Send + Sync + 'static,
    ) -> Self {
        self.measure = Some(Arc::new(measure));
        self
    }

    pub fn id(&self) -> RenderUnitId {
        self.id
    }

    pub fn content_kind(&self) -> &'static str {
        self.allocator.content_kind()
    }

    pub(crate) fn allocator(&self) -> &dyn ContentAllocator {
        &*self.allocator
    }

    pub(crate) fn binders(&self) -> &[Arc<dyn Binder>] {
        &self.binders
    }

    pub(crate) fn dynamic_bindings(&self) -> &[DynamicBindingSpec] {
        &self.dynamic_bindings
    }

    pub(crate) fn measure_closure(&self) -> Option<Arc<MeasureClosure>> {
        self.measure.clone()
    }
}

impl std::fmt::Debug for MountPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountPayload")
            .field("id", &self.id)
            .field("kind", &self.allocator.content_kind())
            .field("binders", &self.binders.len())
            .field("dynamic_bindings", &self.dynamic_bindings.len())
            .finish()
    }
}

/// Result of a mountable component's prepare phase.
pub struct Preparation {
    pub payload: MountPayload,
    pub style: Style,
}

impl Preparation {
    pub fn new(payload: MountPayload) -> Self {
        Self {
            payload,
            style: Style::default(),
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}
