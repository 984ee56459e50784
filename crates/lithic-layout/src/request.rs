//! The request tree handed to the layout engine.

use crate::{LayoutProps, MeasureSpec, Size};

/// Leaf measurement callback supplied by a mountable node's payload.
///
/// Must be a pure function of the constraints: layout may run on a
/// background thread and may be re-invoked for the same node.
pub type MeasureFn = dyn Fn(MeasureSpec, MeasureSpec) -> Size + Send + Sync;

/// One node of the tree submitted to a [`crate::LayoutEngine`].
pub struct LayoutRequest {
    pub props: LayoutProps,
    pub measure: Option<Box<MeasureFn>>,
    pub children: Vec<LayoutRequest>,
}

impl LayoutRequest {
    pub fn new(props: LayoutProps) -> Self {
        Self {
            props,
            measure: None,
            children: Vec::new(),
        }
    }

    pub fn with_measure(mut self, measure: Box<MeasureFn>) -> Self {
        self.measure = Some(measure);
        self
    }

    pub fn push_child(&mut self, child: LayoutRequest) {
        self.children.push(child);
    }

    /// Measure this node as a leaf, falling back to constraint resolution
    /// when no measure function is present.
    pub fn measure_leaf(&self, width: MeasureSpec, height: MeasureSpec) -> Size {
        match &self.measure {
            Some(measure) => measure(width, height),
            None => Size::new(width.resolve(0.0), height.resolve(0.0)),
        }
    }
}

impl std::fmt::Debug for LayoutRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutRequest")
            .field("props", &self.props)
            .field("has_measure", &self.measure.is_some())
            .field("children", &self.children)
            .finish()
    }
}
