//! Geometry types and the boundary contract with the external layout engine.
//!
//! The core never lays anything out itself. It produces a [`LayoutRequest`]
//! tree (style-derived properties plus an optional leaf measure function) and
//! hands it to a [`LayoutEngine`], which returns a [`LayoutTree`] whose nodes
//! correspond one-to-one, in order, with the request nodes.

use std::fmt;

pub mod request;

pub use request::{LayoutRequest, MeasureFn};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Width/height constraint passed into measurement: a mode plus a size.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MeasureSpec {
    /// No constraint; the content picks its intrinsic size.
    Unspecified,
    /// The content must be exactly this large.
    Exactly(f32),
    /// The content may be at most this large.
    AtMost(f32),
}

impl MeasureSpec {
    /// Resolve a desired size against this constraint.
    pub fn resolve(self, desired: f32) -> f32 {
        match self {
            MeasureSpec::Unspecified => desired,
            MeasureSpec::Exactly(size) => size,
            MeasureSpec::AtMost(max) => desired.min(max),
        }
    }

    /// The constraint's size, if it carries one.
    pub fn size(self) -> Option<f32> {
        match self {
            MeasureSpec::Unspecified => None,
            MeasureSpec::Exactly(size) | MeasureSpec::AtMost(size) => Some(size),
        }
    }
}

impl fmt::Display for MeasureSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureSpec::Unspecified => write!(f, "unspecified"),
            MeasureSpec::Exactly(size) => write!(f, "exactly({size})"),
            MeasureSpec::AtMost(size) => write!(f, "at-most({size})"),
        }
    }
}

/// Per-edge values for padding, margin and absolute positioning.
///
/// Edge fields are additive under style merge, so the zero value stands in
/// for "absent".
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EdgeValues {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl EdgeValues {
    pub fn uniform(value: f32) -> Self {
        Self {
            left: value,
            top: value,
            right: value,
            bottom: value,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AlignSelf {
    #[default]
    Auto,
    FlexStart,
    Center,
    FlexEnd,
    Stretch,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PositionType {
    #[default]
    Relative,
    Absolute,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FlexDirection {
    #[default]
    Column,
    Row,
}

/// The style-derived property set a node exposes to the layout engine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutProps {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub flex_grow: Option<f32>,
    pub flex_shrink: Option<f32>,
    pub flex_basis: Option<f32>,
    pub align_self: Option<AlignSelf>,
    pub position_type: Option<PositionType>,
    pub direction: Option<FlexDirection>,
    pub position: EdgeValues,
    pub padding: EdgeValues,
    pub margin: EdgeValues,
}

/// One laid-out node: a rect in the root's coordinate space plus children in
/// the same order as the corresponding [`LayoutRequest`] children.
#[derive(Clone, Debug, Default)]
pub struct LayoutNode {
    pub rect: Rect,
    pub children: Vec<LayoutNode>,
}

/// Result of one layout pass over a request tree.
#[derive(Clone, Debug)]
pub struct LayoutTree {
    pub root: LayoutNode,
}

/// External layout collaborator (a flexbox engine in production).
///
/// Implementations must return a tree with the same shape as the request:
/// the core zips the two trees positionally when mounting.
pub trait LayoutEngine: Send + Sync {
    fn compute(&self, root: &LayoutRequest, width: MeasureSpec, height: MeasureSpec) -> LayoutTree;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_spec_resolution() {
        assert_eq!(MeasureSpec::Unspecified.resolve(40.0), 40.0);
        assert_eq!(MeasureSpec::Exactly(80.0).resolve(40.0), 80.0);
        assert_eq!(MeasureSpec::AtMost(30.0).resolve(40.0), 30.0);
        assert_eq!(MeasureSpec::AtMost(50.0).resolve(40.0), 40.0);
    }

    #[test]
    fn edge_values_span_each_axis() {
        let edges = EdgeValues {
            left: 5.0,
            right: 4.0,
            top: 4.0,
            bottom: 4.0,
        };
        assert_eq!(edges.horizontal(), 9.0);
        assert_eq!(edges.vertical(), 8.0);
    }
}
