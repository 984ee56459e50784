//! Immutable style property bag.
//!
//! A [`Style`] is a nullable-field record of layout properties. Styles
//! compose with `+`: for most fields the right side wins when set, but the
//! box-model spacing fields (padding and margin) accumulate instead, with an
//! absent field treated as zero. `a + b + c` therefore reads as "apply `a`,
//! then let `b` refine it, then `c`".

use std::ops::Add;

use lithic_layout::{AlignSelf, EdgeValues, FlexDirection, LayoutProps, PositionType};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Style {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub flex_grow: Option<f32>,
    pub flex_shrink: Option<f32>,
    pub flex_basis: Option<f32>,
    pub align_self: Option<AlignSelf>,
    pub position_type: Option<PositionType>,
    pub direction: Option<FlexDirection>,
    pub position_left: Option<f32>,
    pub position_top: Option<f32>,
    pub position_right: Option<f32>,
    pub position_bottom: Option<f32>,
    pub padding_left: Option<f32>,
    pub padding_top: Option<f32>,
    pub padding_right: Option<f32>,
    pub padding_bottom: Option<f32>,
    pub margin_left: Option<f32>,
    pub margin_top: Option<f32>,
    pub margin_right: Option<f32>,
    pub margin_bottom: Option<f32>,
}

impl Style {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: f32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn size(self, width: f32, height: f32) -> Self {
        self.width(width).height(height)
    }

    pub fn flex_grow(mut self, grow: f32) -> Self {
        self.flex_grow = Some(grow);
        self
    }

    pub fn flex_shrink(mut self, shrink: f32) -> Self {
        self.flex_shrink = Some(shrink);
        self
    }

    pub fn flex_basis(mut self, basis: f32) -> Self {
        self.flex_basis = Some(basis);
        self
    }

    pub fn align_self(mut self, align: AlignSelf) -> Self {
        self.align_self = Some(align);
        self
    }

    pub fn position_type(mut self, position: PositionType) -> Self {
        self.position_type = Some(position);
        self
    }

    pub fn direction(mut self, direction: FlexDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn position_left(mut self, value: f32) -> Self {
        self.position_left = Some(value);
        self
    }

    pub fn position_top(mut self, value: f32) -> Self {
        self.position_top = Some(value);
        self
    }

    /// Add uniform padding to all sides.
    pub fn padding(self, p: f32) -> Self {
        self.padding_each(p, p, p, p)
    }

    pub fn padding_horizontal(self, h: f32) -> Self {
        self.padding_each(h, 0.0, h, 0.0)
    }

    pub fn padding_vertical(self, v: f32) -> Self {
        self.padding_each(0.0, v, 0.0, v)
    }

    /// Add padding to each side individually. Padding accumulates across
    /// calls and across merged styles.
    pub fn padding_each(mut self, left: f32, top: f32, right: f32, bottom: f32) -> Self {
        self.padding_left = Some(self.padding_left.unwrap_or(0.0) + left);
        self.padding_top = Some(self.padding_top.unwrap_or(0.0) + top);
        self.padding_right = Some(self.padding_right.unwrap_or(0.0) + right);
        self.padding_bottom = Some(self.padding_bottom.unwrap_or(0.0) + bottom);
        self
    }

    /// Add uniform margin to all sides.
    pub fn margin(self, m: f32) -> Self {
        self.margin_each(m, m, m, m)
    }

    pub fn margin_each(mut self, left: f32, top: f32, right: f32, bottom: f32) -> Self {
        self.margin_left = Some(self.margin_left.unwrap_or(0.0) + left);
        self.margin_top = Some(self.margin_top.unwrap_or(0.0) + top);
        self.margin_right = Some(self.margin_right.unwrap_or(0.0) + right);
        self.margin_bottom = Some(self.margin_bottom.unwrap_or(0.0) + bottom);
        self
    }

    /// Translate into the property set handed to the layout engine.
    pub fn layout_props(&self) -> LayoutProps {
        LayoutProps {
            width: self.width,
            height: self.height,
            flex_grow: self.flex_grow,
            flex_shrink: self.flex_shrink,
            flex_basis: self.flex_basis,
            align_self: self.align_self,
            position_type: self.position_type,
            direction: self.direction,
            position: EdgeValues {
                left: self.position_left.unwrap_or(0.0),
                top: self.position_top.unwrap_or(0.0),
                right: self.position_right.unwrap_or(0.0),
                bottom: self.position_bottom.unwrap_or(0.0),
            },
            padding: EdgeValues {
                left: self.padding_left.unwrap_or(0.0),
                top: self.padding_top.unwrap_or(0.0),
                right: self.padding_right.unwrap_or(0.0),
                bottom: self.padding_bottom.unwrap_or(0.0),
            },
            margin: EdgeValues {
                left: self.margin_left.unwrap_or(0.0),
                top: self.margin_top.unwrap_or(0.0),
                right: self.margin_right.unwrap_or(0.0),
                bottom: self.margin_bottom.unwrap_or(0.0),
            },
        }
    }
}

fn override_field<T: Copy>(left: Option<T>, right: Option<T>) -> Option<T> {
    right.or(left)
}

fn additive_field(left: Option<f32>, right: Option<f32>) -> Option<f32> {
    match (left, right) {
        (None, None) => None,
        (l, r) => Some(l.unwrap_or(0.0) + r.unwrap_or(0.0)),
    }
}

impl Add for Style {
    type Output = Style;

    fn add(self, rhs: Style) -> Style {
        Style {
            width: override_field(self.width, rhs.width),
            height: override_field(self.height, rhs.height),
            flex_grow: override_field(self.flex_grow, rhs.flex_grow),
            flex_shrink: override_field(self.flex_shrink, rhs.flex_shrink),
            flex_basis: override_field(self.flex_basis, rhs.flex_basis),
            align_self: override_field(self.align_self, rhs.align_self),
            position_type: override_field(self.position_type, rhs.position_type),
            direction: override_field(self.direction, rhs.direction),
            position_left: override_field(self.position_left, rhs.position_left),
            position_top: override_field(self.position_top, rhs.position_top),
            position_right: override_field(self.position_right, rhs.position_right),
            position_bottom: override_field(self.position_bottom, rhs.position_bottom),
            padding_left: additive_field(self.padding_left, rhs.padding_left),
            padding_top: additive_field(self.padding_top, rhs.padding_top),
            padding_right: additive_field(self.padding_right, rhs.padding_right),
            padding_bottom: additive_field(self.padding_bottom, rhs.padding_bottom),
            margin_left: additive_field(self.margin_left, rhs.margin_left),
            margin_top: additive_field(self.margin_top, rhs.margin_top),
            margin_right: additive_field(self.margin_right, rhs.margin_right),
            margin_bottom: additive_field(self.margin_bottom, rhs.margin_bottom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_style_overrides_sizing_fields() {
        let merged = Style::empty().width(10.0).height(5.0) + Style::empty().width(20.0);
        assert_eq!(merged.width, Some(20.0));
        assert_eq!(merged.height, Some(5.0));
    }

    #[test]
    fn absent_right_field_keeps_left_value() {
        let merged = Style::empty().align_self(AlignSelf::Center) + Style::empty();
        assert_eq!(merged.align_self, Some(AlignSelf::Center));
    }

    #[test]
    fn padding_is_additive_across_merge() {
        let merged = Style::empty().padding(4.0) + Style::empty().padding_each(1.0, 0.0, 0.0, 0.0);
        assert_eq!(merged.padding_left, Some(5.0));
        assert_eq!(merged.padding_top, Some(4.0));
        // Absent on both sides stays absent, not zero.
        let merged = Style::empty().width(1.0) + Style::empty().height(2.0);
        assert_eq!(merged.padding_left, None);
    }

    #[test]
    fn margin_is_additive_across_merge() {
        let merged = Style::empty().margin(2.0) + Style::empty().margin(3.0);
        assert_eq!(merged.margin_bottom, Some(5.0));
    }

    #[test]
    fn merge_is_associative_per_field() {
        let a = Style::empty().width(1.0).padding(1.0);
        let b = Style::empty().width(2.0).padding(2.0);
        let c = Style::empty().padding(3.0).align_self(AlignSelf::Stretch);
        let left = (a.clone() + b.clone()) + c.clone();
        let right = a + (b + c);
        assert_eq!(left, right);
        assert_eq!(left.width, Some(2.0));
        assert_eq!(left.padding_left, Some(6.0));
    }

    #[test]
    fn layout_props_translation() {
        let style = Style::empty()
            .size(100.0, 50.0)
            .padding(8.0)
            .flex_grow(1.0)
            .direction(FlexDirection::Row);
        let props = style.layout_props();
        assert_eq!(props.width, Some(100.0));
        assert_eq!(props.padding.horizontal(), 16.0);
        assert_eq!(props.flex_grow, Some(1.0));
        assert_eq!(props.direction, Some(FlexDirection::Row));
    }
}
