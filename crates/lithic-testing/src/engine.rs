//! A deterministic layout engine for tests.
//!
//! Stacks children along the node's direction at their intrinsic sizes,
//! honoring explicit width/height, padding, and margin. No flex distribution
//! or alignment; tests that care about exact geometry set explicit sizes.

use lithic_layout::{
    FlexDirection, LayoutEngine, LayoutNode, LayoutRequest, LayoutTree, MeasureSpec, Rect,
};

#[derive(Default)]
pub struct StackLayoutEngine;

impl LayoutEngine for StackLayoutEngine {
    fn compute(&self, root: &LayoutRequest, width: MeasureSpec, height: MeasureSpec) -> LayoutTree {
        LayoutTree {
            root: layout_node(root, width, height, 0.0, 0.0),
        }
    }
}

fn layout_node(
    request: &LayoutRequest,
    width: MeasureSpec,
    height: MeasureSpec,
    x: f32,
    y: f32,
) -> LayoutNode {
    let width = match request.props.width {
        Some(exact) => MeasureSpec::Exactly(exact),
        None => width,
    };
    let height = match request.props.height {
        Some(exact) => MeasureSpec::Exactly(exact),
        None => height,
    };

    if request.children.is_empty() {
        let size = request.measure_leaf(width, height);
        return LayoutNode {
            rect: Rect::new(x, y, size.width, size.height),
            children: Vec::new(),
        };
    }

    let padding = request.props.padding;
    let direction = request.props.direction.unwrap_or_default();
    let inner_width = width.size().map(|w| w - padding.horizontal());
    let inner_height = height.size().map(|h| h - padding.vertical());
    let child_width = inner_width.map_or(MeasureSpec::Unspecified, MeasureSpec::AtMost);
    let child_height = inner_height.map_or(MeasureSpec::Unspecified, MeasureSpec::AtMost);

    let mut children = Vec::with_capacity(request.children.len());
    let mut cursor = 0.0f32;
    let mut cross = 0.0f32;
    for child in &request.children {
        let margin = child.props.margin;
        let (child_x, child_y) = match direction {
            FlexDirection::Column => (x + padding.left + margin.left, y + padding.top + cursor + margin.top),
            FlexDirection::Row => (x + padding.left + cursor + margin.left, y + padding.top + margin.top),
        };
        let node = layout_node(child, child_width, child_height, child_x, child_y);
        match direction {
            FlexDirection::Column => {
                cursor += node.rect.height + margin.vertical();
                cross = cross.max(node.rect.width + margin.horizontal());
            }
            FlexDirection::Row => {
                cursor += node.rect.width + margin.horizontal();
                cross = cross.max(node.rect.height + margin.vertical());
            }
        }
        children.push(node);
    }

    let (content_width, content_height) = match direction {
        FlexDirection::Column => (cross, cursor),
        FlexDirection::Row => (cursor, cross),
    };
    let node_width = width.resolve(content_width + padding.horizontal());
    let node_height = height.resolve(content_height + padding.vertical());
    LayoutNode {
        rect: Rect::new(x, y, node_width, node_height),
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lithic_layout::{EdgeValues, LayoutProps, Size};

    fn leaf(width: f32, height: f32) -> LayoutRequest {
        LayoutRequest::new(LayoutProps::default())
            .with_measure(Box::new(move |_, _| Size::new(width, height)))
    }

    #[test]
    fn column_stacks_children_vertically() {
        let mut root = LayoutRequest::new(LayoutProps::default());
        root.push_child(leaf(30.0, 10.0));
        root.push_child(leaf(20.0, 15.0));
        let tree = StackLayoutEngine.compute(
            &root,
            MeasureSpec::AtMost(100.0),
            MeasureSpec::AtMost(100.0),
        );
        assert_eq!(tree.root.children[0].rect, Rect::new(0.0, 0.0, 30.0, 10.0));
        assert_eq!(tree.root.children[1].rect, Rect::new(0.0, 10.0, 20.0, 15.0));
        assert_eq!(tree.root.rect.size(), Size::new(30.0, 25.0));
    }

    #[test]
    fn padding_offsets_children() {
        let mut root = LayoutRequest::new(LayoutProps {
            padding: EdgeValues::uniform(5.0),
            ..LayoutProps::default()
        });
        root.push_child(leaf(10.0, 10.0));
        let tree = StackLayoutEngine.compute(
            &root,
            MeasureSpec::Unspecified,
            MeasureSpec::Unspecified,
        );
        assert_eq!(tree.root.children[0].rect, Rect::new(5.0, 5.0, 10.0, 10.0));
        assert_eq!(tree.root.rect.size(), Size::new(20.0, 20.0));
    }

    #[test]
    fn explicit_size_wins_over_content() {
        let mut root = LayoutRequest::new(LayoutProps {
            width: Some(50.0),
            height: Some(40.0),
            ..LayoutProps::default()
        });
        root.push_child(leaf(10.0, 10.0));
        let tree = StackLayoutEngine.compute(
            &root,
            MeasureSpec::Unspecified,
            MeasureSpec::Unspecified,
        );
        assert_eq!(tree.root.rect.size(), Size::new(50.0, 40.0));
    }
}
