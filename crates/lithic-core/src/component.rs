//! The component model: a closed set of component kinds plus the
//! equivalence check that powers pure-render skipping.

use std::any::{Any, TypeId};
use std::sync::Arc;

use lithic_style::Style;

use crate::error::ComponentError;
use crate::mountable::Preparation;
use crate::scope::ResolveScope;

/// A component whose render produces a child component; it mounts nothing of
/// its own and resolution recurses into the child.
pub trait RenderComponent: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Must be a pure function of declared fields plus currently-visible
    /// hook state: the framework may skip re-running it when an equivalent
    /// instance is seen.
    fn render(&self, scope: &ResolveScope) -> Result<Component, ComponentError>;

    /// Explicit identity. Two instances of the same type with the same
    /// identity are equivalent without a field comparison.
    fn identity(&self) -> Option<u64> {
        None
    }

    /// Field-wise equality contract. `other` is guaranteed to be the same
    /// concrete type; implementations downcast and compare with `PartialEq`.
    fn is_equivalent(&self, other: &dyn Any) -> bool {
        let _ = other;
        false
    }

    fn as_any(&self) -> &dyn Any;
}

/// A leaf component that mounts platform content. Prepare produces the
/// mount payload (content allocator + binders) and a style.
pub trait MountableComponent: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn prepare(&self, scope: &ResolveScope) -> Result<Preparation, ComponentError>;

    fn identity(&self) -> Option<u64> {
        None
    }

    fn is_equivalent(&self, other: &dyn Any) -> bool {
        let _ = other;
        false
    }

    fn as_any(&self) -> &dyn Any;
}

/// A branch node grouping children under a shared style. The layout engine
/// decides how the children flow (the style's direction field).
#[derive(Clone)]
pub struct Container {
    pub style: Style,
    pub children: Vec<Component>,
}

/// Provides a typed value to every descendant's `use_tree_prop` lookup.
#[derive(Clone)]
pub struct TreePropHolder {
    pub(crate) type_id: TypeId,
    pub(crate) value: Arc<dyn Any + Send + Sync>,
    pub(crate) child: Arc<Component>,
}

/// The closed set of component kinds.
#[derive(Clone)]
pub enum Component {
    Render(Arc<dyn RenderComponent>),
    Mountable(Arc<dyn MountableComponent>),
    Container(Container),
    TreeProp(TreePropHolder),
}

impl Component {
    pub fn render(component: impl RenderComponent) -> Self {
        Component::Render(Arc::new(component))
    }

    pub fn mountable(component: impl MountableComponent) -> Self {
        Component::Mountable(Arc::new(component))
    }

    pub fn container(style: Style, children: Vec<Component>) -> Self {
        Component::Container(Container { style, children })
    }

    /// Provide `value` as a tree prop to the `child` subtree.
    pub fn tree_prop<T: Send + Sync + 'static>(value: T, child: Component) -> Self {
        Component::TreeProp(TreePropHolder {
            type_id: TypeId::of::<T>(),
            value: Arc::new(value),
            child: Arc::new(child),
        })
    }

    /// Short name used in global keys and diagnostics.
    pub fn name(&self) -> &str {
        match self {
            Component::Render(c) => c.name(),
            Component::Mountable(c) => c.name(),
            Component::Container(_) => "Container",
            Component::TreeProp(_) => "TreeProp",
        }
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Component({})", self.name())
    }
}

/// Equivalence governing the pure-render skip: identical reference, or same
/// runtime type with the same explicit identity, or same runtime type with
/// field-wise equality as declared by the component's `is_equivalent`.
pub fn is_equivalent(a: &Component, b: &Component) -> bool {
    match (a, b) {
        (Component::Render(x), Component::Render(y)) => {
            if Arc::ptr_eq(x, y) {
                return true;
            }
            if x.as_any().type_id() != y.as_any().type_id() {
                return false;
            }
            match (x.identity(), y.identity()) {
                (Some(a), Some(b)) if a == b => true,
                _ => x.is_equivalent(y.as_any()),
            }
        }
        (Component::Mountable(x), Component::Mountable(y)) => {
            if Arc::ptr_eq(x, y) {
                return true;
            }
            if x.as_any().type_id() != y.as_any().type_id() {
                return false;
            }
            match (x.identity(), y.identity()) {
                (Some(a), Some(b)) if a == b => true,
                _ => x.is_equivalent(y.as_any()),
            }
        }
        (Component::Container(x), Component::Container(y)) => {
            x.style == y.style
                && x.children.len() == y.children.len()
                && x.children
                    .iter()
                    .zip(&y.children)
                    .all(|(a, b)| is_equivalent(a, b))
        }
        (Component::TreeProp(x), Component::TreeProp(y)) => {
            Arc::ptr_eq(&x.value, &y.value) && is_equivalent(&x.child, &y.child)
        }
        _ => false,
    }
}
