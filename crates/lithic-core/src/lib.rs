//! Core runtime: the component model, hooks, dynamic values, and the
//! resolve / layout / mount pipeline.
//!
//! A [`ComponentTree`] owns everything for one root component. State updates
//! enqueue against the tree and resolve on a background thread; layout runs
//! through a pluggable [`LayoutEngine`](lithic_layout::LayoutEngine); mounting
//! and all content-facing work happen on the thread that created the tree.

pub mod binder;
pub mod collections;
pub mod component;
pub mod dynamic;
pub mod effects;
pub mod error;
pub mod hash;
pub mod hooks;
pub mod key;
pub mod mount;
pub mod mountable;
pub mod resolve;
pub mod scheduler;
pub mod scope;
pub mod state;
pub mod tree;
mod tree_state;

pub use binder::{
    bind_dynamic, bind_dynamic_with, Binder, Content, ContentCell, DynamicBindingSpec,
    WeakContentCell,
};
pub use component::{is_equivalent, Component, Container, MountableComponent, RenderComponent};
pub use dynamic::{DynamicValue, SubscriptionId};
pub use effects::{Callback, CleanupFn};
pub use error::{ComponentError, LifecyclePhase};
pub use hooks::{
    use_cached, use_callback, use_effect, use_error_boundary, use_ref, use_state, use_tree_prop,
    ErrorBoundary, RefHandle,
};
pub use key::GlobalKey;
pub use mount::{MountState, MountStats};
pub use mountable::{ContentAllocator, MountPayload, Preparation, RenderUnitId};
pub use resolve::LayoutResult;
pub use scheduler::{BackgroundScheduler, InlineScheduler, LayoutJob, LayoutScheduler};
pub use scope::ResolveScope;
pub use state::State;
pub use tree::ComponentTree;

pub mod prelude {
    pub use crate::binder::{bind_dynamic, bind_dynamic_with, Binder, ContentCell};
    pub use crate::component::{Component, MountableComponent, RenderComponent};
    pub use crate::dynamic::DynamicValue;
    pub use crate::error::ComponentError;
    pub use crate::hooks::{
        use_cached, use_callback, use_effect, use_error_boundary, use_ref, use_state,
        use_tree_prop,
    };
    pub use crate::mountable::{ContentAllocator, MountPayload, Preparation};
    pub use crate::state::State;
    pub use crate::tree::ComponentTree;
}
