//! Resolution: turning a component tree into a resolved node tree.
//!
//! Resolution may run on a background thread. It reads a state snapshot
//! taken at pass start, recurses through render components, runs prepare on
//! mountable leaves, and reuses the previous pass's subtrees wherever the
//! equivalence check proves the inputs unchanged.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::sync::Arc;

use lithic_layout::{LayoutNode, LayoutRequest, Rect};
use lithic_style::Style;

use crate::collections::map::{HashMap, HashSet};
use crate::component::{self, Component};
use crate::effects::EffectEntry;
use crate::error::ComponentError;
use crate::key::GlobalKey;
use crate::mountable::MountPayload;
use crate::scope::{self, ResolveScope, SideEffect, TreePropMap};
use crate::tree::TreeCore;
use crate::tree_state::StateContainer;

/// One node of the resolved tree: the component that produced it (kept for
/// next pass's equivalence check), its style, its mount payload when it is a
/// leaf, and its resolved children.
pub(crate) struct ResolvedNode {
    pub key: GlobalKey,
    pub component: Component,
    pub style: Style,
    pub payload: Option<MountPayload>,
    pub children: Vec<Arc<ResolvedNode>>,
}

#[derive(Clone)]
pub(crate) struct BoundaryTarget {
    pub key: GlobalKey,
    pub slot: usize,
}

/// How a pass failed: caught by the nearest ancestor error boundary, or
/// unhandled and fatal to the pass.
pub(crate) enum ResolveFailure {
    Unhandled(ComponentError),
    Caught {
        target: BoundaryTarget,
        error: ComponentError,
    },
}

pub(crate) struct PassOutput {
    pub root: Arc<ResolvedNode>,
    pub containers: HashMap<GlobalKey, StateContainer>,
    pub effects: HashMap<GlobalKey, Vec<EffectEntry>>,
    pub side_effects: Vec<SideEffect>,
}

/// A pass that did not produce a tree. The hook containers built before the
/// failure come back with it: a boundary retry resumes from them, so state
/// created below the boundary (including the boundary's own slot) survives
/// into the rerun.
pub(crate) struct FailedPass {
    pub failure: ResolveFailure,
    pub containers: HashMap<GlobalKey, StateContainer>,
}

struct ResolvePass {
    core: Arc<TreeCore>,
    containers: RefCell<HashMap<GlobalKey, StateContainer>>,
    effects: RefCell<HashMap<GlobalKey, Vec<EffectEntry>>>,
    side_effects: RefCell<Vec<SideEffect>>,
    dirty: Vec<GlobalKey>,
    boundary_stack: RefCell<Vec<BoundaryTarget>>,
    tree_props: RefCell<Vec<(TypeId, Arc<dyn Any + Send + Sync>)>>,
}

impl ResolvePass {
    fn subtree_dirty(&self, key: &GlobalKey) -> bool {
        self.dirty.iter().any(|dirty| key.contains(dirty))
    }

    fn tree_prop_map(&self) -> TreePropMap {
        let mut map = TreePropMap::default();
        for (type_id, value) in self.tree_props.borrow().iter() {
            map.insert(*type_id, Arc::clone(value));
        }
        map
    }

    /// Run one component's render/prepare inside a fresh scope, then fold
    /// the scope's outputs back into the pass.
    fn run_scoped<R>(
        &self,
        key: &GlobalKey,
        f: impl FnOnce(&ResolveScope) -> R,
    ) -> (Option<usize>, R) {
        let container = self
            .containers
            .borrow_mut()
            .remove(key)
            .unwrap_or_default();
        let scope = ResolveScope::new(
            Arc::clone(&self.core),
            key.clone(),
            container,
            self.tree_prop_map(),
        );
        let guard = scope::enter(&scope);
        let result = f(&scope);
        drop(guard);
        let output = scope.finish();
        self.containers
            .borrow_mut()
            .insert(key.clone(), output.container);
        self.effects
            .borrow_mut()
            .insert(key.clone(), output.effects);
        self.side_effects
            .borrow_mut()
            .extend(output.side_effects);
        (output.boundary_slot, result)
    }

    /// Convert a lifecycle error into a pass failure, routing it to the
    /// nearest enclosing boundary when one is in scope.
    fn fail(&self, error: ComponentError) -> ResolveFailure {
        match self.boundary_stack.borrow().last() {
            Some(target) => {
                log::debug!(
                    "routing error from `{}` to boundary {}",
                    error.component,
                    target.key
                );
                ResolveFailure::Caught {
                    target: target.clone(),
                    error,
                }
            }
            None => ResolveFailure::Unhandled(error),
        }
    }
}

pub(crate) fn resolve_root(
    core: Arc<TreeCore>,
    containers: HashMap<GlobalKey, StateContainer>,
    dirty: Vec<GlobalKey>,
    previous: Option<&Arc<ResolvedNode>>,
    root: &Component,
) -> Result<PassOutput, FailedPass> {
    let pass = ResolvePass {
        core,
        containers: RefCell::new(containers),
        effects: RefCell::new(HashMap::default()),
        side_effects: RefCell::new(Vec::new()),
        dirty,
        boundary_stack: RefCell::new(Vec::new()),
        tree_props: RefCell::new(Vec::new()),
    };
    let root_key = GlobalKey::root().child(root.name(), 0);
    match resolve_component(&pass, root, root_key, previous) {
        Ok(node) => Ok(PassOutput {
            root: node,
            containers: pass.containers.into_inner(),
            effects: pass.effects.into_inner(),
            side_effects: pass.side_effects.into_inner(),
        }),
        Err(failure) => Err(FailedPass {
            failure,
            containers: pass.containers.into_inner(),
        }),
    }
}

fn resolve_component(
    pass: &ResolvePass,
    component: &Component,
    key: GlobalKey,
    previous: Option<&Arc<ResolvedNode>>,
) -> Result<Arc<ResolvedNode>, ResolveFailure> {
    // Pure-render skip: reuse the previous resolution when the component is
    // equivalent and no state under this subtree changed.
    if let Some(prev) = previous {
        if prev.key == key
            && !pass.subtree_dirty(&key)
            && component::is_equivalent(&prev.component, component)
        {
            log::trace!("reusing resolved subtree at {key}");
            return Ok(Arc::clone(prev));
        }
    }

    match component {
        Component::Render(render) => {
            let (boundary_slot, rendered) = pass.run_scoped(&key, |scope| render.render(scope));
            let child = match rendered {
                Ok(child) => child,
                Err(error) => return Err(pass.fail(error)),
            };
            if let Some(slot) = boundary_slot {
                pass.boundary_stack.borrow_mut().push(BoundaryTarget {
                    key: key.clone(),
                    slot,
                });
            }
            let child_key = key.child(child.name(), 0);
            let prev_child = previous.and_then(|prev| prev.children.first());
            let resolved = resolve_component(pass, &child, child_key, prev_child);
            if boundary_slot.is_some() {
                pass.boundary_stack.borrow_mut().pop();
            }
            Ok(Arc::new(ResolvedNode {
                key,
                component: component.clone(),
                style: Style::default(),
                payload: None,
                children: vec![resolved?],
            }))
        }
        Component::Mountable(mountable) => {
            let (_, prepared) = pass.run_scoped(&key, |scope| mountable.prepare(scope));
            let preparation = match prepared {
                Ok(preparation) => preparation,
                Err(error) => return Err(pass.fail(error)),
            };
            Ok(Arc::new(ResolvedNode {
                key,
                component: component.clone(),
                style: preparation.style,
                payload: Some(preparation.payload),
                children: Vec::new(),
            }))
        }
        Component::Container(container) => {
            let mut children = Vec::with_capacity(container.children.len());
            for (index, child) in container.children.iter().enumerate() {
                let child_key = key.child(child.name(), index);
                let prev_child = previous.and_then(|prev| prev.children.get(index));
                children.push(resolve_component(pass, child, child_key, prev_child)?);
            }
            Ok(Arc::new(ResolvedNode {
                key,
                component: component.clone(),
                style: container.style.clone(),
                payload: None,
                children,
            }))
        }
        Component::TreeProp(holder) => {
            pass.tree_props
                .borrow_mut()
                .push((holder.type_id, Arc::clone(&holder.value)));
            let child_key = key.child(holder.child.name(), 0);
            let prev_child = previous.and_then(|prev| prev.children.first());
            let resolved = resolve_component(pass, &holder.child, child_key, prev_child);
            pass.tree_props.borrow_mut().pop();
            Ok(Arc::new(ResolvedNode {
                key,
                component: component.clone(),
                style: Style::default(),
                payload: None,
                children: vec![resolved?],
            }))
        }
    }
}

/// All global keys present in the committed tree, including reused subtrees.
pub(crate) fn collect_live_keys(root: &Arc<ResolvedNode>, keys: &mut HashSet<GlobalKey>) {
    keys.insert(root.key.clone());
    for child in &root.children {
        collect_live_keys(child, keys);
    }
}

/// Translate a resolved tree into the request tree handed to the layout
/// engine.
pub(crate) fn build_layout_request(node: &ResolvedNode) -> LayoutRequest {
    let mut request = LayoutRequest::new(node.style.layout_props());
    if let Some(payload) = &node.payload {
        if let Some(measure) = payload.measure_closure() {
            request = request.with_measure(Box::new(move |w, h| measure(w, h)));
        }
    }
    for child in &node.children {
        request.push_child(build_layout_request(child));
    }
    request
}

/// One laid-out, resolved node: the zip of the resolved tree with the
/// engine's output.
pub(crate) struct PositionedNode {
    pub node: Arc<ResolvedNode>,
    pub rect: Rect,
    pub children: Vec<PositionedNode>,
}

/// Result of measuring a committed tree; the input to mounting.
pub struct LayoutResult {
    pub(crate) root: PositionedNode,
}

impl LayoutResult {
    pub fn root_rect(&self) -> Rect {
        self.root.rect
    }
}

pub(crate) fn zip_layout(node: &Arc<ResolvedNode>, layout: &LayoutNode) -> PositionedNode {
    debug_assert_eq!(
        node.children.len(),
        layout.children.len(),
        "layout engine returned a tree with a different shape"
    );
    PositionedNode {
        node: Arc::clone(node),
        rect: layout.rect,
        children: node
            .children
            .iter()
            .zip(&layout.children)
            .map(|(child, child_layout)| zip_layout(child, child_layout))
            .collect(),
    }
}
