//! Single-threaded test harness around [`ComponentTree`].
//!
//! Uses the inline scheduler so every state update resolves synchronously on
//! the test thread, then pumps measure and mount so assertions see the fully
//! settled pipeline.

use std::sync::Arc;

use lithic_core::{
    Component, ComponentTree, ContentCell, GlobalKey, InlineScheduler, MountState, MountStats,
};
use lithic_layout::{MeasureSpec, Rect};

use crate::content::Probe;
use crate::engine::StackLayoutEngine;

pub struct TestTree {
    tree: ComponentTree,
    mount: MountState,
    viewport: (f32, f32),
}

impl TestTree {
    /// Build a tree with the given root, resolve it synchronously, and mount
    /// it at the default 800x600 viewport.
    pub fn new(root: Component) -> Self {
        Self::with_viewport(root, 800.0, 600.0)
    }

    pub fn with_viewport(root: Component, width: f32, height: f32) -> Self {
        let tree = ComponentTree::new(Arc::new(StackLayoutEngine), Box::new(InlineScheduler));
        let mut harness = Self {
            tree,
            mount: MountState::new(),
            viewport: (width, height),
        };
        harness.tree.set_root_sync(root);
        harness.pump();
        harness
    }

    /// Drain main tasks, re-measure, and re-mount. Call after anything that
    /// may have committed a new tree.
    pub fn pump(&mut self) {
        self.tree.run_main_tasks();
        let (width, height) = self.viewport;
        if let Some(layout) = self
            .tree
            .measure(MeasureSpec::AtMost(width), MeasureSpec::AtMost(height))
        {
            self.tree
                .mount(&layout, &mut self.mount)
                .expect("mount failed");
            self.tree.run_main_tasks();
        }
    }

    pub fn set_root(&mut self, root: Component) {
        self.tree.set_root_sync(root);
        self.pump();
    }

    pub fn tree(&self) -> &ComponentTree {
        &self.tree
    }

    pub fn stats(&self) -> MountStats {
        self.mount.stats()
    }

    pub fn mounted_len(&self) -> usize {
        self.mount.mounted_len()
    }

    pub fn content_at(&self, key: &GlobalKey) -> Option<ContentCell> {
        self.mount.content_at(key)
    }

    pub fn rect_at(&self, key: &GlobalKey) -> Option<Rect> {
        self.mount.rect_at(key)
    }

    /// Read a [`Probe`] mounted at `key`.
    pub fn with_probe<R>(&self, key: &GlobalKey, f: impl FnOnce(&mut Probe) -> R) -> Option<R> {
        self.content_at(key)?.with(f)
    }

    /// Unmount everything and run all effect cleanups.
    pub fn release(&mut self) {
        self.tree.release(&mut self.mount);
    }
}
