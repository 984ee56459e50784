//! The component tree: versioned resolve passes, latest-wins commit, and the
//! UI-thread task queue.
//!
//! State updates enqueue against the tree and schedule a resolve pass, by
//! default on a background thread. Each pass claims a version; a pass whose
//! version is older than the committed one is discarded wholesale, and its
//! queued updates stay for the next pass. Everything content-facing (effects,
//! callback swaps, mounting) funnels through the main task queue, drained by
//! the host on the UI thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use lithic_layout::{LayoutEngine, MeasureSpec};

use crate::collections::map::{HashMap, HashSet};
use crate::component::Component;
use crate::effects::{self, CommittedEffect};
use crate::error::ComponentError;
use crate::key::GlobalKey;
use crate::mount::MountState;
use crate::resolve::{self, LayoutResult, ResolveFailure, ResolvedNode};
use crate::scheduler::LayoutScheduler;
use crate::tree_state::{PendingUpdate, SkipProbe, SlotValue, TreeState, UpdateKind};

const MAX_BOUNDARY_RETRIES: usize = 3;

/// Whether an update schedules its pass or runs it on the calling thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UpdateMode {
    Async,
    Sync,
}

type MainTask = Box<dyn FnOnce() + Send>;
type CommitListener = Box<dyn Fn() + Send>;

pub(crate) struct TreeCore {
    state: Mutex<TreeState>,
    root: Mutex<Option<Component>>,
    committed: Mutex<Option<Arc<ResolvedNode>>>,
    effects: Mutex<HashMap<GlobalKey, Vec<CommittedEffect>>>,
    next_version: AtomicU64,
    committed_version: AtomicU64,
    scheduler: Box<dyn LayoutScheduler>,
    engine: Arc<dyn LayoutEngine>,
    task_tx: Mutex<Sender<MainTask>>,
    task_rx: Mutex<Receiver<MainTask>>,
    main_thread: ThreadId,
    on_commit: Mutex<Option<CommitListener>>,
    unhandled: Mutex<Option<ComponentError>>,
}

impl TreeCore {
    fn new(engine: Arc<dyn LayoutEngine>, scheduler: Box<dyn LayoutScheduler>) -> Arc<Self> {
        let (task_tx, task_rx) = channel();
        Arc::new(Self {
            state: Mutex::new(TreeState::default()),
            root: Mutex::new(None),
            committed: Mutex::new(None),
            effects: Mutex::new(HashMap::default()),
            next_version: AtomicU64::new(0),
            committed_version: AtomicU64::new(0),
            scheduler,
            engine,
            task_tx: Mutex::new(task_tx),
            task_rx: Mutex::new(task_rx),
            main_thread: thread::current().id(),
            on_commit: Mutex::new(None),
            unhandled: Mutex::new(None),
        })
    }

    pub(crate) fn main_thread(&self) -> ThreadId {
        self.main_thread
    }

    pub(crate) fn skip_probe(&self, key: &GlobalKey, slot: usize) -> SkipProbe {
        self.state
            .lock()
            .expect("tree state lock poisoned")
            .skip_probe(key, slot)
    }

    pub(crate) fn committed_value(&self, key: &GlobalKey, slot: usize) -> Option<SlotValue> {
        self.state
            .lock()
            .expect("tree state lock poisoned")
            .committed_value(key, slot)
    }

    pub(crate) fn enqueue_update(
        core: &Arc<TreeCore>,
        key: GlobalKey,
        slot: usize,
        kind: UpdateKind,
        mode: UpdateMode,
    ) {
        core.state
            .lock()
            .expect("tree state lock poisoned")
            .enqueue(PendingUpdate { key, slot, kind });
        match mode {
            UpdateMode::Async => Self::schedule(core),
            UpdateMode::Sync => Self::resolve_now(core),
        }
    }

    fn schedule(core: &Arc<TreeCore>) {
        let job_core = Arc::clone(core);
        core.scheduler
            .schedule_layout(Box::new(move || TreeCore::resolve_now(&job_core)));
    }

    /// Run one resolve pass on the current thread.
    ///
    /// A failure caught by a boundary reruns the pass from the failed pass's
    /// hook containers with the error stored in the boundary's slot, a
    /// bounded number of times. The whole sequence is one logical pass and
    /// claims one version.
    fn resolve_now(core: &Arc<TreeCore>) {
        let Some(root) = core.root.lock().expect("tree root lock poisoned").clone() else {
            return;
        };
        let version = core.next_version.fetch_add(1, Ordering::SeqCst) + 1;
        let (mut containers, watermark, mut dirty) = {
            let state = core.state.lock().expect("tree state lock poisoned");
            let (containers, watermark) = state.working_containers();
            (containers, watermark, state.dirty_keys())
        };
        let previous = core
            .committed
            .lock()
            .expect("committed tree lock poisoned")
            .clone();

        for attempt in 0..=MAX_BOUNDARY_RETRIES {
            match resolve::resolve_root(
                Arc::clone(core),
                containers,
                dirty.clone(),
                previous.as_ref(),
                &root,
            ) {
                Ok(output) => {
                    core.commit(version, watermark, output);
                    return;
                }
                Err(failed) => match failed.failure {
                    ResolveFailure::Caught { target, error } if attempt < MAX_BOUNDARY_RETRIES => {
                        log::warn!(
                            "`{}` failed during {}; rerunning through boundary {}",
                            error.component,
                            error.phase,
                            target.key
                        );
                        containers = failed.containers;
                        let captured: SlotValue = Arc::new(Some(Arc::new(error)));
                        if let Some(container) = containers.get_mut(&target.key) {
                            container.put(target.slot, captured);
                        }
                        dirty.push(target.key);
                    }
                    ResolveFailure::Caught { error, .. } => {
                        log::error!("error boundary retry limit reached: {error}");
                        *core.unhandled.lock().expect("error slot lock poisoned") = Some(error);
                        return;
                    }
                    ResolveFailure::Unhandled(error) => {
                        log::error!("unhandled component error: {error}");
                        *core.unhandled.lock().expect("error slot lock poisoned") = Some(error);
                        return;
                    }
                },
            }
        }
    }

    /// Publish a finished pass, unless a newer pass already committed.
    fn commit(self: &Arc<Self>, version: u64, watermark: usize, output: resolve::PassOutput) {
        let mut live = HashSet::default();
        resolve::collect_live_keys(&output.root, &mut live);
        {
            let mut state = self.state.lock().expect("tree state lock poisoned");
            if self.committed_version.load(Ordering::SeqCst) >= version {
                log::trace!("discarding stale layout pass v{version}");
                return;
            }
            self.committed_version.store(version, Ordering::SeqCst);
            state.drop_consumed(watermark);
            state.commit(output.containers);
            let live_keys = live.clone();
            state.retain_keys(move |key| live_keys.contains(key));
            *self
                .committed
                .lock()
                .expect("committed tree lock poisoned") = Some(Arc::clone(&output.root));
        }

        let core = Arc::clone(self);
        let rendered = output.effects;
        let side_effects = output.side_effects;
        self.post_main(Box::new(move || {
            let mut registry = core.effects.lock().expect("effect registry lock poisoned");
            let removed: Vec<GlobalKey> = registry
                .keys()
                .filter(|key| !live.contains(*key))
                .cloned()
                .collect();
            for key in removed {
                if let Some(list) = registry.remove(&key) {
                    effects::detach_all(list);
                }
            }
            for (key, entries) in rendered {
                let previous = registry.remove(&key).unwrap_or_default();
                registry.insert(key, effects::reconcile(previous, entries));
            }
            drop(registry);
            for side_effect in side_effects {
                side_effect();
            }
        }));

        if let Some(listener) = self
            .on_commit
            .lock()
            .expect("commit listener lock poisoned")
            .as_ref()
        {
            listener();
        }
    }

    fn post_main(&self, task: MainTask) {
        self.task_tx
            .lock()
            .expect("main task sender lock poisoned")
            .send(task)
            .ok();
    }

    fn run_main_tasks(&self) {
        assert_eq!(
            thread::current().id(),
            self.main_thread,
            "main task queue drained off the UI thread"
        );
        let tasks: Vec<MainTask> = {
            let rx = self.task_rx.lock().expect("main task receiver lock poisoned");
            std::iter::from_fn(|| rx.try_recv().ok()).collect()
        };
        for task in tasks {
            task();
        }
    }

    fn measure(&self, width: MeasureSpec, height: MeasureSpec) -> Option<LayoutResult> {
        let root = self
            .committed
            .lock()
            .expect("committed tree lock poisoned")
            .clone()?;
        let request = resolve::build_layout_request(&root);
        let tree = self.engine.compute(&request, width, height);
        Some(LayoutResult {
            root: resolve::zip_layout(&root, &tree.root),
        })
    }

    fn detach_all_effects(&self) {
        let registry: Vec<Vec<CommittedEffect>> = {
            let mut effects = self.effects.lock().expect("effect registry lock poisoned");
            effects.drain().map(|(_, list)| list).collect()
        };
        for list in registry {
            effects::detach_all(list);
        }
    }
}

/// Public handle to one component tree.
///
/// The creating thread becomes the tree's UI thread: mounting, main-task
/// draining, and callback invocation assert it. Resolution and layout run
/// wherever the scheduler puts them.
pub struct ComponentTree {
    core: Arc<TreeCore>,
}

impl ComponentTree {
    pub fn new(engine: Arc<dyn LayoutEngine>, scheduler: Box<dyn LayoutScheduler>) -> Self {
        Self {
            core: TreeCore::new(engine, scheduler),
        }
    }

    /// Replace the root component and schedule a resolve pass.
    pub fn set_root(&self, root: Component) {
        *self.core.root.lock().expect("tree root lock poisoned") = Some(root);
        TreeCore::schedule(&self.core);
    }

    /// Replace the root component and resolve on the calling thread before
    /// returning.
    pub fn set_root_sync(&self, root: Component) {
        *self.core.root.lock().expect("tree root lock poisoned") = Some(root);
        TreeCore::resolve_now(&self.core);
    }

    /// Drain queued UI-thread work: effect reconciliation, callback delegate
    /// swaps, and anything a pass posted. Must run on the UI thread.
    pub fn run_main_tasks(&self) {
        self.core.run_main_tasks();
    }

    /// Lay out the committed tree against the given constraints. Returns
    /// `None` while no pass has committed. May run on any thread.
    pub fn measure(&self, width: MeasureSpec, height: MeasureSpec) -> Option<LayoutResult> {
        self.core.measure(width, height)
    }

    /// Reconcile mounted content against a layout result. Must run on the
    /// UI thread.
    pub fn mount(&self, layout: &LayoutResult, mount: &mut MountState) -> Result<(), ComponentError> {
        assert_eq!(
            thread::current().id(),
            self.core.main_thread,
            "mount invoked off the UI thread"
        );
        mount.mount(layout)
    }

    /// Register a listener fired after every successful commit. The listener
    /// may fire on a layout thread; hosts typically use it to wake the UI
    /// loop so it drains main tasks and re-measures.
    pub fn set_on_commit(&self, listener: impl Fn() + Send + 'static) {
        *self
            .core
            .on_commit
            .lock()
            .expect("commit listener lock poisoned") = Some(Box::new(listener));
    }

    /// The error of the most recent pass that failed with no boundary in
    /// scope, if any. Taking it clears the slot.
    pub fn take_unhandled_error(&self) -> Option<ComponentError> {
        self.core
            .unhandled
            .lock()
            .expect("error slot lock poisoned")
            .take()
    }

    pub fn has_committed(&self) -> bool {
        self.core
            .committed
            .lock()
            .expect("committed tree lock poisoned")
            .is_some()
    }

    /// Tear the tree down: unmount all content and run every effect cleanup,
    /// newest first. Must run on the UI thread.
    pub fn release(&self, mount: &mut MountState) {
        assert_eq!(
            thread::current().id(),
            self.core.main_thread,
            "release invoked off the UI thread"
        );
        self.core.run_main_tasks();
        mount.unmount_all();
        self.core.detach_all_effects();
    }

    pub fn main_thread(&self) -> ThreadId {
        self.core.main_thread
    }
}
