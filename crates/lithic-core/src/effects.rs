//! Effect entries and their commit-time reconciliation, plus the
//! stable-identity callback wrapper.

use std::any::Any;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

/// Cleanup returned by an effect's attach callback; runs on the UI thread
/// when the effect detaches or its dependencies change.
pub struct CleanupFn(Box<dyn FnOnce() + Send>);

impl CleanupFn {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    fn run(self) {
        (self.0)()
    }
}

/// Type-erased dependency list compared with deep (`PartialEq`) equality.
pub(crate) struct Deps {
    value: Box<dyn Any + Send>,
    eq: fn(&dyn Any, &dyn Any) -> bool,
}

impl Deps {
    pub fn new<D: PartialEq + Send + 'static>(deps: D) -> Self {
        Self {
            value: Box::new(deps),
            eq: |a, b| match (a.downcast_ref::<D>(), b.downcast_ref::<D>()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    pub fn equals(&self, other: &Deps) -> bool {
        (self.eq)(self.value.as_ref(), other.value.as_ref())
    }
}

pub(crate) type AttachFn = Box<dyn FnOnce() -> Option<CleanupFn> + Send>;

/// One effect registration produced during a render.
pub(crate) struct EffectEntry {
    pub deps: Deps,
    pub attach: AttachFn,
}

/// An effect that is part of the committed tree.
pub(crate) struct CommittedEffect {
    deps: Deps,
    cleanup: Option<CleanupFn>,
    attached: bool,
}

impl CommittedEffect {
    fn attach(entry: EffectEntry) -> Self {
        let cleanup = (entry.attach)();
        Self {
            deps: entry.deps,
            cleanup,
            attached: true,
        }
    }

    fn detach(mut self) {
        assert!(
            self.attached,
            "effect detach requested but the effect is not attached"
        );
        self.attached = false;
        if let Some(cleanup) = self.cleanup.take() {
            cleanup.run();
        }
    }
}

/// Diff the previous committed effects for one instance against the entries
/// its latest render produced. Position by position: unchanged dependencies
/// preserve the old entry untouched; changed dependencies run the old
/// cleanup before the new attach. Must run on the UI thread.
pub(crate) fn reconcile(
    previous: Vec<CommittedEffect>,
    entries: Vec<EffectEntry>,
) -> Vec<CommittedEffect> {
    let mut committed = Vec::with_capacity(entries.len());
    let mut previous = previous.into_iter();
    let mut entries = entries.into_iter();
    loop {
        match (previous.next(), entries.next()) {
            (Some(old), Some(new)) => {
                if old.deps.equals(&new.deps) {
                    committed.push(old);
                } else {
                    old.detach();
                    committed.push(CommittedEffect::attach(new));
                }
            }
            (Some(old), None) => old.detach(),
            (None, Some(new)) => committed.push(CommittedEffect::attach(new)),
            (None, None) => break,
        }
    }
    committed
}

/// Run cleanups for an instance that left the tree, in reverse registration
/// order.
pub(crate) fn detach_all(effects: Vec<CommittedEffect>) {
    for effect in effects.into_iter().rev() {
        effect.detach();
    }
}

struct CallbackInner<A, R> {
    delegate: Mutex<Box<dyn Fn(A) -> R + Send>>,
    ui_thread: ThreadId,
}

/// A function wrapper whose identity is stable across renders while its
/// behavior tracks the latest render's captured props and state.
///
/// The delegate swap happens on the UI thread at commit, so invoking the
/// wrapper asserts it runs on the UI thread as well.
pub struct Callback<A = (), R = ()> {
    inner: Arc<CallbackInner<A, R>>,
}

impl<A, R> Clone for Callback<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> PartialEq for Callback<A, R> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<A: 'static, R: 'static> Callback<A, R> {
    pub(crate) fn new(ui_thread: ThreadId, delegate: impl Fn(A) -> R + Send + 'static) -> Self {
        Self {
            inner: Arc::new(CallbackInner {
                delegate: Mutex::new(Box::new(delegate)),
                ui_thread,
            }),
        }
    }

    pub(crate) fn replace_delegate(&self, delegate: Box<dyn Fn(A) -> R + Send>) {
        *self
            .inner
            .delegate
            .lock()
            .expect("Callback delegate lock poisoned") = delegate;
    }

    pub fn call(&self, arg: A) -> R {
        let current = thread::current().id();
        assert_eq!(
            self.inner.ui_thread, current,
            "Callback invoked off the UI thread"
        );
        let delegate = self
            .inner
            .delegate
            .lock()
            .expect("Callback delegate lock poisoned");
        delegate(arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder(
        log: &Arc<Mutex<Vec<String>>>,
        name: &'static str,
    ) -> AttachFn {
        let attach_log = Arc::clone(log);
        Box::new(move || {
            attach_log.lock().unwrap().push(format!("attach {name}"));
            let cleanup_log = attach_log;
            Some(CleanupFn::new(move || {
                cleanup_log.lock().unwrap().push(format!("cleanup {name}"));
            }))
        })
    }

    #[test]
    fn equal_deps_run_nothing() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = reconcile(
            Vec::new(),
            vec![EffectEntry {
                deps: Deps::new(1i32),
                attach: recorder(&log, "a"),
            }],
        );
        let second = reconcile(
            first,
            vec![EffectEntry {
                deps: Deps::new(1i32),
                attach: recorder(&log, "b"),
            }],
        );
        assert_eq!(&*log.lock().unwrap(), &["attach a"]);
        detach_all(second);
        assert_eq!(&*log.lock().unwrap(), &["attach a", "cleanup a"]);
    }

    #[test]
    fn changed_deps_cleanup_before_attach() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = reconcile(
            Vec::new(),
            vec![EffectEntry {
                deps: Deps::new(1i32),
                attach: recorder(&log, "old"),
            }],
        );
        let _second = reconcile(
            first,
            vec![EffectEntry {
                deps: Deps::new(2i32),
                attach: recorder(&log, "new"),
            }],
        );
        assert_eq!(
            &*log.lock().unwrap(),
            &["attach old", "cleanup old", "attach new"]
        );
    }

    #[test]
    fn no_deps_unit_case_is_stable() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = reconcile(
            Vec::new(),
            vec![EffectEntry {
                deps: Deps::new(()),
                attach: recorder(&log, "once"),
            }],
        );
        let _second = reconcile(
            first,
            vec![EffectEntry {
                deps: Deps::new(()),
                attach: recorder(&log, "again"),
            }],
        );
        assert_eq!(&*log.lock().unwrap(), &["attach once"]);
    }

    #[test]
    fn removed_entries_clean_up_in_reverse_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let committed = reconcile(
            Vec::new(),
            vec![
                EffectEntry {
                    deps: Deps::new(1i32),
                    attach: recorder(&log, "first"),
                },
                EffectEntry {
                    deps: Deps::new(2i32),
                    attach: recorder(&log, "second"),
                },
            ],
        );
        detach_all(committed);
        assert_eq!(
            &*log.lock().unwrap(),
            &["attach first", "attach second", "cleanup second", "cleanup first"]
        );
    }

    #[test]
    fn callback_identity_is_stable_while_delegate_swaps() {
        let calls = Arc::new(AtomicUsize::new(0));
        let callback: Callback<i32, i32> =
            Callback::new(thread::current().id(), |value| value + 1);
        let alias = callback.clone();
        assert_eq!(callback.call(1), 2);
        let counter = Arc::clone(&calls);
        callback.replace_delegate(Box::new(move |value| {
            counter.fetch_add(1, Ordering::SeqCst);
            value * 10
        }));
        assert_eq!(alias.call(2), 20, "alias sees the new delegate");
        assert!(callback == alias);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
