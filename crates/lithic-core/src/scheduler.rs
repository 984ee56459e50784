//! Scheduling abstraction for background layout passes.
//!
//! The tree never blocks a caller: an asynchronous state update hands a
//! resolve job to the scheduler and returns. The host decides where jobs
//! run; tests run them inline on the calling thread.

pub type LayoutJob = Box<dyn FnOnce() + Send>;

pub trait LayoutScheduler: Send + Sync {
    fn schedule_layout(&self, job: LayoutJob);
}

/// Runs each layout job on a fresh background thread.
#[derive(Default)]
pub struct BackgroundScheduler;

impl LayoutScheduler for BackgroundScheduler {
    fn schedule_layout(&self, job: LayoutJob) {
        std::thread::Builder::new()
            .name("lithic-layout".into())
            .spawn(job)
            .expect("failed to spawn layout thread");
    }
}

/// Runs layout jobs immediately on the calling thread. Deterministic; used
/// by the test harness and by hosts that drive layout themselves.
#[derive(Default)]
pub struct InlineScheduler;

impl LayoutScheduler for InlineScheduler {
    fn schedule_layout(&self, job: LayoutJob) {
        job();
    }
}
