use std::fmt;

/// Failure raised inside a component lifecycle callback.
///
/// Errors travel upward through the resolver until an ancestor that
/// registered an error boundary intercepts them; with no boundary the error
/// is returned to whoever drove the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentError {
    /// Name of the component whose callback failed.
    pub component: &'static str,
    /// Lifecycle phase that was running.
    pub phase: LifecyclePhase,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Render,
    Prepare,
    Measure,
    Mount,
    Bind,
    Unbind,
    Unmount,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecyclePhase::Render => "render",
            LifecyclePhase::Prepare => "prepare",
            LifecyclePhase::Measure => "measure",
            LifecyclePhase::Mount => "mount",
            LifecyclePhase::Bind => "bind",
            LifecyclePhase::Unbind => "unbind",
            LifecyclePhase::Unmount => "unmount",
        };
        f.write_str(name)
    }
}

impl ComponentError {
    pub fn new(component: &'static str, phase: LifecyclePhase, message: impl Into<String>) -> Self {
        Self {
            component,
            phase,
            message: message.into(),
        }
    }

    pub fn render(component: &'static str, message: impl Into<String>) -> Self {
        Self::new(component, LifecyclePhase::Render, message)
    }

    pub fn prepare(component: &'static str, message: impl Into<String>) -> Self {
        Self::new(component, LifecyclePhase::Prepare, message)
    }
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed in `{}`: {}",
            self.phase, self.component, self.message
        )
    }
}

impl std::error::Error for ComponentError {}
