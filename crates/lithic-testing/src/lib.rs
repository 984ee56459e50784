//! Testing utilities and harness for lithic

pub mod content;
pub mod engine;
pub mod harness;

pub use content::{EventLog, FailingBinder, LabelBinder, Probe, ProbeAllocator};
pub use engine::StackLayoutEngine;
pub use harness::TestTree;

pub mod prelude {
    pub use crate::content::{EventLog, FailingBinder, LabelBinder, Probe, ProbeAllocator};
    pub use crate::engine::StackLayoutEngine;
    pub use crate::harness::TestTree;
}
