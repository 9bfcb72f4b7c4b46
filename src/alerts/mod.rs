//! Alerting module
//!
//! Completion detection, alert sequencing and the capabilities it drives.

pub mod capabilities;
pub mod coordinator;

// Re-export main types
pub use capabilities::{
    AlertSound, BroadcastChecklist, ChecklistEvent, ChecklistSink, Notifier, Silent,
};
pub use coordinator::{ActiveAlert, CompletionCoordinator, DEFAULT_SNOOZE_SECS};
