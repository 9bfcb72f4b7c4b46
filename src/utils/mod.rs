//! Utility functions module
//!
//! Clock, display formatting and signal handling used throughout the daemon.

pub mod clock;
pub mod format;
pub mod signals;

// Re-export main items
pub use clock::{Clock, ManualClock, SystemClock};
pub use format::{format_mm_ss, format_uptime, progress_pct};
pub use signals::shutdown_signal;
