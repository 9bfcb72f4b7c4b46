//! Kitchen Timers - Recipe step timers served over HTTP
//!
//! This library provides a timer engine for cooking: countdowns tied to recipe
//! steps, persisted on every change, advanced by a drift-corrected tick, and
//! alerted one at a time with dismiss and snooze.

pub mod alerts;
pub mod api;
pub mod config;
pub mod error;
pub mod persistence;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use alerts::CompletionCoordinator;
pub use api::create_router;
pub use config::Config;
pub use state::{AppState, TimerStore};
pub use utils::signals::shutdown_signal;
