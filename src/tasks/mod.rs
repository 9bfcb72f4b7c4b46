//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod checklist_recorder;
pub mod tick_driver;

// Re-export main items
pub use checklist_recorder::{checklist_recorder_task, load_checks, RecipeChecks};
pub use tick_driver::{TickDriver, DEFAULT_TICK_PERIOD};
