//! State management module
//!
//! The timer entity, its pure transitions, the write-through store and the
//! shared application state wrapping them.

pub mod app_state;
pub mod timer;
pub mod timer_store;
pub mod timers;

// Re-export main types
pub use app_state::{AppState, EngineStatus};
pub use timer::{Association, Timer, TimerId, TimerPhase};
pub use timer_store::TimerStore;
pub use timers::TimerCollection;
