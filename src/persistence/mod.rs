//! Persistence module
//!
//! Key-value slots plus the timer collection adapter built on them.

pub mod kv;
pub mod timers;
pub mod validate;

// Re-export main types
pub use kv::{open_slots, FileStore, KeyValueStore, MemoryStore};
pub use timers::{TimerPersistence, TIMERS_KEY};
