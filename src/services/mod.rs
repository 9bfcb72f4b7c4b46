//! Platform services module
//!
//! Process-backed implementations of the alert capabilities: looped sound
//! playback and desktop notifications.

pub mod notify;
pub mod sound;

// Re-export main types
pub use notify::DesktopNotifier;
pub use sound::CommandSound;
