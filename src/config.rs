//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::Parser;

use crate::alerts::DEFAULT_SNOOZE_SECS;

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "kitchen-timers")]
#[command(about = "Recipe step timers with persistent state and one-at-a-time alerts")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding the key-value slots
    #[arg(long, default_value = "./kitchen-timers-data")]
    pub data_dir: PathBuf,

    /// Tick period in milliseconds
    #[arg(long, default_value = "1000")]
    pub tick_ms: u64,

    /// Default snooze extension in seconds
    #[arg(long, default_value_t = DEFAULT_SNOOZE_SECS)]
    pub snooze_secs: u64,

    /// Sound file looped while a timer is alerting
    #[arg(long)]
    pub sound: Option<PathBuf>,

    /// Command used to play the sound file
    #[arg(long, default_value = "paplay")]
    pub player: String,

    /// Send a desktop notification when a timer finishes
    #[arg(long)]
    pub notify: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Tick period, never shorter than one millisecond
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["kitchen-timers"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.tick_period(), Duration::from_secs(1));
        assert_eq!(config.snooze_secs, 60);
        assert!(config.sound.is_none());
        assert!(!config.notify);
    }

    #[test]
    fn zero_tick_is_clamped() {
        let config =
            Config::try_parse_from(["kitchen-timers", "--tick-ms", "0", "-v"]).unwrap();
        assert_eq!(config.tick_period(), Duration::from_millis(1));
        assert_eq!(config.log_level(), "debug");
    }
}
