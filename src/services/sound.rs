//! Looped alert playback through an external player

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};
use tokio::{
    process::{Child, Command},
    runtime::Handle,
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{alerts::AlertSound, error::AlertError};

/// Plays a sound file on repeat by re-running `program <file>` until stopped
#[derive(Debug)]
pub struct CommandSound {
    program: String,
    file: PathBuf,
    playback: Mutex<Option<JoinHandle<()>>>,
}

impl CommandSound {
    pub fn new(program: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            file: file.into(),
            playback: Mutex::new(None),
        }
    }

    fn spawn_player(program: &str, file: &Path) -> Result<Child, AlertError> {
        Command::new(program)
            .arg(file)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AlertError::Spawn {
                program: program.to_string(),
                source,
            })
    }
}

impl AlertSound for CommandSound {
    fn play(&self) -> Result<(), AlertError> {
        if !self.file.exists() {
            return Err(AlertError::MissingResource(self.file.clone()));
        }
        let runtime = Handle::try_current().map_err(|_| AlertError::NoRuntime)?;

        let mut playback = self.playback.lock().unwrap_or_else(|e| e.into_inner());
        if playback.as_ref().is_some_and(|h| !h.is_finished()) {
            return Ok(());
        }

        // Spawn the first run here so a missing player is reported to the caller
        let child = {
            let _guard = runtime.enter();
            Self::spawn_player(&self.program, &self.file)?
        };
        info!("Playing alert sound {}", self.file.display());
        *playback = Some(runtime.spawn(repeat_player(
            self.program.clone(),
            self.file.clone(),
            child,
        )));
        Ok(())
    }

    fn stop(&self) {
        let mut playback = self.playback.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = playback.take() {
            debug!("Stopping alert sound");
            // Dropping the running child kills it
            handle.abort();
        }
    }

    fn is_playing(&self) -> bool {
        self.playback
            .lock()
            .map(|p| p.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for CommandSound {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn repeat_player(program: String, file: PathBuf, mut child: Child) {
    loop {
        match child.wait().await {
            Ok(status) if !status.success() => {
                warn!("{} exited with {}, stopping alert sound", program, status);
                return;
            }
            Err(e) => {
                warn!("Failed to wait for {}: {}", program, e);
                return;
            }
            Ok(_) => {}
        }
        child = match CommandSound::spawn_player(&program, &file) {
            Ok(child) => child,
            Err(e) => {
                warn!("{}", e);
                return;
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported() {
        let sound = CommandSound::new("paplay", "/nonexistent/timer.wav");
        assert!(matches!(sound.play(), Err(AlertError::MissingResource(_))));
        sound.stop();
    }

    #[test]
    fn idle_sound_is_not_playing() {
        let sound = CommandSound::new("paplay", "/nonexistent/timer.wav");
        assert!(!sound.is_playing());
        let _ = sound.play();
        assert!(!sound.is_playing());
    }

    #[test]
    fn playback_needs_a_runtime() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let sound = CommandSound::new("paplay", file.path());
        assert!(matches!(sound.play(), Err(AlertError::NoRuntime)));
    }

    #[tokio::test]
    async fn missing_player_is_reported() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let sound = CommandSound::new("kitchen-timers-no-such-player", file.path());
        assert!(matches!(sound.play(), Err(AlertError::Spawn { .. })));
    }
}
