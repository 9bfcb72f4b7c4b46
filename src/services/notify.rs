//! Desktop notifications via `notify-send`

use tokio::{process::Command, runtime::Handle};
use tracing::debug;

use crate::{alerts::Notifier, error::AlertError};

const NOTIFY_PROGRAM: &str = "notify-send";

/// Fire-and-forget desktop notifier
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    program: String,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            program: NOTIFY_PROGRAM.to_string(),
        }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), AlertError> {
        let runtime = Handle::try_current().map_err(|_| AlertError::NoRuntime)?;
        let _guard = runtime.enter();
        let child = Command::new(&self.program)
            .args(["--app-name", "kitchen-timers", title, body])
            .spawn()
            .map_err(|source| AlertError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        debug!("Sent desktop notification (pid {:?})", child.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_outside_runtime_fails_softly() {
        let notifier = DesktopNotifier::new();
        assert!(matches!(
            notifier.notify("Timer finished", "Pasta"),
            Err(AlertError::NoRuntime)
        ));
    }

    #[tokio::test]
    async fn missing_notifier_program_is_reported() {
        let notifier = DesktopNotifier::with_program("kitchen-timers-no-such-notifier");
        assert!(matches!(
            notifier.notify("Timer finished", "Pasta"),
            Err(AlertError::Spawn { .. })
        ));
    }
}
