//! Recording shell launcher for tests that wire the whole driver together.
//!
//! Unit tests of the executor use a `mockall` mock of `ShellLauncher`; this
//! hand-written double suits integration tests, which only need to know
//! which commands were requested.

use std::io;
use std::sync::Mutex;

use crate::application::execute_actions::{ShellError, ShellLauncher};

#[derive(Debug, Default)]
pub struct RecordingShell {
    pub commands: Mutex<Vec<String>>,
    /// When `true`, every launch fails as if the shell could not be found.
    pub should_fail: bool,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl ShellLauncher for RecordingShell {
    fn spawn_detached(&self, command: &str) -> Result<(), ShellError> {
        if self.should_fail {
            return Err(ShellError::Spawn {
                command: command.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "mock shell missing"),
            });
        }
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command.to_string());
        }
        Ok(())
    }
}
