//! Shell command launching for `shell:` actions.
//!
//! Commands run through the user's command interpreter (`sh -c` on Unix,
//! `cmd /C` on Windows) with stdin, stdout, and stderr redirected to null,
//! so a command can neither block on input nor scribble over the driver's
//! log output.  `spawn_detached` returns as soon as the child exists; a
//! short-lived reaper thread waits on it and logs the exit status at debug
//! level.

use std::process::{Child, Command, Stdio};
use std::thread;

use tracing::{debug, warn};

use crate::application::execute_actions::{ShellError, ShellLauncher};

pub mod mock;

/// Launches commands through the system shell.
#[derive(Debug, Default)]
pub struct SystemShell;

impl SystemShell {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

/// Waits for `child` on a background thread so it never lingers as a zombie.
fn reap(mut child: Child, command: String) {
    let spawned = thread::Builder::new()
        .name("shell-reaper".to_string())
        .spawn(move || match child.wait() {
            Ok(status) => debug!(%command, %status, "shell command exited"),
            Err(e) => warn!(%command, "waiting for shell command failed: {e}"),
        });
    if let Err(e) = spawned {
        warn!("cannot start reaper thread: {e}");
    }
}

impl ShellLauncher for SystemShell {
    fn spawn_detached(&self, command: &str) -> Result<(), ShellError> {
        let child = shell_command(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ShellError::Spawn { command: command.to_string(), source })?;
        debug!(command, pid = child.id(), "shell command started");
        reap(child, command.to_string());
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn test_long_running_command_returns_immediately() {
        // Arrange
        let shell = SystemShell::new();
        let started = Instant::now();

        // Act
        shell.spawn_detached("sleep 30").unwrap();

        // Assert
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_command_runs_through_the_shell() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let shell = SystemShell::new();

        shell.spawn_detached(&format!("echo ok > '{}'", marker.display())).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !marker.exists() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        assert!(marker.exists(), "shell command did not run");
    }
}
