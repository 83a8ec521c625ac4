//! ActionExecutor: performs the effects of resolved action sequences.
//!
//! This use case sits at the application layer and delegates to two trait
//! objects for the actual OS work:
//!
//! - a [`PlatformKeyboard`] that presses, releases, and types keys;
//! - a [`ShellLauncher`] that starts shell commands detached.
//!
//! The platform-specific implementations are in the infrastructure layer.
//!
//! # Failure model (for beginners)
//!
//! A sequence is a list of independent actions.  When one action fails (an
//! unknown key name, a shell command that cannot be spawned, a key the OS
//! refuses) the failure is logged and the executor moves on to the next
//! action.  After the last action it reports how many failed, so the driver
//! loop can count them without ever aborting on a bad profile entry.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, warn};

use tourbox_core::domain::{ActionSequence, ActionSpec, UnresolvedAction};
use tourbox_core::keymap::{KeyToken, Modifier};

// ── Collaborator traits ───────────────────────────────────────────────────────

/// Error type for keystroke synthesis.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("key \"{0}\" cannot be produced on this platform")]
    Unmappable(KeyToken),
    #[error("keyboard backend unavailable: {0}")]
    Unavailable(String),
    #[error("platform error: {0}")]
    Platform(String),
}

/// Platform-agnostic keystroke synthesis.
///
/// Each supported OS provides an implementation in the infrastructure layer.
pub trait PlatformKeyboard: Send + Sync {
    /// Emulates a key-down.
    fn press_key(&self, key: KeyToken) -> Result<(), SynthesisError>;

    /// Emulates a key-up.
    fn release_key(&self, key: KeyToken) -> Result<(), SynthesisError>;

    /// Types `text` in order, one character at a time.
    fn type_text(&self, text: &str) -> Result<(), SynthesisError>;
}

/// Error type for shell launches.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to spawn \"{command}\": {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Starts shell commands without waiting for them.
#[cfg_attr(test, mockall::automock)]
pub trait ShellLauncher: Send + Sync {
    /// Starts `command` through the system shell and returns immediately.
    fn spawn_detached(&self, command: &str) -> Result<(), ShellError>;
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why a single action failed.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Unresolved(#[from] UnresolvedAction),
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error(transparent)]
    Shell(#[from] ShellError),
}

/// Result of a sequence in which at least one action failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("{failed} of {total} actions failed")]
    Partial { failed: usize, total: usize },
}

impl ExecutionError {
    pub fn failed(&self) -> usize {
        match self {
            ExecutionError::Partial { failed, .. } => *failed,
        }
    }
}

// ── Use case ──────────────────────────────────────────────────────────────────

/// Runs action sequences against the injected keyboard and shell.
pub struct ActionExecutor {
    keyboard: Arc<dyn PlatformKeyboard>,
    shell: Arc<dyn ShellLauncher>,
}

impl ActionExecutor {
    pub fn new(keyboard: Arc<dyn PlatformKeyboard>, shell: Arc<dyn ShellLauncher>) -> Self {
        Self { keyboard, shell }
    }

    /// Executes every step of `sequence` in order.
    ///
    /// Each step finishes before the next starts.  A failing step is logged
    /// and skipped; it never stops the remaining steps.
    ///
    /// # Errors
    ///
    /// [`ExecutionError::Partial`] when one or more steps failed.
    pub fn execute(&self, sequence: &ActionSequence) -> Result<(), ExecutionError> {
        let total = sequence.len();
        let mut failed = 0;

        for (index, step) in sequence.steps().iter().enumerate() {
            let result = match step {
                Ok(spec) => self.execute_action(spec),
                Err(unresolved) => Err(ActionError::Unresolved(unresolved.clone())),
            };
            match result {
                Ok(()) => {}
                Err(ActionError::Unresolved(e)) => {
                    failed += 1;
                    warn!(step = index, "skipping action: {e}");
                }
                Err(e) => {
                    failed += 1;
                    error!(step = index, "action failed: {e}");
                }
            }
        }

        if failed == 0 {
            Ok(())
        } else {
            Err(ExecutionError::Partial { failed, total })
        }
    }

    /// Executes a single parsed action.
    pub fn execute_action(&self, spec: &ActionSpec) -> Result<(), ActionError> {
        debug!(action = %spec, "executing");
        match spec {
            ActionSpec::KeyCombo { modifiers, key } => self.tap_combo(modifiers, *key)?,
            ActionSpec::TypeText(text) => self.keyboard.type_text(text)?,
            ActionSpec::ShellCommand(command) => self.shell.spawn_detached(command)?,
            ActionSpec::NoOp => {}
        }
        Ok(())
    }

    /// Presses modifiers in order, taps `key`, then releases in reverse.
    ///
    /// Whatever was pressed is released even when a later press fails, so a
    /// failed combo never leaves a modifier stuck down.
    fn tap_combo(&self, modifiers: &[Modifier], key: KeyToken) -> Result<(), SynthesisError> {
        let mut pressed: Vec<KeyToken> = Vec::with_capacity(modifiers.len() + 1);
        let mut outcome = Ok(());

        let keys = modifiers.iter().map(|m| KeyToken::Modifier(*m)).chain(std::iter::once(key));
        for token in keys {
            if let Err(e) = self.keyboard.press_key(token) {
                outcome = Err(e);
                break;
            }
            pressed.push(token);
        }

        for token in pressed.into_iter().rev() {
            if let Err(e) = self.keyboard.release_key(token) {
                if outcome.is_ok() {
                    outcome = Err(e);
                }
            }
        }
        outcome
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tourbox_core::keymap::NamedKey;

    // ── Recording keyboard ────────────────────────────────────────────────────

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Press(KeyToken),
        Release(KeyToken),
        Type(String),
    }

    #[derive(Default)]
    struct RecordingKeyboard {
        calls: Mutex<Vec<Call>>,
        refuse: Option<KeyToken>,
    }

    impl PlatformKeyboard for RecordingKeyboard {
        fn press_key(&self, key: KeyToken) -> Result<(), SynthesisError> {
            if self.refuse == Some(key) {
                return Err(SynthesisError::Unmappable(key));
            }
            self.calls.lock().unwrap().push(Call::Press(key));
            Ok(())
        }

        fn release_key(&self, key: KeyToken) -> Result<(), SynthesisError> {
            self.calls.lock().unwrap().push(Call::Release(key));
            Ok(())
        }

        fn type_text(&self, text: &str) -> Result<(), SynthesisError> {
            self.calls.lock().unwrap().push(Call::Type(text.to_string()));
            Ok(())
        }
    }

    fn executor_with(keyboard: Arc<RecordingKeyboard>, shell: MockShellLauncher) -> ActionExecutor {
        ActionExecutor::new(keyboard, Arc::new(shell))
    }

    fn cmd() -> KeyToken {
        KeyToken::Modifier(Modifier::CMD)
    }

    // ── Combo synthesis ───────────────────────────────────────────────────────

    #[test]
    fn test_combo_presses_then_releases_in_reverse() {
        // Arrange
        let keyboard = Arc::new(RecordingKeyboard::default());
        let executor = executor_with(Arc::clone(&keyboard), MockShellLauncher::new());
        let seq = ActionSequence::parse(&["cmd+shift+z"]);

        // Act
        let result = executor.execute(&seq);

        // Assert
        assert!(result.is_ok());
        let shift = KeyToken::Modifier(Modifier::SHIFT);
        let z = KeyToken::Char('z');
        assert_eq!(
            *keyboard.calls.lock().unwrap(),
            vec![
                Call::Press(cmd()),
                Call::Press(shift),
                Call::Press(z),
                Call::Release(z),
                Call::Release(shift),
                Call::Release(cmd()),
            ]
        );
    }

    #[test]
    fn test_failed_press_releases_already_pressed_keys() {
        // Arrange: the key itself cannot be pressed
        let keyboard = Arc::new(RecordingKeyboard { refuse: Some(KeyToken::Char('c')), ..Default::default() });
        let executor = executor_with(Arc::clone(&keyboard), MockShellLauncher::new());

        // Act
        let result = executor.execute(&ActionSequence::parse(&["cmd+c"]));

        // Assert
        assert_eq!(result, Err(ExecutionError::Partial { failed: 1, total: 1 }));
        assert_eq!(*keyboard.calls.lock().unwrap(), vec![Call::Press(cmd()), Call::Release(cmd())]);
    }

    // ── Sequences ─────────────────────────────────────────────────────────────

    #[test]
    fn test_sequence_types_text_before_enter() {
        let keyboard = Arc::new(RecordingKeyboard::default());
        let executor = executor_with(Arc::clone(&keyboard), MockShellLauncher::new());

        executor.execute(&ActionSequence::parse(&["type:/commit", "enter"])).unwrap();

        let enter = KeyToken::Named(NamedKey::Enter);
        assert_eq!(
            *keyboard.calls.lock().unwrap(),
            vec![Call::Type("/commit".into()), Call::Press(enter), Call::Release(enter)]
        );
    }

    #[test]
    fn test_sequence_completes_each_combo_before_the_next() {
        let keyboard = Arc::new(RecordingKeyboard::default());
        let executor = executor_with(Arc::clone(&keyboard), MockShellLauncher::new());

        executor.execute(&ActionSequence::parse(&["cmd+a", "cmd+c"])).unwrap();

        let a = KeyToken::Char('a');
        let c = KeyToken::Char('c');
        assert_eq!(
            *keyboard.calls.lock().unwrap(),
            vec![
                Call::Press(cmd()),
                Call::Press(a),
                Call::Release(a),
                Call::Release(cmd()),
                Call::Press(cmd()),
                Call::Press(c),
                Call::Release(c),
                Call::Release(cmd()),
            ]
        );
    }

    #[test]
    fn test_unresolved_step_is_skipped_and_sequence_continues() {
        // Arrange
        let keyboard = Arc::new(RecordingKeyboard::default());
        let executor = executor_with(Arc::clone(&keyboard), MockShellLauncher::new());

        // Act
        let result = executor.execute(&ActionSequence::parse(&["bogus_token", "cmd+c"]));

        // Assert
        assert_eq!(result, Err(ExecutionError::Partial { failed: 1, total: 2 }));
        let c = KeyToken::Char('c');
        assert_eq!(
            *keyboard.calls.lock().unwrap(),
            vec![Call::Press(cmd()), Call::Press(c), Call::Release(c), Call::Release(cmd())]
        );
    }

    #[test]
    fn test_empty_and_noop_sequences_do_nothing() {
        let keyboard = Arc::new(RecordingKeyboard::default());
        let executor = executor_with(Arc::clone(&keyboard), MockShellLauncher::new());

        assert!(executor.execute(ActionSequence::empty()).is_ok());
        assert!(executor.execute(&ActionSequence::from_specs(vec![ActionSpec::NoOp])).is_ok());
        assert!(keyboard.calls.lock().unwrap().is_empty());
    }

    // ── Shell ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_shell_action_is_handed_to_launcher() {
        // Arrange
        let mut shell = MockShellLauncher::new();
        shell
            .expect_spawn_detached()
            .withf(|command| command.to_string() == "open -a Terminal")
            .times(1)
            .returning(|_| Ok(()));
        let executor = executor_with(Arc::new(RecordingKeyboard::default()), shell);

        // Act / Assert
        assert!(executor.execute(&ActionSequence::parse(&["shell:open -a Terminal"])).is_ok());
    }

    #[test]
    fn test_shell_spawn_failure_is_counted_but_not_fatal() {
        // Arrange
        let mut shell = MockShellLauncher::new();
        shell.expect_spawn_detached().times(1).returning(|command| {
            Err(ShellError::Spawn {
                command: command.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no shell"),
            })
        });
        let keyboard = Arc::new(RecordingKeyboard::default());
        let executor = executor_with(Arc::clone(&keyboard), shell);

        // Act
        let result = executor.execute(&ActionSequence::parse(&["shell:whatever", "type:ok"]));

        // Assert
        assert_eq!(result.unwrap_err().failed(), 1);
        assert_eq!(*keyboard.calls.lock().unwrap(), vec![Call::Type("ok".into())]);
    }
}
