//! Log-only keyboard used by `--dry-run`.
//!
//! Every call succeeds and is reported through `tracing`, so a profile can
//! be tried against the real device without any keystrokes reaching the
//! focused application.

use tracing::info;

use tourbox_core::KeyToken;

use crate::application::execute_actions::{PlatformKeyboard, SynthesisError};

#[derive(Debug, Default)]
pub struct LoggingKeyboard;

impl LoggingKeyboard {
    pub fn new() -> Self {
        Self
    }
}

impl PlatformKeyboard for LoggingKeyboard {
    fn press_key(&self, key: KeyToken) -> Result<(), SynthesisError> {
        info!(target: "dry_run", "press {key}");
        Ok(())
    }

    fn release_key(&self, key: KeyToken) -> Result<(), SynthesisError> {
        info!(target: "dry_run", "release {key}");
        Ok(())
    }

    fn type_text(&self, text: &str) -> Result<(), SynthesisError> {
        info!(target: "dry_run", "type {text:?}");
        Ok(())
    }
}
