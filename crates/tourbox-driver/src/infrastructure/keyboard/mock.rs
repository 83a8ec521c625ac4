//! Mock keyboard for tests.
//!
//! # Why a mock keyboard?
//!
//! The real backends press keys on the machine running the tests and need a
//! desktop session.  `MockKeyboard` replaces every OS call with in-memory
//! recording: each call is pushed into a `Mutex<Vec<KeyboardCall>>` so test
//! assertions can inspect exactly what was synthesized and in what order.
//!
//! # Usage in tests
//!
//! ```ignore
//! let keyboard = Arc::new(MockKeyboard::new());
//! let executor = ActionExecutor::new(keyboard.clone(), shell);
//!
//! executor.execute(&sequence).unwrap();
//!
//! assert_eq!(keyboard.calls(), vec![KeyboardCall::Press(..), ..]);
//! ```
//!
//! # Failure injection
//!
//! `should_fail` makes every call fail; `unmappable` makes only calls for
//! that one key fail, which is how tests exercise partial failure.

use std::sync::Mutex;

use tourbox_core::KeyToken;

use crate::application::execute_actions::{PlatformKeyboard, SynthesisError};

/// One recorded keyboard call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardCall {
    Press(KeyToken),
    Release(KeyToken),
    Type(String),
}

/// A keyboard that records all calls without performing OS API calls.
#[derive(Default)]
pub struct MockKeyboard {
    pub calls: Mutex<Vec<KeyboardCall>>,
    /// When `true`, every method returns `SynthesisError::Platform`.
    pub should_fail: bool,
    /// Presses and releases of this key fail with `Unmappable`.
    pub unmappable: Option<KeyToken>,
}

impl MockKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A keyboard that cannot produce `key`.
    pub fn refusing(key: KeyToken) -> Self {
        Self { unmappable: Some(key), ..Self::default() }
    }

    /// Snapshot of the calls recorded so far.
    pub fn calls(&self) -> Vec<KeyboardCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, key: Option<KeyToken>, call: KeyboardCall) -> Result<(), SynthesisError> {
        if self.should_fail {
            return Err(SynthesisError::Platform("mock failure".into()));
        }
        if let (Some(key), Some(refused)) = (key, self.unmappable) {
            if key == refused {
                return Err(SynthesisError::Unmappable(key));
            }
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        Ok(())
    }
}

impl PlatformKeyboard for MockKeyboard {
    fn press_key(&self, key: KeyToken) -> Result<(), SynthesisError> {
        self.record(Some(key), KeyboardCall::Press(key))
    }

    fn release_key(&self, key: KeyToken) -> Result<(), SynthesisError> {
        self.record(Some(key), KeyboardCall::Release(key))
    }

    fn type_text(&self, text: &str) -> Result<(), SynthesisError> {
        self.record(None, KeyboardCall::Type(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use tourbox_core::{Modifier, NamedKey};

    use super::*;

    #[test]
    fn test_calls_are_recorded_in_order() {
        let keyboard = MockKeyboard::new();

        keyboard.press_key(Modifier::CMD.into()).unwrap();
        keyboard.type_text("hi").unwrap();
        keyboard.release_key(Modifier::CMD.into()).unwrap();

        assert_eq!(
            keyboard.calls(),
            vec![
                KeyboardCall::Press(KeyToken::Modifier(Modifier::CMD)),
                KeyboardCall::Type("hi".into()),
                KeyboardCall::Release(KeyToken::Modifier(Modifier::CMD)),
            ]
        );
    }

    #[test]
    fn test_should_fail_records_nothing() {
        let keyboard = MockKeyboard { should_fail: true, ..MockKeyboard::default() };
        assert!(keyboard.press_key(NamedKey::Enter.into()).is_err());
        assert!(keyboard.calls().is_empty());
    }

    #[test]
    fn test_refusing_only_fails_that_key() {
        let keyboard = MockKeyboard::refusing(KeyToken::Char('x'));
        assert!(matches!(
            keyboard.press_key(KeyToken::Char('x')),
            Err(SynthesisError::Unmappable(KeyToken::Char('x')))
        ));
        assert!(keyboard.press_key(KeyToken::Char('y')).is_ok());
    }
}
