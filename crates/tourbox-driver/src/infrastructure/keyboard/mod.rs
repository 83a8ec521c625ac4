//! Platform-specific keystroke synthesis.
//!
//! The correct backend is selected at compile time via `#[cfg(target_os = ...)]`
//! and handed to the `ActionExecutor` as an `Arc<dyn PlatformKeyboard>`.
//!
//! | Target  | Backend                 | OS API                      |
//! |---------|-------------------------|-----------------------------|
//! | Linux   | [`linux::XTestKeyboard`]  | X11 XTest extension         |
//! | macOS   | [`macos::CoreGraphicsKeyboard`] | `CGEventPost`          |
//! | Windows | [`windows::SendInputKeyboard`]  | `SendInput`            |
//!
//! Two backends work everywhere: [`logging::LoggingKeyboard`] (for
//! `--dry-run`) and [`mock::MockKeyboard`] (records calls for tests).

use std::sync::Arc;

use crate::application::execute_actions::{PlatformKeyboard, SynthesisError};

pub mod logging;
pub mod mock;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

/// Opens the native keyboard backend for the current OS.
///
/// # Errors
///
/// Returns `SynthesisError::Unavailable` when the backend cannot start, for
/// example when no X display is reachable.
#[cfg(target_os = "linux")]
pub fn platform_keyboard() -> Result<Arc<dyn PlatformKeyboard>, SynthesisError> {
    Ok(Arc::new(linux::XTestKeyboard::open()?))
}

#[cfg(target_os = "macos")]
pub fn platform_keyboard() -> Result<Arc<dyn PlatformKeyboard>, SynthesisError> {
    Ok(Arc::new(macos::CoreGraphicsKeyboard::new()?))
}

#[cfg(target_os = "windows")]
pub fn platform_keyboard() -> Result<Arc<dyn PlatformKeyboard>, SynthesisError> {
    Ok(Arc::new(windows::SendInputKeyboard::new()))
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub fn platform_keyboard() -> Result<Arc<dyn PlatformKeyboard>, SynthesisError> {
    Err(SynthesisError::Unavailable(format!(
        "no keystroke backend for {}",
        std::env::consts::OS
    )))
}
