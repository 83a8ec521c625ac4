//! Infrastructure layer for the driver.
//!
//! Contains OS-facing adapters: keystroke synthesis, shell launching, the
//! serial transport, and configuration storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `tourbox_core`, but MUST NOT be imported by the `application` or domain
//! layers.
//!
//! # Sub-modules
//!
//! - **`keyboard`** – OS-specific implementations of `PlatformKeyboard`.
//!   The native backend is selected at compile time using
//!   `#[cfg(target_os)]`.  A log-only backend (`--dry-run`) and a
//!   `MockKeyboard` for tests are always available.
//!
//! - **`shell`** – `SystemShell`, the detached `ShellLauncher`.
//!
//! - **`transport`** – serial port discovery, unlock handshake, and byte
//!   reads; plus a scripted transport for tests.
//!
//! - **`storage`** – TOML configuration file loading.

pub mod keyboard;
pub mod shell;
pub mod storage;
pub mod transport;
