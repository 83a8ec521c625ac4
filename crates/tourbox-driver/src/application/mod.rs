//! Application layer use cases for the driver.
//!
//! # What use cases does the driver have?
//!
//! - **`execute_actions`** – Performs a resolved `ActionSequence`: key combos
//!   and typed text go to a `PlatformKeyboard`, shell commands to a
//!   `ShellLauncher`.  Both are trait objects injected at construction time,
//!   so tests can record calls instead of touching the OS.
//!
//! - **`driver_loop`** – Owns the connection lifecycle (connect, unlock,
//!   read, reconnect with backoff) and runs every received byte through
//!   decode → resolve → execute.
//!
//! - **`reload`** – Holds the active profile and swaps it atomically when
//!   the profile file is re-read.

pub mod driver_loop;
pub mod execute_actions;
pub mod reload;
