//! tourbox-driver library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does tourbox-driver do? (for beginners)
//!
//! A TourBox is a one-handed controller with buttons, a scroll wheel, a
//! knob, and a dial.  It talks to the computer over USB serial, sending one
//! byte per event.  It has no idea what those controls should *do*; that is
//! the driver's job.
//!
//! The driver:
//!
//! 1. Finds the device's serial port, opens it, and sends the unlock
//!    command that makes it start reporting events.
//! 2. Decodes every received byte into a `ButtonEvent` (`tourbox_core`).
//! 3. Looks the event up in the active profile to get an `ActionSequence`.
//! 4. Performs the actions: keyboard shortcuts and typed text through the
//!    OS keystroke API (`SendInput` on Windows, XTest on Linux,
//!    CoreGraphics on macOS), shell commands through the system shell.
//! 5. Reconnects when the device is unplugged and plugged back in.

/// Application layer: use cases for the driver.
pub mod application;

/// Infrastructure layer: OS adapters, serial transport, and config storage.
pub mod infrastructure;
