//! # tourbox-core
//!
//! Shared library for the TourBox driver: the serial wire protocol, the key
//! vocabulary used by profiles, and the profile/action domain model.
//!
//! This crate has zero dependencies on OS APIs, serial ports, or keyboard
//! synthesis.  Everything here can be unit-tested without a device.
//!
//! # Architecture overview (for beginners)
//!
//! A TourBox is a one-handed controller with buttons, a d-pad, a scroll
//! wheel, a knob and a dial.  Over USB it shows up as a serial port and sends
//! one byte per event.  The driver turns those bytes into keyboard shortcuts,
//! typed text, or shell commands according to a user-editable profile.
//!
//! - **`protocol`** – The fixed control table, the byte decoder, and the
//!   unlock handshake constants.
//!
//! - **`keymap`** – The key names profiles may use (`cmd`, `page_down`, `f5`,
//!   `c`) and their native codes on macOS, X11 and Windows.
//!
//! - **`domain`** – Action grammar, immutable profiles, and the resolver
//!   that picks the action sequence for a decoded event.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::{
    default_profile, ActionResolver, ActionSequence, ActionSpec, AlternateTickPolicy, Profile, ProfileError,
    UnresolvedAction,
};
pub use keymap::{KeyToken, Modifier, NamedKey};
pub use protocol::{ButtonEvent, ControlId, Decoded, EventDecoder, EventKind, TickDirection};
