//! Protocol module: the device's control table, byte decoder, and unlock handshake.

pub mod controls;
pub mod decoder;
pub mod handshake;

pub use controls::{ControlId, UnknownControl, CODE_MASK, FLAG_BIT};
pub use decoder::{ButtonEvent, Decoded, EventDecoder, EventKind, TickDirection};
pub use handshake::{check_unlock_response, UnlockStatus, BAUD_RATE, UNLOCK_ACK, UNLOCK_COMMAND};
