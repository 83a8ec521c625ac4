//! Unlock handshake sent to the device after the serial port is opened.
//!
//! A freshly opened TourBox stays silent until it receives an 8-byte unlock
//! command.  It answers with a short response whose first byte is `0x07`.
//! Some firmware revisions reply late or not at all and still report
//! events, so a missing reply is a warning, not a failure.

/// Bytes written to the device to enable event reporting.
pub const UNLOCK_COMMAND: [u8; 8] = [0x55, 0x00, 0x07, 0x88, 0x94, 0x00, 0x1a, 0xfe];

/// First byte of a successful unlock response.
pub const UNLOCK_ACK: u8 = 0x07;

/// Line speed of the device's USB serial interface.
pub const BAUD_RATE: u32 = 115_200;

/// Outcome of inspecting the bytes read back after [`UNLOCK_COMMAND`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockStatus {
    /// The response began with [`UNLOCK_ACK`].
    Unlocked,
    /// Nothing was read before the wait expired.
    NoResponse,
    /// Something was read but it did not begin with [`UNLOCK_ACK`].
    Unexpected(u8),
}

/// Classifies the response to the unlock command.
pub fn check_unlock_response(response: &[u8]) -> UnlockStatus {
    match response.first() {
        None => UnlockStatus::NoResponse,
        Some(&UNLOCK_ACK) => UnlockStatus::Unlocked,
        Some(&other) => UnlockStatus::Unexpected(other),
    }
}
