//! Device transports implementing `TransportConnector` / `Transport`.
//!
//! - **`serial`** – the real USB serial connection, including port
//!   auto-detection and the unlock handshake.
//! - **`mock`** – a scripted byte stream for tests.

pub mod mock;
pub mod serial;
