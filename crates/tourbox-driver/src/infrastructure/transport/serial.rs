//! USB serial transport for the TourBox.
//!
//! The device enumerates as a CDC-ACM serial port (`/dev/ttyACM*` on Linux,
//! `/dev/tty.usbmodem*` on macOS, `COMn` on Windows).  Each connect attempt:
//!
//! 1. picks the port: the configured one, or the first candidate whose file
//!    name starts with a pattern, trying patterns in priority order;
//! 2. opens it at 115200 baud with a short read timeout;
//! 3. discards stale input, writes the unlock command, waits, and checks the
//!    reply.  A missing or unexpected reply is only a warning.

use std::io::{self, Read};
use std::thread;

use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, info, warn};

use tourbox_core::protocol::{check_unlock_response, UnlockStatus, UNLOCK_COMMAND};

use crate::application::driver_loop::{ReadOutcome, Transport, TransportConnector, TransportError};
use crate::infrastructure::storage::config::SerialConfig;

/// Upper bound on the unlock reply we bother reading.
const MAX_UNLOCK_REPLY: usize = 64;

/// Chooses the first port matching the highest-priority pattern.
///
/// Patterns are matched as prefixes of the port's file name, so
/// `ttyACM` matches `/dev/ttyACM0`.
pub fn select_port(candidates: &[String], patterns: &[String]) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        candidates
            .iter()
            .find(|candidate| file_name(candidate).starts_with(pattern.as_str()))
            .cloned()
    })
}

fn file_name(port: &str) -> &str {
    port.rsplit(['/', '\\']).next().unwrap_or(port)
}

/// Every serial port the OS reports.
pub fn list_candidate_ports() -> Result<Vec<String>, TransportError> {
    let ports = serialport::available_ports()
        .map_err(|e| TransportError::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// Opens and unlocks the device on every `connect`.
pub struct SerialConnector {
    config: SerialConfig,
}

impl SerialConnector {
    pub fn new(config: SerialConfig) -> Self {
        Self { config }
    }

    fn discover(&self) -> Result<String, TransportError> {
        if let Some(port) = &self.config.port {
            return Ok(port.clone());
        }
        let candidates = list_candidate_ports()?;
        debug!(?candidates, "serial ports found");
        select_port(&candidates, &self.config.port_patterns).ok_or_else(|| TransportError::NotFound {
            patterns: self.config.port_patterns.join(", "),
        })
    }

    fn unlock(&self, port: &mut dyn SerialPort, name: &str) -> Result<(), TransportError> {
        port.clear(ClearBuffer::Input).map_err(|e| open_error(name, e))?;
        port.write_all(&UNLOCK_COMMAND)?;
        port.flush()?;
        thread::sleep(self.config.unlock_wait());

        let pending = port.bytes_to_read().map_err(|e| open_error(name, e))? as usize;
        let reply = read_unlock_reply(port, name, pending);

        match check_unlock_response(&reply) {
            UnlockStatus::Unlocked => info!(port = name, "device unlocked"),
            UnlockStatus::NoResponse => warn!(port = name, "no unlock response; continuing"),
            UnlockStatus::Unexpected(byte) => {
                warn!(port = name, "unexpected unlock response 0x{byte:02x}; continuing")
            }
        }
        Ok(())
    }
}

/// Reads up to `pending` reply bytes.  A read error is logged and treated as
/// no reply, since the unlock outcome never fails the connection.
fn read_unlock_reply<R: Read + ?Sized>(port: &mut R, name: &str, pending: usize) -> Vec<u8> {
    let mut reply = vec![0u8; pending.min(MAX_UNLOCK_REPLY)];
    if reply.is_empty() {
        return reply;
    }
    match port.read(&mut reply) {
        Ok(read) => reply.truncate(read),
        Err(e) => {
            warn!(port = name, "reading unlock response failed: {e}");
            reply.clear();
        }
    }
    reply
}

fn open_error(port: &str, e: serialport::Error) -> TransportError {
    TransportError::Open { port: port.to_string(), reason: e.to_string() }
}

impl TransportConnector for SerialConnector {
    fn connect(&mut self) -> Result<Box<dyn Transport>, TransportError> {
        let name = self.discover()?;
        debug!(port = %name, baud = self.config.baud_rate, "opening serial port");
        let mut port = serialport::new(&name, self.config.baud_rate)
            .timeout(self.config.read_timeout())
            .open()
            .map_err(|e| open_error(&name, e))?;
        self.unlock(port.as_mut(), &name)?;
        Ok(Box::new(SerialTransport { port: Some(port), name }))
    }
}

/// An open serial connection.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    name: String,
}

impl Transport for SerialTransport {
    fn read_byte(&mut self) -> Result<ReadOutcome, TransportError> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| TransportError::Disconnected(format!("{} is closed", self.name)))?;
        let mut buf = [0u8; 1];
        match port.read(&mut buf) {
            Ok(1) => Ok(ReadOutcome::Byte(buf[0])),
            Ok(_) => {
                self.port = None;
                Err(TransportError::Disconnected(format!("{}: end of stream", self.name)))
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {
                Ok(ReadOutcome::Timeout)
            }
            Err(e) => {
                self.port = None;
                Err(TransportError::Io(e))
            }
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn default_patterns() -> Vec<String> {
        SerialConfig::default().port_patterns
    }

    #[test]
    fn test_select_port_prefers_higher_priority_pattern() {
        // Arrange
        let candidates = strings(&["/dev/tty.usbmodem1101", "/dev/tty.usbmodemTourBox1"]);

        // Act
        let chosen = select_port(&candidates, &default_patterns());

        // Assert
        assert_eq!(chosen.as_deref(), Some("/dev/tty.usbmodemTourBox1"));
    }

    #[test]
    fn test_select_port_matches_linux_acm_device() {
        let candidates = strings(&["/dev/ttyS0", "/dev/ttyACM0"]);
        assert_eq!(select_port(&candidates, &default_patterns()).as_deref(), Some("/dev/ttyACM0"));
    }

    #[test]
    fn test_select_port_ignores_callout_devices_and_unrelated_ports() {
        // The pattern is a prefix of the file name, so cu.* never matches tty.*.
        let candidates = strings(&["/dev/cu.usbmodem1101", "/dev/ttyS0", "COM3"]);
        assert_eq!(select_port(&candidates, &default_patterns()), None);
    }

    #[test]
    fn test_select_port_with_no_candidates() {
        assert_eq!(select_port(&[], &default_patterns()), None);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
        }
    }

    #[test]
    fn test_unlock_reply_read_error_counts_as_no_reply() {
        // Act
        let reply = read_unlock_reply(&mut FailingReader, "/dev/ttyACM0", 4);

        // Assert
        assert!(reply.is_empty());
        assert_eq!(check_unlock_response(&reply), UnlockStatus::NoResponse);
    }

    #[test]
    fn test_unlock_reply_keeps_only_bytes_read() {
        let mut source: &[u8] = &[0x07, 0x01];
        let reply = read_unlock_reply(&mut source, "/dev/ttyACM0", 8);
        assert_eq!(reply, vec![0x07, 0x01]);
        assert_eq!(check_unlock_response(&reply), UnlockStatus::Unlocked);
    }

    #[test]
    fn test_explicit_port_skips_discovery() {
        let config = SerialConfig { port: Some("/dev/ttyUSB7".to_string()), ..SerialConfig::default() };
        let connector = SerialConnector::new(config);
        assert_eq!(connector.discover().unwrap(), "/dev/ttyUSB7");
    }
}
