//! DriverLoop: the read → decode → resolve → execute pipeline plus the
//! connection lifecycle around it.
//!
//! # State machine
//!
//! ```text
//!            connect() ok                 read error
//! Connecting ────────────▶ Connected ─────────────────▶ Disconnected
//!     ▲                                                      │
//!     └───────────────── backoff delay ◀─────────────────────┘
//! ```
//!
//! While `Connected` the loop reads one byte at a time and runs the whole
//! pipeline for it synchronously before reading the next, so the keystrokes
//! of one combo never interleave with those of a later event.  Transport
//! reads use a short poll timeout so the shutdown flag is checked regularly;
//! shutdown is only ever honoured between events.
//!
//! # Threading (for beginners)
//!
//! Serial reads and keystroke synthesis are blocking calls, so the loop is a
//! plain synchronous function.  The binary runs it on a dedicated blocking
//! thread via `tokio::task::spawn_blocking` while the async runtime handles
//! signals.  The only state shared with other threads is the shutdown flag
//! (`AtomicBool`) and the profile channel (`tokio::sync::watch`), whose
//! receiver can be read synchronously.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use tourbox_core::{ActionResolver, Decoded, EventDecoder, Profile};

use super::execute_actions::ActionExecutor;

// ── Transport boundary ────────────────────────────────────────────────────────

/// Error type for the device transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Auto-detection found no port matching any pattern.
    #[error("no TourBox found (looked for {patterns})")]
    NotFound { patterns: String },

    /// The port exists but could not be opened or configured.
    #[error("cannot open {port}: {reason}")]
    Open { port: String, reason: String },

    /// The device went away mid-stream.
    #[error("device disconnected: {0}")]
    Disconnected(String),

    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A successful read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Byte(u8),
    /// No byte arrived within the poll timeout.
    Timeout,
}

/// An open, unlocked connection to the device.
pub trait Transport: Send {
    /// Reads one byte.  An `Err` means the connection is lost.
    fn read_byte(&mut self) -> Result<ReadOutcome, TransportError>;

    /// Checked before every read; `false` ends the session like a read error.
    fn is_open(&self) -> bool;

    /// Human-readable port name for logs.
    fn name(&self) -> &str;
}

/// Discovers, opens, and unlocks the device.  Called once per connection
/// attempt, so the loop can reconnect after a disconnect.
pub trait TransportConnector: Send {
    fn connect(&mut self) -> Result<Box<dyn Transport>, TransportError>;
}

// ── Lifecycle pieces ──────────────────────────────────────────────────────────

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Exponential reconnect delay: `initial`, `2 × initial`, … capped at `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let max = max.max(initial);
        Self { initial, max, current: initial }
    }

    /// Returns the delay to wait now and doubles the next one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    /// Called after a successful connection.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Per-session counters, logged at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub bytes_read: u64,
    pub events_dispatched: u64,
    pub unknown_bytes: u64,
    pub failed_actions: u64,
    pub reconnects: u64,
}

impl fmt::Display for DriverStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes, {} events dispatched, {} unknown, {} failed actions, {} reconnects",
            self.bytes_read, self.events_dispatched, self.unknown_bytes, self.failed_actions, self.reconnects
        )
    }
}

/// What the loop does with a resolved sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Run the actions.
    Execute,
    /// Log every decoded byte and what it would do, without running anything.
    Monitor,
}

/// Longest single sleep while waiting to reconnect, so shutdown stays prompt.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

// ── The loop ──────────────────────────────────────────────────────────────────

/// Owns the pipeline and the connection lifecycle.
pub struct DriverLoop<C: TransportConnector> {
    connector: C,
    decoder: EventDecoder,
    resolver: ActionResolver,
    executor: ActionExecutor,
    profiles: watch::Receiver<Arc<Profile>>,
    running: Arc<AtomicBool>,
    backoff: Backoff,
    mode: DispatchMode,
    state: ConnectionState,
    stats: DriverStats,
    has_connected: bool,
}

impl<C: TransportConnector> DriverLoop<C> {
    pub fn new(
        connector: C,
        resolver: ActionResolver,
        executor: ActionExecutor,
        profiles: watch::Receiver<Arc<Profile>>,
        running: Arc<AtomicBool>,
        backoff: Backoff,
    ) -> Self {
        Self {
            connector,
            decoder: EventDecoder::new(),
            resolver,
            executor,
            profiles,
            running,
            backoff,
            mode: DispatchMode::Execute,
            state: ConnectionState::Disconnected,
            stats: DriverStats::default(),
            has_connected: false,
        }
    }

    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Runs until the shutdown flag is cleared.  Returns the session counters.
    pub fn run(&mut self) -> DriverStats {
        info!(mode = ?self.mode, alternate_ticks = %self.resolver.alternate_ticks(), "driver loop starting");

        while self.is_running() {
            self.state = ConnectionState::Connecting;
            match self.connector.connect() {
                Ok(transport) => {
                    if self.has_connected {
                        self.stats.reconnects += 1;
                    }
                    self.has_connected = true;
                    self.backoff.reset();
                    self.state = ConnectionState::Connected;
                    info!(port = transport.name(), "connected");
                    self.pump(transport);
                }
                Err(e) => warn!("connect failed: {e}"),
            }

            self.state = ConnectionState::Disconnected;
            if !self.is_running() {
                break;
            }
            let delay = self.backoff.next_delay();
            debug!(?delay, "waiting before reconnect");
            self.sleep_while_running(delay);
        }

        self.state = ConnectionState::Disconnected;
        info!("driver loop stopped: {}", self.stats);
        self.stats
    }

    /// Reads and dispatches bytes until the transport fails or shutdown.
    fn pump(&mut self, mut transport: Box<dyn Transport>) {
        while self.is_running() {
            if !transport.is_open() {
                warn!(port = transport.name(), "transport closed");
                return;
            }
            match transport.read_byte() {
                Ok(ReadOutcome::Byte(byte)) => self.dispatch(byte),
                Ok(ReadOutcome::Timeout) => {}
                Err(e) => {
                    warn!(port = transport.name(), "connection lost: {e}");
                    return;
                }
            }
        }
    }

    /// Runs the full pipeline for one byte.
    ///
    /// The profile snapshot is taken here, at the event boundary; the resolved
    /// sequence borrows from that snapshot so a concurrent reload cannot
    /// change it mid-sequence.
    pub fn dispatch(&mut self, byte: u8) {
        self.stats.bytes_read += 1;
        let decoded = self.decoder.decode(byte);
        if let Decoded::Unknown(_) = decoded {
            self.stats.unknown_bytes += 1;
        }

        let profile = Arc::clone(&self.profiles.borrow());
        let sequence = self.resolver.resolve_decoded(&decoded, &profile);

        if self.mode == DispatchMode::Monitor {
            if let Decoded::Event(event) = decoded {
                let actions = if sequence.is_empty() { "-".to_string() } else { sequence.to_string() };
                info!("0x{byte:02x}  {:<28} {actions}", event.to_string());
            }
            return;
        }

        if sequence.is_empty() {
            debug!("0x{byte:02x} resolves to nothing");
            return;
        }
        self.stats.events_dispatched += 1;
        if let Decoded::Event(event) = decoded {
            debug!(%event, actions = %sequence, "dispatching");
        }
        if let Err(e) = self.executor.execute(sequence) {
            self.stats.failed_actions += e.failed() as u64;
        }
    }

    fn sleep_while_running(&self, total: Duration) {
        let mut remaining = total;
        while !remaining.is_zero() && self.is_running() {
            let slice = remaining.min(SLEEP_SLICE);
            thread::sleep(slice);
            remaining -= slice;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
