//! Scripted transport for driving the loop without hardware.
//!
//! A `ScriptedConnector` holds a queue of sessions.  Each `connect` call
//! takes the next one: either a refused connection or a transport that
//! replays a fixed list of reads.  When the queue is empty the connector
//! clears the shutdown flag, so a test's `DriverLoop::run` returns once the
//! whole script has been played.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::application::driver_loop::{ReadOutcome, Transport, TransportConnector, TransportError};

/// One scripted read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStep {
    Byte(u8),
    Timeout,
    /// The read fails as if the cable was pulled.
    Disconnect,
    /// The read times out and the transport reports itself closed.
    Close,
}

#[derive(Debug, Clone)]
enum Session {
    Refuse,
    Play(Vec<ScriptStep>),
}

pub struct ScriptedConnector {
    sessions: VecDeque<Session>,
    running: Arc<AtomicBool>,
    connects: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    /// `running` is the driver loop's shutdown flag.
    pub fn new(running: Arc<AtomicBool>) -> Self {
        Self { sessions: VecDeque::new(), running, connects: Arc::new(AtomicUsize::new(0)) }
    }

    /// Queues a session that delivers `bytes` and then disconnects.
    pub fn session(self, bytes: &[u8]) -> Self {
        let mut steps: Vec<ScriptStep> = bytes.iter().map(|b| ScriptStep::Byte(*b)).collect();
        steps.push(ScriptStep::Disconnect);
        self.steps(steps)
    }

    /// Queues a session that replays `steps`; an exhausted script disconnects.
    pub fn steps(mut self, steps: Vec<ScriptStep>) -> Self {
        self.sessions.push_back(Session::Play(steps));
        self
    }

    /// Queues a failed connection attempt.
    pub fn refuse(mut self) -> Self {
        self.sessions.push_back(Session::Refuse);
        self
    }

    /// Shared count of `connect` calls, readable after the loop has consumed
    /// the connector.
    pub fn connect_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.connects)
    }
}

impl TransportConnector for ScriptedConnector {
    fn connect(&mut self) -> Result<Box<dyn Transport>, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.sessions.pop_front() {
            Some(Session::Play(steps)) => Ok(Box::new(ScriptedTransport::new(steps))),
            Some(Session::Refuse) => Err(TransportError::Open {
                port: "scripted".to_string(),
                reason: "refused by script".to_string(),
            }),
            None => {
                self.running.store(false, Ordering::SeqCst);
                Err(TransportError::NotFound { patterns: "scripted".to_string() })
            }
        }
    }
}

pub struct ScriptedTransport {
    steps: VecDeque<ScriptStep>,
    open: bool,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self { steps: steps.into(), open: true }
    }
}

impl Transport for ScriptedTransport {
    fn read_byte(&mut self) -> Result<ReadOutcome, TransportError> {
        match self.steps.pop_front() {
            Some(ScriptStep::Byte(b)) => Ok(ReadOutcome::Byte(b)),
            Some(ScriptStep::Timeout) => Ok(ReadOutcome::Timeout),
            Some(ScriptStep::Close) => {
                self.open = false;
                Ok(ReadOutcome::Timeout)
            }
            Some(ScriptStep::Disconnect) | None => {
                self.open = false;
                Err(TransportError::Disconnected("end of script".to_string()))
            }
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
