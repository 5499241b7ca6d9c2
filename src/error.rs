//! Error types for the central link.
//!
//! None of these are ever returned from the state-machine API.  Transport
//! failures and timeouts travel to the observer inside
//! [`CentralEvent`](crate::app::events::CentralEvent)s; precondition
//! violations are logged and dropped.  Only configuration loading returns
//! a `Result`.

use core::fmt;

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Diagnostic payload reported by the transport adapter.
///
/// The core treats both fields as opaque and only forwards them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// Platform error code (HCI status, ATT error, OS errno, ...).
    pub code: i32,
    pub message: String,
}

impl TransportError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport error {}: {}", self.code, self.message)
    }
}

// ---------------------------------------------------------------------------
// Timeouts
// ---------------------------------------------------------------------------

/// Which phase armed the timer that expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutPhase {
    Connect,
    Interrogate,
}

impl fmt::Display for TimeoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect timeout"),
            Self::Interrogate => write!(f, "interrogate timeout"),
        }
    }
}

// ---------------------------------------------------------------------------
// Link errors (what observers see)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    Transport(TransportError),
    Timeout(TimeoutPhase),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "{e}"),
            Self::Timeout(phase) => write!(f, "{phase}"),
        }
    }
}

impl From<TransportError> for LinkError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<TimeoutPhase> for LinkError {
    fn from(p: TimeoutPhase) -> Self {
        Self::Timeout(p)
    }
}

// ---------------------------------------------------------------------------
// Preconditions
// ---------------------------------------------------------------------------

/// Why a request was ignored.  Logged at debug level, never surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// A connect attempt is already pending.
    AttemptInFlight,
    /// A peripheral is already connected.
    AlreadyConnected,
    /// The request needs a connected peripheral and there is none.
    NotConnected,
    /// Scanning is already running.
    AlreadyScanning,
    /// The request targets a peripheral other than the connected one.
    ForeignPeripheral,
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttemptInFlight => write!(f, "connect attempt already in flight"),
            Self::AlreadyConnected => write!(f, "a peripheral is already connected"),
            Self::NotConnected => write!(f, "no peripheral connected"),
            Self::AlreadyScanning => write!(f, "already scanning"),
            Self::ForeignPeripheral => write!(f, "peripheral is not the connected one"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
