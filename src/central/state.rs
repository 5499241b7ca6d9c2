//! Connection state.
//!
//! ```text
//!  IDLE ──start_scan──▶ SCANNING
//!    │                     │
//!    └──────connect────────┤
//!                          ▼
//!                     CONNECTING ◀──[connect-timeout: retry]──┐
//!                          │  └──────────────────────────────┘
//!              [transport error]──▶ IDLE / SCANNING
//!                          │
//!                     [connected]
//!                          ▼
//!   CONNECTED ──begin_interrogation──▶ INTERROGATING
//!                                          │      └─[interrogate-timeout]──▶ disconnect
//!                                 [services discovered]
//!                                          ▼
//!                                        READY ──[disconnect]──▶ IDLE / SCANNING
//! ```

use core::fmt;

use crate::gatt::PeripheralRef;

/// Discriminant of [`ConnectionState`], for logs and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    Scanning = 1,
    Connecting = 2,
    Connected = 3,
    Interrogating = 4,
    Ready = 5,
}

impl StateId {
    pub const COUNT: usize = 6;

    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Scanning => "Scanning",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Interrogating => "Interrogating",
            Self::Ready => "Ready",
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The single source of truth for which requests are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Scanning,
    /// One connect attempt is outstanding.
    Connecting {
        target: PeripheralRef,
        /// When the current attempt (not the first one) was issued.
        attempt_started_at: u64,
    },
    /// Link up, interrogation not yet started.
    Connected(PeripheralRef),
    /// Link up, service discovery outstanding.
    Interrogating {
        peripheral: PeripheralRef,
        started_at: u64,
    },
    /// Link up, services known.
    Ready(PeripheralRef),
}

impl ConnectionState {
    pub fn id(&self) -> StateId {
        match self {
            Self::Idle => StateId::Idle,
            Self::Scanning => StateId::Scanning,
            Self::Connecting { .. } => StateId::Connecting,
            Self::Connected(_) => StateId::Connected,
            Self::Interrogating { .. } => StateId::Interrogating,
            Self::Ready(_) => StateId::Ready,
        }
    }

    /// The linked peripheral in any of the three post-connect states.
    pub fn connected_peripheral(&self) -> Option<PeripheralRef> {
        match *self {
            Self::Connected(p) | Self::Ready(p) => Some(p),
            Self::Interrogating { peripheral, .. } => Some(peripheral),
            _ => None,
        }
    }

    /// Target of the outstanding connect attempt.
    pub fn pending_target(&self) -> Option<PeripheralRef> {
        match *self {
            Self::Connecting { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting { .. })
    }

    pub fn is_connected(&self) -> bool {
        self.connected_peripheral().is_some()
    }
}
