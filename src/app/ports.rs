//! Port traits: the hexagonal boundary between the link logic and the radio.
//!
//! ```text
//!   Radio stack ──▶ TransportEvent ──▶ ConnectionSupervisor ──▶ EventSink
//!        ▲                                     │
//!        └────────── TransportPort ◀───────────┘
//! ```
//!
//! Driven adapters (radio stack, clock, observers) implement these traits.
//! The [`ConnectionSupervisor`](crate::central::ConnectionSupervisor)
//! consumes them via generics, so the core never touches a radio directly.
//!
//! Every [`TransportPort`] request is fire-and-forget: completion or
//! failure comes back later as a [`TransportEvent`], delivered onto the
//! same serialized context that issued the request.

use crate::error::TransportError;
use crate::gatt::{
    AdapterState, AdvertisementData, CharacteristicRef, DescriptorRef, PeripheralRef,
    ServiceFilter, ServiceRef, SignalStrength,
};

// ───────────────────────────────────────────────────────────────
// Transport port (driven adapter: domain → radio)
// ───────────────────────────────────────────────────────────────

/// Options forwarded with a connect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Ask the radio to report a disconnect of this link as an event.
    pub notify_on_disconnection: bool,
}

/// Request side of the radio stack.
pub trait TransportPort {
    /// Begin scanning.  Sightings arrive as [`TransportEvent::PeripheralDiscovered`].
    fn scan(&mut self, filter: Option<&ServiceFilter>, allow_duplicates: bool);

    /// Stop scanning.
    fn stop_scan(&mut self);

    /// Request a connection.  Answered by `Connected` or `ConnectFailed`.
    fn connect(&mut self, peripheral: PeripheralRef, options: ConnectOptions);

    /// Cancel a pending connect request or tear down an established link.
    fn cancel_connection(&mut self, peripheral: PeripheralRef);

    /// Discover services; `None` means all services.
    fn discover_services(&mut self, peripheral: PeripheralRef, filter: Option<&[u128]>);

    /// Discover characteristics of one service; `None` means all.
    fn discover_characteristics(&mut self, service: ServiceRef, filter: Option<&[u128]>);

    fn discover_descriptors(&mut self, characteristic: CharacteristicRef);

    fn read_value(&mut self, characteristic: CharacteristicRef);

    /// Enable or disable value notifications for a characteristic.
    fn set_notify(&mut self, characteristic: CharacteristicRef, enabled: bool);
}

/// Asynchronous completions and unsolicited events from the radio stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    AdapterStateChanged(AdapterState),
    PeripheralDiscovered {
        peripheral: PeripheralRef,
        advertisement: AdvertisementData,
        rssi: SignalStrength,
    },
    Connected(PeripheralRef),
    ConnectFailed {
        peripheral: PeripheralRef,
        error: TransportError,
    },
    /// The link dropped, whether or not the core asked for it.
    Disconnected {
        peripheral: PeripheralRef,
        error: Option<TransportError>,
    },
    ServicesDiscovered {
        peripheral: PeripheralRef,
        result: Result<Vec<ServiceRef>, TransportError>,
    },
    CharacteristicsDiscovered {
        service: ServiceRef,
        result: Result<Vec<CharacteristicRef>, TransportError>,
    },
    DescriptorsDiscovered {
        characteristic: CharacteristicRef,
        result: Result<Vec<DescriptorRef>, TransportError>,
    },
    /// A read completed or a notification arrived.
    ValueUpdated {
        characteristic: CharacteristicRef,
        result: Result<Vec<u8>, TransportError>,
    },
}

impl TransportEvent {
    /// The peripheral this event concerns, if any.
    pub fn peripheral(&self) -> Option<PeripheralRef> {
        match self {
            Self::AdapterStateChanged(_) => None,
            Self::PeripheralDiscovered { peripheral, .. }
            | Self::ConnectFailed { peripheral, .. }
            | Self::Disconnected { peripheral, .. }
            | Self::ServicesDiscovered { peripheral, .. } => Some(*peripheral),
            Self::Connected(p) => Some(*p),
            Self::CharacteristicsDiscovered { service, .. } => Some(service.peripheral),
            Self::DescriptorsDiscovered { characteristic, .. }
            | Self::ValueUpdated { characteristic, .. } => Some(characteristic.peripheral()),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.  Timer deadlines are computed from it.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
}

impl<C: ClockPort + ?Sized> ClockPort for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → observer)
// ───────────────────────────────────────────────────────────────

/// The core publishes [`CentralEvent`](super::events::CentralEvent)s
/// through this port.  One handler, one exhaustive `match`.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::CentralEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&super::events::CentralEvent),
{
    fn emit(&mut self, event: &super::events::CentralEvent) {
        self(event);
    }
}
