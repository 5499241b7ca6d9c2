//! Outbound link events.
//!
//! The [`ConnectionSupervisor`](crate::central::ConnectionSupervisor)
//! publishes these through its single observer slot.  The set is closed:
//! an observer handles it with one exhaustive `match`, so no event can be
//! silently skipped by a forgotten callback.

use crate::central::state::StateId;
use crate::error::{LinkError, TransportError};
use crate::gatt::{
    AdapterState, AdvertisementData, CharacteristicRef, DescriptorRef, PeripheralRef, ServiceRef,
    SignalStrength,
};

/// Structured events emitted by the link core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CentralEvent {
    /// The local radio changed power / availability state.
    AdapterStateChanged(AdapterState),

    /// The connection state machine moved.
    StateChanged { from: StateId, to: StateId },

    /// A peripheral was sighted while scanning.
    PeripheralDiscovered {
        peripheral: PeripheralRef,
        advertisement: AdvertisementData,
        rssi: SignalStrength,
    },

    /// A link was established.  Interrogation starts immediately after.
    Connected(PeripheralRef),

    /// A connect attempt ended without a link.
    ConnectFailed {
        peripheral: PeripheralRef,
        error: LinkError,
    },

    /// Service discovery completed; the interrogate-timeout is disarmed.
    ServicesDiscovered {
        peripheral: PeripheralRef,
        services: Vec<ServiceRef>,
    },

    /// Service discovery reported an error.  The interrogate-timeout stays
    /// armed.
    ServicesDiscoveryFailed {
        peripheral: PeripheralRef,
        error: TransportError,
    },

    CharacteristicsDiscovered {
        service: ServiceRef,
        characteristics: Vec<CharacteristicRef>,
    },

    CharacteristicsDiscoveryFailed {
        service: ServiceRef,
        error: TransportError,
    },

    DescriptorsDiscovered {
        characteristic: CharacteristicRef,
        descriptors: Vec<DescriptorRef>,
    },

    DescriptorsDiscoveryFailed {
        characteristic: CharacteristicRef,
        error: TransportError,
    },

    /// A read completed or a notification arrived.
    ValueUpdated {
        characteristic: CharacteristicRef,
        value: Vec<u8>,
    },

    ValueReadFailed {
        characteristic: CharacteristicRef,
        error: TransportError,
    },

    /// Service discovery did not finish in time; the link was torn down.
    InterrogationFailed(PeripheralRef),

    /// The link is gone.
    Disconnected {
        peripheral: PeripheralRef,
        error: Option<TransportError>,
    },
}

impl CentralEvent {
    /// Short tag for log lines and activity history.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AdapterStateChanged(_) => "adapter-state",
            Self::StateChanged { .. } => "state",
            Self::PeripheralDiscovered { .. } => "discovered",
            Self::Connected(_) => "connected",
            Self::ConnectFailed { .. } => "connect-failed",
            Self::ServicesDiscovered { .. } => "services",
            Self::ServicesDiscoveryFailed { .. } => "services-failed",
            Self::CharacteristicsDiscovered { .. } => "characteristics",
            Self::CharacteristicsDiscoveryFailed { .. } => "characteristics-failed",
            Self::DescriptorsDiscovered { .. } => "descriptors",
            Self::DescriptorsDiscoveryFailed { .. } => "descriptors-failed",
            Self::ValueUpdated { .. } => "value",
            Self::ValueReadFailed { .. } => "value-failed",
            Self::InterrogationFailed(_) => "interrogation-failed",
            Self::Disconnected { .. } => "disconnected",
        }
    }
}
