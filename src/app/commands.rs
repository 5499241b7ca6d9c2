//! Inbound commands to the link core.
//!
//! These represent actions requested by the outside world (UI, scripts,
//! higher-level sessions) that the
//! [`ConnectionSupervisor`](crate::central::ConnectionSupervisor)
//! interprets and acts upon.

use crate::gatt::{CharacteristicRef, PeripheralRef};

/// Commands that callers can send into the link core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CentralCommand {
    StartScan,
    StopScan,

    /// Connect to a sighted peripheral (ignored while an attempt is pending).
    Connect(PeripheralRef),

    /// Abandon a pending connect attempt.
    CancelConnect,

    /// Tear down the current link and resume scanning.
    Disconnect,

    /// Discover characteristics of every known service.
    DiscoverCharacteristics,

    DiscoverDescriptors(CharacteristicRef),

    ReadValue(CharacteristicRef),

    SetNotify {
        characteristic: CharacteristicRef,
        enabled: bool,
    },
}
