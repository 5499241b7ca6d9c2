//! Radio-side handle types.
//!
//! These are opaque identities minted by the transport adapter.  The core
//! never dereferences them; it only compares, copies and hands them back
//! to the transport on later requests.
//!
//! ```text
//!  PeripheralRef ──owns──▶ ServiceRef ──owns──▶ CharacteristicRef ──owns──▶ DescriptorRef
//! ```

use core::fmt;

// ───────────────────────────────────────────────────────────────
// Handles
// ───────────────────────────────────────────────────────────────

/// Identity of a discovered peripheral, as assigned by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeripheralRef(pub u64);

impl fmt::Display for PeripheralRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peripheral#{:04x}", self.0)
    }
}

/// A primary service on a connected peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceRef {
    pub peripheral: PeripheralRef,
    /// Attribute handle of the service declaration.
    pub handle: u16,
    /// 128-bit service UUID.
    pub uuid: u128,
}

/// A characteristic within a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacteristicRef {
    pub service: ServiceRef,
    /// Attribute handle of the characteristic value.
    pub handle: u16,
    pub uuid: u128,
}

impl CharacteristicRef {
    /// The peripheral this characteristic lives on.
    pub fn peripheral(&self) -> PeripheralRef {
        self.service.peripheral
    }
}

/// A descriptor attached to a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorRef {
    pub characteristic: CharacteristicRef,
    pub handle: u16,
    pub uuid: u128,
}

// ───────────────────────────────────────────────────────────────
// Scan payloads
// ───────────────────────────────────────────────────────────────

/// Advertisement and scan-response data for one sighting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertisementData {
    pub local_name: Option<String>,
    pub service_uuids: Vec<u128>,
    pub manufacturer_data: Vec<u8>,
    pub tx_power_level: Option<i8>,
    pub connectable: Option<bool>,
}

/// Received signal strength in dBm, `None` when the radio could not
/// measure it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalStrength(Option<i8>);

impl SignalStrength {
    /// Raw value the radio reports when no reading is available.
    pub const UNAVAILABLE_RAW: i16 = 127;

    /// Interpret a raw RSSI report.  127 is reserved for "not available";
    /// anything outside the `i8` range is treated the same way.
    pub fn from_raw(raw: i16) -> Self {
        if raw == Self::UNAVAILABLE_RAW {
            return Self(None);
        }
        Self(i8::try_from(raw).ok())
    }

    pub fn dbm(dbm: i8) -> Self {
        Self(Some(dbm))
    }

    pub fn unavailable() -> Self {
        Self(None)
    }

    pub fn value(self) -> Option<i8> {
        self.0
    }
}

impl fmt::Display for SignalStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(dbm) => write!(f, "{dbm} dBm"),
            None => write!(f, "n/a"),
        }
    }
}

/// Restricts a scan (or service discovery) to the listed service UUIDs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceFilter {
    pub uuids: Vec<u128>,
}

impl ServiceFilter {
    /// `None` for an empty UUID list, meaning "no filter".
    pub fn from_uuids(uuids: &[u128]) -> Option<Self> {
        if uuids.is_empty() {
            None
        } else {
            Some(Self {
                uuids: uuids.to_vec(),
            })
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Radio power state
// ───────────────────────────────────────────────────────────────

/// Power / availability state of the local radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AdapterState {
    #[default]
    Unknown,
    /// Connection with the system radio service was momentarily lost.
    Resetting,
    /// The platform has no central-role support.
    Unsupported,
    /// The application is not permitted to use the radio.
    Unauthorized,
    PoweredOff,
    PoweredOn,
}

impl fmt::Display for AdapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::Resetting => write!(f, "Resetting"),
            Self::Unsupported => write!(f, "Unsupported"),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::PoweredOff => write!(f, "Powered Off"),
            Self::PoweredOn => write!(f, "Powered On"),
        }
    }
}
