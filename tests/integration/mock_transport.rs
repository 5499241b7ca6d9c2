//! Mock transport adapter for integration tests.
//!
//! Records every request so tests can assert on the full call history
//! without a radio, and an observer that keeps every published event.

use lightblue::adapters::clock::ManualClock;
use lightblue::app::ports::{ConnectOptions, TransportPort};
use lightblue::gatt::{CharacteristicRef, PeripheralRef, ServiceFilter, ServiceRef};
use lightblue::{CentralConfig, CentralEvent, ConnectionSupervisor};
use std::cell::RefCell;
use std::rc::Rc;

// ── Transport call record ─────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Scan {
        filter: Option<ServiceFilter>,
        allow_duplicates: bool,
    },
    StopScan,
    Connect {
        peripheral: PeripheralRef,
        options: ConnectOptions,
    },
    CancelConnection(PeripheralRef),
    DiscoverServices(PeripheralRef),
    DiscoverCharacteristics(ServiceRef),
    DiscoverDescriptors(CharacteristicRef),
    ReadValue(CharacteristicRef),
    SetNotify(CharacteristicRef, bool),
}

// ── RecordingTransport ────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub calls: Vec<TransportCall>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connects_to(&self, p: PeripheralRef) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, TransportCall::Connect { peripheral, .. } if *peripheral == p))
            .count()
    }

    pub fn cancels_of(&self, p: PeripheralRef) -> usize {
        self.calls
            .iter()
            .filter(|c| **c == TransportCall::CancelConnection(p))
            .count()
    }

    /// Connect requests not yet withdrawn by a cancel.
    pub fn outstanding_connects(&self) -> usize {
        let mut outstanding: usize = 0;
        for call in &self.calls {
            match call {
                TransportCall::Connect { .. } => outstanding += 1,
                TransportCall::CancelConnection(_) => {
                    outstanding = outstanding.saturating_sub(1);
                }
                _ => {}
            }
        }
        outstanding
    }

    /// Whether the last scan-related call left the radio scanning.
    pub fn scanning(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                TransportCall::Scan { .. } => Some(true),
                TransportCall::StopScan => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl TransportPort for RecordingTransport {
    fn scan(&mut self, filter: Option<&ServiceFilter>, allow_duplicates: bool) {
        self.calls.push(TransportCall::Scan {
            filter: filter.cloned(),
            allow_duplicates,
        });
    }

    fn stop_scan(&mut self) {
        self.calls.push(TransportCall::StopScan);
    }

    fn connect(&mut self, peripheral: PeripheralRef, options: ConnectOptions) {
        self.calls.push(TransportCall::Connect {
            peripheral,
            options,
        });
    }

    fn cancel_connection(&mut self, peripheral: PeripheralRef) {
        self.calls.push(TransportCall::CancelConnection(peripheral));
    }

    fn discover_services(&mut self, peripheral: PeripheralRef, _filter: Option<&[u128]>) {
        self.calls.push(TransportCall::DiscoverServices(peripheral));
    }

    fn discover_characteristics(&mut self, service: ServiceRef, _filter: Option<&[u128]>) {
        self.calls.push(TransportCall::DiscoverCharacteristics(service));
    }

    fn discover_descriptors(&mut self, characteristic: CharacteristicRef) {
        self.calls
            .push(TransportCall::DiscoverDescriptors(characteristic));
    }

    fn read_value(&mut self, characteristic: CharacteristicRef) {
        self.calls.push(TransportCall::ReadValue(characteristic));
    }

    fn set_notify(&mut self, characteristic: CharacteristicRef, enabled: bool) {
        self.calls
            .push(TransportCall::SetNotify(characteristic, enabled));
    }
}

// ── Observed events ───────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Observed {
    events: Rc<RefCell<Vec<CentralEvent>>>,
}

#[allow(dead_code)]
impl Observed {
    pub fn all(&self) -> Vec<CentralEvent> {
        self.events.borrow().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(CentralEvent::kind).collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.kind() == kind)
            .count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub type Supervisor = ConnectionSupervisor<RecordingTransport, ManualClock>;
pub type Harness = (Supervisor, ManualClock, Observed);

pub const P: PeripheralRef = PeripheralRef(0x0A01);
pub const Q: PeripheralRef = PeripheralRef(0x0B02);

/// Supervisor with the default config, a manual clock at 0 ms, and an
/// observer recording every event.
pub fn harness() -> Harness {
    harness_with(CentralConfig::default())
}

pub fn harness_with(config: CentralConfig) -> Harness {
    let clock = ManualClock::new();
    let mut sup = ConnectionSupervisor::new(config, RecordingTransport::new(), clock.clone());
    let observed = Observed::default();
    let sink = Rc::clone(&observed.events);
    sup.set_observer(Box::new(move |e: &CentralEvent| {
        sink.borrow_mut().push(e.clone());
    }));
    (sup, clock, observed)
}

#[allow(dead_code)]
pub fn service(p: PeripheralRef, handle: u16) -> ServiceRef {
    ServiceRef {
        peripheral: p,
        handle,
        uuid: 0x0000_180D_0000_1000_8000_0080_5F9B_34FB,
    }
}

#[allow(dead_code)]
pub fn characteristic(p: PeripheralRef, handle: u16) -> CharacteristicRef {
    CharacteristicRef {
        service: service(p, 1),
        handle,
        uuid: 0x0000_2A37_0000_1000_8000_0080_5F9B_34FB,
    }
}
