//! Bounded activity log.
//!
//! [`HistorySink`] keeps a one-line summary of the most recent events in a
//! fixed ring (`heapless::HistoryBuffer`), oldest overwritten first.  The
//! sink is moved into the supervisor's observer slot; keep an
//! [`ActivityLog`] handle to read it back.

use core::fmt::Write;
use std::cell::RefCell;
use std::rc::Rc;

use heapless::{HistoryBuffer, String};
use log::trace;

use crate::app::events::CentralEvent;
use crate::app::ports::EventSink;
use crate::gatt::PeripheralRef;

/// Entries retained.
pub const HISTORY_DEPTH: usize = 16;

/// One remembered event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    /// Position in the overall event stream, from 0.
    pub seq: u32,
    pub kind: &'static str,
    pub peripheral: Option<PeripheralRef>,
    /// Truncated to 64 bytes.
    pub summary: String<64>,
}

/// Shared read handle on the ring.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    ring: Rc<RefCell<HistoryBuffer<ActivityEntry, HISTORY_DEPTH>>>,
}

impl ActivityLog {
    pub fn len(&self) -> usize {
        self.ring.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.ring.borrow().oldest_ordered().cloned().collect()
    }

    pub fn latest(&self) -> Option<ActivityEntry> {
        self.ring.borrow().recent().cloned()
    }

    /// Kinds of the retained entries, oldest first.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.ring.borrow().oldest_ordered().map(|e| e.kind).collect()
    }
}

/// Observer that records every event into an [`ActivityLog`].
#[derive(Debug, Default)]
pub struct HistorySink {
    log: ActivityLog,
    seq: u32,
}

impl HistorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that stays readable after the sink is handed away.
    pub fn log(&self) -> ActivityLog {
        self.log.clone()
    }
}

impl EventSink for HistorySink {
    fn emit(&mut self, event: &CentralEvent) {
        let entry = ActivityEntry {
            seq: self.seq,
            kind: event.kind(),
            peripheral: subject(event),
            summary: summarize(event),
        };
        self.seq = self.seq.wrapping_add(1);
        self.log.ring.borrow_mut().write(entry);
    }
}

fn subject(event: &CentralEvent) -> Option<PeripheralRef> {
    match event {
        CentralEvent::AdapterStateChanged(_) | CentralEvent::StateChanged { .. } => None,
        CentralEvent::Connected(p) | CentralEvent::InterrogationFailed(p) => Some(*p),
        CentralEvent::PeripheralDiscovered { peripheral, .. }
        | CentralEvent::ConnectFailed { peripheral, .. }
        | CentralEvent::ServicesDiscovered { peripheral, .. }
        | CentralEvent::ServicesDiscoveryFailed { peripheral, .. }
        | CentralEvent::Disconnected { peripheral, .. } => Some(*peripheral),
        CentralEvent::CharacteristicsDiscovered { service, .. }
        | CentralEvent::CharacteristicsDiscoveryFailed { service, .. } => {
            Some(service.peripheral)
        }
        CentralEvent::DescriptorsDiscovered { characteristic, .. }
        | CentralEvent::DescriptorsDiscoveryFailed { characteristic, .. }
        | CentralEvent::ValueUpdated { characteristic, .. }
        | CentralEvent::ValueReadFailed { characteristic, .. } => {
            Some(characteristic.peripheral())
        }
    }
}

fn summarize(event: &CentralEvent) -> String<64> {
    let mut s = String::new();
    let written = match event {
        CentralEvent::AdapterStateChanged(state) => write!(s, "radio {}", state),
        CentralEvent::StateChanged { from, to } => write!(s, "{} -> {}", from, to),
        CentralEvent::PeripheralDiscovered {
            peripheral, rssi, ..
        } => write!(s, "saw {} at {}", peripheral, rssi),
        CentralEvent::Connected(p) => write!(s, "connected {}", p),
        CentralEvent::ConnectFailed { peripheral, error } => {
            write!(s, "connect {}: {}", peripheral, error)
        }
        CentralEvent::ServicesDiscovered { services, .. } => {
            write!(s, "{} services", services.len())
        }
        CentralEvent::CharacteristicsDiscovered {
            characteristics, ..
        } => write!(s, "{} characteristics", characteristics.len()),
        CentralEvent::DescriptorsDiscovered { descriptors, .. } => {
            write!(s, "{} descriptors", descriptors.len())
        }
        CentralEvent::ValueUpdated { value, .. } => write!(s, "{} bytes", value.len()),
        CentralEvent::ServicesDiscoveryFailed { error, .. }
        | CentralEvent::CharacteristicsDiscoveryFailed { error, .. }
        | CentralEvent::DescriptorsDiscoveryFailed { error, .. }
        | CentralEvent::ValueReadFailed { error, .. } => write!(s, "failed: {}", error),
        CentralEvent::InterrogationFailed(p) => write!(s, "interrogation of {} timed out", p),
        CentralEvent::Disconnected { peripheral, error } => match error {
            Some(e) => write!(s, "{} lost: {}", peripheral, e),
            None => write!(s, "{} disconnected", peripheral),
        },
    };
    if written.is_err() {
        trace!("history: {} summary truncated", event.kind());
    }
    s
}
