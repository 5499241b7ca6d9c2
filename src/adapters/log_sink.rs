//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each [`CentralEvent`] through the
//! `log` facade, one tagged line per event.

use log::{info, warn};

use crate::app::events::CentralEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`CentralEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &CentralEvent) {
        match event {
            CentralEvent::AdapterStateChanged(state) => {
                info!("RADIO | {}", state);
            }
            CentralEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            CentralEvent::PeripheralDiscovered {
                peripheral,
                advertisement,
                rssi,
            } => {
                info!(
                    "SCAN  | {} name={} rssi={} services={}",
                    peripheral,
                    advertisement.local_name.as_deref().unwrap_or("-"),
                    rssi,
                    advertisement.service_uuids.len(),
                );
            }
            CentralEvent::Connected(p) => {
                info!("LINK  | connected {}", p);
            }
            CentralEvent::ConnectFailed { peripheral, error } => {
                warn!("LINK  | connect {} failed: {}", peripheral, error);
            }
            CentralEvent::InterrogationFailed(p) => {
                warn!("LINK  | interrogation of {} abandoned", p);
            }
            CentralEvent::Disconnected { peripheral, error } => match error {
                Some(e) => warn!("LINK  | {} lost: {}", peripheral, e),
                None => info!("LINK  | {} disconnected", peripheral),
            },
            CentralEvent::ServicesDiscovered {
                peripheral,
                services,
            } => {
                info!("GATT  | {} services on {}", services.len(), peripheral);
            }
            CentralEvent::ServicesDiscoveryFailed { peripheral, error } => {
                warn!("GATT  | services on {}: {}", peripheral, error);
            }
            CentralEvent::CharacteristicsDiscovered {
                service,
                characteristics,
            } => {
                info!(
                    "GATT  | {} characteristics in service {:#06x}",
                    characteristics.len(),
                    service.handle
                );
            }
            CentralEvent::CharacteristicsDiscoveryFailed { service, error } => {
                warn!("GATT  | characteristics in {:#06x}: {}", service.handle, error);
            }
            CentralEvent::DescriptorsDiscovered {
                characteristic,
                descriptors,
            } => {
                info!(
                    "GATT  | {} descriptors on {:#06x}",
                    descriptors.len(),
                    characteristic.handle
                );
            }
            CentralEvent::DescriptorsDiscoveryFailed {
                characteristic,
                error,
            } => {
                warn!("GATT  | descriptors on {:#06x}: {}", characteristic.handle, error);
            }
            CentralEvent::ValueUpdated {
                characteristic,
                value,
            } => {
                info!(
                    "VALUE | {:#06x} = {:02x?}",
                    characteristic.handle, value
                );
            }
            CentralEvent::ValueReadFailed {
                characteristic,
                error,
            } => {
                warn!("VALUE | {:#06x} read failed: {}", characteristic.handle, error);
            }
        }
    }
}
