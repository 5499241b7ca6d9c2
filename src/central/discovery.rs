//! Discovery coordinator: the post-connect interrogation sequence.
//!
//! ```text
//!  begin_interrogation ──▶ arm interrogate-timeout ──▶ discover_services(all)
//!                                                           │
//!                      ┌────────────── ok ──────────────────┤
//!                      ▼                                    └── error ──▶ ServicesDiscoveryFailed
//!        cancel timeout, store services, Ready                          (timeout stays armed)
//!
//!  discover_characteristics / read_value / set_notify  ── explicit, fire-and-forget,
//!                                                        not covered by the timeout
//! ```
//!
//! The coordinator holds no link state of its own; it works entirely
//! through the [`Link`] view lent by the supervisor.

use heapless::Vec as FixedVec;
use log::{debug, info, warn};

use crate::app::events::CentralEvent;
use crate::app::ports::TransportPort;
use crate::config::CentralConfig;
use crate::error::{Precondition, TransportError};
use crate::gatt::{CharacteristicRef, DescriptorRef, PeripheralRef, ServiceRef};

use super::link::Link;
use super::state::ConnectionState;

/// Upper bound on services remembered per peripheral.
pub const MAX_SERVICES: usize = 32;

// ═══════════════════════════════════════════════════════════════
//  Discovered services
// ═══════════════════════════════════════════════════════════════

/// Services reported for the connected peripheral, in transport order.
/// Empty until service discovery completes.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredServiceSet {
    services: FixedVec<ServiceRef, MAX_SERVICES>,
}

impl DiscoveredServiceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set.  Services beyond [`MAX_SERVICES`] are dropped.
    pub fn replace(&mut self, services: &[ServiceRef]) {
        self.services.clear();
        for service in services {
            if self.services.push(*service).is_err() {
                warn!(
                    "discovery: {} services reported, keeping first {}",
                    services.len(),
                    MAX_SERVICES
                );
                break;
            }
        }
    }

    pub fn clear(&mut self) {
        self.services.clear();
    }

    pub fn as_slice(&self) -> &[ServiceRef] {
        &self.services
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Coordinator
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct DiscoveryCoordinator {
    interrogate_timeout_ms: u64,
}

impl DiscoveryCoordinator {
    pub fn new(config: &CentralConfig) -> Self {
        Self {
            interrogate_timeout_ms: u64::from(config.interrogate_timeout_ms),
        }
    }

    /// Start interrogating a freshly connected peripheral.
    pub fn begin_interrogation<T: TransportPort>(
        &self,
        link: &mut Link<'_, T>,
        peripheral: PeripheralRef,
    ) {
        link.arm_interrogate(peripheral, self.interrogate_timeout_ms);
        let started_at = link.now_ms();
        link.set_state(ConnectionState::Interrogating {
            peripheral,
            started_at,
        });
        link.transport().discover_services(peripheral, None);
        info!(
            "discovery: interrogating {} ({} ms budget)",
            peripheral, self.interrogate_timeout_ms
        );
    }

    /// Service discovery finished (successfully or not).
    pub fn on_services_discovered<T: TransportPort>(
        &self,
        link: &mut Link<'_, T>,
        peripheral: PeripheralRef,
        result: Result<Vec<ServiceRef>, TransportError>,
    ) {
        if link.connected() != Some(peripheral) {
            debug!("discovery: services for {} ignored, not connected", peripheral);
            return;
        }

        let services = match result {
            Ok(services) => services,
            Err(error) => {
                warn!("discovery: service discovery on {} failed: {}", peripheral, error);
                link.publish(CentralEvent::ServicesDiscoveryFailed { peripheral, error });
                return;
            }
        };

        link.cancel_interrogate();
        link.store_services(&services);
        link.set_state(ConnectionState::Ready(peripheral));
        info!("discovery: {} services on {}", services.len(), peripheral);
        link.publish(CentralEvent::ServicesDiscovered {
            peripheral,
            services,
        });
    }

    /// Issue one characteristic discovery per known service.
    /// No services, nothing to do.
    pub fn discover_characteristics<T: TransportPort>(&self, link: &mut Link<'_, T>) {
        let Some(peripheral) = link.connected() else {
            debug!("discovery: characteristics ignored: {}", Precondition::NotConnected);
            return;
        };
        if link.services().is_empty() {
            debug!("discovery: {} has no known services", peripheral);
            return;
        }

        let services: FixedVec<ServiceRef, MAX_SERVICES> =
            link.services().iter().copied().collect();
        for service in services {
            link.transport().discover_characteristics(service, None);
        }
    }

    pub fn read_value<T: TransportPort>(
        &self,
        link: &mut Link<'_, T>,
        characteristic: CharacteristicRef,
    ) {
        if let Err(reason) = Self::check_owner(link, characteristic.peripheral()) {
            debug!("discovery: read ignored: {}", reason);
            return;
        }
        link.transport().read_value(characteristic);
    }

    pub fn set_notify<T: TransportPort>(
        &self,
        link: &mut Link<'_, T>,
        characteristic: CharacteristicRef,
        enabled: bool,
    ) {
        if let Err(reason) = Self::check_owner(link, characteristic.peripheral()) {
            debug!("discovery: notify ignored: {}", reason);
            return;
        }
        link.transport().set_notify(characteristic, enabled);
    }

    // ── Completions ───────────────────────────────────────────

    pub fn on_characteristics_discovered<T: TransportPort>(
        &self,
        link: &mut Link<'_, T>,
        service: ServiceRef,
        result: Result<Vec<CharacteristicRef>, TransportError>,
    ) {
        if link.connected() != Some(service.peripheral) {
            debug!("discovery: stale characteristics for {}", service.peripheral);
            return;
        }
        match result {
            Ok(characteristics) => link.publish(CentralEvent::CharacteristicsDiscovered {
                service,
                characteristics,
            }),
            Err(error) => {
                warn!("discovery: characteristic discovery failed: {}", error);
                link.publish(CentralEvent::CharacteristicsDiscoveryFailed { service, error });
            }
        }
    }

    pub fn on_descriptors_discovered<T: TransportPort>(
        &self,
        link: &mut Link<'_, T>,
        characteristic: CharacteristicRef,
        result: Result<Vec<DescriptorRef>, TransportError>,
    ) {
        if link.connected() != Some(characteristic.peripheral()) {
            debug!("discovery: stale descriptors for {}", characteristic.peripheral());
            return;
        }
        match result {
            Ok(descriptors) => link.publish(CentralEvent::DescriptorsDiscovered {
                characteristic,
                descriptors,
            }),
            Err(error) => {
                warn!("discovery: descriptor discovery failed: {}", error);
                link.publish(CentralEvent::DescriptorsDiscoveryFailed {
                    characteristic,
                    error,
                });
            }
        }
    }

    pub fn on_value_updated<T: TransportPort>(
        &self,
        link: &mut Link<'_, T>,
        characteristic: CharacteristicRef,
        result: Result<Vec<u8>, TransportError>,
    ) {
        if link.connected() != Some(characteristic.peripheral()) {
            debug!("discovery: stale value for {}", characteristic.peripheral());
            return;
        }
        match result {
            Ok(value) => link.publish(CentralEvent::ValueUpdated {
                characteristic,
                value,
            }),
            Err(error) => {
                warn!("discovery: read failed: {}", error);
                link.publish(CentralEvent::ValueReadFailed {
                    characteristic,
                    error,
                });
            }
        }
    }

    /// Requests against a characteristic need its peripheral to be the
    /// connected one.
    pub(crate) fn check_owner<T: TransportPort>(
        link: &Link<'_, T>,
        owner: PeripheralRef,
    ) -> Result<(), Precondition> {
        match link.connected() {
            None => Err(Precondition::NotConnected),
            Some(p) if p != owner => Err(Precondition::ForeignPeripheral),
            Some(_) => Ok(()),
        }
    }
}
