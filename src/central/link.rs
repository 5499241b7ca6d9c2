//! Accessor view over the supervisor's link state.
//!
//! The [`DiscoveryCoordinator`](super::discovery::DiscoveryCoordinator)
//! never owns connection state or timers.  The supervisor lends it a
//! [`Link`] borrowing exactly the fields discovery may touch, and every
//! mutation goes through the methods below.  Events raised here are queued
//! in the supervisor's outbox and delivered after the whole operation has
//! applied its side effects.

use log::{debug, info};

use crate::app::events::CentralEvent;
use crate::app::ports::TransportPort;
use crate::gatt::{PeripheralRef, ServiceRef};
use crate::timers::{TimerKind, TimerQueue, TimerToken};

use super::discovery::DiscoveredServiceSet;
use super::state::ConnectionState;

/// Move `state` to `next`, logging and queueing a `StateChanged` event
/// when the discriminant actually changes.
pub(crate) fn transition(
    state: &mut ConnectionState,
    outbox: &mut Vec<CentralEvent>,
    next: ConnectionState,
) {
    let from = state.id();
    let to = next.id();
    *state = next;
    if from != to {
        info!("central: {} -> {}", from, to);
        outbox.push(CentralEvent::StateChanged { from, to });
    }
}

/// Borrowed view of the supervisor's link state.
pub struct Link<'a, T: TransportPort> {
    pub(super) state: &'a mut ConnectionState,
    pub(super) timers: &'a mut TimerQueue,
    pub(super) interrogate_timer: &'a mut Option<TimerToken>,
    pub(super) services: &'a mut DiscoveredServiceSet,
    pub(super) transport: &'a mut T,
    pub(super) outbox: &'a mut Vec<CentralEvent>,
    pub(super) now_ms: u64,
}

impl<T: TransportPort> Link<'_, T> {
    /// The linked peripheral, if any.
    pub fn connected(&self) -> Option<PeripheralRef> {
        self.state.connected_peripheral()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn set_state(&mut self, next: ConnectionState) {
        transition(&mut *self.state, &mut *self.outbox, next);
    }

    /// Arm (or re-arm) the interrogate-timeout for `peripheral`.
    pub fn arm_interrogate(&mut self, peripheral: PeripheralRef, after_ms: u64) {
        let token = self
            .timers
            .arm(TimerKind::Interrogate, peripheral, self.now_ms, after_ms);
        *self.interrogate_timer = Some(token);
    }

    /// Disarm the interrogate-timeout.  Harmless if it already fired.
    pub fn cancel_interrogate(&mut self) {
        if let Some(token) = self.interrogate_timer.take() {
            if !self.timers.cancel(token) {
                debug!("central: interrogate timer already gone");
            }
        }
    }

    pub fn interrogate_armed(&self) -> bool {
        self.interrogate_timer
            .is_some_and(|token| self.timers.is_live(token))
    }

    pub fn services(&self) -> &[ServiceRef] {
        self.services.as_slice()
    }

    pub fn store_services(&mut self, services: &[ServiceRef]) {
        self.services.replace(services);
    }

    pub fn transport(&mut self) -> &mut T {
        &mut *self.transport
    }

    /// Queue an event for the observer.
    pub fn publish(&mut self, event: CentralEvent) {
        self.outbox.push(event);
    }
}
