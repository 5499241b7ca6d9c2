//! Connection supervisor. Owns the one link and its two timeouts.
//!
//! ```text
//!  CentralCommand ──▶ ┌──────────────────────────────┐ ──▶ TransportPort
//!                     │     ConnectionSupervisor      │
//!  TransportEvent ──▶ │  state · timers · services    │ ──▶ EventNotifier ──▶ observer
//!  poll_timers()  ──▶ │  DiscoveryCoordinator (Link)  │
//!                     └──────────────────────────────┘
//! ```
//!
//! Every entry point runs to completion on the caller's thread and applies
//! its effects in a fixed order: cancel timers, mutate state, call the
//! transport, then deliver queued events to the observer.
//!
//! Recovery policy:
//!
//! - connect-timeout → withdraw the attempt and re-issue it to the same
//!   target (forever, unless `max_connect_attempts` is set).
//! - transport connect failure → back to `Idle`, scan stopped; the caller
//!   decides whether to try again.
//! - interrogate-timeout → tear the link down, resume scanning, report
//!   `InterrogationFailed`.  A stalled discovery is never retried on the
//!   same link.

pub mod discovery;
pub mod link;
pub mod notifier;
pub mod state;

use log::{debug, info, warn};

use crate::app::commands::CentralCommand;
use crate::app::events::CentralEvent;
use crate::app::ports::{ClockPort, ConnectOptions, EventSink, TransportEvent, TransportPort};
use crate::config::CentralConfig;
use crate::error::{LinkError, Precondition, TimeoutPhase, TransportError};
use crate::gatt::{AdapterState, CharacteristicRef, PeripheralRef, ServiceRef};
use crate::timers::{Expired, TimerKind, TimerQueue, TimerToken};

use discovery::{DiscoveredServiceSet, DiscoveryCoordinator};
use link::Link;
use notifier::EventNotifier;
use state::{ConnectionState, StateId};

// ───────────────────────────────────────────────────────────────
// ConnectionSupervisor
// ───────────────────────────────────────────────────────────────

/// Owns connection state, the in-flight attempt, both timers and the
/// observer slot.
pub struct ConnectionSupervisor<T: TransportPort, C: ClockPort> {
    config: CentralConfig,
    transport: T,
    clock: C,

    state: ConnectionState,
    /// Scanning runs alongside `Idle`/`Scanning`/`Connecting`.
    scanning: bool,
    adapter_state: AdapterState,
    /// Attempts issued for the current target, retries included.
    connect_attempts: u32,
    /// Peripheral we tore down ourselves and whose disconnect event is
    /// still due.
    released: Option<PeripheralRef>,

    timers: TimerQueue,
    connect_timer: Option<TimerToken>,
    interrogate_timer: Option<TimerToken>,

    discovery: DiscoveryCoordinator,
    services: DiscoveredServiceSet,

    notifier: EventNotifier,
    /// Events raised during the current entry point, delivered at its end.
    outbox: Vec<CentralEvent>,
}

impl<T: TransportPort, C: ClockPort> ConnectionSupervisor<T, C> {
    /// Construct an idle supervisor.  Nothing is sent to the transport.
    pub fn new(config: CentralConfig, transport: T, clock: C) -> Self {
        let discovery = DiscoveryCoordinator::new(&config);
        Self {
            config,
            transport,
            clock,
            state: ConnectionState::Idle,
            scanning: false,
            adapter_state: AdapterState::Unknown,
            connect_attempts: 0,
            released: None,
            timers: TimerQueue::new(),
            connect_timer: None,
            interrogate_timer: None,
            discovery,
            services: DiscoveredServiceSet::new(),
            notifier: EventNotifier::new(),
            outbox: Vec::new(),
        }
    }

    // ── Observer slot ─────────────────────────────────────────

    /// Register the observer, replacing (and returning) any previous one.
    pub fn set_observer(&mut self, observer: Box<dyn EventSink>) -> Option<Box<dyn EventSink>> {
        self.notifier.set_observer(observer)
    }

    pub fn clear_observer(&mut self) -> Option<Box<dyn EventSink>> {
        self.notifier.clear_observer()
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn state_id(&self) -> StateId {
        self.state.id()
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn connected_peripheral(&self) -> Option<PeripheralRef> {
        self.state.connected_peripheral()
    }

    pub fn pending_target(&self) -> Option<PeripheralRef> {
        self.state.pending_target()
    }

    /// Services of the connected peripheral (empty until discovered).
    pub fn services(&self) -> &[ServiceRef] {
        self.services.as_slice()
    }

    pub fn adapter_state(&self) -> AdapterState {
        self.adapter_state
    }

    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    /// Earliest pending timer deadline, for drivers that sleep.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn config(&self) -> &CentralConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ── Scanning ──────────────────────────────────────────────

    /// Begin scanning.  No-op while scanning or connected.
    pub fn start_scan(&mut self) {
        if self.scanning {
            debug!("central: start_scan ignored: {}", Precondition::AlreadyScanning);
            return;
        }
        if self.state.is_connected() {
            debug!("central: start_scan ignored: {}", Precondition::AlreadyConnected);
            return;
        }
        self.begin_scan();
        self.flush();
    }

    /// Stop scanning.  Safe to call when not scanning.
    pub fn stop_scan(&mut self) {
        if !self.scanning {
            debug!("central: stop_scan with no scan running");
            return;
        }
        self.end_scan();
        self.flush();
    }

    // ── Connection ────────────────────────────────────────────

    /// Connect to `target`.  Ignored while an attempt is pending or a
    /// peripheral is connected.
    pub fn connect(&mut self, target: PeripheralRef) {
        if let Some(pending) = self.state.pending_target() {
            debug!(
                "central: connect({}) ignored: {} ({})",
                target,
                Precondition::AttemptInFlight,
                pending
            );
            return;
        }
        if let Some(linked) = self.state.connected_peripheral() {
            debug!(
                "central: connect({}) ignored: {} ({})",
                target,
                Precondition::AlreadyConnected,
                linked
            );
            return;
        }
        self.connect_attempts = 0;
        self.issue_connect(target);
        self.flush();
    }

    /// Abandon the pending connect attempt, if any.
    pub fn cancel_connect(&mut self) {
        let Some(target) = self.state.pending_target() else {
            debug!("central: cancel_connect with no attempt pending");
            return;
        };
        self.cancel_connect_timer();
        self.connect_attempts = 0;
        let rest = self.resting_state();
        self.transition(rest);
        self.transport.cancel_connection(target);
        info!("central: connect attempt to {} abandoned", target);
        self.flush();
    }

    /// Tear down the current link and resume scanning.  No-op if nothing
    /// is connected.
    pub fn disconnect(&mut self) {
        let Some(peripheral) = self.state.connected_peripheral() else {
            debug!("central: disconnect ignored: {}", Precondition::NotConnected);
            return;
        };
        self.drop_link(peripheral);
        self.flush();
    }

    // ── GATT requests (forwarded only while connected) ────────

    pub fn discover_descriptors(&mut self, characteristic: CharacteristicRef) {
        let check = {
            let (_, link) = self.split();
            DiscoveryCoordinator::check_owner(&link, characteristic.peripheral())
        };
        if let Err(reason) = check {
            debug!("central: discover_descriptors ignored: {}", reason);
            return;
        }
        self.transport.discover_descriptors(characteristic);
    }

    pub fn discover_characteristics(&mut self) {
        let (discovery, mut link) = self.split();
        discovery.discover_characteristics(&mut link);
        self.flush();
    }

    pub fn read_value(&mut self, characteristic: CharacteristicRef) {
        let (discovery, mut link) = self.split();
        discovery.read_value(&mut link, characteristic);
        self.flush();
    }

    pub fn set_notify(&mut self, characteristic: CharacteristicRef, enabled: bool) {
        let (discovery, mut link) = self.split();
        discovery.set_notify(&mut link, characteristic, enabled);
        self.flush();
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Apply an external command.
    pub fn handle_command(&mut self, cmd: CentralCommand) {
        match cmd {
            CentralCommand::StartScan => self.start_scan(),
            CentralCommand::StopScan => self.stop_scan(),
            CentralCommand::Connect(target) => self.connect(target),
            CentralCommand::CancelConnect => self.cancel_connect(),
            CentralCommand::Disconnect => self.disconnect(),
            CentralCommand::DiscoverCharacteristics => self.discover_characteristics(),
            CentralCommand::DiscoverDescriptors(c) => self.discover_descriptors(c),
            CentralCommand::ReadValue(c) => self.read_value(c),
            CentralCommand::SetNotify {
                characteristic,
                enabled,
            } => self.set_notify(characteristic, enabled),
        }
    }

    /// Apply one completion or unsolicited event from the transport.
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::AdapterStateChanged(state) => {
                info!("central: adapter state: {}", state);
                self.adapter_state = state;
                self.outbox.push(CentralEvent::AdapterStateChanged(state));
            }
            TransportEvent::PeripheralDiscovered {
                peripheral,
                advertisement,
                rssi,
            } => {
                if self.scanning {
                    debug!("central: discovered {} (RSSI {})", peripheral, rssi);
                    self.outbox.push(CentralEvent::PeripheralDiscovered {
                        peripheral,
                        advertisement,
                        rssi,
                    });
                } else {
                    debug!("central: late sighting of {} dropped", peripheral);
                }
            }
            TransportEvent::Connected(peripheral) => self.on_connected(peripheral),
            TransportEvent::ConnectFailed { peripheral, error } => {
                self.on_connect_failed(peripheral, error);
            }
            TransportEvent::Disconnected { peripheral, error } => {
                self.on_disconnected(peripheral, error);
            }
            TransportEvent::ServicesDiscovered { peripheral, result } => {
                let (discovery, mut link) = self.split();
                discovery.on_services_discovered(&mut link, peripheral, result);
            }
            TransportEvent::CharacteristicsDiscovered { service, result } => {
                let (discovery, mut link) = self.split();
                discovery.on_characteristics_discovered(&mut link, service, result);
            }
            TransportEvent::DescriptorsDiscovered {
                characteristic,
                result,
            } => {
                let (discovery, mut link) = self.split();
                discovery.on_descriptors_discovered(&mut link, characteristic, result);
            }
            TransportEvent::ValueUpdated {
                characteristic,
                result,
            } => {
                let (discovery, mut link) = self.split();
                discovery.on_value_updated(&mut link, characteristic, result);
            }
        }
        self.flush();
    }

    /// Fire every timer whose deadline has passed.  Returns how many fired.
    ///
    /// Only timers already due when the poll starts are fired.  A timer
    /// re-armed by one of them waits for the next poll, even with a zero
    /// timeout.
    pub fn poll_timers(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut fired = 0;
        for token in self.timers.due(now) {
            // An earlier expiry in this poll may have cancelled it.
            let Some(expired) = self.timers.fire(token) else {
                continue;
            };
            fired += 1;
            match expired.kind {
                TimerKind::Connect => self.on_connect_timeout(expired),
                TimerKind::Interrogate => self.on_interrogate_timeout(expired),
            }
        }
        self.flush();
        fired
    }

    // ── Transport completions ─────────────────────────────────

    fn on_connected(&mut self, peripheral: PeripheralRef) {
        if self.state.pending_target() != Some(peripheral) {
            if self.state.connected_peripheral() == Some(peripheral) {
                debug!("central: duplicate connect completion for {}", peripheral);
            } else {
                warn!("central: unsolicited connection to {}, cancelling", peripheral);
                self.transport.cancel_connection(peripheral);
            }
            return;
        }

        self.cancel_connect_timer();
        self.connect_attempts = 0;
        self.released = None;
        self.transition(ConnectionState::Connected(peripheral));
        if self.scanning {
            self.end_scan();
        }
        info!("central: connected to {}", peripheral);
        self.outbox.push(CentralEvent::Connected(peripheral));

        let (discovery, mut link) = self.split();
        discovery.begin_interrogation(&mut link, peripheral);
    }

    fn on_connect_failed(&mut self, peripheral: PeripheralRef, error: TransportError) {
        if self.state.pending_target() != Some(peripheral) {
            debug!("central: stale connect failure for {} ignored", peripheral);
            return;
        }
        self.cancel_connect_timer();
        self.give_up();
        warn!("central: connect to {} failed: {}", peripheral, error);
        self.outbox.push(CentralEvent::ConnectFailed {
            peripheral,
            error: LinkError::Transport(error),
        });
    }

    fn on_disconnected(&mut self, peripheral: PeripheralRef, error: Option<TransportError>) {
        if self.state.connected_peripheral() == Some(peripheral) {
            self.cancel_interrogate_timer();
            self.services.clear();
            self.rest_after_link();
        } else if self.released == Some(peripheral) {
            self.released = None;
        } else {
            debug!("central: disconnect of unlinked {} ignored", peripheral);
            return;
        }
        match &error {
            Some(e) => warn!("central: {} disconnected: {}", peripheral, e),
            None => info!("central: {} disconnected", peripheral),
        }
        self.outbox
            .push(CentralEvent::Disconnected { peripheral, error });
    }

    // ── Timer expiries ────────────────────────────────────────

    fn on_connect_timeout(&mut self, expired: Expired) {
        if self.state.pending_target() != Some(expired.target) {
            debug!("central: stale connect timeout for {}", expired.target);
            return;
        }
        self.connect_timer = None;
        let target = expired.target;
        warn!(
            "central: connect to {} timed out (attempt {})",
            target, self.connect_attempts
        );

        let exhausted = self
            .config
            .max_connect_attempts
            .is_some_and(|max| self.connect_attempts >= max);
        if exhausted {
            self.give_up();
            self.transport.cancel_connection(target);
            warn!("central: giving up on {}", target);
            self.outbox.push(CentralEvent::ConnectFailed {
                peripheral: target,
                error: LinkError::Timeout(TimeoutPhase::Connect),
            });
            return;
        }

        // Withdraw the stalled request so only one is ever outstanding.
        self.transport.cancel_connection(target);
        self.issue_connect(target);
    }

    fn on_interrogate_timeout(&mut self, expired: Expired) {
        let peripheral = match self.state {
            ConnectionState::Interrogating { peripheral, .. } if peripheral == expired.target => {
                peripheral
            }
            _ => {
                debug!("central: stale interrogate timeout for {}", expired.target);
                return;
            }
        };
        self.interrogate_timer = None;
        warn!("central: interrogation of {} timed out, dropping link", peripheral);
        self.drop_link(peripheral);
        self.outbox.push(CentralEvent::InterrogationFailed(peripheral));
    }

    // ── Internal ──────────────────────────────────────────────

    fn issue_connect(&mut self, target: PeripheralRef) {
        let now = self.clock.now_ms();
        self.connect_attempts += 1;
        self.transition(ConnectionState::Connecting {
            target,
            attempt_started_at: now,
        });
        self.transport.connect(
            target,
            ConnectOptions {
                notify_on_disconnection: self.config.notify_on_disconnection,
            },
        );
        let token = self.timers.arm(
            TimerKind::Connect,
            target,
            now,
            u64::from(self.config.connect_timeout_ms),
        );
        self.connect_timer = Some(token);
        info!(
            "central: connecting to {} (attempt {})",
            target, self.connect_attempts
        );
    }

    /// Tear down a link we own: cancel its timer, forget its services,
    /// release it at the transport, and rest.
    fn drop_link(&mut self, peripheral: PeripheralRef) {
        self.cancel_interrogate_timer();
        self.services.clear();
        self.released = Some(peripheral);
        self.rest_after_link();
        self.transport.cancel_connection(peripheral);
        info!("central: released {}", peripheral);
    }

    /// After a link ends: resume scanning if configured, otherwise idle.
    fn rest_after_link(&mut self) {
        if self.config.resume_scan_on_disconnect {
            self.begin_scan();
        } else {
            self.transition(ConnectionState::Idle);
        }
    }

    fn begin_scan(&mut self) {
        self.scanning = true;
        if !self.state.is_connecting() {
            self.transition(ConnectionState::Scanning);
        }
        let filter = self.config.scan_filter();
        self.transport
            .scan(filter.as_ref(), self.config.allow_duplicates);
        info!("central: scanning (duplicates={})", self.config.allow_duplicates);
    }

    fn end_scan(&mut self) {
        self.scanning = false;
        if self.state == ConnectionState::Scanning {
            self.transition(ConnectionState::Idle);
        }
        self.transport.stop_scan();
        info!("central: scan stopped");
    }

    /// A failed attempt ends the cycle: back to `Idle` with the scan
    /// stopped, until the caller starts over.
    fn give_up(&mut self) {
        self.connect_attempts = 0;
        let was_scanning = self.scanning;
        self.scanning = false;
        self.transition(ConnectionState::Idle);
        if was_scanning {
            self.transport.stop_scan();
        }
    }

    /// Where a withdrawn attempt goes.
    fn resting_state(&self) -> ConnectionState {
        if self.scanning {
            ConnectionState::Scanning
        } else {
            ConnectionState::Idle
        }
    }

    fn cancel_connect_timer(&mut self) {
        if let Some(token) = self.connect_timer.take() {
            self.timers.cancel(token);
        }
    }

    fn cancel_interrogate_timer(&mut self) {
        if let Some(token) = self.interrogate_timer.take() {
            self.timers.cancel(token);
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        link::transition(&mut self.state, &mut self.outbox, next);
    }

    /// Lend the discovery coordinator its view of the link.
    fn split(&mut self) -> (&DiscoveryCoordinator, Link<'_, T>) {
        let now_ms = self.clock.now_ms();
        (
            &self.discovery,
            Link {
                state: &mut self.state,
                timers: &mut self.timers,
                interrogate_timer: &mut self.interrogate_timer,
                services: &mut self.services,
                transport: &mut self.transport,
                outbox: &mut self.outbox,
                now_ms,
            },
        )
    }

    /// Deliver queued events, in the order they were raised.
    fn flush(&mut self) {
        for event in self.outbox.drain(..) {
            self.notifier.publish(&event);
        }
    }
}

impl<T: TransportPort + core::fmt::Debug, C: ClockPort> core::fmt::Debug
    for ConnectionSupervisor<T, C>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConnectionSupervisor")
            .field("state", &self.state)
            .field("scanning", &self.scanning)
            .field("connect_attempts", &self.connect_attempts)
            .field("timers", &self.timers)
            .field("services", &self.services.len())
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}
