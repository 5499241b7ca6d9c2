//! Interrogation and follow-up GATT discovery against a live link.

use crate::mock_transport::{Harness, P, Q, TransportCall, characteristic, harness, service};
use lightblue::app::ports::TransportEvent;
use lightblue::error::TransportError;
use lightblue::gatt::DescriptorRef;
use lightblue::timers::TimerKind;
use lightblue::{CentralCommand, CentralEvent, StateId};

/// Link `P` at t=500 ms and leave it interrogating.
fn interrogating() -> Harness {
    let (mut sup, clock, observed) = harness();
    sup.start_scan();
    sup.connect(P);
    clock.set(500);
    sup.handle_transport_event(TransportEvent::Connected(P));
    sup.transport_mut().calls.clear();
    observed.clear();
    (sup, clock, observed)
}

fn ready(services: u16) -> Harness {
    let (mut sup, clock, observed) = interrogating();
    sup.handle_transport_event(TransportEvent::ServicesDiscovered {
        peripheral: P,
        result: Ok((1..=services).map(|h| service(P, h)).collect()),
    });
    sup.transport_mut().calls.clear();
    observed.clear();
    (sup, clock, observed)
}

// ── Interrogation timeout ─────────────────────────────────────

#[test]
fn stalled_interrogation_is_abandoned_once() {
    let (mut sup, clock, observed) = interrogating();

    clock.set(5_499);
    assert_eq!(sup.poll_timers(), 0);
    assert_eq!(sup.state_id(), StateId::Interrogating);

    clock.set(5_500);
    assert_eq!(sup.poll_timers(), 1);

    assert_eq!(sup.state_id(), StateId::Scanning);
    assert_eq!(sup.connected_peripheral(), None);
    assert_eq!(sup.transport().cancels_of(P), 1);
    assert!(sup.transport().scanning());
    assert_eq!(
        observed.all().last(),
        Some(&CentralEvent::InterrogationFailed(P))
    );

    clock.set(20_000);
    assert_eq!(sup.poll_timers(), 0);
    assert_eq!(observed.count("interrogation-failed"), 1);
}

#[test]
fn services_after_abandonment_are_ignored() {
    let (mut sup, clock, observed) = interrogating();
    clock.set(6_000);
    sup.poll_timers();
    observed.clear();

    sup.handle_transport_event(TransportEvent::ServicesDiscovered {
        peripheral: P,
        result: Ok(vec![service(P, 1)]),
    });
    assert_eq!(sup.state_id(), StateId::Scanning);
    assert!(sup.services().is_empty());
    assert!(observed.all().is_empty());
}

#[test]
fn discovery_error_leaves_timeout_to_finish_the_job() {
    let (mut sup, clock, observed) = interrogating();
    sup.handle_transport_event(TransportEvent::ServicesDiscovered {
        peripheral: P,
        result: Err(TransportError::new(-3, "att timeout")),
    });

    assert_eq!(sup.connected_peripheral(), Some(P));
    assert_eq!(sup.transport().cancels_of(P), 0);
    assert!(sup.timers().is_armed(TimerKind::Interrogate));
    assert_eq!(observed.kinds(), vec!["services-failed"]);

    clock.set(5_500);
    sup.poll_timers();
    assert_eq!(observed.count("interrogation-failed"), 1);
    assert_eq!(sup.transport().cancels_of(P), 1);
}

#[test]
fn disconnect_during_interrogation_cancels_timeout() {
    let (mut sup, clock, observed) = interrogating();
    sup.handle_transport_event(TransportEvent::Disconnected {
        peripheral: P,
        error: None,
    });
    clock.set(9_000);
    assert_eq!(sup.poll_timers(), 0);
    assert_eq!(observed.count("interrogation-failed"), 0);
}

// ── Preconditions ─────────────────────────────────────────────

#[test]
fn requests_without_link_do_nothing() {
    let (mut sup, _clock, observed) = harness();
    sup.discover_characteristics();
    sup.read_value(characteristic(P, 4));
    sup.discover_descriptors(characteristic(P, 4));
    sup.set_notify(characteristic(P, 4), true);
    assert!(sup.transport().calls.is_empty());
    assert!(observed.all().is_empty());

    sup.start_scan();
    observed.clear();
    let before = sup.transport().calls.len();
    sup.handle_command(CentralCommand::DiscoverCharacteristics);
    sup.handle_command(CentralCommand::ReadValue(characteristic(P, 4)));
    assert_eq!(sup.transport().calls.len(), before);
    assert!(observed.all().is_empty());
}

#[test]
fn requests_for_another_peripheral_do_nothing() {
    let (mut sup, _clock, _observed) = ready(1);
    sup.read_value(characteristic(Q, 4));
    sup.discover_descriptors(characteristic(Q, 4));
    assert!(sup.transport().calls.is_empty());
}

// ── Follow-up discovery ───────────────────────────────────────

#[test]
fn characteristics_requested_once_per_service() {
    let (mut sup, _clock, _observed) = ready(3);
    sup.discover_characteristics();
    assert_eq!(
        sup.transport().calls,
        vec![
            TransportCall::DiscoverCharacteristics(service(P, 1)),
            TransportCall::DiscoverCharacteristics(service(P, 2)),
            TransportCall::DiscoverCharacteristics(service(P, 3)),
        ]
    );
}

#[test]
fn zero_services_means_no_characteristic_requests() {
    let (mut sup, _clock, observed) = ready(0);
    sup.discover_characteristics();
    assert!(sup.transport().calls.is_empty());
    assert!(observed.all().is_empty());
}

#[test]
fn characteristic_results_are_published() {
    let (mut sup, _clock, observed) = ready(1);
    sup.handle_transport_event(TransportEvent::CharacteristicsDiscovered {
        service: service(P, 1),
        result: Ok(vec![characteristic(P, 4)]),
    });
    sup.handle_transport_event(TransportEvent::CharacteristicsDiscovered {
        service: service(P, 1),
        result: Err(TransportError::new(5, "insufficient auth")),
    });
    assert_eq!(
        observed.kinds(),
        vec!["characteristics", "characteristics-failed"]
    );
}

#[test]
fn descriptors_forwarded_and_reported() {
    let (mut sup, _clock, observed) = ready(1);
    let ch = characteristic(P, 4);
    sup.handle_command(CentralCommand::DiscoverDescriptors(ch));
    assert_eq!(
        sup.transport().calls,
        vec![TransportCall::DiscoverDescriptors(ch)]
    );

    let cccd = DescriptorRef {
        characteristic: ch,
        handle: 5,
        uuid: 0x2902,
    };
    sup.handle_transport_event(TransportEvent::DescriptorsDiscovered {
        characteristic: ch,
        result: Ok(vec![cccd]),
    });
    assert_eq!(
        observed.all(),
        vec![CentralEvent::DescriptorsDiscovered {
            characteristic: ch,
            descriptors: vec![cccd],
        }]
    );
}

#[test]
fn reads_and_notifications_deliver_values() {
    let (mut sup, _clock, observed) = ready(1);
    let ch = characteristic(P, 4);
    sup.read_value(ch);
    sup.handle_command(CentralCommand::SetNotify {
        characteristic: ch,
        enabled: true,
    });
    assert_eq!(
        sup.transport().calls,
        vec![
            TransportCall::ReadValue(ch),
            TransportCall::SetNotify(ch, true)
        ]
    );

    sup.handle_transport_event(TransportEvent::ValueUpdated {
        characteristic: ch,
        result: Ok(vec![0x06, 0x48]),
    });
    sup.handle_transport_event(TransportEvent::ValueUpdated {
        characteristic: ch,
        result: Err(TransportError::new(2, "read not permitted")),
    });
    assert_eq!(observed.kinds(), vec!["value", "value-failed"]);
}

#[test]
fn results_after_disconnect_are_dropped() {
    let (mut sup, _clock, observed) = ready(1);
    sup.disconnect();
    observed.clear();

    sup.handle_transport_event(TransportEvent::ValueUpdated {
        characteristic: characteristic(P, 4),
        result: Ok(vec![1]),
    });
    sup.handle_transport_event(TransportEvent::CharacteristicsDiscovered {
        service: service(P, 1),
        result: Ok(vec![]),
    });
    assert!(observed.all().is_empty());
}
