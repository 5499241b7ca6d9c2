//! Observer slot behaviour seen through the supervisor.

use crate::mock_transport::{P, RecordingTransport, harness};
use lightblue::adapters::clock::ManualClock;
use lightblue::adapters::history::HistorySink;
use lightblue::adapters::log_sink::LogEventSink;
use lightblue::app::ports::TransportEvent;
use lightblue::{CentralConfig, CentralEvent, ConnectionSupervisor, StateId};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn no_observer_does_not_block_progress() {
    let mut sup = ConnectionSupervisor::new(
        CentralConfig::default(),
        RecordingTransport::new(),
        ManualClock::new(),
    );
    sup.start_scan();
    sup.connect(P);
    sup.handle_transport_event(TransportEvent::Connected(P));
    assert_eq!(sup.state_id(), StateId::Interrogating);
}

#[test]
fn replacing_observer_moves_delivery() {
    let (mut sup, _clock, first) = harness();
    let second = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&second);
    let old = sup.set_observer(Box::new(move |e: &CentralEvent| {
        sink.borrow_mut().push(e.kind());
    }));
    assert!(old.is_some());

    sup.start_scan();
    assert!(first.all().is_empty());
    assert_eq!(*second.borrow(), vec!["state"]);

    sup.clear_observer();
    sup.stop_scan();
    assert_eq!(second.borrow().len(), 1);
}

#[test]
fn events_arrive_in_occurrence_order() {
    let (mut sup, _clock, observed) = harness();
    sup.start_scan();
    sup.connect(P);
    sup.handle_transport_event(TransportEvent::Connected(P));
    sup.handle_transport_event(TransportEvent::ServicesDiscovered {
        peripheral: P,
        result: Ok(vec![]),
    });

    let transitions: Vec<(StateId, StateId)> = observed
        .all()
        .iter()
        .filter_map(|e| match e {
            CentralEvent::StateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            (StateId::Idle, StateId::Scanning),
            (StateId::Scanning, StateId::Connecting),
            (StateId::Connecting, StateId::Connected),
            (StateId::Connected, StateId::Interrogating),
            (StateId::Interrogating, StateId::Ready),
        ]
    );
    let kinds = observed.kinds();
    let connected = kinds.iter().position(|k| *k == "connected");
    let services = kinds.iter().position(|k| *k == "services");
    assert!(connected.is_some());
    assert!(connected < services);
}

#[test]
fn history_sink_records_the_session() {
    let (mut sup, clock, _observed) = harness();
    let history = HistorySink::new();
    let log = history.log();
    sup.set_observer(Box::new(history));

    sup.connect(P);
    sup.handle_transport_event(TransportEvent::Connected(P));
    clock.set(6_000);
    sup.poll_timers();

    let kinds = log.kinds();
    assert!(kinds.contains(&"connected"));
    assert_eq!(kinds.last(), Some(&"interrogation-failed"));
    assert_eq!(
        log.latest().and_then(|e| e.peripheral),
        Some(P)
    );
}

#[test]
fn log_sink_accepts_every_event() {
    let (mut sup, clock, _observed) = harness();
    sup.set_observer(Box::new(LogEventSink::new()));
    sup.start_scan();
    sup.connect(P);
    clock.set(2_000);
    sup.poll_timers();
    sup.handle_transport_event(TransportEvent::Connected(P));
    sup.disconnect();
    assert_eq!(sup.state_id(), StateId::Scanning);
}
