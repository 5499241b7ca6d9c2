//! Fuzz target: `ConnectionSupervisor` under arbitrary input streams
//!
//! Decodes the input as a sequence of one-byte opcodes (commands,
//! transport completions for one of four peripherals, clock jumps) and
//! asserts that the supervisor never panics and never holds a timer for
//! a phase it is not in.
//!
//! cargo fuzz run fuzz_event_sequence

#![no_main]

use libfuzzer_sys::fuzz_target;
use lightblue::adapters::clock::ManualClock;
use lightblue::app::ports::{ConnectOptions, TransportEvent, TransportPort};
use lightblue::error::TransportError;
use lightblue::gatt::{CharacteristicRef, PeripheralRef, ServiceFilter, ServiceRef};
use lightblue::timers::TimerKind;
use lightblue::{CentralCommand, CentralConfig, ConnectionSupervisor, StateId};

struct NullTransport;

impl TransportPort for NullTransport {
    fn scan(&mut self, _: Option<&ServiceFilter>, _: bool) {}
    fn stop_scan(&mut self) {}
    fn connect(&mut self, _: PeripheralRef, _: ConnectOptions) {}
    fn cancel_connection(&mut self, _: PeripheralRef) {}
    fn discover_services(&mut self, _: PeripheralRef, _: Option<&[u128]>) {}
    fn discover_characteristics(&mut self, _: ServiceRef, _: Option<&[u128]>) {}
    fn discover_descriptors(&mut self, _: CharacteristicRef) {}
    fn read_value(&mut self, _: CharacteristicRef) {}
    fn set_notify(&mut self, _: CharacteristicRef, _: bool) {}
}

fuzz_target!(|data: &[u8]| {
    let clock = ManualClock::new();
    let mut sup = ConnectionSupervisor::new(CentralConfig::default(), NullTransport, clock.clone());

    for &byte in data {
        let p = PeripheralRef(u64::from(byte & 0x03));
        let service = ServiceRef {
            peripheral: p,
            handle: 1,
            uuid: 0x180F,
        };
        let characteristic = CharacteristicRef {
            service,
            handle: 2,
            uuid: 0x2A19,
        };
        match byte >> 4 {
            0 => sup.handle_command(CentralCommand::StartScan),
            1 => sup.handle_command(CentralCommand::StopScan),
            2 => sup.handle_command(CentralCommand::Connect(p)),
            3 => sup.handle_command(CentralCommand::CancelConnect),
            4 => sup.handle_command(CentralCommand::Disconnect),
            5 => sup.handle_command(CentralCommand::DiscoverCharacteristics),
            6 => sup.handle_command(CentralCommand::ReadValue(characteristic)),
            7 => sup.handle_transport_event(TransportEvent::Connected(p)),
            8 => sup.handle_transport_event(TransportEvent::ConnectFailed {
                peripheral: p,
                error: TransportError::new(i32::from(byte), "fuzz"),
            }),
            9 => sup.handle_transport_event(TransportEvent::Disconnected {
                peripheral: p,
                error: None,
            }),
            10 => sup.handle_transport_event(TransportEvent::ServicesDiscovered {
                peripheral: p,
                result: Ok(vec![service; usize::from(byte & 0x0F) * 3]),
            }),
            11 => sup.handle_transport_event(TransportEvent::ServicesDiscovered {
                peripheral: p,
                result: Err(TransportError::new(-1, "fuzz")),
            }),
            12 => sup.handle_transport_event(TransportEvent::ValueUpdated {
                characteristic,
                result: Ok(vec![byte]),
            }),
            _ => {
                clock.advance(u64::from(byte & 0x0F) * 500);
                sup.poll_timers();
            }
        }

        let state = sup.state_id();
        assert_eq!(
            sup.timers().is_armed(TimerKind::Connect),
            state == StateId::Connecting
        );
        assert_eq!(
            sup.timers().is_armed(TimerKind::Interrogate),
            state == StateId::Interrogating
        );
    }
});
