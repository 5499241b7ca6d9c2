//! lightblue: BLE central link core.
//!
//! Drives one central-role connection at a time: scan, connect with a
//! retried connect-timeout, interrogate services under an abandonment
//! timeout, and report everything through a single observer slot.
//!
//! The radio itself sits behind [`app::ports::TransportPort`]; nothing in
//! this crate talks to hardware directly.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod central;
pub mod config;
pub mod driver;
pub mod error;
pub mod gatt;
pub mod inbox;
pub mod timers;

pub use app::commands::CentralCommand;
pub use app::events::CentralEvent;
pub use app::ports::{ClockPort, ConnectOptions, EventSink, TransportEvent, TransportPort};
pub use central::ConnectionSupervisor;
pub use central::state::{ConnectionState, StateId};
pub use config::CentralConfig;
