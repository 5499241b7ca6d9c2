//! Application boundary: commands in, events out, ports to the radio.
//!
//! Everything the link core exchanges with the outside world is defined
//! here.  All interaction with the radio happens through **port traits**
//! defined in [`ports`], keeping the core fully testable without a radio.

pub mod commands;
pub mod events;
pub mod ports;
