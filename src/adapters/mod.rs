//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements | Connects to                       |
//! |------------|------------|-----------------------------------|
//! | `clock`    | ClockPort  | `std::time::Instant` / test clock |
//! | `history`  | EventSink  | Bounded in-memory activity log    |
//! | `log_sink` | EventSink  | `log` facade                      |

pub mod clock;
pub mod history;
pub mod log_sink;
