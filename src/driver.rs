//! Async driver loop. Owns the supervisor and sleeps until there is work.
//!
//! ```text
//!  loop {
//!      drain inbox ──▶ poll timers ──▶ shutdown? ──▶ await first of:
//!                                                     ├─ inbox message
//!                                                     ├─ next timer deadline (async-io-mini Timer)
//!                                                     └─ shutdown signal
//!  }
//! ```
//!
//! The loop is reactor-driven: with no timer armed it waits on the inbox
//! alone and never wakes for nothing.

use core::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;
use log::info;

use crate::app::ports::{ClockPort, TransportPort};
use crate::central::ConnectionSupervisor;
use crate::inbox::{Inbound, TransportInbox, dispatch};

/// Shutdown request for [`run`].
pub type Shutdown = Signal<CriticalSectionRawMutex, ()>;

enum Wake {
    Message(Inbound),
    Deadline,
    Shutdown,
}

/// Drive `supervisor` from `inbox` and its own timers until `shutdown`
/// is signalled.  Messages already queued when shutdown is seen are
/// applied first.
pub async fn run<T: TransportPort, C: ClockPort>(
    supervisor: &mut ConnectionSupervisor<T, C>,
    inbox: &TransportInbox,
    shutdown: &Shutdown,
) {
    info!("driver: started");
    loop {
        inbox.drain_into(supervisor);
        supervisor.poll_timers();

        if shutdown.signaled() {
            break;
        }

        let delay = supervisor
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(supervisor.clock().now_ms()));

        let wake = future::or(
            async { Wake::Message(inbox.take().await) },
            future::or(
                async {
                    match delay {
                        Some(ms) => {
                            async_io_mini::Timer::after(Duration::from_millis(ms)).await;
                        }
                        None => future::pending::<()>().await,
                    }
                    Wake::Deadline
                },
                async {
                    shutdown.wait().await;
                    Wake::Shutdown
                },
            ),
        )
        .await;

        match wake {
            Wake::Message(msg) => dispatch(supervisor, msg),
            Wake::Deadline => {}
            Wake::Shutdown => {
                inbox.drain_into(supervisor);
                break;
            }
        }
    }
    info!("driver: stopped");
}
