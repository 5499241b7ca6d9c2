//! Inbound queue feeding the supervisor.
//!
//! Radio callbacks and application threads never touch the
//! [`ConnectionSupervisor`] directly.  They post into a bounded
//! `embassy-sync` channel, and the single context that owns the
//! supervisor drains it, so every completion is applied in arrival order
//! on one thread.
//!
//! ```text
//! ┌──────────────┐ TransportEvent ┌──────────────┐
//! │ radio stack  │──────────────▶│              │
//! └──────────────┘                │ TransportInbox │──drain──▶ ConnectionSupervisor
//! ┌──────────────┐ CentralCommand │              │
//! │ application  │──────────────▶│              │
//! └──────────────┘                └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::commands::CentralCommand;
use crate::app::ports::{ClockPort, TransportEvent, TransportPort};
use crate::central::ConnectionSupervisor;

/// Channel depth.  Sized for a burst of advertising reports.
pub const INBOX_DEPTH: usize = 32;

/// One queued input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Command(CentralCommand),
    Transport(TransportEvent),
}

impl From<CentralCommand> for Inbound {
    fn from(cmd: CentralCommand) -> Self {
        Self::Command(cmd)
    }
}

impl From<TransportEvent> for Inbound {
    fn from(event: TransportEvent) -> Self {
        Self::Transport(event)
    }
}

/// Bounded MPSC queue of [`Inbound`] messages.  Can live in a `static`.
pub struct TransportInbox {
    channel: Channel<CriticalSectionRawMutex, Inbound, INBOX_DEPTH>,
}

impl Default for TransportInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportInbox {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Queue a message without blocking.  Returns `false` (and drops the
    /// message) when the queue is full.
    pub fn post(&self, msg: impl Into<Inbound>) -> bool {
        match self.channel.try_send(msg.into()) {
            Ok(()) => true,
            Err(_) => {
                warn!("inbox: full ({} queued), dropping message", INBOX_DEPTH);
                false
            }
        }
    }

    pub fn try_take(&self) -> Option<Inbound> {
        self.channel.try_receive().ok()
    }

    /// Wait for the next message.
    pub async fn take(&self) -> Inbound {
        self.channel.receive().await
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Apply every queued message to `supervisor`, oldest first.
    /// Returns how many were applied.
    pub fn drain_into<T: TransportPort, C: ClockPort>(
        &self,
        supervisor: &mut ConnectionSupervisor<T, C>,
    ) -> usize {
        let mut applied = 0;
        while let Some(msg) = self.try_take() {
            dispatch(supervisor, msg);
            applied += 1;
        }
        applied
    }
}

/// Route one message to the matching supervisor entry point.
pub fn dispatch<T: TransportPort, C: ClockPort>(
    supervisor: &mut ConnectionSupervisor<T, C>,
    msg: Inbound,
) {
    match msg {
        Inbound::Command(cmd) => supervisor.handle_command(cmd),
        Inbound::Transport(event) => supervisor.handle_transport_event(event),
    }
}
