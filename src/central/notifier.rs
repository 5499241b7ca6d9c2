//! Single-slot event notifier.
//!
//! At most one observer is registered at a time.  Registering a new one
//! replaces (and returns) the old one.  Publishing with nobody registered
//! drops the event; the link core never blocks or fails on an absent
//! observer.

use log::trace;

use crate::app::events::CentralEvent;
use crate::app::ports::EventSink;

/// Owns the observer slot.
#[derive(Default)]
pub struct EventNotifier {
    observer: Option<Box<dyn EventSink>>,
}

impl EventNotifier {
    pub fn new() -> Self {
        Self { observer: None }
    }

    /// Install `observer`, returning the one it replaces.
    pub fn set_observer(&mut self, observer: Box<dyn EventSink>) -> Option<Box<dyn EventSink>> {
        self.observer.replace(observer)
    }

    /// Remove the current observer.
    pub fn clear_observer(&mut self) -> Option<Box<dyn EventSink>> {
        self.observer.take()
    }

    pub fn has_observer(&self) -> bool {
        self.observer.is_some()
    }

    /// Deliver `event` to the observer, if any.
    pub fn publish(&mut self, event: &CentralEvent) {
        match self.observer.as_mut() {
            Some(observer) => observer.emit(event),
            None => trace!("notifier: no observer, dropped {}", event.kind()),
        }
    }
}

impl core::fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventNotifier")
            .field("has_observer", &self.has_observer())
            .finish()
    }
}
