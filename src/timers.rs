//! Timeout timers for the link core.
//!
//! There are exactly two timer categories (connect and interrogate), and
//! each holds at most one live timer.  Arming a category replaces whatever
//! was armed there before; the replaced timer can never fire.
//!
//! ```text
//!            arm(kind)            due(now) + fire(token)
//!   token ◀──────────── ┌────────────┐ ───────────────▶ Expired{kind, target}
//!                       │ slot[kind] │
//!   cancel(token) ────▶ └────────────┘  (slot cleared before the
//!   (no-op if stale)                     expiry is handed out)
//! ```
//!
//! Every armed timer is stamped with a fresh generation number and the
//! caller gets it back as a [`TimerToken`].  Cancelling with a token whose
//! generation no longer matches the slot (already fired, already
//! cancelled, or replaced by a re-arm) is a no-op.  The queue is polled
//! from the same serialized context that cancels, so a timer is either
//! still in its slot (cancel wins) or already handed out (cancel is late
//! and harmless); there is no third case.

use heapless::Vec as FixedVec;
use log::debug;

use crate::gatt::PeripheralRef;

// ═══════════════════════════════════════════════════════════════
//  Timer identity
// ═══════════════════════════════════════════════════════════════

/// Timer category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TimerKind {
    /// Bounds one connect attempt.
    Connect = 0,
    /// Bounds post-connect service discovery.
    Interrogate = 1,
}

impl TimerKind {
    /// Number of categories; sizes the slot array.
    pub const COUNT: usize = 2;

    fn index(self) -> usize {
        self as usize
    }
}

/// Cancellation handle returned by [`TimerQueue::arm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken {
    kind: TimerKind,
    generation: u32,
}

impl TimerToken {
    pub fn kind(&self) -> TimerKind {
        self.kind
    }
}

/// A timer that reached its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expired {
    pub kind: TimerKind,
    /// Peripheral the timer was armed for.
    pub target: PeripheralRef,
    pub deadline_ms: u64,
}

// ═══════════════════════════════════════════════════════════════
//  Queue
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
struct TimerEntry {
    generation: u32,
    deadline_ms: u64,
    target: PeripheralRef,
}

/// Two-slot timer queue.
#[derive(Debug)]
pub struct TimerQueue {
    slots: [Option<TimerEntry>; TimerKind::COUNT],
    next_generation: u32,
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerQueue {
    pub fn new() -> Self {
        Self {
            slots: [None; TimerKind::COUNT],
            next_generation: 1,
        }
    }

    /// Arm `kind` to expire `after_ms` from `now_ms`, bound to `target`.
    /// Any timer already armed in that category is invalidated first.
    pub fn arm(
        &mut self,
        kind: TimerKind,
        target: PeripheralRef,
        now_ms: u64,
        after_ms: u64,
    ) -> TimerToken {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1).max(1);

        let slot = &mut self.slots[kind.index()];
        if let Some(old) = slot.take() {
            debug!(
                "timers: {:?} re-armed, invalidating generation {}",
                kind, old.generation
            );
        }
        let deadline_ms = now_ms.saturating_add(after_ms);
        *slot = Some(TimerEntry {
            generation,
            deadline_ms,
            target,
        });
        debug!(
            "timers: {:?} armed for {} (deadline {} ms, gen {})",
            kind, target, deadline_ms, generation
        );

        TimerToken { kind, generation }
    }

    /// Cancel the timer identified by `token`.
    ///
    /// Returns `true` if a live timer was removed; `false` if the token is
    /// stale (fired, cancelled, or superseded).  Never fails.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        if !self.is_live(token) {
            return false;
        }
        self.slots[token.kind.index()] = None;
        debug!("timers: {:?} cancelled (gen {})", token.kind, token.generation);
        true
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// Whether `token` still refers to the live timer in its slot.
    pub fn is_live(&self, token: TimerToken) -> bool {
        self.slots[token.kind.index()].is_some_and(|e| e.generation == token.generation)
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<u64> {
        self.slots[kind.index()].map(|e| e.deadline_ms)
    }

    /// Target the live timer of `kind` is bound to.
    pub fn target(&self, kind: TimerKind) -> Option<PeripheralRef> {
        self.slots[kind.index()].map(|e| e.target)
    }

    /// Earliest deadline across all armed timers.
    pub fn next_deadline(&self) -> Option<u64> {
        self.slots.iter().flatten().map(|e| e.deadline_ms).min()
    }

    /// Number of armed timers.
    pub fn armed_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Tokens of every timer due at `now_ms`, earliest deadline first.
    ///
    /// The set is fixed when taken: a timer armed afterwards is not in it,
    /// even if its deadline is also `<= now_ms`.
    pub fn due(&self, now_ms: u64) -> FixedVec<TimerToken, { TimerKind::COUNT }> {
        let mut due: FixedVec<(u64, TimerToken), { TimerKind::COUNT }> = self
            .slots
            .iter()
            .zip([TimerKind::Connect, TimerKind::Interrogate])
            .filter_map(|(slot, kind)| {
                slot.filter(|e| e.deadline_ms <= now_ms).map(|e| {
                    (
                        e.deadline_ms,
                        TimerToken {
                            kind,
                            generation: e.generation,
                        },
                    )
                })
            })
            .collect();
        due.sort_unstable_by_key(|&(deadline, _)| deadline);
        due.into_iter().map(|(_, token)| token).collect()
    }

    /// Remove and return the timer `token` refers to, if it is still live.
    ///
    /// The slot is cleared before the expiry is returned, so a timer is
    /// handed out at most once.
    pub fn fire(&mut self, token: TimerToken) -> Option<Expired> {
        if !self.is_live(token) {
            return None;
        }
        let entry = self.slots[token.kind.index()].take()?;
        debug!(
            "timers: {:?} fired for {} (gen {})",
            token.kind, entry.target, entry.generation
        );
        Some(Expired {
            kind: token.kind,
            target: entry.target,
            deadline_ms: entry.deadline_ms,
        })
    }

    /// Remove and return the earliest timer whose deadline is `<= now_ms`.
    pub fn poll_expired(&mut self, now_ms: u64) -> Option<Expired> {
        let token = *self.due(now_ms).first()?;
        self.fire(token)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
