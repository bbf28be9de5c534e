use std::cmp::Reverse;
use std::collections::BinaryHeap;

use slotmap::{new_key_type, SlotMap};

use super::event::EventKind;
use super::state::Ticks;

new_key_type! {
    pub struct TimerId;
}

#[derive(Debug)]
struct TimerSlot {
    fire_at: Ticks,
    seq: u64,
    kind: EventKind,
}

/// The discrete-event driver: a min-ordered set of pending timers keyed by
/// absolute fire time, with idempotent cancellation.
///
/// Heap entries are never removed eagerly. Cancelling drops the slotmap
/// slot, and rescheduling bumps the slot's sequence number; `pop` validates
/// each heap entry against the live slot, so a cancelled or superseded
/// entry can never fire. Slotmap key versioning guarantees a reused slot
/// cannot be confused with the timer that previously occupied it.
///
/// Events scheduled for the same tick dispatch in schedule order
/// (ascending sequence number).
#[derive(Debug, Default)]
pub struct Timeline {
    slots: SlotMap<TimerId, TimerSlot>,
    heap: BinaryHeap<Reverse<(Ticks, u64, TimerId)>>,
    now: Ticks,
    next_seq: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Ticks {
        self.now
    }

    pub fn schedule(&mut self, fire_at: Ticks, kind: EventKind) -> TimerId {
        assert!(
            fire_at >= self.now,
            "scheduling into the past: fire_at={fire_at}, now={}",
            self.now
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = self.slots.insert(TimerSlot { fire_at, seq, kind });
        self.heap.push(Reverse((fire_at, seq, id)));
        id
    }

    /// Cancels a pending timer. A no-op on timers that already fired or
    /// were already cancelled; returns whether anything was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.slots.remove(id).is_some()
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.slots.contains_key(id)
    }

    pub fn fire_time(&self, id: TimerId) -> Option<Ticks> {
        self.slots.get(id).map(|slot| slot.fire_at)
    }

    /// Pushes a pending timer's fire time back by `delta`, keeping its
    /// identity. Returns false if the timer is no longer pending.
    pub fn postpone(&mut self, id: TimerId, delta: Ticks) -> bool {
        let seq = self.next_seq;
        match self.slots.get_mut(id) {
            Some(slot) => {
                self.next_seq += 1;
                slot.fire_at += delta;
                slot.seq = seq;
                self.heap.push(Reverse((slot.fire_at, seq, id)));
                true
            }
            None => false,
        }
    }

    /// Earliest pending fire time, discarding stale heap entries.
    pub fn peek(&mut self) -> Option<Ticks> {
        while let Some(&Reverse((fire_at, seq, id))) = self.heap.peek() {
            match self.slots.get(id) {
                Some(slot) if slot.seq == seq => return Some(fire_at),
                _ => {
                    self.heap.pop();
                }
            }
        }
        None
    }

    /// Pops the earliest pending event and advances the clock to it.
    pub fn pop(&mut self) -> Option<(Ticks, EventKind)> {
        while let Some(Reverse((fire_at, seq, id))) = self.heap.pop() {
            let live = matches!(self.slots.get(id), Some(slot) if slot.seq == seq);
            if !live {
                continue;
            }
            let slot = self.slots.remove(id).expect("validated slot vanished");
            debug_assert!(fire_at >= self.now, "timeline clock ran backwards");
            self.now = fire_at;
            return Some((fire_at, slot.kind));
        }
        None
    }

    /// Advances the clock without dispatching. The caller must have drained
    /// every event up to `to` first.
    pub fn fast_forward(&mut self, to: Ticks) {
        assert!(to >= self.now, "timeline clock ran backwards");
        debug_assert!(
            self.peek().is_none_or(|at| at >= to),
            "fast-forward past a pending event"
        );
        self.now = to;
    }
}
