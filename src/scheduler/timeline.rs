//! Delayed-event queue driven by an externally supplied clock.
//!
//! Nothing here sleeps: callers advance the timeline with [`Timeline::pop_due`]
//! and get back every event whose due instant has passed, oldest first.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, TimeDelta};

/// Identifies one pending one-shot event so it can be revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventHandle {
    due: NaiveDateTime,
    seq: u64,
}

impl EventHandle {
    pub fn due(&self) -> NaiveDateTime {
        self.due
    }
}

#[derive(Debug)]
struct Periodic<E> {
    seq: u64,
    every: TimeDelta,
    next_due: NaiveDateTime,
    event: E,
}

#[derive(Debug)]
pub struct Timeline<E> {
    queue: BTreeMap<EventHandle, E>,
    periodic: Vec<Periodic<E>>,
    next_seq: u64,
}

impl<E> Default for Timeline<E> {
    fn default() -> Self {
        Self {
            queue: BTreeMap::new(),
            periodic: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<E: Clone> Timeline<E> {
    pub fn new() -> Self {
        Self::default()
    }

    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Schedule a one-shot event. A `due` in the past is kept as-is and
    /// comes out of the next [`pop_due`](Self::pop_due).
    pub fn enter(&mut self, due: NaiveDateTime, event: E) -> EventHandle {
        let handle = EventHandle {
            due,
            seq: self.seq(),
        };
        self.queue.insert(handle, event);
        handle
    }

    /// Register a repeating event, first due at `first_due`. Missed runs
    /// are coalesced: one emission per `pop_due`, then the next slot after
    /// `now` on the registered cadence.
    pub fn every(&mut self, first_due: NaiveDateTime, every: TimeDelta, event: E) {
        let seq = self.seq();
        self.periodic.push(Periodic {
            seq,
            every,
            next_due: first_due,
            event,
        });
    }

    /// Revoke a pending event. Returns false if it already ran or was revoked.
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        self.queue.remove(&handle).is_some()
    }

    #[cfg(test)]
    fn is_pending(&self, handle: EventHandle) -> bool {
        self.queue.contains_key(&handle)
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Remove and return every event due at or before `now`, in due order.
    pub fn pop_due(&mut self, now: NaiveDateTime) -> Vec<E> {
        let mut due: Vec<(NaiveDateTime, u64, E)> = Vec::new();

        while let Some(entry) = self.queue.first_entry() {
            if entry.key().due > now {
                break;
            }
            let (handle, event) = entry.remove_entry();
            due.push((handle.due, handle.seq, event));
        }

        for task in &mut self.periodic {
            if task.next_due > now {
                continue;
            }
            due.push((task.next_due, task.seq, task.event.clone()));
            while task.next_due <= now {
                task.next_due += task.every;
            }
        }

        due.sort_by_key(|(at, seq, _)| (*at, *seq));
        due.into_iter().map(|(_, _, event)| event).collect()
    }
}
