//! Cycle-driven event scheduler shared by every peripheral.
//!
//! A flat vector of event slots scanned linearly for the next due event. The
//! set of events is small (on the order of a dozen: CRT scanline/hblank,
//! three timer IRQs, the SPU/CD-ROM sample clock, the MDEC output-block
//! timer, the controller-port transfer timer) so a min-heap is unnecessary
//! complexity; see the design note in the component specification.
//!
//! Unlike a callback-based scheduler, `EventManager` does not own the
//! peripheral state an event's handler would need to mutate (every
//! peripheral already lives behind its own `&mut` inside the top-level
//! container). Instead of a boxed closure per event, `update_next_event`
//! returns which event fired and how many cycles it accumulated; the caller
//! (the top-level tick loop) matches on the handle and invokes the
//! corresponding peripheral method. This is the ownership-safe equivalent of
//! the "owner callback" the original hardware model describes.

use bincode::{Decode, Encode};

pub type Cycles = i64;

/// Sentinel deadline for an event that has no pending schedule.
pub const INFINITE_CYCLES: Cycles = Cycles::MAX / 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct EventHandle(usize);

#[derive(Debug, Clone, Encode, Decode)]
struct EventSlot {
    name: String,
    cycles_until_event: Cycles,
    pending_cycles: Cycles,
    active: bool,
}

impl EventSlot {
    fn new(name: String) -> Self {
        Self { name, cycles_until_event: INFINITE_CYCLES, pending_cycles: 0, active: false }
    }
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct EventManager {
    events: Vec<EventSlot>,
    next_event: Option<usize>,
    cycles_until_next_event: Cycles,
    pending_cycles: Cycles,
}

impl EventManager {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_event: None,
            cycles_until_next_event: INFINITE_CYCLES,
            pending_cycles: 0,
        }
    }

    /// Registers a new event and returns a handle to it. Intended to be
    /// called once per peripheral event during construction/wiring, not
    /// during normal operation.
    pub fn create_event(&mut self, name: impl Into<String>) -> EventHandle {
        let index = self.events.len();
        self.events.push(EventSlot::new(name.into()));
        EventHandle(index)
    }

    /// Adds elapsed cycles to the pending counter. Does not itself dispatch;
    /// call `ready_for_next_event`/`update_next_event` afterwards.
    pub fn add_cycles(&mut self, cycles: Cycles) {
        assert!(cycles > 0, "add_cycles requires a positive cycle count");
        self.pending_cycles += cycles;
    }

    pub fn ready_for_next_event(&self) -> bool {
        self.pending_cycles >= self.cycles_until_next_event
    }

    /// Schedules `handle` to fire `cycles_from_now` cycles from now.
    pub fn schedule(&mut self, handle: EventHandle, cycles_from_now: Cycles) {
        let slot = &mut self.events[handle.0];
        slot.cycles_until_event = cycles_from_now;
        slot.pending_cycles = 0;
        slot.active = true;

        self.rescan_next_event();
    }

    pub fn cancel(&mut self, handle: EventHandle) {
        let slot = &mut self.events[handle.0];
        slot.active = false;
        slot.pending_cycles = 0;

        self.rescan_next_event();
    }

    pub fn is_active(&self, handle: EventHandle) -> bool {
        self.events[handle.0].active
    }

    /// Forces immediate dispatch of `handle`, returning the cycles it had
    /// accumulated (including any not-yet-distributed manager-level pending
    /// cycles). Used when a register read/write would otherwise race with a
    /// scheduled event.
    pub fn update_early(&mut self, handle: EventHandle) -> Cycles {
        self.distribute_pending();

        let slot = &mut self.events[handle.0];
        let elapsed = slot.pending_cycles;
        slot.pending_cycles = 0;
        if slot.active {
            slot.cycles_until_event -= elapsed;
        }

        self.rescan_next_event();

        elapsed
    }

    pub fn remaining_cycles(&self, handle: EventHandle) -> Cycles {
        let slot = &self.events[handle.0];
        slot.cycles_until_event - slot.pending_cycles
    }

    /// Distributes the manager's accumulated pending cycles to every active
    /// event, then dispatches the single soonest-due one, returning its
    /// handle and the cycle count it accumulated since its last dispatch.
    /// Returns `None` if no event is currently due.
    pub fn update_next_event(&mut self) -> Option<(EventHandle, Cycles)> {
        if !self.ready_for_next_event() {
            return None;
        }

        self.distribute_pending();

        let index = self.next_event?;
        let slot = &mut self.events[index];
        let elapsed = slot.pending_cycles;
        slot.pending_cycles = 0;
        slot.active = false;

        self.rescan_next_event();

        Some((EventHandle(index), elapsed))
    }

    fn distribute_pending(&mut self) {
        let pending = self.pending_cycles;
        self.pending_cycles = 0;

        for slot in &mut self.events {
            if slot.active {
                slot.pending_cycles += pending;
            }
        }
    }

    fn rescan_next_event(&mut self) {
        let mut best: Option<(usize, Cycles)> = None;
        for (i, slot) in self.events.iter().enumerate() {
            if !slot.active {
                continue;
            }
            let remaining = slot.cycles_until_event - slot.pending_cycles;
            if best.is_none_or(|(_, best_remaining)| remaining < best_remaining) {
                best = Some((i, remaining));
            }
        }

        match best {
            Some((index, remaining)) => {
                self.next_event = Some(index);
                self.cycles_until_next_event = remaining;
            }
            None => {
                self.next_event = None;
                self.cycles_until_next_event = INFINITE_CYCLES;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_soonest_event_first() {
        let mut manager = EventManager::new();
        let a = manager.create_event("a");
        let b = manager.create_event("b");

        manager.schedule(a, 100);
        manager.schedule(b, 50);

        manager.add_cycles(50);
        assert!(manager.ready_for_next_event());

        let (handle, elapsed) = manager.update_next_event().unwrap();
        assert_eq!(handle, b);
        assert_eq!(elapsed, 50);
        assert!(!manager.is_active(b));
        assert!(manager.is_active(a));
    }

    #[test]
    fn cancel_removes_event_from_scheduling() {
        let mut manager = EventManager::new();
        let a = manager.create_event("a");
        manager.schedule(a, 10);
        manager.cancel(a);

        manager.add_cycles(1000);
        assert!(!manager.ready_for_next_event());
    }

    #[test]
    fn update_early_collects_partial_progress() {
        let mut manager = EventManager::new();
        let a = manager.create_event("a");
        manager.schedule(a, 1000);

        manager.add_cycles(30);
        let elapsed = manager.update_early(a);
        assert_eq!(elapsed, 30);
        assert_eq!(manager.remaining_cycles(a), 970);
    }
}
