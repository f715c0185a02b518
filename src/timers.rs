//! PS1 timers: three 16-bit free-running counters, plus the vblank and
//! display-mode bookkeeping the GPU drives timer scheduling from.
//!
//! This is a simplified, non-cycle-accurate model: each timer is scheduled
//! to fire an IRQ `target` (or `0xFFFF` if no target is set) ticks after it
//! was last written, rather than being polled every cycle against a live
//! clock source. Clock-source selection (system clock / dot clock / hblank)
//! and the full IRQ-on-target/IRQ-on-overflow/repeat/pulse/one-shot mode bits
//! are not modeled.

use crate::event_manager::EventHandle;
use crate::event_manager::EventManager;
use bincode::{Decode, Encode};

const TIMER_COUNT: usize = 3;

// Rough NTSC field rate: 33,868,800 Hz CPU clock / ~60 Hz vblank rate.
const VBLANK_CYCLES: i64 = 33_868_800 / 60;

// TODO account for clock source (dot clock / hblank) instead of assuming the
// system clock for every timer
const TIMER_BASE_CYCLES: i64 = 2;

#[derive(Debug, Clone, Copy, Default, Encode, Decode)]
pub struct Timer {
    pub counter: u16,
    pub mode: u16,
    pub target: u16,
}

impl Timer {
    fn write_mode(&mut self, value: u32) {
        self.mode = value as u16;
        self.counter = 0;
    }

    pub fn increment(&mut self) {
        self.counter = self.counter.wrapping_add(1);
    }
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct Timers {
    timers: [Timer; TIMER_COUNT],
    vblank_event: Option<EventHandle>,
    timer_events: [Option<EventHandle>; TIMER_COUNT],
}

impl Timers {
    pub fn new() -> Self {
        Self {
            timers: [Timer::default(); TIMER_COUNT],
            vblank_event: None,
            timer_events: [None; TIMER_COUNT],
        }
    }

    /// Registers this module's events with the event manager. Must be called
    /// once during emulator construction, before any `schedule_next_*` call.
    pub fn init_events(&mut self, event_manager: &mut EventManager) {
        self.vblank_event = Some(event_manager.create_event("vblank"));
        for (i, slot) in self.timer_events.iter_mut().enumerate() {
            *slot = Some(event_manager.create_event(format!("timer{i}_irq")));
        }
    }

    pub fn vblank_event(&self) -> EventHandle {
        self.vblank_event.expect("Timers::init_events was not called")
    }

    pub fn timer_event(&self, idx: usize) -> EventHandle {
        self.timer_events[idx].expect("Timers::init_events was not called")
    }

    pub fn schedule_next_vblank(&mut self, event_manager: &mut EventManager) {
        event_manager.schedule(self.vblank_event(), VBLANK_CYCLES);
    }

    pub fn schedule_next_timer_0_irq(&mut self, event_manager: &mut EventManager) {
        self.schedule_next_timer_irq(0, event_manager);
    }

    pub fn schedule_next_timer_1_irq(&mut self, event_manager: &mut EventManager) {
        self.schedule_next_timer_irq(1, event_manager);
    }

    pub fn schedule_next_timer_2_irq(&mut self, event_manager: &mut EventManager) {
        self.schedule_next_timer_irq(2, event_manager);
    }

    fn schedule_next_timer_irq(&mut self, idx: usize, event_manager: &mut EventManager) {
        let timer = &self.timers[idx];
        let ticks = if timer.target != 0 { u32::from(timer.target) } else { u32::from(u16::MAX) };
        let cycles = i64::from(ticks) * TIMER_BASE_CYCLES;
        event_manager.schedule(self.timer_event(idx), cycles.max(1));
    }

    /// Called by the GPU when the vertical display area changes. Timing is
    /// not yet adjusted for the new display area.
    pub fn update_v_display_area(&mut self, y1: u16, y2: u16, _event_manager: &mut EventManager) {
        log::debug!("Vertical display area updated: {y1}-{y2}");
    }

    /// Called by the GPU when the display mode changes. Timing is not yet
    /// adjusted for the new dot clock divider.
    pub fn update_display_mode(
        &mut self,
        dot_clock_divider: u32,
        interlaced: bool,
        _event_manager: &mut EventManager,
    ) {
        log::debug!(
            "Display mode updated: dot_clock_divider={dot_clock_divider} interlaced={interlaced}"
        );
    }

    pub fn read_register(&self, address: u32) -> u32 {
        let timer_idx = ((address >> 4) & 3) as usize;
        if timer_idx >= TIMER_COUNT {
            log::warn!("Unhandled timer {timer_idx} read: {address:08X}");
            return 0;
        }

        let timer = &self.timers[timer_idx];
        match address & 0xF {
            0x0 => timer.counter.into(),
            0x4 => timer.mode.into(),
            0x8 => timer.target.into(),
            _ => {
                log::warn!("Unhandled timer register read: {address:08X}");
                0
            }
        }
    }

    pub fn write_register(&mut self, address: u32, value: u32, event_manager: &mut EventManager) {
        let timer_idx = ((address >> 4) & 3) as usize;
        if timer_idx >= TIMER_COUNT {
            log::warn!("Unhandled timer {timer_idx} write: {address:08X} {value:08X}");
            return;
        }

        match address & 0xF {
            0x0 => {
                self.timers[timer_idx].counter = value as u16;
                log::trace!("Timer {timer_idx} counter write: {:04X}", self.timers[timer_idx].counter);
            }
            0x4 => {
                self.timers[timer_idx].write_mode(value);
                log::trace!("Timer {timer_idx} mode write: {value:08X}");
            }
            0x8 => {
                self.timers[timer_idx].target = value as u16;
                log::trace!("Timer {timer_idx} target write: {:04X}", self.timers[timer_idx].target);
            }
            _ => {
                log::warn!("Unhandled timer register write: {address:08X} {value:08X}");
                return;
            }
        }

        self.schedule_next_timer_irq(timer_idx, event_manager);
    }
}

impl Default for Timers {
    fn default() -> Self {
        Self::new()
    }
}
