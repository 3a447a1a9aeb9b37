//! # Cooperative Tick Scheduler
//!
//! Future callbacks for the simulation thread. Nothing blocks: the host
//! calls [`TickScheduler::advance`] once per tick and then drains due
//! events with [`TickScheduler::next_due`].
//!
//! ## Zero Delay
//!
//! A callback scheduled with zero delay while events are being drained
//! fires on the next advance, never in the current one. A zero-interval
//! repeating timer therefore fires once per tick instead of looping.
//!
//! ## Clock
//!
//! Time is kept in whole microseconds so ordering is exact.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use salvage_economy::DeviceId;

/// Microseconds per second.
const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Handle of a scheduled callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// A due callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerEvent {
    /// The timer that fired.
    pub handle: TimerHandle,
    /// The device it belongs to.
    pub device: DeviceId,
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    device: DeviceId,
    /// Repeat period; `None` for single-shot.
    period: Option<u64>,
}

/// Queue entry, ordered by due time then insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    due: u64,
    seq: u64,
    /// First advance round in which this entry may fire.
    round: u64,
    handle: TimerHandle,
}

/// Single-threaded timer queue.
#[derive(Debug, Default)]
pub struct TickScheduler {
    now: u64,
    target: u64,
    round: u64,
    next_handle: u64,
    next_seq: u64,
    queue: BinaryHeap<Reverse<Entry>>,
    deferred: Vec<Entry>,
    timers: HashMap<TimerHandle, Timer>,
}

impl TickScheduler {
    /// Creates an empty scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in seconds.
    #[must_use]
    pub fn now_secs(&self) -> f64 {
        self.now as f64 / MICROS_PER_SECOND
    }

    /// Schedules a single-shot callback after `delay_secs`.
    pub fn schedule_once(&mut self, device: DeviceId, delay_secs: f32) -> TimerHandle {
        self.schedule(device, to_micros(delay_secs), None)
    }

    /// Schedules a callback every `period_secs`, first firing after one period.
    pub fn schedule_repeating(&mut self, device: DeviceId, period_secs: f32) -> TimerHandle {
        let period = to_micros(period_secs);
        self.schedule(device, period, Some(period))
    }

    /// Cancels a callback. Returns false if it was not active.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.timers.remove(&handle).is_some()
    }

    /// Returns true if the callback will still fire.
    #[must_use]
    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle)
    }

    /// Number of active callbacks.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Starts a new tick of `dt_secs`. Drain it with [`Self::next_due`].
    pub fn advance(&mut self, dt_secs: f32) {
        self.restore_deferred();
        self.round += 1;
        self.target = self.now.max(self.target) + to_micros(dt_secs);
    }

    /// Pops the next callback due in the current tick, advancing the clock
    /// to its due time. Returns `None` once the tick is drained.
    pub fn next_due(&mut self) -> Option<TimerEvent> {
        while let Some(&Reverse(entry)) = self.queue.peek() {
            if entry.due > self.target {
                break;
            }
            self.queue.pop();

            let Some(timer) = self.timers.get(&entry.handle).copied() else {
                continue;
            };
            if entry.round > self.round {
                self.deferred.push(entry);
                continue;
            }

            self.now = self.now.max(entry.due);
            match timer.period {
                Some(period) => self.push(entry.handle, period),
                None => {
                    self.timers.remove(&entry.handle);
                }
            }
            return Some(TimerEvent {
                handle: entry.handle,
                device: timer.device,
            });
        }

        self.now = self.now.max(self.target);
        self.restore_deferred();
        None
    }

    fn schedule(&mut self, device: DeviceId, delay: u64, period: Option<u64>) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.timers.insert(handle, Timer { device, period });
        self.push(handle, delay);
        handle
    }

    fn push(&mut self, handle: TimerHandle, delay: u64) {
        let round = if delay == 0 { self.round + 1 } else { self.round };
        let entry = Entry {
            due: self.now + delay,
            seq: self.next_seq,
            round,
            handle,
        };
        self.next_seq += 1;
        self.queue.push(Reverse(entry));
    }

    fn restore_deferred(&mut self) {
        self.queue.extend(self.deferred.drain(..).map(Reverse));
    }
}

fn to_micros(secs: f32) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (f64::from(secs) * MICROS_PER_SECOND).round() as u64
}
