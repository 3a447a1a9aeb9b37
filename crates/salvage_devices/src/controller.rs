//! # Device Controller
//!
//! Per-device state machine driving repeated recycle steps.
//!
//! ## States
//!
//! - **Idle**: no callback pending, device switched off.
//! - **Running**: exactly one callback pending, device switched on.
//!
//! ## Transitions
//!
//! ```text
//!            toggle (processable input present)
//!   Idle ───────────────────────────────────────> Running
//!    ^                                               │
//!    │   toggle / forced / saturated / exhausted     │
//!    └───────────────────────────────────────────────┘
//! ```
//!
//! Destruction tears down from either state without touching the device.
//!
//! ## Timing Modes
//!
//! - **Fixed**: one repeating callback at `multiplier * default_interval`.
//! - **Variable**: a single-shot callback per step, rescheduled after each
//!   step from the next item's own recycle time.

use salvage_economy::{
    Actor, ConversionEngine, ConversionOutcome, DeviceEffect, DeviceId, HookResult,
    RecyclerDevice,
};

use crate::scheduler::{TickScheduler, TimerHandle};
use crate::speed::{SpeedPolicy, NEUTRAL_MULTIPLIER};

/// Current device activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Activity {
    /// Not processing.
    #[default]
    Idle,
    /// Processing on a schedule.
    Running,
}

/// Why a device stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Toggled off by an actor.
    Toggled,
    /// Stopped by the host.
    Forced,
    /// The output container rejected a produced stack.
    Saturated,
    /// No processable input remained.
    Exhausted,
    /// The device was destroyed.
    Destroyed,
    /// The runtime was unloaded.
    Unloaded,
}

/// How the current activation is timed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeedMode {
    /// One repeating interval for the whole device.
    Fixed,
    /// One single-shot interval per item.
    Variable,
}

/// Shared collaborators a controller drives.
pub struct ControllerContext<'a> {
    /// The conversion engine.
    pub engine: &'a mut ConversionEngine,
    /// Interval resolution.
    pub speed: &'a SpeedPolicy,
    /// Callback queue.
    pub scheduler: &'a mut TickScheduler,
}

/// State of one device.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceController {
    device: DeviceId,
    activity: Activity,
    timer: Option<TimerHandle>,
    multiplier: f32,
    mode: SpeedMode,
}

impl DeviceController {
    /// Creates an idle controller.
    #[must_use]
    pub const fn new(device: DeviceId) -> Self {
        Self {
            device,
            activity: Activity::Idle,
            timer: None,
            multiplier: NEUTRAL_MULTIPLIER,
            mode: SpeedMode::Fixed,
        }
    }

    /// The controlled device.
    #[must_use]
    pub const fn device(&self) -> DeviceId {
        self.device
    }

    /// Current activity.
    #[must_use]
    pub const fn activity(&self) -> Activity {
        self.activity
    }

    /// Returns true while running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.activity, Activity::Running)
    }

    /// The pending callback, if any.
    #[must_use]
    pub const fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    /// Speed multiplier of the current activation.
    #[must_use]
    pub const fn multiplier(&self) -> f32 {
        self.multiplier
    }

    /// Timing mode of the current activation.
    #[must_use]
    pub const fn mode(&self) -> SpeedMode {
        self.mode
    }

    /// Handles a toggle request. A toggle hook returning `Deny` suppresses
    /// it. Returns the resulting activity.
    pub fn toggle(
        &mut self,
        ctx: &mut ControllerContext<'_>,
        device: &mut dyn RecyclerDevice,
        actor: Option<&dyn Actor>,
    ) -> Activity {
        if ctx.engine.hooks().query_toggle(self.device, actor) == HookResult::Deny {
            tracing::debug!("Toggle of recycler {} suppressed by hook", self.device);
            return self.activity;
        }

        if self.is_running() {
            self.stop(ctx.scheduler, Some(device), StopReason::Toggled);
        } else {
            self.start(ctx, device, actor);
        }
        self.activity
    }

    /// Starts processing if any input is processable.
    ///
    /// Returns true if the device is running afterwards.
    pub fn start(
        &mut self,
        ctx: &mut ControllerContext<'_>,
        device: &mut dyn RecyclerDevice,
        actor: Option<&dyn Actor>,
    ) -> bool {
        if self.is_running() {
            return true;
        }
        if !ctx.engine.has_processable(device) {
            tracing::debug!("Recycler {} has nothing to process, staying idle", self.device);
            return false;
        }

        for slot in 0..device.input_slot_count() {
            if device.input(slot).is_some_and(|s| !s.is_empty()) {
                device.mark_counted(slot);
            }
        }

        self.multiplier = ctx.speed.resolve_multiplier_for_actor(actor);
        let handle = if ctx.speed.is_variable_speed() {
            self.mode = SpeedMode::Variable;
            let interval = first_stack_interval(ctx.speed, device);
            ctx.scheduler.schedule_once(self.device, self.multiplier * interval)
        } else {
            self.mode = SpeedMode::Fixed;
            let interval = self.multiplier * ctx.speed.default_interval();
            ctx.scheduler.schedule_repeating(self.device, interval)
        };
        self.timer = Some(handle);
        self.activity = Activity::Running;

        device.set_on(true);
        device.emit_effect(DeviceEffect::Started);
        tracing::info!(
            "Recycler {} started ({:?}, multiplier {:.2})",
            self.device,
            self.mode,
            self.multiplier
        );
        true
    }

    /// Stops processing and cancels the pending callback.
    ///
    /// With a device, it is switched off and plays the stop effect.
    pub fn stop(
        &mut self,
        scheduler: &mut TickScheduler,
        device: Option<&mut dyn RecyclerDevice>,
        reason: StopReason,
    ) {
        if let Some(handle) = self.timer.take() {
            scheduler.cancel(handle);
        }
        let was_running = self.is_running();
        self.activity = Activity::Idle;

        if let Some(device) = device {
            if was_running || device.is_on() {
                device.emit_effect(DeviceEffect::Stopped);
            }
            device.set_on(false);
        }

        if was_running {
            tracing::info!("Recycler {} stopped: {:?}", self.device, reason);
        }
    }

    /// Cancels everything without touching the device.
    pub fn teardown(&mut self, scheduler: &mut TickScheduler) {
        self.stop(scheduler, None, StopReason::Destroyed);
    }

    /// Handles a fired callback. Stale handles are ignored.
    ///
    /// Returns the outcome of the processing pass, if one ran.
    pub fn on_timer(
        &mut self,
        ctx: &mut ControllerContext<'_>,
        handle: TimerHandle,
        device: &mut dyn RecyclerDevice,
    ) -> Option<ConversionOutcome> {
        if !self.is_running() || self.timer != Some(handle) {
            tracing::debug!("Ignoring stale timer {:?} for recycler {}", handle, self.device);
            return None;
        }
        if self.mode == SpeedMode::Variable {
            // Single-shot: already consumed by the scheduler.
            self.timer = None;
        }

        let outcome = ctx.engine.process_next(device).map(|(_, outcome)| outcome);

        if outcome.as_ref().is_some_and(|o| o.saturated) {
            self.stop(ctx.scheduler, Some(device), StopReason::Saturated);
            return outcome;
        }

        match self.mode {
            SpeedMode::Fixed => {
                if !ctx.engine.has_processable(device) {
                    self.stop(ctx.scheduler, Some(device), StopReason::Exhausted);
                }
            }
            SpeedMode::Variable => match ctx.engine.next_processable_slot(device) {
                Some(slot) => {
                    let interval = device
                        .input(slot)
                        .map_or(ctx.speed.default_interval(), |s| {
                            ctx.speed.resolve_interval_for_item(s)
                        });
                    let delay = self.multiplier * interval;
                    self.timer = Some(ctx.scheduler.schedule_once(self.device, delay));
                }
                None => self.stop(ctx.scheduler, Some(device), StopReason::Exhausted),
            },
        }

        outcome
    }
}

/// Interval of the first non-empty input slot.
fn first_stack_interval(speed: &SpeedPolicy, device: &dyn RecyclerDevice) -> f32 {
    (0..device.input_slot_count())
        .find_map(|slot| device.input(slot).filter(|s| !s.is_empty()))
        .map_or(speed.default_interval(), |s| speed.resolve_interval_for_item(s))
}
