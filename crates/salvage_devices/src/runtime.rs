//! # Recycler Runtime
//!
//! Facade the host talks to. Owns the engine, speed policy, scheduler and
//! registry, and routes host events to the right controller:
//!
//! | Host event | Call |
//! |------------|------|
//! | player toggles a recycler | [`RecyclerRuntime::toggle`] |
//! | host wants a recycler off | [`RecyclerRuntime::force_stop`] |
//! | host recycles one slot itself | [`RecyclerRuntime::process_item`] |
//! | recycler destroyed | [`RecyclerRuntime::on_device_destroyed`] |
//! | simulation tick | [`RecyclerRuntime::tick`] |
//! | shutdown | [`RecyclerRuntime::unload_all`] |
//! | configuration reloaded | [`RecyclerRuntime::reload`] |

use std::sync::Arc;

use salvage_economy::{
    Actor, ConversionEngine, ConversionOutcome, DeviceId, HookRegistry, ItemCatalog,
    ProbabilisticRounder, RecyclerDevice, RecyclerSettings,
};

use crate::controller::{Activity, ControllerContext, StopReason};
use crate::registry::{DeviceHost, DeviceRegistry};
use crate::scheduler::TickScheduler;
use crate::speed::SpeedPolicy;

/// Everything the recycler feature needs at runtime.
#[derive(Debug)]
pub struct RecyclerRuntime {
    engine: ConversionEngine,
    speed: SpeedPolicy,
    scheduler: TickScheduler,
    registry: DeviceRegistry,
}

impl RecyclerRuntime {
    /// Builds a runtime from loaded settings.
    ///
    /// The rounder uses the configured seed, or the clock if none is set.
    #[must_use]
    pub fn new(catalog: Arc<ItemCatalog>, settings: &RecyclerSettings) -> Self {
        let config = settings.config();
        let rounder = config
            .rng_seed
            .map_or_else(ProbabilisticRounder::from_clock, ProbabilisticRounder::new);
        let speed = SpeedPolicy::from_config(&config.speed, &catalog);
        let engine = ConversionEngine::new(
            catalog,
            settings.tables().clone(),
            HookRegistry::new(),
            rounder,
        );
        Self::with_parts(engine, speed)
    }

    /// Builds a runtime from an engine and speed policy.
    #[must_use]
    pub fn with_parts(engine: ConversionEngine, speed: SpeedPolicy) -> Self {
        Self {
            engine,
            speed,
            scheduler: TickScheduler::new(),
            registry: DeviceRegistry::new(),
        }
    }

    /// The conversion engine.
    #[must_use]
    pub const fn engine(&self) -> &ConversionEngine {
        &self.engine
    }

    /// Mutable engine access, e.g. for registering hooks.
    pub fn engine_mut(&mut self) -> &mut ConversionEngine {
        &mut self.engine
    }

    /// The speed policy.
    #[must_use]
    pub const fn speed(&self) -> &SpeedPolicy {
        &self.speed
    }

    /// The callback queue.
    #[must_use]
    pub const fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// The controller registry.
    #[must_use]
    pub const fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Activity of a device; `Idle` if it has no controller.
    #[must_use]
    pub fn activity(&self, id: DeviceId) -> Activity {
        self.registry
            .get(id)
            .map_or(Activity::Idle, |controller| controller.activity())
    }

    /// Returns true if the device is running.
    #[must_use]
    pub fn is_running(&self, id: DeviceId) -> bool {
        self.activity(id) == Activity::Running
    }

    /// Returns true if any input slot holds a processable stack.
    #[must_use]
    pub fn has_processable(&self, device: &dyn RecyclerDevice) -> bool {
        self.engine.has_processable(device)
    }

    /// Handles a toggle request, creating the controller on first use.
    pub fn toggle(&mut self, device: &mut dyn RecyclerDevice, actor: Option<&dyn Actor>) -> Activity {
        let controller = self.registry.get_or_create(device.id());
        let mut ctx = ControllerContext {
            engine: &mut self.engine,
            speed: &self.speed,
            scheduler: &mut self.scheduler,
        };
        controller.toggle(&mut ctx, device, actor)
    }

    /// Switches a device off, creating the controller on first use.
    ///
    /// Returns true if it was running.
    pub fn force_stop(&mut self, device: &mut dyn RecyclerDevice) -> bool {
        let controller = self.registry.get_or_create(device.id());
        let was_running = controller.is_running();
        controller.stop(&mut self.scheduler, Some(device), StopReason::Forced);
        was_running
    }

    /// Recycles one slot on the host's behalf.
    ///
    /// A saturated output stops a running device.
    pub fn process_item(&mut self, device: &mut dyn RecyclerDevice, slot: usize) -> ConversionOutcome {
        let outcome = self.engine.process_slot(device, slot);
        if outcome.saturated {
            if let Some(controller) = self.registry.get_mut(device.id()) {
                if controller.is_running() {
                    controller.stop(&mut self.scheduler, Some(device), StopReason::Saturated);
                }
            }
        }
        outcome
    }

    /// Tears down a destroyed device's controller.
    ///
    /// Safe to call repeatedly and from inside host destruction callbacks.
    /// Returns true if a controller was removed.
    pub fn on_device_destroyed(&mut self, id: DeviceId) -> bool {
        match self.registry.remove(id) {
            Some(mut controller) => {
                controller.teardown(&mut self.scheduler);
                tracing::debug!("Recycler {} destroyed, controller removed", id);
                true
            }
            None => false,
        }
    }

    /// Advances the clock by `dt_secs` and dispatches due callbacks.
    ///
    /// Callbacks for devices the host no longer knows tear their controller
    /// down. Returns the number of callbacks dispatched.
    pub fn tick(&mut self, dt_secs: f32, host: &mut dyn DeviceHost) -> usize {
        self.scheduler.advance(dt_secs);
        let mut dispatched = 0;

        while let Some(event) = self.scheduler.next_due() {
            dispatched += 1;
            let Some(device) = host.device_mut(event.device) else {
                self.scheduler.cancel(event.handle);
                self.on_device_destroyed(event.device);
                continue;
            };
            let Some(controller) = self.registry.get_mut(event.device) else {
                self.scheduler.cancel(event.handle);
                continue;
            };
            let mut ctx = ControllerContext {
                engine: &mut self.engine,
                speed: &self.speed,
                scheduler: &mut self.scheduler,
            };
            controller.on_timer(&mut ctx, event.handle, device);
        }

        dispatched
    }

    /// Stops and deregisters every device. Returns the number torn down.
    pub fn unload_all(&mut self, host: &mut dyn DeviceHost) -> usize {
        self.registry.unload_all(&mut self.scheduler, host)
    }

    /// Swaps in rebuilt tables and speed policy between ticks.
    ///
    /// Running devices keep their current schedule until they next start.
    pub fn reload(&mut self, settings: &RecyclerSettings) {
        self.engine.replace_tables(settings.tables().clone());
        self.speed = SpeedPolicy::from_config(&settings.config().speed, self.engine.catalog());
        tracing::info!(
            "Recycler configuration reloaded ({} overrides)",
            settings.tables().overrides.len()
        );
    }
}
