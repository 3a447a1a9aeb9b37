//! # Device Registry
//!
//! Owns one [`DeviceController`] per device handle. Controllers are created
//! on demand and removed when the device goes away.

use std::collections::HashMap;

use salvage_economy::{DeviceId, RecyclerDevice, SimDevice};

use crate::controller::{DeviceController, StopReason};
use crate::scheduler::TickScheduler;

/// Host lookup from device handle to live device.
pub trait DeviceHost {
    /// The device for a handle, or `None` if it no longer exists.
    fn device_mut(&mut self, id: DeviceId) -> Option<&mut dyn RecyclerDevice>;
}

impl DeviceHost for HashMap<DeviceId, SimDevice> {
    fn device_mut(&mut self, id: DeviceId) -> Option<&mut dyn RecyclerDevice> {
        self.get_mut(&id).map(|device| device as &mut dyn RecyclerDevice)
    }
}

/// Map of active controllers.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    controllers: HashMap<DeviceId, DeviceController>,
}

impl DeviceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The controller for a device, creating an idle one if absent.
    pub fn get_or_create(&mut self, id: DeviceId) -> &mut DeviceController {
        self.controllers
            .entry(id)
            .or_insert_with(|| DeviceController::new(id))
    }

    /// The controller for a device.
    #[must_use]
    pub fn get(&self, id: DeviceId) -> Option<&DeviceController> {
        self.controllers.get(&id)
    }

    /// Mutable controller for a device.
    pub fn get_mut(&mut self, id: DeviceId) -> Option<&mut DeviceController> {
        self.controllers.get_mut(&id)
    }

    /// Deregisters a device. Removing an absent device is a no-op.
    pub fn remove(&mut self, id: DeviceId) -> Option<DeviceController> {
        self.controllers.remove(&id)
    }

    /// Returns true if the device has a controller.
    #[must_use]
    pub fn contains(&self, id: DeviceId) -> bool {
        self.controllers.contains_key(&id)
    }

    /// Number of controllers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Returns true if no controllers exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Snapshot of registered handles, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<DeviceId> {
        let mut ids: Vec<DeviceId> = self.controllers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Stops and deregisters every controller.
    ///
    /// Iterates a snapshot of handles, so controllers already removed by a
    /// callback along the way are skipped. Returns the number torn down.
    pub fn unload_all(&mut self, scheduler: &mut TickScheduler, host: &mut dyn DeviceHost) -> usize {
        let mut unloaded = 0;
        for id in self.ids() {
            let Some(mut controller) = self.remove(id) else {
                continue;
            };
            controller.stop(scheduler, host.device_mut(id), StopReason::Unloaded);
            unloaded += 1;
        }
        if unloaded > 0 {
            tracing::info!("Unloaded {} recycler controllers", unloaded);
        }
        unloaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salvage_economy::DeviceEffect;

    #[test]
    fn test_get_or_create_is_lazy_and_stable() {
        let mut registry = DeviceRegistry::new();
        assert!(!registry.contains(9));

        registry.get_or_create(9);
        registry.get_or_create(9);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(9).map(DeviceController::device), Some(9));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = DeviceRegistry::new();
        registry.get_or_create(1);
        assert!(registry.remove(1).is_some());
        assert!(registry.remove(1).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unload_all_switches_off_and_deregisters() {
        let mut registry = DeviceRegistry::new();
        let mut scheduler = TickScheduler::new();
        let mut host: HashMap<DeviceId, SimDevice> = HashMap::new();

        for id in [3, 1, 2] {
            let mut device = SimDevice::new(id);
            device.set_on(true);
            host.insert(id, device);
            registry.get_or_create(id);
        }

        assert_eq!(registry.unload_all(&mut scheduler, &mut host), 3);
        assert!(registry.is_empty());
        assert!(host.values().all(|d| !d.is_on()));
        assert_eq!(host[&2].effects(), &[DeviceEffect::Stopped]);
        assert_eq!(registry.unload_all(&mut scheduler, &mut host), 0);
    }
}
