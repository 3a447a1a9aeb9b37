//! # Host Capabilities
//!
//! The engine never sees host entity types. A recycler is reached through
//! narrow traits: [`InputSource`] for the bounded input slots,
//! [`OutputSink`] for placing produced stacks, and [`RecyclerDevice`] for
//! the on/off flag, efficiency scalar and effects. Players and other
//! toggling entities are reached through [`Actor`].
//!
//! [`SimDevice`] is an in-memory implementation for hosts without their own
//! containers, and for tests.

use std::collections::HashSet;

use crate::container::{SlotContainer, RECYCLER_INPUT_SLOTS, RECYCLER_OUTPUT_SLOTS};
use crate::item::ItemStack;

/// Opaque handle of a host conversion entity.
pub type DeviceId = u64;

/// Recycle efficiency of a stock recycler.
pub const DEFAULT_EFFICIENCY: f32 = 0.5;

/// Audio/visual signals a device emits on activity changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceEffect {
    /// The device switched on.
    Started,
    /// The device switched off.
    Stopped,
}

/// Bounded input slots, scanned in fixed order.
pub trait InputSource {
    /// Number of input slots.
    fn input_slot_count(&self) -> usize;

    /// The stack in an input slot, if any.
    fn input(&self, slot: usize) -> Option<&ItemStack>;

    /// Removes up to `amount` items from a slot and returns what was taken.
    fn take_input(&mut self, slot: usize, amount: u32) -> Option<ItemStack>;

    /// Marks a slot's stack as counted for external bookkeeping.
    fn mark_counted(&mut self, _slot: usize) {}
}

/// Destination for produced stacks.
pub trait OutputSink {
    /// Places a stack no larger than `max_stack`; returns false if it did not fit.
    fn place_output(&mut self, stack: ItemStack, max_stack: u32) -> bool;
}

/// A host conversion entity.
pub trait RecyclerDevice: InputSource + OutputSink {
    /// The device handle.
    fn id(&self) -> DeviceId;

    /// Efficiency scalar in `[0, 1]`.
    fn efficiency(&self) -> f32;

    /// Whether the device is switched on.
    fn is_on(&self) -> bool;

    /// Switches the device on or off.
    fn set_on(&mut self, on: bool);

    /// Plays an effect.
    fn emit_effect(&mut self, effect: DeviceEffect);
}

/// An entity that may toggle a device and hold permissions.
pub trait Actor {
    /// Returns true if the actor holds the permission.
    fn has_permission(&self, permission: &str) -> bool;
}

/// A fixed set of granted permissions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionSet {
    granted: HashSet<String>,
}

impl PermissionSet {
    /// Creates an empty permission set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants a permission.
    #[must_use]
    pub fn grant(mut self, permission: impl Into<String>) -> Self {
        self.granted.insert(permission.into());
        self
    }
}

impl Actor for PermissionSet {
    fn has_permission(&self, permission: &str) -> bool {
        self.granted.contains(permission)
    }
}

/// In-memory recycler.
#[derive(Clone, Debug)]
pub struct SimDevice {
    id: DeviceId,
    /// Input slots.
    pub input: SlotContainer,
    /// Output slots.
    pub output: SlotContainer,
    /// Efficiency scalar.
    pub efficiency: f32,
    on: bool,
    effects: Vec<DeviceEffect>,
    counted: Vec<usize>,
}

impl SimDevice {
    /// Creates a stock recycler with empty containers.
    #[must_use]
    pub fn new(id: DeviceId) -> Self {
        Self {
            id,
            input: SlotContainer::new(RECYCLER_INPUT_SLOTS),
            output: SlotContainer::new(RECYCLER_OUTPUT_SLOTS),
            efficiency: DEFAULT_EFFICIENCY,
            on: false,
            effects: Vec::new(),
            counted: Vec::new(),
        }
    }

    /// Sets the efficiency scalar, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_efficiency(mut self, efficiency: f32) -> Self {
        self.efficiency = efficiency.clamp(0.0, 1.0);
        self
    }

    /// Replaces the output container with one of `slots` slots.
    #[must_use]
    pub fn with_output_slots(mut self, slots: usize) -> Self {
        self.output = SlotContainer::new(slots);
        self
    }

    /// Puts a stack into an input slot.
    pub fn load(&mut self, slot: usize, stack: ItemStack) {
        self.input.set(slot, Some(stack));
    }

    /// Effects emitted so far, oldest first.
    #[must_use]
    pub fn effects(&self) -> &[DeviceEffect] {
        &self.effects
    }

    /// Slots marked as counted so far.
    #[must_use]
    pub fn counted_slots(&self) -> &[usize] {
        &self.counted
    }
}

impl InputSource for SimDevice {
    fn input_slot_count(&self) -> usize {
        self.input.capacity()
    }

    fn input(&self, slot: usize) -> Option<&ItemStack> {
        self.input.get(slot)
    }

    fn take_input(&mut self, slot: usize, amount: u32) -> Option<ItemStack> {
        self.input.take(slot, amount)
    }

    fn mark_counted(&mut self, slot: usize) {
        self.counted.push(slot);
    }
}

impl OutputSink for SimDevice {
    fn place_output(&mut self, stack: ItemStack, max_stack: u32) -> bool {
        self.output.insert(stack, max_stack).is_ok()
    }
}

impl RecyclerDevice for SimDevice {
    fn id(&self) -> DeviceId {
        self.id
    }

    fn efficiency(&self) -> f32 {
        self.efficiency
    }

    fn is_on(&self) -> bool {
        self.on
    }

    fn set_on(&mut self, on: bool) {
        self.on = on;
    }

    fn emit_effect(&mut self, effect: DeviceEffect) {
        self.effects.push(effect);
    }
}
