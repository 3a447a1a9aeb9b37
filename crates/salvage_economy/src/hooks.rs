//! # External Policy Hooks
//!
//! Other modules influence recycling by registering callbacks. Each hook
//! point keeps an ordered list; the first callback with an opinion wins
//! and [`HookResult::NoOpinion`] defers to the next one, and finally to
//! the engine's own policy.

use crate::device::{Actor, DeviceId};
use crate::item::ItemStack;

/// Tri-state answer from a policy hook.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HookResult {
    /// Force the affirmative outcome.
    Allow,
    /// Force the negative outcome.
    Deny,
    /// Defer to default policy.
    #[default]
    NoOpinion,
}

impl HookResult {
    /// Returns true unless this is `NoOpinion`.
    #[inline]
    #[must_use]
    pub const fn has_opinion(self) -> bool {
        !matches!(self, Self::NoOpinion)
    }
}

type RecyclableHook = Box<dyn Fn(&ItemStack) -> HookResult>;
type ToggleHook = Box<dyn Fn(DeviceId, Option<&dyn Actor>) -> HookResult>;
type ItemRecycleHook = Box<dyn Fn(&ItemStack, DeviceId) -> HookResult>;
type ConsumptionHook = Box<dyn Fn(&ItemStack, DeviceId, u32) -> Option<i64>>;

/// Ordered hook callbacks per hook point.
#[derive(Default)]
pub struct HookRegistry {
    recyclable: Vec<RecyclableHook>,
    toggle: Vec<ToggleHook>,
    item_recycle: Vec<ItemRecycleHook>,
    consumption: Vec<ConsumptionHook>,
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("recyclable", &self.recyclable.len())
            .field("toggle", &self.toggle.len())
            .field("item_recycle", &self.item_recycle.len())
            .field("consumption", &self.consumption.len())
            .finish()
    }
}

impl HookRegistry {
    /// Creates a registry with no hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a recyclability query: force-allow or force-deny an item.
    pub fn on_recyclable(&mut self, hook: impl Fn(&ItemStack) -> HookResult + 'static) {
        self.recyclable.push(Box::new(hook));
    }

    /// Registers a toggle query: permit or suppress switching a device.
    pub fn on_toggle(
        &mut self,
        hook: impl Fn(DeviceId, Option<&dyn Actor>) -> HookResult + 'static,
    ) {
        self.toggle.push(Box::new(hook));
    }

    /// Registers a per-item veto, consulted before the engine acts.
    pub fn on_item_recycle(&mut self, hook: impl Fn(&ItemStack, DeviceId) -> HookResult + 'static) {
        self.item_recycle.push(Box::new(hook));
    }

    /// Registers a consumption override. Receives the computed amount and
    /// returns a replacement, or `None` to keep it.
    pub fn on_consumption(
        &mut self,
        hook: impl Fn(&ItemStack, DeviceId, u32) -> Option<i64> + 'static,
    ) {
        self.consumption.push(Box::new(hook));
    }

    /// First opinion on whether an item is recyclable.
    #[must_use]
    pub fn query_recyclable(&self, stack: &ItemStack) -> HookResult {
        first_opinion(self.recyclable.iter().map(|hook| hook(stack)))
    }

    /// First opinion on whether a device may toggle.
    #[must_use]
    pub fn query_toggle(&self, device: DeviceId, actor: Option<&dyn Actor>) -> HookResult {
        first_opinion(self.toggle.iter().map(|hook| hook(device, actor)))
    }

    /// First opinion on whether the engine may recycle this item now.
    #[must_use]
    pub fn query_item_recycle(&self, stack: &ItemStack, device: DeviceId) -> HookResult {
        first_opinion(self.item_recycle.iter().map(|hook| hook(stack, device)))
    }

    /// The consumption amount after overrides.
    #[must_use]
    pub fn override_consumption(&self, stack: &ItemStack, device: DeviceId, computed: u32) -> i64 {
        self.consumption
            .iter()
            .find_map(|hook| hook(stack, device, computed))
            .unwrap_or_else(|| i64::from(computed))
    }
}

fn first_opinion(mut results: impl Iterator<Item = HookResult>) -> HookResult {
    results
        .find(|r| r.has_opinion())
        .unwrap_or(HookResult::NoOpinion)
}
