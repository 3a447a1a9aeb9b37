//! # Speed Policy
//!
//! How long one recycle step takes for a given activation.
//!
//! An activation resolves one multiplier from the toggling actor's
//! permission tiers and keeps it until the device stops. The interval it
//! scales is either the device-wide default or, in variable-speed mode, the
//! per-item recycle time of the item about to be processed.

use std::collections::HashMap;

use salvage_economy::{Actor, ItemCatalog, ItemId, ItemStack, SpeedConfig};

/// Multiplier when no tier applies.
pub const NEUTRAL_MULTIPLIER: f32 = 1.0;

/// A permission-gated interval multiplier.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeedTier {
    /// Permission required. `None` applies to every actor.
    pub permission: Option<String>,
    /// Interval multiplier, `>= 0`. Zero means instant.
    pub multiplier: f32,
}

impl SpeedTier {
    /// Creates a tier gated on a permission.
    #[must_use]
    pub fn gated(permission: impl Into<String>, multiplier: f32) -> Self {
        Self {
            permission: Some(permission.into()),
            multiplier: non_negative(multiplier),
        }
    }

    /// Creates a tier that applies to every actor.
    #[must_use]
    pub fn ungated(multiplier: f32) -> Self {
        Self {
            permission: None,
            multiplier: non_negative(multiplier),
        }
    }

    fn applies_to(&self, actor: &dyn Actor) -> bool {
        self.permission
            .as_deref()
            .map_or(true, |permission| actor.has_permission(permission))
    }
}

/// Resolves processing intervals.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeedPolicy {
    default_interval: f32,
    /// Least privileged first.
    tiers: Vec<SpeedTier>,
    item_intervals: HashMap<ItemId, f32>,
}

impl SpeedPolicy {
    /// Creates a policy with a default interval in seconds.
    #[must_use]
    pub fn new(default_interval: f32) -> Self {
        Self {
            default_interval: non_negative(default_interval),
            tiers: Vec::new(),
            item_intervals: HashMap::new(),
        }
    }

    /// Appends a tier. Later tiers are more privileged.
    #[must_use]
    pub fn with_tier(mut self, tier: SpeedTier) -> Self {
        self.tiers.push(tier);
        self
    }

    /// Sets the recycle time of one item type in seconds.
    #[must_use]
    pub fn with_item_interval(mut self, item_id: ItemId, seconds: f32) -> Self {
        self.item_intervals.insert(item_id, non_negative(seconds));
        self
    }

    /// Builds a policy from the `[speed]` section.
    ///
    /// Per-item times naming unknown items are logged and skipped.
    #[must_use]
    pub fn from_config(config: &SpeedConfig, catalog: &ItemCatalog) -> Self {
        let mut policy = Self::new(config.default_recycle_time);

        for tier in &config.tiers {
            if tier.multiplier < 0.0 || !tier.multiplier.is_finite() {
                tracing::warn!(
                    "Speed tier {:?} has invalid multiplier {}, clamping",
                    tier.permission,
                    tier.multiplier
                );
            }
            policy.tiers.push(SpeedTier {
                permission: tier.permission.clone(),
                multiplier: non_negative(tier.multiplier),
            });
        }

        for (short_name, &seconds) in &config.item_recycle_times {
            match catalog.resolve(short_name) {
                Ok(item_id) => {
                    policy.item_intervals.insert(item_id, non_negative(seconds));
                }
                Err(err) => tracing::warn!("Skipping speed.item_recycle_times entry: {}", err),
            }
        }

        policy
    }

    /// The device-wide interval in seconds.
    #[must_use]
    pub const fn default_interval(&self) -> f32 {
        self.default_interval
    }

    /// The configured tiers, least privileged first.
    #[must_use]
    pub fn tiers(&self) -> &[SpeedTier] {
        &self.tiers
    }

    /// True if any per-item recycle time differs from the default.
    #[must_use]
    pub fn is_variable_speed(&self) -> bool {
        self.item_intervals
            .values()
            .any(|&seconds| (seconds - self.default_interval).abs() > f32::EPSILON)
    }

    /// The multiplier of the most privileged tier the actor qualifies for,
    /// or `1.0` if none. Without an actor the neutral multiplier applies.
    #[must_use]
    pub fn resolve_multiplier_for_actor(&self, actor: Option<&dyn Actor>) -> f32 {
        let Some(actor) = actor else {
            return NEUTRAL_MULTIPLIER;
        };
        self.tiers
            .iter()
            .rev()
            .find(|tier| tier.applies_to(actor))
            .map_or(NEUTRAL_MULTIPLIER, |tier| tier.multiplier)
    }

    /// The recycle time for an item in seconds.
    #[must_use]
    pub fn resolve_interval_for_item(&self, stack: &ItemStack) -> f32 {
        self.item_intervals
            .get(&stack.item_id)
            .copied()
            .unwrap_or(self.default_interval)
    }
}

impl Default for SpeedPolicy {
    fn default() -> Self {
        Self::new(salvage_economy::config::DEFAULT_RECYCLE_TIME)
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
