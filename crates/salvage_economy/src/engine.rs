//! # Conversion Engine
//!
//! One recycle step for one input stack:
//!
//! ```text
//! input slot ──> veto hook ──> restriction ──> consumption amount
//!                                                    │
//!          ┌─────────────────────────────────────────┘
//!          ▼
//!   recipe (override > vanilla) ──> take input ──> efficiency
//!                                                    │
//!          ┌─────────────────────────────────────────┘
//!          ▼
//!   per-ingredient yield ──> probabilistic rounding ──> output sink
//! ```
//!
//! ## Guarantees
//!
//! 1. Input is consumed before any output is computed
//! 2. A non-empty stack always consumes at least one unit unless a hook
//!    overrides the amount
//! 3. A rejected output stack marks the step saturated, but the remaining
//!    stacks are still attempted and nothing already placed is rolled back

use std::sync::Arc;

use crate::device::{DeviceId, RecyclerDevice};
use crate::hooks::{HookRegistry, HookResult};
use crate::item::{ItemCatalog, ItemDefinition, ItemId, ItemStack};
use crate::lookup::LookupTables;
use crate::recipe::{IngredientSpec, Recipe};
use crate::rounder::ProbabilisticRounder;

/// Lowest efficiency factor a worn item is scaled to.
pub const MIN_DURABILITY_FACTOR: f32 = 0.1;

/// Snaps a per-unit yield built from `f32` inputs onto a nearby whole
/// number, so single-precision noise does not round it up a step.
fn snap_single_precision(per_unit: f64) -> f64 {
    let whole = per_unit.round();
    if (per_unit - whole).abs() <= f64::from(f32::EPSILON) * whole.abs() {
        whole
    } else {
        per_unit
    }
}

/// What a recycle step did with its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// The slot was empty; nothing happened.
    Empty,
    /// The input was consumed and outputs computed.
    Processed,
    /// Consumption resolved to zero; nothing was consumed or produced.
    NothingConsumed,
    /// The item is restricted and must not be recycled.
    NotProcessable,
    /// An external recyclability hook blocked the item; the engine stood back.
    Deferred,
    /// An external per-item hook vetoed this step.
    Vetoed,
    /// No override and no vanilla recipe; left to the host.
    Unhandled,
}

/// Result of one recycle step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionOutcome {
    /// What happened to the input.
    pub disposition: Disposition,
    /// Units taken from the input.
    pub consumed: u32,
    /// Total yield per produced item, in recipe order.
    pub produced: Vec<(ItemId, u32)>,
    /// True if the output sink rejected at least one stack.
    pub saturated: bool,
}

impl ConversionOutcome {
    const fn with(disposition: Disposition) -> Self {
        Self {
            disposition,
            consumed: 0,
            produced: Vec::new(),
            saturated: false,
        }
    }

    /// True if input was consumed.
    #[must_use]
    pub const fn is_consumed(&self) -> bool {
        self.consumed > 0
    }

    /// True if the engine took responsibility for the step.
    #[must_use]
    pub const fn is_handled(&self) -> bool {
        matches!(
            self.disposition,
            Disposition::Empty | Disposition::Processed | Disposition::NothingConsumed
        )
    }

    /// Total units produced of one item.
    #[must_use]
    pub fn produced_of(&self, item_id: ItemId) -> u32 {
        self.produced
            .iter()
            .filter(|(id, _)| *id == item_id)
            .map(|(_, n)| n)
            .sum()
    }
}

/// One resolved output line: what to produce and how much per consumed unit.
struct YieldLine {
    output: IngredientSpec,
    per_unit: f64,
}

enum ResolvedRecipe {
    Override(Recipe),
    Vanilla,
}

/// Orchestrates recycle steps against the lookup tables.
#[derive(Debug)]
pub struct ConversionEngine {
    catalog: Arc<ItemCatalog>,
    tables: LookupTables,
    hooks: HookRegistry,
    rounder: ProbabilisticRounder,
}

impl ConversionEngine {
    /// Creates an engine.
    #[must_use]
    pub fn new(
        catalog: Arc<ItemCatalog>,
        tables: LookupTables,
        hooks: HookRegistry,
        rounder: ProbabilisticRounder,
    ) -> Self {
        Self {
            catalog,
            tables,
            hooks,
            rounder,
        }
    }

    /// The item catalog.
    #[must_use]
    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// The current lookup tables.
    #[must_use]
    pub const fn tables(&self) -> &LookupTables {
        &self.tables
    }

    /// Swaps in rebuilt tables. Call between ticks.
    pub fn replace_tables(&mut self, tables: LookupTables) {
        self.tables = tables;
    }

    /// The external hook registry.
    #[must_use]
    pub const fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Mutable access for registering hooks.
    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    /// Whether the engine would accept this stack right now.
    ///
    /// External recyclability hooks decide first; otherwise the item must be
    /// unrestricted. Either way it needs an override or a vanilla recipe.
    #[must_use]
    pub fn is_processable(&self, stack: &ItemStack) -> bool {
        if stack.is_empty() {
            return false;
        }
        let permitted = match self.hooks.query_recyclable(stack) {
            HookResult::Allow => true,
            HookResult::Deny => false,
            HookResult::NoOpinion => !self.tables.restrictions.is_restricted(stack.identity()),
        };
        permitted && self.has_recipe(stack)
    }

    /// Returns true if a step on this stack could resolve a recipe.
    fn has_recipe(&self, stack: &ItemStack) -> bool {
        self.catalog.get(stack.item_id).is_some_and(|definition| {
            definition.blueprint.is_some() || self.tables.overrides.resolve(stack.identity()).is_some()
        })
    }

    /// First input slot holding a processable stack, in slot order.
    #[must_use]
    pub fn next_processable_slot(&self, device: &dyn RecyclerDevice) -> Option<usize> {
        (0..device.input_slot_count())
            .find(|&slot| device.input(slot).is_some_and(|s| self.is_processable(s)))
    }

    /// Returns true if any input slot holds a processable stack.
    #[must_use]
    pub fn has_processable(&self, device: &dyn RecyclerDevice) -> bool {
        self.next_processable_slot(device).is_some()
    }

    /// This engine's answer to a host "can be recycled" query.
    ///
    /// `host_default` is what the host would decide alone. The engine only
    /// gives an opinion when it disagrees with that default: a restricted
    /// item the host would accept is denied, an overridden item the host
    /// would reject is allowed, and everything else is `NoOpinion`.
    #[must_use]
    pub fn evaluate_recyclable(&self, stack: &ItemStack, host_default: bool) -> HookResult {
        let identity = stack.identity();
        if self.tables.restrictions.is_restricted(identity) {
            return if host_default {
                HookResult::Deny
            } else {
                HookResult::NoOpinion
            };
        }
        if self.tables.overrides.resolve(identity).is_some() {
            return if host_default {
                HookResult::NoOpinion
            } else {
                HookResult::Allow
            };
        }
        HookResult::NoOpinion
    }

    /// Stock host decision: an item is recyclable if it has a blueprint.
    #[must_use]
    pub fn has_vanilla_recipe(&self, item_id: ItemId) -> bool {
        self.catalog
            .get(item_id)
            .is_some_and(|d| d.blueprint.is_some())
    }

    /// Runs one host-level processing pass: recycles the first processable
    /// input slot. Returns `None` if no slot is processable.
    pub fn process_next(&mut self, device: &mut dyn RecyclerDevice) -> Option<(usize, ConversionOutcome)> {
        let slot = self.next_processable_slot(device)?;
        Some((slot, self.process_slot(device, slot)))
    }

    /// Recycles one step of the stack in `slot`.
    pub fn process_slot(&mut self, device: &mut dyn RecyclerDevice, slot: usize) -> ConversionOutcome {
        let Some(stack) = device.input(slot).cloned() else {
            return ConversionOutcome::with(Disposition::Empty);
        };
        if stack.is_empty() {
            return ConversionOutcome::with(Disposition::Empty);
        }
        let device_id = device.id();

        if self.hooks.query_item_recycle(&stack, device_id) == HookResult::Deny {
            return ConversionOutcome::with(Disposition::Vetoed);
        }

        match self.hooks.query_recyclable(&stack) {
            HookResult::Deny => return ConversionOutcome::with(Disposition::Deferred),
            HookResult::Allow => {}
            HookResult::NoOpinion => {
                if self.tables.restrictions.is_restricted(stack.identity()) {
                    return ConversionOutcome::with(Disposition::NotProcessable);
                }
            }
        }

        let Some(definition) = self.catalog.get(stack.item_id) else {
            return ConversionOutcome::with(Disposition::Unhandled);
        };

        let amount = self.consumption_amount(&stack, definition, device_id);
        if amount == 0 {
            return ConversionOutcome::with(Disposition::NothingConsumed);
        }

        let resolved = match self.tables.overrides.resolve(stack.identity()) {
            Some(recipe) => ResolvedRecipe::Override(recipe.clone()),
            None if definition.blueprint.is_some() => ResolvedRecipe::Vanilla,
            None => return ConversionOutcome::with(Disposition::Unhandled),
        };

        // Consume before computing outputs.
        let Some(taken) = device.take_input(slot, amount) else {
            return ConversionOutcome::with(Disposition::NothingConsumed);
        };
        let consumed = taken.amount;

        let efficiency = self.efficiency(device.efficiency(), &stack, definition);
        let lines = match resolved {
            ResolvedRecipe::Override(recipe) => override_lines(&recipe, efficiency),
            ResolvedRecipe::Vanilla => self.vanilla_lines(definition, efficiency),
        };

        let mut outcome = ConversionOutcome {
            disposition: Disposition::Processed,
            consumed,
            produced: Vec::with_capacity(lines.len()),
            saturated: false,
        };

        for line in lines {
            if line.per_unit <= 0.0 {
                continue;
            }
            let total = self.rounder.round(consumed, snap_single_precision(line.per_unit));
            if total == 0 {
                continue;
            }
            if !self.place(device, &line, total) {
                outcome.saturated = true;
            }
            outcome.produced.push((line.output.item_id, total));
        }

        tracing::debug!(
            "Recycler {} consumed {} of item {} (efficiency {:.2}), produced {:?}{}",
            device_id,
            consumed,
            stack.item_id,
            efficiency,
            outcome.produced,
            if outcome.saturated { ", output saturated" } else { "" }
        );

        outcome
    }

    /// Units to consume this step, after hooks, capped at the stack amount.
    fn consumption_amount(&self, stack: &ItemStack, definition: &ItemDefinition, device: DeviceId) -> u32 {
        let computed = if stack.amount == 1 {
            1
        } else {
            let percent = f64::from(self.tables.consumption.percent(stack.identity()));
            let cap = f64::from(definition.max_stack) * percent / 100.0;
            let amount = f64::from(stack.amount).min(cap).ceil();
            (amount as u32).max(1)
        };

        let amount = self.hooks.override_consumption(stack, device, computed);
        if amount <= 0 {
            return 0;
        }
        u32::try_from(amount).unwrap_or(u32::MAX).min(stack.amount)
    }

    fn efficiency(&self, device_efficiency: f32, stack: &ItemStack, definition: &ItemDefinition) -> f64 {
        let mut efficiency = device_efficiency.clamp(0.0, 1.0);
        if self.tables.scale_by_durability && definition.has_durability {
            if let Some(condition) = stack.condition {
                efficiency *= condition.clamp(MIN_DURABILITY_FACTOR, 1.0);
            }
        }
        f64::from(efficiency)
    }

    fn vanilla_lines(&self, definition: &ItemDefinition, efficiency: f64) -> Vec<YieldLine> {
        let Some(blueprint) = definition.blueprint.as_ref() else {
            return Vec::new();
        };
        let divisor = f64::from(blueprint.amount_to_create.max(1));
        let multipliers = &self.tables.multipliers;

        let mut lines = Vec::with_capacity(blueprint.ingredients.len() + 1);
        if blueprint.scrap_from_recycle > 0 {
            if let Some(byproduct) = self.catalog.byproduct() {
                let multiplier = f64::from(multipliers.multiplier(ItemStack::new(byproduct.id, 1).identity()));
                let scrap = blueprint.scrap_from_recycle as f32;
                lines.push(YieldLine {
                    output: IngredientSpec::new(byproduct.id, scrap),
                    per_unit: f64::from(scrap) * multiplier * efficiency,
                });
            }
        }

        for ingredient in &blueprint.ingredients {
            let multiplier = f64::from(multipliers.multiplier(ItemStack::new(ingredient.item_id, 1).identity()));
            lines.push(YieldLine {
                output: IngredientSpec::new(ingredient.item_id, ingredient.amount),
                per_unit: f64::from(ingredient.amount) * multiplier * efficiency / divisor,
            });
        }

        lines
    }

    /// Places `total` units split into stacks of the item's max size.
    /// Returns false if any stack was rejected.
    fn place(&self, device: &mut dyn RecyclerDevice, line: &YieldLine, total: u32) -> bool {
        let max_stack = self.catalog.max_stack(line.output.item_id).max(1);
        let mut remaining = total;
        let mut all_placed = true;

        while remaining > 0 {
            let amount = remaining.min(max_stack);
            if !device.place_output(line.output.stack(amount), max_stack) {
                all_placed = false;
            }
            remaining -= amount;
        }

        all_placed
    }
}

fn override_lines(recipe: &Recipe, efficiency: f64) -> Vec<YieldLine> {
    recipe
        .ingredients
        .iter()
        .map(|ingredient| YieldLine {
            output: ingredient.clone(),
            per_unit: f64::from(ingredient.amount) * efficiency,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceEffect, InputSource, OutputSink, SimDevice};
    use crate::item::{Blueprint, BlueprintIngredient};

    const SCRAP: ItemId = 1;
    const FRAGMENTS: ItemId = 2;
    const RIFLE: ItemId = 3;
    const ROPE: ItemId = 4;
    const STONES: ItemId = 5;
    const GEARS: ItemId = 6;

    fn catalog() -> ItemCatalog {
        ItemCatalog::from_definitions([
            ItemDefinition::new(SCRAP, "scrap", 1000),
            ItemDefinition::new(FRAGMENTS, "metal.fragments", 1000),
            ItemDefinition::new(STONES, "stones", 1000),
            ItemDefinition::new(RIFLE, "rifle.ak", 1)
                .with_durability()
                .with_blueprint(Blueprint {
                    ingredients: vec![BlueprintIngredient {
                        item_id: FRAGMENTS,
                        amount: 40.0,
                    }],
                    amount_to_create: 1,
                    scrap_from_recycle: 20,
                }),
            ItemDefinition::new(ROPE, "rope", 50).with_blueprint(Blueprint {
                ingredients: Vec::new(),
                amount_to_create: 1,
                scrap_from_recycle: 2,
            }),
            ItemDefinition::new(GEARS, "gears", 20).with_blueprint(Blueprint {
                ingredients: vec![BlueprintIngredient {
                    item_id: FRAGMENTS,
                    amount: 13.0,
                }],
                amount_to_create: 1,
                scrap_from_recycle: 10,
            }),
        ])
    }

    fn engine_with(tables: LookupTables) -> ConversionEngine {
        ConversionEngine::new(
            Arc::new(catalog()),
            tables,
            HookRegistry::new(),
            ProbabilisticRounder::new(1),
        )
    }

    #[test]
    fn test_vanilla_scrap_deterministic() {
        let mut engine = engine_with(LookupTables::default());
        let mut device = SimDevice::new(1).with_efficiency(1.0);
        device.load(0, ItemStack::new(ROPE, 3));

        // 10% of 50 = 5, capped by the stack amount of 3.
        let outcome = engine.process_slot(&mut device, 0);
        assert_eq!(outcome.disposition, Disposition::Processed);
        assert_eq!(outcome.consumed, 3);
        assert_eq!(device.output.count_item(SCRAP), 6);
        assert!(device.input.get(0).is_none());
    }

    #[test]
    fn test_empty_slot_is_noop() {
        let mut engine = engine_with(LookupTables::default());
        let mut device = SimDevice::new(1);
        let outcome = engine.process_slot(&mut device, 2);
        assert_eq!(outcome.disposition, Disposition::Empty);
        assert!(outcome.is_handled());
        assert!(!outcome.is_consumed());
    }

    #[test]
    fn test_consumption_never_below_one() {
        let mut tables = LookupTables::default();
        tables.consumption = crate::lookup::ConsumptionTable::new(0.0);
        let mut engine = engine_with(tables);
        let mut device = SimDevice::new(1).with_efficiency(1.0);
        device.load(0, ItemStack::new(ROPE, 40));

        let outcome = engine.process_slot(&mut device, 0);
        assert_eq!(outcome.consumed, 1);
        assert_eq!(device.input.get(0).map(|s| s.amount), Some(39));
    }

    #[test]
    fn test_consumption_percent_of_max_stack() {
        let mut engine = engine_with(LookupTables::default());
        let mut device = SimDevice::new(1).with_efficiency(1.0);
        device.load(0, ItemStack::new(ROPE, 40));

        // ceil(min(40, 50 * 0.10)) = 5
        let outcome = engine.process_slot(&mut device, 0);
        assert_eq!(outcome.consumed, 5);
        assert_eq!(device.output.count_item(SCRAP), 10);
    }

    #[test]
    fn test_restricted_not_processable() {
        let mut tables = LookupTables::default();
        tables.restrictions.restrict_item(ROPE);
        let mut engine = engine_with(tables);
        let mut device = SimDevice::new(1);
        device.load(0, ItemStack::new(ROPE, 3));

        let outcome = engine.process_slot(&mut device, 0);
        assert_eq!(outcome.disposition, Disposition::NotProcessable);
        assert!(!outcome.is_handled());
        assert_eq!(device.input.get(0).map(|s| s.amount), Some(3));
        assert!(!engine.has_processable(&device));
    }

    #[test]
    fn test_hook_block_defers() {
        let mut engine = engine_with(LookupTables::default());
        engine.hooks_mut().on_recyclable(|_| HookResult::Deny);
        let mut device = SimDevice::new(1);
        device.load(0, ItemStack::new(ROPE, 3));

        let outcome = engine.process_slot(&mut device, 0);
        assert_eq!(outcome.disposition, Disposition::Deferred);
        assert_eq!(device.input.get(0).map(|s| s.amount), Some(3));
    }

    #[test]
    fn test_hook_allow_overrides_restriction() {
        let mut tables = LookupTables::default();
        tables.restrictions.restrict_item(ROPE);
        let mut engine = engine_with(tables);
        engine.hooks_mut().on_recyclable(|_| HookResult::Allow);
        let mut device = SimDevice::new(1).with_efficiency(1.0);
        device.load(0, ItemStack::new(ROPE, 1));

        let outcome = engine.process_slot(&mut device, 0);
        assert_eq!(outcome.disposition, Disposition::Processed);
        assert_eq!(device.output.count_item(SCRAP), 2);
    }

    #[test]
    fn test_item_veto() {
        let mut engine = engine_with(LookupTables::default());
        engine
            .hooks_mut()
            .on_item_recycle(|stack, _| if stack.item_id == ROPE { HookResult::Deny } else { HookResult::NoOpinion });
        let mut device = SimDevice::new(1);
        device.load(0, ItemStack::new(ROPE, 1));

        assert_eq!(engine.process_slot(&mut device, 0).disposition, Disposition::Vetoed);
        assert_eq!(device.input.get(0).map(|s| s.amount), Some(1));
    }

    #[test]
    fn test_consumption_hook_zero_consumes_nothing() {
        let mut engine = engine_with(LookupTables::default());
        engine.hooks_mut().on_consumption(|_, _, _| Some(0));
        let mut device = SimDevice::new(1);
        device.load(0, ItemStack::new(ROPE, 10));

        let outcome = engine.process_slot(&mut device, 0);
        assert_eq!(outcome.disposition, Disposition::NothingConsumed);
        assert!(outcome.is_handled());
        assert_eq!(device.input.get(0).map(|s| s.amount), Some(10));
    }

    #[test]
    fn test_no_recipe_is_unhandled() {
        let mut engine = engine_with(LookupTables::default());
        let mut device = SimDevice::new(1);
        device.load(0, ItemStack::new(STONES, 10));

        let outcome = engine.process_slot(&mut device, 0);
        assert_eq!(outcome.disposition, Disposition::Unhandled);
        assert_eq!(device.input.get(0).map(|s| s.amount), Some(10));
        assert!(!engine.is_processable(&ItemStack::new(STONES, 10)));
    }

    #[test]
    fn test_override_skips_multipliers() {
        let mut tables = LookupTables::default();
        tables.multipliers.entries_mut().insert_item(FRAGMENTS, 10.0);
        tables.overrides.entries_mut().insert_item(
            STONES,
            Recipe::new(vec![IngredientSpec::new(FRAGMENTS, 2.0).with_skin(99)]),
        );
        let mut engine = engine_with(tables);
        let mut device = SimDevice::new(1).with_efficiency(1.0);
        device.load(0, ItemStack::new(STONES, 4));

        // ceil(min(4, 1000 * 0.10)) = 4 consumed, 2.0 per unit.
        let outcome = engine.process_slot(&mut device, 0);
        assert_eq!(outcome.produced, vec![(FRAGMENTS, 8)]);
        let placed = device.output.get(0).unwrap();
        assert_eq!(placed.skin, 99);
    }

    #[test]
    fn test_vanilla_applies_multiplier_and_divisor() {
        let mut tables = LookupTables::default();
        tables.multipliers.entries_mut().insert_item(FRAGMENTS, 2.0);
        let mut engine = engine_with(tables);
        let mut device = SimDevice::new(1).with_efficiency(0.5);
        device.load(0, ItemStack::new(RIFLE, 1));

        // fragments: 40 * 2.0 * 0.5 = 40; scrap: 20 * 0.5 = 10
        let outcome = engine.process_slot(&mut device, 0);
        assert_eq!(outcome.produced_of(FRAGMENTS), 40);
        assert_eq!(outcome.produced_of(SCRAP), 10);
    }

    #[test]
    fn test_durability_scales_efficiency() {
        let mut engine = engine_with(LookupTables::default());
        let mut device = SimDevice::new(1).with_efficiency(1.0);
        device.load(0, ItemStack::new(RIFLE, 1).with_condition(0.5));

        let outcome = engine.process_slot(&mut device, 0);
        assert_eq!(outcome.produced_of(FRAGMENTS), 20);
        assert_eq!(outcome.produced_of(SCRAP), 10);
    }

    #[test]
    fn test_durability_floor() {
        let mut engine = engine_with(LookupTables::default());

        let mut broken = SimDevice::new(1).with_efficiency(1.0);
        broken.load(0, ItemStack::new(RIFLE, 1).with_condition(0.0));
        let broken = engine.process_slot(&mut broken, 0);

        let mut worn = SimDevice::new(2).with_efficiency(1.0);
        worn.load(0, ItemStack::new(RIFLE, 1).with_condition(MIN_DURABILITY_FACTOR));
        let worn = engine.process_slot(&mut worn, 0);

        assert!(broken.produced_of(FRAGMENTS) > 0);
        assert_eq!(broken.produced, worn.produced);
    }

    #[test]
    fn test_output_split_by_max_stack() {
        let mut tables = LookupTables::default();
        tables
            .overrides
            .entries_mut()
            .insert_item(STONES, Recipe::new(vec![IngredientSpec::new(GEARS, 5.0)]));
        let mut engine = engine_with(tables);
        let mut device = SimDevice::new(1).with_efficiency(1.0);
        device.load(0, ItemStack::new(STONES, 10));

        // 10 consumed * 5 = 50 gears, max stack 20 -> 20 + 20 + 10.
        let outcome = engine.process_slot(&mut device, 0);
        assert!(!outcome.saturated);
        assert_eq!(device.output.used_slots(), 3);
        assert_eq!(device.output.count_item(GEARS), 50);
    }

    #[test]
    fn test_saturation_keeps_partial_output() {
        let mut tables = LookupTables::default();
        tables
            .overrides
            .entries_mut()
            .insert_item(STONES, Recipe::new(vec![IngredientSpec::new(GEARS, 5.0)]));
        let mut engine = engine_with(tables);
        let mut device = SimDevice::new(1).with_efficiency(1.0).with_output_slots(2);
        device.load(0, ItemStack::new(STONES, 10));

        let outcome = engine.process_slot(&mut device, 0);
        assert!(outcome.saturated);
        assert_eq!(outcome.consumed, 10);
        assert_eq!(device.output.count_item(GEARS), 40);
    }

    #[test]
    fn test_evaluate_recyclable_defers_when_host_agrees() {
        let mut tables = LookupTables::default();
        tables.restrictions.restrict_item(ROPE);
        tables
            .overrides
            .entries_mut()
            .insert_item(STONES, Recipe::new(vec![IngredientSpec::new(GEARS, 1.0)]));
        let engine = engine_with(tables);

        let rope = ItemStack::new(ROPE, 1);
        assert_eq!(engine.evaluate_recyclable(&rope, true), HookResult::Deny);
        assert_eq!(engine.evaluate_recyclable(&rope, false), HookResult::NoOpinion);

        let stones = ItemStack::new(STONES, 1);
        assert_eq!(engine.evaluate_recyclable(&stones, false), HookResult::Allow);
        assert_eq!(engine.evaluate_recyclable(&stones, true), HookResult::NoOpinion);

        let gears = ItemStack::new(GEARS, 1);
        assert_eq!(engine.evaluate_recyclable(&gears, true), HookResult::NoOpinion);
    }

    #[test]
    fn test_process_next_takes_first_processable_slot() {
        let mut engine = engine_with(LookupTables::default());
        let mut device = SimDevice::new(1).with_efficiency(1.0);
        device.load(0, ItemStack::new(STONES, 5));
        device.load(2, ItemStack::new(ROPE, 1));
        device.load(4, ItemStack::new(GEARS, 1));

        let (slot, outcome) = engine.process_next(&mut device).unwrap();
        assert_eq!(slot, 2);
        assert_eq!(outcome.disposition, Disposition::Processed);

        let (slot, _) = engine.process_next(&mut device).unwrap();
        assert_eq!(slot, 4);
        assert!(engine.process_next(&mut device).is_none());
    }

    #[test]
    fn test_hook_allow_without_recipe_is_not_processable() {
        let mut engine = engine_with(LookupTables::default());
        engine
            .hooks_mut()
            .on_recyclable(|stack| if stack.item_id == STONES { HookResult::Allow } else { HookResult::NoOpinion });
        let mut device = SimDevice::new(1).with_efficiency(1.0);
        device.load(0, ItemStack::new(STONES, 10));
        device.load(1, ItemStack::new(ROPE, 5));

        assert!(!engine.is_processable(&ItemStack::new(STONES, 10)));
        let (slot, outcome) = engine.process_next(&mut device).unwrap();
        assert_eq!(slot, 1);
        assert_eq!(outcome.disposition, Disposition::Processed);
        assert!(!engine.has_processable(&device));
        assert_eq!(device.input.get(0).map(|s| s.amount), Some(10));
    }

    /// Shows its input but refuses every take.
    struct LockedInput(SimDevice);

    impl InputSource for LockedInput {
        fn input_slot_count(&self) -> usize {
            self.0.input_slot_count()
        }

        fn input(&self, slot: usize) -> Option<&ItemStack> {
            self.0.input(slot)
        }

        fn take_input(&mut self, _slot: usize, _amount: u32) -> Option<ItemStack> {
            None
        }
    }

    impl OutputSink for LockedInput {
        fn place_output(&mut self, stack: ItemStack, max_stack: u32) -> bool {
            self.0.place_output(stack, max_stack)
        }
    }

    impl RecyclerDevice for LockedInput {
        fn id(&self) -> DeviceId {
            self.0.id()
        }

        fn efficiency(&self) -> f32 {
            self.0.efficiency()
        }

        fn is_on(&self) -> bool {
            self.0.is_on()
        }

        fn set_on(&mut self, on: bool) {
            self.0.set_on(on);
        }

        fn emit_effect(&mut self, effect: DeviceEffect) {
            self.0.emit_effect(effect);
        }
    }

    #[test]
    fn test_refused_take_consumes_nothing() {
        let mut engine = engine_with(LookupTables::default());
        let mut inner = SimDevice::new(1).with_efficiency(1.0);
        inner.load(0, ItemStack::new(ROPE, 3));
        let mut device = LockedInput(inner);

        let outcome = engine.process_slot(&mut device, 0);
        assert_eq!(outcome.disposition, Disposition::NothingConsumed);
        assert!(!outcome.is_consumed());
        assert!(outcome.produced.is_empty());
        assert_eq!(device.0.output.count_item(SCRAP), 0);
    }

    #[test]
    fn test_single_precision_noise_does_not_round_up() {
        // 0.6_f32 widens to 0.60000002384..., so 0.6 * 10 lands just above 6.
        assert_eq!(snap_single_precision(f64::from(0.6_f32) * 10.0), 6.0);
        assert_eq!(snap_single_precision(1.000_000_5), 1.000_000_5);
        assert_eq!(snap_single_precision(0.3), 0.3);

        let mut tables = LookupTables::default();
        tables.multipliers.entries_mut().insert_item(FRAGMENTS, 10.0);
        let mut engine = engine_with(tables);
        let mut device = SimDevice::new(1).with_efficiency(0.6);
        device.load(0, ItemStack::new(RIFLE, 1));

        // fragments: 40 * 10 * 0.6 = 240; scrap: 20 * 0.6 = 12
        let outcome = engine.process_slot(&mut device, 0);
        assert_eq!(outcome.produced_of(FRAGMENTS), 240);
        assert_eq!(outcome.produced_of(SCRAP), 12);
    }
}
