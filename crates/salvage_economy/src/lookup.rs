//! # Identity Lookup Tables
//!
//! Every per-item setting is resolved the same way: display name
//! (case-insensitive) first, then skin (nonzero only), then item type.
//! The first match wins and a miss returns the table's documented default.
//!
//! | Table | Miss |
//! |-------|------|
//! | [`OverrideTable`] | no override, vanilla recipe applies |
//! | [`RestrictionTable`] | not restricted |
//! | [`OutputMultiplierTable`] | multiplier `1.0` |
//! | [`ConsumptionTable`] | the global default percent |

use std::collections::HashMap;

use crate::error::{SalvageError, SalvageResult};
use crate::item::{ItemCatalog, ItemDefinition, ItemId, ItemIdentity, SkinId};
use crate::recipe::Recipe;

/// Values keyed by the three identity keyspaces.
#[derive(Clone, Debug, PartialEq)]
pub struct IdentityTable<T> {
    by_display_name: HashMap<String, T>,
    by_skin: HashMap<SkinId, T>,
    by_item: HashMap<ItemId, T>,
}

impl<T> Default for IdentityTable<T> {
    fn default() -> Self {
        Self {
            by_display_name: HashMap::new(),
            by_skin: HashMap::new(),
            by_item: HashMap::new(),
        }
    }
}

impl<T> IdentityTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value for a display name. Names are matched case-insensitively.
    pub fn insert_display_name(&mut self, name: &str, value: T) {
        self.by_display_name.insert(name.to_lowercase(), value);
    }

    /// Sets the value for a skin. Skin 0 is ignored.
    pub fn insert_skin(&mut self, skin: SkinId, value: T) {
        if skin != 0 {
            self.by_skin.insert(skin, value);
        }
    }

    /// Sets the value for an item type.
    pub fn insert_item(&mut self, item_id: ItemId, value: T) {
        self.by_item.insert(item_id, value);
    }

    /// Returns the item-type entry, ignoring the other keyspaces.
    #[must_use]
    pub fn get_item(&self, item_id: ItemId) -> Option<&T> {
        self.by_item.get(&item_id)
    }

    /// Resolves an identity by priority: display name, skin, item type.
    #[must_use]
    pub fn resolve(&self, identity: ItemIdentity<'_>) -> Option<&T> {
        if let Some(name) = identity.display_name {
            if !self.by_display_name.is_empty() {
                if let Some(value) = self.by_display_name.get(&name.to_lowercase()) {
                    return Some(value);
                }
            }
        }

        if identity.skin != 0 {
            if let Some(value) = self.by_skin.get(&identity.skin) {
                return Some(value);
            }
        }

        self.by_item.get(&identity.item_id)
    }

    /// Total entries across all keyspaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_display_name.len() + self.by_skin.len() + self.by_item.len()
    }

    /// Returns true if all keyspaces are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Custom recipes replacing vanilla ones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverrideTable {
    table: IdentityTable<Recipe>,
}

impl OverrideTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct access to the keyspaces for loading.
    pub fn entries_mut(&mut self) -> &mut IdentityTable<Recipe> {
        &mut self.table
    }

    /// The override recipe for a stack, if any.
    #[must_use]
    pub fn resolve(&self, identity: ItemIdentity<'_>) -> Option<&Recipe> {
        self.table.resolve(identity)
    }

    /// Returns true if an item-type override exists.
    #[must_use]
    pub fn has_item_override(&self, item_id: ItemId) -> bool {
        self.table.get_item(item_id).is_some()
    }

    /// Seeds an override from the item's vanilla recipe.
    ///
    /// Returns the seeded recipe.
    ///
    /// # Errors
    ///
    /// - `OverrideExists` if the item type already has an override
    /// - `InvalidConfig` if the item has no vanilla recipe to seed from
    pub fn add_override(
        &mut self,
        definition: &ItemDefinition,
        catalog: &ItemCatalog,
    ) -> SalvageResult<Recipe> {
        if self.has_item_override(definition.id) {
            return Err(SalvageError::OverrideExists(definition.short_name.clone()));
        }
        self.reset_override(definition, catalog)
    }

    /// Reseeds an override from the item's vanilla recipe, replacing any
    /// existing entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the item has no vanilla recipe.
    pub fn reset_override(
        &mut self,
        definition: &ItemDefinition,
        catalog: &ItemCatalog,
    ) -> SalvageResult<Recipe> {
        let recipe = Recipe::from_blueprint(definition, catalog).ok_or_else(|| {
            SalvageError::InvalidConfig(format!(
                "{} has no recipe to seed an override from",
                definition.short_name
            ))
        })?;
        self.table.insert_item(definition.id, recipe.clone());
        Ok(recipe)
    }

    /// Number of overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if there are no overrides.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Items that may not be recycled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RestrictionTable {
    table: IdentityTable<()>,
}

impl RestrictionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Disallows a display name.
    pub fn restrict_display_name(&mut self, name: &str) {
        self.table.insert_display_name(name, ());
    }

    /// Disallows a skin.
    pub fn restrict_skin(&mut self, skin: SkinId) {
        self.table.insert_skin(skin, ());
    }

    /// Disallows an item type.
    pub fn restrict_item(&mut self, item_id: ItemId) {
        self.table.insert_item(item_id, ());
    }

    /// Returns true if the identity is disallowed.
    #[must_use]
    pub fn is_restricted(&self, identity: ItemIdentity<'_>) -> bool {
        self.table.resolve(identity).is_some()
    }
}

/// Global yield multipliers for produced item types.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputMultiplierTable {
    table: IdentityTable<f32>,
}

impl OutputMultiplierTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct access to the keyspaces for loading.
    pub fn entries_mut(&mut self) -> &mut IdentityTable<f32> {
        &mut self.table
    }

    /// Multiplier for a produced identity, `1.0` if unset.
    #[must_use]
    pub fn multiplier(&self, identity: ItemIdentity<'_>) -> f32 {
        self.table.resolve(identity).copied().unwrap_or(1.0)
    }
}

/// Percent of the max stack size consumed per recycle step.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsumptionTable {
    table: IdentityTable<f32>,
    default_percent: f32,
}

impl Default for ConsumptionTable {
    fn default() -> Self {
        Self::new(DEFAULT_CONSUMPTION_PERCENT)
    }
}

/// Percent of max stack a stock recycler consumes per step.
pub const DEFAULT_CONSUMPTION_PERCENT: f32 = 10.0;

impl ConsumptionTable {
    /// Creates a table with a global default percent.
    #[must_use]
    pub fn new(default_percent: f32) -> Self {
        Self {
            table: IdentityTable::new(),
            default_percent,
        }
    }

    /// Direct access to the keyspaces for loading.
    pub fn entries_mut(&mut self) -> &mut IdentityTable<f32> {
        &mut self.table
    }

    /// The global default percent.
    #[must_use]
    pub const fn default_percent(&self) -> f32 {
        self.default_percent
    }

    /// Percent for an identity, the global default if unset.
    #[must_use]
    pub fn percent(&self, identity: ItemIdentity<'_>) -> f32 {
        self.table
            .resolve(identity)
            .copied()
            .unwrap_or(self.default_percent)
    }
}

/// The full set of tables the engine reads.
#[derive(Clone, Debug, PartialEq)]
pub struct LookupTables {
    /// Custom recipes.
    pub overrides: OverrideTable,
    /// Disallowed inputs.
    pub restrictions: RestrictionTable,
    /// Vanilla output multipliers.
    pub multipliers: OutputMultiplierTable,
    /// Per-step consumption percents.
    pub consumption: ConsumptionTable,
    /// Whether input durability scales efficiency.
    pub scale_by_durability: bool,
}

impl Default for LookupTables {
    fn default() -> Self {
        Self {
            overrides: OverrideTable::new(),
            restrictions: RestrictionTable::new(),
            multipliers: OutputMultiplierTable::new(),
            consumption: ConsumptionTable::default(),
            scale_by_durability: true,
        }
    }
}
