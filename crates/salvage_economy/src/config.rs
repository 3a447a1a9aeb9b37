//! # Recycler Configuration
//!
//! All balance data lives in one TOML document. Items are referenced by
//! short name and resolved against the [`ItemCatalog`] when the lookup
//! tables are built; entries naming unknown items are logged and skipped.
//!
//! ## Example
//!
//! ```toml
//! [speed]
//! default_recycle_time = 5.0
//!
//! [[speed.tiers]]
//! permission = "salvage.speed.fast"
//! multiplier = 0.5
//!
//! [speed.item_recycle_times]
//! "rifle.ak" = 10.0
//!
//! [efficiency]
//! default_percent = 10.0
//!
//! [restrictions]
//! items = ["explosive.timed"]
//!
//! [output_multipliers]
//! "scrap" = 2.0
//!
//! [[override_output.by_item."rifle.ak"]]
//! item = "metal.refined"
//! amount = 12.5
//! ```
//!
//! ## Failure Model
//!
//! A document that does not parse is never fatal: [`ConfigLoader`] falls
//! back to [`RecyclerConfig::default`] and flags the result as using
//! defaults. [`RecyclerSettings`] refuses administrative changes while that
//! flag is set so the broken file is not overwritten.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{SalvageError, SalvageResult};
use crate::item::{ItemCatalog, ItemDefinition, ItemId, SkinId};
use crate::lookup::{
    ConsumptionTable, LookupTables, OutputMultiplierTable, OverrideTable,
    RestrictionTable, DEFAULT_CONSUMPTION_PERCENT,
};
use crate::recipe::{clamp_amount, IngredientSpec, Recipe};

/// Recycle time of a stock recycler, in seconds.
pub const DEFAULT_RECYCLE_TIME: f32 = 5.0;

/// The full configuration document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecyclerConfig {
    /// Fixed seed for yield rounding; clock-seeded if absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
    /// Processing interval settings.
    pub speed: SpeedConfig,
    /// Consumption and efficiency settings.
    pub efficiency: EfficiencyConfig,
    /// Disallowed inputs.
    pub restrictions: RestrictionConfig,
    /// Vanilla output multipliers by produced short name.
    pub output_multipliers: BTreeMap<String, f32>,
    /// Custom recipes.
    pub override_output: OverrideConfig,
}

/// Processing interval settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    /// Seconds per recycle step.
    pub default_recycle_time: f32,
    /// Permission-gated interval multipliers, least privileged first.
    pub tiers: Vec<SpeedTierConfig>,
    /// Per-item recycle times in seconds, by short name.
    pub item_recycle_times: BTreeMap<String, f32>,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            default_recycle_time: DEFAULT_RECYCLE_TIME,
            tiers: Vec::new(),
            item_recycle_times: BTreeMap::new(),
        }
    }
}

/// One permission-gated speed tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeedTierConfig {
    /// Permission required; ungated tiers apply to every actor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    /// Interval multiplier; 0 means instant.
    pub multiplier: f32,
}

/// Consumption and efficiency settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EfficiencyConfig {
    /// Percent of max stack consumed per step when no entry matches.
    pub default_percent: f32,
    /// Percent by item short name.
    pub percent_by_item: BTreeMap<String, f32>,
    /// Percent by skin id.
    pub percent_by_skin: BTreeMap<String, f32>,
    /// Percent by display name.
    pub percent_by_display_name: BTreeMap<String, f32>,
    /// Whether input durability scales efficiency.
    pub scale_by_durability: bool,
}

impl Default for EfficiencyConfig {
    fn default() -> Self {
        Self {
            default_percent: DEFAULT_CONSUMPTION_PERCENT,
            percent_by_item: BTreeMap::new(),
            percent_by_skin: BTreeMap::new(),
            percent_by_display_name: BTreeMap::new(),
            scale_by_durability: true,
        }
    }
}

/// Disallowed inputs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestrictionConfig {
    /// Item short names.
    pub items: Vec<String>,
    /// Skin ids.
    pub skins: Vec<SkinId>,
    /// Display names.
    pub display_names: Vec<String>,
}

/// Custom recipes in the three identity keyspaces.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideConfig {
    /// Recipes by display name.
    pub by_display_name: BTreeMap<String, Vec<IngredientConfig>>,
    /// Recipes by skin id.
    pub by_skin: BTreeMap<String, Vec<IngredientConfig>>,
    /// Recipes by item short name.
    pub by_item: BTreeMap<String, Vec<IngredientConfig>>,
}

/// One produced item of a custom recipe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IngredientConfig {
    /// Produced item short name.
    pub item: String,
    /// Yield per consumed unit, before efficiency.
    pub amount: f32,
    /// Skin of the produced stack.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub skin: SkinId,
    /// Display name of the produced stack.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(value: &SkinId) -> bool {
    *value == 0
}

impl IngredientConfig {
    fn from_spec(spec: &IngredientSpec, catalog: &ItemCatalog) -> Option<Self> {
        let definition = catalog.get(spec.item_id)?;
        Some(Self {
            item: definition.short_name.clone(),
            amount: spec.amount,
            skin: spec.skin,
            display_name: spec.display_name.clone(),
        })
    }
}

impl RecyclerConfig {
    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParse` if the document is malformed.
    pub fn from_toml_str(text: &str) -> SalvageResult<Self> {
        toml::from_str(text).map_err(|e| SalvageError::ConfigParse(e.to_string()))
    }

    /// Serializes the document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a value cannot be represented in TOML.
    pub fn to_toml_string(&self) -> SalvageResult<String> {
        toml::to_string_pretty(self).map_err(|e| SalvageError::InvalidConfig(e.to_string()))
    }

    /// Writes the document to a file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> SalvageResult<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Builds the engine's lookup tables against a catalog.
    ///
    /// Unknown short names and unparseable skin keys are logged and skipped.
    #[must_use]
    pub fn build_tables(&self, catalog: &ItemCatalog) -> LookupTables {
        LookupTables {
            overrides: self.build_overrides(catalog),
            restrictions: self.build_restrictions(catalog),
            multipliers: self.build_multipliers(catalog),
            consumption: self.build_consumption(catalog),
            scale_by_durability: self.efficiency.scale_by_durability,
        }
    }

    fn build_overrides(&self, catalog: &ItemCatalog) -> OverrideTable {
        let mut table = OverrideTable::new();
        let entries = table.entries_mut();
        let source = &self.override_output;

        for (name, ingredients) in &source.by_display_name {
            entries.insert_display_name(name, build_recipe(ingredients, catalog, name));
        }
        for (key, ingredients) in &source.by_skin {
            if let Some(skin) = parse_skin(key, "override_output.by_skin") {
                entries.insert_skin(skin, build_recipe(ingredients, catalog, key));
            }
        }
        for (short_name, ingredients) in &source.by_item {
            if let Some(item_id) = resolve_logged(catalog, short_name, "override_output.by_item") {
                entries.insert_item(item_id, build_recipe(ingredients, catalog, short_name));
            }
        }

        table
    }

    fn build_restrictions(&self, catalog: &ItemCatalog) -> RestrictionTable {
        let mut table = RestrictionTable::new();
        for name in &self.restrictions.display_names {
            table.restrict_display_name(name);
        }
        for &skin in &self.restrictions.skins {
            table.restrict_skin(skin);
        }
        for short_name in &self.restrictions.items {
            if let Some(item_id) = resolve_logged(catalog, short_name, "restrictions.items") {
                table.restrict_item(item_id);
            }
        }
        table
    }

    fn build_multipliers(&self, catalog: &ItemCatalog) -> OutputMultiplierTable {
        let mut table = OutputMultiplierTable::new();
        for (short_name, &multiplier) in &self.output_multipliers {
            if let Some(item_id) = resolve_logged(catalog, short_name, "output_multipliers") {
                table
                    .entries_mut()
                    .insert_item(item_id, non_negative(multiplier, short_name));
            }
        }
        table
    }

    fn build_consumption(&self, catalog: &ItemCatalog) -> ConsumptionTable {
        let efficiency = &self.efficiency;
        let mut table = ConsumptionTable::new(non_negative(
            efficiency.default_percent,
            "efficiency.default_percent",
        ));
        let entries = table.entries_mut();

        for (name, &percent) in &efficiency.percent_by_display_name {
            entries.insert_display_name(name, non_negative(percent, name));
        }
        for (key, &percent) in &efficiency.percent_by_skin {
            if let Some(skin) = parse_skin(key, "efficiency.percent_by_skin") {
                entries.insert_skin(skin, non_negative(percent, key));
            }
        }
        for (short_name, &percent) in &efficiency.percent_by_item {
            if let Some(item_id) = resolve_logged(catalog, short_name, "efficiency.percent_by_item") {
                entries.insert_item(item_id, non_negative(percent, short_name));
            }
        }

        table
    }
}

fn resolve_logged(catalog: &ItemCatalog, short_name: &str, section: &str) -> Option<ItemId> {
    match catalog.resolve(short_name) {
        Ok(id) => Some(id),
        Err(err) => {
            tracing::warn!("Skipping {} entry: {}", section, err);
            None
        }
    }
}

fn parse_skin(key: &str, section: &str) -> Option<SkinId> {
    match key.trim().parse::<SkinId>() {
        Ok(0) | Err(_) => {
            tracing::warn!("Skipping {} entry: invalid skin id {:?}", section, key);
            None
        }
        Ok(skin) => Some(skin),
    }
}

fn non_negative(value: f32, name: &str) -> f32 {
    let clamped = clamp_amount(value);
    if clamped != value {
        tracing::warn!("Clamped negative or invalid value {} for {} to {}", value, name, clamped);
    }
    clamped
}

fn build_recipe(ingredients: &[IngredientConfig], catalog: &ItemCatalog, key: &str) -> Recipe {
    let specs = ingredients
        .iter()
        .filter_map(|ingredient| {
            let item_id = resolve_logged(catalog, &ingredient.item, key)?;
            let mut spec = IngredientSpec::new(item_id, ingredient.amount).with_skin(ingredient.skin);
            if let Some(name) = &ingredient.display_name {
                spec = spec.with_display_name(name.clone());
            }
            Some(spec)
        })
        .collect();
    Recipe::new(specs)
}

/// A parsed document and whether it is a fallback.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedConfig {
    /// The configuration in effect.
    pub config: RecyclerConfig,
    /// True if the persisted document was unusable and defaults were used.
    pub using_defaults: bool,
}

/// Loads configuration, degrading to defaults instead of failing.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Parses a document, falling back to defaults if malformed.
    #[must_use]
    pub fn load_str(text: &str) -> LoadedConfig {
        match RecyclerConfig::from_toml_str(text) {
            Ok(config) => LoadedConfig {
                config,
                using_defaults: false,
            },
            Err(err) => {
                tracing::warn!("Configuration is invalid, using defaults: {}", err);
                LoadedConfig {
                    config: RecyclerConfig::default(),
                    using_defaults: true,
                }
            }
        }
    }

    /// Loads a file. A missing file yields defaults that may be saved;
    /// an unreadable or malformed one yields defaults flagged as such.
    #[must_use]
    pub fn load_path(path: impl AsRef<Path>) -> LoadedConfig {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::load_str(&text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No configuration at {}, using defaults", path.display());
                LoadedConfig {
                    config: RecyclerConfig::default(),
                    using_defaults: false,
                }
            }
            Err(err) => {
                tracing::warn!("Failed to read {}, using defaults: {}", path.display(), err);
                LoadedConfig {
                    config: RecyclerConfig::default(),
                    using_defaults: true,
                }
            }
        }
    }
}

/// The configuration document together with the tables built from it.
#[derive(Clone, Debug)]
pub struct RecyclerSettings {
    config: RecyclerConfig,
    tables: LookupTables,
    using_defaults: bool,
}

impl RecyclerSettings {
    /// Builds settings from a loaded document.
    #[must_use]
    pub fn new(loaded: LoadedConfig, catalog: &ItemCatalog) -> Self {
        let tables = loaded.config.build_tables(catalog);
        Self {
            config: loaded.config,
            tables,
            using_defaults: loaded.using_defaults,
        }
    }

    /// The configuration document.
    #[must_use]
    pub const fn config(&self) -> &RecyclerConfig {
        &self.config
    }

    /// The built lookup tables.
    #[must_use]
    pub const fn tables(&self) -> &LookupTables {
        &self.tables
    }

    /// True if the document fell back to defaults.
    #[must_use]
    pub const fn using_defaults(&self) -> bool {
        self.using_defaults
    }

    /// Adds an override seeded from the item's vanilla recipe.
    ///
    /// The caller persists the document afterwards.
    ///
    /// # Errors
    ///
    /// - `UsingDefaults` if the document fell back to defaults
    /// - `OverrideExists` if the item already has an override
    /// - `InvalidConfig` if the item has no vanilla recipe
    pub fn add_override(&mut self, definition: &ItemDefinition, catalog: &ItemCatalog) -> SalvageResult<()> {
        self.ensure_mutable()?;
        if self.config.override_output.by_item.contains_key(&definition.short_name) {
            return Err(SalvageError::OverrideExists(definition.short_name.clone()));
        }
        let recipe = self.tables.overrides.add_override(definition, catalog)?;
        self.store_override(definition, &recipe, catalog);
        tracing::info!("Added recycle override for {}", definition.short_name);
        Ok(())
    }

    /// Reseeds an item's override from its vanilla recipe.
    ///
    /// The caller persists the document afterwards.
    ///
    /// # Errors
    ///
    /// - `UsingDefaults` if the document fell back to defaults
    /// - `InvalidConfig` if the item has no vanilla recipe
    pub fn reset_override(&mut self, definition: &ItemDefinition, catalog: &ItemCatalog) -> SalvageResult<()> {
        self.ensure_mutable()?;
        let recipe = self.tables.overrides.reset_override(definition, catalog)?;
        self.store_override(definition, &recipe, catalog);
        tracing::info!("Reset recycle override for {}", definition.short_name);
        Ok(())
    }

    /// Writes the document to a file.
    ///
    /// # Errors
    ///
    /// - `UsingDefaults` if the document fell back to defaults
    /// - `Io` if the file cannot be written
    pub fn save(&self, path: impl AsRef<Path>) -> SalvageResult<()> {
        self.ensure_mutable()?;
        self.config.save(path)
    }

    fn ensure_mutable(&self) -> SalvageResult<()> {
        if self.using_defaults {
            return Err(SalvageError::UsingDefaults);
        }
        Ok(())
    }

    fn store_override(&mut self, definition: &ItemDefinition, recipe: &Recipe, catalog: &ItemCatalog) {
        let ingredients = recipe
            .ingredients
            .iter()
            .filter_map(|spec| IngredientConfig::from_spec(spec, catalog))
            .collect();
        self.config
            .override_output
            .by_item
            .insert(definition.short_name.clone(), ingredients);
    }
}

impl Default for RecyclerSettings {
    fn default() -> Self {
        Self {
            config: RecyclerConfig::default(),
            tables: LookupTables::default(),
            using_defaults: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Blueprint, BlueprintIngredient, ItemIdentity, ItemStack};

    const SCRAP: ItemId = 1;
    const FRAGMENTS: ItemId = 2;
    const RIFLE: ItemId = 3;

    fn catalog() -> ItemCatalog {
        ItemCatalog::from_definitions([
            ItemDefinition::new(SCRAP, "scrap", 1000),
            ItemDefinition::new(FRAGMENTS, "metal.fragments", 1000),
            ItemDefinition::new(RIFLE, "rifle.ak", 1)
                .with_durability()
                .with_blueprint(Blueprint {
                    ingredients: vec![BlueprintIngredient {
                        item_id: FRAGMENTS,
                        amount: 50.0,
                    }],
                    amount_to_create: 1,
                    scrap_from_recycle: 25,
                }),
        ])
    }

    const DOCUMENT: &str = r#"
        rng_seed = 7

        [speed]
        default_recycle_time = 2.5
        tiers = [
            { permission = "salvage.speed.vip", multiplier = 0.5 },
        ]

        [speed.item_recycle_times]
        "rifle.ak" = 10.0

        [efficiency]
        default_percent = 25.0
        percent_by_skin = { "123" = 50.0, "abc" = 1.0 }

        [efficiency.percent_by_item]
        "metal.fragments" = 100.0
        "does.not.exist" = 5.0

        [restrictions]
        items = ["scrap", "unknown.item"]
        display_names = ["Keepsake"]

        [output_multipliers]
        "metal.fragments" = -2.0

        [[override_output.by_item."rifle.ak"]]
        item = "metal.fragments"
        amount = 0.3

        [[override_output.by_item."rifle.ak"]]
        item = "ghost"
        amount = 1.0
    "#;

    #[test]
    fn test_parse_and_build() {
        let catalog = catalog();
        let config = RecyclerConfig::from_toml_str(DOCUMENT).unwrap();
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.speed.tiers.len(), 1);

        let tables = config.build_tables(&catalog);

        // Unknown ingredient dropped, known one kept.
        let recipe = tables.overrides.resolve(ItemIdentity::of_type(RIFLE)).unwrap();
        assert_eq!(recipe.ingredients, vec![IngredientSpec::new(FRAGMENTS, 0.3)]);

        assert!(tables.restrictions.is_restricted(ItemIdentity::of_type(SCRAP)));
        let keepsake = ItemStack::new(FRAGMENTS, 1).with_display_name("KEEPSAKE");
        assert!(tables.restrictions.is_restricted(keepsake.identity()));

        // Negative multiplier clamped.
        assert_eq!(tables.multipliers.multiplier(ItemIdentity::of_type(FRAGMENTS)), 0.0);

        assert_eq!(tables.consumption.default_percent(), 25.0);
        assert_eq!(tables.consumption.percent(ItemIdentity::of_type(FRAGMENTS)), 100.0);
        let skinned = ItemStack::new(RIFLE, 1).with_skin(123);
        assert_eq!(tables.consumption.percent(skinned.identity()), 50.0);
    }

    #[test]
    fn test_malformed_falls_back_to_defaults() {
        let loaded = ConfigLoader::load_str("[speed\ndefault_recycle_time = ");
        assert!(loaded.using_defaults);
        assert_eq!(loaded.config, RecyclerConfig::default());

        let catalog = catalog();
        let mut settings = RecyclerSettings::new(loaded, &catalog);
        let result = settings.add_override(catalog.get(RIFLE).unwrap(), &catalog);
        assert_eq!(result, Err(SalvageError::UsingDefaults));
        assert!(settings.tables().overrides.is_empty());
    }

    #[test]
    fn test_missing_file_is_not_flagged() {
        let path = std::env::temp_dir().join("salvage_config_that_does_not_exist.toml");
        let loaded = ConfigLoader::load_path(&path);
        assert!(!loaded.using_defaults);
    }

    #[test]
    fn test_add_override_persists_round_trip() {
        let catalog = catalog();
        let mut settings = RecyclerSettings::new(ConfigLoader::load_str(""), &catalog);
        let rifle = catalog.get(RIFLE).unwrap();

        settings.add_override(rifle, &catalog).unwrap();
        assert_eq!(
            settings.add_override(rifle, &catalog),
            Err(SalvageError::OverrideExists("rifle.ak".to_string()))
        );

        let text = settings.config().to_toml_string().unwrap();
        let reparsed = RecyclerConfig::from_toml_str(&text).unwrap();
        let tables = reparsed.build_tables(&catalog);
        assert_eq!(
            tables.overrides.resolve(ItemIdentity::of_type(RIFLE)),
            settings.tables().overrides.resolve(ItemIdentity::of_type(RIFLE)),
        );
    }

    #[test]
    fn test_reset_override_replaces_custom_entry() {
        let catalog = catalog();
        let loaded = ConfigLoader::load_str(DOCUMENT);
        let mut settings = RecyclerSettings::new(loaded, &catalog);

        settings.reset_override(catalog.get(RIFLE).unwrap(), &catalog).unwrap();
        let entry = &settings.config().override_output.by_item["rifle.ak"];
        assert_eq!(entry.len(), 2);
        assert_eq!(entry[0].item, "scrap");
        assert_eq!(entry[1].amount, 50.0);
    }
}
