//! # Item Model
//!
//! Item definitions, blueprints and the stacks that move through a
//! recycler. The host world owns the real item registry; the
//! [`ItemCatalog`] is the read-only view of it the engine needs.
//!
//! ## Identity
//!
//! Every lookup table resolves a stack by [`ItemIdentity`] with a fixed
//! priority: display name (case-insensitive), then skin (nonzero only),
//! then item type.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{SalvageError, SalvageResult};

/// Unique identifier for an item type.
pub type ItemId = i32;

/// Skin identifier. Zero means "no skin".
pub type SkinId = u64;

/// Short name of the byproduct every vanilla recycle yields.
pub const BYPRODUCT_SHORT_NAME: &str = "scrap";

/// One ingredient of a crafting blueprint.
#[derive(Clone, Debug, PartialEq)]
pub struct BlueprintIngredient {
    /// The ingredient item type.
    pub item_id: ItemId,
    /// Amount required to craft one batch.
    pub amount: f32,
}

/// The crafting blueprint an item is recycled back into.
#[derive(Clone, Debug, PartialEq)]
pub struct Blueprint {
    /// Ingredients of one crafting batch.
    pub ingredients: Vec<BlueprintIngredient>,
    /// Items produced per crafting batch; divides recycle yields.
    pub amount_to_create: u32,
    /// Byproduct units returned per recycled item.
    pub scrap_from_recycle: u32,
}

/// An item type definition.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemDefinition {
    /// Unique identifier.
    pub id: ItemId,
    /// Canonical short identity, used to key configuration entries.
    pub short_name: String,
    /// Maximum stack size for this item type.
    pub max_stack: u32,
    /// Whether stacks of this item track a durability fraction.
    pub has_durability: bool,
    /// Vanilla recipe, if the item can be recycled at all.
    pub blueprint: Option<Blueprint>,
}

impl ItemDefinition {
    /// Creates a definition without a blueprint.
    #[must_use]
    pub fn new(id: ItemId, short_name: impl Into<String>, max_stack: u32) -> Self {
        Self {
            id,
            short_name: short_name.into(),
            max_stack: max_stack.max(1),
            has_durability: false,
            blueprint: None,
        }
    }

    /// Marks the item as durability-tracking.
    #[must_use]
    pub fn with_durability(mut self) -> Self {
        self.has_durability = true;
        self
    }

    /// Sets the vanilla blueprint.
    #[must_use]
    pub fn with_blueprint(mut self, blueprint: Blueprint) -> Self {
        self.blueprint = Some(blueprint);
        self
    }
}

/// Read-only registry of item definitions.
#[derive(Clone, Debug, Default)]
pub struct ItemCatalog {
    by_id: HashMap<ItemId, ItemDefinition>,
    by_short_name: HashMap<String, ItemId>,
}

impl ItemCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from definitions. Later duplicates replace earlier ones.
    #[must_use]
    pub fn from_definitions(definitions: impl IntoIterator<Item = ItemDefinition>) -> Self {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.insert(definition);
        }
        catalog
    }

    /// Registers a definition.
    pub fn insert(&mut self, definition: ItemDefinition) {
        self.by_short_name
            .insert(definition.short_name.clone(), definition.id);
        self.by_id.insert(definition.id, definition);
    }

    /// Looks up a definition by id.
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&ItemDefinition> {
        self.by_id.get(&id)
    }

    /// Looks up a definition by short name.
    #[must_use]
    pub fn find(&self, short_name: &str) -> Option<&ItemDefinition> {
        self.by_short_name
            .get(short_name)
            .and_then(|id| self.by_id.get(id))
    }

    /// Resolves a short name to an id.
    ///
    /// # Errors
    ///
    /// Returns `UnknownItem` if no item has that short name.
    pub fn resolve(&self, short_name: &str) -> SalvageResult<ItemId> {
        self.by_short_name
            .get(short_name)
            .copied()
            .ok_or_else(|| SalvageError::UnknownItem(short_name.to_string()))
    }

    /// Maximum stack size for an item, or 1 for unknown items.
    #[must_use]
    pub fn max_stack(&self, id: ItemId) -> u32 {
        self.by_id.get(&id).map_or(1, |d| d.max_stack)
    }

    /// The byproduct item, if the catalog defines one.
    #[must_use]
    pub fn byproduct(&self) -> Option<&ItemDefinition> {
        self.find(BYPRODUCT_SHORT_NAME)
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Parses a catalog from a TOML document.
    ///
    /// Blueprint ingredients naming unknown items are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParse` if the document is malformed.
    pub fn from_toml_str(text: &str) -> SalvageResult<Self> {
        let file: CatalogFile =
            toml::from_str(text).map_err(|e| SalvageError::ConfigParse(e.to_string()))?;

        let ids: HashMap<&str, ItemId> = file
            .items
            .iter()
            .map(|entry| (entry.short_name.as_str(), entry.id))
            .collect();

        let mut catalog = Self::new();
        for entry in &file.items {
            let blueprint = entry.blueprint.as_ref().map(|bp| Blueprint {
                ingredients: bp
                    .ingredients
                    .iter()
                    .filter_map(|ing| match ids.get(ing.item.as_str()) {
                        Some(&item_id) => Some(BlueprintIngredient {
                            item_id,
                            amount: ing.amount.max(0.0),
                        }),
                        None => {
                            tracing::warn!(
                                "Blueprint for {} references unknown item {}; skipping",
                                entry.short_name,
                                ing.item
                            );
                            None
                        }
                    })
                    .collect(),
                amount_to_create: bp.amount_to_create.max(1),
                scrap_from_recycle: bp.scrap_from_recycle,
            });

            catalog.insert(ItemDefinition {
                id: entry.id,
                short_name: entry.short_name.clone(),
                max_stack: entry.max_stack.max(1),
                has_durability: entry.has_durability,
                blueprint,
            });
        }

        Ok(catalog)
    }

    /// Loads a catalog from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `ConfigParse` if malformed.
    pub fn from_toml_path(path: impl AsRef<Path>) -> SalvageResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    items: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct CatalogEntry {
    id: ItemId,
    short_name: String,
    #[serde(default = "default_max_stack")]
    max_stack: u32,
    #[serde(default)]
    has_durability: bool,
    blueprint: Option<BlueprintEntry>,
}

#[derive(Deserialize)]
struct BlueprintEntry {
    #[serde(default)]
    ingredients: Vec<BlueprintIngredientEntry>,
    #[serde(default = "default_amount_to_create")]
    amount_to_create: u32,
    #[serde(default)]
    scrap_from_recycle: u32,
}

#[derive(Deserialize)]
struct BlueprintIngredientEntry {
    item: String,
    amount: f32,
}

const fn default_max_stack() -> u32 {
    1
}

const fn default_amount_to_create() -> u32 {
    1
}

/// A stack of items in a device slot.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemStack {
    /// The item type.
    pub item_id: ItemId,
    /// Number of items in this stack.
    pub amount: u32,
    /// Remaining durability in `[0, 1]`, for durability-tracking items.
    pub condition: Option<f32>,
    /// Skin applied to the stack, or 0.
    pub skin: SkinId,
    /// Custom display name, if renamed.
    pub display_name: Option<String>,
}

impl ItemStack {
    /// Creates a plain stack.
    #[inline]
    #[must_use]
    pub const fn new(item_id: ItemId, amount: u32) -> Self {
        Self {
            item_id,
            amount,
            condition: None,
            skin: 0,
            display_name: None,
        }
    }

    /// Sets the durability fraction, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_condition(mut self, condition: f32) -> Self {
        self.condition = Some(condition.clamp(0.0, 1.0));
        self
    }

    /// Sets the skin.
    #[must_use]
    pub const fn with_skin(mut self, skin: SkinId) -> Self {
        self.skin = skin;
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Returns true if the stack holds nothing.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.amount == 0
    }

    /// Returns true if another stack can merge into this one.
    #[must_use]
    pub fn stacks_with(&self, other: &Self) -> bool {
        self.item_id == other.item_id
            && self.skin == other.skin
            && self.display_name == other.display_name
            && self.condition.is_none()
            && other.condition.is_none()
    }

    /// The lookup identity of this stack.
    #[must_use]
    pub fn identity(&self) -> ItemIdentity<'_> {
        ItemIdentity {
            display_name: self.display_name.as_deref(),
            skin: self.skin,
            item_id: self.item_id,
        }
    }
}

/// The three keys a stack is resolved by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemIdentity<'a> {
    /// Custom display name, matched case-insensitively.
    pub display_name: Option<&'a str>,
    /// Skin id; only nonzero values participate.
    pub skin: SkinId,
    /// Item type.
    pub item_id: ItemId,
}

impl ItemIdentity<'static> {
    /// Identity of an unnamed, unskinned item type.
    #[must_use]
    pub const fn of_type(item_id: ItemId) -> Self {
        Self {
            display_name: None,
            skin: 0,
            item_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
        [[items]]
        id = 1
        short_name = "scrap"
        max_stack = 1000

        [[items]]
        id = 2
        short_name = "metal.fragments"
        max_stack = 1000

        [[items]]
        id = 3
        short_name = "rifle.ak"
        has_durability = true

        [items.blueprint]
        scrap_from_recycle = 25
        ingredients = [
            { item = "metal.fragments", amount = 50.0 },
            { item = "wood", amount = 200.0 },
        ]
    "#;

    #[test]
    fn test_catalog_from_toml() {
        let catalog = ItemCatalog::from_toml_str(CATALOG).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.byproduct().map(|d| d.id), Some(1));

        let rifle = catalog.find("rifle.ak").unwrap();
        assert!(rifle.has_durability);
        assert_eq!(rifle.max_stack, 1);

        // "wood" is not in the catalog, so only one ingredient survives.
        let blueprint = rifle.blueprint.as_ref().unwrap();
        assert_eq!(blueprint.ingredients.len(), 1);
        assert_eq!(blueprint.ingredients[0].item_id, 2);
        assert_eq!(blueprint.amount_to_create, 1);
    }

    #[test]
    fn test_catalog_rejects_malformed() {
        let result = ItemCatalog::from_toml_str("[[items]]\nid = \"nope\"");
        assert!(matches!(result, Err(SalvageError::ConfigParse(_))));
    }

    #[test]
    fn test_resolve_unknown() {
        let catalog = ItemCatalog::new();
        assert_eq!(
            catalog.resolve("stones"),
            Err(SalvageError::UnknownItem("stones".to_string()))
        );
        assert_eq!(catalog.max_stack(42), 1);
    }

    #[test]
    fn test_stacks_with() {
        let plain = ItemStack::new(2, 10);
        assert!(plain.stacks_with(&ItemStack::new(2, 5)));
        assert!(!plain.stacks_with(&ItemStack::new(2, 5).with_skin(9)));
        assert!(!plain.stacks_with(&ItemStack::new(2, 5).with_condition(0.5)));
    }
}
