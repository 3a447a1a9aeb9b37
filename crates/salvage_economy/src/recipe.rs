//! # Recycle Recipes
//!
//! A recipe is the ordered list of items produced from one consumed unit of
//! an input. Vanilla recipes are derived from the item's crafting
//! blueprint; override recipes come from configuration and replace them.

use crate::item::{ItemCatalog, ItemDefinition, ItemId, ItemStack, SkinId};

/// One produced item of a recipe.
#[derive(Clone, Debug, PartialEq)]
pub struct IngredientSpec {
    /// The produced item type.
    pub item_id: ItemId,
    /// Yield per consumed unit. Never negative.
    pub amount: f32,
    /// Skin applied to the produced stack, or 0.
    pub skin: SkinId,
    /// Display name applied to the produced stack.
    pub display_name: Option<String>,
}

impl IngredientSpec {
    /// Creates an ingredient, clamping `amount` to `>= 0`.
    #[must_use]
    pub fn new(item_id: ItemId, amount: f32) -> Self {
        Self {
            item_id,
            amount: clamp_amount(amount),
            skin: 0,
            display_name: None,
        }
    }

    /// Sets the skin of the produced stack.
    #[must_use]
    pub const fn with_skin(mut self, skin: SkinId) -> Self {
        self.skin = skin;
        self
    }

    /// Sets the display name of the produced stack.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Builds a produced stack of this ingredient.
    #[must_use]
    pub fn stack(&self, amount: u32) -> ItemStack {
        ItemStack {
            item_id: self.item_id,
            amount,
            condition: None,
            skin: self.skin,
            display_name: self.display_name.clone(),
        }
    }
}

/// Clamps a configured yield to a finite non-negative value.
#[must_use]
pub fn clamp_amount(amount: f32) -> f32 {
    if amount.is_finite() {
        amount.max(0.0)
    } else {
        0.0
    }
}

/// Ordered outputs produced from one input item type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Recipe {
    /// Produced items, in output order.
    pub ingredients: Vec<IngredientSpec>,
}

impl Recipe {
    /// Creates a recipe from ingredients.
    #[must_use]
    pub fn new(ingredients: Vec<IngredientSpec>) -> Self {
        Self { ingredients }
    }

    /// Derives the default override recipe from an item's vanilla blueprint.
    ///
    /// Amounts are per consumed unit and before efficiency: the byproduct
    /// first, then each blueprint ingredient divided by the batch size.
    /// Returns `None` if the item has no blueprint.
    #[must_use]
    pub fn from_blueprint(definition: &ItemDefinition, catalog: &ItemCatalog) -> Option<Self> {
        let blueprint = definition.blueprint.as_ref()?;
        let divisor = blueprint.amount_to_create.max(1) as f32;

        let mut ingredients = Vec::with_capacity(blueprint.ingredients.len() + 1);
        if blueprint.scrap_from_recycle > 0 {
            if let Some(byproduct) = catalog.byproduct() {
                ingredients.push(IngredientSpec::new(
                    byproduct.id,
                    blueprint.scrap_from_recycle as f32,
                ));
            }
        }
        ingredients.extend(
            blueprint
                .ingredients
                .iter()
                .map(|ing| IngredientSpec::new(ing.item_id, ing.amount / divisor)),
        );

        Some(Self { ingredients })
    }
}
