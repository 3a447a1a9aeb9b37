//! # SALVAGE Economy
//!
//! Conversion rules for recycler devices: what a consumed item turns into,
//! how much of it, and under which restrictions.
//!
//! ## Design Principles
//!
//! 1. **Host behind traits** - devices are reached through [`InputSource`],
//!    [`OutputSink`] and [`RecyclerDevice`]; no host entity types leak in
//! 2. **Fixed identity priority** - display name, then skin, then item type
//! 3. **Fair rounding** - fractional yields keep their expectation
//! 4. **External configuration** - all balance data in TOML files
//!
//! ## Threading
//!
//! Everything here runs on the host's single simulation thread. Lookup
//! tables are read-mostly and are swapped wholesale between ticks.
//!
//! ## Example
//!
//! ```rust,ignore
//! use salvage_economy::{ConfigLoader, ConversionEngine, ItemCatalog, RecyclerSettings};
//!
//! let catalog = Arc::new(ItemCatalog::from_toml_path("data/items.toml")?);
//! let settings = RecyclerSettings::new(ConfigLoader::load_path("data/recycler.toml"), &catalog);
//! let mut engine = ConversionEngine::new(
//!     Arc::clone(&catalog),
//!     settings.tables().clone(),
//!     HookRegistry::new(),
//!     ProbabilisticRounder::from_clock(),
//! );
//!
//! let outcome = engine.process_slot(&mut recycler, 0);
//! if outcome.saturated {
//!     // stop the device
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod container;
pub mod device;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod item;
pub mod lookup;
pub mod recipe;
pub mod rounder;

pub use config::{ConfigLoader, LoadedConfig, RecyclerConfig, RecyclerSettings, SpeedConfig};
pub use container::SlotContainer;
pub use device::{Actor, DeviceEffect, DeviceId, InputSource, OutputSink, PermissionSet, RecyclerDevice, SimDevice};
pub use engine::{ConversionEngine, ConversionOutcome, Disposition};
pub use error::{SalvageError, SalvageResult};
pub use hooks::{HookRegistry, HookResult};
pub use item::{Blueprint, BlueprintIngredient, ItemCatalog, ItemDefinition, ItemId, ItemIdentity, ItemStack, SkinId};
pub use lookup::{LookupTables, OutputMultiplierTable, OverrideTable, RestrictionTable};
pub use recipe::{IngredientSpec, Recipe};
pub use rounder::ProbabilisticRounder;
