//! # Salvage Error Types
//!
//! All errors that can occur while loading balance data or administering
//! the lookup tables. Conversion itself never fails: saturation and
//! unhandled items are reported through [`crate::engine::ConversionOutcome`].

use thiserror::Error;

use crate::item::ItemId;

/// Errors that can occur in the salvage economy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SalvageError {
    /// A configuration entry referenced an item the catalog does not know.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// A configuration value was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The persisted configuration could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Reading or writing the configuration file failed.
    #[error("configuration i/o failed: {0}")]
    Io(String),

    /// An override already exists for the item.
    #[error("an override already exists for {0}")]
    OverrideExists(String),

    /// The configuration fell back to defaults and must not be mutated.
    #[error("configuration is using defaults; fix the file before making changes")]
    UsingDefaults,

    /// The output container has no room for a stack.
    #[error("output full: could not place {amount} of item {item_id}")]
    OutputFull {
        /// The item that did not fit.
        item_id: ItemId,
        /// The amount that did not fit.
        amount: u32,
    },
}

impl From<std::io::Error> for SalvageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for salvage operations.
pub type SalvageResult<T> = Result<T, SalvageError>;
