//! Error types for busplan.
//!
//! [`LoadError`] covers reading and validating the catalog and request
//! documents. [`PlanError`] covers the tree builder, subdivider and machine
//! planner; every variant names the item, recipe or machine at fault.

use std::path::PathBuf;

/// Errors raised while loading or validating input documents.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or does not match the expected shape.
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("recipe '{recipe}' declares no outputs")]
    NoOutputs { recipe: String },

    #[error("recipe '{recipe}' declares no production category")]
    NoCategory { recipe: String },

    /// An output or ingredient quantity is zero, negative or not finite.
    #[error("recipe '{recipe}' has invalid quantity {quantity} for '{item}'")]
    InvalidQuantity {
        recipe: String,
        item: String,
        quantity: f64,
    },

    #[error("recipe '{recipe}' has invalid production time {time}")]
    InvalidProductionTime { recipe: String, time: f64 },

    /// A recipe lists the same item as ingredient and output.
    #[error("recipe '{recipe}' both consumes and produces '{item}'")]
    SelfConsuming { recipe: String, item: String },

    #[error("recipe '{recipe}' names primary output '{item}' which it does not produce")]
    UnknownPrimaryOutput { recipe: String, item: String },

    #[error("machine '{machine}' has invalid speed modifier {speed}")]
    InvalidSpeed { machine: String, speed: f64 },

    /// Two recipes produce the same item and alternates are not allowed.
    #[error("item '{item}' is produced by both '{first}' and '{second}'")]
    DuplicateProducer {
        item: String,
        first: String,
        second: String,
    },

    #[error("requested amount {amount} for '{item}' must be positive")]
    InvalidAmount { item: String, amount: f64 },
}

/// Errors raised while building, subdividing or planning production trees.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// A requested target has no producing recipe.
    #[error("no recipe produces requested item '{item}'")]
    UnknownTargetItem { item: String },

    /// An ingredient transitively requires itself. `cycle` starts and ends
    /// with the repeated item.
    #[error("cyclic recipe chain: {}", .cycle.join(" -> "))]
    CyclicRecipe { cycle: Vec<String> },

    #[error("no compatible machine for recipe '{recipe}' (categories: {})", .categories.join(", "))]
    NoCompatibleMachine {
        recipe: String,
        categories: Vec<String>,
    },

    /// A preferred machine matches the recipe's category but cannot run it.
    #[error("preferred machine '{machine}' cannot run recipe '{recipe}': {reason}")]
    IncompatiblePreferredMachine {
        machine: String,
        recipe: String,
        reason: String,
    },

    /// A parent consumes several outputs of a child recipe and the child does
    /// not say which one it supplies.
    #[error("recipe '{parent}' consumes several outputs of '{child}': {}", .candidates.join(", "))]
    AmbiguousTargetedIngredient {
        parent: String,
        child: String,
        candidates: Vec<String>,
    },

    /// A child node supplies nothing its parent consumes.
    #[error("recipe '{parent}' consumes none of the outputs of '{child}'")]
    UnlinkedChild { parent: String, child: String },

    #[error("recipe '{recipe}' does not produce '{item}'")]
    OutputNotProduced { recipe: String, item: String },

    /// The request names a recipe for an item that cannot be used for it.
    #[error("recipe choice '{recipe}' for '{item}' is invalid: {reason}")]
    InvalidRecipeChoice {
        item: String,
        recipe: String,
        reason: &'static str,
    },
}
