//! # Busplan
//!
//! A command-line tool and library for planning mainbus-style production in
//! crafting-chain games such as Factorio.
//!
//! Given target items and rates, busplan works out which intermediates must
//! be made, by which machines and how many of them, down to raw materials or
//! to the "mainbus" (trunk) items that are supplied from outside. Planning
//! runs in three stages:
//!
//! 1. **Tree building**: each target is resolved recursively to the recipes
//!    producing it and its ingredients.
//! 2. **Subdivision**: trees are cut at trunk items into independent
//!    sub-trees, each demanded at the rate its consumers need; sub-trees
//!    demanded from several places sum their rates.
//! 3. **Machine planning**: every node gets a machine (preferences first,
//!    then the highest compatible level) and a machine count.
//!
//! ## Modules
//!
//! - [`models`] - Recipes, machines, production trees, forests and plan results
//! - [`data`] - Catalog and request loading from JSON
//! - [`tree`] - Recipe-dependency tree construction
//! - [`subdivide`] - Splitting trees at trunk items
//! - [`planner`] - Machine selection, machine counts and the request driver
//! - [`display`] - Text and CSV output
//! - [`error`] - Error types
//!
//! ## Example Usage
//!
//! ```
//! use busplan::data::Catalog;
//! use busplan::models::ProductionRequest;
//! use busplan::planner::plan_request;
//!
//! let catalog = Catalog::bundled().unwrap();
//! let request = ProductionRequest::from_json_str(r#"{
//!     "Produce": [{"Produce": "iron-gear-wheel", "Amount": 5}],
//!     "Mainbus": ["iron-plate"]
//! }"#).unwrap();
//!
//! let batch = plan_request(&catalog, &request);
//! assert!(batch.is_complete());
//! assert_eq!(batch.section("iron-plate").unwrap().rate, 10.0);
//! ```

pub mod data;
pub mod display;
pub mod error;
pub mod models;
pub mod planner;
pub mod subdivide;
pub mod tree;
pub mod wasm;
