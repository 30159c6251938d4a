//! Data loading functionality for busplan.
//!
//! This module turns the catalog document (`Recipes` and `Machines`) and the
//! request document (`Produce`, `Limit`, `Mainbus`, `Recipes`) into the
//! validated [`Catalog`] and [`ProductionRequest`] used by the planner.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::LoadError;
use crate::models::{
    CatalogFile, Machine, MachineRow, ProduceEntry, ProductionRequest, Recipe, RecipeRow,
    RequestFile,
};

/// The sample catalog shipped with the crate.
pub const BUNDLED_CATALOG: &str = include_str!("../data/factorio_items.json");

/// How the catalog treats several recipes producing the same item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProducerPolicy {
    /// Reject the catalog with [`LoadError::DuplicateProducer`].
    #[default]
    Unique,
    /// Keep all producers; the first declared one is the default choice.
    DeclarationOrder,
}

/// Immutable recipe and machine catalog.
///
/// Recipes and machines keep declaration order, which decides default
/// producers and machine tie-breaks.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    recipes: Vec<Recipe>,
    machines: Vec<Machine>,
    producers: HashMap<String, Vec<usize>>,
    machines_by_category: HashMap<String, Vec<usize>>,
}

impl Catalog {
    /// Validates recipes and machines and builds the lookup indexes.
    pub fn new(
        recipes: Vec<Recipe>,
        machines: Vec<Machine>,
        policy: ProducerPolicy,
    ) -> Result<Self, LoadError> {
        let mut producers: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, recipe) in recipes.iter().enumerate() {
            validate_recipe(recipe)?;
            for (item, _) in &recipe.outputs {
                let entry = producers.entry(item.clone()).or_default();
                if let (ProducerPolicy::Unique, Some(&first)) = (policy, entry.first()) {
                    return Err(LoadError::DuplicateProducer {
                        item: item.clone(),
                        first: recipes[first].name.clone(),
                        second: recipe.name.clone(),
                    });
                }
                entry.push(index);
            }
        }

        let mut machines_by_category: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, machine) in machines.iter().enumerate() {
            if !(machine.speed_modifier.is_finite() && machine.speed_modifier > 0.0) {
                return Err(LoadError::InvalidSpeed {
                    machine: machine.name.clone(),
                    speed: machine.speed_modifier,
                });
            }
            machines_by_category
                .entry(machine.category.clone())
                .or_default()
                .push(index);
        }

        debug!(
            recipes = recipes.len(),
            machines = machines.len(),
            "catalog loaded"
        );

        Ok(Catalog {
            recipes,
            machines,
            producers,
            machines_by_category,
        })
    }

    /// Converts a parsed catalog document.
    pub fn from_file(file: CatalogFile, policy: ProducerPolicy) -> Result<Self, LoadError> {
        let recipes = file
            .recipes
            .into_iter()
            .map(|(name, row)| recipe_from_row(name, row))
            .collect();
        let machines = file
            .machines
            .into_iter()
            .map(|(name, row)| machine_from_row(name, row))
            .collect();
        Catalog::new(recipes, machines, policy)
    }

    /// Parses and validates a catalog JSON document.
    ///
    /// # Example
    ///
    /// ```
    /// use busplan::data::{Catalog, ProducerPolicy};
    ///
    /// let catalog = Catalog::from_json_str(r#"{
    ///     "Recipes": {
    ///         "Iron plate": {
    ///             "Outputs": {"iron-plate": 1},
    ///             "Ingredients": {"iron-ore": 1},
    ///             "Origin": "smelting",
    ///             "Speed": 3.2
    ///         }
    ///     },
    ///     "Machines": {
    ///         "Stone furnace": {"Category": "smelting", "Speed": 1.0}
    ///     }
    /// }"#, ProducerPolicy::Unique).unwrap();
    ///
    /// assert_eq!(catalog.producer_of("iron-plate").unwrap().name, "Iron plate");
    /// assert!(catalog.producer_of("iron-ore").is_none());
    /// ```
    pub fn from_json_str(json: &str, policy: ProducerPolicy) -> Result<Self, LoadError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Catalog::from_file(file, policy)
    }

    /// The catalog compiled into the crate from `data/factorio_items.json`.
    pub fn bundled() -> Result<Self, LoadError> {
        Catalog::from_json_str(BUNDLED_CATALOG, ProducerPolicy::Unique)
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    /// Looks up a recipe by name.
    pub fn recipe(&self, name: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.name == name)
    }

    /// Looks up a machine by name.
    pub fn machine(&self, name: &str) -> Option<&Machine> {
        self.machines.iter().find(|m| m.name == name)
    }

    /// All recipes producing `item`, in declaration order.
    pub fn producers_of<'a>(&'a self, item: &str) -> impl Iterator<Item = &'a Recipe> + 'a {
        self.producers
            .get(item)
            .into_iter()
            .flatten()
            .map(move |&index| &self.recipes[index])
    }

    /// The first declared recipe producing `item`.
    pub fn producer_of(&self, item: &str) -> Option<&Recipe> {
        self.producers_of(item).next()
    }

    /// Machines of `category`, in declaration order.
    pub fn machines_for<'a>(&'a self, category: &str) -> impl Iterator<Item = &'a Machine> + 'a {
        self.machines_by_category
            .get(category)
            .into_iter()
            .flatten()
            .map(move |&index| &self.machines[index])
    }

    /// Every item some recipe produces, in declaration order.
    pub fn producible_items(&self) -> Vec<&str> {
        let mut items: Vec<&str> = Vec::new();
        for recipe in &self.recipes {
            for (item, _) in &recipe.outputs {
                if !items.contains(&item.as_str()) {
                    items.push(item.as_str());
                }
            }
        }
        items
    }
}

fn recipe_from_row(name: String, row: RecipeRow) -> Recipe {
    let primary_output = row
        .primary_output
        .or_else(|| row.outputs.first().map(|(item, _)| item.clone()))
        .unwrap_or_default();
    Recipe {
        name,
        outputs: row.outputs,
        ingredients: row.ingredients,
        categories: row.origin.into_vec(),
        production_time: row.production_time,
        involves_fluids: row.involves_fluids,
        primary_output,
    }
}

fn machine_from_row(name: String, row: MachineRow) -> Machine {
    Machine {
        name,
        category: row.category,
        speed_modifier: row.speed,
        level: row.level,
        max_ingredients: row.max_ingredients,
        fluid_capable: row.handles_fluids,
    }
}

fn validate_recipe(recipe: &Recipe) -> Result<(), LoadError> {
    if recipe.outputs.is_empty() {
        return Err(LoadError::NoOutputs {
            recipe: recipe.name.clone(),
        });
    }
    if recipe.categories.is_empty() {
        return Err(LoadError::NoCategory {
            recipe: recipe.name.clone(),
        });
    }
    if !(recipe.production_time.is_finite() && recipe.production_time > 0.0) {
        return Err(LoadError::InvalidProductionTime {
            recipe: recipe.name.clone(),
            time: recipe.production_time,
        });
    }
    for (item, quantity) in recipe.outputs.iter().chain(&recipe.ingredients) {
        if !(quantity.is_finite() && *quantity > 0.0) {
            return Err(LoadError::InvalidQuantity {
                recipe: recipe.name.clone(),
                item: item.clone(),
                quantity: *quantity,
            });
        }
    }
    if let Some((item, _)) = recipe.ingredients.iter().find(|(i, _)| recipe.produces(i)) {
        return Err(LoadError::SelfConsuming {
            recipe: recipe.name.clone(),
            item: item.clone(),
        });
    }
    if !recipe.produces(&recipe.primary_output) {
        return Err(LoadError::UnknownPrimaryOutput {
            recipe: recipe.name.clone(),
            item: recipe.primary_output.clone(),
        });
    }
    Ok(())
}

impl ProductionRequest {
    /// Converts a parsed request document, rejecting non-positive amounts.
    pub fn from_file(file: RequestFile) -> Result<Self, LoadError> {
        let mut targets = Vec::with_capacity(file.produce.len());
        for row in file.produce {
            if !(row.amount.is_finite() && row.amount > 0.0) {
                return Err(LoadError::InvalidAmount {
                    item: row.item,
                    amount: row.amount,
                });
            }
            targets.push(ProduceEntry {
                item: row.item,
                rate: row.amount,
            });
        }
        Ok(ProductionRequest {
            targets,
            trunk_items: file.mainbus.into_iter().collect(),
            machine_preferences: file.limit.into_iter().collect(),
            recipe_choices: file.recipes,
        })
    }

    /// Parses a request JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        let file: RequestFile = serde_json::from_str(json)?;
        ProductionRequest::from_file(file)
    }
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the catalog from a JSON file.
///
/// # Arguments
///
/// * `path` - Path to the catalog JSON (`Recipes` and `Machines`)
/// * `policy` - How to treat several recipes producing the same item
///
/// # Returns
///
/// The validated catalog, or a [`LoadError`] naming the file, recipe or
/// machine at fault.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use busplan::data::{load_catalog, ProducerPolicy};
///
/// let catalog = load_catalog(Path::new("data/factorio_items.json"), ProducerPolicy::Unique).unwrap();
/// println!("Loaded {} recipes", catalog.recipes().len());
/// ```
pub fn load_catalog(path: &Path, policy: ProducerPolicy) -> Result<Catalog, LoadError> {
    Catalog::from_json_str(&read_file(path)?, policy)
}

/// Loads a production request from a JSON file.
pub fn load_request(path: &Path) -> Result<ProductionRequest, LoadError> {
    ProductionRequest::from_json_str(&read_file(path)?)
}
