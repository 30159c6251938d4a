//! Data models and structures for busplan.
//!
//! This module contains the catalog entities (recipes and machines), the
//! production tree, requests, subdivided forests and plan results, plus the
//! serde structures mirroring the two JSON inputs.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// A named transformation consuming ingredients and producing outputs per cycle.
///
/// Outputs and ingredients keep their catalog declaration order.
///
/// # Example
///
/// ```
/// use busplan::models::Recipe;
///
/// let gear = Recipe {
///     name: "Iron gear wheel".to_string(),
///     outputs: vec![("iron-gear-wheel".to_string(), 1.0)],
///     ingredients: vec![("iron-plate".to_string(), 2.0)],
///     categories: vec!["crafting".to_string()],
///     production_time: 0.5,
///     involves_fluids: false,
///     primary_output: "iron-gear-wheel".to_string(),
/// };
///
/// assert_eq!(gear.primary_yield(), Some(1.0));
/// assert_eq!(gear.ingredient_quantity("iron-plate"), Some(2.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    /// Unique recipe name (e.g., "Iron gear wheel")
    pub name: String,
    /// Output item name and yield per cycle
    pub outputs: Vec<(String, f64)>,
    /// Ingredient item name and consumption per cycle
    pub ingredients: Vec<(String, f64)>,
    /// Production category tags; a machine runs the recipe if its category is one of these
    pub categories: Vec<String>,
    /// Seconds per cycle at speed modifier 1.0
    pub production_time: f64,
    /// Whether any ingredient or output is a fluid
    pub involves_fluids: bool,
    /// Output whose yield scales machine counts and trunk demand
    pub primary_output: String,
}

impl Recipe {
    /// Returns the per-cycle yield of `item`, if this recipe produces it.
    pub fn output_quantity(&self, item: &str) -> Option<f64> {
        self.outputs
            .iter()
            .find(|(name, _)| name == item)
            .map(|(_, qty)| *qty)
    }

    /// Returns the per-cycle consumption of `item`, if this recipe consumes it.
    pub fn ingredient_quantity(&self, item: &str) -> Option<f64> {
        self.ingredients
            .iter()
            .find(|(name, _)| name == item)
            .map(|(_, qty)| *qty)
    }

    /// Yield of the primary output per cycle.
    pub fn primary_yield(&self) -> Option<f64> {
        self.output_quantity(&self.primary_output)
    }

    pub fn produces(&self, item: &str) -> bool {
        self.outputs.iter().any(|(name, _)| name == item)
    }

    pub fn consumes(&self, item: &str) -> bool {
        self.ingredients.iter().any(|(name, _)| name == item)
    }
}

/// A production unit able to run recipes of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    /// Unique machine name (e.g., "Assembling machine 2")
    pub name: String,
    /// Production category this machine serves
    pub category: String,
    /// Multiplier applied to cycles per second
    pub speed_modifier: f64,
    /// Rank used to pick between compatible machines, higher wins
    pub level: u32,
    /// Maximum number of distinct ingredients (None = unbounded)
    pub max_ingredients: Option<usize>,
    /// Whether the machine can handle fluid recipes
    pub fluid_capable: bool,
}

/// Why a machine cannot run a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incompatibility {
    /// The machine's category is not among the recipe's categories.
    Category,
    /// The recipe has more distinct ingredients than the machine accepts.
    TooManyIngredients { max: usize, needed: usize },
    /// The recipe involves fluids and the machine cannot handle them.
    Fluids,
}

impl fmt::Display for Incompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Incompatibility::Category => write!(f, "category mismatch"),
            Incompatibility::TooManyIngredients { max, needed } => {
                write!(f, "accepts {} ingredients, recipe needs {}", max, needed)
            }
            Incompatibility::Fluids => write!(f, "cannot handle fluids"),
        }
    }
}

impl Machine {
    /// Returns the first reason this machine cannot run `recipe`, or `None`
    /// if it is compatible.
    pub fn incompatibility(&self, recipe: &Recipe) -> Option<Incompatibility> {
        if !recipe.categories.iter().any(|c| *c == self.category) {
            return Some(Incompatibility::Category);
        }
        if let Some(max) = self.max_ingredients {
            if recipe.ingredients.len() > max {
                return Some(Incompatibility::TooManyIngredients {
                    max,
                    needed: recipe.ingredients.len(),
                });
            }
        }
        if recipe.involves_fluids && !self.fluid_capable {
            return Some(Incompatibility::Fluids);
        }
        None
    }

    /// Checks category, ingredient count and fluid handling.
    pub fn is_recipe_compatible(&self, recipe: &Recipe) -> bool {
        self.incompatibility(recipe).is_none()
    }
}

/// One recipe placed in a production tree.
///
/// Every ingredient of `recipe` is either supplied by exactly one child or
/// listed once in `boundary_ingredients`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeNode<'c> {
    /// Recipe borrowed from the catalog
    pub recipe: &'c Recipe,
    /// Item this node supplies to its parent (or the requested item at the root)
    pub output: String,
    /// Nodes producing the ingredients that are made further down
    pub children: Vec<RecipeNode<'c>>,
    /// Ingredients supplied from outside this tree (raw materials or trunk items)
    pub boundary_ingredients: Vec<String>,
}

impl<'c> RecipeNode<'c> {
    /// Creates a childless node supplying the recipe's primary output.
    pub fn new(recipe: &'c Recipe) -> Self {
        Self::for_output(recipe, &recipe.primary_output)
    }

    /// Creates a childless node supplying `output`.
    pub fn for_output(recipe: &'c Recipe, output: &str) -> Self {
        RecipeNode {
            recipe,
            output: output.to_string(),
            children: Vec::new(),
            boundary_ingredients: Vec::new(),
        }
    }

    /// The recipe's primary output, which drives rate scaling.
    pub fn primary_output(&self) -> &str {
        &self.recipe.primary_output
    }

    /// Per-cycle yield of the recipe's primary output.
    pub fn primary_yield(&self) -> Result<f64, PlanError> {
        self.recipe
            .primary_yield()
            .ok_or_else(|| PlanError::OutputNotProduced {
                recipe: self.recipe.name.clone(),
                item: self.recipe.primary_output.clone(),
            })
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this tree, including the root.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(RecipeNode::node_count).sum::<usize>()
    }

    /// Length of the longest root-to-leaf path, counted in nodes.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(RecipeNode::depth).max().unwrap_or(0)
    }

    /// Finds the first node (pre-order) supplying `item`.
    pub fn find(&self, item: &str) -> Option<&RecipeNode<'c>> {
        if self.output == item {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(item))
    }

    /// All boundary ingredients of the tree, deduplicated, in pre-order.
    pub fn boundary_items(&self) -> Vec<String> {
        let mut items = Vec::new();
        self.collect_boundary(&mut items);
        items
    }

    fn collect_boundary(&self, items: &mut Vec<String>) {
        for item in &self.boundary_ingredients {
            if !items.contains(item) {
                items.push(item.clone());
            }
        }
        for child in &self.children {
            child.collect_boundary(items);
        }
    }
}

/// A requested target item and its rate in items per second.
#[derive(Debug, Clone, PartialEq)]
pub struct ProduceEntry {
    pub item: String,
    pub rate: f64,
}

/// Everything a planning run needs besides the catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionRequest {
    /// Items to produce, in request order
    pub targets: Vec<ProduceEntry>,
    /// Items supplied externally by the main bus
    pub trunk_items: HashSet<String>,
    /// Machines that override automatic selection when compatible
    pub machine_preferences: HashSet<String>,
    /// Explicit recipe per item, for items with alternate producers
    pub recipe_choices: HashMap<String, String>,
}

/// One independent production sub-tree and the rate demanded of its root.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestEntry<'c> {
    /// Item produced by the root of `tree`
    pub root: String,
    /// Accumulated demand for `root`
    pub rate: f64,
    pub tree: RecipeNode<'c>,
}

/// Sub-trees keyed by root item, in first-seen order.
///
/// Inserting a root that is already present adds its rate to the existing
/// entry and keeps the first tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubdividedForest<'c> {
    entries: Vec<ForestEntry<'c>>,
}

impl<'c> SubdividedForest<'c> {
    pub fn new() -> Self {
        SubdividedForest { entries: Vec::new() }
    }

    /// Adds an entry, summing rates when the root already exists.
    pub fn accumulate(&mut self, entry: ForestEntry<'c>) {
        match self.entries.iter_mut().find(|e| e.root == entry.root) {
            Some(existing) => existing.rate += entry.rate,
            None => self.entries.push(entry),
        }
    }

    /// Folds every entry of `other` into this forest.
    pub fn merge(&mut self, other: SubdividedForest<'c>) {
        for entry in other.entries {
            self.accumulate(entry);
        }
    }

    pub fn get(&self, root: &str) -> Option<&ForestEntry<'c>> {
        self.entries.iter().find(|e| e.root == root)
    }

    pub fn rate_of(&self, root: &str) -> Option<f64> {
        self.get(root).map(|e| e.rate)
    }

    pub fn roots(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.root.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ForestEntry<'c>> {
        self.entries.iter()
    }
}

impl<'c> IntoIterator for SubdividedForest<'c> {
    type Item = ForestEntry<'c>;
    type IntoIter = std::vec::IntoIter<ForestEntry<'c>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Consumption of one ingredient at a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientFlow {
    pub item: String,
    /// Items per second
    pub rate: f64,
}

/// Machine choice and material flow for one tree node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePlan {
    /// Item produced by this node
    pub output: String,
    /// Recipe used
    pub recipe: String,
    /// Requested output rate
    pub rate: f64,
    /// Chosen machine name
    pub machine: String,
    /// Machines needed before rounding
    pub exact_count: f64,
    /// Machines needed, rounded up
    pub machine_count: u64,
    /// Ingredient consumption, in recipe declaration order
    pub ingredients: Vec<IngredientFlow>,
    /// Ingredients supplied from outside this sub-tree
    pub boundary_ingredients: Vec<String>,
    /// Distance from the sub-tree root
    pub depth: usize,
}

/// Bill of machines and material flow for one sub-tree, in pre-order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanResult {
    pub nodes: Vec<NodePlan>,
}

impl PlanResult {
    /// Rounded machine counts summed per machine, in first-seen order.
    pub fn total_machines(&self) -> Vec<(String, u64)> {
        let mut totals: Vec<(String, u64)> = Vec::new();
        for node in &self.nodes {
            match totals.iter_mut().find(|(name, _)| *name == node.machine) {
                Some((_, count)) => *count += node.machine_count,
                None => totals.push((node.machine.clone(), node.machine_count)),
            }
        }
        totals
    }

    /// Boundary ingredient rates summed per item, in first-seen order.
    pub fn raw_inputs(&self) -> Vec<(String, f64)> {
        let mut inputs: Vec<(String, f64)> = Vec::new();
        for node in &self.nodes {
            for flow in &node.ingredients {
                if !node.boundary_ingredients.contains(&flow.item) {
                    continue;
                }
                match inputs.iter_mut().find(|(name, _)| *name == flow.item) {
                    Some((_, rate)) => *rate += flow.rate,
                    None => inputs.push((flow.item.clone(), flow.rate)),
                }
            }
        }
        inputs
    }
}

/// Planning outcome for one forest root.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionPlan {
    pub root: String,
    pub rate: f64,
    pub result: Result<PlanResult, PlanError>,
}

/// A requested target whose tree could not be built or subdivided.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetFailure {
    pub item: String,
    pub error: PlanError,
}

/// Planning outcome for a whole request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchPlan {
    pub sections: Vec<SectionPlan>,
    pub failures: Vec<TargetFailure>,
}

impl BatchPlan {
    /// True when every target was built and every section planned.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.sections.iter().all(|s| s.result.is_ok())
    }

    pub fn section(&self, root: &str) -> Option<&SectionPlan> {
        self.sections.iter().find(|s| s.root == root)
    }
}

// ============================================================================
// JSON Input Structures
// ============================================================================

/// Deserializes a JSON object into its entries, keeping document order and
/// rejecting repeated keys.
pub fn ordered_entries<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct EntriesVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut seen = HashSet::new();
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, V>()? {
                if !seen.insert(key.clone()) {
                    return Err(de::Error::custom(format_args!("duplicate key `{}`", key)));
                }
                entries.push((key, value));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor(PhantomData))
}

/// Top-level catalog document.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    /// Recipe name to recipe definition
    #[serde(rename = "Recipes", default, deserialize_with = "ordered_entries")]
    pub recipes: Vec<(String, RecipeRow)>,
    /// Machine name to machine definition
    #[serde(rename = "Machines", default, deserialize_with = "ordered_entries")]
    pub machines: Vec<(String, MachineRow)>,
}

/// A recipe category field: either one tag or a list of tags.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OriginField {
    One(String),
    Many(Vec<String>),
}

impl OriginField {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OriginField::One(tag) => vec![tag],
            OriginField::Many(tags) => tags,
        }
    }
}

/// Recipe definition as written in the catalog.
#[derive(Debug, Deserialize)]
pub struct RecipeRow {
    #[serde(rename = "Outputs", deserialize_with = "ordered_entries")]
    pub outputs: Vec<(String, f64)>,
    #[serde(rename = "Ingredients", default, deserialize_with = "ordered_entries")]
    pub ingredients: Vec<(String, f64)>,
    /// Production category tag(s)
    #[serde(rename = "Origin")]
    pub origin: OriginField,
    /// Production time in seconds
    #[serde(rename = "Speed")]
    pub production_time: f64,
    #[serde(rename = "Involves fluids", default)]
    pub involves_fluids: bool,
    /// Defaults to the first declared output
    #[serde(rename = "Primary output", default)]
    pub primary_output: Option<String>,
}

fn default_level() -> u32 {
    1
}

/// Machine definition as written in the catalog.
#[derive(Debug, Deserialize)]
pub struct MachineRow {
    #[serde(rename = "Category")]
    pub category: String,
    /// Speed modifier
    #[serde(rename = "Speed")]
    pub speed: f64,
    #[serde(rename = "Level", default = "default_level")]
    pub level: u32,
    #[serde(rename = "Handles fluids", default)]
    pub handles_fluids: bool,
    /// Unbounded when absent
    #[serde(rename = "Max # ingredients", default)]
    pub max_ingredients: Option<usize>,
}

/// Top-level request document.
#[derive(Debug, Deserialize)]
pub struct RequestFile {
    #[serde(rename = "Produce", default)]
    pub produce: Vec<ProduceRow>,
    /// Preferred machine names
    #[serde(rename = "Limit", default)]
    pub limit: Vec<String>,
    /// Trunk items
    #[serde(rename = "Mainbus", default)]
    pub mainbus: Vec<String>,
    /// Item to recipe name
    #[serde(rename = "Recipes", default)]
    pub recipes: HashMap<String, String>,
}

/// One requested target as written in the request.
#[derive(Debug, Deserialize)]
pub struct ProduceRow {
    #[serde(rename = "Produce")]
    pub item: String,
    /// Items per second
    #[serde(rename = "Amount")]
    pub amount: f64,
}
