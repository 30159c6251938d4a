//! Recipe-dependency tree construction.
//!
//! A tree starts at a requested item and follows each ingredient to the
//! recipe producing it, stopping at trunk items and at items no recipe
//! produces. Trunk membership is checked before any recipe lookup, so a
//! trunk item stays a boundary even when the catalog can make it.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::data::Catalog;
use crate::error::PlanError;
use crate::models::{Recipe, RecipeNode};

/// Builds production trees against one catalog.
///
/// # Example
///
/// ```
/// use busplan::data::{Catalog, ProducerPolicy};
/// use busplan::tree::TreeBuilder;
///
/// let catalog = Catalog::from_json_str(r#"{
///     "Recipes": {
///         "Iron plate": {"Outputs": {"iron-plate": 1}, "Ingredients": {"iron-ore": 1},
///                        "Origin": "smelting", "Speed": 3.2},
///         "Iron gear wheel": {"Outputs": {"iron-gear-wheel": 1}, "Ingredients": {"iron-plate": 2},
///                             "Origin": "crafting", "Speed": 0.5}
///     }
/// }"#, ProducerPolicy::Unique).unwrap();
///
/// let tree = TreeBuilder::new(&catalog)
///     .with_trunk_items(["iron-plate"])
///     .build_target("iron-gear-wheel")
///     .unwrap();
///
/// assert!(tree.children.is_empty());
/// assert_eq!(tree.boundary_ingredients, vec!["iron-plate".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct TreeBuilder<'c> {
    catalog: &'c Catalog,
    trunk_items: HashSet<String>,
    cycle_cuts: HashSet<String>,
    recipe_choices: HashMap<String, String>,
}

impl<'c> TreeBuilder<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        TreeBuilder {
            catalog,
            trunk_items: HashSet::new(),
            cycle_cuts: HashSet::new(),
            recipe_choices: HashMap::new(),
        }
    }

    /// Items treated as externally supplied; recursion stops at them.
    pub fn with_trunk_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trunk_items.extend(items.into_iter().map(Into::into));
        self
    }

    /// Items supplied externally that the tree still descends into.
    ///
    /// Recursion continues through them, but one that reappears on its own
    /// ancestor path becomes a boundary ingredient instead of a cycle error.
    pub fn with_cycle_cuts<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cycle_cuts.extend(items.into_iter().map(Into::into));
        self
    }

    /// Explicit recipe per item, overriding the first declared producer.
    pub fn with_recipe_choices(mut self, choices: HashMap<String, String>) -> Self {
        self.recipe_choices = choices;
        self
    }

    /// Builds the tree for `item`.
    ///
    /// Returns `Ok(None)` when no recipe produces `item`.
    pub fn build(&self, item: &str) -> Result<Option<RecipeNode<'c>>, PlanError> {
        let mut ancestors = Vec::new();
        self.build_node(item, &mut ancestors)
    }

    /// Builds the tree for a requested target, which must be producible.
    pub fn build_target(&self, item: &str) -> Result<RecipeNode<'c>, PlanError> {
        self.build(item)?
            .ok_or_else(|| PlanError::UnknownTargetItem {
                item: item.to_string(),
            })
    }

    fn resolve_recipe(&self, item: &str) -> Result<Option<&'c Recipe>, PlanError> {
        let Some(choice) = self.recipe_choices.get(item) else {
            return Ok(self.catalog.producer_of(item));
        };
        let recipe = self
            .catalog
            .recipe(choice)
            .ok_or_else(|| PlanError::InvalidRecipeChoice {
                item: item.to_string(),
                recipe: choice.clone(),
                reason: "no such recipe in the catalog",
            })?;
        if !recipe.produces(item) {
            return Err(PlanError::InvalidRecipeChoice {
                item: item.to_string(),
                recipe: choice.clone(),
                reason: "the recipe does not produce this item",
            });
        }
        Ok(Some(recipe))
    }

    fn build_node(
        &self,
        item: &str,
        ancestors: &mut Vec<String>,
    ) -> Result<Option<RecipeNode<'c>>, PlanError> {
        let Some(recipe) = self.resolve_recipe(item)? else {
            return Ok(None);
        };
        debug!(item, recipe = %recipe.name, depth = ancestors.len(), "resolved producer");

        ancestors.push(item.to_string());
        let mut node = RecipeNode::for_output(recipe, item);
        for (ingredient, _) in &recipe.ingredients {
            if self.trunk_items.contains(ingredient) {
                node.boundary_ingredients.push(ingredient.clone());
                continue;
            }
            if let Some(start) = ancestors.iter().position(|a| a == ingredient) {
                if self.cycle_cuts.contains(ingredient) {
                    debug!(item = %ingredient, recipe = %recipe.name, "cycle cut at bus item");
                    node.boundary_ingredients.push(ingredient.clone());
                    continue;
                }
                let mut cycle = ancestors[start..].to_vec();
                cycle.push(ingredient.clone());
                return Err(PlanError::CyclicRecipe { cycle });
            }
            match self.build_node(ingredient, ancestors)? {
                Some(child) => node.children.push(child),
                None => node.boundary_ingredients.push(ingredient.clone()),
            }
        }
        ancestors.pop();

        Ok(Some(node))
    }
}

/// Builds the tree for `item`, or `None` if no recipe produces it.
pub fn build_tree<'c>(
    item: &str,
    catalog: &'c Catalog,
    trunk_items: &HashSet<String>,
) -> Result<Option<RecipeNode<'c>>, PlanError> {
    TreeBuilder::new(catalog)
        .with_trunk_items(trunk_items.iter().cloned())
        .build(item)
}

/// Builds the tree for a requested target; an unproducible target is an error.
pub fn build_target_tree<'c>(
    item: &str,
    catalog: &'c Catalog,
    trunk_items: &HashSet<String>,
) -> Result<RecipeNode<'c>, PlanError> {
    TreeBuilder::new(catalog)
        .with_trunk_items(trunk_items.iter().cloned())
        .build_target(item)
}

/// Finds the parent ingredient supplied by `child` and its per-cycle quantity.
///
/// The match intersects the parent's ingredients with the child's outputs.
/// When several names match, the item the child node was built for decides;
/// if it is not among them the link is ambiguous.
pub fn targeted_ingredient<'p>(
    parent: &'p RecipeNode<'_>,
    child: &RecipeNode<'_>,
) -> Result<(&'p str, f64), PlanError> {
    let candidates: Vec<&'p (String, f64)> = parent
        .recipe
        .ingredients
        .iter()
        .filter(|(item, _)| child.recipe.produces(item))
        .collect();

    let linked = match candidates.as_slice() {
        [] => {
            return Err(PlanError::UnlinkedChild {
                parent: parent.recipe.name.clone(),
                child: child.recipe.name.clone(),
            })
        }
        [only] => *only,
        several => {
            let resolved = several
                .iter()
                .copied()
                .find(|(item, _)| *item == child.output)
                .ok_or_else(|| PlanError::AmbiguousTargetedIngredient {
                    parent: parent.recipe.name.clone(),
                    child: child.recipe.name.clone(),
                    candidates: several.iter().map(|(item, _)| item.clone()).collect(),
                })?;
            warn!(
                parent = %parent.recipe.name,
                child = %child.recipe.name,
                resolved = %resolved.0,
                "parent consumes several outputs of child recipe"
            );
            resolved
        }
    };
    Ok((linked.0.as_str(), linked.1))
}
