//! Subdivision of production trees at trunk items.
//!
//! A child whose primary output is a trunk item is cut out of its parent and becomes
//! the root of its own sub-tree, demanded at the rate the parent consumes it.
//! Trees are never mutated: every forest entry holds a fresh copy with its
//! trunk children replaced by boundary ingredients.

use std::collections::HashSet;

use tracing::debug;

use crate::error::PlanError;
use crate::models::{ForestEntry, RecipeNode, SubdividedForest};
use crate::tree::targeted_ingredient;

/// Splits `tree`, produced at `rate`, into sub-trees rooted at trunk items.
///
/// A child is cut out when its recipe's primary output is a trunk item. The
/// tree's own root is not part of the result; see [`build_forest`].
///
/// # Arguments
///
/// * `tree` - Production tree to split, left untouched
/// * `rate` - Items per second demanded of the tree's root
/// * `trunk_items` - Items supplied by the main bus
///
/// # Returns
///
/// One entry per trunk item found beneath the root, keyed by that item. A
/// trunk child consumed at `q` per parent cycle whose primary output yields
/// `y` per own cycle is demanded at `rate * q / y`. Non-trunk children stay
/// in place and are searched at `rate * q`. Roots reached from several places
/// sum their rates.
pub fn subdivide<'c>(
    tree: &RecipeNode<'c>,
    rate: f64,
    trunk_items: &HashSet<String>,
) -> Result<SubdividedForest<'c>, PlanError> {
    let mut forest = SubdividedForest::new();

    for child in &tree.children {
        let (ingredient, consumed) = targeted_ingredient(tree, child)?;

        if trunk_items.contains(child.primary_output()) {
            let child_rate = rate * consumed / child.primary_yield()?;
            debug!(
                root = child.primary_output(),
                ingredient,
                parent = %tree.recipe.name,
                rate = child_rate,
                "promoting trunk item to sub-tree root"
            );
            forest.accumulate(ForestEntry {
                root: child.primary_output().to_string(),
                rate: child_rate,
                tree: residual_tree(child, trunk_items),
            });
            forest.merge(subdivide(child, child_rate, trunk_items)?);
        } else {
            forest.merge(subdivide(child, rate * consumed, trunk_items)?);
        }
    }

    Ok(forest)
}

/// Copies `tree` with every child whose primary output is a trunk item
/// turned into a boundary ingredient, named by the item the parent consumes.
///
/// The root is kept even when its own output is a trunk item.
pub fn residual_tree<'c>(tree: &RecipeNode<'c>, trunk_items: &HashSet<String>) -> RecipeNode<'c> {
    let mut residual = RecipeNode {
        recipe: tree.recipe,
        output: tree.output.clone(),
        children: Vec::with_capacity(tree.children.len()),
        boundary_ingredients: tree.boundary_ingredients.clone(),
    };
    for child in &tree.children {
        if trunk_items.contains(child.primary_output()) {
            if !residual.boundary_ingredients.contains(&child.output) {
                residual.boundary_ingredients.push(child.output.clone());
            }
        } else {
            residual.children.push(residual_tree(child, trunk_items));
        }
    }
    residual
}

/// The complete forest for one requested target.
///
/// Contains the target's residual tree at `rate` followed by every trunk
/// sub-tree found beneath it.
///
/// # Example
///
/// ```
/// use std::collections::HashSet;
/// use busplan::data::{Catalog, ProducerPolicy};
/// use busplan::subdivide::build_forest;
/// use busplan::tree::build_target_tree;
///
/// let catalog = Catalog::from_json_str(r#"{
///     "Recipes": {
///         "Iron plate": {"Outputs": {"iron-plate": 1}, "Ingredients": {"iron-ore": 1},
///                        "Origin": "smelting", "Speed": 3.2},
///         "Gear": {"Outputs": {"gear": 1}, "Ingredients": {"iron-plate": 2},
///                  "Origin": "crafting", "Speed": 0.5}
///     }
/// }"#, ProducerPolicy::Unique).unwrap();
///
/// let tree = build_target_tree("gear", &catalog, &HashSet::new()).unwrap();
/// let mainbus: HashSet<String> = ["iron-plate".to_string()].into();
/// let forest = build_forest(&tree, 5.0, &mainbus).unwrap();
///
/// assert_eq!(forest.roots(), vec!["gear", "iron-plate"]);
/// assert_eq!(forest.rate_of("iron-plate"), Some(10.0));
/// ```
pub fn build_forest<'c>(
    tree: &RecipeNode<'c>,
    rate: f64,
    trunk_items: &HashSet<String>,
) -> Result<SubdividedForest<'c>, PlanError> {
    let mut forest = SubdividedForest::new();
    forest.accumulate(ForestEntry {
        root: tree.output.clone(),
        rate,
        tree: residual_tree(tree, trunk_items),
    });
    forest.merge(subdivide(tree, rate, trunk_items)?);
    Ok(forest)
}
