//! Machine selection and machine-count computation.
//!
//! This module walks production sub-trees top-down, picks a machine for every
//! node and reports how many are needed and how fast each ingredient is
//! consumed. [`plan_request`] drives the whole pipeline for a request:
//! build, subdivide, merge and plan.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::data::Catalog;
use crate::error::PlanError;
use crate::models::{
    BatchPlan, IngredientFlow, Machine, NodePlan, PlanResult, ProduceEntry, ProductionRequest,
    Recipe, RecipeNode, SectionPlan, SubdividedForest, TargetFailure,
};
use crate::subdivide::build_forest;
use crate::tree::{targeted_ingredient, TreeBuilder};

/// Picks the machine that runs `recipe`.
///
/// Candidates are the machines of each recipe category, in the order the
/// recipe lists its categories. A preferred candidate wins if it is
/// compatible; a preferred candidate that is not compatible is an error
/// unless another preferred one is. Otherwise the compatible machine with
/// the highest level is chosen, the first declared one on ties.
///
/// # Arguments
///
/// * `recipe` - Recipe to run
/// * `catalog` - Catalog holding the candidate machines
/// * `preferences` - Machine names that override automatic selection
///
/// # Returns
///
/// The chosen machine, or `NoCompatibleMachine` /
/// `IncompatiblePreferredMachine` when none can run the recipe.
pub fn select_machine<'c>(
    recipe: &Recipe,
    catalog: &'c Catalog,
    preferences: &HashSet<String>,
) -> Result<&'c Machine, PlanError> {
    let candidates: Vec<&'c Machine> = recipe
        .categories
        .iter()
        .flat_map(|category| catalog.machines_for(category))
        .collect();

    let preferred: Vec<&'c Machine> = candidates
        .iter()
        .copied()
        .filter(|m| preferences.contains(&m.name))
        .collect();
    if let Some(first) = preferred.first() {
        return match preferred.iter().find(|m| m.is_recipe_compatible(recipe)) {
            Some(machine) => Ok(*machine),
            None => Err(PlanError::IncompatiblePreferredMachine {
                machine: first.name.clone(),
                recipe: recipe.name.clone(),
                reason: first
                    .incompatibility(recipe)
                    .map(|reason| reason.to_string())
                    .unwrap_or_default(),
            }),
        };
    }

    let mut chosen: Option<&'c Machine> = None;
    for machine in candidates.into_iter().filter(|m| m.is_recipe_compatible(recipe)) {
        match chosen {
            Some(best) if best.level >= machine.level => {}
            _ => chosen = Some(machine),
        }
    }

    chosen.ok_or_else(|| PlanError::NoCompatibleMachine {
        recipe: recipe.name.clone(),
        categories: recipe.categories.clone(),
    })
}

/// Machines needed to produce `rate` items per second, before rounding.
///
/// # Example
///
/// ```
/// use busplan::planner::exact_machine_count;
///
/// // 2 iron plates/s, 3.2 s per plate, furnace at speed 1.0
/// assert_eq!(exact_machine_count(2.0, 3.2, 1.0, 1.0), 6.4);
/// assert_eq!(exact_machine_count(2.0, 3.2, 1.0, 2.0), 3.2);
/// ```
pub fn exact_machine_count(
    rate: f64,
    production_time: f64,
    primary_yield: f64,
    speed_modifier: f64,
) -> f64 {
    (rate * production_time / primary_yield) / speed_modifier
}

/// Plans every node of `tree`, produced at `rate`, in pre-order.
///
/// Machine counts divide by the yield of each recipe's primary output. A
/// child is planned at `rate` times the quantity of its item the parent
/// consumes per cycle.
///
/// # Arguments
///
/// * `tree` - Production sub-tree to plan
/// * `rate` - Items per second demanded of the root
/// * `catalog` - Catalog holding the machines
/// * `preferences` - Machine names that override automatic selection
///
/// # Returns
///
/// One [`NodePlan`] per node, or the first selection error met.
pub fn plan(
    tree: &RecipeNode<'_>,
    rate: f64,
    catalog: &Catalog,
    preferences: &HashSet<String>,
) -> Result<PlanResult, PlanError> {
    let mut result = PlanResult::default();
    plan_node(tree, rate, 0, catalog, preferences, &mut result.nodes)?;
    Ok(result)
}

fn plan_node(
    node: &RecipeNode<'_>,
    rate: f64,
    depth: usize,
    catalog: &Catalog,
    preferences: &HashSet<String>,
    nodes: &mut Vec<NodePlan>,
) -> Result<(), PlanError> {
    let recipe = node.recipe;
    let machine = select_machine(recipe, catalog, preferences)?;
    let exact_count = exact_machine_count(
        rate,
        recipe.production_time,
        node.primary_yield()?,
        machine.speed_modifier,
    );
    debug!(
        item = %node.output,
        machine = %machine.name,
        rate,
        exact_count,
        "planned node"
    );

    nodes.push(NodePlan {
        output: node.output.clone(),
        recipe: recipe.name.clone(),
        rate,
        machine: machine.name.clone(),
        exact_count,
        machine_count: exact_count.ceil() as u64,
        ingredients: recipe
            .ingredients
            .iter()
            .map(|(item, quantity)| IngredientFlow {
                item: item.clone(),
                rate: rate * quantity,
            })
            .collect(),
        boundary_ingredients: node.boundary_ingredients.clone(),
        depth,
    });

    for child in &node.children {
        let (_, consumed) = targeted_ingredient(node, child)?;
        plan_node(child, rate * consumed, depth + 1, catalog, preferences, nodes)?;
    }
    Ok(())
}

fn target_forest<'c>(
    builder: &TreeBuilder<'c>,
    target: &ProduceEntry,
    trunk_items: &HashSet<String>,
) -> Result<SubdividedForest<'c>, PlanError> {
    let tree = builder.build_target(&target.item)?;
    build_forest(&tree, target.rate, trunk_items)
}

#[cfg(not(feature = "parallel"))]
fn target_forests<'c>(
    builder: &TreeBuilder<'c>,
    request: &ProductionRequest,
) -> Vec<Result<SubdividedForest<'c>, PlanError>> {
    request
        .targets
        .iter()
        .map(|target| target_forest(builder, target, &request.trunk_items))
        .collect()
}

#[cfg(feature = "parallel")]
fn target_forests<'c>(
    builder: &TreeBuilder<'c>,
    request: &ProductionRequest,
) -> Vec<Result<SubdividedForest<'c>, PlanError>> {
    use rayon::prelude::*;

    request
        .targets
        .par_iter()
        .map(|target| target_forest(builder, target, &request.trunk_items))
        .collect()
}

/// Plans a whole request.
///
/// Each target is built and subdivided on its own; a target that fails is
/// recorded in [`BatchPlan::failures`] and the others carry on. The forests
/// of the remaining targets are merged, summing the rates of shared roots,
/// and each merged root is planned into one [`SectionPlan`].
///
/// Trees are built without stopping at trunk items so the subdivider can cut
/// them there; a trunk item repeating on its own ancestor path still ends
/// recursion instead of failing as a cycle.
///
/// # Arguments
///
/// * `catalog` - Recipes and machines to plan with
/// * `request` - Targets, trunk items, machine preferences and recipe choices
///
/// # Returns
///
/// A [`BatchPlan`] with one section per forest root and one failure per
/// target that could not be built.
pub fn plan_request(catalog: &Catalog, request: &ProductionRequest) -> BatchPlan {
    let builder = TreeBuilder::new(catalog)
        .with_cycle_cuts(request.trunk_items.iter().cloned())
        .with_recipe_choices(request.recipe_choices.clone());

    let mut forest = SubdividedForest::new();
    let mut failures = Vec::new();
    for (target, outcome) in request.targets.iter().zip(target_forests(&builder, request)) {
        match outcome {
            Ok(target_forest) => forest.merge(target_forest),
            Err(error) => {
                warn!(item = %target.item, %error, "target skipped");
                failures.push(TargetFailure {
                    item: target.item.clone(),
                    error,
                });
            }
        }
    }

    let sections: Vec<SectionPlan> = forest
        .into_iter()
        .map(|entry| SectionPlan {
            result: plan(&entry.tree, entry.rate, catalog, &request.machine_preferences),
            root: entry.root,
            rate: entry.rate,
        })
        .collect();

    info!(
        targets = request.targets.len(),
        sections = sections.len(),
        failures = failures.len(),
        "request planned"
    );

    BatchPlan { sections, failures }
}
