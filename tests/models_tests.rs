//! Tests for recipes, machines, forests and plan results.

use busplan::error::PlanError;
use busplan::models::{
    BatchPlan, ForestEntry, Incompatibility, IngredientFlow, Machine, NodePlan, PlanResult,
    Recipe, RecipeNode, SectionPlan, SubdividedForest, TargetFailure,
};

fn recipe(name: &str, outputs: &[(&str, f64)], ingredients: &[(&str, f64)]) -> Recipe {
    Recipe {
        name: name.to_string(),
        outputs: outputs.iter().map(|(i, q)| (i.to_string(), *q)).collect(),
        ingredients: ingredients.iter().map(|(i, q)| (i.to_string(), *q)).collect(),
        categories: vec!["crafting".to_string()],
        production_time: 1.0,
        involves_fluids: false,
        primary_output: outputs[0].0.to_string(),
    }
}

fn machine(name: &str, max_ingredients: Option<usize>, fluid_capable: bool) -> Machine {
    Machine {
        name: name.to_string(),
        category: "crafting".to_string(),
        speed_modifier: 1.0,
        level: 1,
        max_ingredients,
        fluid_capable,
    }
}

fn node_plan(output: &str, machine: &str, count: u64, flows: &[(&str, f64)], boundary: &[&str]) -> NodePlan {
    NodePlan {
        output: output.to_string(),
        recipe: output.to_string(),
        rate: 1.0,
        machine: machine.to_string(),
        exact_count: count as f64,
        machine_count: count,
        ingredients: flows
            .iter()
            .map(|(item, rate)| IngredientFlow {
                item: item.to_string(),
                rate: *rate,
            })
            .collect(),
        boundary_ingredients: boundary.iter().map(|s| s.to_string()).collect(),
        depth: 0,
    }
}

#[test]
fn test_recipe_lookups() {
    let cable = recipe("Copper cable", &[("copper-cable", 2.0)], &[("copper-plate", 1.0)]);

    assert_eq!(cable.output_quantity("copper-cable"), Some(2.0));
    assert_eq!(cable.output_quantity("copper-plate"), None);
    assert_eq!(cable.ingredient_quantity("copper-plate"), Some(1.0));
    assert_eq!(cable.primary_yield(), Some(2.0));
    assert!(cable.produces("copper-cable"));
    assert!(cable.consumes("copper-plate"));
    assert!(!cable.consumes("copper-cable"));
}

#[test]
fn test_machine_compatibility() {
    let mut lube = recipe("Lubed gear", &[("lubed-gear", 1.0)], &[("gear", 1.0), ("lubricant", 5.0)]);
    lube.involves_fluids = true;

    let basic = machine("Basic", Some(1), false);
    let dry = machine("Dry", None, false);
    let wet = machine("Wet", None, true);

    assert_eq!(
        basic.incompatibility(&lube),
        Some(Incompatibility::TooManyIngredients { max: 1, needed: 2 })
    );
    assert_eq!(dry.incompatibility(&lube), Some(Incompatibility::Fluids));
    assert!(wet.is_recipe_compatible(&lube));

    let mut smelter = machine("Furnace", None, true);
    smelter.category = "smelting".to_string();
    assert_eq!(smelter.incompatibility(&lube), Some(Incompatibility::Category));
}

#[test]
fn test_incompatibility_messages() {
    assert_eq!(Incompatibility::Category.to_string(), "category mismatch");
    assert_eq!(Incompatibility::Fluids.to_string(), "cannot handle fluids");
    assert_eq!(
        Incompatibility::TooManyIngredients { max: 2, needed: 3 }.to_string(),
        "accepts 2 ingredients, recipe needs 3"
    );
}

#[test]
fn test_node_yield_follows_primary_output() {
    let mut split = recipe("Split", &[("heavy-oil", 1.0), ("light-oil", 4.0)], &[("crude-oil", 10.0)]);

    let node = RecipeNode::for_output(&split, "light-oil");
    assert_eq!(node.primary_output(), "heavy-oil");
    assert_eq!(node.primary_yield(), Ok(1.0));

    split.primary_output = "light-oil".to_string();
    assert_eq!(RecipeNode::for_output(&split, "heavy-oil").primary_yield(), Ok(4.0));

    split.primary_output = "petroleum-gas".to_string();
    assert_eq!(
        RecipeNode::new(&split).primary_yield(),
        Err(PlanError::OutputNotProduced {
            recipe: "Split".to_string(),
            item: "petroleum-gas".to_string(),
        })
    );
}

#[test]
fn test_node_helpers() {
    let plate = recipe("Iron plate", &[("iron-plate", 1.0)], &[("iron-ore", 1.0)]);
    let gear = recipe("Gear", &[("gear", 1.0)], &[("iron-plate", 2.0)]);

    let mut leaf = RecipeNode::new(&plate);
    leaf.boundary_ingredients.push("iron-ore".to_string());
    let mut root = RecipeNode::new(&gear);
    root.children.push(leaf);

    assert!(!root.is_leaf());
    assert_eq!(root.node_count(), 2);
    assert_eq!(root.depth(), 2);
    assert_eq!(root.find("iron-plate").unwrap().recipe.name, "Iron plate");
    assert!(root.find("iron-ore").is_none());
    assert_eq!(root.boundary_items(), vec!["iron-ore".to_string()]);
}

#[test]
fn test_forest_accumulates_rates() {
    let plate = recipe("Iron plate", &[("iron-plate", 1.0)], &[("iron-ore", 1.0)]);
    let other = recipe("Iron plate (scrap)", &[("iron-plate", 1.0)], &[("scrap", 1.0)]);

    let mut forest = SubdividedForest::new();
    forest.accumulate(ForestEntry {
        root: "iron-plate".to_string(),
        rate: 2.0,
        tree: RecipeNode::new(&plate),
    });
    forest.accumulate(ForestEntry {
        root: "iron-plate".to_string(),
        rate: 3.0,
        tree: RecipeNode::new(&other),
    });

    assert_eq!(forest.len(), 1);
    assert_eq!(forest.rate_of("iron-plate"), Some(5.0));
    assert_eq!(forest.get("iron-plate").unwrap().tree.recipe.name, "Iron plate");
    assert_eq!(forest.rate_of("gear"), None);
}

#[test]
fn test_forest_merge_keeps_first_seen_order() {
    let plate = recipe("Iron plate", &[("iron-plate", 1.0)], &[("iron-ore", 1.0)]);
    let gear = recipe("Gear", &[("gear", 1.0)], &[("iron-plate", 2.0)]);
    let entry = |root: &str, rate: f64, recipe| ForestEntry {
        root: root.to_string(),
        rate,
        tree: RecipeNode::new(recipe),
    };

    let mut first = SubdividedForest::new();
    first.accumulate(entry("gear", 1.0, &gear));
    first.accumulate(entry("iron-plate", 2.0, &plate));

    let mut second = SubdividedForest::new();
    second.accumulate(entry("iron-plate", 4.0, &plate));
    second.accumulate(entry("gear", 0.5, &gear));

    first.merge(second);
    assert_eq!(first.roots(), vec!["gear", "iron-plate"]);
    assert_eq!(first.rate_of("gear"), Some(1.5));
    assert_eq!(first.rate_of("iron-plate"), Some(6.0));

    let rates: Vec<f64> = first.into_iter().map(|e| e.rate).collect();
    assert_eq!(rates, vec![1.5, 6.0]);
}

#[test]
fn test_plan_totals() {
    let result = PlanResult {
        nodes: vec![
            node_plan("circuit", "Assembler", 2, &[("iron-plate", 1.0), ("copper-cable", 3.0)], &["iron-plate"]),
            node_plan("copper-cable", "Assembler", 1, &[("copper-plate", 1.5)], &["copper-plate"]),
            node_plan("gear", "Fast assembler", 3, &[("iron-plate", 2.0)], &["iron-plate"]),
        ],
    };

    assert_eq!(
        result.total_machines(),
        vec![
            ("Assembler".to_string(), 3),
            ("Fast assembler".to_string(), 3)
        ]
    );
    assert_eq!(
        result.raw_inputs(),
        vec![
            ("iron-plate".to_string(), 3.0),
            ("copper-plate".to_string(), 1.5)
        ]
    );
}

#[test]
fn test_batch_completeness() {
    let ok = SectionPlan {
        root: "gear".to_string(),
        rate: 1.0,
        result: Ok(PlanResult::default()),
    };
    let mut batch = BatchPlan {
        sections: vec![ok],
        failures: vec![],
    };
    assert!(batch.is_complete());
    assert!(batch.section("gear").is_some());
    assert!(batch.section("pipe").is_none());

    batch.failures.push(TargetFailure {
        item: "pipe".to_string(),
        error: PlanError::UnknownTargetItem {
            item: "pipe".to_string(),
        },
    });
    assert!(!batch.is_complete());
}
