//! Tests for text, tree and CSV output.

use std::collections::HashSet;

use busplan::data::{Catalog, ProducerPolicy};
use busplan::display::{format_batch, format_plan, format_rate, format_section, format_tree, write_csv};
use busplan::models::ProductionRequest;
use busplan::planner::{plan, plan_request};
use busplan::tree::build_target_tree;

const CATALOG: &str = r#"{
    "Recipes": {
        "Iron Plate": {"Outputs": {"iron-plate": 1}, "Ingredients": {"iron-ore": 1},
                       "Origin": "smelting", "Speed": 3.2},
        "Gear": {"Outputs": {"gear": 1}, "Ingredients": {"iron-plate": 2},
                 "Origin": "crafting", "Speed": 0.5},
        "Polish": {"Outputs": {"polished-stone": 1}, "Ingredients": {"stone": 1},
                   "Origin": "polishing", "Speed": 1}
    },
    "Machines": {
        "Stone Furnace": {"Category": "smelting", "Speed": 1.0},
        "Assembler": {"Category": "crafting", "Speed": 1.0}
    }
}"#;

fn catalog() -> Catalog {
    Catalog::from_json_str(CATALOG, ProducerPolicy::Unique).expect("Failed to load catalog")
}

fn request(json: &str) -> ProductionRequest {
    ProductionRequest::from_json_str(json).expect("Failed to parse request")
}

#[test]
fn test_format_rate() {
    assert_eq!(format_rate(0.0), "0");
    assert_eq!(format_rate(10.0), "10");
    assert_eq!(format_rate(2.5), "2.5");
    assert_eq!(format_rate(0.75), "0.75");
    assert_eq!(format_rate(2.0 / 3.0), "0.667");
}

#[test]
fn test_format_plan_blocks() {
    let catalog = catalog();
    let tree = build_target_tree("iron-plate", &catalog, &HashSet::new()).unwrap();
    let result = plan(&tree, 2.0, &catalog, &HashSet::new()).unwrap();

    assert_eq!(
        format_plan(&result),
        "Product: iron-plate\n\
         Produce: 2\n\
         # machines: 6.4 Number machines rounded: 7 Which machine: Stone Furnace\n\
         Ingredients:\n\
         2 iron-ore\n\
         \n"
    );
}

#[test]
fn test_format_tree() {
    let catalog = catalog();
    let tree = build_target_tree("gear", &catalog, &HashSet::new()).unwrap();

    assert_eq!(
        format_tree(&tree),
        "gear (Gear)\n  iron-plate (Iron Plate) <- [iron-ore]\n"
    );
}

#[test]
fn test_format_section_with_error() {
    let catalog = catalog();
    let batch = plan_request(
        &catalog,
        &request(r#"{"Produce": [{"Produce": "polished-stone", "Amount": 1}]}"#),
    );

    let text = format_section(&batch.sections[0]);
    assert!(text.starts_with("== polished-stone @ 1/s ==\n"));
    assert!(text.contains("[ERROR] no compatible machine for recipe 'Polish'"));
}

#[test]
fn test_format_batch_summary() {
    let catalog = catalog();
    let batch = plan_request(
        &catalog,
        &request(
            r#"{
                "Produce": [
                    {"Produce": "gear", "Amount": 5},
                    {"Produce": "unobtainium", "Amount": 1}
                ],
                "Mainbus": ["iron-plate"]
            }"#,
        ),
    );

    let text = format_batch(&batch);
    assert!(text.contains("== gear @ 5/s =="));
    assert!(text.contains("== iron-plate @ 10/s =="));
    assert!(text.contains("[FAILED TARGETS]"));
    assert!(text.contains("unobtainium: no recipe produces requested item 'unobtainium'"));
    assert!(text.contains("[SUMMARY]"));
    assert!(text.contains("3 x Assembler"));
    assert!(text.contains("32 x Stone Furnace"));
    assert!(text.contains("10/s iron-plate"));
    assert!(text.contains("10/s iron-ore"));
}

#[test]
fn test_write_csv() {
    let catalog = catalog();
    let batch = plan_request(
        &catalog,
        &request(r#"{"Produce": [{"Produce": "gear", "Amount": 5}], "Mainbus": ["iron-plate"]}"#),
    );

    let mut buffer = Vec::new();
    write_csv(&batch, &mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(
        lines[0],
        "root,product,recipe,rate,machine,exact_count,machine_count,depth,ingredients"
    );
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("gear,gear,Gear,"));
    assert!(lines[1].ends_with(",Assembler,2.5,3,0,10 iron-plate"));
    assert!(lines[2].starts_with("iron-plate,iron-plate,Iron Plate,"));
    assert!(lines[2].ends_with(",32,0,10 iron-ore"));
}

#[test]
fn test_write_csv_skips_failed_sections() {
    let catalog = catalog();
    let batch = plan_request(
        &catalog,
        &request(r#"{"Produce": [{"Produce": "polished-stone", "Amount": 1}]}"#),
    );

    let mut buffer = Vec::new();
    write_csv(&batch, &mut buffer).unwrap();
    assert!(String::from_utf8(buffer).unwrap().is_empty());
}
