//! Tests for the JSON-in/JSON-out surface shared with the WebAssembly bindings.

use busplan::wasm::{get_version, list_items_json, plan_json};

#[test]
fn test_plan_with_bundled_catalog() {
    let result = plan_json(
        "",
        r#"{"Produce": [{"Produce": "iron-gear-wheel", "Amount": 5}], "Mainbus": ["iron-plate"]}"#,
    );

    assert!(result.success);
    assert!(result.error.is_none());
    let roots: Vec<&str> = result.sections.iter().map(|s| s.root.as_str()).collect();
    assert_eq!(roots, vec!["iron-gear-wheel", "iron-plate"]);
    assert!(result.sections.iter().all(|s| s.success && !s.nodes.is_empty()));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["sections"][1]["rate"], 10.0);
}

#[test]
fn test_plan_with_custom_catalog() {
    let catalog = r#"{
        "Recipes": {
            "Iron Plate": {"Outputs": {"iron-plate": 1}, "Ingredients": {"iron-ore": 1},
                           "Origin": "smelting", "Speed": 3.2}
        },
        "Machines": {"Stone Furnace": {"Category": "smelting", "Speed": 1.0}}
    }"#;
    let result = plan_json(catalog, r#"{"Produce": [{"Produce": "iron-plate", "Amount": 2}]}"#);

    assert!(result.success);
    let node = &result.sections[0].nodes[0];
    assert_eq!(node.machine, "Stone Furnace");
    assert_eq!(node.machine_count, 7);
}

#[test]
fn test_plan_reports_failed_targets() {
    let result = plan_json("", r#"{"Produce": [{"Produce": "unobtainium", "Amount": 1}]}"#);

    assert!(!result.success);
    assert!(result.error.is_none());
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].item, "unobtainium");
}

#[test]
fn test_plan_rejects_invalid_input() {
    let bad_request = plan_json("", "not json");
    assert!(!bad_request.success);
    assert!(bad_request.error.unwrap().starts_with("Invalid request"));

    let bad_catalog = plan_json(r#"{"Recipes": []}"#, "{}");
    assert!(!bad_catalog.success);
    assert!(bad_catalog.error.unwrap().starts_with("Invalid catalog"));
}

#[test]
fn test_list_items() {
    let items = list_items_json("");
    assert!(!items.is_empty());

    let gear = items
        .iter()
        .find(|i| i.item == "iron-gear-wheel")
        .expect("Bundled catalog should make gears");
    assert_eq!(gear.recipe, "Iron gear wheel");
    assert_eq!(gear.categories, vec!["crafting".to_string()]);

    assert!(list_items_json("{").is_empty());
}

#[test]
fn test_version() {
    assert_eq!(get_version(), env!("CARGO_PKG_VERSION"));
}
