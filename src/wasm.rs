//! WebAssembly bindings for busplan.
//!
//! This module exposes the planner to JavaScript as JSON-in/JSON-out
//! functions.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::data::{Catalog, ProducerPolicy};
use crate::models::{NodePlan, ProductionRequest};
use crate::planner::plan_request;

/// JavaScript-friendly section output.
#[derive(Debug, Clone, Serialize)]
pub struct JsSection {
    pub root: String,
    pub rate: f64,
    pub success: bool,
    pub error: Option<String>,
    pub nodes: Vec<NodePlan>,
}

/// JavaScript-friendly failed target.
#[derive(Debug, Clone, Serialize)]
pub struct JsFailure {
    pub item: String,
    pub error: String,
}

/// JavaScript-friendly planning result.
#[derive(Debug, Clone, Serialize)]
pub struct JsPlanResult {
    pub success: bool,
    pub error: Option<String>,
    pub sections: Vec<JsSection>,
    pub failures: Vec<JsFailure>,
}

impl JsPlanResult {
    fn failed(error: String) -> Self {
        JsPlanResult {
            success: false,
            error: Some(error),
            sections: vec![],
            failures: vec![],
        }
    }
}

fn load_catalog_json(catalog_json: &str) -> Result<Catalog, String> {
    let catalog = if catalog_json.trim().is_empty() {
        Catalog::bundled()
    } else {
        Catalog::from_json_str(catalog_json, ProducerPolicy::Unique)
    };
    catalog.map_err(|e| format!("Invalid catalog: {}", e))
}

/// Runs the whole pipeline on JSON inputs.
///
/// An empty `catalog_json` selects the bundled catalog.
pub fn plan_json(catalog_json: &str, request_json: &str) -> JsPlanResult {
    let catalog = match load_catalog_json(catalog_json) {
        Ok(c) => c,
        Err(e) => return JsPlanResult::failed(e),
    };
    let request = match ProductionRequest::from_json_str(request_json) {
        Ok(r) => r,
        Err(e) => return JsPlanResult::failed(format!("Invalid request: {}", e)),
    };

    let batch = plan_request(&catalog, &request);
    let success = batch.is_complete();

    let sections = batch
        .sections
        .into_iter()
        .map(|section| match section.result {
            Ok(plan) => JsSection {
                root: section.root,
                rate: section.rate,
                success: true,
                error: None,
                nodes: plan.nodes,
            },
            Err(e) => JsSection {
                root: section.root,
                rate: section.rate,
                success: false,
                error: Some(e.to_string()),
                nodes: vec![],
            },
        })
        .collect();
    let failures = batch
        .failures
        .into_iter()
        .map(|f| JsFailure {
            item: f.item,
            error: f.error.to_string(),
        })
        .collect();

    JsPlanResult {
        success,
        error: None,
        sections,
        failures,
    }
}

/// Plan a production request.
///
/// Takes the catalog and request as JSON strings and returns a JSON string result.
#[wasm_bindgen]
pub fn plan(catalog_json: &str, request_json: &str) -> String {
    let result = plan_json(catalog_json, request_json);
    if let Some(error) = &result.error {
        web_sys::console::error_1(&JsValue::from_str(error));
    }
    for failure in &result.failures {
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "{}: {}",
            failure.item, failure.error
        )));
    }
    serde_json::to_string(&result).unwrap_or_default()
}

/// Get the version of the planner.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Producible item with the recipe that makes it by default.
#[derive(Debug, Clone, Serialize)]
pub struct ItemInfo {
    pub item: String,
    pub recipe: String,
    pub categories: Vec<String>,
}

/// Lists producible items of a catalog.
///
/// An empty `catalog_json` selects the bundled catalog. Invalid catalogs
/// yield an empty list.
pub fn list_items_json(catalog_json: &str) -> Vec<ItemInfo> {
    let Ok(catalog) = load_catalog_json(catalog_json) else {
        return vec![];
    };
    catalog
        .producible_items()
        .into_iter()
        .filter_map(|item| {
            catalog.producer_of(item).map(|recipe| ItemInfo {
                item: item.to_string(),
                recipe: recipe.name.clone(),
                categories: recipe.categories.clone(),
            })
        })
        .collect()
}

/// Get the list of producible items.
/// Returns JSON array of item names, recipes and categories.
#[wasm_bindgen]
pub fn list_items(catalog_json: &str) -> String {
    serde_json::to_string(&list_items_json(catalog_json)).unwrap_or_default()
}
