//! Display and formatting utilities for busplan.
//!
//! This module renders plan results as the classic per-node text report, as
//! indented trees, and as CSV rows.

use std::fmt::Write as _;
use std::io;

use serde::Serialize;

use crate::models::{BatchPlan, PlanResult, RecipeNode, SectionPlan};

/// Formats a rate or count with at most three decimals, dropping trailing zeros.
///
/// # Example
///
/// ```
/// use busplan::display::format_rate;
///
/// assert_eq!(format_rate(2.0), "2");
/// assert_eq!(format_rate(6.4), "6.4");
/// assert_eq!(format_rate(1.0 / 3.0), "0.333");
/// ```
pub fn format_rate(value: f64) -> String {
    let text = format!("{:.3}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Formats every node of one planned sub-tree.
///
/// Each node becomes a block listing the product, its rate, the exact and
/// rounded machine counts, the chosen machine and the ingredient rates.
pub fn format_plan(plan: &PlanResult) -> String {
    let mut out = String::new();
    for node in &plan.nodes {
        let _ = writeln!(out, "Product: {}", node.output);
        let _ = writeln!(out, "Produce: {}", format_rate(node.rate));
        let _ = writeln!(
            out,
            "# machines: {} Number machines rounded: {} Which machine: {}",
            format_rate(node.exact_count),
            node.machine_count,
            node.machine
        );
        let _ = writeln!(out, "Ingredients:");
        for flow in &node.ingredients {
            let _ = writeln!(out, "{} {}", format_rate(flow.rate), flow.item);
        }
        let _ = writeln!(out);
    }
    out
}

/// Formats one forest section, including its failure if planning failed.
pub fn format_section(section: &SectionPlan) -> String {
    let mut out = format!("== {} @ {}/s ==\n", section.root, format_rate(section.rate));
    match &section.result {
        Ok(plan) => out.push_str(&format_plan(plan)),
        Err(error) => {
            let _ = writeln!(out, "[ERROR] {}", error);
            let _ = writeln!(out);
        }
    }
    out
}

/// Formats a whole batch: every section, every failed target and a summary
/// of machines and boundary inputs over all planned sections.
pub fn format_batch(batch: &BatchPlan) -> String {
    let mut out = String::new();
    for section in &batch.sections {
        out.push_str(&format_section(section));
    }

    if !batch.failures.is_empty() {
        let _ = writeln!(out, "[FAILED TARGETS]");
        for failure in &batch.failures {
            let _ = writeln!(out, "  {}: {}", failure.item, failure.error);
        }
        let _ = writeln!(out);
    }

    let mut combined = PlanResult::default();
    for section in &batch.sections {
        if let Ok(plan) = &section.result {
            combined.nodes.extend(plan.nodes.iter().cloned());
        }
    }

    let _ = writeln!(out, "[SUMMARY]");
    let _ = writeln!(out, "----------------------------------------------------------------");
    let _ = writeln!(out, "Machines:");
    for (machine, count) in combined.total_machines() {
        let _ = writeln!(out, "  {:>6} x {}", count, machine);
    }
    let _ = writeln!(out, "Inputs:");
    for (item, rate) in combined.raw_inputs() {
        let _ = writeln!(out, "  {:>10}/s {}", format_rate(rate), item);
    }
    out
}

/// Prints a batch report to stdout.
pub fn display_batch(batch: &BatchPlan) {
    print!("{}", format_batch(batch));
}

/// Formats a production tree, one node per line, children indented.
pub fn format_tree(tree: &RecipeNode<'_>) -> String {
    let mut out = String::new();
    write_tree(tree, 0, &mut out);
    out
}

fn write_tree(node: &RecipeNode<'_>, indent: usize, out: &mut String) {
    let prefix = "  ".repeat(indent);
    let _ = write!(out, "{}{} ({})", prefix, node.output, node.recipe.name);
    if !node.boundary_ingredients.is_empty() {
        let _ = write!(out, " <- [{}]", node.boundary_ingredients.join(", "));
    }
    out.push('\n');
    for child in &node.children {
        write_tree(child, indent + 1, out);
    }
}

/// One CSV row per planned node.
#[derive(Debug, Serialize)]
struct PlanRow<'a> {
    root: &'a str,
    product: &'a str,
    recipe: &'a str,
    rate: f64,
    machine: &'a str,
    exact_count: f64,
    machine_count: u64,
    depth: usize,
    ingredients: String,
}

/// Writes every planned node of `batch` as CSV with a header row.
///
/// Sections that failed to plan are skipped. Ingredients are joined as
/// `rate item` pairs separated by `; `.
pub fn write_csv<W: io::Write>(batch: &BatchPlan, writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for section in &batch.sections {
        let Ok(plan) = &section.result else {
            continue;
        };
        for node in &plan.nodes {
            let ingredients = node
                .ingredients
                .iter()
                .map(|flow| format!("{} {}", format_rate(flow.rate), flow.item))
                .collect::<Vec<_>>()
                .join("; ");
            wtr.serialize(PlanRow {
                root: &section.root,
                product: &node.output,
                recipe: &node.recipe,
                rate: node.rate,
                machine: &node.machine,
                exact_count: node.exact_count,
                machine_count: node.machine_count,
                depth: node.depth,
                ingredients,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}
