//! Plain-text rendering of a change plan for review.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;

use crate::{cli::ShowArgs, plan::ChangePlan};

pub fn execute(args: &ShowArgs) -> Result<()> {
    let plan = ChangePlan::load(&args.plan)
        .with_context(|| format!("Loading change plan from {:?}", args.plan))?;
    let rows = plan_rows(&plan);
    if rows.is_empty() {
        info!("Change plan {:?} records no changes", args.plan);
        return Ok(());
    }
    let headers = ["change", "subject", "detail"].map(String::from);
    print!("{}", render_table(&headers, &rows));
    Ok(())
}

/// One row per recorded change: category, table or path, and what changed.
pub fn plan_rows(plan: &ChangePlan) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for (old, new) in &plan.renamed_tables {
        rows.push(row("renamed table", old, format!("-> {new}")));
    }
    for (name, moved) in &plan.moved_tables {
        rows.push(row("moved table", name, format!("{} -> {}", moved.from, moved.to)));
    }
    for (name, table) in &plan.new_tables {
        let detail = if table.create_empty { "create empty" } else { "" };
        rows.push(row("new table", name, detail.to_string()));
    }
    for (path, change) in &plan.column_changes {
        for (from, to) in &change.renamed_columns {
            rows.push(row("renamed column", path, format!("{from} -> {to}")));
        }
        if !change.dropped_columns.is_empty() {
            rows.push(row("dropped columns", path, change.dropped_columns.iter().join(", ")));
        }
        if !change.added_columns.is_empty() {
            rows.push(row("added columns", path, change.added_columns.iter().join(", ")));
        }
    }
    for (from, to) in &plan.scenario_changes.renamed_keys {
        rows.push(row("renamed scenario", from, format!("-> {to}")));
    }
    for key in &plan.scenario_changes.new_rows {
        rows.push(row("new scenario", key, "skeleton row".to_string()));
    }
    rows
}

fn row(kind: &str, subject: &str, detail: String) -> Vec<String> {
    vec![kind.to_string(), subject.to_string(), detail]
}

/// Left-aligned columns separated by two spaces, with a dashed rule under the
/// header. Control whitespace inside cells is flattened to spaces.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|h| h.chars().count().max(3))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(clean(cell).chars().count());
        }
    }

    let mut output = String::new();
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let lines = std::iter::once(headers)
        .chain(std::iter::once(rule.as_slice()))
        .chain(rows.iter().map(Vec::as_slice));
    for line in lines {
        let rendered = line
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", clean(cell), width = *width))
            .join("  ");
        let _ = writeln!(output, "{}", rendered.trim_end());
    }
    output
}

fn clean(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}
