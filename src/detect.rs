//! Drift detection: infer table and column changes between two dataset
//! versions and persist them as a [`ChangePlan`].
//!
//! ## Tables
//!
//! Names present in both manifests are `Unchanged` or `Moved` depending on
//! whether their path changed. Each name only in the old manifest may claim
//! one name only in the new manifest as its rename target; claimed names are
//! removed from the pool, and what is left of the pool becomes `New`.
//! Unmatched old-only tables are dropped from the result.
//!
//! ## Columns
//!
//! For every matched table whose directory exists in both versions, the
//! header of the first CSV file (by name) on each side is compared.

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{debug, info, warn};

use crate::{
    cli::DetectArgs,
    io_utils::{self, CsvFormat},
    layout::DatasetLayout,
    manifest::Manifest,
    matcher::{self, CandidatePool, MatchCutoffs},
    plan::{ChangePlan, ColumnChange, TableChange},
    scenarios,
};

pub fn execute(args: &DetectArgs) -> Result<()> {
    let layout = DatasetLayout::from_args(&args.dataset)?;
    let cutoffs = MatchCutoffs {
        table: args.table_cutoff,
        column: args.column_cutoff,
        scenario: args.scenario_cutoff,
        ..MatchCutoffs::default()
    };
    info!(
        "Detecting changes between {:?} and {:?}",
        layout.old_root, layout.new_root
    );
    let plan = detect(&layout, &cutoffs)?;
    plan.save(&args.plan)
        .with_context(|| format!("Writing change plan to {:?}", args.plan))?;
    info!(
        "Changes written to {:?}: {} renamed, {} moved, {} new table(s), {} column change(s), {} renamed key(s), {} new row(s)",
        args.plan,
        plan.renamed_tables.len(),
        plan.moved_tables.len(),
        plan.new_tables.len(),
        plan.column_changes.len(),
        plan.scenario_changes.renamed_keys.len(),
        plan.scenario_changes.new_rows.len()
    );
    Ok(())
}

/// Runs the full detection pipeline over `layout`.
pub fn detect(layout: &DatasetLayout, cutoffs: &MatchCutoffs) -> Result<ChangePlan> {
    cutoffs.validate()?;
    let old = Manifest::load(&layout.old_manifest(), &layout.format)
        .with_context(|| format!("Loading old manifest {:?}", layout.old_manifest()))?;
    let new = Manifest::load(&layout.new_manifest(), &layout.format)
        .with_context(|| format!("Loading new manifest {:?}", layout.new_manifest()))?;
    debug!("Old manifest lists {} table(s), new lists {}", old.len(), new.len());

    let tables = infer_table_changes(&old, &new, cutoffs.table);

    let mut column_changes = BTreeMap::new();
    for (name, change) in &tables {
        let Some(source) = change.source() else {
            continue;
        };
        let target = change.target();
        let old_dir = layout.old_table_dir(source);
        let new_dir = layout.new_table_dir(target);
        if !old_dir.exists() || !new_dir.exists() {
            continue;
        }
        match infer_column_changes(&old_dir, &new_dir, &layout.format, cutoffs.column) {
            Ok(Some(columns)) => {
                debug!("Column changes for '{name}' at '{target}': {columns:?}");
                column_changes.insert(target.to_string(), columns);
            }
            Ok(None) => {}
            Err(err) => warn!("Skipping column comparison for '{name}': {err:#}"),
        }
    }

    let scenario_changes = scenarios::detect_scenario_changes(layout, cutoffs.scenario);
    Ok(ChangePlan::from_table_changes(
        &tables,
        column_changes,
        scenario_changes,
    ))
}

/// Classifies every table of the two manifests.
pub fn infer_table_changes(
    old: &Manifest,
    new: &Manifest,
    cutoff: f64,
) -> BTreeMap<String, TableChange> {
    let mut tables = BTreeMap::new();
    let mut pool = CandidatePool::new(new.names().filter(|name| !old.contains(name)));

    for (name, from) in old.entries() {
        match new.path(name) {
            Some(to) if to == from => {
                tables.insert(
                    name.to_string(),
                    TableChange::Unchanged {
                        from: from.to_string(),
                        to: to.to_string(),
                    },
                );
            }
            Some(to) => {
                tables.insert(
                    name.to_string(),
                    TableChange::Moved {
                        from: from.to_string(),
                        to: to.to_string(),
                    },
                );
            }
            None => {
                let Some(new_name) = pool.claim(name, cutoff) else {
                    debug!("Table '{name}' has no counterpart in the new version");
                    continue;
                };
                let to = new.path(&new_name).unwrap_or_default().to_string();
                debug!("Table '{name}' looks renamed to '{new_name}'");
                tables.insert(
                    name.to_string(),
                    TableChange::Renamed {
                        new_name,
                        from: from.to_string(),
                        to,
                    },
                );
            }
        }
    }

    for name in pool.into_remaining() {
        let path = new.path(&name).unwrap_or_default().to_string();
        tables.insert(name, TableChange::New { path });
    }
    tables
}

/// Compares the first CSV header of `old_dir` with that of `new_dir`.
/// Returns `None` when either directory has no CSV file or nothing changed.
pub fn infer_column_changes(
    old_dir: &Path,
    new_dir: &Path,
    format: &CsvFormat,
    cutoff: f64,
) -> Result<Option<ColumnChange>> {
    let (Some(old_file), Some(new_file)) = (
        io_utils::first_csv_file(old_dir)?,
        io_utils::first_csv_file(new_dir)?,
    ) else {
        return Ok(None);
    };
    let old_columns = io_utils::read_headers(&old_file, format)?;
    let new_columns = io_utils::read_headers(&new_file, format)?;
    Ok(diff_columns(&old_columns, &new_columns, cutoff))
}

/// Header-level column diff.
///
/// An old column is renamed to its best new match unless that match is
/// itself one of the old columns.
pub fn diff_columns(
    old_columns: &[String],
    new_columns: &[String],
    cutoff: f64,
) -> Option<ColumnChange> {
    let mut renamed_columns = BTreeMap::new();
    for column in old_columns {
        let Some(found) = matcher::best_match(column, new_columns.iter().map(String::as_str), cutoff)
        else {
            continue;
        };
        if !old_columns.iter().any(|c| c == found) {
            renamed_columns.insert(column.clone(), found.to_string());
        }
    }
    let dropped_columns = old_columns
        .iter()
        .filter(|c| !new_columns.contains(c) && !renamed_columns.contains_key(c.as_str()))
        .cloned()
        .collect_vec();
    let added_columns = new_columns
        .iter()
        .filter(|c| !old_columns.contains(c) && !renamed_columns.values().any(|v| v == *c))
        .cloned()
        .collect_vec();

    let change = ColumnChange {
        renamed_columns,
        dropped_columns,
        added_columns,
    };
    (!change.is_empty()).then_some(change)
}
