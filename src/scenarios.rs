//! The scenarios table: a single CSV at the version root whose first column
//! is a unique row key and whose row order is significant.

use std::{
    collections::{HashMap, HashSet, hash_map::Entry},
    path::Path,
};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    frame::Frame,
    layout::DatasetLayout,
    matcher::CandidatePool,
    plan::ScenarioChanges,
};

/// Reads both scenario files and infers key renames and new rows. Any read
/// failure degrades to an empty result so the rest of detection can finish.
pub fn detect_scenario_changes(layout: &DatasetLayout, cutoff: f64) -> ScenarioChanges {
    let read = |path: &Path| {
        Frame::read(path, &layout.format)
            .with_context(|| format!("Reading scenarios from {path:?}"))
    };
    match (read(&layout.old_scenarios()), read(&layout.new_scenarios())) {
        (Ok(old), Ok(new)) => infer_scenario_changes(&old.key_column(), &new.key_column(), cutoff),
        (Err(err), _) | (_, Err(err)) => {
            warn!("Failed to read {}: {err:#}", layout.scenarios_name);
            ScenarioChanges::default()
        }
    }
}

/// Each old key missing from the new version may claim one new-only key as
/// its rename; unclaimed new-only keys become new rows (sorted).
pub fn infer_scenario_changes(
    old_keys: &[String],
    new_keys: &[String],
    cutoff: f64,
) -> ScenarioChanges {
    let old_set = old_keys.iter().map(String::as_str).collect::<HashSet<_>>();
    let new_set = new_keys.iter().map(String::as_str).collect::<HashSet<_>>();
    let mut pool = CandidatePool::new(
        new_keys
            .iter()
            .filter(|k| !old_set.contains(k.as_str()))
            .cloned(),
    );

    let mut changes = ScenarioChanges::default();
    let mut seen = HashSet::new();
    for key in old_keys {
        if new_set.contains(key.as_str()) || !seen.insert(key.as_str()) {
            continue;
        }
        if let Some(found) = pool.claim(key, cutoff) {
            changes.renamed_keys.insert(key.clone(), found);
        }
    }
    changes.new_rows = pool.into_remaining().into_iter().collect();
    changes
}

/// Rebuilds the scenario rows in the new version's order.
///
/// Keys are renamed in place, a skeleton row (key only) is appended for every
/// new key, and the rows are then laid out exactly as `new_order` lists them.
/// Old keys that `new_order` does not mention are dropped. The old table's
/// columns are kept.
pub fn reconcile_scenarios(old: &Frame, new_order: &[String], changes: &ScenarioChanges) -> Frame {
    let width = old.headers.len();
    let skeleton = |key: &str| {
        let mut row = vec![String::new(); width.max(1)];
        row[0] = key.to_string();
        row
    };

    let mut combined = old.rows.clone();
    for row in &mut combined {
        if let Some(key) = row.first_mut()
            && let Some(renamed) = changes.renamed_keys.get(key.as_str())
        {
            *key = renamed.clone();
        }
    }
    let present = combined
        .iter()
        .filter_map(|row| row.first().cloned())
        .collect::<HashSet<_>>();
    for key in &changes.new_rows {
        if !present.contains(key) {
            combined.push(skeleton(key));
        }
    }

    let mut by_key: HashMap<&str, &Vec<String>> = HashMap::new();
    for row in &combined {
        let Some(key) = row.first() else {
            continue;
        };
        match by_key.entry(key.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
            Entry::Occupied(_) => {
                warn!("Duplicate scenario key '{key}'; keeping its first row");
            }
        }
    }
    let rows = new_order
        .iter()
        .map(|key| {
            by_key
                .get(key.as_str())
                .map(|row| (*row).clone())
                .unwrap_or_else(|| skeleton(key))
        })
        .collect();
    Frame::new(old.headers.clone(), rows)
}

/// Writes the reconciled scenarios table under `output_root`. Missing or
/// unreadable scenario files skip the step.
pub fn migrate_scenarios(
    layout: &DatasetLayout,
    output_root: &Path,
    changes: &ScenarioChanges,
) -> Result<()> {
    let old_path = layout.old_scenarios();
    let new_path = layout.new_scenarios();
    if !old_path.is_file() || !new_path.is_file() {
        warn!(
            "Skipping {}: not present in both versions",
            layout.scenarios_name
        );
        return Ok(());
    }
    let old = Frame::read(&old_path, &layout.format)?;
    let new = Frame::read(&new_path, &layout.format)?;
    if old.headers.is_empty() {
        warn!("Skipping {}: old file has no columns", layout.scenarios_name);
        return Ok(());
    }
    let reconciled = reconcile_scenarios(&old, &new.key_column(), changes);
    let destination = output_root.join(&layout.scenarios_name);
    reconciled.write(&destination)?;
    info!(
        "Updated {} with renamed and new rows ({} row(s), ordered by new version)",
        layout.scenarios_name,
        reconciled.rows.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::matcher::SCENARIO_CUTOFF;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn old_frame() -> Frame {
        Frame::new(
            strings(&["scenario", "growth", "label"]),
            vec![
                strings(&["A", "1.0", "base"]),
                strings(&["B", "2.0", "high"]),
                strings(&["C", "0.5", "low"]),
            ],
        )
    }

    #[test]
    fn rows_follow_new_order_with_skeletons() {
        let changes = infer_scenario_changes(
            &strings(&["A", "B", "C"]),
            &strings(&["C", "A", "D"]),
            SCENARIO_CUTOFF,
        );
        assert!(changes.renamed_keys.is_empty());
        assert_eq!(changes.new_rows, strings(&["D"]));

        let result = reconcile_scenarios(&old_frame(), &strings(&["C", "A", "D"]), &changes);
        assert_eq!(result.key_column(), strings(&["C", "A", "D"]));
        assert_eq!(result.rows[0], strings(&["C", "0.5", "low"]));
        assert_eq!(result.rows[2], strings(&["D", "", ""]));
    }

    #[test]
    fn renamed_key_keeps_its_fields() {
        let changes = ScenarioChanges {
            renamed_keys: BTreeMap::from([("B".to_string(), "B2".to_string())]),
            new_rows: Vec::new(),
        };
        let result = reconcile_scenarios(&old_frame(), &strings(&["B2", "A"]), &changes);
        assert_eq!(result.rows[0], strings(&["B2", "2.0", "high"]));
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn duplicate_keys_collapse_to_first_row() {
        let old = Frame::new(
            strings(&["scenario", "growth"]),
            vec![strings(&["A", "1"]), strings(&["A", "9"]), strings(&["B", "2"])],
        );
        let result =
            reconcile_scenarios(&old, &strings(&["A", "B"]), &ScenarioChanges::default());
        assert_eq!(result.rows, vec![strings(&["A", "1"]), strings(&["B", "2"])]);
    }

    #[test]
    fn close_keys_are_renamed_once() {
        let changes = infer_scenario_changes(
            &strings(&["baseline_2030", "baseline_2031", "stress"]),
            &strings(&["baseline_2035", "stress"]),
            SCENARIO_CUTOFF,
        );
        assert_eq!(changes.renamed_keys.len(), 1);
        assert_eq!(changes.renamed_keys["baseline_2030"], "baseline_2035");
        assert!(changes.new_rows.is_empty());
    }

    #[test]
    fn new_rows_are_sorted() {
        let changes =
            infer_scenario_changes(&strings(&["x"]), &strings(&["zeta", "alpha"]), SCENARIO_CUTOFF);
        assert_eq!(changes.new_rows, strings(&["alpha", "zeta"]));
    }
}
