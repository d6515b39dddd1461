//! Migration: applies a change plan to the old dataset and writes the result
//! in the new layout.
//!
//! Stages run in order (reorganize, scenarios, columns, temporal) and all
//! receive the same immutable [`ChangePlan`]. A stage that fails on one table
//! or file logs the problem and moves on; only an unusable manifest or plan
//! stops the run.

use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    cli::MigrateArgs,
    columns,
    layout::DatasetLayout,
    manifest::Manifest,
    plan::ChangePlan,
    reorganize, scenarios, temporal,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MigrationSummary {
    pub reorganize: reorganize::ReorganizeSummary,
    pub updated_table_files: usize,
    pub temporal: temporal::TemporalSummary,
}

pub fn execute(args: &MigrateArgs) -> Result<()> {
    let layout =
        DatasetLayout::from_args(&args.dataset)?.with_temporal_dir(args.temporal.as_str());
    let plan = ChangePlan::load(&args.plan)
        .with_context(|| format!("Loading change plan from {:?}", args.plan))?;
    migrate(&layout, &plan, &args.output, args.temporal_cutoff)?;
    info!("Migration complete. Check output in: {}", args.output.display());
    Ok(())
}

pub fn migrate(
    layout: &DatasetLayout,
    plan: &ChangePlan,
    output_root: &Path,
    temporal_cutoff: f64,
) -> Result<MigrationSummary> {
    let old = Manifest::load(&layout.old_manifest(), &layout.format)
        .with_context(|| format!("Loading old manifest {:?}", layout.old_manifest()))?;
    let new = Manifest::load(&layout.new_manifest(), &layout.format)
        .with_context(|| format!("Loading new manifest {:?}", layout.new_manifest()))?;
    let tables = plan.classify(&old, &new)?;

    let mut summary = MigrationSummary {
        reorganize: reorganize::reorganize(layout, output_root, &tables)?,
        ..MigrationSummary::default()
    };

    if let Err(err) = scenarios::migrate_scenarios(layout, output_root, &plan.scenario_changes) {
        warn!("Failed to update {}: {err:#}", layout.scenarios_name);
    }

    let unknown = plan.unknown_column_change_paths(&new);
    for path in &unknown {
        warn!("Ignoring column changes for '{path}': not a path of the new manifest");
    }
    let mut column_changes = plan.column_changes.clone();
    column_changes.retain(|path, _| !unknown.contains(&path.as_str()));
    summary.updated_table_files = columns::reconcile_columns(layout, output_root, &column_changes)?;

    summary.temporal = temporal::migrate_temporal(layout, output_root, temporal_cutoff)?;
    Ok(summary)
}
