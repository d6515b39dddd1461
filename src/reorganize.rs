//! Physically lays the old data out at the new paths under the output root.
//!
//! Only ever creates or overwrites files inside the output tree.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    io_utils,
    layout::DatasetLayout,
    plan::TableChange,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReorganizeSummary {
    pub copied_tables: usize,
    pub empty_tables: usize,
    pub failed_tables: usize,
}

/// Places every classified table at its new path, then copies the new
/// manifest into `output_root`.
pub fn reorganize(
    layout: &DatasetLayout,
    output_root: &Path,
    tables: &BTreeMap<String, TableChange>,
) -> Result<ReorganizeSummary> {
    fs::create_dir_all(output_root)
        .with_context(|| format!("Creating output directory {output_root:?}"))?;

    let mut summary = ReorganizeSummary::default();
    for (name, change) in tables {
        match place_table(layout, output_root, change) {
            Ok(true) => summary.copied_tables += 1,
            Ok(false) => summary.empty_tables += 1,
            Err(err) => {
                summary.failed_tables += 1;
                warn!("Failed to place table '{name}': {err:#}");
            }
        }
    }

    let manifest_target = output_root.join(&layout.manifest_name);
    fs::copy(layout.new_manifest(), &manifest_target).with_context(|| {
        format!(
            "Copying {:?} to {manifest_target:?}",
            layout.new_manifest()
        )
    })?;
    info!("Copied new {}", layout.manifest_name);
    info!(
        "Reorganized {} table(s) with data, {} empty, {} failed",
        summary.copied_tables, summary.empty_tables, summary.failed_tables
    );
    Ok(summary)
}

/// Copies the table's CSV files when its old directory has any, otherwise
/// just creates the target directory. Returns whether data was copied.
fn place_table(layout: &DatasetLayout, output_root: &Path, change: &TableChange) -> Result<bool> {
    let destination = output_root.join(change.target());
    let Some(source) = change.source() else {
        fs::create_dir_all(&destination)
            .with_context(|| format!("Creating directory {destination:?}"))?;
        return Ok(false);
    };

    let source_dir = layout.old_table_dir(source);
    if io_utils::list_csv_files(&source_dir)?.is_empty() {
        fs::create_dir_all(&destination)
            .with_context(|| format!("Creating directory {destination:?}"))?;
        return Ok(false);
    }

    let label = match change {
        TableChange::Renamed { .. } => "Renamed",
        TableChange::Moved { .. } => "Moved",
        _ => "Copied",
    };
    for copied in io_utils::copy_csv_files(&source_dir, &destination)? {
        let Some(file_name) = copied.file_name() else {
            continue;
        };
        info!(
            "{label} {} -> {}",
            io_utils::display_relative(&source_dir.join(file_name), &layout.old_root),
            io_utils::display_relative(&destination, output_root)
        );
    }
    Ok(true)
}
