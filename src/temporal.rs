//! Temporal sub-datasets: a directory of identically shaped subdirectories
//! (one per period or segment). Every old subdirectory is brought in line with
//! the reference structure, which is the file layout of the first
//! subdirectory (by name) of the new version.

use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::Path,
};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    frame::Frame,
    io_utils,
    layout::DatasetLayout,
    matcher,
};

/// File name → ordered header, taken from one new-version subdirectory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceStructure {
    pub source: String,
    pub files: BTreeMap<String, Vec<String>>,
}

impl ReferenceStructure {
    /// Builds the reference from the first subdirectory of `temporal_root`,
    /// or `None` when there is no subdirectory.
    pub fn from_dir(temporal_root: &Path, layout: &DatasetLayout) -> Result<Option<Self>> {
        let Some(first) = io_utils::list_subdirectories(temporal_root)?.into_iter().next() else {
            return Ok(None);
        };
        let mut files = BTreeMap::new();
        for file in io_utils::list_csv_files(&temporal_root.join(&first))? {
            let Some(name) = file.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            files.insert(name, io_utils::read_headers(&file, &layout.format)?);
        }
        Ok(Some(Self {
            source: first,
            files,
        }))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TemporalSummary {
    pub subdirectories: usize,
    pub added_files: usize,
    pub updated_files: usize,
}

/// Renames near-miss columns to their reference spelling, drops columns the
/// reference lacks, adds missing ones empty, and reorders to the reference.
///
/// A column is only renamed when it is not already a reference column and its
/// best reference match is not already present in the frame.
pub fn conform_to_reference(frame: &mut Frame, reference: &[String], cutoff: f64) {
    let current = frame.headers.iter().cloned().collect::<HashSet<_>>();
    let mut renames = BTreeMap::new();
    for column in &frame.headers {
        if reference.contains(column) {
            continue;
        }
        if let Some(found) = matcher::best_match(column, reference.iter().map(String::as_str), cutoff)
            && !current.contains(found)
        {
            renames.insert(column.clone(), found.to_string());
        }
    }
    frame.rename_columns(&renames);
    frame.reindex_columns(reference);
}

/// Reconciles every old temporal subdirectory into `output_root`. Missing
/// temporal trees are skipped with a diagnostic.
pub fn migrate_temporal(
    layout: &DatasetLayout,
    output_root: &Path,
    cutoff: f64,
) -> Result<TemporalSummary> {
    let old_root = layout.old_temporal();
    let new_root = layout.new_temporal();
    let mut summary = TemporalSummary::default();

    if !old_root.is_dir() || !new_root.is_dir() {
        info!("No temporal directory found in old or new structure. Skipping temporal migration.");
        return Ok(summary);
    }
    let Some(reference) = ReferenceStructure::from_dir(&new_root, layout)? else {
        info!("No temporal subdirectories found in new structure.");
        return Ok(summary);
    };
    info!(
        "Using temporal subdirectory '{}' as reference ({} file(s))",
        reference.source,
        reference.files.len()
    );

    let out_root = layout.output_temporal(output_root);
    fs::create_dir_all(&out_root)
        .with_context(|| format!("Creating directory {out_root:?}"))?;
    for subdir in io_utils::list_subdirectories(&old_root)? {
        let out_dir = out_root.join(&subdir);
        io_utils::copy_csv_files(&old_root.join(&subdir), &out_dir)?;
        summary.subdirectories += 1;

        for (file_name, columns) in &reference.files {
            let target = out_dir.join(file_name);
            let relative = io_utils::display_relative(&target, output_root);
            if !target.exists() {
                match Frame::empty(columns).write(&target) {
                    Ok(()) => {
                        summary.added_files += 1;
                        info!("Added new CSV to temporal subfolder: {relative}");
                    }
                    Err(err) => warn!("Failed to create {relative}: {err:#}"),
                }
                continue;
            }
            let result = Frame::read(&target, &layout.format).and_then(|mut frame| {
                conform_to_reference(&mut frame, columns, cutoff);
                frame.write(&target)
            });
            match result {
                Ok(()) => {
                    summary.updated_files += 1;
                    info!("Updated temporal CSV: {relative}");
                }
                Err(err) => warn!("Failed to update {relative}: {err:#}"),
            }
        }
    }
    Ok(summary)
}
