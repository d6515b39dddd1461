//! Rewrites already-reorganized table files so their columns match the new
//! version's header exactly.

use std::{collections::BTreeMap, path::Path};

use anyhow::Result;
use log::{debug, info, warn};

use crate::{
    frame::Frame,
    io_utils,
    layout::DatasetLayout,
    plan::ColumnChange,
};

/// Renames, drops, and adds columns per `change`, then reorders to
/// `new_columns`. Any column not in `new_columns` is lost.
pub fn apply_column_change(frame: &mut Frame, change: &ColumnChange, new_columns: &[String]) {
    frame.rename_columns(&change.renamed_columns);
    for column in &change.dropped_columns {
        frame.drop_column(column);
    }
    for column in &change.added_columns {
        frame.add_column(column);
    }
    frame.reindex_columns(new_columns);
}

/// Applies every entry of `column_changes` to the files under `output_root`.
/// Returns the number of files rewritten.
pub fn reconcile_columns(
    layout: &DatasetLayout,
    output_root: &Path,
    column_changes: &BTreeMap<String, ColumnChange>,
) -> Result<usize> {
    let mut updated = 0usize;
    for (storage, change) in column_changes {
        let out_dir = output_root.join(storage);
        let new_dir = layout.new_table_dir(storage);
        if !out_dir.is_dir() || !new_dir.is_dir() {
            debug!("Skipping column changes for '{storage}': directory missing");
            continue;
        }
        let Some(reference) = io_utils::first_csv_file(&new_dir)? else {
            debug!("Skipping column changes for '{storage}': no CSV in new version");
            continue;
        };
        let new_columns = io_utils::read_headers(&reference, &layout.format)?;

        for file in io_utils::list_csv_files(&out_dir)? {
            let result = Frame::read(&file, &layout.format).and_then(|mut frame| {
                apply_column_change(&mut frame, change, &new_columns);
                frame.write(&file)
            });
            match result {
                Ok(()) => {
                    updated += 1;
                    info!(
                        "Updated headers in: {}",
                        io_utils::display_relative(&file, output_root)
                    );
                }
                Err(err) => warn!("Failed to update {file:?}: {err:#}"),
            }
        }
    }
    Ok(updated)
}
