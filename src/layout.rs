//! Where the two dataset versions live and how their files are named.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::{
    cli::DatasetArgs,
    io_utils::{self, CsvFormat},
};

pub const DEFAULT_OLD_ROOT: &str = "inputs/old_version";
pub const DEFAULT_NEW_ROOT: &str = "inputs/new_version";
pub const DEFAULT_PLAN_FILE: &str = "detected_changes.yaml";
pub const DEFAULT_OUTPUT_ROOT: &str = "migrated_output";
pub const DEFAULT_MANIFEST_NAME: &str = "csv_structure.csv";
pub const DEFAULT_SCENARIOS_NAME: &str = "scenarios.csv";
pub const DEFAULT_TEMPORAL_DIR: &str = "temporal";

#[derive(Debug, Clone)]
pub struct DatasetLayout {
    pub old_root: PathBuf,
    pub new_root: PathBuf,
    pub manifest_name: String,
    pub scenarios_name: String,
    pub temporal_dir: String,
    pub format: CsvFormat,
}

impl DatasetLayout {
    pub fn new(old_root: impl Into<PathBuf>, new_root: impl Into<PathBuf>) -> Self {
        Self {
            old_root: old_root.into(),
            new_root: new_root.into(),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            scenarios_name: DEFAULT_SCENARIOS_NAME.to_string(),
            temporal_dir: DEFAULT_TEMPORAL_DIR.to_string(),
            format: CsvFormat::default(),
        }
    }

    pub fn from_args(args: &DatasetArgs) -> Result<Self> {
        let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
        Ok(Self {
            old_root: args.old.clone(),
            new_root: args.new.clone(),
            manifest_name: args.manifest.clone(),
            scenarios_name: args.scenarios.clone(),
            temporal_dir: DEFAULT_TEMPORAL_DIR.to_string(),
            format: CsvFormat {
                delimiter: args.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER),
                encoding,
            },
        })
    }

    pub fn with_temporal_dir(mut self, name: impl Into<String>) -> Self {
        self.temporal_dir = name.into();
        self
    }

    pub fn old_manifest(&self) -> PathBuf {
        self.old_root.join(&self.manifest_name)
    }

    pub fn new_manifest(&self) -> PathBuf {
        self.new_root.join(&self.manifest_name)
    }

    pub fn old_scenarios(&self) -> PathBuf {
        self.old_root.join(&self.scenarios_name)
    }

    pub fn new_scenarios(&self) -> PathBuf {
        self.new_root.join(&self.scenarios_name)
    }

    pub fn old_table_dir(&self, storage: &str) -> PathBuf {
        self.old_root.join(storage)
    }

    pub fn new_table_dir(&self, storage: &str) -> PathBuf {
        self.new_root.join(storage)
    }

    pub fn old_temporal(&self) -> PathBuf {
        self.old_root.join(&self.temporal_dir)
    }

    pub fn new_temporal(&self) -> PathBuf {
        self.new_root.join(&self.temporal_dir)
    }

    pub fn output_temporal(&self, output_root: &Path) -> PathBuf {
        output_root.join(&self.temporal_dir)
    }
}
