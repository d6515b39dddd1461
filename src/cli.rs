use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    layout::{
        DEFAULT_MANIFEST_NAME, DEFAULT_NEW_ROOT, DEFAULT_OLD_ROOT, DEFAULT_OUTPUT_ROOT,
        DEFAULT_PLAN_FILE, DEFAULT_SCENARIOS_NAME, DEFAULT_TEMPORAL_DIR,
    },
    matcher::{COLUMN_CUTOFF, SCENARIO_CUTOFF, TABLE_CUTOFF, TEMPORAL_CUTOFF},
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Detect schema drift between two CSV dataset versions and migrate the data",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare the old and new versions and write a reviewable change plan
    Detect(DetectArgs),
    /// Apply a change plan and write the migrated dataset
    Migrate(MigrateArgs),
    /// Print a change plan as a table for review
    Show(ShowArgs),
}

#[derive(Debug, Args)]
pub struct DatasetArgs {
    /// Root directory of the old dataset version
    #[arg(long, default_value = DEFAULT_OLD_ROOT)]
    pub old: PathBuf,
    /// Root directory of the new dataset version
    #[arg(long, default_value = DEFAULT_NEW_ROOT)]
    pub new: PathBuf,
    /// File name of the table manifest at each version root
    #[arg(long, default_value = DEFAULT_MANIFEST_NAME)]
    pub manifest: String,
    /// File name of the scenarios table at each version root
    #[arg(long, default_value = DEFAULT_SCENARIOS_NAME)]
    pub scenarios: String,
    /// CSV delimiter character of the input files (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct DetectArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    /// Destination of the change plan
    #[arg(short, long, default_value = DEFAULT_PLAN_FILE)]
    pub plan: PathBuf,
    /// Minimum similarity for a table rename
    #[arg(long = "table-cutoff", default_value_t = TABLE_CUTOFF, value_parser = parse_cutoff)]
    pub table_cutoff: f64,
    /// Minimum similarity for a column rename
    #[arg(long = "column-cutoff", default_value_t = COLUMN_CUTOFF, value_parser = parse_cutoff)]
    pub column_cutoff: f64,
    /// Minimum similarity for a scenario key rename
    #[arg(long = "scenario-cutoff", default_value_t = SCENARIO_CUTOFF, value_parser = parse_cutoff)]
    pub scenario_cutoff: f64,
}

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    /// Change plan produced by `detect`
    #[arg(short, long, default_value = DEFAULT_PLAN_FILE)]
    pub plan: PathBuf,
    /// Root directory for the migrated dataset
    #[arg(short, long, default_value = DEFAULT_OUTPUT_ROOT)]
    pub output: PathBuf,
    /// Name of the temporal directory at each version root
    #[arg(long, default_value = DEFAULT_TEMPORAL_DIR)]
    pub temporal: String,
    /// Minimum similarity for a column rename inside temporal files
    #[arg(long = "temporal-cutoff", default_value_t = TEMPORAL_CUTOFF, value_parser = parse_cutoff)]
    pub temporal_cutoff: f64,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Change plan to display
    #[arg(short, long, default_value = DEFAULT_PLAN_FILE)]
    pub plan: PathBuf,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

pub fn parse_cutoff(value: &str) -> Result<f64, String> {
    let parsed = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if (0.0..=1.0).contains(&parsed) {
        Ok(parsed)
    } else {
        Err("Cutoff must be between 0 and 1".to_string())
    }
}
