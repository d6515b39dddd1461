pub mod cli;
pub mod columns;
pub mod detect;
pub mod error;
pub mod frame;
pub mod io_utils;
pub mod layout;
pub mod manifest;
pub mod matcher;
pub mod migrate;
pub mod plan;
pub mod reorganize;
pub mod scenarios;
pub mod table;
pub mod temporal;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_drift", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Detect(args) => detect::execute(&args),
        Commands::Migrate(args) => migrate::execute(&args),
        Commands::Show(args) => table::execute(&args),
    }
}
