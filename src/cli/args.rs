//! Defines the command-line arguments for the transtest CLI.
//!
//! The five mode flags are single letters that may be packed (`-dv`) or
//! given separately, in any order. Every other token names a test to run.

use clap::Parser;
use std::path::PathBuf;

use crate::config::RunOptions;

#[derive(Debug, Parser)]
#[command(
    name = "transtest",
    version,
    about = "Regression tests for a source-to-source translator: translate, diff, build, run and compare."
)]
pub struct TranstestArgs {
    /// Trace internals to the highlighted debug stream.
    #[arg(short, long)]
    pub debug: bool,

    /// Relay the output of external tools live.
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not truncate traced program output.
    #[arg(short, long)]
    pub unlimited: bool,

    /// Accept a clean structural diff as a pass without building.
    #[arg(short, long)]
    pub fast: bool,

    /// Overwrite Target with Output when every stage succeeds.
    #[arg(short, long)]
    pub overwrite: bool,

    /// Directory holding the test folders (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// YAML configuration file (defaults to <root>/transtest.yaml when present).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print results as JSON instead of the table; suppresses progress output.
    #[arg(long)]
    pub json: bool,

    /// Tests to run, by folder name. All discovered tests run when omitted.
    #[arg(value_name = "TEST")]
    pub tests: Vec<String>,
}

impl TranstestArgs {
    pub fn options(&self) -> RunOptions {
        RunOptions {
            debug: self.debug,
            verbose: self.verbose,
            unlimited: self.unlimited,
            fast: self.fast,
            overwrite: self.overwrite,
        }
    }
}
