//! The transtest command-line interface.
//!
//! Wires argument parsing, configuration, discovery, the pipeline and
//! result output together.

use std::env;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use crate::cli::args::TranstestArgs;
use crate::config::HarnessConfig;
use crate::discovery::TestDiscoverer;
use crate::errors::{Result, TranstestError};
use crate::pipeline::Pipeline;
use crate::report::{Scorecard, Summary};
use crate::runner::StageRunner;
use crate::trace::Tracer;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = TranstestArgs::parse();
    match execute(&args) {
        Ok(summary) if summary.all_passed() => {}
        Ok(_) => process::exit(1),
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            process::exit(1);
        }
    }
}

/// The test root as an absolute path, since tools run in other directories.
fn resolve_root(args: &TranstestArgs) -> Result<PathBuf> {
    let root = match &args.root {
        Some(root) => root.clone(),
        None => env::current_dir()
            .map_err(|e| TranstestError::io("cannot determine the current directory", e))?,
    };
    // A missing root is reported by discovery.
    Ok(root.canonicalize().unwrap_or(root))
}

/// Runs the selected tests and reports them. Returns the pass/fail counts.
pub fn execute(args: &TranstestArgs) -> Result<Summary> {
    let options = args.options();
    let root = resolve_root(args)?;
    let config = HarnessConfig::load(&root, args.config.as_deref())?;
    let trace = if args.json {
        Tracer::silent()
    } else {
        Tracer::new(options.debug, options.unlimited, config.trace_limit)
    };
    trace.debug(format!("Test root: {}", root.display()));

    let discovered = TestDiscoverer::discover(&root, &trace)?;
    let selected = TestDiscoverer::select(&discovered, &args.tests)?;

    let runner = StageRunner::new(&trace);
    let pipeline = Pipeline::new(&root, &config, options, &runner, &trace);
    let runs = pipeline.run_all(&selected);
    let summary = Summary::from_runs(&runs, options.fast);

    let written = if args.json {
        output::print_json(&output::JsonReport::new(&runs, options))
    } else {
        output::print_report(&Scorecard::build(&runs), &summary)
    };
    written.map_err(|e| TranstestError::io("failed to write the report", e))?;
    Ok(summary)
}
