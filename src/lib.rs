//! Transtest: a regression-test orchestrator for a source-to-source
//! translator.
//!
//! Each test folder is translated, diffed against its accepted baseline,
//! configured and built with a native toolchain, and finally run side by
//! side with the original program. The outcomes land in a
//! [`record::ResultRecord`] per test and are summarized in a
//! [`report::Scorecard`].

pub use crate::errors::{Result, TranstestError};

pub mod cli;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod fsops;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod runner;
pub mod trace;
