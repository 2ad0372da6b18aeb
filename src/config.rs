//! Harness configuration: run-mode flags from the command line and the
//! tool/layout settings from an optional YAML file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TranstestError};

/// Configuration file picked up from the test root when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "transtest.yaml";

/// Placeholder replaced by a test's project name in path templates.
pub const PROJECT_PLACEHOLDER: &str = "{project}";

/// The five mode flags of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunOptions {
    /// Trace internals to the highlighted debug stream.
    pub debug: bool,
    /// Relay child-process stdout live.
    pub verbose: bool,
    /// Do not truncate traced process output.
    pub unlimited: bool,
    /// Accept a clean structural diff as a pass without rebuilding.
    pub fast: bool,
    /// Promote Output to Target after a fully successful test.
    pub overwrite: bool,
}

/// External tools and directory layout used by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub translator: PathBuf,
    /// Prefix for managed executables (translator and reference binaries),
    /// e.g. `mono`.
    pub launcher: Option<String>,
    pub library_path: PathBuf,
    pub target_language: String,
    pub configure_tool: String,
    pub configure_args: Vec<String>,
    pub build_tool: String,
    pub build_target: String,
    pub diff_tool: String,
    pub diff_excludes: Vec<String>,
    /// Relative to the test directory.
    pub reference_binary: String,
    /// Relative to the test's Output directory.
    pub translated_binary: String,
    pub ignore_folders: Vec<String>,
    pub source_extensions: Vec<String>,
    pub trace_limit: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            translator: PathBuf::from("../AlterNative/bin/Debug/AlterNative.exe"),
            launcher: None,
            library_path: PathBuf::from("../Lib/"),
            target_language: "CXX".to_string(),
            configure_tool: "cmake".to_string(),
            configure_args: vec!["..".to_string()],
            build_tool: "msbuild".to_string(),
            build_target: "{project}Proj.sln".to_string(),
            diff_tool: "diff".to_string(),
            diff_excludes: vec!["CMakeLists.txt".to_string()],
            reference_binary: "NETbin/{project}.exe".to_string(),
            translated_binary: "build/Debug/{project}.exe".to_string(),
            ignore_folders: ["gc", "boost", "System", "build"]
                .into_iter()
                .map(String::from)
                .collect(),
            source_extensions: ["cs", "c", "cpp", "h"]
                .into_iter()
                .map(String::from)
                .collect(),
            trace_limit: 100,
        }
    }
}

impl HarnessConfig {
    pub fn from_yaml(text: &str, origin: &Path) -> Result<Self> {
        // An empty document deserializes to unit, not to a mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| TranstestError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| TranstestError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text, path)
    }

    /// Loads `explicit` if given, else `<root>/transtest.yaml` if present,
    /// else the defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let implicit = root.join(DEFAULT_CONFIG_FILE);
        if implicit.is_file() {
            Self::from_file(&implicit)
        } else {
            Ok(Self::default())
        }
    }

    /// A bare command name is left for `PATH` lookup; any other relative
    /// path resolves against the test root.
    pub fn translator_path(&self, root: &Path) -> PathBuf {
        if self.translator.components().count() == 1 && !self.translator.is_absolute() {
            return self.translator.clone();
        }
        root.join(&self.translator)
    }

    pub fn library_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.library_path)
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore_folders.iter().any(|f| f == name)
    }

    pub fn is_source_extension(&self, ext: &str) -> bool {
        self.source_extensions.iter().any(|e| e == ext)
    }
}

/// Substitutes the project name into a path template.
pub fn expand_template(template: &str, project: &str) -> String {
    template.replace(PROJECT_PLACEHOLDER, project)
}
