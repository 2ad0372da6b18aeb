//! The per-test pipeline.
//!
//! Stages run in a fixed order and each one gates the next:
//! translate → structural diff → configure → build → compare, followed by
//! line accounting and the optional baseline overwrite. A stage that is not
//! reached stays [`StageStatus::Skipped`] in the [`ResultRecord`].

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};

use crate::config::{expand_template, HarnessConfig, RunOptions};
use crate::discovery::{TestCase, OUTPUT_DIR};
use crate::fsops::DirectoryOps;
use crate::record::{Delta, DiffStatus, OutputStatus, ResultRecord, StageStatus};
use crate::runner::{Invocation, Invoke, OutputMode, LAUNCH_FAILED};
use crate::trace::Tracer;

/// Exit code reported for a structural diff when one side is missing.
const DIFF_MISSING_SIDE: i32 = 1;

/// One executed test and its outcome.
#[derive(Debug, Clone)]
pub struct TestRun {
    pub case: TestCase,
    pub record: ResultRecord,
}

pub struct Pipeline<'a> {
    root: &'a Path,
    config: &'a HarnessConfig,
    options: RunOptions,
    invoker: &'a dyn Invoke,
    trace: &'a Tracer,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        root: &'a Path,
        config: &'a HarnessConfig,
        options: RunOptions,
        invoker: &'a dyn Invoke,
        trace: &'a Tracer,
    ) -> Self {
        Self {
            root,
            config,
            options,
            invoker,
            trace,
        }
    }

    fn fs(&self) -> DirectoryOps<'a> {
        DirectoryOps::new(self.config, self.trace)
    }

    /// Tool output is relayed live in verbose mode and discarded otherwise.
    fn tool_mode(&self) -> OutputMode {
        if self.options.verbose {
            OutputMode::Relay
        } else {
            OutputMode::Quiet
        }
    }

    pub fn run_all(&self, tests: &[TestCase]) -> Vec<TestRun> {
        tests
            .iter()
            .map(|case| TestRun {
                case: case.clone(),
                record: self.run_test(case),
            })
            .collect()
    }

    /// Runs one test through every stage it reaches.
    ///
    /// Lines are counted before the baseline overwrite rather than after
    /// it, since promotion moves Output's subdirectories into Target and a
    /// later count would miss them.
    pub fn run_test(&self, case: &TestCase) -> ResultRecord {
        self.trace.heading(format!("Running test {}", case.name));
        let mut record = ResultRecord {
            translate: self.translate(case),
            diff: self.structural_diff(case),
            ..ResultRecord::default()
        };

        if record.diff.is_identical() && self.options.fast {
            self.trace.debug("Structural diff clean, fast mode skips the build");
            record.skip_from_configure();
            return record;
        }

        if record.translate.is_success() {
            record.configure = self.configure(case);
        } else {
            record.skip_from_configure();
        }
        if record.configure.is_success() {
            record.build = self.build(case);
        } else {
            record.skip_from_build();
        }
        if record.build.is_success() {
            self.compare(case, &mut record);
        } else {
            record.skip_output();
        }

        // Counted before the overwrite moves Output's subdirectories away.
        if record.translate.is_success() {
            record.lines = Some(self.count_lines(case));
        }

        if record.all_success() && self.options.overwrite {
            record.baseline_updated = self.overwrite_baseline(case);
        }
        record
    }

    fn log_command(&self, title: &str, invocation: &Invocation) {
        self.trace.debug(title);
        self.trace.debug(invocation.command_line());
    }

    // =====================
    // Stages
    // =====================

    fn translate(&self, case: &TestCase) -> StageStatus {
        let output = case.output_dir();
        self.trace.progress(format!("Cleaning directory: {OUTPUT_DIR}"));
        self.fs().clean(&output, false, false);

        self.trace.progress("Running translator...");
        let mut output_arg = OsString::from(output);
        output_arg.push(MAIN_SEPARATOR_STR);
        let invocation = Invocation::launched(
            self.config.launcher.as_deref(),
            self.config.translator_path(self.root),
            &case.dir,
        )
        .arg(self.reference_binary(case))
        .arg(output_arg)
        .arg(&self.config.target_language)
        .arg(self.config.library_dir(self.root))
        .mode(self.tool_mode());
        self.log_command("TRANSLATOR COMMAND:", &invocation);

        StageStatus::from_exit(self.invoker.invoke(&invocation).code)
    }

    fn structural_diff(&self, case: &TestCase) -> DiffStatus {
        self.trace.progress("Diff output source with target source...");
        let code = self.diff_tree(&case.output_dir(), &case.target_dir(), &case.dir);
        self.trace.debug(format!("Exit Code: {code}"));
        DiffStatus::from_exit(code)
    }

    /// Diffs `output` against `target`, then every non-ignored
    /// subdirectory below it; the first nonzero result wins.
    fn diff_tree(&self, output: &Path, target: &Path, cwd: &Path) -> i32 {
        let code = self.diff_dirs(output, target, cwd);
        if code != 0 {
            return code;
        }
        let subdirs = match subdirectories(output) {
            Ok(subdirs) => subdirs,
            Err(e) => {
                self.trace
                    .debug(format!("IOException: {}: {e}", output.display()));
                return LAUNCH_FAILED;
            }
        };
        for sub in subdirs {
            let Some(name) = sub.file_name() else {
                continue;
            };
            if self.config.is_ignored(&name.to_string_lossy()) {
                self.trace
                    .debug(format!("Ignoring {} folder", name.to_string_lossy()));
                continue;
            }
            let code = self.diff_tree(&sub, &target.join(name), cwd);
            if code != 0 {
                return code;
            }
        }
        0
    }

    fn diff_dirs(&self, output: &Path, target: &Path, cwd: &Path) -> i32 {
        if !output.is_dir() || !target.is_dir() {
            return DIFF_MISSING_SIDE;
        }
        let mut invocation = Invocation::new(&self.config.diff_tool, cwd).arg("-q");
        for exclude in &self.config.diff_excludes {
            invocation = invocation.arg("-x").arg(exclude);
        }
        let invocation = invocation.arg(output).arg(target).mode(self.tool_mode());
        self.log_command("DIFF COMMAND:", &invocation);
        self.invoker.invoke(&invocation).code
    }

    fn configure(&self, case: &TestCase) -> StageStatus {
        self.trace.progress("Configuring native source project...");
        let build_dir = case.build_dir();
        if let Err(e) = fs::create_dir_all(&build_dir) {
            self.trace.warn(format!(
                "Could not create {}: {e}",
                build_dir.display()
            ));
            return StageStatus::Failed(LAUNCH_FAILED);
        }
        let invocation = Invocation::new(&self.config.configure_tool, &build_dir)
            .args(&self.config.configure_args)
            .mode(self.tool_mode());
        self.log_command("CONFIGURE COMMAND:", &invocation);
        StageStatus::from_exit(self.invoker.invoke(&invocation).code)
    }

    fn build(&self, case: &TestCase) -> StageStatus {
        self.trace.progress("Building native code...");
        let target_file = expand_template(&self.config.build_target, case.project());
        self.trace.debug(format!("Target file: {target_file}"));
        let invocation = Invocation::new(&self.config.build_tool, case.build_dir())
            .arg(target_file)
            .mode(self.tool_mode());
        self.log_command("BUILD COMMAND:", &invocation);
        StageStatus::from_exit(self.invoker.invoke(&invocation).code)
    }

    /// Runs the reference and the translated program and compares what
    /// they print. Their exit codes are not inspected.
    fn compare(&self, case: &TestCase, record: &mut ResultRecord) {
        self.trace.progress("Comparing outputs...");
        let build_dir = case.build_dir();
        let original = Invocation::launched(
            self.config.launcher.as_deref(),
            self.reference_binary(case),
            &build_dir,
        )
        .mode(OutputMode::Capture);
        let translated =
            Invocation::new(self.translated_binary(case), &build_dir).mode(OutputMode::Capture);

        let original = self.invoker.invoke(&original);
        let translated = self.invoker.invoke(&translated);

        // A program that never started has no output to compare.
        if !original.launched || !translated.launched {
            for (label, run) in [("Reference", &original), ("Translated", &translated)] {
                if !run.launched {
                    self.trace.warn(format!(
                        "{label} program of {} did not start (code {})",
                        case.name, run.code
                    ));
                }
            }
            record.output = OutputStatus::Mismatch;
            record.runtime = None;
            return;
        }

        record.output = OutputStatus::compare(&original.stdout, &translated.stdout);
        record.runtime = Some(Delta::new(original.elapsed_ms(), translated.elapsed_ms()));

        self.trace.debug_output("ORIGINAL", &original.stdout);
        self.trace
            .debug(format!("TimeSpan: {}", original.elapsed_ms()));
        self.trace.debug_output("FINAL", &translated.stdout);
        self.trace
            .debug(format!("TimeSpan: {}", translated.elapsed_ms()));
        if record.output == OutputStatus::Mismatch {
            self.trace.debug("OUTPUT DIFF");
            self.trace.debug_diff(&original.stdout, &translated.stdout);
        }
    }

    fn count_lines(&self, case: &TestCase) -> Delta {
        let fs = self.fs();
        let translated = fs.count_lines(&case.output_dir());
        let original = fs.count_lines(&case.source_dir());
        self.trace.debug(format!("Original Lines: {original}"));
        self.trace.debug(format!("Final Lines: {translated}"));
        Delta::new(to_i64(original), to_i64(translated))
    }

    fn overwrite_baseline(&self, case: &TestCase) -> bool {
        self.trace.progress("Overwriting target with output...");
        match self.fs().promote(&case.output_dir(), &case.target_dir()) {
            Ok(()) => true,
            Err(e) => {
                self.trace
                    .warn(format!("Could not overwrite target of {}: {e}", case.name));
                false
            }
        }
    }

    // =====================
    // Paths
    // =====================

    fn reference_binary(&self, case: &TestCase) -> PathBuf {
        case.dir
            .join(expand_template(&self.config.reference_binary, case.project()))
    }

    fn translated_binary(&self, case: &TestCase) -> PathBuf {
        case.output_dir()
            .join(expand_template(&self.config.translated_binary, case.project()))
    }
}

/// Subdirectories of `dir`, sorted by name.
fn subdirectories(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
