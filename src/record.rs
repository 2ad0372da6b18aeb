//! Per-test outcomes.
//!
//! Every gated stage starts out [`StageStatus::Skipped`], so a stage the
//! pipeline never reached can not be mistaken for one that succeeded.

use serde::Serialize;

/// Outcome of a stage driven by an external tool's exit code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "code", rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    Failed(i32),
    #[default]
    Skipped,
}

impl StageStatus {
    pub fn from_exit(code: i32) -> Self {
        if code == 0 {
            Self::Success
        } else {
            Self::Failed(code)
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Outcome of the structural diff against the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "code", rename_all = "snake_case")]
pub enum DiffStatus {
    Identical,
    Differs,
    /// The diff tool itself failed.
    Error(i32),
}

impl DiffStatus {
    pub fn from_exit(code: i32) -> Self {
        match code {
            0 => Self::Identical,
            1 => Self::Differs,
            other => Self::Error(other),
        }
    }

    pub fn is_identical(self) -> bool {
        self == Self::Identical
    }
}

/// Whether the original and translated programs printed the same stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStatus {
    Match,
    Mismatch,
    #[default]
    Skipped,
}

impl OutputStatus {
    pub fn compare(original: &str, translated: &str) -> Self {
        if original == translated {
            Self::Match
        } else {
            Self::Mismatch
        }
    }
}

/// An original/translated measurement pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Delta {
    pub original: i64,
    pub translated: i64,
}

impl Delta {
    pub fn new(original: i64, translated: i64) -> Self {
        Self {
            original,
            translated,
        }
    }

    pub fn delta(&self) -> i64 {
        self.translated - self.original
    }

    /// `100 * delta / original`, undefined for a zero original.
    pub fn percent(&self) -> Option<f64> {
        if self.original == 0 {
            return None;
        }
        Some(100.0 * self.delta() as f64 / self.original as f64)
    }
}

/// How a test ended up, for the run summary and the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    /// Accepted by fast mode on a clean structural diff.
    FastPass,
    Fail,
}

impl Verdict {
    pub fn is_pass(self) -> bool {
        self != Self::Fail
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub translate: StageStatus,
    pub diff: DiffStatus,
    pub configure: StageStatus,
    pub build: StageStatus,
    pub output: OutputStatus,
    /// Wall-clock milliseconds of the two program runs.
    pub runtime: Option<Delta>,
    /// Source line counts of `src` and `Output`.
    pub lines: Option<Delta>,
    pub baseline_updated: bool,
}

impl Default for ResultRecord {
    fn default() -> Self {
        Self {
            translate: StageStatus::Skipped,
            diff: DiffStatus::Differs,
            configure: StageStatus::Skipped,
            build: StageStatus::Skipped,
            output: OutputStatus::Skipped,
            runtime: None,
            lines: None,
            baseline_updated: false,
        }
    }
}

impl ResultRecord {
    /// Marks configure and everything after it as not attempted.
    pub fn skip_from_configure(&mut self) {
        self.configure = StageStatus::Skipped;
        self.skip_from_build();
    }

    pub fn skip_from_build(&mut self) {
        self.build = StageStatus::Skipped;
        self.skip_output();
    }

    pub fn skip_output(&mut self) {
        self.output = OutputStatus::Skipped;
        self.runtime = None;
    }

    pub fn all_success(&self) -> bool {
        self.translate.is_success()
            && self.diff.is_identical()
            && self.configure.is_success()
            && self.build.is_success()
            && self.output == OutputStatus::Match
    }

    /// Fast mode accepted the test without rebuilding it.
    pub fn accepted_by_fast_path(&self) -> bool {
        self.translate.is_success()
            && self.diff.is_identical()
            && self.configure == StageStatus::Skipped
            && self.build == StageStatus::Skipped
            && self.output == OutputStatus::Skipped
    }

    pub fn verdict(&self, fast: bool) -> Verdict {
        if self.all_success() {
            Verdict::Pass
        } else if fast && self.accepted_by_fast_path() {
            Verdict::FastPass
        } else {
            Verdict::Fail
        }
    }
}
