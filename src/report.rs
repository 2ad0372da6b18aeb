//! Builds the scorecard from executed tests. Rendering lives in
//! [`crate::cli::output`]; this module only decides text and tone.

use serde::Serialize;

use crate::pipeline::TestRun;
use crate::record::{Delta, DiffStatus, OutputStatus, ResultRecord, StageStatus};

pub const HEADER: [&str; 8] = [
    "NAME",
    "TRANSLATE",
    "FILE DIFFER",
    "CONFIGURE CODE",
    "BUILD CODE",
    "OUTPUT",
    "TIME DIFFERENCE",
    "LINES DIFFERENCE",
];

/// Semantic color class of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Plain,
    Success,
    Failure,
    Skipped,
    Improvement,
    Neutral,
    Regression,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub text: String,
    pub tone: Tone,
}

impl Cell {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    fn skipped() -> Self {
        Self::new("SKIPPED", Tone::Skipped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorecardRow {
    pub name: String,
    pub translate: Cell,
    pub diff: Cell,
    pub configure: Cell,
    pub build: Cell,
    pub output: Cell,
    pub time: Cell,
    pub lines: Cell,
}

impl ScorecardRow {
    pub fn from_record(name: &str, record: &ResultRecord) -> Self {
        Self {
            name: name.to_string(),
            translate: stage_cell(record.translate, "SUCCESS"),
            diff: diff_cell(record.diff),
            configure: stage_cell(record.configure, "SUCCESS"),
            build: stage_cell(record.build, "BUILD SUCCEEDED"),
            output: output_cell(record.output),
            time: delta_cell(record.runtime, "ms"),
            lines: delta_cell(record.lines, "lines"),
        }
    }

    /// All eight cells in column order, the name first.
    pub fn cells(&self) -> [Cell; 8] {
        [
            Cell::new(self.name.clone(), Tone::Plain),
            self.translate.clone(),
            self.diff.clone(),
            self.configure.clone(),
            self.build.clone(),
            self.output.clone(),
            self.time.clone(),
            self.lines.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub header: [&'static str; 8],
    pub rows: Vec<ScorecardRow>,
}

impl Scorecard {
    pub fn build(runs: &[TestRun]) -> Self {
        Self {
            header: HEADER,
            rows: runs
                .iter()
                .map(|run| ScorecardRow::from_record(&run.case.name, &run.record))
                .collect(),
        }
    }
}

/// Pass/fail counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_runs(runs: &[TestRun], fast: bool) -> Self {
        let passed = runs
            .iter()
            .filter(|run| run.record.verdict(fast).is_pass())
            .count();
        Self {
            total: runs.len(),
            passed,
            failed: runs.len() - passed,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

fn stage_cell(status: StageStatus, success: &str) -> Cell {
    match status {
        StageStatus::Success => Cell::new(success, Tone::Success),
        StageStatus::Skipped => Cell::skipped(),
        StageStatus::Failed(code) => Cell::new(format!("FAIL. Code: {code}"), Tone::Failure),
    }
}

fn diff_cell(status: DiffStatus) -> Cell {
    match status {
        DiffStatus::Identical => Cell::new("No Differ", Tone::Success),
        DiffStatus::Differs => Cell::new("Differ", Tone::Failure),
        DiffStatus::Error(code) => Cell::new(format!("Error. Code: {code}"), Tone::Failure),
    }
}

fn output_cell(status: OutputStatus) -> Cell {
    match status {
        OutputStatus::Match => Cell::new("OK", Tone::Success),
        OutputStatus::Mismatch => Cell::new("FAIL", Tone::Failure),
        OutputStatus::Skipped => Cell::skipped(),
    }
}

/// Negative deltas are improvements, positive ones regressions.
fn delta_cell(delta: Option<Delta>, unit: &str) -> Cell {
    let Some(delta) = delta else {
        return Cell::skipped();
    };
    let diff = delta.delta();
    let tone = match diff.signum() {
        -1 => Tone::Improvement,
        0 => Tone::Neutral,
        _ => Tone::Regression,
    };
    let percent = match delta.percent() {
        Some(p) => format!("{p:.2}%"),
        None => "n/a".to_string(),
    };
    Cell::new(format!("{diff} {unit} ({percent})"), tone)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate_failed() -> ResultRecord {
        let mut record = ResultRecord {
            translate: StageStatus::Failed(1),
            diff: DiffStatus::Differs,
            ..ResultRecord::default()
        };
        record.skip_from_configure();
        record
    }

    #[test]
    fn failed_translation_row() {
        let row = ScorecardRow::from_record("Foo.Bar", &translate_failed());
        assert_eq!(row.translate, Cell::new("FAIL. Code: 1", Tone::Failure));
        assert_eq!(row.diff, Cell::new("Differ", Tone::Failure));
        for cell in [&row.configure, &row.build, &row.output, &row.time, &row.lines] {
            assert_eq!(cell, &Cell::skipped());
        }
    }

    #[test]
    fn successful_row() {
        let record = ResultRecord {
            translate: StageStatus::Success,
            diff: DiffStatus::Identical,
            configure: StageStatus::Success,
            build: StageStatus::Success,
            output: OutputStatus::Match,
            runtime: Some(Delta::new(200, 150)),
            lines: Some(Delta::new(100, 150)),
            baseline_updated: false,
        };
        let row = ScorecardRow::from_record("Foo.Bar", &record);
        assert_eq!(row.translate.text, "SUCCESS");
        assert_eq!(row.diff.text, "No Differ");
        assert_eq!(row.build, Cell::new("BUILD SUCCEEDED", Tone::Success));
        assert_eq!(row.output, Cell::new("OK", Tone::Success));
        assert_eq!(row.time, Cell::new("-50 ms (-25.00%)", Tone::Improvement));
        assert_eq!(row.lines, Cell::new("50 lines (50.00%)", Tone::Regression));
    }

    #[test]
    fn delta_tones_and_zero_original() {
        assert_eq!(
            delta_cell(Some(Delta::new(10, 10)), "ms"),
            Cell::new("0 ms (0.00%)", Tone::Neutral)
        );
        assert_eq!(
            delta_cell(Some(Delta::new(0, 3)), "lines"),
            Cell::new("3 lines (n/a)", Tone::Regression)
        );
    }

    #[test]
    fn diff_error_code_is_shown() {
        assert_eq!(
            diff_cell(DiffStatus::Error(2)),
            Cell::new("Error. Code: 2", Tone::Failure)
        );
    }

    #[test]
    fn summary_counts_fast_passes() {
        use crate::discovery::TestCase;

        let mut fast = ResultRecord {
            translate: StageStatus::Success,
            diff: DiffStatus::Identical,
            ..ResultRecord::default()
        };
        fast.skip_from_configure();
        let runs = vec![
            TestRun {
                case: TestCase::new("/t/A.One"),
                record: fast,
            },
            TestRun {
                case: TestCase::new("/t/B.Two"),
                record: translate_failed(),
            },
        ];
        let summary = Summary::from_runs(&runs, true);
        assert_eq!((summary.total, summary.passed, summary.failed), (2, 1, 1));
        assert!(!summary.all_passed());
        assert_eq!(Summary::from_runs(&runs, false).passed, 0);
        assert_eq!(Scorecard::build(&runs).rows.len(), 2);
    }

    #[test]
    fn row_cells_follow_header_order() {
        let row = ScorecardRow::from_record("Foo.Bar", &translate_failed());
        let cells = row.cells();
        assert_eq!(cells.len(), HEADER.len());
        assert_eq!(cells[0].text, "Foo.Bar");
        assert_eq!(cells[1].text, "FAIL. Code: 1");
        assert_eq!(cells[7].text, "SKIPPED");
    }
}
