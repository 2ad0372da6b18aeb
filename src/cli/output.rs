//! Handles all user-facing result output for the CLI: the colored
//! scorecard table, the run summary, and the JSON report.

use std::io;

use serde::Serialize;
use termcolor::{Color, ColorSpec, StandardStream, WriteColor};
use unicode_width::UnicodeWidthStr;

use crate::config::RunOptions;
use crate::pipeline::TestRun;
use crate::record::{ResultRecord, Verdict};
use crate::report::{Cell, Scorecard, ScorecardRow, Summary, Tone};
use crate::trace::color_choice;

const BANNER: &str = "TEST RESULTS";
const BANNER_FILL: usize = 60;
const COLUMN_GAP: &str = "  ";

fn tone_color(tone: Tone) -> Option<Color> {
    match tone {
        Tone::Plain => None,
        Tone::Success | Tone::Improvement => Some(Color::Green),
        Tone::Failure | Tone::Regression => Some(Color::Red),
        Tone::Skipped | Tone::Neutral => Some(Color::Yellow),
    }
}

/// Widest display width of each column, header included.
fn column_widths(scorecard: &Scorecard) -> [usize; 8] {
    let mut widths = scorecard.header.map(|label| label.width());
    for row in &scorecard.rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.text.width());
        }
    }
    widths
}

fn write_padded<W: WriteColor>(out: &mut W, text: &str, width: usize) -> io::Result<()> {
    let pad = width.saturating_sub(text.width());
    write!(out, "{text}{}{COLUMN_GAP}", " ".repeat(pad))
}

fn write_cell<W: WriteColor>(out: &mut W, cell: &Cell, width: usize) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(tone_color(cell.tone)))?;
    write_padded(out, &cell.text, width)?;
    out.reset()
}

fn write_row<W: WriteColor>(out: &mut W, row: &ScorecardRow, widths: &[usize; 8]) -> io::Result<()> {
    for (cell, width) in row.cells().iter().zip(widths) {
        write_cell(out, cell, *width)?;
    }
    writeln!(out)
}

/// Writes the banner, header and one line per test, columns aligned.
pub fn write_scorecard<W: WriteColor>(out: &mut W, scorecard: &Scorecard) -> io::Result<()> {
    let fill = "*".repeat(BANNER_FILL);
    out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
    writeln!(out, "{fill} {BANNER} {fill}")?;
    out.reset()?;

    let widths = column_widths(scorecard);
    out.set_color(ColorSpec::new().set_bold(true))?;
    for (label, width) in scorecard.header.iter().zip(&widths) {
        write_padded(out, label, *width)?;
    }
    out.reset()?;
    writeln!(out)?;

    for row in &scorecard.rows {
        write_row(out, row, &widths)?;
    }
    Ok(())
}

pub fn write_summary<W: WriteColor>(out: &mut W, summary: &Summary) -> io::Result<()> {
    write!(out, "\nTest summary: total {}, ", summary.total)?;
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(out, "passed")?;
    out.reset()?;
    write!(out, " {}, ", summary.passed)?;
    out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
    write!(out, "failed")?;
    out.reset()?;
    writeln!(out, " {}", summary.failed)
}

/// Prints the scorecard and summary to stdout.
pub fn print_report(scorecard: &Scorecard, summary: &Summary) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice());
    write_scorecard(&mut stdout, scorecard)?;
    write_summary(&mut stdout, summary)
}

// ============================================================================
// JSON REPORT
// ============================================================================

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub options: RunOptions,
    pub tests: Vec<JsonTest<'a>>,
    pub summary: Summary,
}

#[derive(Debug, Serialize)]
pub struct JsonTest<'a> {
    pub name: &'a str,
    pub verdict: Verdict,
    pub record: &'a ResultRecord,
    pub row: ScorecardRow,
}

impl<'a> JsonReport<'a> {
    pub fn new(runs: &'a [TestRun], options: RunOptions) -> Self {
        let tests = runs
            .iter()
            .map(|run| JsonTest {
                name: &run.case.name,
                verdict: run.record.verdict(options.fast),
                record: &run.record,
                row: ScorecardRow::from_record(&run.case.name, &run.record),
            })
            .collect();
        Self {
            options,
            tests,
            summary: Summary::from_runs(runs, options.fast),
        }
    }
}

pub fn print_json(report: &JsonReport<'_>) -> io::Result<()> {
    let text = serde_json::to_string_pretty(report)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    println!("{text}");
    Ok(())
}
