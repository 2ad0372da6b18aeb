//! Console tracing for the harness: progress lines, warnings, and the
//! highlighted debug stream enabled with `-d`.

use std::borrow::Cow;
use std::io::Write;

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Appended to traced output that was cut at the trace limit.
pub const TRUNCATION_MARKER: &str = " [......] ";

const DEBUG_PREFIX: &str = "DEBUG >>> ";
const WARN_PREFIX: &str = "WARN >>> ";

/// Picks colored output only when stdout is a terminal.
pub fn color_choice() -> ColorChoice {
    color_choice_for(atty::Stream::Stdout)
}

/// Picks colored output only when `stream` is a terminal.
pub fn color_choice_for(stream: atty::Stream) -> ColorChoice {
    if atty::is(stream) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// Cuts `text` to at most `limit` characters, marking the cut.
/// `None` means unlimited.
pub fn truncate(text: &str, limit: Option<usize>) -> Cow<'_, str> {
    let Some(limit) = limit else {
        return Cow::Borrowed(text);
    };
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => Cow::Owned(format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER)),
        None => Cow::Borrowed(text),
    }
}

#[derive(Debug, Clone)]
pub struct Tracer {
    debug: bool,
    quiet: bool,
    limit: Option<usize>,
    color: ColorChoice,
    warn_color: ColorChoice,
}

impl Tracer {
    /// `unlimited` disables truncation of traced process output.
    pub fn new(debug: bool, unlimited: bool, limit: usize) -> Self {
        Self {
            debug,
            quiet: false,
            limit: if unlimited { None } else { Some(limit) },
            color: color_choice(),
            warn_color: color_choice_for(atty::Stream::Stderr),
        }
    }

    /// A tracer that prints nothing at all.
    pub fn silent() -> Self {
        Self {
            debug: false,
            quiet: true,
            limit: None,
            color: ColorChoice::Never,
            warn_color: ColorChoice::Never,
        }
    }

    pub fn is_debug(&self) -> bool {
        self.debug && !self.quiet
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        if self.is_debug() {
            self.colored_line(Color::Cyan, DEBUG_PREFIX, message.as_ref());
        }
    }

    /// Traces captured process output under a label, cut at the trace limit.
    pub fn debug_output(&self, label: &str, output: &str) {
        if !self.is_debug() {
            return;
        }
        self.debug(label);
        self.debug(truncate(output, self.limit));
    }

    /// Traces a line diff between two captured outputs.
    pub fn debug_diff(&self, expected: &str, actual: &str) {
        if !self.is_debug() {
            return;
        }
        let changeset = Changeset::new(expected, actual, "\n");
        let mut stdout = StandardStream::stdout(self.color);
        for diff in &changeset.diffs {
            let (color, sign, text) = match diff {
                Difference::Same(x) => (None, ' ', x),
                Difference::Add(x) => (Some(Color::Green), '+', x),
                Difference::Rem(x) => (Some(Color::Red), '-', x),
            };
            let _ = stdout.set_color(ColorSpec::new().set_fg(color));
            for line in text.lines() {
                let _ = writeln!(stdout, "{DEBUG_PREFIX}{sign}{line}");
            }
        }
        let _ = stdout.reset();
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        if self.quiet {
            return;
        }
        let mut stderr = StandardStream::stderr(self.warn_color);
        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        let _ = writeln!(stderr, "{WARN_PREFIX}{}", message.as_ref());
        let _ = stderr.reset();
    }

    pub fn progress(&self, message: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", message.as_ref());
        }
    }

    pub fn heading(&self, message: impl AsRef<str>) {
        if !self.quiet {
            self.colored_line(Color::Yellow, "", message.as_ref());
        }
    }

    /// Echoes one line relayed from a child process.
    pub fn relay(&self, line: &str) {
        if !self.quiet {
            println!("{line}");
        }
    }

    fn colored_line(&self, color: Color, prefix: &str, message: &str) {
        let mut stdout = StandardStream::stdout(self.color);
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)));
        let _ = writeln!(stdout, "{prefix}{message}");
        let _ = stdout.reset();
    }
}
