//! Launching external tools.
//!
//! Every invocation names its working directory explicitly; the harness
//! never changes its own current directory.

use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::trace::Tracer;

/// Reserved code: the executable could not be launched for lack of permission.
pub const LAUNCH_DENIED: i32 = 1;
/// Reserved code: the executable could not be launched for any other reason.
pub const LAUNCH_FAILED: i32 = 2;
/// Reported when the child ended without an exit code (killed by a signal).
pub const NO_EXIT_CODE: i32 = -1;

/// What happens to a child's standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Discarded.
    Quiet,
    /// Echoed line by line as it arrives.
    Relay,
    /// Collected into [`Completion::stdout`].
    Capture,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
    pub mode: OutputMode,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            mode: OutputMode::Quiet,
        }
    }

    /// Runs `program` through `launcher` when one is configured.
    pub fn launched(launcher: Option<&str>, program: impl Into<OsString>, cwd: impl Into<PathBuf>) -> Self {
        match launcher {
            Some(launcher) => Self::new(launcher, cwd).arg(program),
            None => Self::new(program, cwd),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// The command line as a single string, for tracing.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit code, wall-clock time and (when captured) stdout of one run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Completion {
    /// False when the process never started; `code` is then a reserved
    /// launch code and `stdout` is empty.
    pub launched: bool,
    pub code: i32,
    /// From just before spawn to just after exit, so it includes process
    /// start-up and draining stdout.
    pub elapsed: Duration,
    pub stdout: String,
}

impl Completion {
    /// A process that ran and exited with `code`.
    pub fn with_code(code: i32) -> Self {
        Self {
            launched: true,
            code,
            ..Self::default()
        }
    }

    /// A process that could not be started.
    pub fn not_launched(code: i32) -> Self {
        Self {
            launched: false,
            code,
            ..Self::default()
        }
    }

    pub fn elapsed_ms(&self) -> i64 {
        i64::try_from(self.elapsed.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Runs external tools on behalf of the pipeline.
pub trait Invoke {
    fn invoke(&self, invocation: &Invocation) -> Completion;
}

/// Runs invocations as real child processes.
pub struct StageRunner<'a> {
    trace: &'a Tracer,
}

impl<'a> StageRunner<'a> {
    pub fn new(trace: &'a Tracer) -> Self {
        Self { trace }
    }

    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null());
        match invocation.mode {
            OutputMode::Quiet => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
            OutputMode::Relay => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::inherit());
            }
            OutputMode::Capture => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::null());
            }
        }
        cmd
    }

    fn drain(&self, child: &mut Child, mode: OutputMode) -> io::Result<String> {
        let Some(stdout) = child.stdout.take() else {
            return Ok(String::new());
        };
        let mut reader = BufReader::new(stdout);
        let mut captured = String::new();
        match mode {
            OutputMode::Quiet => {}
            OutputMode::Relay => {
                for line in reader.split(b'\n') {
                    let line = line?;
                    self.trace
                        .relay(String::from_utf8_lossy(&line).trim_end_matches('\r'));
                }
            }
            OutputMode::Capture => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                captured = String::from_utf8_lossy(&bytes).into_owned();
            }
        }
        Ok(captured)
    }
}

impl Invoke for StageRunner<'_> {
    fn invoke(&self, invocation: &Invocation) -> Completion {
        let started = Instant::now();
        let mut child = match Self::command(invocation).spawn() {
            Ok(child) => child,
            Err(e) => {
                let code = launch_failure_code(&e);
                self.trace.debug(format!(
                    "Could not launch {}: {e}",
                    Path::new(&invocation.program).display()
                ));
                return Completion::not_launched(code);
            }
        };

        let stdout = match self.drain(&mut child, invocation.mode) {
            Ok(stdout) => stdout,
            Err(e) => {
                self.trace.debug(format!("Lost child output: {e}"));
                String::new()
            }
        };
        let code = match child.wait() {
            Ok(status) => status.code().unwrap_or(NO_EXIT_CODE),
            Err(e) => {
                self.trace.debug(format!("Wait failed: {e}"));
                LAUNCH_FAILED
            }
        };
        let elapsed = started.elapsed();
        self.trace.debug(format!("Exit Code: {code}"));
        Completion {
            launched: true,
            code,
            elapsed,
            stdout,
        }
    }
}

fn launch_failure_code(e: &io::Error) -> i32 {
    if e.kind() == io::ErrorKind::PermissionDenied {
        LAUNCH_DENIED
    } else {
        LAUNCH_FAILED
    }
}
