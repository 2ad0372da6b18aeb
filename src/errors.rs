//! Transtest error handling.
//!
//! Only failures that abort the whole run live here. Stage failures are
//! recorded per test in [`crate::record::ResultRecord`] and never become
//! errors.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Fatal errors of a transtest run.
#[derive(Error, Diagnostic, Debug)]
pub enum TranstestError {
    #[error("Failed to scan test root '{}'", root.display())]
    #[diagnostic(
        code(transtest::discovery),
        help("run transtest from the directory holding the test folders, or pass --root")
    )]
    Discovery {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Unknown test '{name}'")]
    #[diagnostic(code(transtest::unknown_test))]
    UnknownTest {
        name: String,
        /// Lists the discovered tests.
        #[help]
        help: String,
    },

    #[error("Failed to read configuration '{}'", path.display())]
    #[diagnostic(code(transtest::config::read))]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration '{}': {source}", path.display())]
    #[diagnostic(
        code(transtest::config::parse),
        help("every key is optional, but unknown keys are rejected")
    )]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("I/O error: {message}")]
    #[diagnostic(code(transtest::io))]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },
}

impl TranstestError {
    pub fn unknown_test(name: impl Into<String>, available: &[&str]) -> Self {
        let listed = if available.is_empty() {
            "(none)".to_string()
        } else {
            available.join(", ")
        };
        Self::UnknownTest {
            name: name.into(),
            help: format!(
                "a test folder needs NETbin, src and Target subdirectories; available: {listed}"
            ),
        }
    }

    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }
}

pub type Result<T, E = TranstestError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_test_lists_available_names() {
        let err = TranstestError::unknown_test("Foo.Baz", &["Foo.Bar", "Foo.Qux"]);
        assert_eq!(err.to_string(), "Unknown test 'Foo.Baz'");
        let help = err.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("Foo.Bar, Foo.Qux"));
        let code = err.code().map(|c| c.to_string()).unwrap_or_default();
        assert_eq!(code, "transtest::unknown_test");
    }

    #[test]
    fn unknown_test_without_candidates() {
        let err = TranstestError::unknown_test("X", &[]);
        let help = err.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.ends_with("available: (none)"));
    }
}
