use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::{Result, TranstestError};
use crate::trace::Tracer;

pub const REFERENCE_DIR: &str = "NETbin";
pub const SOURCE_DIR: &str = "src";
pub const TARGET_DIR: &str = "Target";
pub const OUTPUT_DIR: &str = "Output";
pub const BUILD_DIR: &str = "build";

/// Subdirectories a folder needs to count as a test.
const REQUIRED_DIRS: [&str; 3] = [TARGET_DIR, SOURCE_DIR, REFERENCE_DIR];

/// A test folder found under the test root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub dir: PathBuf,
}

impl TestCase {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, dir }
    }

    /// Project name used for binaries and build files: the second
    /// `.`-separated segment of the test name (`Foo.Bar` gives `Bar`), or
    /// the whole name when it has no `.`.
    pub fn project(&self) -> &str {
        self.name.split('.').nth(1).unwrap_or(&self.name)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.join(OUTPUT_DIR)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.output_dir().join(BUILD_DIR)
    }

    pub fn target_dir(&self) -> PathBuf {
        self.dir.join(TARGET_DIR)
    }

    pub fn source_dir(&self) -> PathBuf {
        self.dir.join(SOURCE_DIR)
    }
}

#[derive(Debug)]
pub struct TestDiscoverer;

impl TestDiscoverer {
    /// Lists the immediate subdirectories of `root` that hold a test, in
    /// filesystem enumeration order.
    pub fn discover(root: &Path, trace: &Tracer) -> Result<Vec<TestCase>> {
        let mut tests = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                // The root itself failing is fatal; single entries are skipped.
                Err(e) if e.depth() == 0 => {
                    return Err(TranstestError::Discovery {
                        root: root.to_path_buf(),
                        source: e,
                    })
                }
                Err(e) => {
                    trace.debug(format!("Skipping unreadable entry: {e}"));
                    continue;
                }
            };
            if !entry.file_type().is_dir() || !Self::is_test_dir(entry.path()) {
                continue;
            }
            let case = TestCase::new(entry.path());
            trace.debug(format!("Found test {}", case.name));
            tests.push(case);
        }
        Ok(tests)
    }

    fn is_test_dir(dir: &Path) -> bool {
        REQUIRED_DIRS.iter().all(|name| dir.join(name).is_dir())
    }

    /// Resolves the tests to run: every discovered test when `names` is
    /// empty, otherwise the named ones in the order given.
    pub fn select(tests: &[TestCase], names: &[String]) -> Result<Vec<TestCase>> {
        if names.is_empty() {
            return Ok(tests.to_vec());
        }
        names
            .iter()
            .map(|name| {
                tests
                    .iter()
                    .find(|t| &t.name == name)
                    .cloned()
                    .ok_or_else(|| {
                        let available: Vec<&str> = tests.iter().map(|t| t.name.as_str()).collect();
                        TranstestError::unknown_test(name.clone(), &available)
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_test(root: &Path, name: &str, dirs: &[&str]) {
        for d in dirs {
            fs::create_dir_all(root.join(name).join(d)).unwrap();
        }
    }

    fn names(tests: &[TestCase]) -> Vec<String> {
        let mut names: Vec<_> = tests.iter().map(|t| t.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn finds_only_complete_test_folders() {
        let root = tempfile::tempdir().unwrap();
        make_test(root.path(), "Foo.Bar", &["NETbin", "src", "Target"]);
        make_test(root.path(), "Foo.Baz", &["NETbin", "src", "Target", "Output"]);
        make_test(root.path(), "NoTarget", &["NETbin", "src"]);
        make_test(root.path(), "Empty", &[]);
        fs::write(root.path().join("README"), "not a test").unwrap();

        let tests = TestDiscoverer::discover(root.path(), &Tracer::silent()).unwrap();
        assert_eq!(names(&tests), vec!["Foo.Bar", "Foo.Baz"]);
    }

    #[test]
    fn does_not_recurse_below_one_level() {
        let root = tempfile::tempdir().unwrap();
        make_test(&root.path().join("group"), "Deep.Test", &["NETbin", "src", "Target"]);

        let tests = TestDiscoverer::discover(root.path(), &Tracer::silent()).unwrap();
        assert!(tests.is_empty());
    }

    #[test]
    fn required_entries_must_be_directories() {
        let root = tempfile::tempdir().unwrap();
        make_test(root.path(), "Foo.Bar", &["NETbin", "src"]);
        fs::write(root.path().join("Foo.Bar").join("Target"), "file").unwrap();

        let tests = TestDiscoverer::discover(root.path(), &Tracer::silent()).unwrap();
        assert!(tests.is_empty());
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("missing");
        let err = TestDiscoverer::discover(&missing, &Tracer::silent()).unwrap_err();
        assert!(matches!(err, TranstestError::Discovery { .. }));
    }

    #[test]
    fn project_name_is_second_segment() {
        assert_eq!(TestCase::new("/t/Foo.Bar").project(), "Bar");
        assert_eq!(TestCase::new("/t/A.B.C").project(), "B");
        assert_eq!(TestCase::new("/t/Plain").project(), "Plain");
    }

    #[test]
    fn select_keeps_requested_order() {
        let tests = vec![TestCase::new("/t/A.One"), TestCase::new("/t/B.Two")];
        let picked =
            TestDiscoverer::select(&tests, &["B.Two".to_string(), "A.One".to_string()]).unwrap();
        assert_eq!(picked, vec![tests[1].clone(), tests[0].clone()]);
        assert_eq!(TestDiscoverer::select(&tests, &[]).unwrap(), tests);
    }

    #[test]
    fn select_rejects_unknown_names() {
        let tests = vec![TestCase::new("/t/A.One")];
        let err = TestDiscoverer::select(&tests, &["Nope".to_string()]).unwrap_err();
        match err {
            TranstestError::UnknownTest { name, help } => {
                assert_eq!(name, "Nope");
                assert!(help.ends_with("available: A.One"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
