//! Directory utilities shared by the pipeline stages: best-effort cleaning,
//! tree copies, baseline promotion and source line counting.

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use crate::config::HarnessConfig;
use crate::trace::Tracer;

pub struct DirectoryOps<'a> {
    config: &'a HarnessConfig,
    trace: &'a Tracer,
}

impl<'a> DirectoryOps<'a> {
    pub fn new(config: &'a HarnessConfig, trace: &'a Tracer) -> Self {
        Self { config, trace }
    }

    fn is_ignored_dir(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| self.config.is_ignored(n))
    }

    /// Deletes everything under `dir`, and `dir` itself unless `keep_root`.
    ///
    /// With `respect_ignore`, ignored subdirectories are left untouched at
    /// every depth. Failures are traced and cleaning carries on.
    pub fn clean(&self, dir: &Path, keep_root: bool, respect_ignore: bool) {
        if !dir.exists() {
            return;
        }
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                self.trace.debug(format!("IOException: {}: {e}", dir.display()));
                return;
            }
        };
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let result = match entry.file_type() {
                Ok(ft) if ft.is_dir() => {
                    if respect_ignore && self.is_ignored_dir(&path) {
                        continue;
                    }
                    self.clean(&path, false, respect_ignore);
                    Ok(())
                }
                Ok(_) => fs::remove_file(&path),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                self.trace.debug(format!("IOException: {}: {e}", path.display()));
            }
        }
        if !keep_root {
            if let Err(e) = fs::remove_dir(dir) {
                self.trace.debug(format!("IOException: {}: {e}", dir.display()));
            }
        }
    }

    /// Moves a fresh output tree into the baseline: `target` is cleaned
    /// (ignored folders survive), `output`'s files are copied over, and
    /// every non-ignored subdirectory is copied then removed from `output`.
    pub fn promote(&self, output: &Path, target: &Path) -> io::Result<()> {
        self.clean(target, true, true);
        fs::create_dir_all(target)?;

        for entry in fs::read_dir(output)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                if self.is_ignored_dir(&path) {
                    continue;
                }
                copy_tree(&path, &target.join(entry.file_name()))?;
                fs::remove_dir_all(&path)?;
            } else {
                fs::copy(&path, target.join(entry.file_name()))?;
            }
        }
        Ok(())
    }

    /// Sums the lines of every source file under `dir`, skipping ignored
    /// subdirectories. A missing directory counts zero.
    pub fn count_lines(&self, dir: &Path) -> u64 {
        let walker = WalkDir::new(dir)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && self.is_ignored_dir(e.path())));

        let mut total = 0;
        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || !self.is_source_file(&entry) {
                continue;
            }
            match count_file_lines(entry.path()) {
                Ok(n) => total += n,
                Err(e) => self
                    .trace
                    .debug(format!("Could not count {}: {e}", entry.path().display())),
            }
        }
        total
    }

    fn is_source_file(&self, entry: &DirEntry) -> bool {
        entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.config.is_source_extension(ext))
    }
}

/// Recursively copies `src` into `dst`, creating directories and
/// overwriting existing files.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let to = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &to)?;
        } else {
            fs::copy(entry.path(), to)?;
        }
    }
    Ok(())
}

/// Counts lines the way a text reader splits them: `\n`, `\r\n` and a lone
/// `\r` end a line, and a trailing unterminated line still counts.
pub fn count_file_lines(path: &Path) -> io::Result<u64> {
    let mut reader = BufReader::new(fs::File::open(path)?);
    let mut count = 0;
    let mut pending = false;
    let mut last_cr = false;
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            break;
        }
        for &b in buf {
            match b {
                b'\n' if last_cr => last_cr = false,
                b'\n' => {
                    count += 1;
                    pending = false;
                }
                b'\r' => {
                    count += 1;
                    pending = false;
                    last_cr = true;
                }
                _ => {
                    pending = true;
                    last_cr = false;
                }
            }
        }
        let len = buf.len();
        reader.consume(len);
    }
    if pending {
        count += 1;
    }
    Ok(count)
}
