//! Running many test files and summarising them
//!
//! The harness does not show the TAP streams of the files it runs. It prints
//! one status line per file and a summary at the end:
//!
//! ```text
//! t/basic.t..... ok
//! t/broken.t.... ko
//! t/missing.t... NOT FOUND
//! FAILED: 2/3 test files, 1/5 tests failed.
//! Files=3, Tests=5, Failures=1
//! ```

use crate::error::Result;
use crate::loader::TestLoader;
use crate::producer::TestProducer;
use crate::runner::{TestRunner, FATAL};
use crate::sink::LineSink;
use console::style;
use std::fmt;
use std::path::{Path, PathBuf};

/// How a test file ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Ok,
    Ko,
    NotFound,
    BailedOut,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Ok => write!(f, "ok"),
            FileStatus::Ko => write!(f, "ko"),
            FileStatus::NotFound => write!(f, "NOT FOUND"),
            FileStatus::BailedOut => write!(f, "BAILED OUT!"),
        }
    }
}

/// Result of one file in a harness run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub path: PathBuf,
    pub status: FileStatus,
    /// Hidden errors occurred: the result can not be trusted.
    pub dubious: bool,
    pub tests: usize,
    pub failures: usize,
    pub exit_code: i32,
}

impl FileResult {
    pub fn passed(&self) -> bool {
        self.status == FileStatus::Ok && !self.dubious
    }

    /// `path.... status`, padded with dots to `width`.
    pub fn status_line(&self, width: usize, colored: bool) -> String {
        let mut status = self.status.to_string();
        if self.dubious {
            status.push_str("+DUBIOUS");
        }
        if colored {
            let styled = if self.passed() {
                style(status).green()
            } else {
                style(status).red().bold()
            };
            status = styled.force_styling(true).to_string();
        }
        format!(
            "{:.<width$} {}",
            self.path.display().to_string(),
            status,
            width = width
        )
    }
}

/// Totals over a harness run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarnessSummary {
    pub results: Vec<FileResult>,
}

impl HarnessSummary {
    pub fn files(&self) -> usize {
        self.results.len()
    }

    pub fn failed_files(&self) -> usize {
        self.results.iter().filter(|r| !r.passed()).count()
    }

    pub fn tests(&self) -> usize {
        self.results.iter().map(|r| r.tests).sum()
    }

    pub fn failures(&self) -> usize {
        self.results.iter().map(|r| r.failures).sum()
    }

    pub fn passed(&self) -> bool {
        self.failed_files() == 0
    }

    /// 0 when every file passed, otherwise the number of failed files
    /// capped below [`FATAL`].
    pub fn exit_code(&self) -> i32 {
        self.failed_files().min((FATAL - 1) as usize) as i32
    }

    pub fn lines(&self) -> Vec<String> {
        let verdict = if self.passed() {
            "All tests successful.".to_string()
        } else {
            format!(
                "FAILED: {}/{} test files, {}/{} tests failed.",
                self.failed_files(),
                self.files(),
                self.failures(),
                self.tests()
            )
        };
        vec![
            verdict,
            format!(
                "Files={}, Tests={}, Failures={}",
                self.files(),
                self.tests(),
                self.failures()
            ),
        ]
    }
}

/// Runs test files one after the other with their TAP output discarded
pub struct TestHarness<L> {
    runner: TestRunner<L>,
    producer: TestProducer,
    colored: bool,
}

impl<L: TestLoader> TestHarness<L> {
    pub fn new(loader: L) -> Self {
        TestHarness {
            runner: TestRunner::new(loader),
            producer: TestProducer::discarding(),
            colored: false,
        }
    }

    pub fn with_color(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Run every file, writing status lines and the summary to `report`.
    pub fn run_tests(&mut self, paths: &[PathBuf], report: &mut dyn LineSink) -> Result<HarnessSummary> {
        let width = paths
            .iter()
            .map(|p| p.display().to_string().chars().count())
            .max()
            .unwrap_or(0)
            + 3;

        let mut summary = HarnessSummary::default();
        for path in paths {
            let result = self.run_file(path)?;
            report.write_line(&result.status_line(width, self.colored))?;
            summary.results.push(result);
        }

        for line in summary.lines() {
            report.write_line(&line)?;
        }
        report.flush()?;
        Ok(summary)
    }

    fn run_file(&mut self, path: &Path) -> Result<FileResult> {
        self.producer.reset()?;
        let report = self.runner.run_test(&mut self.producer, path)?;

        let status = if !report.found {
            FileStatus::NotFound
        } else if self.producer.is_bailed_out() {
            FileStatus::BailedOut
        } else if self.producer.passed() {
            FileStatus::Ok
        } else {
            FileStatus::Ko
        };

        let set = self.producer.test_set();
        Ok(FileResult {
            path: path.to_path_buf(),
            status,
            dubious: report.hidden_errors > 0,
            tests: set.tests_count(),
            failures: set.failures_count(),
            exit_code: report.exit_code,
        })
    }
}
