//! Running a single test file
//!
//! The runner owns the choreography around a test program: header, load,
//! execute, shutdown, then the hidden errors collected along the way. The
//! producer is borrowed mutably for the whole run, so it cannot be bound to
//! two runs at once.

use crate::error::{Error, Interrupt, Result};
use crate::interceptor::{self, ErrorInterceptor};
use crate::loader::{TestLoader, TestProgram};
use crate::producer::TestProducer;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// Exit code for runs that can not be trusted.
pub const FATAL: i32 = 255;

/// Exit code for a completed stream.
///
/// 0 when everything passed, the number of failures (capped below
/// [`FATAL`]) when only assertions failed, [`FATAL`] otherwise: hidden
/// errors, bail-out, a plan that did not match, or no tests at all.
pub fn exit_code(producer: &TestProducer, hidden_errors: usize) -> i32 {
    if hidden_errors > 0 {
        return FATAL;
    }
    if producer.passed() {
        return 0;
    }
    if producer.is_bailed_out() {
        return FATAL;
    }
    let set = producer.test_set();
    if set.extras_count() != 0 {
        return FATAL;
    }
    match set.failures_count() {
        0 => FATAL,
        failures => failures.min((FATAL - 1) as usize) as i32,
    }
}

/// Outcome of one test file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub path: PathBuf,
    /// False when the loader found nothing at `path`.
    pub found: bool,
    /// False when the file was missing or could not be parsed.
    pub loaded: bool,
    pub hidden_errors: usize,
    pub exit_code: i32,
}

/// Runs test files against a producer
pub struct TestRunner<L> {
    loader: L,
}

impl<L: TestLoader> TestRunner<L> {
    pub fn new(loader: L) -> Self {
        TestRunner { loader }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Run the test file at `path`.
    ///
    /// Skip-all and bail-out end the file normally. Anything else that goes
    /// wrong (an error returned by the program, a panic, a file that does
    /// not load) is kept out of the TAP stream and written to the error
    /// stream once the stream is complete; any such hidden error makes the
    /// exit code [`FATAL`].
    pub fn run_test(&self, producer: &mut TestProducer, path: &Path) -> Result<RunReport> {
        let interceptor = ErrorInterceptor::install();
        producer.startup()?;

        let (found, loaded) = match self.loader.load(path) {
            Ok(Some(program)) => {
                tracing::debug!(path = %path.display(), "running test file");
                execute(producer, program.as_ref());
                (true, true)
            }
            Ok(None) => {
                interceptor::report(format!("Can not find test file {}", path.display()), None);
                (false, false)
            }
            Err(e) => {
                interceptor::report(format!("Can not load test file: {}", e), None);
                (true, false)
            }
        };

        if let Err(e) = producer.shutdown(loaded) {
            interceptor::report(e.to_string(), None);
        }

        let hidden = interceptor.finish();
        if !hidden.is_empty() {
            producer.flush_hidden_errors(&hidden)?;
        }

        let exit_code = exit_code(producer, hidden.len());
        tracing::debug!(
            path = %path.display(),
            tests = producer.test_set().tests_count(),
            failures = producer.test_set().failures_count(),
            hidden_errors = hidden.len(),
            exit_code,
            "test file finished"
        );

        Ok(RunReport {
            path: path.to_path_buf(),
            found,
            loaded,
            hidden_errors: hidden.len(),
            exit_code,
        })
    }
}

fn execute(producer: &mut TestProducer, program: &dyn TestProgram) {
    match panic::catch_unwind(AssertUnwindSafe(|| program.run(producer))) {
        Ok(Ok(())) => {}
        Ok(Err(Interrupt::SkipAll)) => tracing::debug!("test file skipped"),
        Ok(Err(Interrupt::BailOut)) => tracing::debug!("test file bailed out"),
        Ok(Err(Interrupt::Error(e))) => report_error(e),
        // The panic hook has already recorded the message and location.
        Err(_) => {}
    }
}

fn report_error(error: Error) {
    let (error, location) = error.into_parts();
    interceptor::report(error.to_string(), location);
}
