//! The TAP producer
//!
//! [`TestProducer`] is the API test programs call. Every operation first asks
//! the [`Workflow`] whether it is legal in the current state, then updates
//! the [`TestSet`], then writes to the streams. Protocol violations come back
//! as [`Interrupt::Error`]; skip-all and bail-out come back as the
//! [`Interrupt::SkipAll`] and [`Interrupt::BailOut`] signals after their
//! lines have been written.

use crate::error::{Error, Flow, Interrupt, Result};
use crate::interceptor::{HiddenError, SourceLocation};
use crate::sink::{LineSink, NullSink};
use crate::stream::{ErrStream, OutStream};
use crate::test_case::{Plain, TestCase};
use crate::test_set::{Plan, TestSet};
use crate::workflow::{Transition, Workflow};
use std::fmt::Display;
use std::mem;

/// Message used when a plan or skip count is not a strictly positive integer.
pub fn invalid_count_message(value: &dyn Display) -> String {
    format!(
        "Number of tests must be a strictly positive integer. You gave it '{}'.",
        value
    )
}

/// A rejected transition, located at the caller of the producer method.
#[track_caller]
fn checked(transition: Transition) -> Flow {
    match transition {
        Ok(()) => Ok(()),
        Err(e) => Err(Error::from(e).located(SourceLocation::caller()).into()),
    }
}

fn checked_at(transition: Transition, location: &SourceLocation) -> Flow {
    transition.map_err(|e| Error::from(e).located(location.clone()).into())
}

/// Produces one TAP stream.
///
/// A producer is created once per run and [`reset`](TestProducer::reset)
/// between test files. It is handed to test programs by mutable reference,
/// so only one program can drive it at a time.
pub struct TestProducer {
    out: OutStream,
    err: ErrStream,
    test_set: TestSet,
    workflow: Workflow,
    todo: Vec<String>,
    bailed_out: bool,
    ended: bool,
}

impl TestProducer {
    pub fn new(out: Box<dyn LineSink>, err: Box<dyn LineSink>) -> Self {
        TestProducer {
            out: OutStream::new(out),
            err: ErrStream::new(err),
            test_set: TestSet::dynamic(),
            workflow: Workflow::new(),
            todo: Vec::new(),
            bailed_out: false,
            ended: false,
        }
    }

    /// A producer whose output goes nowhere.
    pub fn discarding() -> Self {
        Self::new(Box::new(NullSink), Box::new(NullSink))
    }

    pub fn test_set(&self) -> &TestSet {
        &self.test_set
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn is_bailed_out(&self) -> bool {
        self.bailed_out
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Reason of the innermost open TODO block.
    pub fn todo_reason(&self) -> Option<&str> {
        self.todo.last().map(String::as_str)
    }

    /// True when the stream did not bail out and its test set passed.
    pub fn passed(&self) -> bool {
        !self.bailed_out && self.test_set.passed()
    }

    /// Write the protocol header.
    pub fn startup(&mut self) -> Result<()> {
        self.workflow.enter_header()?;
        self.out.header()
    }

    /// Declare how many tests will run.
    ///
    /// A count of zero bails out: an empty run should use
    /// [`skip_all`](TestProducer::skip_all) instead.
    #[track_caller]
    pub fn plan(&mut self, count: usize) -> Flow {
        if count == 0 {
            return self.abort(&invalid_count_message(&count));
        }
        checked(self.workflow.enter_plan())?;
        self.test_set = mem::take(&mut self.test_set).into_fixed_size(count);
        self.out.plan(count)?;
        Ok(())
    }

    /// Skip the whole file (or subtest) and stop running it.
    #[track_caller]
    pub fn skip_all(&mut self, reason: &str) -> Flow {
        checked(self.workflow.enter_skip_all())?;
        self.test_set = TestSet::empty();
        self.out.skip_all(reason)?;
        if self.workflow.sub_test_level() == 0 {
            self.write_footer()?;
            self.ended = true;
        }
        Err(Interrupt::SkipAll)
    }

    /// Abort the stream.
    #[track_caller]
    pub fn bail_out(&mut self, reason: &str) -> Flow {
        self.abort(reason)
    }

    /// Record a test point located at the caller.
    #[track_caller]
    pub fn assert(&mut self, test: bool, description: &str) -> Flow<bool> {
        self.assert_at(test, description, SourceLocation::caller())
    }

    /// Record a test point; a failure is reported at `location`.
    pub fn assert_at(
        &mut self,
        test: bool,
        description: &str,
        location: SourceLocation,
    ) -> Flow<bool> {
        checked_at(self.workflow.enter_test_case(), &location)?;
        let plain = Plain::new(description, test);
        let case = match self.todo.last() {
            Some(reason) => TestCase::todo(plain, reason.clone()),
            None => TestCase::Plain(plain),
        };
        let number = self.test_set.add_test(case.clone());
        self.out.test_case(number, &case)?;

        if !test {
            let message = if description.trim().is_empty() {
                format!("Failed test at {}.", location)
            } else {
                format!("Failed test '{}' at {}.", description, location)
            };
            self.diagnose(&message)?;
        }
        Ok(test)
    }

    /// Record `count` skipped test points.
    #[track_caller]
    pub fn skip(&mut self, count: usize, reason: &str) -> Flow {
        if count == 0 {
            return self.reject_skip_count(&count);
        }
        if !self.todo.is_empty() {
            return self.abort("Can not skip tests inside a TODO block.");
        }
        for _ in 0..count {
            checked(self.workflow.enter_test_case())?;
            let case = TestCase::skip(reason);
            let number = self.test_set.add_test(case.clone());
            self.out.test_case(number, &case)?;
        }
        Ok(())
    }

    /// Handle a skip count that is not a strictly positive integer.
    ///
    /// With a fixed plan the count mismatch would go unnoticed, so the
    /// stream bails out; otherwise this is only a warning.
    #[track_caller]
    pub fn reject_skip_count(&mut self, value: &dyn Display) -> Flow {
        let message = invalid_count_message(value);
        if let Plan::FixedSize(_) = self.test_set.plan() {
            return self.abort(&message);
        }
        self.warn(&message)
    }

    /// Open a TODO block; blocks nest and the innermost reason applies.
    #[track_caller]
    pub fn start_todo(&mut self, reason: &str) -> Flow {
        checked(self.workflow.start_todo())?;
        self.todo.push(reason.to_string());
        Ok(())
    }

    #[track_caller]
    pub fn end_todo(&mut self) -> Flow {
        checked(self.workflow.end_todo())?;
        self.todo.pop();
        Ok(())
    }

    /// Run `child` as a nested test and record its outcome as one test point.
    ///
    /// The child starts with a fresh dynamic plan outside any TODO block and
    /// its output is indented one level. Only a skip-all inside the child is
    /// contained; a bail-out or an error ends the whole stream.
    #[track_caller]
    pub fn sub_test<F>(&mut self, description: &str, child: F) -> Flow<bool>
    where
        F: FnOnce(&mut TestProducer) -> Flow,
    {
        self.sub_test_at(description, SourceLocation::caller(), child)
    }

    pub fn sub_test_at<F>(
        &mut self,
        description: &str,
        location: SourceLocation,
        child: F,
    ) -> Flow<bool>
    where
        F: FnOnce(&mut TestProducer) -> Flow,
    {
        checked_at(self.workflow.start_sub_test(), &location)?;
        let parent_set = mem::take(&mut self.test_set);
        let parent_todo = mem::take(&mut self.todo);
        self.out.indent();
        self.err.indent();
        self.out.comment(&format!("Subtest: {}", description))?;

        let outcome = child(&mut *self);
        self.todo = parent_todo;
        match outcome {
            Ok(()) | Err(Interrupt::SkipAll) => {}
            Err(interrupt) => return Err(interrupt),
        }

        self.close_set()
            .map_err(|e| Interrupt::Error(e.located(location.clone())))?;
        checked_at(self.workflow.end_sub_test(), &location)?;
        self.out.dedent();
        self.err.dedent();
        let child_set = mem::replace(&mut self.test_set, parent_set);
        self.assert_at(child_set.passed(), description, location)
    }

    /// Record a subtest that was skipped entirely.
    #[track_caller]
    pub fn skip_sub_test(&mut self, reason: &str) -> Flow {
        checked(self.workflow.start_sub_test())?;
        self.out.indent();
        self.err.indent();
        checked(self.workflow.enter_skip_all())?;
        self.out.skip_all(reason)?;
        checked(self.workflow.enter_footer())?;
        checked(self.workflow.end_sub_test())?;
        self.out.dedent();
        self.err.dedent();

        checked(self.workflow.enter_test_case())?;
        let case = TestCase::skip(reason);
        let number = self.test_set.add_test(case.clone());
        self.out.test_case(number, &case)?;
        Ok(())
    }

    /// Diagnostic for a human; a comment inside a TODO block, an error
    /// otherwise.
    #[track_caller]
    pub fn diagnose(&mut self, text: &str) -> Flow {
        if self.todo.is_empty() {
            checked(self.workflow.enter_error())?;
            self.err.diagnostic(text)?;
        } else {
            checked(self.workflow.enter_comment())?;
            self.out.comment(text)?;
        }
        Ok(())
    }

    /// Comment in the TAP stream.
    #[track_caller]
    pub fn note(&mut self, text: &str) -> Flow {
        checked(self.workflow.enter_comment())?;
        self.out.comment(text)?;
        Ok(())
    }

    /// Diagnostic on the error stream.
    #[track_caller]
    pub fn warn(&mut self, text: &str) -> Flow {
        checked(self.workflow.enter_error())?;
        self.err.diagnostic(text)?;
        Ok(())
    }

    /// Complete the stream. Does nothing once the stream has ended.
    ///
    /// A file that loaded gets its late plan (for dynamic sets), its closing
    /// diagnostics and its footer; a file that did not load ends right after
    /// the header.
    pub fn shutdown(&mut self, loaded: bool) -> Result<()> {
        if self.ended {
            return Ok(());
        }
        self.ended = true;
        if loaded {
            self.close_set()
        } else {
            self.workflow.not_loaded()?;
            self.out.footer()?;
            self.err.footer()
        }
    }

    /// Get ready for the next test file.
    pub fn reset(&mut self) -> Result<()> {
        self.out.reset()?;
        self.err.reset()?;
        self.test_set.reset();
        self.workflow = Workflow::new();
        self.todo.clear();
        self.bailed_out = false;
        self.ended = false;
        Ok(())
    }

    /// Write errors collected while the stream was running.
    ///
    /// This bypasses the workflow: the stream is complete by the time hidden
    /// errors are flushed.
    pub fn flush_hidden_errors(&mut self, errors: &[HiddenError]) -> Result<()> {
        self.err.reset()?;
        for error in errors {
            self.err.diagnostic(&format!("Hidden error: {}", error))?;
        }
        self.err.footer()
    }

    #[track_caller]
    fn abort<T>(&mut self, reason: &str) -> Flow<T> {
        checked(self.workflow.enter_bail_out())?;
        self.bailed_out = true;
        self.out.bail_out(reason)?;
        self.write_footer()?;
        self.ended = true;
        Err(Interrupt::BailOut)
    }

    fn close_set(&mut self) -> Result<()> {
        let count = self.test_set.tests_count();
        if self.test_set.plan() == Plan::Dynamic && count > 0 {
            self.workflow.enter_plan()?;
            self.out.plan(count)?;
        }
        for message in self.test_set.close() {
            self.err.diagnostic(&message)?;
        }
        self.write_footer()
    }

    fn write_footer(&mut self) -> Result<()> {
        self.workflow.enter_footer()?;
        self.out.footer()?;
        self.err.footer()
    }
}
