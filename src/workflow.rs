//! Protocol state machine
//!
//! A TAP stream must follow a strict order: the header comes first, a plan
//! is either declared before the first test or once after the last one,
//! never both and never twice, and nothing but the footer may follow a
//! bail-out. [`Workflow`] tracks where the producer is in that sequence and
//! rejects every call made from a state that does not allow it.

use std::fmt;
use thiserror::Error;

/// Position of the producer in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Nothing written yet.
    Start,
    /// Header written, no plan and no test yet.
    Header,
    /// Plan declared up front, no test yet.
    Plan,
    /// Tests ran without a plan.
    Body,
    /// Tests ran, then the plan closed the stream.
    BodyPlan,
    /// Plan declared up front, tests ran.
    PlanBody,
    /// Every test was skipped with a skip-all plan.
    PlanNoBody,
    /// The stream was aborted.
    BailOut,
    /// Footer written.
    End,
}

impl State {
    pub const ALL: [State; 9] = [
        State::Start,
        State::Header,
        State::Plan,
        State::Body,
        State::BodyPlan,
        State::PlanBody,
        State::PlanNoBody,
        State::BailOut,
        State::End,
    ];
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Start => "start",
            State::Header => "header",
            State::Plan => "plan",
            State::Body => "body",
            State::BodyPlan => "body-plan",
            State::PlanBody => "plan-body",
            State::PlanNoBody => "plan-no-body",
            State::BailOut => "bail-out",
            State::End => "end",
        };
        f.write_str(name)
    }
}

/// A protocol call made from a state that does not allow it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation}: {message} (state: {state})")]
pub struct WorkflowError {
    operation: &'static str,
    state: State,
    message: &'static str,
}

impl WorkflowError {
    /// The rejected operation.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// The state the workflow was in when the call was rejected.
    pub fn state(&self) -> State {
        self.state
    }

    pub fn message(&self) -> &'static str {
        self.message
    }
}

pub type Transition = std::result::Result<(), WorkflowError>;

/// The protocol state machine for one producer.
///
/// Subtests reuse the same workflow: entering one saves the current state
/// and TODO level on a stack and restarts from [`State::Header`] outside any
/// TODO block; leaving it restores both.
#[derive(Debug, Clone)]
pub struct Workflow {
    state: State,
    saved: Vec<(State, usize)>,
    todo_level: usize,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    pub fn new() -> Self {
        Workflow {
            state: State::Start,
            saved: Vec::new(),
            todo_level: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Nesting depth of subtests, 0 at the top level.
    pub fn sub_test_level(&self) -> usize {
        self.saved.len()
    }

    /// Nesting depth of TODO blocks.
    pub fn todo_level(&self) -> usize {
        self.todo_level
    }

    pub fn enter_header(&mut self) -> Transition {
        match self.state {
            State::Start => self.go("header", State::Header),
            _ => Err(self.reject("header", "header must come first")),
        }
    }

    pub fn enter_plan(&mut self) -> Transition {
        match self.state {
            State::Header => self.go("plan", State::Plan),
            State::Body => self.go("plan", State::BodyPlan),
            State::BodyPlan | State::Plan | State::PlanBody => {
                Err(self.reject("plan", "can not plan twice"))
            }
            State::PlanNoBody => Err(self.reject("plan", "can not plan and skip-all together")),
            State::BailOut => Err(self.reject("plan", "can not plan after a bail out")),
            State::Start => Err(self.reject("plan", "the header is missing")),
            State::End => Err(self.reject("plan", "the test has already ended")),
        }
    }

    pub fn enter_skip_all(&mut self) -> Transition {
        match self.state {
            State::Header => self.go("skip-all", State::PlanNoBody),
            State::Body => Err(self.reject("skip-all", "tests have already run")),
            State::BodyPlan | State::Plan | State::PlanBody => {
                Err(self.reject("skip-all", "a plan was already declared"))
            }
            State::PlanNoBody => Err(self.reject("skip-all", "can not skip-all twice")),
            State::BailOut => Err(self.reject("skip-all", "can not skip-all after a bail out")),
            State::Start => Err(self.reject("skip-all", "the header is missing")),
            State::End => Err(self.reject("skip-all", "the test has already ended")),
        }
    }

    pub fn enter_test_case(&mut self) -> Transition {
        match self.state {
            State::Header | State::Body => self.go("test case", State::Body),
            State::Plan | State::PlanBody => self.go("test case", State::PlanBody),
            _ => Err(self.reject_test_case("test case")),
        }
    }

    pub fn enter_bail_out(&mut self) -> Transition {
        match self.state {
            State::Header
            | State::Body
            | State::BodyPlan
            | State::Plan
            | State::PlanBody
            | State::PlanNoBody => self.go("bail out", State::BailOut),
            State::BailOut => Err(self.reject("bail out", "can not bail out twice")),
            State::Start => Err(self.reject("bail out", "the header is missing")),
            State::End => Err(self.reject("bail out", "the test has already ended")),
        }
    }

    pub fn enter_footer(&mut self) -> Transition {
        match self.state {
            State::BailOut | State::BodyPlan | State::PlanBody | State::PlanNoBody => {
                self.go("footer", State::End)
            }
            State::Header => Err(self.reject("footer", "the test ends prematurely")),
            State::End => Err(self.reject("footer", "the test has already ended")),
            _ => Err(self.reject("footer", "invalid end state")),
        }
    }

    pub fn start_sub_test(&mut self) -> Transition {
        match self.state {
            State::Header | State::Body | State::Plan | State::PlanBody => {
                self.saved.push((self.state, self.todo_level));
                self.todo_level = 0;
                self.go("start subtest", State::Header)
            }
            State::Start => Err(self.reject("start subtest", "the header is missing")),
            State::End => Err(self.reject("start subtest", "the test has already ended")),
            State::BodyPlan => Err(self.reject(
                "start subtest",
                "the test is already closed with a plan",
            )),
            State::PlanNoBody => Err(self.reject(
                "start subtest",
                "all tests were declared skipped",
            )),
            State::BailOut => Err(self.reject("start subtest", "the test has bailed out")),
        }
    }

    pub fn end_sub_test(&mut self) -> Transition {
        match self.saved.pop() {
            Some((parent, todo_level)) => {
                self.todo_level = todo_level;
                self.go("end subtest", parent)
            }
            None => Err(self.reject("end subtest", "no subtest to end")),
        }
    }

    pub fn start_todo(&mut self) -> Transition {
        self.check_test_case("start todo")?;
        self.todo_level += 1;
        Ok(())
    }

    pub fn end_todo(&mut self) -> Transition {
        self.check_test_case("end todo")?;
        if self.todo_level == 0 {
            return Err(self.reject("end todo", "no TODO block was started"));
        }
        self.todo_level -= 1;
        Ok(())
    }

    pub fn enter_comment(&self) -> Transition {
        self.check_open("comment")
    }

    pub fn enter_error(&self) -> Transition {
        self.check_open("error")
    }

    /// The test file could not be loaded: close the stream right after the
    /// header.
    pub fn not_loaded(&mut self) -> Transition {
        match self.state {
            State::Header => self.go("not loaded", State::End),
            _ => Err(self.reject("not loaded", "the test has already started")),
        }
    }

    fn go(&mut self, operation: &'static str, to: State) -> Transition {
        tracing::trace!(operation, from = %self.state, to = %to, "workflow transition");
        self.state = to;
        Ok(())
    }

    fn check_test_case(&self, operation: &'static str) -> Transition {
        match self.state {
            State::Header | State::Body | State::Plan | State::PlanBody => Ok(()),
            _ => Err(self.reject_test_case(operation)),
        }
    }

    fn check_open(&self, operation: &'static str) -> Transition {
        match self.state {
            State::Start => Err(self.reject(operation, "the header is missing")),
            State::End => Err(self.reject(operation, "the test has already ended")),
            _ => Ok(()),
        }
    }

    fn reject_test_case(&self, operation: &'static str) -> WorkflowError {
        let message = match self.state {
            State::Start => "the header is missing",
            State::End => "the test has already ended",
            State::BodyPlan => "the test is already closed with a plan",
            State::PlanNoBody => "all tests were declared skipped",
            State::BailOut => "the test has bailed out",
            _ => "invalid state",
        };
        self.reject(operation, message)
    }

    fn reject(&self, operation: &'static str, message: &'static str) -> WorkflowError {
        WorkflowError {
            operation,
            state: self.state,
            message,
        }
    }
}
