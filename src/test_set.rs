//! Aggregation of test outcomes for one plan

use crate::test_case::TestCase;

/// How many tests a set expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Everything was skipped; nothing is recorded.
    Empty,
    /// No count declared; the plan is emitted after the last test.
    Dynamic,
    /// A count declared before the first test.
    FixedSize(usize),
}

/// The tests recorded under one plan.
#[derive(Debug, Clone)]
pub struct TestSet {
    plan: Plan,
    tests: Vec<TestCase>,
    failures: usize,
}

impl Default for TestSet {
    fn default() -> Self {
        Self::dynamic()
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "test"
    } else {
        "tests"
    }
}

impl TestSet {
    pub fn new(plan: Plan) -> Self {
        TestSet {
            plan,
            tests: Vec::new(),
            failures: 0,
        }
    }

    pub fn empty() -> Self {
        Self::new(Plan::Empty)
    }

    pub fn dynamic() -> Self {
        Self::new(Plan::Dynamic)
    }

    pub fn fixed_size(length: usize) -> Self {
        Self::new(Plan::FixedSize(length))
    }

    pub fn plan(&self) -> Plan {
        self.plan
    }

    /// The same tests under a fixed plan, for a plan declared after the
    /// tests ran.
    pub fn into_fixed_size(self, length: usize) -> Self {
        TestSet {
            plan: Plan::FixedSize(length),
            ..self
        }
    }

    /// Record a test and return its 1-based number.
    ///
    /// An [`Plan::Empty`] set records nothing and returns 0.
    pub fn add_test(&mut self, case: TestCase) -> usize {
        if self.plan == Plan::Empty {
            return 0;
        }
        if !case.passed() {
            self.failures += 1;
        }
        self.tests.push(case);
        self.tests.len()
    }

    pub fn tests(&self) -> &[TestCase] {
        &self.tests
    }

    pub fn tests_count(&self) -> usize {
        self.tests.len()
    }

    pub fn failures_count(&self) -> usize {
        self.failures
    }

    /// Tests run beyond the declared plan; negative when fewer ran.
    ///
    /// Always 0 for sets without a fixed size.
    pub fn extras_count(&self) -> isize {
        match self.plan {
            Plan::FixedSize(length) => self.tests.len() as isize - length as isize,
            Plan::Empty | Plan::Dynamic => 0,
        }
    }

    pub fn passed(&self) -> bool {
        match self.plan {
            Plan::Empty => true,
            Plan::Dynamic => !self.tests.is_empty() && self.failures == 0,
            Plan::FixedSize(_) => {
                !self.tests.is_empty() && self.failures == 0 && self.extras_count() == 0
            }
        }
    }

    /// Closing diagnostics for the set, one message per line.
    pub fn close(&self) -> Vec<String> {
        let ran = self.tests.len();
        let mut messages = Vec::new();
        match self.plan {
            Plan::Empty => {}
            Plan::Dynamic => {
                if ran == 0 {
                    messages.push("No plan. No tests run!".to_string());
                } else if self.failures > 0 {
                    messages.push("No plan!".to_string());
                    messages.push(self.failure_summary());
                }
            }
            Plan::FixedSize(length) => {
                if ran == 0 {
                    messages.push("No tests run!".to_string());
                } else {
                    if ran != length {
                        messages.push(format!(
                            "Looks like you planned {} {} but ran {}.",
                            length,
                            plural(length),
                            ran
                        ));
                    }
                    if self.failures > 0 {
                        messages.push(self.failure_summary());
                    }
                }
            }
        }
        messages
    }

    /// Forget every recorded test and the plan; numbering starts again
    /// from 1 under a dynamic plan.
    pub fn reset(&mut self) {
        self.plan = Plan::Dynamic;
        self.tests.clear();
        self.failures = 0;
    }

    fn failure_summary(&self) -> String {
        format!(
            "Looks like you failed {} {} of {} run.",
            self.failures,
            plural(self.failures),
            self.tests.len()
        )
    }
}
