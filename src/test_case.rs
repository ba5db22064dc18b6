//! Outcomes of individual test points

/// Description used when a test point is given none.
pub const DEFAULT_DESCRIPTION: &str = "(no description)";

/// A plain pass/fail test point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plain {
    description: String,
    passed: bool,
}

impl Plain {
    pub fn new(description: impl Into<String>, passed: bool) -> Self {
        let description = description.into();
        let description = if description.trim().is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            description
        };
        Plain {
            description,
            passed,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn passed(&self) -> bool {
        self.passed
    }
}

/// The outcome of one test point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestCase {
    /// An ordinary assertion.
    Plain(Plain),
    /// An assertion made inside a TODO block; its failure is expected.
    Todo { inner: Plain, reason: String },
    /// A test point that was not run. Always passes.
    Skip { reason: String },
}

impl TestCase {
    pub fn plain(description: impl Into<String>, passed: bool) -> Self {
        TestCase::Plain(Plain::new(description, passed))
    }

    pub fn todo(inner: Plain, reason: impl Into<String>) -> Self {
        TestCase::Todo {
            inner,
            reason: reason.into(),
        }
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        TestCase::Skip {
            reason: reason.into(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            TestCase::Plain(plain) | TestCase::Todo { inner: plain, .. } => plain.description(),
            TestCase::Skip { .. } => DEFAULT_DESCRIPTION,
        }
    }

    pub fn passed(&self) -> bool {
        match self {
            TestCase::Plain(plain) | TestCase::Todo { inner: plain, .. } => plain.passed(),
            TestCase::Skip { .. } => true,
        }
    }

    /// The TODO or SKIP reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            TestCase::Plain(_) => None,
            TestCase::Todo { reason, .. } | TestCase::Skip { reason } => Some(reason),
        }
    }

    pub fn is_todo(&self) -> bool {
        matches!(self, TestCase::Todo { .. })
    }
}
