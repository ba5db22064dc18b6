//! Error types for tap-producer
//!
//! Two kinds of values travel up the call stack while a test program runs:
//! genuine [`Error`]s, and the [`Interrupt`] signals used by skip-all and
//! bail-out to unwind to the runner without counting as failures.

use crate::interceptor::SourceLocation;
use crate::workflow::WorkflowError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tap-producer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for calls made from inside a running test program
pub type Flow<T = ()> = std::result::Result<T, Interrupt>;

/// Main error type for tap-producer
#[derive(Error, Debug)]
pub enum Error {
    /// A protocol call was made from a state that does not allow it.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// A test script could not be parsed.
    #[error("{}:{line}: {message}", path.display())]
    Script {
        path: PathBuf,
        line: u32,
        message: String,
    },

    /// Configuration file error or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A test program raised an error while running.
    #[error("{0}")]
    Runtime(String),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Other error with custom message.
    #[error("{0}")]
    Other(String),

    /// An error tied to the test code that caused it.
    #[error("{error} at {location}.")]
    Located {
        error: Box<Error>,
        location: SourceLocation,
    },
}

impl Error {
    /// Attach `location` unless the error already points somewhere.
    pub fn located(self, location: SourceLocation) -> Error {
        match self {
            Error::Located { .. } | Error::Script { .. } => self,
            error => Error::Located {
                error: Box::new(error),
                location,
            },
        }
    }

    /// Attach `location`, replacing any location already attached.
    pub fn relocated(self, location: SourceLocation) -> Error {
        match self {
            Error::Located { error, .. } => Error::Located { error, location },
            Error::Script { .. } => self,
            error => Error::Located {
                error: Box::new(error),
                location,
            },
        }
    }

    /// The error without its location.
    pub fn root(&self) -> &Error {
        match self {
            Error::Located { error, .. } => error.root(),
            error => error,
        }
    }

    /// Split off the attached location, if any.
    pub fn into_parts(self) -> (Error, Option<SourceLocation>) {
        match self {
            Error::Located { error, location } => (*error, Some(location)),
            error => (error, None),
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

/// Early termination of a test program.
///
/// `SkipAll` and `BailOut` have already been written to the TAP stream by the
/// time they are returned; the runner treats them as a normal (if early) end
/// of the file. `Error` is anything else and becomes a hidden error.
#[derive(Error, Debug)]
pub enum Interrupt {
    #[error("all remaining tests skipped")]
    SkipAll,

    #[error("bailed out")]
    BailOut,

    #[error(transparent)]
    Error(#[from] Error),
}

impl Interrupt {
    /// Returns true for the two signals that are not errors.
    pub fn is_signal(&self) -> bool {
        matches!(self, Interrupt::SkipAll | Interrupt::BailOut)
    }
}

impl From<WorkflowError> for Interrupt {
    fn from(e: WorkflowError) -> Self {
        Interrupt::Error(Error::Workflow(e))
    }
}

impl From<io::Error> for Interrupt {
    fn from(e: io::Error) -> Self {
        Interrupt::Error(Error::Io(e))
    }
}
