//! Interception of runtime errors raised while a test file runs
//!
//! Anything that goes wrong outside the TAP protocol (a panic, an error
//! returned by the test program, a warning from the script loader) must not
//! be written into the middle of the TAP stream. While an
//! [`ErrorInterceptor`] is installed on the current thread such problems are
//! collected as [`HiddenError`]s, and the runner flushes them once the
//! stream is complete.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, Location};
use std::sync::Once;

/// A position in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        SourceLocation {
            file: file.into(),
            line,
        }
    }

    /// The location of the caller, following `#[track_caller]` frames.
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }
}

impl From<&Location<'_>> for SourceLocation {
    fn from(location: &Location<'_>) -> Self {
        SourceLocation::new(location.file(), location.line())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} line {}", self.file, self.line)
    }
}

/// An error or warning kept out of the TAP stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenError {
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl HiddenError {
    pub fn new(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        HiddenError {
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for HiddenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} at {}.", self.message, location),
            None => write!(f, "{}", self.message),
        }
    }
}

thread_local! {
    static CAPTURE: RefCell<Option<Vec<HiddenError>>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chain a panic hook that captures panics on threads with an active
/// interceptor and defers to the previous hook everywhere else.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let hidden = HiddenError::new(
                panic_message(info.payload()),
                info.location().map(SourceLocation::from),
            );
            if try_record(hidden).is_err() {
                previous(info);
            }
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {}", message)
    } else {
        "panic with a non-string payload".to_string()
    }
}

fn try_record(hidden: HiddenError) -> Result<(), HiddenError> {
    let mut pending = Some(hidden);
    let _ = CAPTURE.try_with(|capture| {
        if let Ok(mut capture) = capture.try_borrow_mut() {
            if let Some(errors) = capture.as_mut() {
                errors.extend(pending.take());
            }
        }
    });
    match pending {
        Some(hidden) => Err(hidden),
        None => Ok(()),
    }
}

/// Report a runtime error or warning.
///
/// Captured when an interceptor is active on this thread, logged otherwise.
pub fn report(message: impl Into<String>, location: Option<SourceLocation>) {
    if let Err(hidden) = try_record(HiddenError::new(message, location)) {
        tracing::warn!("{}", hidden);
    }
}

/// Guard collecting hidden errors until it is finished or dropped.
///
/// Interceptors nest: installing one saves whatever the current thread was
/// collecting, and finishing it restores that state.
#[must_use = "dropping the interceptor discards the captured errors"]
pub struct ErrorInterceptor {
    previous: Option<Option<Vec<HiddenError>>>,
}

impl ErrorInterceptor {
    pub fn install() -> Self {
        install_panic_hook();
        let previous = CAPTURE.with(|capture| capture.replace(Some(Vec::new())));
        ErrorInterceptor {
            previous: Some(previous),
        }
    }

    /// Restore the previous state and return what was captured.
    pub fn finish(mut self) -> Vec<HiddenError> {
        self.restore()
    }

    fn restore(&mut self) -> Vec<HiddenError> {
        match self.previous.take() {
            Some(previous) => CAPTURE
                .with(|capture| capture.replace(previous))
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }
}

impl Drop for ErrorInterceptor {
    fn drop(&mut self) {
        self.restore();
    }
}
