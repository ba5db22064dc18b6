//! tap-producer - Write Test Anything Protocol streams
//!
//! A [`TestProducer`] turns test events (plans, assertions, skips, TODO
//! blocks, subtests, diagnostics) into a TAP version 13 stream, refusing
//! calls that would make the stream malformed.
//!
//! # Architecture
//!
//! - [`workflow`]: the state machine deciding which calls are legal when
//! - [`test_case`] and [`test_set`]: test points and the plan they are counted against
//! - [`stream`]: TAP formatting onto [`sink`]s
//! - [`producer`]: the public API tying the above together
//! - [`interceptor`]: collects errors and panics raised while a file runs
//! - [`runner`] and [`harness`]: run one test file, or many with a summary
//! - [`loader`] and [`script`]: where test programs come from
//! - [`commands`], [`config`] and [`testlist`]: the `tapr` command line tool
//! - [`error`]: Error types and Result alias
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use tap_producer::loader::ProgramRegistry;
//! use tap_producer::runner::TestRunner;
//! use tap_producer::sink::MemorySink;
//! use tap_producer::{Flow, TestProducer};
//!
//! # fn main() -> tap_producer::Result<()> {
//! let mut registry = ProgramRegistry::new();
//! registry.register("t/math.t", |p: &mut TestProducer| -> Flow {
//!     p.plan(2)?;
//!     p.assert(1 + 1 == 2, "addition")?;
//!     p.sub_test("nested", |p: &mut TestProducer| -> Flow {
//!         p.assert(2 * 2 == 4, "multiplication")?;
//!         Ok(())
//!     })?;
//!     Ok(())
//! });
//!
//! let out = MemorySink::new();
//! let mut producer = TestProducer::new(Box::new(out.clone()), Box::new(MemorySink::new()));
//! let report = TestRunner::new(registry).run_test(&mut producer, Path::new("t/math.t"))?;
//!
//! assert_eq!(report.exit_code, 0);
//! assert_eq!(out.lines()[1], "1..2");
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod harness;
pub mod interceptor;
pub mod loader;
pub mod producer;
pub mod runner;
pub mod script;
pub mod sink;
pub mod stream;
pub mod test_case;
pub mod test_set;
pub mod testlist;
pub mod workflow;

pub use error::{Error, Flow, Interrupt, Result};
pub use producer::TestProducer;
