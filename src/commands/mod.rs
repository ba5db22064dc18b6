//! Command system for tapr
//!
//! Commands are executed through the Command trait.

use crate::error::Result;
use crate::sink::{ConsoleSink, LineSink};

pub mod prove;
pub mod run;
mod utils;

pub use prove::ProveCommand;
pub use run::RunCommand;

/// Where a command writes its output
pub struct Streams {
    pub out: Box<dyn LineSink>,
    pub err: Box<dyn LineSink>,
}

impl Streams {
    pub fn new(out: Box<dyn LineSink>, err: Box<dyn LineSink>) -> Self {
        Streams { out, err }
    }

    /// The process's stdout and stderr
    pub fn console() -> Self {
        Streams::new(Box::new(ConsoleSink::stdout()), Box::new(ConsoleSink::stderr()))
    }
}

/// Trait that all commands must implement
pub trait Command {
    /// Execute the command, returning the process exit code
    fn execute(&self, streams: Streams) -> Result<i32>;

    /// Get the command name
    fn name(&self) -> &str;

    /// Get command help text
    fn help(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    struct MockCommand;

    impl Command for MockCommand {
        fn execute(&self, mut streams: Streams) -> Result<i32> {
            streams.out.write_line("mock output")?;
            Ok(0)
        }

        fn name(&self) -> &str {
            "mock"
        }

        fn help(&self) -> &str {
            "A mock command for testing"
        }
    }

    #[test]
    fn test_command_trait() {
        let cmd = MockCommand;
        assert_eq!(cmd.name(), "mock");
        assert_eq!(cmd.help(), "A mock command for testing");

        let out = MemorySink::new();
        let streams = Streams::new(Box::new(out.clone()), Box::new(MemorySink::new()));
        assert_eq!(cmd.execute(streams).unwrap(), 0);
        assert_eq!(out.lines(), vec!["mock output"]);
    }
}
