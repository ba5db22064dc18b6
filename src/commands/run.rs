//! Run a single test file and show its TAP stream

use crate::commands::utils::{base_dir, resolve};
use crate::commands::{Command, Streams};
use crate::config::TaprConfig;
use crate::error::Result;
use crate::producer::TestProducer;
use crate::runner::TestRunner;
use crate::script::ScriptLoader;
use crate::sink::{FileSink, LineSink, TeeSink};

pub struct RunCommand {
    base_path: Option<String>,
    file: String,
}

impl RunCommand {
    pub fn new(base_path: Option<String>, file: String) -> Self {
        RunCommand { base_path, file }
    }
}

impl Command for RunCommand {
    fn execute(&self, streams: Streams) -> Result<i32> {
        let base = base_dir(self.base_path.as_deref());
        let config = TaprConfig::load(base)?;
        let path = resolve(self.base_path.as_deref(), &self.file);

        let out: Box<dyn LineSink> = match config.tap_log_path(base) {
            Some(log) => {
                tracing::debug!(log = %log.display(), "appending TAP stream to log");
                Box::new(TeeSink::new(vec![
                    streams.out,
                    Box::new(FileSink::append(&log)?),
                ]))
            }
            None => streams.out,
        };

        let mut producer = TestProducer::new(out, streams.err);
        let runner = TestRunner::new(ScriptLoader);
        let report = runner.run_test(&mut producer, &path)?;
        Ok(report.exit_code)
    }

    fn name(&self) -> &str {
        "run"
    }

    fn help(&self) -> &str {
        "Run a test file and write its TAP stream to stdout"
    }
}
