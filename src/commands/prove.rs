//! Run many test files and summarise them

use crate::commands::utils::{base_dir, resolve};
use crate::commands::{Command, Streams};
use crate::config::TaprConfig;
use crate::error::{Error, Result};
use crate::harness::TestHarness;
use crate::script::ScriptLoader;
use crate::testlist::{discover, parse_list_file};
use std::path::PathBuf;

pub struct ProveCommand {
    base_path: Option<String>,
    paths: Vec<String>,
    load_list: Option<String>,
    color: bool,
}

impl ProveCommand {
    pub fn new(base_path: Option<String>) -> Self {
        ProveCommand {
            base_path,
            paths: Vec::new(),
            load_list: None,
            color: false,
        }
    }

    /// Files or directories to run instead of the configured `test_dir`
    pub fn with_paths(mut self, paths: Vec<String>) -> Self {
        self.paths = paths;
        self
    }

    /// Read the files to run from a list file
    pub fn with_load_list(mut self, load_list: Option<String>) -> Self {
        self.load_list = load_list;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn requested_paths(&self, config: &TaprConfig) -> Result<Vec<PathBuf>> {
        let base = self.base_path.as_deref();
        let mut paths: Vec<PathBuf> = self.paths.iter().map(|p| resolve(base, p)).collect();

        if let Some(list) = &self.load_list {
            let listed = parse_list_file(&resolve(base, list))?;
            paths.extend(
                listed
                    .iter()
                    .map(|p| resolve(base, &p.to_string_lossy())),
            );
        }

        if paths.is_empty() {
            paths.push(resolve(base, &config.test_dir));
        }
        Ok(paths)
    }
}

impl Command for ProveCommand {
    fn execute(&self, mut streams: Streams) -> Result<i32> {
        let config = TaprConfig::load(base_dir(self.base_path.as_deref()))?;
        let requested = self.requested_paths(&config)?;
        let files = discover(&requested, &config.test_regex()?)?;

        if files.is_empty() {
            return Err(Error::Other(format!(
                "No test files found matching '{}'",
                config.test_pattern
            )));
        }

        let mut harness = TestHarness::new(ScriptLoader).with_color(self.color);
        let summary = harness.run_tests(&files, &mut *streams.out)?;
        Ok(summary.exit_code())
    }

    fn name(&self) -> &str {
        "prove"
    }

    fn help(&self) -> &str {
        "Run test files and report one status line per file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE;
    use crate::sink::MemorySink;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let temp = TempDir::new().unwrap();
        let t = temp.path().join("t");
        fs::create_dir(&t).unwrap();
        fs::write(t.join("a.t"), "plan 1\nok alpha\n").unwrap();
        fs::write(t.join("b.t"), "ok beta\nnot ok gamma\n").unwrap();
        fs::write(t.join("README"), "not a test\n").unwrap();
        temp
    }

    fn prove(cmd: ProveCommand) -> (Result<i32>, Vec<String>) {
        let out = MemorySink::new();
        let streams = Streams::new(Box::new(out.clone()), Box::new(MemorySink::new()));
        (cmd.execute(streams), out.lines())
    }

    fn base(temp: &TempDir) -> Option<String> {
        Some(temp.path().to_string_lossy().to_string())
    }

    #[test]
    fn test_prove_default_test_dir() {
        let temp = setup();
        let (code, out) = prove(ProveCommand::new(base(&temp)));

        assert_eq!(code.unwrap(), 1);
        assert_eq!(out.len(), 4);
        assert!(out[0].contains("a.t") && out[0].ends_with(" ok"));
        assert!(out[1].contains("b.t") && out[1].ends_with(" ko"));
        assert_eq!(out[2], "FAILED: 1/2 test files, 1/3 tests failed.");
        assert_eq!(out[3], "Files=2, Tests=3, Failures=1");
    }

    #[test]
    fn test_prove_explicit_paths() {
        let temp = setup();
        let cmd = ProveCommand::new(base(&temp)).with_paths(vec!["t/a.t".to_string()]);
        let (code, out) = prove(cmd);

        assert_eq!(code.unwrap(), 0);
        assert_eq!(out[1], "All tests successful.");
    }

    #[test]
    fn test_prove_load_list() {
        let temp = setup();
        fs::write(temp.path().join("list.txt"), "# wanted\nt/b.t\nt/gone.t\n").unwrap();
        let cmd = ProveCommand::new(base(&temp)).with_load_list(Some("list.txt".to_string()));
        let (code, out) = prove(cmd);

        assert_eq!(code.unwrap(), 2);
        assert!(out[0].ends_with(" ko"));
        assert!(out[1].ends_with(" NOT FOUND"));
    }

    #[test]
    fn test_prove_configured_pattern() {
        let temp = setup();
        fs::write(
            temp.path().join(CONFIG_FILE),
            "[DEFAULT]\ntest_pattern=^README$\n",
        )
        .unwrap();
        fs::write(temp.path().join("t").join("README"), "ok readme\nfrobnicate\n").unwrap();
        let (code, out) = prove(ProveCommand::new(base(&temp)));

        // unknown directives are hidden errors, not failed tests
        assert_eq!(code.unwrap(), 1);
        assert_eq!(out.len(), 3);
        assert!(out[0].ends_with(" ok+DUBIOUS"));
    }

    #[test]
    fn test_prove_no_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("t")).unwrap();
        let (result, out) = prove(ProveCommand::new(base(&temp)));

        assert!(result.is_err());
        assert!(out.is_empty());
    }
}
