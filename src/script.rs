//! Test scripts
//!
//! A test script is a plain text file with one producer call per line:
//!
//! ```text
//! # comments and blank lines are ignored
//! plan 3
//! ok parses the header
//! not ok handles empty input
//! subtest nested cases {
//!     ok first
//!     todo not implemented
//!     not ok second
//!     end_todo
//! }
//! ```
//!
//! Scripts are parsed when loaded, so a malformed file fails to load instead
//! of stopping halfway through its TAP stream. Unknown directives are not
//! fatal: they are reported as warnings while the script runs.

use crate::error::{Error, Flow, Interrupt, Result};
use crate::interceptor::{self, SourceLocation};
use crate::loader::{TestLoader, TestProgram};
use crate::producer::{invalid_count_message, TestProducer};
use std::fs;
use std::mem;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A count as written in the script; `Err` holds text that is not a number.
type Count = std::result::Result<usize, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Plan(Count),
    Assert { passed: bool, description: String },
    Skip { count: Count, reason: String },
    StartTodo(String),
    EndTodo,
    Diagnose(String),
    Note(String),
    Warn(String),
    SkipAll(String),
    BailOut(String),
    SkipSubTest(String),
    SubTest { description: String, steps: Vec<Line> },
    Raise(String),
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    number: u32,
    step: Step,
}

/// A parsed test script
#[derive(Debug, Clone)]
pub struct Script {
    path: PathBuf,
    steps: Vec<Line>,
}

fn parse_count(text: &str) -> Count {
    text.parse::<usize>().map_err(|_| text.to_string())
}

fn parse_step(line: &str) -> Step {
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let text = rest.to_string();
    match word {
        "plan" => Step::Plan(parse_count(rest)),
        "ok" => Step::Assert {
            passed: true,
            description: text,
        },
        "not" => match rest.strip_prefix("ok") {
            Some(description) if description.is_empty() || description.starts_with(' ') => {
                Step::Assert {
                    passed: false,
                    description: description.trim().to_string(),
                }
            }
            _ => Step::Unknown(line.to_string()),
        },
        "skip" => {
            let (count, reason) = rest.split_once(' ').unwrap_or((rest, ""));
            Step::Skip {
                count: parse_count(count),
                reason: reason.trim().to_string(),
            }
        }
        "todo" => Step::StartTodo(text),
        "end_todo" => Step::EndTodo,
        "diag" => Step::Diagnose(text),
        "note" => Step::Note(text),
        "warn" => Step::Warn(text),
        "skip_all" => Step::SkipAll(text),
        "bail_out" => Step::BailOut(text),
        "skip_subtest" => Step::SkipSubTest(text),
        "error" => Step::Raise(text),
        _ => Step::Unknown(line.to_string()),
    }
}

impl Script {
    /// Parse script source; `path` is used for error and failure locations.
    pub fn parse(path: &Path, contents: &str) -> Result<Self> {
        let syntax_error = |number: u32, message: &str| Error::Script {
            path: path.to_path_buf(),
            line: number,
            message: message.to_string(),
        };

        // Open subtests: description, line number and the enclosing steps.
        let mut open: Vec<(String, u32, Vec<Line>)> = Vec::new();
        let mut steps = Vec::new();

        for (index, raw) in contents.lines().enumerate() {
            let number = index as u32 + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line == "}" {
                let (description, start, parent) = open
                    .pop()
                    .ok_or_else(|| syntax_error(number, "unbalanced '}'"))?;
                let body = mem::replace(&mut steps, parent);
                steps.push(Line {
                    number: start,
                    step: Step::SubTest {
                        description,
                        steps: body,
                    },
                });
                continue;
            }

            if let Some(header) = line.strip_prefix("subtest ") {
                if let Some(description) = header.strip_suffix('{') {
                    open.push((description.trim().to_string(), number, mem::take(&mut steps)));
                    continue;
                }
                return Err(syntax_error(number, "expected '{' after the subtest description"));
            }

            steps.push(Line {
                number,
                step: parse_step(line),
            });
        }

        if let Some((_, start, _)) = open.last() {
            return Err(syntax_error(*start, "subtest is never closed"));
        }

        Ok(Script {
            path: path.to_path_buf(),
            steps,
        })
    }

    /// Read and parse the script at `path`; `None` if there is no such file.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        Self::parse(path, &contents).map(Some)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn location(&self, line: &Line) -> SourceLocation {
        SourceLocation::new(self.path.display().to_string(), line.number)
    }

    fn run_steps(&self, steps: &[Line], producer: &mut TestProducer) -> Flow {
        for line in steps {
            match self.run_step(line, producer) {
                // Subtests locate their own errors at the failing inner line.
                Err(Interrupt::Error(e)) if !matches!(line.step, Step::SubTest { .. }) => {
                    return Err(e.relocated(self.location(line)).into());
                }
                result => result?,
            }
        }
        Ok(())
    }

    fn run_step(&self, line: &Line, producer: &mut TestProducer) -> Flow {
        match &line.step {
            Step::Plan(Ok(count)) => producer.plan(*count),
            Step::Plan(Err(text)) => producer.bail_out(&invalid_count_message(text)),
            Step::Assert {
                passed,
                description,
            } => producer
                .assert_at(*passed, description, self.location(line))
                .map(drop),
            Step::Skip {
                count: Ok(count),
                reason,
            } => producer.skip(*count, reason),
            Step::Skip {
                count: Err(text), ..
            } => producer.reject_skip_count(text),
            Step::StartTodo(reason) => producer.start_todo(reason),
            Step::EndTodo => producer.end_todo(),
            Step::Diagnose(text) => producer.diagnose(text),
            Step::Note(text) => producer.note(text),
            Step::Warn(text) => producer.warn(text),
            Step::SkipAll(reason) => producer.skip_all(reason),
            Step::BailOut(reason) => producer.bail_out(reason),
            Step::SkipSubTest(reason) => producer.skip_sub_test(reason),
            Step::SubTest { description, steps } => producer
                .sub_test_at(description, self.location(line), |producer| {
                    self.run_steps(steps, producer)
                })
                .map(drop),
            Step::Raise(message) => Err(Error::Script {
                path: self.path.clone(),
                line: line.number,
                message: message.clone(),
            }
            .into()),
            Step::Unknown(text) => {
                interceptor::report(
                    format!("unknown directive '{}'", text),
                    Some(self.location(line)),
                );
                Ok(())
            }
        }
    }
}

impl TestProgram for Script {
    fn run(&self, producer: &mut TestProducer) -> Flow {
        self.run_steps(&self.steps, producer)
    }
}

/// Loads test scripts from the filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptLoader;

impl TestLoader for ScriptLoader {
    fn load(&self, path: &Path) -> Result<Option<Rc<dyn TestProgram>>> {
        Ok(Script::load(path)?.map(|script| Rc::new(script) as Rc<dyn TestProgram>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::ErrorInterceptor;
    use crate::sink::MemorySink;
    use tempfile::TempDir;

    fn run(source: &str) -> (Flow, Vec<String>, Vec<String>) {
        let script = Script::parse(Path::new("t/script.t"), source).unwrap();
        let out = MemorySink::new();
        let err = MemorySink::new();
        let mut producer = TestProducer::new(Box::new(out.clone()), Box::new(err.clone()));
        producer.startup().unwrap();
        let result = script.run(&mut producer);
        (result, out.lines(), err.lines())
    }

    #[test]
    fn test_parse_steps() {
        let script = Script::parse(
            Path::new("t/a.t"),
            "# header comment\n\nplan 2\nok first\nnot ok second\nskip 1 not ready\n",
        )
        .unwrap();
        assert_eq!(
            script.steps,
            vec![
                Line {
                    number: 3,
                    step: Step::Plan(Ok(2))
                },
                Line {
                    number: 4,
                    step: Step::Assert {
                        passed: true,
                        description: "first".to_string()
                    }
                },
                Line {
                    number: 5,
                    step: Step::Assert {
                        passed: false,
                        description: "second".to_string()
                    }
                },
                Line {
                    number: 6,
                    step: Step::Skip {
                        count: Ok(1),
                        reason: "not ready".to_string()
                    }
                },
            ]
        );
    }

    #[test]
    fn test_parse_counts() {
        assert_eq!(parse_step("plan three"), Step::Plan(Err("three".to_string())));
        assert_eq!(parse_step("plan -1"), Step::Plan(Err("-1".to_string())));
        assert_eq!(parse_step("plan 0"), Step::Plan(Ok(0)));
        assert_eq!(parse_step("nothing ok"), Step::Unknown("nothing ok".to_string()));
        assert_eq!(parse_step("not okay"), Step::Unknown("not okay".to_string()));
    }

    #[test]
    fn test_parse_nested_subtests() {
        let script = Script::parse(
            Path::new("t/a.t"),
            "subtest outer {\n  ok a\n  subtest inner {\n    ok b\n  }\n}\nok c\n",
        )
        .unwrap();
        assert_eq!(script.steps.len(), 2);
        match &script.steps[0].step {
            Step::SubTest { description, steps } => {
                assert_eq!(description, "outer");
                assert_eq!(steps.len(), 2);
                assert!(matches!(steps[1].step, Step::SubTest { .. }));
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_parse_unbalanced() {
        let err = Script::parse(Path::new("t/a.t"), "ok a\n}\n").unwrap_err();
        assert_eq!(err.to_string(), "t/a.t:2: unbalanced '}'");

        let err = Script::parse(Path::new("t/a.t"), "subtest open {\nok a\n").unwrap_err();
        assert_eq!(err.to_string(), "t/a.t:1: subtest is never closed");

        let err = Script::parse(Path::new("t/a.t"), "subtest no brace\n").unwrap_err();
        assert!(matches!(err, Error::Script { line: 1, .. }));
    }

    #[test]
    fn test_run_reports_script_locations() {
        let (result, out, err) = run("plan 2\nok a\nnot ok b\n");
        assert!(result.is_ok());
        assert_eq!(out, vec!["TAP version 13", "1..2", "ok 1 - a", "not ok 2 - b"]);
        assert_eq!(err, vec!["# Failed test 'b' at t/script.t line 3."]);
    }

    #[test]
    fn test_run_subtest_and_todo() {
        let (result, out, _err) = run(
            "subtest parsing {\n  ok header\n  todo later\n  not ok body\n  end_todo\n}\n",
        );
        assert!(result.is_ok());
        assert_eq!(
            out,
            vec![
                "TAP version 13",
                "    # Subtest: parsing",
                "    ok 1 - header",
                "    not ok 2 - body # TODO later",
                "    # Failed test 'body' at t/script.t line 4.",
                "    1..2",
                "not ok 1 - parsing",
            ]
        );
    }

    #[test]
    fn test_run_invalid_plan_bails_out() {
        let (result, out, _err) = run("plan lots\nok a\n");
        assert!(matches!(result, Err(Interrupt::BailOut)));
        assert_eq!(
            out.last().unwrap(),
            "Bail out! Number of tests must be a strictly positive integer. You gave it 'lots'."
        );
    }

    #[test]
    fn test_run_invalid_skip_without_plan_warns() {
        let (result, out, err) = run("skip many reasons\nok a\n");
        assert!(result.is_ok());
        assert_eq!(out, vec!["TAP version 13", "ok 1 - a"]);
        assert_eq!(
            err,
            vec!["# Number of tests must be a strictly positive integer. You gave it 'many'."]
        );
    }

    #[test]
    fn test_run_raise() {
        let (result, _out, _err) = run("ok a\nerror database unavailable\nok b\n");
        match result {
            Err(Interrupt::Error(err)) => {
                assert_eq!(err.to_string(), "t/script.t:2: database unavailable")
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_run_protocol_error_points_at_script_line() {
        let (result, _out, _err) = run("plan 1\nok a\nplan 1\n");
        match result {
            Err(Interrupt::Error(err)) => assert_eq!(
                err.to_string(),
                "plan: can not plan twice (state: plan-body) at t/script.t line 3."
            ),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_run_protocol_error_inside_subtest() {
        let (result, _out, _err) = run("subtest outer {\n    ok a\n    end_todo\n}\n");
        match result {
            Err(Interrupt::Error(err)) => assert_eq!(
                err.to_string(),
                "end todo: no TODO block was started (state: body) at t/script.t line 3."
            ),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_run_unknown_directive_is_intercepted() {
        let interceptor = ErrorInterceptor::install();
        let (result, out, _err) = run("ok a\nfrobnicate\nok b\n");
        let hidden = interceptor.finish();

        assert!(result.is_ok());
        assert_eq!(out, vec!["TAP version 13", "ok 1 - a", "ok 2 - b"]);
        assert_eq!(hidden.len(), 1);
        assert_eq!(
            hidden[0].to_string(),
            "unknown directive 'frobnicate' at t/script.t line 2."
        );
    }

    #[test]
    fn test_loader() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("basic.t");
        fs::write(&path, "ok a\n").unwrap();

        assert!(ScriptLoader.load(&path).unwrap().is_some());
        assert!(ScriptLoader
            .load(&temp.path().join("missing.t"))
            .unwrap()
            .is_none());

        fs::write(&path, "}\n").unwrap();
        assert!(ScriptLoader.load(&path).is_err());
    }
}
