//! TAP formatting on top of line sinks
//!
//! [`OutStream`] carries the TAP document itself; [`ErrStream`] carries
//! diagnostics meant for a human. Both indent their output by four spaces
//! per subtest level.

use crate::error::Result;
use crate::sink::LineSink;
use crate::test_case::TestCase;

pub const TAP_VERSION: u32 = 13;

const INDENT: &str = "    ";

/// Replace line breaks with visible markers.
pub fn escape_line_breaks(text: &str) -> String {
    text.replace("\r\n", "\\n")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}

/// Make a SKIP, TODO, skip-all or bail-out reason safe to put on one line.
///
/// Line breaks become visible markers and `#` is escaped like in
/// descriptions.
pub fn escape_reason(text: &str) -> String {
    escape_line_breaks(text).replace('#', "\\#")
}

/// Make a description safe to put after `ok N - `.
///
/// Line breaks become visible markers, `#` would start a directive and is
/// escaped, and a leading digit or blank is escaped so that parsers do not
/// read it as part of the test number.
pub fn escape_description(text: &str) -> String {
    let escaped = escape_reason(text);
    match escaped.chars().next() {
        Some(c) if c.is_ascii_digit() || c.is_whitespace() => format!("\\{}", escaped),
        _ => escaped,
    }
}

struct Indented {
    sink: Box<dyn LineSink>,
    level: usize,
}

impl Indented {
    fn new(sink: Box<dyn LineSink>) -> Self {
        Indented { sink, level: 0 }
    }

    fn line(&mut self, text: &str) -> Result<()> {
        if self.level == 0 {
            self.sink.write_line(text)
        } else {
            self.sink
                .write_line(&format!("{}{}", INDENT.repeat(self.level), text))
        }
    }

    fn comment(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return self.line("#");
        }
        for line in text.lines() {
            if line.is_empty() {
                self.line("#")?;
            } else {
                self.line(&format!("# {}", line))?;
            }
        }
        Ok(())
    }

    fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }
}

/// The TAP stream
pub struct OutStream {
    out: Indented,
}

impl OutStream {
    pub fn new(sink: Box<dyn LineSink>) -> Self {
        OutStream {
            out: Indented::new(sink),
        }
    }

    pub fn header(&mut self) -> Result<()> {
        self.out.line(&format!("TAP version {}", TAP_VERSION))
    }

    pub fn plan(&mut self, count: usize) -> Result<()> {
        self.out.line(&format!("1..{}", count))
    }

    pub fn skip_all(&mut self, reason: &str) -> Result<()> {
        if reason.is_empty() {
            self.out.line("1..0 skip")
        } else {
            self.out
                .line(&format!("1..0 skip {}", escape_reason(reason)))
        }
    }

    pub fn test_case(&mut self, number: usize, case: &TestCase) -> Result<()> {
        let line = match case {
            TestCase::Plain(plain) => format!(
                "{} {} - {}",
                status(plain.passed()),
                number,
                escape_description(plain.description())
            ),
            TestCase::Todo { inner, reason } => format!(
                "{} {} - {} # TODO {}",
                status(inner.passed()),
                number,
                escape_description(inner.description()),
                escape_reason(reason)
            ),
            TestCase::Skip { reason } => {
                format!("ok {} # SKIP {}", number, escape_reason(reason))
            }
        };
        self.out.line(line.trim_end())
    }

    /// Bail-out lines are never indented: they abort the whole stream.
    pub fn bail_out(&mut self, reason: &str) -> Result<()> {
        let line = if reason.is_empty() {
            "Bail out!".to_string()
        } else {
            format!("Bail out! {}", escape_reason(reason))
        };
        self.out.sink.write_line(&line)
    }

    pub fn comment(&mut self, text: &str) -> Result<()> {
        self.out.comment(text)
    }

    pub fn footer(&mut self) -> Result<()> {
        self.out.sink.flush()
    }

    pub fn indent(&mut self) {
        self.out.level += 1;
    }

    pub fn dedent(&mut self) {
        self.out.dedent();
    }

    pub fn reset(&mut self) -> Result<()> {
        self.out.level = 0;
        self.out.sink.flush()
    }
}

/// The diagnostics stream
pub struct ErrStream {
    err: Indented,
}

impl ErrStream {
    pub fn new(sink: Box<dyn LineSink>) -> Self {
        ErrStream {
            err: Indented::new(sink),
        }
    }

    /// Write a diagnostic, prefixing every line with `# `.
    pub fn diagnostic(&mut self, text: &str) -> Result<()> {
        self.err.comment(text)
    }

    pub fn footer(&mut self) -> Result<()> {
        self.err.sink.flush()
    }

    pub fn indent(&mut self) {
        self.err.level += 1;
    }

    pub fn dedent(&mut self) {
        self.err.dedent();
    }

    pub fn reset(&mut self) -> Result<()> {
        self.err.level = 0;
        self.err.sink.flush()
    }
}

fn status(passed: bool) -> &'static str {
    if passed {
        "ok"
    } else {
        "not ok"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::test_case::Plain;

    fn out_stream() -> (OutStream, MemorySink) {
        let sink = MemorySink::new();
        (OutStream::new(Box::new(sink.clone())), sink)
    }

    #[test]
    fn test_escape_description() {
        assert_eq!(escape_description("plain words"), "plain words");
        assert_eq!(escape_description("two\nlines"), "two\\nlines");
        assert_eq!(escape_description("crlf\r\nend"), "crlf\\nend");
        assert_eq!(escape_description("not # a directive"), "not \\# a directive");
        assert_eq!(escape_description("42 is the answer"), "\\42 is the answer");
        assert_eq!(escape_description(" padded"), "\\ padded");
    }

    #[test]
    fn test_reasons_are_escaped() {
        let (mut out, sink) = out_stream();
        out.test_case(1, &TestCase::skip("a # b")).unwrap();
        out.test_case(2, &TestCase::todo(Plain::new("c", false), "see #12"))
            .unwrap();
        out.skip_all("needs\n#root").unwrap();
        out.bail_out("issue #7").unwrap();
        assert_eq!(
            sink.lines(),
            vec![
                "ok 1 # SKIP a \\# b",
                "not ok 2 - c # TODO see \\#12",
                "1..0 skip needs\\n\\#root",
                "Bail out! issue \\#7",
            ]
        );
    }

    #[test]
    fn test_header_and_plan() {
        let (mut out, sink) = out_stream();
        out.header().unwrap();
        out.plan(3).unwrap();
        out.skip_all("no database").unwrap();
        assert_eq!(
            sink.lines(),
            vec!["TAP version 13", "1..3", "1..0 skip no database"]
        );
    }

    #[test]
    fn test_test_case_lines() {
        let (mut out, sink) = out_stream();
        out.test_case(1, &TestCase::plain("a", true)).unwrap();
        out.test_case(2, &TestCase::plain("b", false)).unwrap();
        out.test_case(3, &TestCase::todo(Plain::new("c", false), "later"))
            .unwrap();
        out.test_case(4, &TestCase::skip("no network")).unwrap();
        assert_eq!(
            sink.lines(),
            vec![
                "ok 1 - a",
                "not ok 2 - b",
                "not ok 3 - c # TODO later",
                "ok 4 # SKIP no network",
            ]
        );
    }

    #[test]
    fn test_multi_line_comment() {
        let (mut out, sink) = out_stream();
        out.comment("first\n\nthird").unwrap();
        assert_eq!(sink.lines(), vec!["# first", "#", "# third"]);
    }

    #[test]
    fn test_indentation() {
        let (mut out, sink) = out_stream();
        out.indent();
        out.test_case(1, &TestCase::plain("inner", true)).unwrap();
        out.indent();
        out.plan(1).unwrap();
        out.bail_out("stop").unwrap();
        out.dedent();
        out.dedent();
        out.dedent();
        out.plan(1).unwrap();
        assert_eq!(
            sink.lines(),
            vec!["    ok 1 - inner", "        1..1", "Bail out! stop", "1..1"]
        );
    }

    #[test]
    fn test_err_stream() {
        let sink = MemorySink::new();
        let mut err = ErrStream::new(Box::new(sink.clone()));
        err.diagnostic("Failed test 'b'\nat t/a.t line 3.").unwrap();
        err.indent();
        err.diagnostic("nested").unwrap();
        err.reset().unwrap();
        err.diagnostic("top").unwrap();
        assert_eq!(
            sink.lines(),
            vec![
                "# Failed test 'b'",
                "# at t/a.t line 3.",
                "    # nested",
                "# top"
            ]
        );
    }
}
