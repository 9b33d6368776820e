//! # Output Facade
//!
//! All user-visible output flows through an [`OutputSink`] constructed once
//! by the host and handed to the dispatcher and help engine. There is no
//! global logger and no runtime patching of a shared object: the sink owns
//! its writers and its [`Format`], so the same code paths serve terminal
//! output, `--json` machine output, and captured test output.

use colored::Colorize;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use unicode_width::UnicodeWidthStr;

/// Logging verbosity, raised by repeated `-v` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Normal,
    Verbose,
    Trace,
}

impl Level {
    /// Level selected by `count` occurrences of `--verbose`.
    pub fn from_verbose_count(count: u32) -> Self {
        match count {
            0 => Level::Normal,
            1 => Level::Verbose,
            _ => Level::Trace,
        }
    }
}

/// Output format, fixed for the lifetime of one invocation.
#[derive(Debug, Clone, Copy)]
pub struct Format {
    pub json: bool,
    pub level: Level,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            json: false,
            level: Level::Normal,
        }
    }
}

/// Shared in-memory buffer usable as a sink target in tests.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub struct OutputSink {
    format: Format,
    out: RefCell<Box<dyn Write>>,
    err: RefCell<Box<dyn Write>>,
}

impl OutputSink {
    /// Sink writing to the process stdout/stderr.
    pub fn stdio(format: Format) -> Self {
        Self {
            format,
            out: RefCell::new(Box::new(std::io::stdout())),
            err: RefCell::new(Box::new(std::io::stderr())),
        }
    }

    /// Sink writing to caller-supplied writers.
    pub fn with_writers(format: Format, out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self {
            format,
            out: RefCell::new(out),
            err: RefCell::new(err),
        }
    }

    /// Sink writing into shared buffers, for tests.
    pub fn memory(format: Format) -> (Self, SharedBuffer, SharedBuffer) {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let sink = Self::with_writers(format, Box::new(out.clone()), Box::new(err.clone()));
        (sink, out, err)
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn is_json(&self) -> bool {
        self.format.json
    }

    pub fn level(&self) -> Level {
        self.format.level
    }

    /// Plain informational line. Silenced in json mode.
    pub fn info(&self, msg: &str) {
        if !self.format.json {
            self.out_line(&msg.dimmed().to_string());
        }
    }

    pub fn success(&self, msg: &str) {
        if !self.format.json {
            self.out_line(&msg.green().to_string());
        }
    }

    pub fn warn(&self, msg: &str) {
        if !self.format.json {
            self.out_line(&msg.yellow().to_string());
        }
    }

    /// Error line. Goes to stderr in every mode.
    pub fn error(&self, msg: &str) {
        self.err_line(&format!("error: {}", msg).red().to_string());
    }

    pub fn verbose(&self, msg: &str) {
        if !self.format.json && self.format.level >= Level::Verbose {
            self.out_line(&msg.dimmed().to_string());
        }
    }

    pub fn trace(&self, msg: &str) {
        if !self.format.json && self.format.level >= Level::Trace {
            self.out_line(&msg.dimmed().to_string());
        }
    }

    /// Pretty-printed JSON to stdout, regardless of mode.
    pub fn json(&self, value: &serde_json::Value) {
        let rendered =
            serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string());
        self.out_line(&rendered);
    }

    /// Uncolored raw line to stdout (help text, completion candidates).
    pub fn raw(&self, msg: &str) {
        self.out_line(msg);
    }

    /// Column-aligned table. Widths are computed with unicode-width so CJK
    /// and combining characters line up.
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        if self.format.json {
            return;
        }
        let cols = headers.len();
        let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
        for row in rows {
            for (i, cell) in row.iter().take(cols).enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        let mut header_line = String::new();
        let mut rule_line = String::new();
        for (i, h) in headers.iter().enumerate() {
            let pad = widths[i] - h.width();
            header_line.push_str(h);
            header_line.push_str(&" ".repeat(pad + 2));
            rule_line.push_str(&"-".repeat(widths[i]));
            rule_line.push_str("  ");
        }
        self.out_line(header_line.trim_end());
        self.out_line(rule_line.trim_end());

        for row in rows {
            let mut line = String::new();
            for (i, cell) in row.iter().take(cols).enumerate() {
                let pad = widths[i] - cell.width();
                line.push_str(cell);
                line.push_str(&" ".repeat(pad + 2));
            }
            self.out_line(line.trim_end());
        }
    }

    fn out_line(&self, line: &str) {
        let _ = writeln!(self.out.borrow_mut(), "{}", line);
    }

    fn err_line(&self, line: &str) {
        let _ = writeln!(self.err.borrow_mut(), "{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_lines_hidden_at_normal_level() {
        let (sink, out, _err) = OutputSink::memory(Format::default());
        sink.verbose("hidden");
        sink.info("shown");
        let text = out.contents();
        assert!(!text.contains("hidden"));
        assert!(text.contains("shown"));
    }

    #[test]
    fn json_mode_silences_human_output() {
        let (sink, out, err) = OutputSink::memory(Format {
            json: true,
            level: Level::Normal,
        });
        sink.info("chatter");
        sink.json(&serde_json::json!({"ok": true}));
        sink.error("boom");
        assert!(!out.contents().contains("chatter"));
        assert!(out.contents().contains("\"ok\": true"));
        assert!(err.contents().contains("boom"));
    }

    #[test]
    fn table_aligns_columns() {
        let (sink, out, _err) = OutputSink::memory(Format::default());
        sink.table(
            &["Name", "Description"],
            &[
                vec!["show".to_string(), "Show the thing".to_string()],
                vec!["create-long".to_string(), "Create it".to_string()],
            ],
        );
        let text = out.contents();
        assert!(text.contains("show         Show the thing"));
        assert!(text.contains("create-long  Create it"));
    }

    #[test]
    fn level_from_repeated_verbose_flags() {
        assert_eq!(Level::from_verbose_count(0), Level::Normal);
        assert_eq!(Level::from_verbose_count(1), Level::Verbose);
        assert_eq!(Level::from_verbose_count(2), Level::Trace);
        assert_eq!(Level::from_verbose_count(7), Level::Trace);
    }
}
