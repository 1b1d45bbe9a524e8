//! Console output.

use serde::Serialize;
use std::io::{self, Write};

/// How console entries are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, indented by nesting level.
    Text,
    /// One JSON object per line.
    Json,
}

/// One line of console output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Message text.
    pub text: String,
    /// Whether the message reports a failure.
    pub is_error: bool,
    /// Open transactions when the entry was written.
    pub level: usize,
}

/// Console history plus the sink it is printed to.
pub struct Console<W: Write> {
    out: W,
    format: OutputFormat,
    history: Vec<Entry>,
}

impl<W: Write> Console<W> {
    /// Creates a console writing to `out`.
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            history: Vec::new(),
        }
    }

    /// Appends and prints an informational entry.
    pub fn info(&mut self, text: impl Into<String>, level: usize) -> io::Result<()> {
        self.push(Entry {
            text: text.into(),
            is_error: false,
            level,
        })
    }

    /// Appends and prints an error entry.
    pub fn error(&mut self, text: impl Into<String>, level: usize) -> io::Result<()> {
        self.push(Entry {
            text: text.into(),
            is_error: true,
            level,
        })
    }

    fn push(&mut self, entry: Entry) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                let indent = "  ".repeat(entry.level);
                let marker = if entry.is_error { "error: " } else { "" };
                writeln!(self.out, "{indent}{marker}{}", entry.text)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, &entry)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        self.history.push(entry);
        Ok(())
    }

    /// Prints text that is not part of the history (help, prompts).
    pub fn raw(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "{text}")?;
        self.out.flush()
    }

    /// Forgets the history.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Entries written since the last clear.
    pub fn history(&self) -> &[Entry] {
        &self.history
    }

    /// The output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Consumes the console, returning the sink.
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
