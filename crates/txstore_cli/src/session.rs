//! Executes console commands against an engine.

use crate::command::{parse_line, Command, HELP};
use crate::console::{Console, OutputFormat};
use std::io::{self, Write};
use std::sync::mpsc::Receiver;
use std::time::Duration;
use txstore_core::{StoreEngine, StoreResult};

/// What the caller should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading.
    Continue,
    /// Stop reading.
    Exit,
}

/// Result of executing one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineOutcome {
    /// Whether to keep reading.
    pub flow: Flow,
    /// Whether the line reported an error.
    pub failed: bool,
}

impl LineOutcome {
    fn ok() -> Self {
        Self {
            flow: Flow::Continue,
            failed: false,
        }
    }

    fn failed() -> Self {
        Self {
            flow: Flow::Continue,
            failed: true,
        }
    }
}

/// A console session bound to one engine.
///
/// The session tracks the nesting level itself: `BEGIN` raises it and a
/// successful `COMMIT` or `ROLLBACK` lowers it.
pub struct Session<W: Write> {
    engine: StoreEngine,
    console: Console<W>,
    level: usize,
    timeout: Duration,
}

impl<W: Write> Session<W> {
    /// Creates a session.
    pub fn new(engine: StoreEngine, out: W, format: OutputFormat) -> Self {
        Self {
            engine,
            console: Console::new(out, format),
            level: 0,
            timeout: Duration::from_secs(5),
        }
    }

    /// Current nesting level.
    pub fn level(&self) -> usize {
        self.level
    }

    /// The console.
    pub fn console(&self) -> &Console<W> {
        &self.console
    }

    /// Mutable access to the console.
    pub fn console_mut(&mut self) -> &mut Console<W> {
        &mut self.console
    }

    /// Consumes the session, returning the output sink.
    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.console.into_inner()
    }

    /// Parses and executes one line.
    pub fn execute_line(&mut self, line: &str) -> io::Result<LineOutcome> {
        match parse_line(line) {
            Ok(Some(command)) => self.execute(command),
            Ok(None) => Ok(LineOutcome::ok()),
            Err(errors) => {
                for error in errors {
                    self.console.error(error.to_string(), self.level)?;
                }
                Ok(LineOutcome::failed())
            }
        }
    }

    fn wait<T>(&self, receiver: Receiver<T>) -> io::Result<T> {
        receiver.recv_timeout(self.timeout).map_err(|err| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no result from engine: {err}"),
            )
        })
    }

    /// Executes a parsed command.
    pub fn execute(&mut self, command: Command) -> io::Result<LineOutcome> {
        tracing::debug!(?command, level = self.level, "executing");
        match command {
            Command::Get { key } => {
                self.console.info(format!("GET '{key}'"), self.level)?;
                let result = self.wait(self.engine.get(key))?;
                self.report(result, |value| value)
            }
            Command::Set { key, value } => {
                self.console
                    .info(format!("SET '{key}' '{value}'"), self.level)?;
                self.engine.set(key, value);
                Ok(LineOutcome::ok())
            }
            Command::Delete { key } => {
                self.console.info(format!("DELETE '{key}'"), self.level)?;
                self.engine.delete(key);
                Ok(LineOutcome::ok())
            }
            Command::Count { value } => {
                self.console.info(format!("COUNT '{value}'"), self.level)?;
                let count = self.wait(self.engine.count(value))?;
                self.console.info(count.to_string(), self.level)?;
                Ok(LineOutcome::ok())
            }
            Command::Begin => {
                self.engine.begin();
                self.level += 1;
                self.console.info("BEGIN", self.level)?;
                Ok(LineOutcome::ok())
            }
            Command::Commit => {
                self.console.info("COMMIT", self.level)?;
                let result = self.wait(self.engine.commit())?;
                self.finish_transaction(result, "Committed successfully")
            }
            Command::Rollback => {
                self.console.info("ROLLBACK", self.level)?;
                let result = self.wait(self.engine.rollback())?;
                self.finish_transaction(result, "Discarded successfully")
            }
            Command::Stats => {
                let stats = self.engine.stats();
                match self.console.format() {
                    OutputFormat::Json => {
                        let line = serde_json::to_string(&stats).map_err(io::Error::from)?;
                        self.console.info(line, self.level)?;
                    }
                    OutputFormat::Text => {
                        self.console.info(
                            format!(
                                "gets={} misses={} sets={} deletes={} counts={} begins={} \
                                 commits={} rollbacks={} failed_commits={} \
                                 failed_rollbacks={} depth={}",
                                stats.gets,
                                stats.get_misses,
                                stats.sets,
                                stats.deletes,
                                stats.counts,
                                stats.begins,
                                stats.commits,
                                stats.rollbacks,
                                stats.failed_commits,
                                stats.failed_rollbacks,
                                stats.depth
                            ),
                            self.level,
                        )?;
                    }
                }
                Ok(LineOutcome::ok())
            }
            Command::Clear => {
                self.console.clear();
                Ok(LineOutcome::ok())
            }
            Command::Help => {
                self.console.raw(HELP)?;
                self.console.raw("\n")?;
                Ok(LineOutcome::ok())
            }
            Command::Exit => Ok(LineOutcome {
                flow: Flow::Exit,
                failed: false,
            }),
        }
    }

    fn report<T>(
        &mut self,
        result: StoreResult<T>,
        render: impl FnOnce(T) -> String,
    ) -> io::Result<LineOutcome> {
        match result {
            Ok(value) => {
                self.console.info(render(value), self.level)?;
                Ok(LineOutcome::ok())
            }
            Err(err) => {
                self.console.error(err.to_string(), self.level)?;
                Ok(LineOutcome::failed())
            }
        }
    }

    fn finish_transaction(
        &mut self,
        result: StoreResult<()>,
        message: &str,
    ) -> io::Result<LineOutcome> {
        let succeeded = result.is_ok();
        let outcome = self.report(result, |()| message.to_owned())?;
        if succeeded {
            self.level = self.level.saturating_sub(1);
        }
        Ok(outcome)
    }
}
