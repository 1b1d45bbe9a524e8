//! Script runner.

use crate::console::OutputFormat;
use crate::session::{Flow, Session};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use txstore_core::StoreEngine;

/// Summary of a script run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptSummary {
    /// Lines read, including blanks and comments.
    pub lines: usize,
    /// Lines that reported an error.
    pub failures: usize,
    /// Whether the run stopped before the end of the file.
    pub stopped: bool,
}

/// Runs the script at `path`.
pub fn run(
    path: &Path,
    engine: StoreEngine,
    format: OutputFormat,
    stop_on_error: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(path).map_err(|e| format!("cannot open {}: {e}", path.display()))?;
    let mut session = Session::new(engine, io::stdout().lock(), format);
    let summary = execute(BufReader::new(file), &mut session, stop_on_error)?;

    tracing::info!(
        lines = summary.lines,
        failures = summary.failures,
        stopped = summary.stopped,
        "script finished"
    );

    if summary.failures > 0 {
        return Err(format!(
            "{} command(s) failed in {}",
            summary.failures,
            path.display()
        )
        .into());
    }
    Ok(())
}

/// Executes every line of `input` against `session`.
pub fn execute<R: BufRead, W: io::Write>(
    input: R,
    session: &mut Session<W>,
    stop_on_error: bool,
) -> io::Result<ScriptSummary> {
    let mut summary = ScriptSummary::default();
    for line in input.lines() {
        let line = line?;
        summary.lines += 1;
        let outcome = session.execute_line(&line)?;
        if outcome.failed {
            summary.failures += 1;
            if stop_on_error {
                summary.stopped = true;
                break;
            }
        }
        if outcome.flow == Flow::Exit {
            summary.stopped = true;
            break;
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use txstore_core::EngineConfig;

    const SCRIPT: &str = "\
# seed
SET a 1
GET missing
BEGIN
SET a 2
COMMIT
GET a
";

    fn session() -> Session<Vec<u8>> {
        Session::new(
            StoreEngine::new(EngineConfig::new().worker_threads(2)),
            Vec::new(),
            OutputFormat::Text,
        )
    }

    #[test]
    fn runs_to_the_end_by_default() {
        let mut session = session();
        let summary = execute(SCRIPT.as_bytes(), &mut session, false).unwrap();

        assert_eq!(summary.lines, 7);
        assert_eq!(summary.failures, 1);
        assert!(!summary.stopped);
        assert_eq!(session.console().history().last().unwrap().text, "2");
    }

    #[test]
    fn stop_on_error_halts_at_first_failure() {
        let mut session = session();
        let summary = execute(SCRIPT.as_bytes(), &mut session, true).unwrap();

        assert_eq!(summary.lines, 3);
        assert_eq!(summary.failures, 1);
        assert!(summary.stopped);
        assert_eq!(session.level(), 0);
    }

    #[test]
    fn exit_ends_the_script() {
        let mut session = session();
        let summary = execute("SET a 1\nEXIT\nSET b 2\n".as_bytes(), &mut session, false).unwrap();
        assert_eq!(summary.lines, 2);
        assert!(summary.stopped);
    }

    #[test]
    fn text_output_is_indented() {
        let mut session = session();
        execute("BEGIN\nSET a 1\nCOMMIT\n".as_bytes(), &mut session, false).unwrap();

        let out = String::from_utf8(session.into_output()).unwrap();
        assert_eq!(
            out,
            "  BEGIN\n  SET 'a' '1'\n  COMMIT\n  Committed successfully\n"
        );
    }
}
