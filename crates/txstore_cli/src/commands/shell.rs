//! Interactive shell.

use crate::console::OutputFormat;
use crate::session::{Flow, Session};
use std::io::{self, BufRead, IsTerminal};
use txstore_core::StoreEngine;

const PROMPT: &str = "txstore> ";

/// Runs the shell on stdin until end of input or `EXIT`.
///
/// The prompt and banner are only printed when stdin is a terminal, so
/// piped input produces nothing but console entries.
pub fn run(engine: StoreEngine, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut session = Session::new(engine, io::stdout().lock(), format);

    if interactive {
        session
            .console_mut()
            .raw("Type HELP for the list of commands.\n")?;
        session.console_mut().raw(PROMPT)?;
    }

    for line in stdin.lock().lines() {
        let outcome = session.execute_line(&line?)?;
        if outcome.flow == Flow::Exit {
            break;
        }
        if interactive {
            session.console_mut().raw(PROMPT)?;
        }
    }

    tracing::debug!(
        level = session.level(),
        entries = session.console().history().len(),
        "shell finished"
    );
    Ok(())
}
