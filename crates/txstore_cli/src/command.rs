//! Console command grammar.

use thiserror::Error;

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `GET <key>`
    Get {
        /// Key to look up.
        key: String,
    },
    /// `SET <key> <value>`
    Set {
        /// Key to set.
        key: String,
        /// Value to store.
        value: String,
    },
    /// `DELETE <key>`
    Delete {
        /// Key to delete.
        key: String,
    },
    /// `COUNT <value>`
    Count {
        /// Value to count.
        value: String,
    },
    /// `BEGIN`
    Begin,
    /// `COMMIT`
    Commit,
    /// `ROLLBACK`
    Rollback,
    /// `STATS`
    Stats,
    /// `CLEAR`
    Clear,
    /// `HELP`
    Help,
    /// `EXIT` or `QUIT`
    Exit,
}

/// Problems with a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// The command needs a key.
    #[error("Key is required")]
    KeyRequired,
    /// The command needs a value.
    #[error("Value is required")]
    ValueRequired,
    /// The verb is not recognized.
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),
    /// More arguments than the command takes.
    #[error("Unexpected argument '{0}'")]
    UnexpectedArgument(String),
    /// A double quote was opened and never closed.
    #[error("Unterminated quote")]
    UnterminatedQuote,
}

/// Help text listing the commands.
pub const HELP: &str = "\
GET <key>            print the visible value of <key>
SET <key> <value>    set <key> in the innermost transaction
DELETE <key>         delete <key> in the innermost transaction
COUNT <value>        count visible keys holding <value>
BEGIN                open a nested transaction
COMMIT               merge the innermost transaction into its parent
ROLLBACK             discard the innermost transaction
STATS                print engine counters
CLEAR                clear the console history
HELP                 show this help
EXIT | QUIT          leave the console";

/// Splits a line on whitespace, keeping double-quoted runs together.
fn tokenize(line: &str) -> Result<Vec<String>, InputError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quoted {
        return Err(InputError::UnterminatedQuote);
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Parses one console line.
///
/// Returns `Ok(None)` for blank lines and `#` comments. Missing arguments
/// are all reported at once, so `SET` alone yields both
/// [`InputError::KeyRequired`] and [`InputError::ValueRequired`].
pub fn parse_line(line: &str) -> Result<Option<Command>, Vec<InputError>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let tokens = tokenize(trimmed).map_err(|err| vec![err])?;
    let mut args = tokens.into_iter();
    let Some(verb) = args.next() else {
        return Ok(None);
    };

    let (needs_key, needs_value) = match verb.to_ascii_uppercase().as_str() {
        "GET" | "DELETE" => (true, false),
        "SET" => (true, true),
        "COUNT" => (false, true),
        "BEGIN" | "COMMIT" | "ROLLBACK" | "STATS" | "CLEAR" | "HELP" | "EXIT" | "QUIT" => {
            (false, false)
        }
        _ => return Err(vec![InputError::UnknownCommand(verb)]),
    };

    let key = if needs_key { args.next() } else { None };
    let value = if needs_value { args.next() } else { None };

    let mut errors = Vec::new();
    if needs_key && key.as_deref().map_or(true, str::is_empty) {
        errors.push(InputError::KeyRequired);
    }
    if needs_value && value.as_deref().map_or(true, str::is_empty) {
        errors.push(InputError::ValueRequired);
    }
    if let Some(extra) = args.next() {
        errors.push(InputError::UnexpectedArgument(extra));
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let key = key.unwrap_or_default();
    let value = value.unwrap_or_default();
    let command = match verb.to_ascii_uppercase().as_str() {
        "GET" => Command::Get { key },
        "SET" => Command::Set { key, value },
        "DELETE" => Command::Delete { key },
        "COUNT" => Command::Count { value },
        "BEGIN" => Command::Begin,
        "COMMIT" => Command::Commit,
        "ROLLBACK" => Command::Rollback,
        "STATS" => Command::Stats,
        "CLEAR" => Command::Clear,
        "HELP" => Command::Help,
        _ => Command::Exit,
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_data_commands() {
        assert_eq!(
            parse_line("SET a 1"),
            Ok(Some(Command::Set {
                key: "a".into(),
                value: "1".into()
            }))
        );
        assert_eq!(
            parse_line("get a"),
            Ok(Some(Command::Get { key: "a".into() }))
        );
        assert_eq!(
            parse_line("  Delete   a "),
            Ok(Some(Command::Delete { key: "a".into() }))
        );
        assert_eq!(
            parse_line("COUNT 1"),
            Ok(Some(Command::Count { value: "1".into() }))
        );
    }

    #[test]
    fn parses_lifecycle_commands() {
        assert_eq!(parse_line("begin"), Ok(Some(Command::Begin)));
        assert_eq!(parse_line("COMMIT"), Ok(Some(Command::Commit)));
        assert_eq!(parse_line("rollback"), Ok(Some(Command::Rollback)));
        assert_eq!(parse_line("quit"), Ok(Some(Command::Exit)));
        assert_eq!(parse_line("exit"), Ok(Some(Command::Exit)));
    }

    #[test]
    fn ignores_blank_and_comment_lines() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line("# SET a 1"), Ok(None));
    }

    #[test]
    fn quoted_values_keep_spaces() {
        assert_eq!(
            parse_line(r#"SET "full name" "Ada Lovelace""#),
            Ok(Some(Command::Set {
                key: "full name".into(),
                value: "Ada Lovelace".into()
            }))
        );
    }

    #[test]
    fn reports_all_missing_inputs() {
        assert_eq!(
            parse_line("SET"),
            Err(vec![InputError::KeyRequired, InputError::ValueRequired])
        );
        assert_eq!(parse_line("GET"), Err(vec![InputError::KeyRequired]));
        assert_eq!(parse_line("COUNT"), Err(vec![InputError::ValueRequired]));
        assert_eq!(
            parse_line(r#"SET k """#),
            Err(vec![InputError::ValueRequired])
        );
    }

    #[test]
    fn rejects_unknown_and_extra() {
        assert_eq!(
            parse_line("PUT a 1"),
            Err(vec![InputError::UnknownCommand("PUT".into())])
        );
        assert_eq!(
            parse_line("BEGIN now"),
            Err(vec![InputError::UnexpectedArgument("now".into())])
        );
        assert_eq!(
            parse_line(r#"GET "open"#),
            Err(vec![InputError::UnterminatedQuote])
        );
    }

    #[test]
    fn error_messages() {
        assert_eq!(InputError::KeyRequired.to_string(), "Key is required");
        assert_eq!(InputError::ValueRequired.to_string(), "Value is required");
        assert_eq!(
            InputError::UnknownCommand("X".into()).to_string(),
            "Unknown command 'X'"
        );
    }
}
