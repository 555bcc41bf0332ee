//! Command parsing
//!
//! A command line is a verb plus an optional argument. The verb selects the
//! action, the argument (when present) is a task id handed to the API as-is.

/// A parsed user command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reveal the task creation form
    Fork,
    /// List every task, or show one when an id is given
    List { id: Option<String> },
    /// Delete a task; a missing id is reported by the dispatcher
    Delete { id: Option<String> },
    /// Anything else, including empty input
    Unknown { verb: String },
}

impl Command {
    /// Parse a raw command line.
    ///
    /// The input is trimmed and split on its first whitespace run. The verb is
    /// matched case-insensitively; the remainder is kept verbatim.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let (verb, rest) = match trimmed.find(char::is_whitespace) {
            Some(idx) => (&trimmed[..idx], trimmed[idx..].trim_start()),
            None => (trimmed, ""),
        };

        let id = if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        };

        match verb.to_ascii_lowercase().as_str() {
            "fork" => Command::Fork,
            "ls" => Command::List { id },
            "delete" => Command::Delete { id },
            _ => Command::Unknown {
                verb: verb.to_string(),
            },
        }
    }

    /// Verb name used in log lines
    pub fn verb(&self) -> &str {
        match self {
            Command::Fork => "fork",
            Command::List { .. } => "ls",
            Command::Delete { .. } => "delete",
            Command::Unknown { verb } => verb,
        }
    }
}
