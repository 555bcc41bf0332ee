use crate::terminal::View;
use clap::{Parser, Subcommand};

const LONG_ABOUT: &str = r#"
Task Shell - drive a task service with short commands

Commands (in the shell or via `tsh exec`):
  ls            List every task
  ls <id>       Show one task
  fork          Open the creation form (name, description)
  delete <id>   Delete a task

Each result is shown twice: as the JSON the service returned
([jsonResult]) and as a readable summary ([textResult]).

Configuration:
  TSH_API_URL       Base URL of the task service (default http://127.0.0.1:8000)
  TSH_TIMEOUT_SECS  Request timeout in seconds (default: none)
  TSH_LOG_FILE      Write logs to this file instead of stderr
"#;

#[derive(Parser, Clone)]
#[command(name = "tsh")]
#[command(about = "Command shell for a task-management REST API")]
#[command(long_about = LONG_ABOUT)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error logs (-q)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Base URL of the task service (overrides TSH_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds, 0 for none (overrides TSH_TIMEOUT_SECS)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Which result views to print
    #[arg(long, value_enum, default_value = "both", global = true)]
    pub view: View,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the interactive shell (default)
    Shell,

    /// Run a single command and exit
    ///
    /// Examples:
    ///   tsh exec ls
    ///   tsh exec ls 3f2a
    ///   tsh exec delete 3f2a
    Exec {
        /// Command words, e.g. `ls 42`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },

    /// Create a task without the interactive form
    Create {
        /// Task name
        #[arg(long)]
        name: String,

        /// Task description
        #[arg(long, default_value = "")]
        description: String,
    },
}

impl Commands {
    /// Command line for `exec`, words joined by single spaces
    pub fn command_line(words: &[String]) -> String {
        words.join(" ")
    }
}
