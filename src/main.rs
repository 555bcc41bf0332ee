use clap::Parser;
use std::process::ExitCode;
use task_shell::cli::{Cli, Commands};
use task_shell::client::HttpTaskApi;
use task_shell::command::Command;
use task_shell::config::ShellConfig;
use task_shell::dispatcher::{Console, StagedForm};
use task_shell::error::Result;
use task_shell::logging::{init_logging, LoggingConfig};
use task_shell::render::Rendering;
use task_shell::terminal::{run_shell, TerminalTarget};
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LoggingConfig::from_args(cli.quiet, cli.verbose > 0, cli.json_logs);
    if let Err(e) = init_logging(log_config) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            let error_response = e.to_error_response();
            let body = serde_json::to_string_pretty(&error_response)
                .unwrap_or_else(|_| error_response.error.clone());
            eprintln!("{}", body);
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: &Cli) -> Result<ExitCode> {
    let config = ShellConfig::resolve(cli.api_url.as_deref(), cli.timeout_secs)?;
    tracing::debug!(api_url = %config.api_url, timeout = ?config.timeout, "Resolved configuration");

    let api = HttpTaskApi::new(&config)?;
    let console = Console::new(api, TerminalTarget::stdout(cli.view), StagedForm::new());

    match cli.command.clone().unwrap_or(Commands::Shell) {
        Commands::Shell => {
            let input = BufReader::new(tokio::io::stdin());
            let mut prompt = tokio::io::stdout();
            run_shell(&console, input, &mut prompt).await?;
            Ok(ExitCode::SUCCESS)
        },

        Commands::Exec { words } => {
            let line = Commands::command_line(&words);
            console.handle_command(&line).await;
            if Command::parse(&line) == Command::Fork {
                eprintln!("Use `tsh create --name <NAME> [--description <TEXT>]` to create a task.");
            }
            Ok(exit_code(console.store().latest()))
        },

        Commands::Create { name, description } => {
            console.form().stage(name, description);
            console.create_task().await;
            Ok(exit_code(console.store().latest()))
        },
    }
}

fn exit_code(shown: Option<Rendering>) -> ExitCode {
    match shown {
        Some(rendering) if rendering.is_error() => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}
