use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod dispatch;
mod output;
mod tree_file;

use cli::Cli;
use commands::config::load_config;
use commands::{CommandContext, CommandError};
use tree_file::TreeFileError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                eprintln!("{error_json:#}");
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::from(error_exit_status(&e))
        }
    }
}

/// Logs go to stderr. `RUST_LOG` wins; otherwise `--verbose` selects debug.
fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> commands::Result<ExitCode> {
    let mut ctx = CommandContext::from_cli(cli);

    // A broken config file only matters to commands that read it.
    if let Ok(config) = load_config() {
        if config.output.color == Some(false) {
            ctx.use_colors = false;
        }
    }

    dispatch::dispatch(&ctx, cli.command.as_ref())
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::TreeFile(TreeFileError::Invalid { .. }) => "VALIDATION_ERROR",
        CommandError::TreeFile(_) => "TREE_FILE_ERROR",
        CommandError::Import(_) => "VALIDATION_ERROR",
        CommandError::Store(_) => "STORE_ERROR",
        CommandError::Parse(_) => "PARSE_ERROR",
        CommandError::InvalidArgument(_) => "INVALID_ARGUMENT",
        CommandError::Script { .. } => "SCRIPT_ERROR",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the exit status for an error. Status 1 is left to a failed `eval`.
fn error_exit_status(e: &CommandError) -> u8 {
    match e {
        CommandError::Config(_) => 5,
        CommandError::Io(_) => 3,
        CommandError::TreeFile(
            TreeFileError::ReadError { .. }
            | TreeFileError::WriteError { .. }
            | TreeFileError::CreateDirError { .. },
        ) => 3,
        CommandError::TreeFile(_)
        | CommandError::Import(_)
        | CommandError::Store(_)
        | CommandError::Parse(_)
        | CommandError::InvalidArgument(_)
        | CommandError::Script { .. }
        | CommandError::Json(_) => 2,
    }
}
