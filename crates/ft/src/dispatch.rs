//! Command dispatch module for routing CLI commands to their handlers.
//!
//! Most commands either succeed or fail. `eval` and `fields --check` also
//! report a negative outcome, which maps to exit status 1 without an error.

use std::process::ExitCode;

use crate::cli::{Commands, ConfigCommands};
use crate::commands::{self, CommandContext, CommandError, Result};

/// Exit status for a completed command whose outcome was negative.
const NEGATIVE_OUTCOME: u8 = 1;

fn outcome(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(NEGATIVE_OUTCOME)
    }
}

/// Runs `command` and returns the process exit status.
pub fn dispatch(ctx: &CommandContext, command: Option<&Commands>) -> Result<ExitCode> {
    let Some(command) = command else {
        if !ctx.quiet {
            println!("ft - Build, edit and evaluate filter trees");
            println!("Use --help for usage information");
        }
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::New {
            file,
            name,
            description,
            created_by,
            force,
        } => {
            let opts = commands::new::NewOptions {
                file: file.clone(),
                name: name.clone(),
                description: description.clone(),
                created_by: created_by.clone(),
                force: *force,
            };
            commands::new::execute(ctx, &opts)?;
        }
        Commands::Show { file, format } => {
            let opts = commands::show::ShowOptions {
                file: file.clone(),
                format: *format,
            };
            commands::show::execute(ctx, &opts)?;
        }
        Commands::Validate { file } => {
            let opts = commands::validate::ValidateOptions { file: file.clone() };
            commands::validate::execute(ctx, &opts)?;
        }
        Commands::Eval { file, data, trace } => {
            let opts = commands::eval::EvalOptions {
                file: file.clone(),
                data: data.clone(),
                trace: *trace,
            };
            return commands::eval::execute(ctx, &opts).map(outcome);
        }
        Commands::AddLeaf {
            file,
            parent,
            field,
            op,
            value,
            field_type,
        } => {
            let opts = commands::edit::AddLeafOptions {
                file: file.clone(),
                parent: parent.clone(),
                field: field.clone(),
                op: op.clone(),
                value: value.clone(),
                field_type: field_type.clone(),
            };
            commands::edit::execute_add_leaf(ctx, &opts)?;
        }
        Commands::AddGroup { file, parent, op } => {
            let opts = commands::edit::AddGroupOptions {
                file: file.clone(),
                parent: parent.clone(),
                op: op.clone(),
            };
            commands::edit::execute_add_group(ctx, &opts)?;
        }
        Commands::Remove { file, id } => {
            let opts = commands::edit::RemoveOptions {
                file: file.clone(),
                id: id.clone(),
            };
            commands::edit::execute_remove(ctx, &opts)?;
        }
        Commands::Toggle { file, id, operator } => {
            let opts = commands::edit::ToggleOptions {
                file: file.clone(),
                id: id.clone(),
                operator: *operator,
            };
            commands::edit::execute_toggle(ctx, &opts)?;
        }
        Commands::Set {
            file,
            id,
            field,
            op,
            value,
            field_type,
        } => {
            let opts = commands::edit::SetOptions {
                file: file.clone(),
                id: id.clone(),
                field: field.clone(),
                op: op.clone(),
                value: value.clone(),
                field_type: field_type.clone(),
            };
            commands::edit::execute_set(ctx, &opts)?;
        }
        Commands::Script {
            file,
            script,
            dry_run,
        } => {
            let opts = commands::script::ScriptOptions {
                file: file.clone(),
                script: script.clone(),
                dry_run: *dry_run,
            };
            commands::script::execute(ctx, &opts)?;
        }
        Commands::Fields { catalog, check } => {
            let opts = commands::fields::FieldsOptions {
                catalog: catalog.clone(),
                check: check.clone(),
            };
            return commands::fields::execute(ctx, &opts).map(outcome);
        }
        Commands::Config { command } => dispatch_config(ctx, command.as_ref())?,
        Commands::Completions { shell } => {
            commands::completions::execute(shell).map_err(CommandError::Io)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Dispatch config subcommands.
fn dispatch_config(ctx: &CommandContext, command: Option<&ConfigCommands>) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx),
        Some(ConfigCommands::Set { key, value }) => {
            let opts = commands::config::ConfigSetOptions {
                key: key.clone(),
                value: value.clone(),
            };
            commands::config::execute_set(ctx, &opts)
        }
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx),
    }
}
