use std::fs;
use std::process::Command;

use anyhow::{bail, Context, Result};

use ubxtask_core::{ExecutionAction, TaskStep};
use tracing::{info, instrument};

/// Executes planned steps in order, stopping at the first failure. With
/// `dry` set the steps are only printed.
#[instrument(skip(steps), fields(count = steps.len()))]
pub fn run(steps: &[TaskStep], dry: bool) -> Result<()> {
    for step in steps {
        if dry {
            println!("{step}");
            continue;
        }

        match step {
            TaskStep::Run(action) => run_action(action)?,
            TaskStep::Print(message) => println!("{message}"),
            TaskStep::RemoveDir(path) => {
                if path.exists() {
                    info!(target: "ubxtask", "remove {}", path.display());
                    fs::remove_dir_all(path)
                        .with_context(|| format!("failed to remove '{}'", path.display()))?;
                } else {
                    info!(target: "ubxtask", "skip remove: {} does not exist", path.display());
                }
            }
        }
    }

    Ok(())
}

fn run_action(action: &ExecutionAction) -> Result<()> {
    info!(target: "ubxtask", "run {}", action.command_line());

    let mut command = Command::new(&action.program);
    command.args(&action.args).envs(&action.env);
    if let Some(cwd) = &action.cwd {
        command.current_dir(cwd);
    }

    let status = command
        .status()
        .with_context(|| format!("failed to start command '{}'", action.command_line()))?;

    if !status.success() {
        bail!(
            "command failed with status {}: {}",
            status,
            action.command_line()
        );
    }

    Ok(())
}
