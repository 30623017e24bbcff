//! Housekeeping tasks for the automation environment itself.

use ubxtask_core::constants::{KEY_CFG_DIR, KEY_ROOT_DIR};
use ubxtask_core::{
    ParamSpec, TaskArgs, TaskCollection, TaskContext, TaskError, TaskInfo, TaskStep,
};

const PREFIX: ParamSpec =
    ParamSpec::value("prefix", "Prefix for exported variable names").with_default("UBXLIB_");

const TASKS: &[TaskInfo] = &[
    TaskInfo {
        name: "export",
        help: "Print the configuration as shell export statements",
        params: &[PREFIX],
    },
    TaskInfo {
        name: "check-dirs",
        help: "Verify that the repository and automation directories exist",
        params: &[],
    },
];

#[derive(Debug, Default)]
pub struct AutomationTasks;

fn variable_name(prefix: &str, key: &str) -> String {
    let key = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect::<String>();
    format!("{prefix}{key}")
}

impl TaskCollection for AutomationTasks {
    fn name(&self) -> &str {
        "automation"
    }

    fn tasks(&self) -> &[TaskInfo] {
        TASKS
    }

    fn plan(
        &self,
        task: &str,
        ctx: &TaskContext<'_>,
        args: &TaskArgs,
    ) -> Result<Vec<TaskStep>, TaskError> {
        match task {
            "export" => {
                let prefix = args.require(PREFIX.name)?;
                ctx.config
                    .entries()
                    .into_iter()
                    .map(|(key, value)| -> Result<TaskStep, TaskError> {
                        let quoted = shlex::try_quote(&value).map_err(|err| {
                            TaskError::InvalidValue {
                                name: key.clone(),
                                value: value.clone(),
                                reason: err.to_string(),
                            }
                        })?;
                        Ok(TaskStep::Print(format!(
                            "export {}={quoted}",
                            variable_name(prefix, &key)
                        )))
                    })
                    .collect()
            }
            "check-dirs" => {
                let config = ctx.config;
                let required = [
                    (KEY_ROOT_DIR, config.root_dir()),
                    (KEY_CFG_DIR, config.cfg_dir()),
                ];
                for (key, dir) in required {
                    if !dir.is_dir() {
                        return Err(TaskError::Precondition(format!(
                            "{key} '{}' is not a directory",
                            dir.display()
                        )));
                    }
                }
                let vscode = if config.vscode_dir().is_dir() {
                    "ok"
                } else {
                    "missing (optional)"
                };
                Ok(vec![
                    TaskStep::Print(format!("root_dir: {} ok", config.root_dir().display())),
                    TaskStep::Print(format!("cfg_dir: {} ok", config.cfg_dir().display())),
                    TaskStep::Print(format!(
                        "vscode_dir: {} {vscode}",
                        config.vscode_dir().display()
                    )),
                ])
            }
            other => Err(crate::common::unknown(ctx, other)),
        }
    }
}
