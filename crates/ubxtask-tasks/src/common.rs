use std::path::{Path, PathBuf};

use ubxtask_core::constants::BUILD_SUBDIR;
use ubxtask_core::{ExecutionAction, ParamSpec, TaskArgs, TaskContext, TaskError, TaskStep};

pub(crate) const BUILD_DIR: ParamSpec = ParamSpec::value(
    "build-dir",
    "Output directory (default: <root_dir>/_build/<collection>)",
);
pub(crate) const JOBS: ParamSpec =
    ParamSpec::value("jobs", "Parallel build jobs").with_default("8");
pub(crate) const PORT: ParamSpec = ParamSpec::value("port", "Serial port of the target");

/// Build output directory: `--build-dir` if given, else per collection under the root.
pub(crate) fn build_dir(ctx: &TaskContext<'_>, args: &TaskArgs) -> PathBuf {
    match args.get(BUILD_DIR.name) {
        Some(dir) => PathBuf::from(dir),
        None => ctx
            .config
            .root_dir()
            .join(BUILD_SUBDIR)
            .join(ctx.collection),
    }
}

/// Validated `--jobs` value.
pub(crate) fn jobs(args: &TaskArgs) -> Result<u32, TaskError> {
    let raw = args.require(JOBS.name)?;
    match raw.parse::<u32>() {
        Ok(jobs) if jobs > 0 => Ok(jobs),
        _ => Err(TaskError::InvalidValue {
            name: JOBS.name.to_string(),
            value: raw.to_string(),
            reason: "expected a positive integer".to_string(),
        }),
    }
}

/// An option value, falling back to a config setting; required when neither is set.
pub(crate) fn arg_or_setting<'a>(
    ctx: &TaskContext<'a>,
    args: &'a TaskArgs,
    name: &str,
    setting: &str,
) -> Result<&'a str, TaskError> {
    match args.get(name).or_else(|| ctx.config.setting(setting)) {
        Some(value) => Ok(value),
        None => Err(TaskError::MissingSetting {
            name: name.to_string(),
            setting: setting.to_string(),
        }),
    }
}

pub(crate) fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

/// Steps that print each tool's version, failing if a tool is missing.
pub(crate) fn check_tools(tools: &[(&str, &str)]) -> Vec<TaskStep> {
    tools
        .iter()
        .map(|(program, flag)| TaskStep::Run(ExecutionAction::new(*program).arg(*flag)))
        .collect()
}

/// Removes the build directory. A directory that is, or contains, the
/// repository root or the automation config directory is never removed.
pub(crate) fn clean(ctx: &TaskContext<'_>, args: &TaskArgs) -> Result<Vec<TaskStep>, TaskError> {
    let dir = build_dir(ctx, args);
    let target = dir.canonicalize().unwrap_or_else(|_| dir.clone());

    for protected in [ctx.config.root_dir(), ctx.config.cfg_dir()] {
        let protected = protected
            .canonicalize()
            .unwrap_or_else(|_| protected.to_path_buf());
        if protected.starts_with(&target) {
            return Err(TaskError::Precondition(format!(
                "refusing to remove '{}': it contains '{}'",
                dir.display(),
                protected.display()
            )));
        }
    }

    Ok(vec![TaskStep::RemoveDir(dir)])
}

pub(crate) fn unknown(ctx: &TaskContext<'_>, task: &str) -> TaskError {
    TaskError::UnknownTask {
        collection: ctx.collection.to_string(),
        task: task.to_string(),
    }
}
