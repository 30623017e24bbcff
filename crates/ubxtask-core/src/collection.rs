use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::args::{ArgError, TaskArgs};
use crate::config::Config;

/// An external program a task wants to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionAction {
    /// The executable program (e.g., "west", "idf.py").
    pub program: String,
    /// The arguments to pass to the program.
    pub args: Vec<String>,
    /// Extra environment variables for the child process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Working directory; the runner's own when unset.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl ExecutionAction {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// The command as it would be typed in a shell, without quoting.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One unit of work planned by a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStep {
    Run(ExecutionAction),
    Print(String),
    RemoveDir(PathBuf),
}

impl Display for TaskStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Run(action) => {
                write!(f, "run: {}", action.command_line())?;
                if let Some(cwd) = &action.cwd {
                    write!(f, " (in {})", cwd.display())?;
                }
                Ok(())
            }
            Self::Print(message) => write!(f, "print: {message}"),
            Self::RemoveDir(path) => write!(f, "remove: {}", path.display()),
        }
    }
}

/// A named task parameter, given on the command line as `--name value` or,
/// for flags, `--name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub help: &'static str,
    pub default: Option<&'static str>,
    pub flag: bool,
}

impl ParamSpec {
    pub const fn value(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            default: None,
            flag: false,
        }
    }

    pub const fn flag(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            default: None,
            flag: true,
        }
    }

    pub const fn with_default(self, default: &'static str) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }
}

/// Static description of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskInfo {
    pub name: &'static str,
    pub help: &'static str,
    pub params: &'static [ParamSpec],
}

/// What a task sees when it is planned.
#[derive(Debug, Clone, Copy)]
pub struct TaskContext<'a> {
    pub config: &'a Config,
    pub collection: &'a str,
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Args(#[from] ArgError),
    #[error("unknown task '{task}' in collection '{collection}'")]
    UnknownTask { collection: String, task: String },
    #[error("invalid value '{value}' for --{name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
    #[error("option '--{name}' is required unless '{setting}' is set in the config file")]
    MissingSetting { name: String, setting: String },
    #[error("precondition failed: {0}")]
    Precondition(String),
}

/// A named group of tasks, one per target platform.
pub trait TaskCollection: std::fmt::Debug {
    /// Unique name of the collection; the first half of a task reference.
    fn name(&self) -> &str;
    /// The tasks this collection offers.
    fn tasks(&self) -> &[TaskInfo];
    /// Plans the steps for `task` with already-parsed arguments.
    fn plan(
        &self,
        task: &str,
        ctx: &TaskContext<'_>,
        args: &TaskArgs,
    ) -> Result<Vec<TaskStep>, TaskError>;

    fn task(&self, name: &str) -> Option<&TaskInfo> {
        self.tasks().iter().find(|info| info.name == name)
    }
}
