use std::collections::{BTreeMap, BTreeSet};

use clap::error::ErrorKind;
use clap::{Arg, ArgAction, Command};
use thiserror::Error;

use crate::collection::{ParamSpec, TaskInfo};

#[derive(Debug, Error)]
pub enum ArgError {
    /// Rejected by the option parser; also carries `--help` requests.
    #[error(transparent)]
    Invalid(#[from] clap::Error),
    #[error("option '--{0}' is required")]
    MissingRequired(String),
}

impl ArgError {
    /// True when the user asked for the task's help instead of running it.
    pub fn is_help_request(&self) -> bool {
        matches!(self, Self::Invalid(err) if err.kind() == ErrorKind::DisplayHelp)
    }
}

/// Builds the option parser for one task from its parameter table.
///
/// Every parameter becomes a `--name` long option; names with dashes also
/// accept the underscore spelling.
pub fn task_command(info: &TaskInfo) -> Command {
    info.params.iter().fold(
        Command::new(info.name)
            .about(info.help)
            .no_binary_name(true)
            .disable_version_flag(true),
        |command, param| command.arg(param_arg(param)),
    )
}

fn param_arg(param: &ParamSpec) -> Arg {
    let mut arg = Arg::new(param.name).long(param.name).help(param.help);
    if param.name.contains('-') {
        arg = arg.alias(param.name.replace('-', "_"));
    }

    if param.flag {
        return arg.action(ArgAction::SetTrue);
    }

    arg = arg
        .action(ArgAction::Set)
        .value_name(param.name.replace('-', "_").to_uppercase());
    match param.default {
        Some(default) => arg.default_value(default),
        None => arg,
    }
}

/// Arguments for one task invocation, validated against its parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskArgs {
    values: BTreeMap<String, String>,
    flags: BTreeSet<String>,
}

impl TaskArgs {
    /// Parses `--name value`, `--name=value` and `--flag` forms for `info`,
    /// filling in defaults.
    pub fn parse(info: &TaskInfo, raw: &[String]) -> Result<Self, ArgError> {
        Self::parse_with(task_command(info), info.params, raw)
    }

    /// Parses `raw` with a prepared [`task_command`], e.g. one carrying a
    /// display name for usage lines.
    pub fn parse_with(
        command: Command,
        params: &[ParamSpec],
        raw: &[String],
    ) -> Result<Self, ArgError> {
        let matches = command.try_get_matches_from(raw)?;

        let mut out = Self::default();
        for param in params {
            if param.flag {
                if matches.get_flag(param.name) {
                    out.flags.insert(param.name.to_string());
                }
            } else if let Some(value) = matches.get_one::<String>(param.name) {
                out.values.insert(param.name.to_string(), value.clone());
            }
        }
        Ok(out)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn require(&self, name: &str) -> Result<&str, ArgError> {
        self.get(name)
            .ok_or_else(|| ArgError::MissingRequired(name.to_string()))
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO: TaskInfo = TaskInfo {
        name: "build",
        help: "build the runner",
        params: &[
            ParamSpec::value("build-dir", "output directory"),
            ParamSpec::value("jobs", "parallel jobs").with_default("8"),
            ParamSpec::flag("pristine", "clean rebuild"),
        ],
    };

    fn raw(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn parse(items: &[&str]) -> Result<TaskArgs, ArgError> {
        TaskArgs::parse(&INFO, &raw(items))
    }

    fn kind(result: Result<TaskArgs, ArgError>) -> ErrorKind {
        match result {
            Err(ArgError::Invalid(err)) => err.kind(),
            other => panic!("expected a parser error, got {other:?}"),
        }
    }

    #[test]
    fn command_definition_is_consistent() {
        task_command(&INFO).debug_assert();
    }

    #[test]
    fn applies_defaults_when_absent() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.get("jobs"), Some("8"));
        assert_eq!(args.get("build-dir"), None);
        assert!(!args.flag("pristine"));
    }

    #[test]
    fn accepts_separate_inline_and_flag_forms() {
        let args = parse(&["--build_dir", "/tmp/b", "--jobs=2", "--pristine"]).unwrap();
        assert_eq!(args.get("build-dir"), Some("/tmp/b"));
        assert_eq!(args.get("jobs"), Some("2"));
        assert!(args.flag("pristine"));
    }

    #[test]
    fn rejects_unknown_and_malformed_options() {
        assert_eq!(kind(parse(&["--board", "x"])), ErrorKind::UnknownArgument);
        assert_eq!(kind(parse(&["stray"])), ErrorKind::UnknownArgument);
        assert!(parse(&["--jobs"]).is_err());
        assert!(parse(&["--jobs", "--pristine"]).is_err());
        assert!(parse(&["--pristine=yes"]).is_err());
    }

    #[test]
    fn help_is_reported_instead_of_parsed() {
        let err = parse(&["--jobs", "2", "--help"]).unwrap_err();
        assert!(err.is_help_request());
        assert!(!parse(&["--board"]).unwrap_err().is_help_request());

        let help = task_command(&INFO).render_help().to_string();
        assert!(help.contains("build the runner"));
        assert!(help.contains("--build-dir <BUILD_DIR>"));
        assert!(help.contains("[default: 8]"));
        assert!(help.contains("--pristine"));
    }

    #[test]
    fn require_reports_the_missing_name() {
        let args = parse(&[]).unwrap();
        assert!(matches!(
            args.require("build-dir"),
            Err(ArgError::MissingRequired(name)) if name == "build-dir"
        ));
    }
}
