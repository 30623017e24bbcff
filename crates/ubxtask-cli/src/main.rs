use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use serde::Serialize;

use ubxtask_core::{
    ArgError, ConfigFile, Namespace, NamespaceError, PathOverrides, TaskError, TaskListing,
    TaskRef,
};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod executor;
mod styles;

use styles as s;

/// The command-line interface for ubxtask.
#[derive(Debug, Parser)]
#[command(name = "ubxinv")]
#[command(version)]
#[command(styles = s::get_clap_styles())]
#[command(about = "Run ubxlib build and automation tasks")]
#[command(
    long_about = "Runs build, flash and housekeeping tasks for every ubxlib platform.

Tasks are addressed as <collection>.<task>. Collections:
  nrfconnect   nRF Connect SDK (west)
  nrf5         nRF5 SDK (make, nrfjprog)
  stm32cube    STM32Cube (make, STM32CubeProgrammer)
  esp_idf      ESP-IDF (idf.py)
  arduino      Arduino (arduino-cli)
  automation   configuration and environment helpers
  linux        native POSIX build (cmake)
"
)]
#[command(
    after_help = "\x1b[1;32mExamples:\x1b[0m\n  \x1b[36mubxinv --list\x1b[0m                          \x1b[2m# Show every task\x1b[0m\n  \x1b[36mubxinv esp_idf.build --target esp32s3\x1b[0m  \x1b[2m# Build for an ESP32-S3\x1b[0m\n  \x1b[36mubxinv --describe nrfconnect.flash\x1b[0m     \x1b[2m# Show the options of a task\x1b[0m\n  \x1b[36mubxinv --dry linux.build\x1b[0m               \x1b[2m# Print the commands without running them\x1b[0m"
)]
pub(crate) struct Cli {
    /// Task to run, for example `esp_idf.build` or `linux.run`
    task: Option<String>,
    /// Task options (`--name value`, `--name=value` or `--flag`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
    /// Repository root; overrides the config file, UBXLIB_DIR and discovery.
    #[arg(long)]
    root_dir: Option<PathBuf>,
    /// Automation config directory (default: <root_dir>/port/platform/common/automation).
    #[arg(long)]
    cfg_dir: Option<PathBuf>,
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// List all tasks.
    #[arg(short, long, default_value_t = false)]
    list: bool,
    /// Print the task list as JSON.
    #[arg(long, default_value_t = false, requires = "list")]
    json: bool,
    /// Print the planned steps instead of running them.
    #[arg(long, default_value_t = false)]
    dry: bool,
    /// Show the options of TASK instead of running it.
    #[arg(long, default_value_t = false)]
    describe: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    debug!("parsed cli arguments: {:?}", cli);

    if cli.task.is_none() && !cli.list {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    }

    let namespace = load_namespace(&cli)?;

    if cli.list {
        return print_listing(&namespace, cli.json);
    }

    let task = cli
        .task
        .as_deref()
        .ok_or_else(|| anyhow!("no task given"))?;
    execute(&cli, &namespace, task)
}

/// Builds the root namespace from the command line, config file and environment.
fn load_namespace(cli: &Cli) -> Result<Namespace> {
    let file = match &cli.config {
        Some(path) => ConfigFile::load_from_file(path)
            .with_context(|| format!("unable to load config '{}'", path.display()))?,
        None => ConfigFile::default(),
    };

    let overrides = PathOverrides {
        root_dir: cli.root_dir.clone(),
        cfg_dir: cli.cfg_dir.clone(),
    }
    .or(file.path_overrides())
    .or(PathOverrides::from_env());

    let start = std::env::current_dir().context("failed to determine the current directory")?;
    ubxtask_tasks::bootstrap(&start, &overrides, &file.settings)
        .context("failed to initialise the task namespace")
}

/// Runs one task, or prints its options when asked to describe it.
fn execute(cli: &Cli, namespace: &Namespace, task: &str) -> Result<()> {
    let task_ref = task
        .parse::<TaskRef>()
        .map_err(|e| anyhow!("failed to parse task '{}': {e}", task))?;

    if cli.describe {
        return print_task_help(namespace, &task_ref);
    }

    let steps = match namespace.plan(&task_ref, &cli.args) {
        Ok(steps) => steps,
        Err(NamespaceError::Task {
            source: TaskError::Args(ArgError::Invalid(err)),
            ..
        }) => {
            if err.kind() == clap::error::ErrorKind::DisplayHelp {
                return print_task_help(namespace, &task_ref);
            }
            err.print()?;
            bail!("invalid options for {task_ref}");
        }
        Err(err) => return Err(err.into()),
    };
    executor::run(&steps, cli.dry).with_context(|| format!("{task_ref} failed"))
}

/// Prints the clap-rendered help for one task.
fn print_task_help(namespace: &Namespace, task_ref: &TaskRef) -> Result<()> {
    namespace
        .command(task_ref)?
        .bin_name(format!("ubxinv {task_ref}"))
        .styles(s::get_clap_styles())
        .print_help()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct ListingDocument<'a> {
    root_dir: String,
    collections: Vec<&'a str>,
    tasks: Vec<TaskListing>,
}

fn print_listing(namespace: &Namespace, json: bool) -> Result<()> {
    print!("{}", render_listing(namespace, json)?);
    Ok(())
}

fn render_listing(namespace: &Namespace, json: bool) -> Result<String> {
    let tasks = namespace.list();

    if json {
        let document = ListingDocument {
            root_dir: namespace.config().root_dir().display().to_string(),
            collections: namespace.collection_names(),
            tasks,
        };
        let mut text = serde_json::to_string_pretty(&document)?;
        text.push('\n');
        return Ok(text);
    }

    let mut out = String::new();
    for name in namespace.collection_names() {
        out.push_str(&s::paint(s::HEADER, name));
        out.push('\n');
        for listing in tasks.iter().filter(|listing| listing.collection == name) {
            out.push_str(&format!(
                "  {}  {}\n",
                s::paint(s::COMMAND, &format!("{:<32}", listing.task)),
                s::paint(s::DESC, &listing.help)
            ));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use ubxtask_core::constants::AUTOMATION_SUBDIR;

    fn repo() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(AUTOMATION_SUBDIR)).unwrap();
        dir
    }

    fn test_cli(root: &std::path::Path, task: &str, args: &[&str]) -> Cli {
        Cli {
            task: Some(task.to_string()),
            args: args.iter().map(|s| (*s).to_string()).collect(),
            root_dir: Some(root.to_path_buf()),
            cfg_dir: None,
            config: None,
            list: false,
            json: false,
            dry: true,
            describe: false,
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_task_options_after_the_task() {
        let cli = Cli::try_parse_from(["ubxinv", "--dry", "esp_idf.build", "--target", "esp32s3"])
            .expect("cli should parse");
        assert_eq!(cli.task.as_deref(), Some("esp_idf.build"));
        assert_eq!(cli.args, vec!["--target", "esp32s3"]);
        assert!(cli.dry);
    }

    #[test]
    fn dry_run_plans_without_executing() {
        let dir = repo();
        let build = dir.path().join("_build/linux");
        fs::create_dir_all(&build).unwrap();

        let cli = test_cli(dir.path(), "linux.clean", &[]);
        let ns = load_namespace(&cli).unwrap();
        execute(&cli, &ns, "linux.clean").unwrap();
        assert!(build.exists());
    }

    #[test]
    fn clean_removes_the_build_directory() {
        let dir = repo();
        let build = dir.path().join("_build/nrf5");
        fs::create_dir_all(&build).unwrap();

        let mut cli = test_cli(dir.path(), "nrf5.clean", &[]);
        cli.dry = false;
        let ns = load_namespace(&cli).unwrap();
        execute(&cli, &ns, "nrf5.clean").unwrap();
        assert!(!build.exists());
    }

    #[test]
    fn unknown_collection_and_bad_options_fail() {
        let dir = repo();
        let cli = test_cli(dir.path(), "zephyr.build", &[]);
        let ns = load_namespace(&cli).unwrap();

        let err = execute(&cli, &ns, "zephyr.build").unwrap_err();
        assert!(err.to_string().contains("unknown collection 'zephyr'"));

        let cli = test_cli(dir.path(), "linux.build", &["--jobs", "0"]);
        assert!(execute(&cli, &ns, "linux.build").is_err());

        assert!(execute(&cli, &ns, "linux").is_err());
    }

    #[test]
    fn task_help_does_not_run_the_task() {
        let dir = repo();
        let mut cli = test_cli(dir.path(), "esp_idf.flash", &[]);
        cli.dry = false;
        cli.describe = true;
        let ns = load_namespace(&cli).unwrap();
        execute(&cli, &ns, "esp_idf.flash").expect("help should print");

        cli.describe = false;
        cli.args = vec!["--port".to_string(), "COM1".to_string(), "--help".to_string()];
        execute(&cli, &ns, "esp_idf.flash").expect("trailing --help should print");
    }

    #[test]
    fn task_options_are_parsed_by_clap() {
        let dir = repo();
        let cli = test_cli(dir.path(), "nrfconnect.build", &["--board=nrf52840dk", "--pristine"]);
        let ns = load_namespace(&cli).unwrap();
        execute(&cli, &ns, "nrfconnect.build").expect("dry run should plan");

        let cli = test_cli(dir.path(), "nrfconnect.build", &["--pristine=yes"]);
        let err = execute(&cli, &ns, "nrfconnect.build").unwrap_err();
        assert!(err.to_string().contains("invalid options for nrfconnect.build"));

        let cli = test_cli(dir.path(), "nrfconnect.build", &["-h"]);
        execute(&cli, &ns, "nrfconnect.build").expect("-h should print task help");
    }

    #[test]
    fn clean_never_removes_the_repository() {
        let dir = repo();
        let root = format!("{}/", dir.path().display());
        let mut cli = test_cli(dir.path(), "linux.clean", &["--build-dir", root.as_str()]);
        cli.dry = false;
        let ns = load_namespace(&cli).unwrap();

        let err = execute(&cli, &ns, "linux.clean").unwrap_err();
        assert!(format!("{err:#}").contains("refusing to remove"));
        assert!(dir.path().join(AUTOMATION_SUBDIR).is_dir());
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let cli = test_cli(&dir.path().join("absent"), "linux.build", &[]);
        let err = load_namespace(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("does not exist"));
    }

    #[test]
    fn config_file_settings_reach_tasks() {
        let dir = repo();
        let config_path = dir.path().join("ubxtask.toml");
        fs::write(
            &config_path,
            "root_dir = \".\"\n\n[settings]\nnrf5_path = \"/opt/nrf5\"\n",
        )
        .unwrap();

        let mut cli = test_cli(dir.path(), "nrf5.build", &[]);
        cli.root_dir = None;
        cli.config = Some(config_path);
        let ns = load_namespace(&cli).unwrap();

        assert_eq!(ns.config().setting("nrf5_path"), Some("/opt/nrf5"));
        let task = "nrf5.build".parse::<TaskRef>().unwrap();
        let steps = ns.plan(&task, &[]).unwrap();
        assert!(steps[0].to_string().contains("NRF5_PATH=/opt/nrf5"));
    }

    #[test]
    fn listing_covers_every_collection() {
        let dir = repo();
        let cli = test_cli(dir.path(), "linux.build", &[]);
        let ns = load_namespace(&cli).unwrap();

        let text = render_listing(&ns, false).unwrap();
        for name in ubxtask_tasks::COLLECTIONS {
            assert!(text.contains(&format!("{name}.")), "{name} missing from listing");
        }

        let json: serde_json::Value =
            serde_json::from_str(&render_listing(&ns, true).unwrap()).unwrap();
        assert_eq!(json["collections"].as_array().unwrap().len(), 7);
        assert_eq!(json["tasks"].as_array().unwrap().len(), ns.list().len());
    }
}
