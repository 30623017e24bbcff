//! Tasks for the nRF Connect SDK, built through Zephyr's `west`.

use ubxtask_core::{
    ExecutionAction, ParamSpec, TaskArgs, TaskCollection, TaskContext, TaskError, TaskInfo,
    TaskStep,
};

use crate::common::{self, BUILD_DIR, JOBS};

const RUNNER_DIR: &str = "port/platform/zephyr/runner";

const BOARD: ParamSpec =
    ParamSpec::value("board", "Zephyr board name").with_default("nrf5340dk_nrf5340_cpuapp");
const PRISTINE: ParamSpec = ParamSpec::flag("pristine", "Discard any previous build first");
const SERIAL: ParamSpec =
    ParamSpec::value("serial", "Serial number of the debugger to flash through");

const TASKS: &[TaskInfo] = &[
    TaskInfo {
        name: "check-installation",
        help: "Check that west and nrfjprog are on the PATH",
        params: &[],
    },
    TaskInfo {
        name: "build",
        help: "Build the ubxlib test runner with west",
        params: &[BOARD, BUILD_DIR, JOBS, PRISTINE],
    },
    TaskInfo {
        name: "flash",
        help: "Flash a previous build",
        params: &[BUILD_DIR, SERIAL],
    },
    TaskInfo {
        name: "clean",
        help: "Remove the build directory",
        params: &[BUILD_DIR],
    },
];

#[derive(Debug, Default)]
pub struct NrfConnectTasks;

impl TaskCollection for NrfConnectTasks {
    fn name(&self) -> &str {
        "nrfconnect"
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
        let build_dir = common::build_dir(ctx, args);

        match task {
            "check-installation" => Ok(common::check_tools(&[
                ("west", "--version"),
                ("nrfjprog", "--version"),
            ])),
            "build" => {
                let runner = ctx.config.root_dir().join(RUNNER_DIR);
                let mut action = ExecutionAction::new("west")
                    .args(["build", "-b"])
                    .arg(args.require(BOARD.name)?)
                    .arg("-d")
                    .arg(common::path_arg(&build_dir));
                if args.flag(PRISTINE.name) {
                    action = action.args(["-p", "always"]);
                }
                let action = action
                    .arg(common::path_arg(&runner))
                    .arg("--")
                    .arg(format!("-DUBXLIB_BASE={}", common::path_arg(ctx.config.root_dir())))
                    .env("CMAKE_BUILD_PARALLEL_LEVEL", common::jobs(args)?.to_string());
                Ok(vec![TaskStep::Run(action)])
            }
            "flash" => {
                let mut action = ExecutionAction::new("west")
                    .args(["flash", "-d"])
                    .arg(common::path_arg(&build_dir));
                if let Some(serial) = args.get(SERIAL.name) {
                    action = action.args(["--dev-id", serial]);
                }
                Ok(vec![TaskStep::Run(action)])
            }
            "clean" => common::clean(ctx, args),
            other => Err(common::unknown(ctx, other)),
        }
    }
}
