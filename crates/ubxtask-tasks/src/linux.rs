//! Tasks for the native POSIX build, driven through CMake.

use ubxtask_core::{
    ExecutionAction, ParamSpec, TaskArgs, TaskCollection, TaskContext, TaskError, TaskInfo,
    TaskStep,
};

use crate::common::{self, BUILD_DIR, JOBS};

const RUNNER_DIR: &str = "port/platform/linux/mcu/posix/runner";
const BINARY: &str = "ubxlib_test_main";

const BUILD_TYPE: ParamSpec =
    ParamSpec::value("build-type", "CMake build type").with_default("Debug");
const FILTER: ParamSpec = ParamSpec::value("filter", "Only run tests whose name starts with this");

const TASKS: &[TaskInfo] = &[
    TaskInfo {
        name: "check-installation",
        help: "Check that cmake and a C compiler are on the PATH",
        params: &[],
    },
    TaskInfo {
        name: "build",
        help: "Configure and build the native test runner",
        params: &[BUILD_TYPE, BUILD_DIR, JOBS],
    },
    TaskInfo {
        name: "run",
        help: "Run a previously built test runner",
        params: &[BUILD_DIR, FILTER],
    },
    TaskInfo {
        name: "clean",
        help: "Remove the build directory",
        params: &[BUILD_DIR],
    },
];

#[derive(Debug, Default)]
pub struct LinuxTasks;

impl TaskCollection for LinuxTasks {
    fn name(&self) -> &str {
        "linux"
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
        let build_path = common::path_arg(&build_dir);

        match task {
            "check-installation" => Ok(common::check_tools(&[
                ("cmake", "--version"),
                ("cc", "--version"),
            ])),
            "build" => {
                let configure = ExecutionAction::new("cmake")
                    .arg("-S")
                    .arg(common::path_arg(&ctx.config.root_dir().join(RUNNER_DIR)))
                    .args(["-B", build_path.as_str()])
                    .arg(format!("-DCMAKE_BUILD_TYPE={}", args.require(BUILD_TYPE.name)?))
                    .arg(format!(
                        "-DUBXLIB_BASE={}",
                        common::path_arg(ctx.config.root_dir())
                    ));
                let compile = ExecutionAction::new("cmake")
                    .args(["--build", build_path.as_str()])
                    .arg("-j")
                    .arg(common::jobs(args)?.to_string());
                Ok(vec![TaskStep::Run(configure), TaskStep::Run(compile)])
            }
            "run" => {
                let mut action = ExecutionAction::new(common::path_arg(&build_dir.join(BINARY)))
                    .current_dir(ctx.config.root_dir());
                if let Some(filter) = args.get(FILTER.name) {
                    action = action.arg(filter);
                }
                Ok(vec![TaskStep::Run(action)])
            }
            "clean" => common::clean(ctx, args),
            other => Err(common::unknown(ctx, other)),
        }
    }
}
