//! Tasks for Espressif targets, driven through `idf.py`.

use ubxtask_core::{
    ExecutionAction, ParamSpec, TaskArgs, TaskCollection, TaskContext, TaskError, TaskInfo,
    TaskStep,
};

use crate::common::{self, BUILD_DIR, JOBS, PORT};

const RUNNER_DIR: &str = "port/platform/esp-idf/mcu/esp32/runner";
const DEFAULT_TARGET: &str = "esp32";

const TARGET: ParamSpec = ParamSpec::value(
    "target",
    "IDF target chip (default: 'esp_idf_target' setting, then esp32)",
);

const TASKS: &[TaskInfo] = &[
    TaskInfo {
        name: "check-installation",
        help: "Check that idf.py is on the PATH",
        params: &[],
    },
    TaskInfo {
        name: "build",
        help: "Build the ubxlib test runner with idf.py",
        params: &[TARGET, BUILD_DIR, JOBS],
    },
    TaskInfo {
        name: "flash",
        help: "Flash a previous build over a serial port",
        params: &[BUILD_DIR, PORT],
    },
    TaskInfo {
        name: "monitor",
        help: "Open the IDF serial monitor",
        params: &[BUILD_DIR, PORT],
    },
    TaskInfo {
        name: "clean",
        help: "Remove the build directory",
        params: &[BUILD_DIR],
    },
];

#[derive(Debug, Default)]
pub struct EspIdfTasks;

impl EspIdfTasks {
    fn idf(ctx: &TaskContext<'_>, args: &TaskArgs) -> ExecutionAction {
        ExecutionAction::new("idf.py")
            .arg("-C")
            .arg(common::path_arg(&ctx.config.root_dir().join(RUNNER_DIR)))
            .arg("-B")
            .arg(common::path_arg(&common::build_dir(ctx, args)))
    }
}

impl TaskCollection for EspIdfTasks {
    fn name(&self) -> &str {
        "esp_idf"
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
            "check-installation" => Ok(common::check_tools(&[("idf.py", "--version")])),
            "build" => {
                let target = args
                    .get(TARGET.name)
                    .or_else(|| ctx.config.setting("esp_idf_target"))
                    .unwrap_or(DEFAULT_TARGET);
                let action = Self::idf(ctx, args)
                    .arg(format!("-DIDF_TARGET={target}"))
                    .arg(format!(
                        "-DUBXLIB_BASE={}",
                        common::path_arg(ctx.config.root_dir())
                    ))
                    .arg("build")
                    .env("CMAKE_BUILD_PARALLEL_LEVEL", common::jobs(args)?.to_string());
                Ok(vec![TaskStep::Run(action)])
            }
            "flash" | "monitor" => {
                let port = args.require(PORT.name)?;
                let action = Self::idf(ctx, args).args(["-p", port, task]);
                Ok(vec![TaskStep::Run(action)])
            }
            "clean" => common::clean(ctx, args),
            other => Err(common::unknown(ctx, other)),
        }
    }
}
