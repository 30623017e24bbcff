//! Tasks for Arduino builds through `arduino-cli`.

use ubxtask_core::{
    ExecutionAction, ParamSpec, TaskArgs, TaskCollection, TaskContext, TaskError, TaskInfo,
    TaskStep,
};

use crate::common::{self, BUILD_DIR, JOBS, PORT};

const LIBRARY_DIR: &str = "port/platform/arduino";
const SKETCH_DIR: &str = "port/platform/arduino/app";

const FQBN: ParamSpec =
    ParamSpec::value("fqbn", "Fully qualified board name").with_default("esp32:esp32:esp32");
const SKETCH: ParamSpec = ParamSpec::value(
    "sketch",
    "Sketch directory (default: <root_dir>/port/platform/arduino/app)",
);

const TASKS: &[TaskInfo] = &[
    TaskInfo {
        name: "check-installation",
        help: "Check that arduino-cli is on the PATH",
        params: &[],
    },
    TaskInfo {
        name: "build",
        help: "Compile the sketch against the ubxlib Arduino library",
        params: &[FQBN, SKETCH, BUILD_DIR, JOBS],
    },
    TaskInfo {
        name: "flash",
        help: "Upload a previous build over a serial port",
        params: &[FQBN, SKETCH, BUILD_DIR, PORT],
    },
    TaskInfo {
        name: "clean",
        help: "Remove the build directory",
        params: &[BUILD_DIR],
    },
];

#[derive(Debug, Default)]
pub struct ArduinoTasks;

fn sketch(ctx: &TaskContext<'_>, args: &TaskArgs) -> String {
    match args.get(SKETCH.name) {
        Some(dir) => dir.to_string(),
        None => common::path_arg(&ctx.config.root_dir().join(SKETCH_DIR)),
    }
}

impl TaskCollection for ArduinoTasks {
    fn name(&self) -> &str {
        "arduino"
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
        let build_dir = common::path_arg(&common::build_dir(ctx, args));

        match task {
            "check-installation" => Ok(common::check_tools(&[("arduino-cli", "version")])),
            "build" => {
                let action = ExecutionAction::new("arduino-cli")
                    .args(["compile", "--fqbn", args.require(FQBN.name)?])
                    .args(["--build-path", build_dir.as_str()])
                    .arg("--libraries")
                    .arg(common::path_arg(&ctx.config.root_dir().join(LIBRARY_DIR)))
                    .arg("--jobs")
                    .arg(common::jobs(args)?.to_string())
                    .arg(sketch(ctx, args));
                Ok(vec![TaskStep::Run(action)])
            }
            "flash" => {
                let action = ExecutionAction::new("arduino-cli")
                    .args(["upload", "--fqbn", args.require(FQBN.name)?])
                    .args(["--input-dir", build_dir.as_str()])
                    .args(["-p", args.require(PORT.name)?])
                    .arg(sketch(ctx, args));
                Ok(vec![TaskStep::Run(action)])
            }
            "clean" => common::clean(ctx, args),
            other => Err(common::unknown(ctx, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::testing::{config, lines, plan};

    #[test]
    fn build_compiles_default_sketch() {
        let steps = plan(&ArduinoTasks, &config(), "build", &["--jobs", "4"]).unwrap();
        assert_eq!(
            lines(&steps),
            vec![
                "run: arduino-cli compile --fqbn esp32:esp32:esp32 \
                 --build-path /ubxlib/_build/arduino --libraries /ubxlib/port/platform/arduino \
                 --jobs 4 /ubxlib/port/platform/arduino/app"
            ]
        );
    }

    #[test]
    fn flash_uses_custom_sketch_and_port() {
        let steps = plan(
            &ArduinoTasks,
            &config(),
            "flash",
            &["--sketch", "/work/blink", "--port", "COM3"],
        )
        .unwrap();
        let line = &lines(&steps)[0];
        assert!(line.starts_with("run: arduino-cli upload"));
        assert!(line.ends_with("-p COM3 /work/blink"));
    }
}
