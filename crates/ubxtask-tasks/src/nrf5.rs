//! Tasks for the legacy nRF5 SDK, built with GNU make.

use ubxtask_core::{
    ExecutionAction, ParamSpec, TaskArgs, TaskCollection, TaskContext, TaskError, TaskInfo,
    TaskStep,
};

use crate::common::{self, BUILD_DIR, JOBS};

const RUNNER_DIR: &str = "port/platform/nrf5sdk/mcu/nrf52/gcc/runner";
const HEX_NAME: &str = "nrf52840_xxaa.hex";

const NRF5_PATH: ParamSpec = ParamSpec::value(
    "nrf5-path",
    "Location of the nRF5 SDK (default: 'nrf5_path' setting)",
);
const SERIAL: ParamSpec = ParamSpec::value("serial", "Serial number of the J-Link to use");

const TASKS: &[TaskInfo] = &[
    TaskInfo {
        name: "check-installation",
        help: "Check that make, the ARM GCC toolchain and nrfjprog are on the PATH",
        params: &[],
    },
    TaskInfo {
        name: "build",
        help: "Build the ubxlib test runner with make",
        params: &[NRF5_PATH, BUILD_DIR, JOBS],
    },
    TaskInfo {
        name: "flash",
        help: "Program, verify and reset the target with nrfjprog",
        params: &[BUILD_DIR, SERIAL],
    },
    TaskInfo {
        name: "clean",
        help: "Remove the build directory",
        params: &[BUILD_DIR],
    },
];

#[derive(Debug, Default)]
pub struct Nrf5Tasks;

impl TaskCollection for Nrf5Tasks {
    fn name(&self) -> &str {
        "nrf5"
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
                ("make", "--version"),
                ("arm-none-eabi-gcc", "--version"),
                ("nrfjprog", "--version"),
            ])),
            "build" => {
                let sdk = common::arg_or_setting(ctx, args, NRF5_PATH.name, "nrf5_path")?;
                let action = ExecutionAction::new("make")
                    .arg("-C")
                    .arg(common::path_arg(&ctx.config.root_dir().join(RUNNER_DIR)))
                    .arg(format!("-j{}", common::jobs(args)?))
                    .arg(format!("OUTPUT_DIRECTORY={}", common::path_arg(&build_dir)))
                    .arg(format!("NRF5_PATH={sdk}"))
                    .arg(format!(
                        "UBXLIB_BASE={}",
                        common::path_arg(ctx.config.root_dir())
                    ));
                Ok(vec![TaskStep::Run(action)])
            }
            "flash" => {
                let mut action = ExecutionAction::new("nrfjprog")
                    .args(["-f", "nrf52", "--program"])
                    .arg(common::path_arg(&build_dir.join(HEX_NAME)))
                    .args(["--chiperase", "--verify", "-r"]);
                if let Some(serial) = args.get(SERIAL.name) {
                    action = action.args(["-s", serial]);
                }
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
    use std::collections::BTreeMap;

    #[test]
    fn build_needs_an_sdk_location() {
        let err = plan(&Nrf5Tasks, &config(), "build", &[]).unwrap_err();
        assert!(err.to_string().contains("nrf5_path"));
    }

    #[test]
    fn build_reads_sdk_from_settings() {
        let config = config().with_settings(BTreeMap::from([(
            "nrf5_path".to_string(),
            "/opt/nrf5".to_string(),
        )]));
        let steps = plan(&Nrf5Tasks, &config, "build", &["--jobs", "2"]).unwrap();
        assert_eq!(
            lines(&steps),
            vec![
                "run: make -C /ubxlib/port/platform/nrf5sdk/mcu/nrf52/gcc/runner -j2 \
                 OUTPUT_DIRECTORY=/ubxlib/_build/nrf5 NRF5_PATH=/opt/nrf5 UBXLIB_BASE=/ubxlib"
            ]
        );
    }

    #[test]
    fn flash_programs_the_hex_file() {
        let steps = plan(&Nrf5Tasks, &config(), "flash", &[]).unwrap();
        assert_eq!(
            lines(&steps),
            vec![
                "run: nrfjprog -f nrf52 --program /ubxlib/_build/nrf5/nrf52840_xxaa.hex \
                 --chiperase --verify -r"
            ]
        );
    }
}
