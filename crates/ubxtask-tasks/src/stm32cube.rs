//! Tasks for STM32 targets using the STM32Cube firmware packages.

use ubxtask_core::{
    ExecutionAction, ParamSpec, TaskArgs, TaskCollection, TaskContext, TaskError, TaskInfo,
    TaskStep,
};

use crate::common::{self, BUILD_DIR, JOBS};

const MCU: ParamSpec = ParamSpec::value("mcu", "MCU family directory").with_default("stm32f4");
const CUBE_FW_PATH: ParamSpec = ParamSpec::value(
    "cube-fw-path",
    "Location of the STM32Cube firmware package (default: 'stm32cube_fw_path' setting)",
);
const SERIAL: ParamSpec = ParamSpec::value("serial", "Serial number of the ST-LINK to use");

const TASKS: &[TaskInfo] = &[
    TaskInfo {
        name: "check-installation",
        help: "Check that make, the ARM GCC toolchain and STM32CubeProgrammer are on the PATH",
        params: &[],
    },
    TaskInfo {
        name: "build",
        help: "Build the ubxlib test runner with make",
        params: &[MCU, CUBE_FW_PATH, BUILD_DIR, JOBS],
    },
    TaskInfo {
        name: "flash",
        help: "Program the target over SWD with STM32CubeProgrammer",
        params: &[BUILD_DIR, SERIAL],
    },
    TaskInfo {
        name: "clean",
        help: "Remove the build directory",
        params: &[BUILD_DIR],
    },
];

#[derive(Debug, Default)]
pub struct Stm32CubeTasks;

impl TaskCollection for Stm32CubeTasks {
    fn name(&self) -> &str {
        "stm32cube"
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
                ("STM32_Programmer_CLI", "--version"),
            ])),
            "build" => {
                let mcu = args.require(MCU.name)?;
                let family = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
                if mcu.is_empty() || !mcu.chars().all(family) {
                    return Err(TaskError::InvalidValue {
                        name: MCU.name.to_string(),
                        value: mcu.to_string(),
                        reason: "expected an MCU family name such as stm32f4".to_string(),
                    });
                }
                let fw =
                    common::arg_or_setting(ctx, args, CUBE_FW_PATH.name, "stm32cube_fw_path")?;
                let runner = ctx
                    .config
                    .root_dir()
                    .join(format!("port/platform/stm32cube/mcu/{mcu}/runner"));
                let action = ExecutionAction::new("make")
                    .arg("-C")
                    .arg(common::path_arg(&runner))
                    .arg(format!("-j{}", common::jobs(args)?))
                    .arg(format!("OUTPUT_DIRECTORY={}", common::path_arg(&build_dir)))
                    .arg(format!("STM32_CUBE_FW_PATH={fw}"))
                    .arg(format!(
                        "UBXLIB_BASE={}",
                        common::path_arg(ctx.config.root_dir())
                    ));
                Ok(vec![TaskStep::Run(action)])
            }
            "flash" => {
                let mut action = ExecutionAction::new("STM32_Programmer_CLI")
                    .arg("-c")
                    .arg("port=SWD");
                if let Some(serial) = args.get(SERIAL.name) {
                    action = action.arg(format!("sn={serial}"));
                }
                let action = action
                    .arg("-w")
                    .arg(common::path_arg(&build_dir.join("runner.elf")))
                    .arg("-rst");
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
    fn build_selects_runner_by_mcu() {
        let steps = plan(
            &Stm32CubeTasks,
            &config(),
            "build",
            &["--mcu", "stm32u5", "--cube-fw-path", "/opt/STM32CubeU5"],
        )
        .unwrap();
        let line = &lines(&steps)[0];
        assert!(line.contains("-C /ubxlib/port/platform/stm32cube/mcu/stm32u5/runner"));
        assert!(line.contains("STM32_CUBE_FW_PATH=/opt/STM32CubeU5"));
    }

    #[test]
    fn build_rejects_anything_but_a_family_name() {
        for mcu in ["../x", "..", "", "STM32F4", "stm32 f4", "stm32-f4"] {
            let err = plan(
                &Stm32CubeTasks,
                &config(),
                "build",
                &["--mcu", mcu, "--cube-fw-path", "/fw"],
            )
            .unwrap_err();
            assert!(
                matches!(err, TaskError::InvalidValue { .. }),
                "'{mcu}' should be rejected"
            );
        }
    }

    #[test]
    fn flash_with_serial() {
        let steps = plan(&Stm32CubeTasks, &config(), "flash", &["--serial", "066D"]).unwrap();
        assert_eq!(
            lines(&steps),
            vec![
                "run: STM32_Programmer_CLI -c port=SWD sn=066D -w \
                 /ubxlib/_build/stm32cube/runner.elf -rst"
            ]
        );
    }

    #[test]
    fn flash_keeps_serial_as_one_argument() {
        let steps = plan(&Stm32CubeTasks, &config(), "flash", &["--serial", "066D 48"]).unwrap();
        let TaskStep::Run(action) = &steps[0] else {
            panic!("expected a run step");
        };
        assert_eq!(action.args[..3], ["-c", "port=SWD", "sn=066D 48"]);

        let steps = plan(&Stm32CubeTasks, &config(), "flash", &[]).unwrap();
        let TaskStep::Run(action) = &steps[0] else {
            panic!("expected a run step");
        };
        assert_eq!(action.args[..3], ["-c", "port=SWD", "-w"]);
    }
}
