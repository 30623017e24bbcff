use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ubxtask_core::{ParamSpec, TaskArgs, TaskInfo, TaskRef};

const BUILD: TaskInfo = TaskInfo {
    name: "build",
    help: "Build the test runner",
    params: &[
        ParamSpec::value("board", "target board").with_default("nrf5340dk_nrf5340_cpuapp"),
        ParamSpec::value("build-dir", "output directory"),
        ParamSpec::value("jobs", "parallel jobs").with_default("8"),
        ParamSpec::flag("pristine", "clean rebuild"),
    ],
};

fn bench_task_ref_parse(c: &mut Criterion) {
    c.bench_function("parse_task_ref", |b| {
        b.iter(|| {
            let _task: TaskRef = black_box("nrfconnect.check_installation").parse().unwrap();
        })
    });
}

fn bench_task_args_parse(c: &mut Criterion) {
    let raw = ["--board", "nrf52840dk_nrf52840", "--jobs=4", "--pristine"]
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();

    c.bench_function("parse_task_args", |b| {
        b.iter(|| {
            let _args = TaskArgs::parse(black_box(&BUILD), black_box(&raw)).unwrap();
        })
    });
}

criterion_group!(benches, bench_task_ref_parse, bench_task_args_parse);
criterion_main!(benches);
