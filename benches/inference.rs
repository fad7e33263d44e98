//! Benchmarks for fuzzification, defuzzification and full inference runs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mamdani::{
    CrispInputs, Domain, InferenceEngine, InferenceSettings, InputVariable, OutputVariable,
    SystemDefinition,
};

const LOAN: &str = include_str!("../demos/loan.json");

fn fuzzify_benchmark(c: &mut Criterion) {
    let mut var = InputVariable::new("size", Domain::new(0.0, 30.0).unwrap());
    var.variable_mut().add_trapezoid("kucuk", 0.0, 20.0, 5.0, 12.0);
    var.variable_mut().add_triangular("orta", 17.0, 22.0, 30.0);
    var.variable_mut().add_triangular("buyuk", 22.0, 30.0, 30.0);

    c.bench_function("fuzzify_three_sets", |b| {
        b.iter(|| {
            var.fuzzify(black_box(18.0));
            black_box(var.degree("orta"))
        });
    });
}

fn defuzzify_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_defuzzify");

    for hi in [100.0, 1_000.0, 10_000.0] {
        let mut out = OutputVariable::new("out", Domain::new(0.0, hi).unwrap());
        out.add_trapezoid("kucuk", 0.0, hi * 0.3, 0.0, hi * 0.2);
        out.add_trapezoid("orta", hi * 0.25, hi * 0.65, hi * 0.3, hi * 0.6);
        out.add_trapezoid("buyuk", hi * 0.6, hi, hi * 0.7, hi);

        group.bench_with_input(BenchmarkId::from_parameter(hi as u64), &hi, |b, _| {
            b.iter(|| {
                out.clean_clips();
                out.clip("kucuk", 0.1).unwrap();
                out.clip("orta", 0.2).unwrap();
                out.clip("buyuk", 0.5).unwrap();
                out.aggregate_outputs();
                black_box(out.defuzzify())
            });
        });
    }

    group.finish();
}

fn loan_benchmark(c: &mut Criterion) {
    let system = SystemDefinition::from_json_str(LOAN).unwrap();
    let mut engine = InferenceEngine::new(&system, InferenceSettings::default()).unwrap();

    let full: CrispInputs = [
        ("market_value", Some(550.0)),
        ("location", Some(6.5)),
        ("assets", Some(420.0)),
        ("income", Some(58.0)),
        ("interest", Some(3.5)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    let mut partial = full.clone();
    partial.insert("income".to_string(), None);
    partial.insert("assets".to_string(), None);

    let mut group = c.benchmark_group("loan_system");
    group.bench_function("all_inputs", |b| b.iter(|| black_box(engine.infer(&full).unwrap())));
    group.bench_function("missing_applicant", |b| {
        b.iter(|| black_box(engine.infer(&partial).unwrap()))
    });
    group.finish();
}

criterion_group!(benches, fuzzify_benchmark, defuzzify_benchmark, loan_benchmark);
criterion_main!(benches);
