//! Performance benchmarks for script generation.
//!
//! Measures the full parse + generate pipeline on the bundled scripts and
//! the generator alone on a synthetic script whose size grows with the
//! number of statements.
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- "generate/statements"
//! ```
//!
//! Each generator iteration closes a puffin frame, so the collection,
//! materialization and emission scopes can be inspected per run.

use bumpalo::Bump;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use pinegen::{GeneratorConfig, Parser, generate_strategy_code};
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// Benchmark the facade over complete scripts.
fn script_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/scripts");

    let scripts = [
        ("ma_crossover", include_str!("../test_scripts/ma_crossover.pine")),
        ("rsi_reversion", include_str!("../test_scripts/rsi_reversion.pine")),
        ("daily_trend", include_str!("../test_scripts/daily_trend.pine")),
    ];
    for (name, source) in scripts {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                let code = pinegen::compile(black_box(source)).unwrap();
                black_box(code.function_body.len())
            });
        });
    }

    group.finish();
}

/// A script of `n` chained indicator statements with nested calls.
fn synthetic_script(n: usize) -> String {
    let mut source = String::from("strategy(\"Synthetic\")\nv0 = close\n");
    for i in 1..n {
        let period = 5 + i % 40;
        source.push_str(&format!(
            "v{i} = ta.ema(v{}, {period}) - ta.sma(close - open, {period})\n",
            i - 1
        ));
    }
    source
}

/// Benchmark the generator alone, reusing one parsed program.
fn generator_scaling(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("generate/statements");
    let config = GeneratorConfig::default();

    for n in [10, 100, 500] {
        let source = synthetic_script(n);
        let arena = Bump::new();
        let program = Parser::parse(&source, &arena).unwrap();

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &program, |b, program| {
            b.iter(|| {
                let code = generate_strategy_code(black_box(program), &config).unwrap();
                end_profiling_frame();
                black_box(code.function_body.len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, script_benchmarks, generator_scaling);
criterion_main!(benches);
