//! Benchmarks for the token parsers
//!
//! Measures single-token parses on typical configuration strings, plus
//! scanning a long event name with many embedded macros.
//!
//! Run with: cargo bench --bench parsers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use monexpr::prelude::*;

// ============================================================================
// Macros and References
// ============================================================================

fn bench_macros(c: &mut Criterion) {
    let mut g = c.benchmark_group("macros");

    let user = UserMacroParser::default();
    g.bench_function("user_macro_context", |b| {
        b.iter(|| user.parse(black_box("{$THRESHOLD:\"cpu load\"}"), 0))
    });

    let lld = LldMacroParser::new();
    g.bench_function("lld_macro", |b| b.iter(|| lld.parse(black_box("{#FSNAME}"), 0)));

    let function = MacroFunctionParser::default();
    g.bench_function("macro_function", |b| {
        b.iter(|| function.parse(black_box("{{#IFNAME}.regsub(\"^eth([0-9]+)\", \\1)}"), 0))
    });

    let item_key = ItemKeyParser::new();
    g.bench_function("item_key_nested", |b| {
        b.iter(|| item_key.parse(black_box("net.if.in[\"eth0\",[bytes,packets],,\"a,b\"]"), 0))
    });

    g.finish();
}

// ============================================================================
// Expressions
// ============================================================================

fn bench_expressions(c: &mut Criterion) {
    let mut g = c.benchmark_group("expressions");

    let parser = ExpressionParser::new(ExpressionOptions {
        usermacros: true,
        lldmacros: true,
        ..ExpressionOptions::default()
    });

    let inputs = [
        ("simple", "last(/host/key)>0"),
        (
            "mixed",
            "avg(/host/system.cpu.load[all,avg1],5m) > {$CPU_MAX} and not nodata(/host/agent.ping,10m)=1",
        ),
        (
            "math",
            "abs(last(/host/key) - min(/host/key,1h)) / 2K >= 1.5 or \"text\" = {#VALUE}",
        ),
    ];

    for (name, input) in inputs {
        g.throughput(Throughput::Bytes(input.len() as u64));
        g.bench_with_input(BenchmarkId::from_parameter(name), input, |b, input| {
            b.iter(|| parser.parse(black_box(input), 0))
        });
    }

    g.finish();
}

// ============================================================================
// Formulas and Rules
// ============================================================================

fn bench_formulas(c: &mut Criterion) {
    let mut g = c.benchmark_group("formulas");

    let condition = ConditionFormulaParser::new();
    g.bench_function("condition", |b| {
        b.iter(|| condition.parse(black_box("(A and B) or not (C and D) or E"), 0))
    });

    let rules = ValidationRuleParser::new();
    g.bench_function("validation_rules", |b| {
        b.iter(|| rules.parse(black_box("required|not_empty|in 1,2,3|db hosts.name|time_unit 1:86400"), 0))
    });

    g.finish();
}

// ============================================================================
// Intervals
// ============================================================================

fn bench_intervals(c: &mut Criterion) {
    let mut g = c.benchmark_group("intervals");

    let parser = UpdateIntervalParser::default();
    g.bench_function("flexible", |b| {
        b.iter(|| parser.parse(black_box("30s;50s/1-5,09:00-18:00;10s/6-7,00:00-24:00"), 0))
    });
    g.bench_function("scheduling", |b| {
        b.iter(|| parser.parse(black_box("0;wd1-5h9-18m/15;md1h0m0s0"), 0))
    });

    g.finish();
}

// ============================================================================
// Long Inputs
// ============================================================================

fn bench_event_name(c: &mut Criterion) {
    let mut g = c.benchmark_group("event_name");
    let parser = EventNameParser::default();

    for count in [10usize, 100, 1000] {
        let input = "Load {?avg(/{HOST.HOST}/system.cpu.load,5m)} on {HOST.NAME} ".repeat(count);
        g.throughput(Throughput::Bytes(input.len() as u64));
        g.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, input| {
            b.iter(|| parser.parse(black_box(input), 0))
        });
    }

    g.finish();
}

criterion_group!(
    benches,
    bench_macros,
    bench_expressions,
    bench_formulas,
    bench_intervals,
    bench_event_name
);
criterion_main!(benches);
