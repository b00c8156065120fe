use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fmt::Write as _;
use std::path::Path;
use vsmodelgen::*;

// Latency of each generation phase and scaling with channel count.

fn demo_config() -> String {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let path = manifest_dir
        .parent()
        .unwrap()
        .join("demos")
        .join("examplemodel1.json");
    std::fs::read_to_string(path).expect("demo config must exist")
}

/// Config with `n` channels per section, spread over four categories.
fn generate_scaling_config(n: usize) -> String {
    let mut sections = String::new();
    for section in ["inports", "outports", "parameters", "signals"] {
        let _ = write!(sections, ",\n  \"{}\": [", section);
        for i in 0..n {
            if i > 0 {
                sections.push_str(", ");
            }
            let _ = write!(
                sections,
                "{{\"name\": \"cat{}.{}_{}\", \"dimX\": {}}}",
                i % 4,
                section,
                i,
                1 + i % 8
            );
        }
        sections.push(']');
    }
    format!(
        "{{\n  \"name\": \"scaling\", \"builder\": \"bench\", \"baserate\": 0.001{}\n}}\n",
        sections
    )
}

fn bench_parse_latency(c: &mut Criterion) {
    let config = demo_config();
    c.bench_function("phase/parse", |b| {
        b.iter(|| {
            let result = parser::parse_config(black_box(&config)).expect("demo must parse");
            black_box(result.model);
        });
    });
}

fn bench_phase_latency(c: &mut Criterion) {
    let config = demo_config();
    let model = parser::parse_config(&config)
        .expect("demo must parse")
        .model;
    let tables = layout::build_layout(&model);
    let opts = codegen::CodegenOptions::default();

    c.bench_function("phase/layout", |b| {
        b.iter(|| black_box(layout::build_layout(black_box(&model))));
    });
    c.bench_function("phase/codegen", |b| {
        b.iter(|| black_box(codegen::codegen(black_box(&model), &tables, &opts)));
    });
}

fn bench_full_generation_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate/scaling");
    let opts = pipeline::GenerateOptions::default();

    for n in [1_usize, 10, 100, 1000] {
        let config = generate_scaling_config(n);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}channels", n)),
            &config,
            |b, config| {
                b.iter(|| {
                    let g = pipeline::generate(black_box(config), &opts)
                        .expect("scaling config must generate");
                    black_box(g.code);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_latency,
    bench_phase_latency,
    bench_full_generation_scaling,
);
criterion_main!(benches);
