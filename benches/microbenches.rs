//! Criterion microbenches for labelcore.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - configuration compilation (compile), with and without repeaters
//! - task parsing (from_task_str)
//! - loading records into an annotation and exporting them again

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use labelcore::config::compile;
use labelcore::io::from_task_str;
use labelcore::model::{Annotation, AnnotationId, EntityKind};
use labelcore::registry::TagRegistry;
use labelcore::tags::TagTree;
use serde_json::json;

// Include test fixtures at compile time (no file I/O during benchmark)
const IMAGE_CONFIG: &str = include_str!("../tests/fixtures/image_classify.xml");
const REPEATER_CONFIG: &str = include_str!("../tests/fixtures/repeater.xml");
const IMAGE_TASK: &str = include_str!("../tests/fixtures/task_image.json");

/// Benchmark compiling a flat configuration.
fn bench_compile(c: &mut Criterion) {
    let data = json!({"image": "cat.jpg"});
    let mut group = c.benchmark_group("compile");
    group.throughput(Throughput::Bytes(IMAGE_CONFIG.len() as u64));

    group.bench_function("image_classify", |b| {
        b.iter(|| {
            let root = compile(black_box(IMAGE_CONFIG), &data).unwrap();
            black_box(root)
        })
    });

    group.finish();
}

/// Benchmark repeater expansion over a hundred pages.
fn bench_compile_repeater(c: &mut Criterion) {
    let images: Vec<_> = (0..100).map(|i| json!({"url": format!("p{i}.png")})).collect();
    let data = json!({ "images": images });
    let mut group = c.benchmark_group("compile");

    group.bench_function("repeater_100", |b| {
        b.iter(|| {
            let root = compile(black_box(REPEATER_CONFIG), &data).unwrap();
            black_box(root)
        })
    });

    group.finish();
}

/// Benchmark task JSON parsing.
fn bench_task_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("task_parse");
    group.throughput(Throughput::Bytes(IMAGE_TASK.len() as u64));

    group.bench_function("from_task_str", |b| {
        b.iter(|| {
            let task = from_task_str(black_box(IMAGE_TASK)).unwrap();
            black_box(task)
        })
    });

    group.finish();
}

/// Benchmark loading and exporting one annotation.
///
/// The tag tree is built once; only record handling is measured.
fn bench_load_serialize(c: &mut Criterion) {
    let registry = TagRegistry::standard();
    let task = from_task_str(IMAGE_TASK).unwrap();
    let root = compile(IMAGE_CONFIG, &task.data).unwrap();
    let tree = TagTree::instantiate(&registry, root).unwrap();
    let records = task.annotations[0].result.clone();

    let mut group = c.benchmark_group("annotation");
    group.throughput(Throughput::Elements(records.len() as u64));

    group.bench_function("load_and_serialize", |b| {
        b.iter(|| {
            let (annotation, _) = Annotation::from_records(
                AnnotationId::from("bench"),
                EntityKind::Annotation,
                black_box(&records),
                &tree,
                &registry,
            );
            black_box(annotation.serialize(&tree))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_compile,
    bench_compile_repeater,
    bench_task_parse,
    bench_load_serialize
);
criterion_main!(benches);
