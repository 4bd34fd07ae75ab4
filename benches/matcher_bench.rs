//! Performance benchmarks for filament matching and spool resolution.
//!
//! Every tray of every changed feeder unit runs the matcher over the full
//! external catalog (several thousand entries) and the resolver over the
//! full spool listing, while holding the global pass lock.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench matcher_bench
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::json;
use spoolbridge_catalog::{ExternalFilament, InternalFilament, Spool};
use spoolbridge_core::{AmsUnitId, TagField, TrayColor, TraySnapshot};
use spoolbridge_engine::{candidate_prefixes, match_external, match_internal, resolve};
use std::hint::black_box;

const MATERIALS: [&str; 6] = ["pla_basic", "pla_matte", "petg_hf", "abs", "asa", "tpu_95a"];

/// Build an external catalog of `size` single-color entries.
fn external_catalog(size: usize) -> Vec<ExternalFilament> {
    (0..size)
        .map(|i| ExternalFilament {
            id: format!("bambulab_{}_{i:06x}_1750_1000", MATERIALS[i % MATERIALS.len()]),
            name: format!("Filament {i}"),
            material: "PLA".to_string(),
            density: 1.24,
            diameter: 1.75,
            color_hex: Some(format!("{:06X}", i * 37 % 0xFFFFFF)),
            ..Default::default()
        })
        .collect()
}

/// A tray matching the last entry of the catalog, forcing a full scan.
fn worst_case_tray(catalog: &[ExternalFilament]) -> TraySnapshot {
    let last = catalog.last().unwrap();
    TraySnapshot {
        unit: AmsUnitId::A,
        slot: "0".to_string(),
        remain_percent: 64.0,
        tray_weight: 1000.0,
        tray_uuid: "A1B2C3D4E5F60718293A4B5C6D7E8F90".to_string(),
        color: TrayColor::new(&format!("{}FF", last.color_hex.as_deref().unwrap())).unwrap(),
        sub_brand: "TPU 95A".to_string(),
    }
}

fn spools(count: usize, external_id: &str) -> Vec<Spool> {
    (0..count)
        .map(|i| {
            serde_json::from_value(json!({
                "id": i,
                "filament": {"id": 1, "density": 1.24, "diameter": 1.75, "external_id": external_id},
                "remaining_weight": 500.0,
                "extra": {"tag": format!("\"{i:032X}\"")}
            }))
            .unwrap()
        })
        .collect()
}

/// Benchmark prefix generation for a sub-brand label.
fn bench_candidate_prefixes(c: &mut Criterion) {
    let mut group = c.benchmark_group("candidate_prefixes");
    group.throughput(Throughput::Elements(1));

    group.bench_function("polyterra_matte", |b| {
        b.iter(|| black_box(candidate_prefixes(black_box("PolyTerra Matte"))));
    });

    group.finish();
}

/// Benchmark external matching against catalogs of increasing size.
fn bench_match_external(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_external");

    for size in [100, 1_000, 5_000] {
        let catalog = external_catalog(size);
        let tray = worst_case_tray(&catalog);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(match_external(black_box(&catalog), black_box(&tray))));
        });
    }

    group.finish();
}

/// Benchmark internal matching plus resolution over a large spool listing.
fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let external = external_catalog(1).remove(0);
    let tag = TagField::default();
    let internal: Vec<InternalFilament> = vec![
        serde_json::from_value(json!({
            "id": 1, "density": 1.24, "diameter": 1.75, "external_id": external.id
        }))
        .unwrap(),
    ];
    let tray = worst_case_tray(std::slice::from_ref(&external));

    for count in [10, 100, 1_000] {
        let listing = spools(count, &external.id);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let matches = match_internal(black_box(&internal), &external);
                black_box(resolve(black_box(&listing), &matches, &tray, &tag))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_candidate_prefixes,
    bench_match_external,
    bench_resolve
);
criterion_main!(benches);
