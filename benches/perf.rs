use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Map, Value, json};
use std::hint::black_box;

use mwstats::{RenameTable, SortRules, TimeSettings, normalize_times, rename_document, sort_document};

const WEAPON_CODES: &[&str] = &[
    "iw8_ar_tango21",
    "iw8_ar_mike4",
    "iw8_ar_valpha",
    "iw8_ar_falpha",
    "iw8_ar_mcharlie",
    "iw8_ar_akilo47",
    "iw8_ar_asierra12",
    "iw8_ar_galima",
    "iw8_ar_sierra552",
    "iw8_ar_falima",
];

fn sample_stats() -> Value {
    let weapons: Map<String, Value> = WEAPON_CODES
        .iter()
        .enumerate()
        .map(|(i, code)| {
            (
                code.to_string(),
                json!({"properties": {"kills": (i * 37) % 11, "deaths": i, "timePlayed": i * 600}}),
            )
        })
        .collect();
    let modes: Map<String, Value> = ["dom", "war", "hq", "conf", "koth", "sd", "cyber", "arm"]
        .iter()
        .enumerate()
        .map(|(i, code)| {
            (
                code.to_string(),
                json!({"properties": {"timePlayed": (i * 7919) % 5000, "kills": i}}),
            )
        })
        .collect();
    let weekly: Vec<Value> = (0..50)
        .map(|i| json!({"utcStartSeconds": 1_697_528_478 + i * 900, "duration": 600_000 + i, "mode": "war"}))
        .collect();
    json!({
        "status": "success",
        "data": {
            "lifetime": {
                "mode": modes,
                "itemData": {"weapon_assault_rifle": weapons},
                "accoladeData": {"properties": {"mostKills": 3, "longestLife": 12, "clutch": 7}}
            },
            "matches": weekly
        }
    })
}

fn bench_rename(c: &mut Criterion) {
    let table = RenameTable::bundled().expect("bundled table");
    let doc = sample_stats();
    c.bench_function("rename_document", |b| {
        b.iter(|| {
            let out = rename_document(black_box(doc.clone()), &table);
            black_box(out);
        })
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let table = RenameTable::bundled().expect("bundled table");
    let rules = SortRules::default();
    let time = TimeSettings::default();
    let doc = sample_stats();
    c.bench_function("rename_sort_normalize", |b| {
        b.iter(|| {
            let mut out = rename_document(black_box(doc.clone()), &table);
            let report = sort_document(&mut out, &rules);
            let converted = normalize_times(&mut out, &time);
            black_box((report.sorted, converted));
        })
    });
}

criterion_group!(benches, bench_rename, bench_full_pipeline);
criterion_main!(benches);
