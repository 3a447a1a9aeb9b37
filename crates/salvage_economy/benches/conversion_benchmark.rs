//! Benchmark for recycle step performance.
//!
//! Run with: cargo bench --package salvage_economy --bench conversion_benchmark

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use salvage_economy::{
    Blueprint, BlueprintIngredient, ConversionEngine, HookRegistry, IngredientSpec, ItemCatalog,
    ItemDefinition, ItemStack, LookupTables, ProbabilisticRounder, Recipe, SimDevice,
};

const SCRAP: i32 = 1;
const FRAGMENTS: i32 = 2;
const RIFLE: i32 = 3;
const STONES: i32 = 4;

fn create_catalog() -> ItemCatalog {
    ItemCatalog::from_definitions([
        ItemDefinition::new(SCRAP, "scrap", 1000),
        ItemDefinition::new(FRAGMENTS, "metal.fragments", 1000),
        ItemDefinition::new(STONES, "stones", 1000),
        ItemDefinition::new(RIFLE, "rifle.ak", 1)
            .with_durability()
            .with_blueprint(Blueprint {
                ingredients: vec![BlueprintIngredient {
                    item_id: FRAGMENTS,
                    amount: 50.0,
                }],
                amount_to_create: 1,
                scrap_from_recycle: 25,
            }),
    ])
}

fn create_engine() -> ConversionEngine {
    let mut tables = LookupTables::default();
    tables
        .overrides
        .entries_mut()
        .insert_item(STONES, Recipe::new(vec![IngredientSpec::new(FRAGMENTS, 0.3)]));

    // Many unrelated entries so lookups hit populated maps
    for skin in 1..500u64 {
        tables.restrictions.restrict_skin(skin * 7919);
    }

    ConversionEngine::new(
        Arc::new(create_catalog()),
        tables,
        HookRegistry::new(),
        ProbabilisticRounder::new(42),
    )
}

fn benchmark_rounding(c: &mut Criterion) {
    let mut rounder = ProbabilisticRounder::new(7);

    c.bench_function("round_small_batch_50", |b| {
        b.iter(|| black_box(rounder.round(black_box(50), 0.3)));
    });

    c.bench_function("round_large_batch_10000", |b| {
        b.iter(|| black_box(rounder.round(black_box(10_000), 0.3)));
    });
}

fn benchmark_vanilla_step(c: &mut Criterion) {
    let mut engine = create_engine();

    c.bench_function("vanilla_recycle_step", |b| {
        b.iter(|| {
            let mut device = SimDevice::new(1);
            device.load(0, ItemStack::new(RIFLE, 1).with_condition(0.75));
            black_box(engine.process_slot(&mut device, 0))
        });
    });
}

fn benchmark_override_step(c: &mut Criterion) {
    let mut engine = create_engine();

    c.bench_function("override_recycle_step", |b| {
        b.iter(|| {
            let mut device = SimDevice::new(1);
            device.load(0, ItemStack::new(STONES, 500));
            black_box(engine.process_slot(&mut device, 0))
        });
    });
}

fn benchmark_processable_scan(c: &mut Criterion) {
    let engine = create_engine();
    let mut device = SimDevice::new(1);
    for slot in 0..5 {
        device.load(slot, ItemStack::new(FRAGMENTS, 10));
    }
    device.load(5, ItemStack::new(RIFLE, 1));

    c.bench_function("next_processable_slot_6", |b| {
        b.iter(|| black_box(engine.next_processable_slot(&device)));
    });
}

criterion_group!(
    benches,
    benchmark_rounding,
    benchmark_vanilla_step,
    benchmark_override_step,
    benchmark_processable_scan,
);
criterion_main!(benches);
