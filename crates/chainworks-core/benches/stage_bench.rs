//! Criterion benchmarks for the stage engine.
//!
//! Three benchmark groups:
//! - `facility_step`: 1000 and 10000 stages across every built-in chain
//! - `stage_tick`: a single stage ticked through full batches
//! - `persistence`: facility snapshots and per-stage records

use chainworks_core::catalog::{self, items};
use chainworks_core::event::NullSink;
use chainworks_core::facility::Facility;
use chainworks_core::id::{ActorId, RecipeId};
use chainworks_core::item::ItemUnit;
use chainworks_core::recipe::BatchStart;
use chainworks_core::registry::{Registry, RegistryBuilder};
use chainworks_core::stage::ProcessingStage;
use chainworks_core::test_utils::*;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

// ===========================================================================
// Facility builders
// ===========================================================================

fn builtin_registry() -> Arc<Registry> {
    let mut b = RegistryBuilder::new();
    catalog::register_builtin(&mut b);
    Arc::new(b.build().unwrap())
}

/// Place `count` stages round-robin over every built-in recipe and load
/// each with whatever its first input slot accepts.
fn build_facility(registry: &Arc<Registry>, count: usize) -> Facility {
    let mut facility = Facility::new(Arc::clone(registry), 7);
    let recipes: Vec<_> = (0..registry.recipe_count() as u32)
        .map(RecipeId)
        .collect();
    let feed: Vec<_> = [
        items::EPHEDRINE,
        items::COFFEE_CHERRY,
        items::ERGOT,
        items::CRYSTAL_METH,
        items::RAW_METH,
        items::WET_BEANS,
        items::GREEN_BEANS,
        items::ERGOT_CULTURE,
    ]
    .iter()
    .filter_map(|name| registry.item_id(name))
    .collect();

    for i in 0..count {
        let Ok(id) = facility.place(recipes[i % recipes.len()]) else {
            continue;
        };
        if let Some(stage) = facility.stage_mut(id) {
            for item in &feed {
                for _ in 0..4 {
                    stage.add_input(ItemUnit::standard(*item));
                }
            }
            stage.set_heating(true);
            stage.start_batch();
        }
        facility.start_session(id, ActorId(i as u64));
    }
    facility
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_facility_step(c: &mut Criterion) {
    let registry = builtin_registry();
    let mut group = c.benchmark_group("facility_step");
    for count in [1_000, 10_000] {
        let mut facility = build_facility(&registry, count);
        group.bench_function(format!("{count}_stages"), |b| {
            b.iter(|| black_box(facility.step(&mut NullSink)));
        });
    }
    group.finish();
}

fn bench_stage_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("stage_tick");
    group.bench_function("pooled_batch_100_ticks", |b| {
        b.iter(|| {
            let mut stage = pooled_stage(8, BatchStart::OnFirstUnit, 100);
            let mut rng = ScriptedRng::never();
            for _ in 0..8 {
                stage.add_input(ItemUnit::standard(raw()));
            }
            for _ in 0..100 {
                stage.tick(&mut rng);
            }
            black_box(stage.extract_output())
        });
    });
    group.bench_function("kettle_batch", |b| {
        b.iter(|| {
            let mut stage = ProcessingStage::new(kettle_recipe());
            let mut rng = ScriptedRng::never();
            stage.add_input(ItemUnit::standard(raw()));
            stage.set_heating(true);
            for _ in 0..600 {
                stage.tick(&mut rng);
            }
            black_box(stage.peek_status())
        });
    });
    group.finish();
}

fn bench_persistence(c: &mut Criterion) {
    let registry = builtin_registry();
    let facility = build_facility(&registry, 5_000);
    let mut group = c.benchmark_group("persistence");

    group.bench_function("snapshot_5000_stages", |b| {
        b.iter(|| black_box(facility.snapshot()));
    });

    let data = facility.snapshot().unwrap();
    group.bench_function("restore_5000_stages", |b| {
        b.iter(|| Facility::restore(Arc::clone(&registry), &data).unwrap());
    });

    group.bench_function("save_records_5000_stages", |b| {
        b.iter(|| black_box(facility.save_records(registry.as_ref())));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_facility_step,
    bench_stage_tick,
    bench_persistence
);
criterion_main!(benches);
