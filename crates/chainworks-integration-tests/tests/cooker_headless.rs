//! Headless cooker: the flatter cooker timing window, a per-batch reagent
//! and a fractional yield.

use std::sync::Arc;

use chainworks_core::catalog::{self, items};
use chainworks_core::event::NullSink;
use chainworks_core::facility::Facility;
use chainworks_core::id::{ActorId, ItemTypeId, StageId};
use chainworks_core::item::ItemUnit;
use chainworks_core::quality::QualityTier;
use chainworks_core::registry::{Registry, RegistryBuilder};
use chainworks_core::stage::AddInputOutcome;
use chainworks_core::test_utils::fixed;
use chainworks_core::timing::TimingWindow;

const COOK: ActorId = ActorId(12);

fn builtin() -> Arc<Registry> {
    let mut b = RegistryBuilder::new();
    catalog::register_builtin(&mut b);
    Arc::new(b.build().unwrap())
}

fn item(registry: &Registry, name: &str) -> ItemTypeId {
    registry.item_id(name).unwrap()
}

fn cooker_with(registry: &Arc<Registry>, paste: u32, soda: bool) -> (Facility, StageId) {
    let mut facility = Facility::new(Arc::clone(registry), 99);
    let cooker = facility
        .place(registry.recipe_id("crack_cooker").unwrap())
        .unwrap();
    let stage = facility.stage_mut(cooker).unwrap();
    for _ in 0..paste {
        assert!(
            stage
                .add_input(ItemUnit::standard(item(registry, items::COCA_PASTE)))
                .is_accepted()
        );
    }
    if soda {
        assert!(
            stage
                .add_input(ItemUnit::standard(item(registry, items::BAKING_SODA)))
                .is_accepted()
        );
    }
    (facility, cooker)
}

#[test]
fn full_cook_at_the_centre() {
    let registry = builtin();
    let (mut facility, cooker) = cooker_with(&registry, 10, true);
    assert_eq!(
        facility
            .stage_mut(cooker)
            .unwrap()
            .add_input(ItemUnit::standard(item(&registry, items::BAKING_SODA))),
        AddInputOutcome::RejectedFull,
        "one soda per batch"
    );
    assert_eq!(
        facility
            .stage_mut(cooker)
            .unwrap()
            .add_input(ItemUnit::standard(item(&registry, items::COCA_PASTE))),
        AddInputOutcome::RejectedFull
    );

    assert!(facility.start_session(cooker, COOK));
    for _ in 0..40 {
        facility.step(&mut NullSink);
    }
    let score = facility.press(cooker).unwrap();
    assert_eq!(score, fixed(1.0));

    let crack = facility.stage_mut(cooker).unwrap().extract_output().unwrap();
    assert_eq!(crack.item_type, item(&registry, items::CRACK));
    assert_eq!(crack.quantity, 8);
    assert_eq!(crack.quality, QualityTier::Legendary);
    assert_eq!(facility.stage(cooker).unwrap().state().reagent_count, 0);
}

#[test]
fn small_batch_still_yields_one() {
    let registry = builtin();
    let (mut facility, cooker) = cooker_with(&registry, 1, true);
    assert!(facility.start_session(cooker, COOK));
    for _ in 0..80 {
        facility.step(&mut NullSink);
    }
    let crack = facility.stage(cooker).unwrap().output().cloned().unwrap();
    assert_eq!(crack.quantity, 1);
    assert_eq!(crack.quality, QualityTier::Standard);
}

#[test]
fn cooker_window_is_more_forgiving_than_the_press() {
    let cooker = TimingWindow::cooker();
    let press = TimingWindow::pill_press();
    // Ten ticks off centre.
    assert!(cooker.score(50) > press.score(40));
    assert!(cooker.score(41) >= fixed(0.9));

    let registry = builtin();
    let (mut facility, id) = cooker_with(&registry, 5, true);
    assert!(facility.start_session(id, COOK));
    for _ in 0..50 {
        facility.step(&mut NullSink);
    }
    let score = facility.press(id).unwrap();
    assert_eq!(score, cooker.score(50));
    let crack = facility.stage(id).unwrap().output().cloned().unwrap();
    assert_eq!(crack.quantity, 4);
    assert!(crack.quality >= QualityTier::Good);
}

#[test]
fn no_cook_without_soda() {
    let registry = builtin();
    let (mut facility, cooker) = cooker_with(&registry, 10, false);
    assert!(!facility.start_session(cooker, COOK));
    assert!(facility.press(cooker).is_none());
    for _ in 0..100 {
        facility.step(&mut NullSink);
    }
    let stage = facility.stage(cooker).unwrap();
    assert!(stage.output().is_none());
    assert_eq!(stage.state().input_count, 10);
}
