//! Headless roasting chain: wet processing -> drying tray -> roaster ->
//! packaging table.

use std::sync::Arc;

use chainworks_core::catalog::{self, BuiltinChains, items};
use chainworks_core::event::{ActivitySink, StageEvent};
use chainworks_core::facility::Facility;
use chainworks_core::id::{ItemTypeId, StageId};
use chainworks_core::item::ItemUnit;
use chainworks_core::quality::QualityTier;
use chainworks_core::registry::{Registry, RegistryBuilder};
use chainworks_core::stage::{AddInputOutcome, Phase};
use chainworks_core::test_utils::RecordingSink;

fn builtin() -> (Arc<Registry>, BuiltinChains) {
    let mut b = RegistryBuilder::new();
    let chains = catalog::register_builtin(&mut b);
    (Arc::new(b.build().unwrap()), chains)
}

fn item(registry: &Registry, name: &str) -> ItemTypeId {
    registry.item_id(name).unwrap()
}

fn run_until_ready(
    facility: &mut Facility,
    id: StageId,
    sink: &mut dyn ActivitySink,
    limit: u32,
) -> u32 {
    for n in 1..=limit {
        facility.step(sink);
        if facility.stage(id).unwrap().output().is_some() {
            return n;
        }
    }
    panic!("stage did not finish within {limit} steps");
}

#[test]
fn roasting_chain_end_to_end() {
    let (registry, chains) = builtin();
    let mut facility = Facility::new(Arc::clone(&registry), 7);
    let mut sink = RecordingSink::default();
    let [washer, tray, roaster, packer]: [StageId; 4] = facility
        .place_pipeline(chains.roasting)
        .unwrap()
        .try_into()
        .unwrap();

    // Wet processing waits for a full load.
    let cherry = ItemUnit::standard(item(&registry, items::COFFEE_CHERRY));
    let stage = facility.stage_mut(washer).unwrap();
    for _ in 0..15 {
        assert!(stage.add_input(cherry).is_accepted());
    }
    assert_eq!(stage.phase(), Phase::Filling);
    assert!(stage.add_input(cherry).is_accepted());
    assert_eq!(stage.phase(), Phase::Processing);
    assert_eq!(stage.add_input(cherry), AddInputOutcome::RejectedFull);
    assert_eq!(run_until_ready(&mut facility, washer, &mut sink, 1_000), 400);
    assert_eq!(sink.for_stage(washer), vec![true, false]);

    // The tray holds ten; the other six wait in the washer.
    assert_eq!(facility.transfer(washer, tray).unwrap(), 10);
    assert_eq!(facility.stage(washer).unwrap().output().unwrap().quantity, 6);
    assert!(facility.stage(tray).unwrap().is_active());
    assert_eq!(run_until_ready(&mut facility, tray, &mut sink, 2_000), 1200);
    let green = facility.stage(tray).unwrap().output().cloned().unwrap();
    assert_eq!(green.item_type, item(&registry, items::GREEN_BEANS));
    assert_eq!(green.quantity, 10);
    assert!(green.quality <= QualityTier::Good);

    // Roaster: loads stay idle until the start item arrives.
    let roast_start = ItemUnit::standard(item(&registry, items::ROAST_START));
    assert_eq!(
        facility.stage_mut(roaster).unwrap().add_input(roast_start),
        AddInputOutcome::RejectedWrongType
    );
    assert_eq!(facility.transfer(tray, roaster).unwrap(), 10);
    let stage = facility.stage_mut(roaster).unwrap();
    assert!(!stage.is_active());
    assert!(stage.add_input(roast_start).is_accepted());
    assert!(stage.is_active());
    assert_eq!(stage.state().input_count, 10);
    assert_eq!(
        stage.add_input(ItemUnit::new(green.item_type, green.quality)),
        AddInputOutcome::RejectedFull
    );
    assert_eq!(run_until_ready(&mut facility, roaster, &mut sink, 1_000), 600);
    let roasted = facility.stage(roaster).unwrap().output().cloned().unwrap();
    assert_eq!(roasted.quantity, 10);
    assert!(roasted.quality >= green.quality);

    // Packaging: one bag per unit, loaded before the beans.
    let bag = ItemUnit::standard(item(&registry, items::COFFEE_BAG));
    let stage = facility.stage_mut(packer).unwrap();
    for _ in 0..16 {
        assert!(stage.add_input(bag).is_accepted());
    }
    assert_eq!(stage.add_input(bag), AddInputOutcome::RejectedFull);
    assert!(!stage.is_active());
    assert_eq!(facility.transfer(roaster, packer).unwrap(), 10);
    assert_eq!(run_until_ready(&mut facility, packer, &mut sink, 1_000), 100);
    let packaged = facility.stage_mut(packer).unwrap().extract_output().unwrap();
    assert_eq!(packaged.item_type, item(&registry, items::PACKAGED_COFFEE));
    assert_eq!(packaged.quantity, 10);
    assert_eq!(packaged.quality, roasted.quality);
    assert_eq!(facility.stage(packer).unwrap().state().reagent_count, 0);

    // The leftover washed beans make a second, smaller tray batch.
    assert_eq!(facility.transfer(washer, tray).unwrap(), 6);
    assert!(facility.stage(washer).unwrap().output().is_none());
    run_until_ready(&mut facility, tray, &mut sink, 2_000);
    assert_eq!(facility.stage(tray).unwrap().output().unwrap().quantity, 6);
    assert_eq!(sink.for_stage(tray), vec![true, false, true, false]);
}

#[test]
fn packaging_without_bags_waits() {
    let (registry, _) = builtin();
    let mut facility = Facility::new(Arc::clone(&registry), 9);
    let packer = facility
        .place(registry.recipe_id("packaging_table").unwrap())
        .unwrap();
    let beans = ItemUnit::standard(item(&registry, items::ROASTED_BEANS));
    let stage = facility.stage_mut(packer).unwrap();
    for _ in 0..4 {
        assert!(stage.add_input(beans).is_accepted());
    }
    assert!(!stage.is_active());

    // The first bag makes the batch startable; it starts with one bag.
    assert!(
        stage
            .add_input(ItemUnit::standard(item(&registry, items::COFFEE_BAG)))
            .is_accepted()
    );
    assert!(stage.is_active());

    let mut completed = None;
    for _ in 0..100 {
        let report = facility.step(&mut RecordingSink::default());
        if let Some(StageEvent::BatchCompleted { output, .. }) = report.completions().next() {
            completed = Some(output.clone());
        }
    }
    let output = completed.expect("packaging finishes in 100 ticks");
    assert_eq!(output.quantity, 1);
    assert_eq!(facility.stage(packer).unwrap().state().input_count, 0);
}
