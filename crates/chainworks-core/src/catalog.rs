//! Built-in product chains.
//!
//! [`register_builtin`] adds the stock items, recipes and pipelines to a
//! [`RegistryBuilder`]. Every chain is plain recipe data over the same
//! [`ProcessingStage`](crate::stage::ProcessingStage) machine; nothing here
//! has behaviour of its own. Hosts may register more content alongside, or
//! adjust a stock recipe with [`RegistryBuilder::mutate_recipe`] before
//! building.

use crate::dosage::DosageProfile;
use crate::fixed::Fixed64;
use crate::fuel::FuelProfile;
use crate::id::{ItemTypeId, PipelineId};
use crate::quality::QualityTier;
use crate::recipe::{
    AcceptedInput, BatchStart, InputRule, QualityRule, Reagent, ReagentUsage, RecipeDefinition,
    YieldRule,
};
use crate::registry::RegistryBuilder;
use crate::thermal::{HeatProfile, HeatQuality};
use crate::timing::TimingWindow;

/// Item names used by the built-in chains.
pub mod items {
    pub const EPHEDRINE: &str = "ephedrine";
    pub const PSEUDOEPHEDRINE: &str = "pseudoephedrine";
    pub const RED_PHOSPHORUS: &str = "red_phosphorus";
    pub const IODINE: &str = "iodine";
    pub const METH_PASTE: &str = "meth_paste";
    pub const RAW_METH: &str = "raw_meth";
    pub const WET_CRYSTAL: &str = "wet_crystal";
    pub const CRYSTAL_METH: &str = "crystal_meth";

    pub const COFFEE_CHERRY: &str = "coffee_cherry";
    pub const WET_BEANS: &str = "wet_beans";
    pub const GREEN_BEANS: &str = "green_beans";
    pub const ROASTED_BEANS: &str = "roasted_beans";
    pub const ROAST_START: &str = "roast_start";
    pub const COFFEE_BAG: &str = "coffee_bag";
    pub const PACKAGED_COFFEE: &str = "packaged_coffee";

    pub const ERGOT: &str = "ergot";
    pub const ERGOT_CULTURE: &str = "ergot_culture";
    pub const LYSERGIC_EXTRACT: &str = "lysergic_extract";
    pub const DOSED_SOLUTION: &str = "dosed_solution";
    pub const BLOTTER: &str = "blotter";

    pub const BINDER: &str = "binder";
    pub const PILL: &str = "pill";

    pub const COCA_PASTE: &str = "coca_paste";
    pub const BAKING_SODA: &str = "baking_soda";
    pub const CRACK: &str = "crack";

    /// Every built-in item, in registration order.
    pub const ALL: [&str; 25] = [
        EPHEDRINE,
        PSEUDOEPHEDRINE,
        RED_PHOSPHORUS,
        IODINE,
        METH_PASTE,
        RAW_METH,
        WET_CRYSTAL,
        CRYSTAL_METH,
        COFFEE_CHERRY,
        WET_BEANS,
        GREEN_BEANS,
        ROASTED_BEANS,
        ROAST_START,
        COFFEE_BAG,
        PACKAGED_COFFEE,
        ERGOT,
        ERGOT_CULTURE,
        LYSERGIC_EXTRACT,
        DOSED_SOLUTION,
        BLOTTER,
        BINDER,
        PILL,
        COCA_PASTE,
        BAKING_SODA,
        CRACK,
    ];
}

/// Pipeline ids of the built-in chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinChains {
    pub synthesis: PipelineId,
    pub roasting: PipelineId,
    pub hallucinogen: PipelineId,
    pub tablet: PipelineId,
    pub cooker: PipelineId,
}

fn pooled(accepts: ItemTypeId, capacity: u32, start: BatchStart) -> InputRule {
    InputRule::Pooled {
        accepts: vec![AcceptedInput::plain(accepts)],
        capacity,
        start,
        reagent: None,
    }
}

fn pooled_with(accepts: ItemTypeId, capacity: u32, reagent: Reagent) -> InputRule {
    InputRule::Pooled {
        accepts: vec![AcceptedInput::plain(accepts)],
        capacity,
        start: BatchStart::Manual,
        reagent: Some(reagent),
    }
}

fn single(accepts: ItemTypeId) -> InputRule {
    InputRule::Single {
        accepts: vec![AcceptedInput::plain(accepts)],
    }
}

fn upgrade(chance: f64) -> QualityRule {
    QualityRule::UpgradeChance {
        chance: Fixed64::from_num(chance),
    }
}

/// Register every built-in item, recipe and pipeline.
pub fn register_builtin(b: &mut RegistryBuilder) -> BuiltinChains {
    for name in items::ALL {
        b.register_item(name);
    }

    // -- Synthesis ----------------------------------------------------------

    let ephedrine = b.register_item(items::EPHEDRINE);
    let pseudo = b.register_item(items::PSEUDOEPHEDRINE);
    let phosphorus = b.register_item(items::RED_PHOSPHORUS);
    let iodine = b.register_item(items::IODINE);
    let paste = b.register_item(items::METH_PASTE);
    let raw_meth = b.register_item(items::RAW_METH);
    let wet_crystal = b.register_item(items::WET_CRYSTAL);
    let crystal = b.register_item(items::CRYSTAL_METH);

    let mixer = b.register_recipe(
        RecipeDefinition::timed(
            "chemical_mixer",
            InputRule::Ordered {
                slots: vec![
                    vec![
                        AcceptedInput::plain(ephedrine),
                        AcceptedInput::with_bonus(pseudo, Fixed64::from_num(0.1)),
                    ],
                    vec![AcceptedInput::plain(phosphorus)],
                    vec![AcceptedInput::plain(iodine)],
                ],
            },
            600,
            paste,
        )
        .with_quality(QualityRule::RollFromBase {
            base: QualityTier::Standard,
            chance: Fixed64::from_num(0.25),
        }),
    );
    let kettle = b.register_recipe(
        RecipeDefinition::timed("reduction_kettle", single(paste), 400, raw_meth)
            .with_heat(HeatProfile::default())
            .with_quality(QualityRule::Heat(HeatQuality::default())),
    );
    let crystallizer = b.register_recipe(
        RecipeDefinition::timed(
            "crystallizer",
            pooled(raw_meth, 4, BatchStart::OnFirstUnit),
            800,
            wet_crystal,
        )
        .with_quality(upgrade(0.15)),
    );
    let dryer = b.register_recipe(RecipeDefinition::timed(
        "vacuum_dryer",
        pooled(wet_crystal, 6, BatchStart::OnFirstUnit),
        600,
        crystal,
    ));
    let synthesis = b.register_pipeline("synthesis", vec![mixer, kettle, crystallizer, dryer]);

    // -- Roasting -----------------------------------------------------------

    let cherry = b.register_item(items::COFFEE_CHERRY);
    let wet_beans = b.register_item(items::WET_BEANS);
    let green = b.register_item(items::GREEN_BEANS);
    let roasted = b.register_item(items::ROASTED_BEANS);
    let roast_start = b.register_item(items::ROAST_START);
    let bag = b.register_item(items::COFFEE_BAG);
    let packaged = b.register_item(items::PACKAGED_COFFEE);

    let washer = b.register_recipe(RecipeDefinition::timed(
        "wet_processing",
        pooled(cherry, 16, BatchStart::WhenFull),
        400,
        wet_beans,
    ));
    let tray = b.register_recipe(
        RecipeDefinition::timed(
            "drying_tray",
            pooled(wet_beans, 10, BatchStart::OnFirstUnit),
            1200,
            green,
        )
        .with_quality(QualityRule::batch_size_default()),
    );
    let roaster = b.register_recipe(
        RecipeDefinition::timed(
            "roaster",
            pooled(green, 16, BatchStart::Trigger(roast_start)),
            600,
            roasted,
        )
        .with_quality(upgrade(0.2)),
    );
    let packer = b.register_recipe(RecipeDefinition::timed(
        "packaging_table",
        InputRule::Pooled {
            accepts: vec![AcceptedInput::plain(roasted)],
            capacity: 16,
            start: BatchStart::OnFirstUnit,
            reagent: Some(Reagent {
                item_type: bag,
                capacity: 16,
                usage: ReagentUsage::PerUnit,
            }),
        },
        100,
        packaged,
    ));
    let roasting = b.register_pipeline("roasting", vec![washer, tray, roaster, packer]);

    // -- Hallucinogen -------------------------------------------------------

    let ergot = b.register_item(items::ERGOT);
    let culture = b.register_item(items::ERGOT_CULTURE);
    let extract = b.register_item(items::LYSERGIC_EXTRACT);
    let solution = b.register_item(items::DOSED_SOLUTION);
    let blotter = b.register_item(items::BLOTTER);

    let fermenter = b.register_recipe(
        RecipeDefinition::timed(
            "culture_fermenter",
            pooled(ergot, 8, BatchStart::OnFirstUnit),
            1000,
            culture,
        )
        .with_quality(QualityRule::batch_size_default()),
    );
    let vat = b.register_recipe(
        RecipeDefinition::timed("extraction_vat", single(culture), 500, extract)
            .with_fuel(FuelProfile::default())
            .with_quality(upgrade(0.2)),
    );
    let doser = b.register_recipe(
        RecipeDefinition::timed(
            "micro_doser",
            pooled(extract, 8, BatchStart::Manual),
            200,
            solution,
        )
        .with_dosage(DosageProfile::default())
        .with_yield(YieldRule::Charges),
    );
    let perforator = b.register_recipe(RecipeDefinition::timed(
        "blotter_perforator",
        pooled(solution, 16, BatchStart::OnFirstUnit),
        100,
        blotter,
    ));
    let hallucinogen = b.register_pipeline("hallucinogen", vec![fermenter, vat, doser, perforator]);

    // -- Tablet -------------------------------------------------------------

    let binder = b.register_item(items::BINDER);
    let pill = b.register_item(items::PILL);
    let press = b.register_recipe(
        RecipeDefinition::minigame(
            "pill_press",
            pooled_with(
                crystal,
                16,
                Reagent {
                    item_type: binder,
                    capacity: 16,
                    usage: ReagentUsage::PerUnit,
                },
            ),
            TimingWindow::pill_press(),
            pill,
        )
        .with_cosmetics(),
    );
    let tablet = b.register_pipeline("tablet", vec![press]);

    // -- Cooker -------------------------------------------------------------

    let coca = b.register_item(items::COCA_PASTE);
    let soda = b.register_item(items::BAKING_SODA);
    let crack = b.register_item(items::CRACK);
    let cooker_recipe = b.register_recipe(
        RecipeDefinition::minigame(
            "crack_cooker",
            pooled_with(
                coca,
                10,
                Reagent {
                    item_type: soda,
                    capacity: 1,
                    usage: ReagentUsage::PerBatch,
                },
            ),
            TimingWindow::cooker(),
            crack,
        )
        .with_yield(YieldRule::Fraction {
            numerator: 4,
            denominator: 5,
        }),
    );
    let cooker = b.register_pipeline("cooker", vec![cooker_recipe]);

    BuiltinChains {
        synthesis,
        roasting,
        hallucinogen,
        tablet,
        cooker,
    }
}
