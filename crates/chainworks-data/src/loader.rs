//! Resolution pipeline: reads data files, resolves names, fills a registry.
//!
//! Provides format detection (RON/JSON/TOML), file discovery and
//! deserialization helpers, and [`load_content`], which reads `items`,
//! `recipes` and `pipelines` from a directory into a core
//! [`RegistryBuilder`].

use crate::schema::*;
use chainworks_core::dosage::DosageProfile;
use chainworks_core::fixed::{Fixed64, try_f64_to_fixed64};
use chainworks_core::fuel::FuelProfile;
use chainworks_core::id::{ItemTypeId, PipelineId, RecipeId};
use chainworks_core::quality::{QualityTier, ScoreThresholds};
use chainworks_core::recipe::{
    AcceptedInput, BatchChance, BatchStart, InputRule, QualityRule, Reagent, ReagentUsage,
    RecipeDefinition, YieldRule,
};
use chainworks_core::registry::{Registry, RegistryBuilder, RegistryError};
use chainworks_core::thermal::{HeatProfile, HeatQuality};
use chainworks_core::timing::TimingWindow;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Everything that can go wrong turning a content directory into a registry.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("{dir} has no {file} file in any supported format")]
    MissingRequired { file: String, dir: PathBuf },

    /// Only `.ron`, `.json` and `.toml` are read.
    #[error("{file} is not ron, json or toml")]
    UnsupportedFormat { file: PathBuf },

    /// The same table exists in two formats, so neither wins.
    #[error("both {a} and {b} exist")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("{file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("{file} names {expected_kind} '{name}', which is not defined")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("{file} defines '{name}' twice")]
    DuplicateName { file: PathBuf, name: String },

    /// A recorded value is outside what the field allows.
    #[error("invalid value for {field} in {file}: {detail}")]
    InvalidValue {
        file: PathBuf,
        field: &'static str,
        detail: String,
    },

    /// The resolved content failed registry validation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Find `{base_name}.ron`, `.toml` or `.json` in `dir`.
///
/// Returns `Ok(None)` if none exists and `ConflictingFormats` if more than
/// one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if !candidate.exists() {
            continue;
        }
        if let Some(existing) = found.take() {
            return Err(DataLoadError::ConflictingFormats {
                a: existing,
                b: candidate,
            });
        }
        found = Some(candidate);
    }
    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, e: impl std::fmt::Display) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list. TOML has no top-level arrays, so a TOML file holds
/// the list under `toml_key`; RON and JSON files are the list itself.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }
    let content = std::fs::read_to_string(path)?;
    let mut table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
    let array = table
        .remove(toml_key)
        .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?;
    array
        .try_into()
        .map_err(|e: toml::de::Error| parse_error(path, e))
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name, returning `UnresolvedRef` if it is not there.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Fail with `DuplicateName` if `name` is already in the map.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        return Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        });
    }
    Ok(())
}

// ===========================================================================
// Content loading
// ===========================================================================

/// Everything read from a content directory, not yet frozen.
#[derive(Debug, Default)]
pub struct Content {
    pub builder: RegistryBuilder,
    pub items: HashMap<String, ItemTypeId>,
    pub recipes: HashMap<String, RecipeId>,
    pub pipelines: HashMap<String, PipelineId>,
}

impl Content {
    /// Validate and freeze the registry.
    pub fn build(self) -> Result<Registry, DataLoadError> {
        Ok(self.builder.build()?)
    }
}

/// Load `items` (required), `recipes` (required) and `pipelines`
/// (optional) from `dir`.
pub fn load_content(dir: &Path) -> Result<Content, DataLoadError> {
    let mut content = Content::default();

    let items_path = require_data_file(dir, "items")?;
    let items: Vec<ItemData> = deserialize_list(&items_path, "items")?;
    for item in &items {
        check_duplicate(&content.items, &item.name, &items_path)?;
        let id = content.builder.register_item(&item.name);
        content.items.insert(item.name.clone(), id);
    }

    let recipes_path = require_data_file(dir, "recipes")?;
    let recipes: Vec<RecipeData> = deserialize_list(&recipes_path, "recipes")?;
    for data in &recipes {
        check_duplicate(&content.recipes, &data.name, &recipes_path)?;
        let recipe = resolve_recipe(data, &content.items, &recipes_path)?;
        let id = content.builder.register_recipe(recipe);
        content.recipes.insert(data.name.clone(), id);
    }

    if let Some(pipelines_path) = find_data_file(dir, "pipelines")? {
        let pipelines: Vec<PipelineData> = deserialize_list(&pipelines_path, "pipelines")?;
        for data in &pipelines {
            check_duplicate(&content.pipelines, &data.name, &pipelines_path)?;
            let stages = data
                .stages
                .iter()
                .map(|name| resolve_name(&content.recipes, name, &pipelines_path, "recipe").copied())
                .collect::<Result<Vec<_>, _>>()?;
            let id = content.builder.register_pipeline(&data.name, stages);
            content.pipelines.insert(data.name.clone(), id);
        }
    }

    tracing::debug!(
        dir = %dir.display(),
        items = content.items.len(),
        recipes = content.recipes.len(),
        pipelines = content.pipelines.len(),
        "content loaded"
    );
    Ok(content)
}

// ===========================================================================
// Recipe resolution
// ===========================================================================

fn resolve_recipe(
    data: &RecipeData,
    items: &HashMap<String, ItemTypeId>,
    file: &Path,
) -> Result<RecipeDefinition, DataLoadError> {
    let item = |name: &str| resolve_name(items, name, file, "item").copied();
    let accepts = |list: &[AcceptData]| -> Result<Vec<AcceptedInput>, DataLoadError> {
        list.iter()
            .map(|a| {
                Ok(AcceptedInput::with_bonus(
                    item(a.item())?,
                    number(a.bonus(), "bonus", file)?,
                ))
            })
            .collect()
    };

    let inputs = match &data.inputs {
        InputData::Single { accepts: list } => InputRule::Single {
            accepts: accepts(list)?,
        },
        InputData::Pooled {
            accepts: list,
            capacity,
            start,
            reagent,
        } => InputRule::Pooled {
            accepts: accepts(list)?,
            capacity: *capacity,
            start: match start {
                StartData::OnFirstUnit => BatchStart::OnFirstUnit,
                StartData::WhenFull => BatchStart::WhenFull,
                StartData::Manual => BatchStart::Manual,
                StartData::Trigger { item: name } => BatchStart::Trigger(item(name)?),
            },
            reagent: match reagent {
                Some(r) => Some(Reagent {
                    item_type: item(&r.item)?,
                    capacity: r.capacity,
                    usage: match r.usage {
                        UsageData::PerUnit => ReagentUsage::PerUnit,
                        UsageData::PerBatch => ReagentUsage::PerBatch,
                    },
                }),
                None => None,
            },
        },
        InputData::Ordered { slots } => InputRule::Ordered {
            slots: slots
                .iter()
                .map(|slot| accepts(slot))
                .collect::<Result<_, _>>()?,
        },
    };

    let output = item(&data.output)?;
    let mut recipe = match &data.activation {
        ActivationData::Timed { duration } => {
            RecipeDefinition::timed(&data.name, inputs, *duration, output)
        }
        ActivationData::Minigame { window } => {
            RecipeDefinition::minigame(&data.name, inputs, resolve_window(window), output)
        }
    };

    recipe.yield_rule = match data.yield_rule {
        YieldData::Single => YieldRule::PerUnit(1),
        YieldData::PerUnit { per_unit } => YieldRule::PerUnit(per_unit),
        YieldData::Fraction {
            numerator,
            denominator,
        } => YieldRule::Fraction {
            numerator,
            denominator,
        },
        YieldData::Charges => YieldRule::Charges,
    };
    if let Some(rule) = resolve_quality(&data.quality, file)? {
        recipe.quality = rule;
    }

    recipe.dosage = data.dosage.as_ref().map(|d| DosageProfile {
        min_ug: d.min_ug,
        max_ug: d.max_ug,
        base_charges: d.base_charges,
        ug_per_charge: d.ug_per_charge,
    });
    recipe.heat = match &data.heat {
        Some(h) => Some(HeatProfile {
            ambient: number(h.ambient, "ambient", file)?,
            optimal_min: number(h.optimal_min, "optimal_min", file)?,
            optimal_max: number(h.optimal_max, "optimal_max", file)?,
            danger_max: number(h.danger_max, "danger_max", file)?,
            critical: number(h.critical, "critical", file)?,
            rise_per_tick: number(h.rise_per_tick, "rise_per_tick", file)?,
            fall_per_tick: number(h.fall_per_tick, "fall_per_tick", file)?,
            process_heat: number(h.process_heat, "process_heat", file)?,
            cooldown_after_batch: number(h.cooldown_after_batch, "cooldown_after_batch", file)?,
        }),
        None => None,
    };
    recipe.fuel = data.fuel.as_ref().map(|f| FuelProfile {
        capacity: f.capacity,
        ticks_per_unit: f.ticks_per_unit,
        price_per_unit: f.price_per_unit,
    });
    recipe.cosmetics = data.cosmetics;
    Ok(recipe)
}

fn resolve_window(window: &WindowData) -> TimingWindow {
    match *window {
        WindowData::PillPress => TimingWindow::pill_press(),
        WindowData::Cooker => TimingWindow::cooker(),
        WindowData::Custom {
            cycle_length,
            good_start,
            good_end,
            perfect_start,
            perfect_end,
        } => TimingWindow {
            cycle_length,
            good_start,
            good_end,
            perfect_start,
            perfect_end,
            ..TimingWindow::pill_press()
        },
    }
}

/// Content numbers must fit the simulation's fixed-point range.
fn number(value: f64, field: &str, file: &Path) -> Result<Fixed64, DataLoadError> {
    try_f64_to_fixed64(value).ok_or_else(|| DataLoadError::Parse {
        file: file.to_path_buf(),
        detail: format!("{field} = {value} is out of range"),
    })
}

fn tier(name: &str, file: &Path) -> Result<QualityTier, DataLoadError> {
    QualityTier::parse(name).ok_or_else(|| DataLoadError::InvalidValue {
        file: file.to_path_buf(),
        field: "quality tier",
        detail: format!("unknown tier '{name}'"),
    })
}

/// `None` keeps the recipe's preset rule.
fn resolve_quality(data: &QualityData, file: &Path) -> Result<Option<QualityRule>, DataLoadError> {
    let rule = match data {
        QualityData::Preset => return Ok(None),
        QualityData::Inherit => QualityRule::Inherit,
        QualityData::Fixed { tier: name } => QualityRule::Fixed(tier(name, file)?),
        QualityData::UpgradeChance { chance } => QualityRule::UpgradeChance {
            chance: number(*chance, "chance", file)?,
        },
        QualityData::RollFromBase { base, chance } => QualityRule::RollFromBase {
            base: tier(base, file)?,
            chance: number(*chance, "chance", file)?,
        },
        QualityData::BatchSize { steps, fallback } => {
            let mut rule = QualityRule::batch_size_default();
            if let QualityRule::BatchSize {
                steps: stock_steps,
                fallback: stock_fallback,
            } = &mut rule
            {
                if let Some(list) = steps {
                    *stock_steps = list
                        .iter()
                        .map(|s| {
                            Ok(BatchChance {
                                above: s.above,
                                chance: number(s.chance, "chance", file)?,
                            })
                        })
                        .collect::<Result<_, DataLoadError>>()?;
                }
                if let Some(v) = fallback {
                    *stock_fallback = number(*v, "fallback", file)?;
                }
            }
            rule
        }
        QualityData::Timing {
            good,
            very_good,
            legendary,
        } => QualityRule::Timing {
            thresholds: ScoreThresholds {
                good: number(*good, "good", file)?,
                very_good: number(*very_good, "very_good", file)?,
                legendary: number(*legendary, "legendary", file)?,
            },
        },
        QualityData::Heat => QualityRule::Heat(HeatQuality::default()),
    };
    Ok(Some(rule))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chainworks_core::fixed::f64_to_fixed64;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "chainworks_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("items.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("items.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("items.json")).unwrap(), Format::Json);
        assert!(matches!(
            detect_format(Path::new("items.yaml")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            detect_format(Path::new("items")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn find_data_file_cases() {
        let dir = make_test_dir("find");
        assert_eq!(find_data_file(&dir, "items").unwrap(), None);
        assert!(matches!(
            require_data_file(&dir, "items"),
            Err(DataLoadError::MissingRequired { .. })
        ));

        fs::write(dir.join("items.json"), "[]").unwrap();
        assert_eq!(
            find_data_file(&dir, "items").unwrap(),
            Some(dir.join("items.json"))
        );

        fs::write(dir.join("items.ron"), "[]").unwrap();
        assert!(matches!(
            find_data_file(&dir, "items"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn deserialize_list_reads_all_formats() {
        let dir = make_test_dir("list");
        let ron_path = dir.join("a.ron");
        fs::write(&ron_path, r#"[(name: "cherry"), (name: "bean")]"#).unwrap();
        let json_path = dir.join("b.json");
        fs::write(&json_path, r#"[{"name": "cherry"}, {"name": "bean"}]"#).unwrap();
        let toml_path = dir.join("c.toml");
        fs::write(
            &toml_path,
            "[[items]]\nname = \"cherry\"\n\n[[items]]\nname = \"bean\"\n",
        )
        .unwrap();

        for path in [&ron_path, &json_path, &toml_path] {
            let items: Vec<ItemData> = deserialize_list(path, "items").unwrap();
            assert_eq!(items.len(), 2);
            assert_eq!(items[1].name, "bean");
        }

        let missing_key = dir.join("d.toml");
        fs::write(&missing_key, r#"foo = "bar""#).unwrap();
        let result: Result<Vec<ItemData>, _> = deserialize_list(&missing_key, "items");
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));

        let bad = dir.join("e.ron");
        fs::write(&bad, "this is not valid RON {{{").unwrap();
        let result: Result<Vec<ItemData>, _> = deserialize_list(&bad, "items");
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));
        cleanup(&dir);
    }

    #[test]
    fn resolve_and_duplicate_checks() {
        let mut map = HashMap::new();
        map.insert("cherry".to_string(), 4u32);
        let file = Path::new("items.ron");
        assert_eq!(*resolve_name(&map, "cherry", file, "item").unwrap(), 4);
        assert!(matches!(
            resolve_name(&map, "plum", file, "item"),
            Err(DataLoadError::UnresolvedRef { ref name, expected_kind: "item", .. }) if name == "plum"
        ));
        assert!(check_duplicate(&map, "plum", file).is_ok());
        assert!(matches!(
            check_duplicate(&map, "cherry", file),
            Err(DataLoadError::DuplicateName { ref name, .. }) if name == "cherry"
        ));
    }

    // -----------------------------------------------------------------------
    // load_content
    // -----------------------------------------------------------------------

    const ITEMS_JSON: &str = r#"[{"name": "cherry"}, {"name": "bean"}, {"name": "go"}]"#;

    #[test]
    fn load_minimal_content() {
        let dir = make_test_dir("minimal");
        fs::write(dir.join("items.json"), ITEMS_JSON).unwrap();
        fs::write(
            dir.join("recipes.json"),
            r#"[{
                "name": "wash",
                "output": "bean",
                "inputs": {"kind": "pooled", "accepts": ["cherry"], "capacity": 4,
                           "start": {"kind": "trigger", "item": "go"}},
                "activation": {"kind": "timed", "duration": 10},
                "yield": {"kind": "fraction", "numerator": 1, "denominator": 2},
                "quality": {"kind": "batch_size", "fallback": 0.05}
            }]"#,
        )
        .unwrap();

        let content = load_content(&dir).unwrap();
        assert_eq!(content.items.len(), 3);
        assert!(content.pipelines.is_empty());
        let go = content.items["go"];
        let registry = content.build().unwrap();
        let wash = registry.recipe(registry.recipe_id("wash").unwrap()).unwrap();
        assert_eq!(wash.batch_start(), BatchStart::Trigger(go));
        assert_eq!(wash.batch_yield(4, None), 2);
        match &wash.quality {
            QualityRule::BatchSize { steps, fallback } => {
                assert_eq!(steps.len(), 2);
                assert_eq!(*fallback, f64_to_fixed64(0.05));
            }
            other => panic!("expected batch-size rule, got {other:?}"),
        }
        cleanup(&dir);
    }

    #[test]
    fn unresolved_item_is_reported() {
        let dir = make_test_dir("unresolved");
        fs::write(dir.join("items.json"), ITEMS_JSON).unwrap();
        fs::write(
            dir.join("recipes.json"),
            r#"[{
                "name": "wash",
                "output": "plum",
                "inputs": {"kind": "single", "accepts": ["cherry"]},
                "activation": {"kind": "timed", "duration": 10}
            }]"#,
        )
        .unwrap();
        assert!(matches!(
            load_content(&dir),
            Err(DataLoadError::UnresolvedRef { ref name, expected_kind: "item", .. }) if name == "plum"
        ));
        cleanup(&dir);
    }

    #[test]
    fn duplicate_item_is_reported() {
        let dir = make_test_dir("dup");
        fs::write(dir.join("items.json"), r#"[{"name": "a"}, {"name": "a"}]"#).unwrap();
        fs::write(dir.join("recipes.json"), "[]").unwrap();
        assert!(matches!(
            load_content(&dir),
            Err(DataLoadError::DuplicateName { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn unknown_tier_is_reported() {
        let dir = make_test_dir("tier");
        fs::write(dir.join("items.json"), ITEMS_JSON).unwrap();
        fs::write(
            dir.join("recipes.json"),
            r#"[{
                "name": "wash",
                "output": "bean",
                "inputs": {"kind": "single", "accepts": ["cherry"]},
                "activation": {"kind": "timed", "duration": 10},
                "quality": {"kind": "fixed", "tier": "SHINY"}
            }]"#,
        )
        .unwrap();
        assert!(matches!(
            load_content(&dir),
            Err(DataLoadError::InvalidValue { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn invalid_content_fails_at_build() {
        let dir = make_test_dir("invalid");
        fs::write(dir.join("items.json"), ITEMS_JSON).unwrap();
        fs::write(
            dir.join("recipes.json"),
            r#"[{
                "name": "wash",
                "output": "bean",
                "inputs": {"kind": "single", "accepts": ["cherry"]},
                "activation": {"kind": "timed", "duration": 0}
            }]"#,
        )
        .unwrap();
        let content = load_content(&dir).unwrap();
        assert!(matches!(
            content.build(),
            Err(DataLoadError::Registry(RegistryError::InvalidRecipe { .. }))
        ));
        cleanup(&dir);
    }

    #[test]
    fn out_of_range_numbers_are_parse_errors() {
        let dir = make_test_dir("range");
        fs::write(dir.join("items.json"), ITEMS_JSON).unwrap();
        fs::write(
            dir.join("recipes.json"),
            r#"[{
                "name": "wash",
                "output": "bean",
                "inputs": {"kind": "single", "accepts": ["cherry"]},
                "activation": {"kind": "timed", "duration": 10},
                "quality": {"kind": "upgrade_chance", "chance": 1e30}
            }]"#,
        )
        .unwrap();
        assert!(matches!(
            load_content(&dir),
            Err(DataLoadError::Parse { ref detail, .. }) if detail.contains("chance")
        ));

        fs::write(
            dir.join("recipes.json"),
            r#"[{
                "name": "wash",
                "output": "bean",
                "inputs": {"kind": "single", "accepts": [{"item": "cherry", "bonus": -1e15}]},
                "activation": {"kind": "timed", "duration": 10}
            }]"#,
        )
        .unwrap();
        assert!(matches!(
            load_content(&dir),
            Err(DataLoadError::Parse { ref detail, .. }) if detail.contains("bonus")
        ));
        cleanup(&dir);
    }

    const ITEMS_RON: &str = r#"[(name: "cherry"), (name: "bean"), (name: "go"), (name: "bag"), (name: "bagged")]"#;
    const RECIPES_RON: &str = r#"[
        (
            name: "wash",
            output: "bean",
            inputs: (kind: "pooled", accepts: ["cherry"], capacity: 4,
                     start: (kind: "trigger", item: "go")),
            activation: (kind: "timed", duration: 10),
            yield: (kind: "fraction", numerator: 1, denominator: 2),
        ),
        (
            name: "pack",
            output: "bagged",
            inputs: (kind: "pooled", accepts: [(item: "bean", bonus: 0.25)], capacity: 6,
                     reagent: (item: "bag", capacity: 1, usage: "per_batch")),
            activation: (kind: "minigame", window: (kind: "custom", cycle_length: 40,
                         good_start: 10, good_end: 30, perfect_start: 15, perfect_end: 25)),
            quality: (kind: "roll_from_base", base: "GOOD", chance: 0.5),
            cosmetics: true,
        ),
    ]"#;
    const PIPELINES_RON: &str = r#"[(name: "line", stages: ["wash", "pack"])]"#;

    const ITEMS_TOML: &str = r#"
        items = [{ name = "cherry" }, { name = "bean" }, { name = "go" }, { name = "bag" }, { name = "bagged" }]
    "#;
    const RECIPES_TOML: &str = r#"
        [[recipes]]
        name = "wash"
        output = "bean"
        inputs = { kind = "pooled", accepts = ["cherry"], capacity = 4, start = { kind = "trigger", item = "go" } }
        activation = { kind = "timed", duration = 10 }
        yield = { kind = "fraction", numerator = 1, denominator = 2 }

        [[recipes]]
        name = "pack"
        output = "bagged"
        cosmetics = true
        activation = { kind = "minigame", window = { kind = "custom", cycle_length = 40, good_start = 10, good_end = 30, perfect_start = 15, perfect_end = 25 } }
        quality = { kind = "roll_from_base", base = "GOOD", chance = 0.5 }

        [recipes.inputs]
        kind = "pooled"
        accepts = [{ item = "bean", bonus = 0.25 }]
        capacity = 6
        reagent = { item = "bag", capacity = 1, usage = "per_batch" }
    "#;
    const PIPELINES_TOML: &str = r#"
        [[pipelines]]
        name = "line"
        stages = ["wash", "pack"]
    "#;

    const RECIPES_JSON: &str = r#"[
        {
            "name": "wash",
            "output": "bean",
            "inputs": {"kind": "pooled", "accepts": ["cherry"], "capacity": 4,
                       "start": {"kind": "trigger", "item": "go"}},
            "activation": {"kind": "timed", "duration": 10},
            "yield": {"kind": "fraction", "numerator": 1, "denominator": 2}
        },
        {
            "name": "pack",
            "output": "bagged",
            "inputs": {"kind": "pooled", "accepts": [{"item": "bean", "bonus": 0.25}], "capacity": 6,
                       "reagent": {"item": "bag", "capacity": 1, "usage": "per_batch"}},
            "activation": {"kind": "minigame", "window": {"kind": "custom", "cycle_length": 40,
                           "good_start": 10, "good_end": 30, "perfect_start": 15, "perfect_end": 25}},
            "quality": {"kind": "roll_from_base", "base": "GOOD", "chance": 0.5},
            "cosmetics": true
        }
    ]"#;

    fn load_registry(suffix: &str, ext: &str, files: [&str; 3]) -> Registry {
        let dir = make_test_dir(suffix);
        for (base, text) in ["items", "recipes", "pipelines"].iter().zip(files) {
            fs::write(dir.join(format!("{base}.{ext}")), text).unwrap();
        }
        let registry = load_content(&dir).unwrap().build().unwrap();
        cleanup(&dir);
        registry
    }

    #[test]
    fn same_content_in_every_format() {
        let ron = load_registry("fmt_ron", "ron", [ITEMS_RON, RECIPES_RON, PIPELINES_RON]);
        let json = load_registry(
            "fmt_json",
            "json",
            [
                r#"[{"name": "cherry"}, {"name": "bean"}, {"name": "go"}, {"name": "bag"}, {"name": "bagged"}]"#,
                RECIPES_JSON,
                r#"[{"name": "line", "stages": ["wash", "pack"]}]"#,
            ],
        );
        let toml = load_registry("fmt_toml", "toml", [ITEMS_TOML, RECIPES_TOML, PIPELINES_TOML]);

        for other in [&json, &toml] {
            assert_eq!(other.item_count(), ron.item_count());
            assert_eq!(other.recipe_count(), ron.recipe_count());
            for name in ["wash", "pack"] {
                let a = ron.recipe(ron.recipe_id(name).unwrap()).unwrap();
                let b = other.recipe(other.recipe_id(name).unwrap()).unwrap();
                assert_eq!(a, b, "recipe {name} differs between formats");
            }
            let line = other.pipeline_id("line").unwrap();
            assert_eq!(other.pipeline_stages(line), ron.pipeline_stages(ron.pipeline_id("line").unwrap()));
        }

        let pack = ron.recipe(ron.recipe_id("pack").unwrap()).unwrap();
        assert!(pack.is_minigame());
        assert!(pack.cosmetics);
        assert_eq!(pack.timing_window().map(|w| w.cycle_length), Some(40));
        assert_eq!(
            pack.reagent().map(|r| r.usage),
            Some(ReagentUsage::PerBatch)
        );
        assert_eq!(
            pack.quality,
            QualityRule::RollFromBase {
                base: QualityTier::Good,
                chance: f64_to_fixed64(0.5),
            }
        );
    }

    #[test]
    fn pipeline_with_unknown_stage_is_reported() {
        let dir = make_test_dir("pipeline");
        fs::write(dir.join("items.json"), ITEMS_JSON).unwrap();
        fs::write(dir.join("recipes.json"), "[]").unwrap();
        fs::write(
            dir.join("pipelines.json"),
            r#"[{"name": "line", "stages": ["wash"]}]"#,
        )
        .unwrap();
        assert!(matches!(
            load_content(&dir),
            Err(DataLoadError::UnresolvedRef { expected_kind: "recipe", .. })
        ));
        cleanup(&dir);
    }
}
