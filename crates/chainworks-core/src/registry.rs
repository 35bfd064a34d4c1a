use crate::id::{ItemTypeId, PipelineId, RecipeId};
use crate::recipe::{Activation, BatchStart, InputRule, RecipeDefinition, YieldRule};
use std::collections::HashMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTypeDef {
    pub name: String,
}

/// An ordered chain of recipes linked only by matching item types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDef {
    pub name: String,
    pub stages: Vec<RecipeId>,
}

/// Name lookup the stage core needs when persisting records.
pub trait ItemCatalog {
    fn resolve_item_type(&self, name: &str) -> Option<ItemTypeId>;
    fn item_name(&self, id: ItemTypeId) -> Option<&str>;
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects item types, recipes and pipelines by name. Loaders may patch
/// recipes with [`mutate_recipe`](Self::mutate_recipe) before [`build`](Self::build)
/// checks cross references and freezes everything into a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    items: Vec<ItemTypeDef>,
    item_name_to_id: HashMap<String, ItemTypeId>,
    recipes: Vec<RecipeDefinition>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    pipelines: Vec<PipelineDef>,
    pipeline_name_to_id: HashMap<String, PipelineId>,
    duplicates: Vec<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns an item name. A name seen before keeps its original id.
    pub fn register_item(&mut self, name: &str) -> ItemTypeId {
        if let Some(id) = self.item_name_to_id.get(name) {
            return *id;
        }
        let id = ItemTypeId(self.items.len() as u32);
        self.items.push(ItemTypeDef {
            name: name.to_string(),
        });
        self.item_name_to_id.insert(name.to_string(), id);
        id
    }

    pub fn register_recipe(&mut self, recipe: RecipeDefinition) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        if self.recipe_name_to_id.insert(recipe.name.clone(), id).is_some() {
            self.duplicates.push(recipe.name.clone());
        }
        self.recipes.push(recipe);
        id
    }

    /// Stage order in `stages` is the order recipes are placed in.
    pub fn register_pipeline(&mut self, name: &str, stages: Vec<RecipeId>) -> PipelineId {
        let id = PipelineId(self.pipelines.len() as u32);
        if self.pipeline_name_to_id.insert(name.to_string(), id).is_some() {
            self.duplicates.push(name.to_string());
        }
        self.pipelines.push(PipelineDef {
            name: name.to_string(),
            stages,
        });
        id
    }

    /// Edits a registered recipe in place; fails for unknown names.
    pub fn mutate_recipe<F>(&mut self, name: &str, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut RecipeDefinition),
    {
        let id = self
            .recipe_name_to_id
            .get(name)
            .ok_or(RegistryError::NotFound(name.to_string()))?;
        f(&mut self.recipes[id.0 as usize]);
        Ok(())
    }

    pub fn item_id(&self, name: &str) -> Option<ItemTypeId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    pub fn get_recipe(&self, id: RecipeId) -> Option<&RecipeDefinition> {
        self.recipes.get(id.0 as usize)
    }

    /// Rejects duplicate names, dangling item or recipe ids and invalid
    /// recipe parameters.
    pub fn build(self) -> Result<Registry, RegistryError> {
        if let Some(name) = self.duplicates.first() {
            return Err(RegistryError::DuplicateName(name.clone()));
        }
        for recipe in &self.recipes {
            for item in recipe.referenced_items() {
                if item.0 as usize >= self.items.len() {
                    return Err(RegistryError::InvalidItemRef {
                        recipe: recipe.name.clone(),
                        item,
                    });
                }
            }
            validate_recipe(recipe).map_err(|reason| RegistryError::InvalidRecipe {
                recipe: recipe.name.clone(),
                reason,
            })?;
        }
        for pipeline in &self.pipelines {
            self.validate_pipeline(pipeline)?;
        }

        Ok(Registry {
            items: self.items,
            item_name_to_id: self.item_name_to_id,
            recipes: self.recipes.into_iter().map(Arc::new).collect(),
            recipe_name_to_id: self.recipe_name_to_id,
            pipelines: self.pipelines,
            pipeline_name_to_id: self.pipeline_name_to_id,
        })
    }

    fn validate_pipeline(&self, pipeline: &PipelineDef) -> Result<(), RegistryError> {
        if pipeline.stages.is_empty() {
            return Err(RegistryError::EmptyPipeline(pipeline.name.clone()));
        }
        let mut previous: Option<&RecipeDefinition> = None;
        for id in &pipeline.stages {
            let recipe = self
                .recipes
                .get(id.0 as usize)
                .ok_or(RegistryError::InvalidRecipeRef(*id))?;
            if let Some(prev) = previous {
                if !recipe.accepts_anywhere(prev.output_type) {
                    return Err(RegistryError::BrokenChain {
                        pipeline: pipeline.name.clone(),
                        from: prev.name.clone(),
                        to: recipe.name.clone(),
                    });
                }
            }
            previous = Some(recipe);
        }
        Ok(())
    }
}

fn validate_recipe(recipe: &RecipeDefinition) -> Result<(), String> {
    match &recipe.inputs {
        InputRule::Single { accepts } => {
            if accepts.is_empty() {
                return Err("no accepted inputs".into());
            }
        }
        InputRule::Pooled {
            accepts,
            capacity,
            start,
            reagent,
        } => {
            if accepts.is_empty() {
                return Err("no accepted inputs".into());
            }
            if *capacity == 0 {
                return Err("capacity must be positive".into());
            }
            if let BatchStart::Trigger(trigger) = start {
                if accepts.iter().any(|a| a.item_type == *trigger) {
                    return Err("trigger item is also a primary input".into());
                }
            }
            if let Some(r) = reagent {
                if r.capacity == 0 {
                    return Err("reagent capacity must be positive".into());
                }
                if accepts.iter().any(|a| a.item_type == r.item_type) {
                    return Err("reagent item is also a primary input".into());
                }
                if *start == BatchStart::Trigger(r.item_type) {
                    return Err("trigger item is also the reagent".into());
                }
            }
        }
        InputRule::Ordered { slots } => {
            if slots.is_empty() || slots.iter().any(Vec::is_empty) {
                return Err("ordered recipe needs non-empty slots".into());
            }
        }
    }

    match &recipe.activation {
        Activation::Timed { duration } => {
            if *duration == 0 {
                return Err("duration must be positive".into());
            }
        }
        Activation::Minigame(window) => {
            if !window.is_valid() {
                return Err("timing window ranges are not nested".into());
            }
            if recipe.heat.is_some() || recipe.fuel.is_some() {
                return Err("heat and fuel need a timed recipe".into());
            }
        }
    }

    match recipe.yield_rule {
        YieldRule::Fraction { denominator: 0, .. } => {
            return Err("yield fraction has zero denominator".into());
        }
        YieldRule::Charges if recipe.dosage.is_none() => {
            return Err("charge yield needs a dosage profile".into());
        }
        _ => {}
    }

    if recipe.dosage.is_some_and(|d| !d.is_valid()) {
        return Err("dosage profile out of order".into());
    }
    if recipe.heat.is_some_and(|h| !h.is_valid()) {
        return Err("heat zones out of order".into());
    }
    if recipe.fuel.is_some_and(|f| !f.is_valid()) {
        return Err("fuel profile needs positive capacity and burn interval".into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Read-only content table shared by every facility through an `Arc`.
#[derive(Debug)]
pub struct Registry {
    items: Vec<ItemTypeDef>,
    item_name_to_id: HashMap<String, ItemTypeId>,
    recipes: Vec<Arc<RecipeDefinition>>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    pipelines: Vec<PipelineDef>,
    pipeline_name_to_id: HashMap<String, PipelineId>,
}

impl Registry {
    pub fn get_item(&self, id: ItemTypeId) -> Option<&ItemTypeDef> {
        self.items.get(id.0 as usize)
    }

    pub fn recipe(&self, id: RecipeId) -> Option<&Arc<RecipeDefinition>> {
        self.recipes.get(id.0 as usize)
    }

    pub fn pipeline(&self, id: PipelineId) -> Option<&PipelineDef> {
        self.pipelines.get(id.0 as usize)
    }

    pub fn item_id(&self, name: &str) -> Option<ItemTypeId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    pub fn pipeline_id(&self, name: &str) -> Option<PipelineId> {
        self.pipeline_name_to_id.get(name).copied()
    }

    /// Recipe IDs of a pipeline, in stage order.
    pub fn pipeline_stages(&self, id: PipelineId) -> &[RecipeId] {
        self.pipeline(id).map_or(&[], |p| p.stages.as_slice())
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }
}

impl ItemCatalog for Registry {
    fn resolve_item_type(&self, name: &str) -> Option<ItemTypeId> {
        self.item_id(name)
    }

    fn item_name(&self, id: ItemTypeId) -> Option<&str> {
        self.get_item(id).map(|item| item.name.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no recipe named {0:?}")]
    NotFound(String),
    #[error("duplicate name: {0}")]
    DuplicateName(String),
    #[error("recipe {recipe} references unknown item {item:?}")]
    InvalidItemRef { recipe: String, item: ItemTypeId },
    #[error("invalid recipe reference: {0:?}")]
    InvalidRecipeRef(RecipeId),
    #[error("recipe {recipe}: {reason}")]
    InvalidRecipe { recipe: String, reason: String },
    #[error("pipeline {0} has no stages")]
    EmptyPipeline(String),
    #[error("pipeline {pipeline}: output of {from} is not an input of {to}")]
    BrokenChain {
        pipeline: String,
        from: String,
        to: String,
    },
}
