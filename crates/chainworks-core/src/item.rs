use crate::id::ItemTypeId;
use crate::quality::QualityTier;
use serde::{Deserialize, Serialize};

/// One unit offered to a stage: its type and the grade it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemUnit {
    pub item_type: ItemTypeId,
    pub quality: QualityTier,
}

impl ItemUnit {
    pub fn new(item_type: ItemTypeId, quality: QualityTier) -> Self {
        Self { item_type, quality }
    }

    /// A unit of the lowest grade.
    pub fn standard(item_type: ItemTypeId) -> Self {
        Self::new(item_type, QualityTier::Standard)
    }
}

/// A buffered or extracted batch output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_type: ItemTypeId,
    pub quality: QualityTier,
    pub quantity: u32,
    /// Potency in micrograms, set only by dosage stages.
    #[serde(default)]
    pub potency_ug: Option<u32>,
}

impl ItemStack {
    pub fn new(item_type: ItemTypeId, quality: QualityTier, quantity: u32) -> Self {
        Self {
            item_type,
            quality,
            quantity,
            potency_ug: None,
        }
    }

    pub fn with_potency(mut self, potency_ug: u32) -> Self {
        self.potency_ug = Some(potency_ug);
        self
    }

    /// The grade of a single unit taken from this stack.
    pub fn unit(&self) -> ItemUnit {
        ItemUnit::new(self.item_type, self.quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_unit_keeps_type_and_quality() {
        let stack = ItemStack::new(ItemTypeId(3), QualityTier::VeryGood, 5);
        assert_eq!(stack.unit(), ItemUnit::new(ItemTypeId(3), QualityTier::VeryGood));
        assert_eq!(stack.potency_ug, None);
    }

    #[test]
    fn potency_is_attached() {
        let stack = ItemStack::new(ItemTypeId(1), QualityTier::Good, 10).with_potency(175);
        assert_eq!(stack.potency_ug, Some(175));
    }
}
