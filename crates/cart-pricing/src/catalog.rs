//! Read-only menu catalog references.
//!
//! Owned by the menu catalog service; this core only ever reads them.

use serde::{Deserialize, Serialize};

/// An add-on within a group (e.g. "Extra cheese").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Addon {
    /// Add-on ID
    pub addon_id: String,
    /// Display name
    pub name: String,
    /// Unit price in minor currency units
    pub price: i64,
}

/// A group of add-ons (e.g. "Toppings").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonGroup {
    /// Group ID
    pub group_id: String,
    /// Display name
    pub name: String,
    /// Add-ons in this group
    #[serde(default)]
    pub addons: Vec<Addon>,
}

/// One variation within a group (e.g. "Large").
///
/// A variation may declare its own add-on groups; when it does, those
/// groups replace the item-level groups entirely for pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    /// Variation ID
    pub variation_id: String,
    /// Display name
    pub name: String,
    /// Price delta over the item's base price, minor units
    pub price: i64,
    /// Override add-on groups (replace, not union)
    #[serde(default)]
    pub addon_groups: Vec<AddonGroup>,
}

/// A group of mutually exclusive variations (e.g. "Size").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationGroup {
    /// Group ID
    pub group_id: String,
    /// Display name
    pub name: String,
    /// Variations in this group
    #[serde(default)]
    pub variations: Vec<Variation>,
}

/// External reference to a menu item, read-only to this core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemRef {
    /// Menu item ID
    pub menu_item_id: String,
    /// Base price in minor currency units
    pub base_price: i64,
    /// Variation groups, if the item has variations
    #[serde(default)]
    pub variation_groups: Vec<VariationGroup>,
    /// Item-level add-on groups
    #[serde(default)]
    pub addon_groups: Vec<AddonGroup>,
}

impl MenuItemRef {
    /// Find a variation (and its group) by variation id.
    pub fn find_variation(&self, variation_id: &str) -> Option<(&VariationGroup, &Variation)> {
        self.variation_groups.iter().find_map(|group| {
            group
                .variations
                .iter()
                .find(|v| v.variation_id == variation_id)
                .map(|v| (group, v))
        })
    }
}
