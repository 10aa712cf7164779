//! Unit price resolution.

use crate::{AddonGroup, MenuItemRef};
use cart_protocol::{AddonSelection, SelectedAddon, SelectedVariation};

/// A fully resolved customization: priced variation, priced add-ons, and the
/// resulting unit price.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSelection {
    /// Priced variation, if one was selected and exists
    pub variation: Option<SelectedVariation>,
    /// Priced add-ons; stale selections are dropped
    pub addons: Vec<SelectedAddon>,
    /// Unit price in minor currency units
    pub unit_price: i64,
}

/// The add-on groups active for a given variation selection.
///
/// A selected variation that declares its own add-on groups replaces the
/// item-level groups entirely; otherwise the item-level groups apply. The
/// UI uses the same rule to render pickers, so it lives here.
pub fn active_addon_groups<'a>(
    menu_item: &'a MenuItemRef,
    selected_variation_id: Option<&str>,
) -> &'a [AddonGroup] {
    if let Some(variation_id) = selected_variation_id {
        if let Some((_, variation)) = menu_item.find_variation(variation_id) {
            if !variation.addon_groups.is_empty() {
                return &variation.addon_groups;
            }
        }
    }
    &menu_item.addon_groups
}

/// Resolve a selection against the catalog, pricing each part.
///
/// Add-on selections that do not exist in the active groups are treated as
/// stale and dropped silently.
pub fn resolve_selections(
    menu_item: &MenuItemRef,
    selected_variation_id: Option<&str>,
    selected_addons: &[AddonSelection],
) -> ResolvedSelection {
    let variation = selected_variation_id
        .and_then(|id| menu_item.find_variation(id))
        .map(|(group, variation)| SelectedVariation {
            group: group.name.clone(),
            variation: variation.name.clone(),
            price: variation.price,
        });

    let groups = active_addon_groups(menu_item, selected_variation_id);
    let addons: Vec<SelectedAddon> = selected_addons
        .iter()
        .filter_map(|selection| {
            groups
                .iter()
                .flat_map(|g| g.addons.iter())
                .find(|a| a.addon_id == selection.addon_id)
                .map(|a| SelectedAddon {
                    addon_id: a.addon_id.clone(),
                    qty: selection.qty,
                    price: a.price,
                })
        })
        .collect();

    let unit_price = menu_item.base_price
        + variation.as_ref().map_or(0, |v| v.price)
        + addons
            .iter()
            .map(|a| a.price * i64::from(a.qty))
            .sum::<i64>();

    ResolvedSelection {
        variation,
        addons,
        unit_price,
    }
}

/// Compute a cart line's unit price from a menu item, an optional selected
/// variation, and a set of selected add-ons.
pub fn resolve_unit_price(
    menu_item: &MenuItemRef,
    selected_variation_id: Option<&str>,
    selected_addons: &[AddonSelection],
) -> i64 {
    resolve_selections(menu_item, selected_variation_id, selected_addons).unit_price
}
