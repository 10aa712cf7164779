//! Pure pricing resolution for cart lines.
//!
//! The single source of truth for every optimistic `final_price`: the same
//! function prices a line locally the instant it is added and backs any
//! price shown before submission.

mod catalog;
mod resolver;

pub use catalog::{Addon, AddonGroup, MenuItemRef, Variation, VariationGroup};
pub use resolver::{active_addon_groups, resolve_selections, resolve_unit_price, ResolvedSelection};
