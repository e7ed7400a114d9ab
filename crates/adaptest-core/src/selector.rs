//! Next-item selection strategies.

use std::fmt;

use crate::item::Item;

/// Information values closer than this are treated as equal.
pub const INFORMATION_TIE_TOLERANCE: f64 = 1e-9;

/// Strategy for choosing the next item from a pool at the current theta.
pub trait ItemSelector: Send + Sync + fmt::Debug {
    /// Pick one of `items`, or `None` when there is nothing to pick.
    fn select<'a>(&self, items: &[&'a Item], theta: f64) -> Option<&'a Item>;
}

/// Maximum Fisher information criterion.
///
/// Ties within [`INFORMATION_TIE_TOLERANCE`] go to the smallest id, so the
/// choice does not depend on the order of `items`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaximumInformation;

impl ItemSelector for MaximumInformation {
    fn select<'a>(&self, items: &[&'a Item], theta: f64) -> Option<&'a Item> {
        let scored: Vec<(&'a Item, f64)> = items
            .iter()
            .map(|&item| (item, item.information(theta)))
            .collect();
        let picked = pick_most_informative(&scored);
        if let Some((item, info)) = picked {
            tracing::debug!(item = item.id, information = info, theta, "selected item");
        }
        picked.map(|(item, _)| item)
    }
}

/// Lowest id among the items within tolerance of the maximum information.
fn pick_most_informative<'a>(scored: &[(&'a Item, f64)]) -> Option<(&'a Item, f64)> {
    let max = scored
        .iter()
        .map(|&(_, info)| info)
        .filter(|info| !info.is_nan())
        .fold(None, |best: Option<f64>, info| {
            Some(best.map_or(info, |b| b.max(info)))
        })?;
    scored
        .iter()
        .copied()
        .filter(|&(_, info)| max - info <= INFORMATION_TIE_TOLERANCE)
        .min_by_key(|&(item, _)| item.id)
}
