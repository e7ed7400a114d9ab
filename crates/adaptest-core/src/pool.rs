//! Per-skill item pools.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CatError, CatResult};
use crate::item::{Item, ItemId};

/// The candidate items for one skill.
///
/// Items are only ever taken out; an id that was removed can never be
/// presented again.
#[derive(Debug, Clone, Default)]
pub struct ItemPool {
    items: BTreeMap<ItemId, Item>,
    removed: BTreeSet<ItemId>,
}

impl ItemPool {
    /// Build a pool, rejecting duplicate ids and invalid 3PL parameters.
    pub fn load(items: impl IntoIterator<Item = Item>) -> CatResult<Self> {
        let mut map = BTreeMap::new();
        for item in items {
            item.validate()?;
            if map.insert(item.id, item).is_some() {
                return Err(CatError::DuplicateItem(item.id));
            }
        }
        Ok(Self {
            items: map,
            removed: BTreeSet::new(),
        })
    }

    /// Items not yet removed, in ascending id order.
    pub fn remaining(&self) -> Vec<&Item> {
        self.items.values().collect()
    }

    /// Remove an item permanently, returning it.
    pub fn remove(&mut self, item_id: ItemId) -> CatResult<Item> {
        let item = self
            .items
            .remove(&item_id)
            .ok_or(CatError::UnknownItem(item_id))?;
        self.removed.insert(item_id);
        Ok(item)
    }

    /// Look up a remaining item.
    pub fn get(&self, item_id: ItemId) -> Option<&Item> {
        self.items.get(&item_id)
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.items.contains_key(&item_id)
    }

    /// Whether `item_id` was once in this pool and has been administered.
    pub fn was_removed(&self, item_id: ItemId) -> bool {
        self.removed.contains(&item_id)
    }

    /// Number of items still available.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
