//! In-memory state of one shopping list.
//!
//! Display order: unchecked items first, then checked. Inside each group
//! items follow a local rank. A load ranks items in the order the server
//! sent them, a front insert ranks below every other item, and checking or
//! editing an item keeps its rank, so a toggle and its undo restore the
//! original order.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::{ListDetail, RecipeReference, ShoppingList, ShoppingListItem};

/// An item taken out of the store, with the index it occupied.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedItem {
    pub item: ShoppingListItem,
    pub index: usize,
}

/// Local copy of one list and its items.
#[derive(Debug, Clone, Default)]
pub struct ListItemStore {
    list: Option<ShoppingList>,
    items: Vec<ShoppingListItem>,
    recipe_references: Vec<RecipeReference>,
    ranks: HashMap<Uuid, i64>,
}

impl ListItemStore {
    pub fn new(detail: ListDetail) -> Self {
        let mut store = Self::default();
        store.load(detail);
        store
    }

    /// Replaces the whole state with a server detail.
    ///
    /// Items owned by another list and repeated ids are dropped.
    pub fn load(&mut self, detail: ListDetail) {
        let list_id = detail.list.id;
        let mut seen = HashSet::new();
        let items: Vec<ShoppingListItem> = detail
            .list_items
            .into_iter()
            .filter(|item| {
                if item.list_id() != list_id {
                    tracing::warn!(item = %item.id, "dropping item owned by another list");
                    return false;
                }
                seen.insert(item.id)
            })
            .collect();

        self.list = Some(detail.list);
        self.items = items;
        self.recipe_references = detail.recipe_references;
        self.renumber();
        self.sort();
    }

    pub fn list(&self) -> Option<&ShoppingList> {
        self.list.as_ref()
    }

    pub fn list_id(&self) -> Option<Uuid> {
        self.list.as_ref().map(|l| l.id)
    }

    /// Updates list-level fields (after a rename) without touching items.
    pub fn set_list(&mut self, list: ShoppingList) {
        if self.list_id().is_some_and(|id| id != list.id) {
            tracing::warn!(list = %list.id, "ignoring fields of a different list");
            return;
        }
        self.list = Some(list);
    }

    pub fn items(&self) -> &[ShoppingListItem] {
        &self.items
    }

    pub fn recipe_references(&self) -> &[RecipeReference] {
        &self.recipe_references
    }

    pub fn get(&self, item_id: Uuid) -> Option<&ShoppingListItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn contains(&self, item_id: Uuid) -> bool {
        self.get(item_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ids of checked items, in display order.
    pub fn checked_ids(&self) -> Vec<Uuid> {
        self.items
            .iter()
            .filter(|i| i.checked)
            .map(|i| i.id)
            .collect()
    }

    /// Inserts an item at the front or back of its checked-state group.
    ///
    /// The server position does not matter here. An item with an id already
    /// present replaces the old entry. Returns false if the item belongs to
    /// another list.
    pub fn insert_item(&mut self, item: ShoppingListItem, at_front: bool) -> bool {
        if !self.owns(&item) {
            return false;
        }
        self.items.retain(|i| i.id != item.id);
        self.ranks.remove(&item.id);

        let rank = if at_front {
            self.ranks.values().min().map_or(0, |r| r - 1)
        } else {
            self.ranks.values().max().map_or(0, |r| r + 1)
        };
        self.ranks.insert(item.id, rank);
        self.items.push(item);
        self.sort();
        true
    }

    /// Sets the checked flag and returns the previous value.
    ///
    /// When the item is already at the target value nothing changes and the
    /// returned prior equals `checked`. `None` for unknown ids.
    pub fn set_checked(&mut self, item_id: Uuid, checked: bool) -> Option<bool> {
        let item = self.items.iter_mut().find(|i| i.id == item_id)?;
        let prior = item.checked;
        if prior != checked {
            item.checked = checked;
            self.sort();
        }
        Some(prior)
    }

    /// Swaps in a new version of an existing item.
    pub fn replace_item(&mut self, item: ShoppingListItem) -> bool {
        if !self.owns(&item) {
            return false;
        }
        match self.items.iter_mut().find(|i| i.id == item.id) {
            Some(slot) => {
                *slot = item;
                self.sort();
                true
            }
            None => false,
        }
    }

    /// Removes the given items, returning each with its index at the time
    /// of removal, ordered by that index.
    pub fn remove(&mut self, item_ids: &[Uuid]) -> Vec<RemovedItem> {
        let wanted: HashSet<Uuid> = item_ids.iter().copied().collect();
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.items.len());

        for (index, item) in std::mem::take(&mut self.items).into_iter().enumerate() {
            if wanted.contains(&item.id) {
                self.ranks.remove(&item.id);
                removed.push(RemovedItem { item, index });
            } else {
                kept.push(item);
            }
        }

        self.items = kept;
        removed
    }

    /// Puts an item back near the index it was removed from.
    ///
    /// The index is clamped to the current length since the list may have
    /// shrunk in the meantime.
    pub fn reinsert(&mut self, item: ShoppingListItem, index: usize) {
        if !self.owns(&item) {
            return;
        }
        self.items.retain(|i| i.id != item.id);
        let index = index.min(self.items.len());
        self.items.insert(index, item);
        self.renumber();
        self.sort();
    }

    fn owns(&self, item: &ShoppingListItem) -> bool {
        match self.list_id() {
            Some(id) if id != item.list_id() => {
                tracing::warn!(item = %item.id, "item belongs to another list");
                false
            }
            _ => true,
        }
    }

    /// Ranks every item by its current index.
    fn renumber(&mut self) {
        self.ranks = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| (item.id, index as i64))
            .collect();
    }

    fn sort(&mut self) {
        let ranks = &self.ranks;
        self.items
            .sort_by_key(|i| (i.checked, ranks.get(&i.id).copied().unwrap_or(i64::MAX)));
    }
}
