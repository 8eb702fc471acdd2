//! In-memory service used by the engine tests.
//!
//! Behaves like a cooperative server holding one list, records every call
//! and fails on demand.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::{RemoteError, RemoteListService, RemoteResult};
use crate::models::{
    Food, ItemMutations, ItemUpdate, ListDetail, MealPlanEntry, NewItem, ShoppingList,
    ShoppingListItem,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FetchLists,
    FetchDetail(Uuid),
    CreateList(Option<String>),
    UpdateList(Uuid, Option<String>),
    DeleteList(Uuid),
    CreateItem(NewItem),
    UpdateItem(ItemUpdate),
    DeleteItem(Uuid),
    FetchMealPlans(NaiveDate, NaiveDate),
    BulkAdd(Uuid, Vec<Uuid>),
    SearchFoods(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    FetchDetail,
    CreateList,
    UpdateList,
    DeleteList,
    CreateItem,
    UpdateItem,
    FetchMealPlans,
    BulkAdd,
    SearchFoods,
}

#[derive(Default)]
struct State {
    detail: Option<ListDetail>,
    entries: Vec<MealPlanEntry>,
    foods: Vec<Food>,
    calls: Vec<Call>,
    failures: HashMap<Op, VecDeque<RemoteError>>,
    delete_failures: HashMap<Uuid, RemoteError>,
}

pub struct FakeListService {
    state: Mutex<State>,
}

impl FakeListService {
    pub fn new(detail: ListDetail) -> Self {
        Self {
            state: Mutex::new(State {
                detail: Some(detail),
                ..Default::default()
            }),
        }
    }

    pub fn with_entries(self, entries: Vec<MealPlanEntry>) -> Self {
        self.state.lock().unwrap().entries = entries;
        self
    }

    pub fn with_foods(self, foods: Vec<Food>) -> Self {
        self.state.lock().unwrap().foods = foods;
        self
    }

    /// Fails the next call of the given kind.
    pub fn fail_next(&self, op: Op, error: RemoteError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Fails every delete of this item.
    pub fn fail_delete_of(&self, item_id: Uuid, error: RemoteError) {
        self.state
            .lock()
            .unwrap()
            .delete_failures
            .insert(item_id, error);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn update_calls(&self) -> Vec<ItemUpdate> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::UpdateItem(u) => Some(u),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| matches(c)).count()
    }

    /// Server-side copy of the list.
    pub fn server_items(&self) -> Vec<ShoppingListItem> {
        self.state
            .lock()
            .unwrap()
            .detail
            .as_ref()
            .map(|d| d.list_items.clone())
            .unwrap_or_default()
    }

    /// Changes the server copy behind the client's back.
    pub fn set_server_items(&self, items: Vec<ShoppingListItem>) {
        if let Some(detail) = self.state.lock().unwrap().detail.as_mut() {
            detail.list_items = items;
        }
    }

    fn record(&self, call: Call, op: Option<Op>) -> RemoteResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if let Some(op) = op {
            if let Some(err) = state.failures.get_mut(&op).and_then(|q| q.pop_front()) {
                return Err(err);
            }
        }
        Ok(())
    }

    fn detail(&self) -> RemoteResult<ListDetail> {
        self.state
            .lock()
            .unwrap()
            .detail
            .clone()
            .ok_or_else(|| RemoteError::NotFound("list".to_string()))
    }
}

#[async_trait]
impl RemoteListService for FakeListService {
    async fn fetch_lists(&self) -> RemoteResult<Vec<ShoppingList>> {
        self.record(Call::FetchLists, None)?;
        Ok(self.detail().map(|d| vec![d.list]).unwrap_or_default())
    }

    async fn fetch_list_detail(&self, list_id: Uuid) -> RemoteResult<ListDetail> {
        self.record(Call::FetchDetail(list_id), Some(Op::FetchDetail))?;
        self.detail()
    }

    async fn create_list(&self, name: Option<&str>) -> RemoteResult<ListDetail> {
        self.record(Call::CreateList(name.map(String::from)), Some(Op::CreateList))?;
        let detail = ListDetail::new(ShoppingList::new(Uuid::new_v4(), name.map(String::from)));
        self.state.lock().unwrap().detail = Some(detail.clone());
        Ok(detail)
    }

    async fn update_list(&self, list_id: Uuid, name: Option<&str>) -> RemoteResult<ListDetail> {
        self.record(
            Call::UpdateList(list_id, name.map(String::from)),
            Some(Op::UpdateList),
        )?;
        let mut state = self.state.lock().unwrap();
        let detail = state
            .detail
            .as_mut()
            .ok_or_else(|| RemoteError::NotFound("list".to_string()))?;
        detail.list.name = name.map(String::from);
        Ok(detail.clone())
    }

    async fn delete_list(&self, list_id: Uuid) -> RemoteResult<()> {
        self.record(Call::DeleteList(list_id), Some(Op::DeleteList))?;
        self.state.lock().unwrap().detail = None;
        Ok(())
    }

    async fn create_item(&self, list_id: Uuid, item: &NewItem) -> RemoteResult<ItemMutations> {
        self.record(Call::CreateItem(item.clone()), Some(Op::CreateItem))?;
        let mut state = self.state.lock().unwrap();
        let next_position = state
            .detail
            .as_ref()
            .and_then(|d| d.list_items.iter().map(|i| i.position).max())
            .map_or(0, |p| p + 1);

        // New items get the next free position, like the real server.
        let mut created = ShoppingListItem::new(Uuid::new_v4(), list_id, item.note.clone())
            .with_quantity(item.quantity)
            .with_position(next_position);
        created.food_id = item.food_id;
        created.unit_id = item.unit_id;

        if let Some(detail) = state.detail.as_mut() {
            detail.list_items.push(created.clone());
        }
        Ok(ItemMutations {
            created_items: vec![created],
            ..Default::default()
        })
    }

    async fn update_item(&self, update: &ItemUpdate) -> RemoteResult<ShoppingListItem> {
        self.record(Call::UpdateItem(update.clone()), Some(Op::UpdateItem))?;
        let mut state = self.state.lock().unwrap();
        let detail = state
            .detail
            .as_mut()
            .ok_or_else(|| RemoteError::NotFound("list".to_string()))?;
        let item = detail
            .list_items
            .iter_mut()
            .find(|i| i.id == update.id)
            .ok_or_else(|| RemoteError::NotFound(update.id.to_string()))?;

        item.note = update.note.clone();
        item.quantity = update.quantity;
        item.checked = update.checked;
        item.food_id = update.food_id;
        item.unit_id = update.unit_id;
        item.label_id = update.label_id;
        item.position = update.position;
        Ok(item.clone())
    }

    async fn delete_item(&self, item_id: Uuid) -> RemoteResult<()> {
        self.record(Call::DeleteItem(item_id), None)?;
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.delete_failures.get(&item_id) {
            return Err(err.clone());
        }
        if let Some(detail) = state.detail.as_mut() {
            detail.list_items.retain(|i| i.id != item_id);
        }
        Ok(())
    }

    async fn fetch_meal_plan_entries(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RemoteResult<Vec<MealPlanEntry>> {
        self.record(Call::FetchMealPlans(start, end), Some(Op::FetchMealPlans))?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .entries
            .iter()
            .filter(|e| e.date >= start && e.date <= end)
            .cloned()
            .collect())
    }

    async fn bulk_add_recipes_to_list(
        &self,
        list_id: Uuid,
        recipe_ids: &[Uuid],
    ) -> RemoteResult<()> {
        self.record(Call::BulkAdd(list_id, recipe_ids.to_vec()), Some(Op::BulkAdd))?;
        let mut state = self.state.lock().unwrap();
        if let Some(detail) = state.detail.as_mut() {
            for recipe_id in recipe_ids {
                let item = ShoppingListItem::new(
                    Uuid::new_v4(),
                    list_id,
                    format!("ingredient of {}", recipe_id),
                );
                detail.list_items.push(item);
            }
        }
        Ok(())
    }

    async fn search_foods(&self, query: &str) -> RemoteResult<Vec<Food>> {
        self.record(Call::SearchFoods(query.to_string()), Some(Op::SearchFoods))?;
        let needle = query.to_lowercase();
        Ok(self
            .state
            .lock()
            .unwrap()
            .foods
            .iter()
            .filter(|f| f.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

/// A list whose items get positions in the given order.
pub fn list_fixture(items: &[(&str, bool)]) -> ListDetail {
    let list_id = Uuid::new_v4();
    let items = items
        .iter()
        .enumerate()
        .map(|(pos, (note, checked))| {
            ShoppingListItem::new(Uuid::new_v4(), list_id, *note)
                .with_position(pos as i32)
                .with_checked(*checked)
        })
        .collect();
    ListDetail::new(ShoppingList::new(list_id, Some("Groceries".to_string()))).with_items(items)
}

/// Id of the item with the given note.
pub fn id_of(detail: &ListDetail, note: &str) -> Uuid {
    detail
        .list_items
        .iter()
        .find(|i| i.note == note)
        .map(|i| i.id)
        .unwrap_or_else(|| panic!("no item named {}", note))
}
