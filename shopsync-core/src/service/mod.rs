//! Boundary to the remote shopping-list service.
//!
//! The engine only talks to the server through [`RemoteListService`]. The
//! HTTP implementation lives in [`http`]; tests use an in-memory fake.
//!
//! ## Update contract
//!
//! `update_item` always carries the complete item state ([`ItemUpdate`]).
//! The server replaces the stored item with what it receives, so a partial
//! patch would wipe the omitted fields.

mod error;
mod http;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    Food, ItemMutations, ItemUpdate, ListDetail, MealPlanEntry, NewItem, ShoppingList,
    ShoppingListItem,
};

pub use error::{RemoteError, RemoteResult};
pub use http::{HttpListService, DEFAULT_TIMEOUT};

/// Date format the service expects for meal-plan range queries.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Remote operations consumed by the sync engine.
///
/// Every call can fail with [`RemoteError::Unauthorized`], which callers
/// treat as "local state is suspect, reload".
#[async_trait]
pub trait RemoteListService: Send + Sync {
    async fn fetch_lists(&self) -> RemoteResult<Vec<ShoppingList>>;

    async fn fetch_list_detail(&self, list_id: Uuid) -> RemoteResult<ListDetail>;

    async fn create_list(&self, name: Option<&str>) -> RemoteResult<ListDetail>;

    async fn update_list(&self, list_id: Uuid, name: Option<&str>) -> RemoteResult<ListDetail>;

    async fn delete_list(&self, list_id: Uuid) -> RemoteResult<()>;

    async fn create_item(&self, list_id: Uuid, item: &NewItem) -> RemoteResult<ItemMutations>;

    async fn update_item(&self, update: &ItemUpdate) -> RemoteResult<ShoppingListItem>;

    async fn delete_item(&self, item_id: Uuid) -> RemoteResult<()>;

    async fn fetch_meal_plan_entries(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RemoteResult<Vec<MealPlanEntry>>;

    async fn bulk_add_recipes_to_list(&self, list_id: Uuid, recipe_ids: &[Uuid])
        -> RemoteResult<()>;

    async fn search_foods(&self, query: &str) -> RemoteResult<Vec<Food>>;
}
