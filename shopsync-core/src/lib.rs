//! Shopsync Core Library
//!
//! Local-first shopping-list engine: models, the remote service boundary,
//! the in-memory list store and the sync components built on top of it.

pub mod models;
pub mod service;
pub mod store;
pub mod sync;

pub use models::{
    EntryType, Food, ItemEdit, ListDetail, MealPlanEntry, NewItem, ShoppingList,
    ShoppingListItem, ValidationError,
};
pub use service::{HttpListService, RemoteError, RemoteListService};
pub use store::ListItemStore;
pub use sync::{
    BulkOutcome, DateRange, FoodSearch, ImportOutcome, ListSession, ListSnapshot, SyncError,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
