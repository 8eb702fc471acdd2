//! Sync engine for shopping lists.
//!
//! Local state lives in a [`ListItemStore`](crate::store::ListItemStore);
//! the components here change it and keep it in line with the server:
//!
//! - [`SyncCoordinator`]: optimistic single-item toggles, edits and adds
//! - [`BulkOperationRunner`]: sequential multi-item deletes
//! - [`MealPlanImportMerger`]: recipe ingredients from a meal-plan range
//! - [`FoodSearch`]: debounced catalogue lookup
//! - [`ListSession`]: one open list, wiring the above together
//!
//! ## Ownership
//!
//! Only the task that owns a session mutates its store. Remote calls run as
//! futures polled by that task, so completions are applied in one place and
//! no locking is needed around list state.

mod bulk;
mod coordinator;
mod error;
mod import;
mod search;
mod session;

pub use bulk::{BulkFailure, BulkOperationRunner, BulkOutcome, RestorePolicy};
pub use coordinator::{Completion, MutationState, Reconciled, SyncCoordinator};
pub use error::SyncError;
pub use import::{DateRange, ImportOutcome, MealPlanImportMerger};
pub use search::{FoodSearch, SearchResults, DEFAULT_DEBOUNCE};
pub use session::{ListSession, ListSnapshot, Notice};
