//! One open shopping list.
//!
//! `ListSession` owns the store and every engine component that mutates it.
//! Mutations never return an error; failures are recorded as the last error
//! and the store is left consistent. Every change is published as a
//! [`ListSnapshot`] on a watch channel.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use super::bulk::{BulkOperationRunner, BulkOutcome};
use super::coordinator::{MutationState, SyncCoordinator};
use super::error::SyncError;
use super::import::{DateRange, ImportOutcome, MealPlanImportMerger};
use crate::models::{ItemEdit, NewItem, RecipeReference, ShoppingList, ShoppingListItem};
use crate::service::RemoteListService;
use crate::store::ListItemStore;

/// Informational message that is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    NoRecipesInRange,
    Imported { recipes: usize },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NoRecipesInRange => write!(f, "No recipes found in the selected range"),
            Notice::Imported { recipes: 1 } => write!(f, "Imported ingredients of 1 recipe"),
            Notice::Imported { recipes } => {
                write!(f, "Imported ingredients of {} recipes", recipes)
            }
        }
    }
}

/// Published view of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListSnapshot {
    pub list: Option<ShoppingList>,
    pub items: Vec<ShoppingListItem>,
    pub recipe_references: Vec<RecipeReference>,
    pub last_error: Option<String>,
    pub notice: Option<String>,
    /// Remote calls not yet applied.
    pub persisting: usize,
}

pub struct ListSession {
    service: Arc<dyn RemoteListService>,
    store: ListItemStore,
    coordinator: SyncCoordinator,
    bulk: BulkOperationRunner,
    importer: MealPlanImportMerger,
    last_error: Option<SyncError>,
    notice: Option<Notice>,
    deleted: bool,
    snapshots: watch::Sender<ListSnapshot>,
}

impl ListSession {
    /// Fetches a list and opens a session on it.
    pub async fn open(
        service: Arc<dyn RemoteListService>,
        list_id: Uuid,
    ) -> Result<Self, SyncError> {
        let detail = service.fetch_list_detail(list_id).await?;
        tracing::debug!(list = %list_id, items = detail.list_items.len(), "opened list");
        Ok(Self::from_store(service, ListItemStore::new(detail)))
    }

    /// Creates a list on the server and opens a session on it.
    pub async fn create(
        service: Arc<dyn RemoteListService>,
        name: Option<&str>,
    ) -> Result<Self, SyncError> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let detail = service.create_list(name).await?;
        tracing::info!(list = %detail.list.id, "created list");
        Ok(Self::from_store(service, ListItemStore::new(detail)))
    }

    fn from_store(service: Arc<dyn RemoteListService>, store: ListItemStore) -> Self {
        let (snapshots, _) = watch::channel(ListSnapshot::default());
        let session = Self {
            coordinator: SyncCoordinator::new(Arc::clone(&service)),
            bulk: BulkOperationRunner::new(Arc::clone(&service)),
            importer: MealPlanImportMerger::new(Arc::clone(&service)),
            service,
            store,
            last_error: None,
            notice: None,
            deleted: false,
            snapshots,
        };
        session.publish();
        session
    }

    pub fn store(&self) -> &ListItemStore {
        &self.store
    }

    pub fn list_id(&self) -> Option<Uuid> {
        self.store.list_id()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn last_error(&self) -> Option<&SyncError> {
        self.last_error.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn state_of(&self, item_id: Uuid) -> MutationState {
        self.coordinator.state_of(item_id)
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        ListSnapshot {
            list: self.store.list().cloned(),
            items: self.store.items().to_vec(),
            recipe_references: self.store.recipe_references().to_vec(),
            last_error: self.last_error.as_ref().map(ToString::to_string),
            notice: self.notice.as_ref().map(ToString::to_string),
            persisting: self.coordinator.outstanding(),
        }
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
        self.notice = None;
        self.publish();
    }

    /// Checks or unchecks an item. The change is visible immediately; call
    /// [`settle`](Self::settle) to persist it.
    pub fn toggle_checked(&mut self, item_id: Uuid, checked: bool) -> bool {
        if !self.begin() {
            return false;
        }
        let result = self
            .coordinator
            .toggle_checked(&mut self.store, item_id, checked);
        self.finish(result).is_some()
    }

    /// Queues the creation of an item. Returns false when it was rejected
    /// before any remote call.
    pub fn add_item(&mut self, draft: NewItem) -> bool {
        if !self.begin() {
            return false;
        }
        let result = self.coordinator.add_item(&self.store, draft);
        self.finish(result).is_some()
    }

    pub fn update_item(&mut self, item_id: Uuid, edit: &ItemEdit) -> bool {
        if !self.begin() {
            return false;
        }
        let result = self.coordinator.update_item(&mut self.store, item_id, edit);
        self.finish(result).is_some()
    }

    /// Drives every queued remote call, including follow-up reloads, to
    /// completion.
    pub async fn settle(&mut self) {
        while let Some(completion) = self.coordinator.next_completion().await {
            let report = self.coordinator.apply(&mut self.store, completion);
            if let Some(error) = report.surfaced_error() {
                self.last_error = Some(SyncError::Remote(error.clone()));
            }
            self.publish();
        }
    }

    pub async fn delete_items(&mut self, item_ids: &[Uuid]) -> BulkOutcome {
        if !self.begin() {
            return BulkOutcome::default();
        }
        self.settle().await;
        let outcome = self.bulk.delete_many(&mut self.store, item_ids).await;
        self.record_bulk(&outcome);
        outcome
    }

    pub async fn remove_checked(&mut self) -> BulkOutcome {
        if !self.begin() {
            return BulkOutcome::default();
        }
        self.settle().await;
        let outcome = self.bulk.remove_checked(&mut self.store).await;
        self.record_bulk(&outcome);
        outcome
    }

    pub async fn import_meal_plan(&mut self, range: &DateRange) -> Option<ImportOutcome> {
        if !self.begin() {
            return None;
        }
        self.settle().await;
        let result = self.importer.import(&mut self.store, range).await;
        let outcome = self.finish(result)?;
        self.coordinator.forget_missing(&self.store);
        self.notice = Some(match &outcome {
            ImportOutcome::NoRecipesInRange => Notice::NoRecipesInRange,
            ImportOutcome::Imported { recipe_ids } => Notice::Imported {
                recipes: recipe_ids.len(),
            },
        });
        self.publish();
        Some(outcome)
    }

    /// Replaces local state with the server's copy.
    pub async fn reload(&mut self) -> bool {
        if !self.begin() {
            return false;
        }
        self.settle().await;
        let Some(list_id) = self.store.list_id() else {
            return self.finish::<()>(Err(SyncError::NoList)).is_some();
        };
        let result = self
            .service
            .fetch_list_detail(list_id)
            .await
            .map_err(SyncError::from);
        match self.finish(result) {
            Some(detail) => {
                self.store.load(detail);
                self.coordinator.forget_missing(&self.store);
                self.publish();
                true
            }
            None => false,
        }
    }

    /// Renames the list. A blank name clears it.
    pub async fn rename_list(&mut self, name: &str) -> bool {
        if !self.begin() {
            return false;
        }
        let Some(list_id) = self.store.list_id() else {
            return self.finish::<()>(Err(SyncError::NoList)).is_some();
        };
        let name = Some(name.trim()).filter(|n| !n.is_empty());
        let result = self
            .service
            .update_list(list_id, name)
            .await
            .map_err(SyncError::from);
        match self.finish(result) {
            Some(detail) => {
                self.store.set_list(detail.list);
                self.publish();
                true
            }
            None => false,
        }
    }

    /// Deletes the list on the server. The session is unusable afterwards.
    pub async fn delete_list(&mut self) -> bool {
        if !self.begin() {
            return false;
        }
        self.settle().await;
        let Some(list_id) = self.store.list_id() else {
            return self.finish::<()>(Err(SyncError::NoList)).is_some();
        };
        let result = self
            .service
            .delete_list(list_id)
            .await
            .map_err(SyncError::from);
        if self.finish(result).is_none() {
            return false;
        }
        tracing::info!(list = %list_id, "deleted list");
        self.deleted = true;
        self.store = ListItemStore::default();
        self.coordinator.forget_missing(&self.store);
        self.publish();
        true
    }

    /// Resets the error and notice for a new operation.
    fn begin(&mut self) -> bool {
        self.last_error = None;
        self.notice = None;
        if self.deleted {
            self.last_error = Some(SyncError::ListDeleted);
            self.publish();
            return false;
        }
        true
    }

    fn finish<T>(&mut self, result: Result<T, SyncError>) -> Option<T> {
        let value = match result {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::debug!(%error, "operation failed");
                self.last_error = Some(error);
                None
            }
        };
        self.publish();
        value
    }

    fn record_bulk(&mut self, outcome: &BulkOutcome) {
        if let Some(failure) = &outcome.failure {
            self.last_error = Some(SyncError::Remote(failure.error.clone()));
        }
        self.coordinator.forget_missing(&self.store);
        self.publish();
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}
