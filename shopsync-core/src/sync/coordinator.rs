//! Optimistic single-item mutations.
//!
//! A mutation is applied to the store first, then persisted. Remote calls are
//! queued as futures and only polled from the owner's task (see
//! [`SyncCoordinator::next_completion`]), so every completion is applied by
//! the same writer that made the optimistic change.
//!
//! Per item there is at most one update in flight. A newer intent for an
//! item that is still persisting is recorded as pending; once the running
//! call completes, the item's state at that moment is sent and the older
//! call's outcome is dropped.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use uuid::Uuid;

use super::error::SyncError;
use crate::models::{ItemEdit, ItemMutations, ListDetail, NewItem, ShoppingListItem, ValidationError};
use crate::service::{RemoteError, RemoteListService, RemoteResult};
use crate::store::ListItemStore;

/// Where a single-item mutation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    /// Nothing pending for the item.
    Idle,
    /// Applied locally, waiting behind an update already in flight.
    LocalApplied,
    /// Update in flight.
    Persisting,
    /// Server accepted the latest update.
    Reconciled,
    /// Update failed; the last confirmed value was restored and a reload requested.
    RolledBack,
    /// Reload after a failure has landed.
    ReloadedFromServer,
}

/// A finished remote call, waiting to be applied.
#[derive(Debug)]
pub enum Completion {
    Persisted {
        item_id: Uuid,
        result: RemoteResult<ShoppingListItem>,
    },
    Created(RemoteResult<ItemMutations>),
    Reloaded(RemoteResult<ListDetail>),
}

/// What applying a completion did to local state.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    Confirmed(Uuid),
    /// A newer intent for the item was sent in its place.
    Superseded(Uuid),
    RolledBack {
        item_id: Uuid,
        error: RemoteError,
    },
    Added(Uuid),
    AddFailed(RemoteError),
    Reloaded,
    ReloadFailed(RemoteError),
}

impl Reconciled {
    /// Error to show the user. A rejected token on an update only triggers
    /// the reload; the reload reports its own failure if it has one.
    pub fn surfaced_error(&self) -> Option<&RemoteError> {
        match self {
            Reconciled::RolledBack { error, .. } if !error.is_unauthorized() => Some(error),
            Reconciled::AddFailed(error) | Reconciled::ReloadFailed(error) => Some(error),
            _ => None,
        }
    }
}

struct InFlight {
    /// Last value the server is known to hold.
    baseline: ShoppingListItem,
    /// A newer local intent is waiting for this call to finish.
    pending: bool,
}

pub struct SyncCoordinator {
    service: Arc<dyn RemoteListService>,
    calls: FuturesUnordered<BoxFuture<'static, Completion>>,
    in_flight: HashMap<Uuid, InFlight>,
    settled: HashMap<Uuid, MutationState>,
    reload_requested: bool,
}

impl SyncCoordinator {
    pub fn new(service: Arc<dyn RemoteListService>) -> Self {
        Self {
            service,
            calls: FuturesUnordered::new(),
            in_flight: HashMap::new(),
            settled: HashMap::new(),
            reload_requested: false,
        }
    }

    pub fn state_of(&self, item_id: Uuid) -> MutationState {
        match self.in_flight.get(&item_id) {
            Some(flight) if flight.pending => MutationState::LocalApplied,
            Some(_) => MutationState::Persisting,
            None => self
                .settled
                .get(&item_id)
                .copied()
                .unwrap_or(MutationState::Idle),
        }
    }

    /// Number of remote calls not yet applied.
    pub fn outstanding(&self) -> usize {
        self.calls.len()
    }

    pub fn is_idle(&self) -> bool {
        self.calls.is_empty()
    }

    /// Checks or unchecks an item locally and queues the update.
    ///
    /// Setting the value the item already has is a no-op and sends nothing.
    pub fn toggle_checked(
        &mut self,
        store: &mut ListItemStore,
        item_id: Uuid,
        checked: bool,
    ) -> Result<MutationState, SyncError> {
        let baseline = store
            .get(item_id)
            .cloned()
            .ok_or(ValidationError::UnknownItem(item_id))?;
        if baseline.checked == checked {
            return Ok(self.state_of(item_id));
        }

        store.set_checked(item_id, checked);
        Ok(self.persist(store, item_id, baseline))
    }

    /// Edits an item locally and queues the update.
    pub fn update_item(
        &mut self,
        store: &mut ListItemStore,
        item_id: Uuid,
        edit: &ItemEdit,
    ) -> Result<MutationState, SyncError> {
        let baseline = store
            .get(item_id)
            .cloned()
            .ok_or(ValidationError::UnknownItem(item_id))?;
        let edited = baseline.apply_edit(edit);
        edited.validate()?;
        if edited == baseline {
            return Ok(self.state_of(item_id));
        }

        store.replace_item(edited);
        Ok(self.persist(store, item_id, baseline))
    }

    /// Validates a new item and queues its creation.
    ///
    /// Nothing is inserted locally until the server returns the canonical
    /// item with its id and position.
    pub fn add_item(&mut self, store: &ListItemStore, draft: NewItem) -> Result<(), SyncError> {
        draft.validate()?;
        let list_id = store.list_id().ok_or(SyncError::NoList)?;

        let service = Arc::clone(&self.service);
        tracing::debug!(list = %list_id, note = %draft.note, "creating item");
        self.calls.push(Box::pin(async move {
            Completion::Created(service.create_item(list_id, &draft).await)
        }));
        Ok(())
    }

    /// Queues a full reload of the list unless one is already queued.
    pub fn request_reload(&mut self, list_id: Uuid) {
        if self.reload_requested {
            return;
        }
        self.reload_requested = true;

        let service = Arc::clone(&self.service);
        self.calls.push(Box::pin(async move {
            Completion::Reloaded(service.fetch_list_detail(list_id).await)
        }));
    }

    /// Waits for the next remote call to finish. `None` when nothing is queued.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.calls.next().await
    }

    /// Reconciles the store with a finished call.
    pub fn apply(&mut self, store: &mut ListItemStore, completion: Completion) -> Reconciled {
        let report = match completion {
            Completion::Persisted { item_id, result } => self.apply_persisted(store, item_id, result),
            Completion::Created(result) => self.apply_created(store, result),
            Completion::Reloaded(result) => self.apply_reloaded(store, result),
        };
        self.forget_missing(store);
        report
    }

    /// Drops settled states of items no longer in the store.
    pub fn forget_missing(&mut self, store: &ListItemStore) {
        self.settled.retain(|id, _| store.contains(*id));
    }

    fn persist(
        &mut self,
        store: &ListItemStore,
        item_id: Uuid,
        baseline: ShoppingListItem,
    ) -> MutationState {
        if let Some(flight) = self.in_flight.get_mut(&item_id) {
            flight.pending = true;
            return MutationState::LocalApplied;
        }
        self.send_update(store, item_id, baseline)
    }

    fn send_update(
        &mut self,
        store: &ListItemStore,
        item_id: Uuid,
        baseline: ShoppingListItem,
    ) -> MutationState {
        let Some(item) = store.get(item_id) else {
            return MutationState::Idle;
        };
        let update = item.to_update();
        let service = Arc::clone(&self.service);

        tracing::debug!(item = %item_id, checked = update.checked, "persisting item");
        self.calls.push(Box::pin(async move {
            let result = service.update_item(&update).await;
            Completion::Persisted { item_id, result }
        }));
        self.settled.remove(&item_id);
        self.in_flight.insert(
            item_id,
            InFlight {
                baseline,
                pending: false,
            },
        );
        MutationState::Persisting
    }

    fn apply_persisted(
        &mut self,
        store: &mut ListItemStore,
        item_id: Uuid,
        result: RemoteResult<ShoppingListItem>,
    ) -> Reconciled {
        let Some(flight) = self.in_flight.remove(&item_id) else {
            return Reconciled::Confirmed(item_id);
        };

        if flight.pending {
            let baseline = match result {
                Ok(confirmed) => confirmed,
                Err(error) => {
                    tracing::debug!(item = %item_id, %error, "dropping outcome of superseded update");
                    flight.baseline
                }
            };
            self.send_update(store, item_id, baseline);
            return Reconciled::Superseded(item_id);
        }

        match result {
            Ok(_) => {
                self.settled.insert(item_id, MutationState::Reconciled);
                Reconciled::Confirmed(item_id)
            }
            Err(error) => {
                tracing::warn!(item = %item_id, %error, "update failed, reloading list");
                if store.contains(item_id) {
                    store.replace_item(flight.baseline);
                }
                self.settled.insert(item_id, MutationState::RolledBack);
                if let Some(list_id) = store.list_id() {
                    self.request_reload(list_id);
                }
                Reconciled::RolledBack { item_id, error }
            }
        }
    }

    fn apply_created(
        &mut self,
        store: &mut ListItemStore,
        result: RemoteResult<ItemMutations>,
    ) -> Reconciled {
        match result {
            Ok(mutations) => {
                let failure = match mutations.created_items.into_iter().next() {
                    Some(item) => {
                        let item_id = item.id;
                        if store.insert_item(item, true) {
                            return Reconciled::Added(item_id);
                        }
                        "server created the item on another list"
                    }
                    None => "server reported no created item",
                };
                if let Some(list_id) = store.list_id() {
                    self.request_reload(list_id);
                }
                Reconciled::AddFailed(RemoteError::Decode(failure.to_string()))
            }
            Err(error) => {
                tracing::warn!(%error, "item creation failed");
                if error.is_unauthorized() {
                    if let Some(list_id) = store.list_id() {
                        self.request_reload(list_id);
                    }
                }
                Reconciled::AddFailed(error)
            }
        }
    }

    fn apply_reloaded(
        &mut self,
        store: &mut ListItemStore,
        result: RemoteResult<ListDetail>,
    ) -> Reconciled {
        self.reload_requested = false;
        match result {
            Ok(detail) => {
                // Intents still in flight win over the reloaded copy.
                let intents: Vec<ShoppingListItem> = self
                    .in_flight
                    .keys()
                    .filter_map(|id| store.get(*id).cloned())
                    .collect();
                store.load(detail);
                for item in intents {
                    store.replace_item(item);
                }

                for state in self.settled.values_mut() {
                    if *state == MutationState::RolledBack {
                        *state = MutationState::ReloadedFromServer;
                    }
                }
                Reconciled::Reloaded
            }
            Err(error) => {
                tracing::warn!(%error, "reload failed");
                Reconciled::ReloadFailed(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fake::{id_of, list_fixture, Call, FakeListService, Op};

    struct Harness {
        fake: Arc<FakeListService>,
        store: ListItemStore,
        coordinator: SyncCoordinator,
    }

    impl Harness {
        fn new(items: &[(&str, bool)]) -> (Self, crate::models::ListDetail) {
            let detail = list_fixture(items);
            let fake = Arc::new(FakeListService::new(detail.clone()));
            let harness = Self {
                store: ListItemStore::new(detail.clone()),
                coordinator: SyncCoordinator::new(fake.clone()),
                fake,
            };
            (harness, detail)
        }

        async fn settle(&mut self) -> Vec<Reconciled> {
            let mut reports = Vec::new();
            while let Some(c) = self.coordinator.next_completion().await {
                reports.push(self.coordinator.apply(&mut self.store, c));
            }
            reports
        }
    }

    #[tokio::test]
    async fn test_toggle_applies_locally_before_remote() {
        let (mut h, detail) = Harness::new(&[("eggs", false), ("milk", false)]);
        let eggs = id_of(&detail, "eggs");

        let state = h
            .coordinator
            .toggle_checked(&mut h.store, eggs, true)
            .unwrap();

        assert_eq!(state, MutationState::Persisting);
        assert!(h.store.get(eggs).unwrap().checked);
        assert!(h.fake.calls().is_empty());

        let reports = h.settle().await;
        assert_eq!(reports, vec![Reconciled::Confirmed(eggs)]);
        assert_eq!(h.coordinator.state_of(eggs), MutationState::Reconciled);
    }

    #[tokio::test]
    async fn test_update_sends_full_item_state() {
        let (mut h, detail) = Harness::new(&[("eggs", false), ("milk", false)]);
        let milk = id_of(&detail, "milk");

        h.coordinator
            .toggle_checked(&mut h.store, milk, true)
            .unwrap();
        h.settle().await;

        let updates = h.fake.update_calls();
        assert_eq!(updates.len(), 1);
        let sent = &updates[0];
        assert_eq!(sent.id, milk);
        assert_eq!(sent.shopping_list_id, detail.list.id);
        assert_eq!(sent.note, "milk");
        assert_eq!(sent.quantity, Some(1.0));
        assert_eq!(sent.position, 1);
        assert!(sent.checked);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let (mut h, detail) = Harness::new(&[("a", false), ("b", true), ("c", true)]);
        let b = id_of(&detail, "b");
        let before = h.store.items().to_vec();

        h.coordinator.toggle_checked(&mut h.store, b, false).unwrap();
        h.settle().await;
        h.coordinator.toggle_checked(&mut h.store, b, true).unwrap();
        h.settle().await;

        assert_eq!(h.store.items(), before.as_slice());
        assert_eq!(h.fake.update_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_toggle_to_current_value_sends_nothing() {
        let (mut h, detail) = Harness::new(&[("eggs", true)]);
        let eggs = id_of(&detail, "eggs");

        let state = h
            .coordinator
            .toggle_checked(&mut h.store, eggs, true)
            .unwrap();

        assert_eq!(state, MutationState::Idle);
        assert!(h.coordinator.is_idle());
    }

    #[tokio::test]
    async fn test_toggle_unknown_item_is_rejected() {
        let (mut h, _) = Harness::new(&[("eggs", false)]);
        let missing = Uuid::new_v4();

        let err = h
            .coordinator
            .toggle_checked(&mut h.store, missing, true)
            .unwrap_err();
        assert_eq!(
            err,
            SyncError::Validation(ValidationError::UnknownItem(missing))
        );
    }

    #[tokio::test]
    async fn test_newer_intent_supersedes_in_flight_update() {
        let (mut h, detail) = Harness::new(&[("eggs", false)]);
        let eggs = id_of(&detail, "eggs");

        assert_eq!(
            h.coordinator.toggle_checked(&mut h.store, eggs, true).unwrap(),
            MutationState::Persisting
        );
        assert_eq!(
            h.coordinator.toggle_checked(&mut h.store, eggs, false).unwrap(),
            MutationState::LocalApplied
        );
        h.coordinator.toggle_checked(&mut h.store, eggs, true).unwrap();
        assert_eq!(h.coordinator.outstanding(), 1);

        let reports = h.settle().await;
        assert_eq!(
            reports,
            vec![Reconciled::Superseded(eggs), Reconciled::Confirmed(eggs)]
        );

        let updates = h.fake.update_calls();
        assert_eq!(updates.len(), 2);
        assert!(updates[1].checked);
        assert!(h.store.get(eggs).unwrap().checked);
    }

    #[tokio::test]
    async fn test_unauthorized_update_reloads_without_surfacing() {
        let (mut h, detail) = Harness::new(&[("eggs", false)]);
        let eggs = id_of(&detail, "eggs");
        h.fake.fail_next(Op::UpdateItem, RemoteError::Unauthorized);

        h.coordinator.toggle_checked(&mut h.store, eggs, true).unwrap();
        let reports = h.settle().await;

        assert_eq!(
            reports[0],
            Reconciled::RolledBack {
                item_id: eggs,
                error: RemoteError::Unauthorized
            }
        );
        assert!(reports[0].surfaced_error().is_none());
        assert_eq!(reports[1], Reconciled::Reloaded);
        assert!(!h.store.get(eggs).unwrap().checked);
        assert_eq!(h.fake.count(|c| matches!(c, Call::FetchDetail(_))), 1);
        assert_eq!(h.coordinator.state_of(eggs), MutationState::ReloadedFromServer);
    }

    #[tokio::test]
    async fn test_other_failure_surfaces_and_reloads_server_state() {
        let (mut h, detail) = Harness::new(&[("eggs", false)]);
        let eggs = id_of(&detail, "eggs");
        let error = RemoteError::Http {
            status: 500,
            message: "boom".to_string(),
        };
        h.fake.fail_next(Op::UpdateItem, error.clone());

        let mut server_items = h.fake.server_items();
        server_items.push(
            ShoppingListItem::new(Uuid::new_v4(), detail.list.id, "added elsewhere")
                .with_position(5),
        );
        h.fake.set_server_items(server_items);

        h.coordinator.toggle_checked(&mut h.store, eggs, true).unwrap();
        let reports = h.settle().await;

        assert_eq!(reports[0].surfaced_error(), Some(&error));
        assert_eq!(h.store.len(), 2);
        assert!(!h.store.get(eggs).unwrap().checked);
    }

    #[tokio::test]
    async fn test_add_blank_item_makes_no_call() {
        let (mut h, _) = Harness::new(&[]);

        let err = h
            .coordinator
            .add_item(&h.store, NewItem::new("").with_quantity(1.0))
            .unwrap_err();

        assert_eq!(err, SyncError::Validation(ValidationError::EmptyItem));
        assert!(h.coordinator.is_idle());
        h.settle().await;
        assert!(h.fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_inserts_server_item_at_front() {
        let (mut h, _) = Harness::new(&[("eggs", false), ("milk", true)]);

        h.coordinator
            .add_item(&h.store, NewItem::new("bread").with_quantity(2.0))
            .unwrap();
        let reports = h.settle().await;

        let added = match reports[0] {
            Reconciled::Added(id) => id,
            ref other => panic!("unexpected report: {:?}", other),
        };
        let first = &h.store.items()[0];
        assert_eq!(first.id, added);
        assert_eq!(first.note, "bread");
        assert_eq!(first.quantity, Some(2.0));
    }

    #[tokio::test]
    async fn test_created_item_goes_first_whatever_its_position() {
        let (mut h, detail) = Harness::new(&[("eggs", false), ("milk", false), ("jam", false)]);
        let bread = ShoppingListItem::new(Uuid::new_v4(), detail.list.id, "bread").with_position(3);
        let created = ItemMutations {
            created_items: vec![bread.clone()],
            ..Default::default()
        };

        let report = h.coordinator.apply(&mut h.store, Completion::Created(Ok(created)));

        assert_eq!(report, Reconciled::Added(bread.id));
        let notes: Vec<&str> = h.store.items().iter().map(|i| i.note.as_str()).collect();
        assert_eq!(notes, vec!["bread", "eggs", "milk", "jam"]);
    }

    #[tokio::test]
    async fn test_created_item_on_another_list_fails_and_reloads() {
        let (mut h, _) = Harness::new(&[("eggs", false)]);
        let stray = ShoppingListItem::new(Uuid::new_v4(), Uuid::new_v4(), "bread");
        let created = ItemMutations {
            created_items: vec![stray.clone()],
            ..Default::default()
        };

        let report = h.coordinator.apply(&mut h.store, Completion::Created(Ok(created)));

        assert!(matches!(report, Reconciled::AddFailed(_)));
        assert!(report.surfaced_error().is_some());
        assert!(!h.store.contains(stray.id));
        assert_eq!(h.coordinator.outstanding(), 1);

        let reports = h.settle().await;
        assert_eq!(reports, vec![Reconciled::Reloaded]);
        assert_eq!(h.fake.count(|c| matches!(c, Call::FetchDetail(_))), 1);
    }

    #[tokio::test]
    async fn test_settled_state_dropped_with_item() {
        let (mut h, detail) = Harness::new(&[("eggs", false), ("milk", false)]);
        let eggs = id_of(&detail, "eggs");

        h.coordinator.toggle_checked(&mut h.store, eggs, true).unwrap();
        h.settle().await;
        assert_eq!(h.coordinator.state_of(eggs), MutationState::Reconciled);

        h.store.remove(&[eggs]);
        h.coordinator.forget_missing(&h.store);
        assert_eq!(h.coordinator.state_of(eggs), MutationState::Idle);
        assert!(h.coordinator.settled.is_empty());
    }

    #[tokio::test]
    async fn test_add_failure_leaves_store_untouched() {
        let (mut h, _) = Harness::new(&[("eggs", false)]);
        h.fake
            .fail_next(Op::CreateItem, RemoteError::Network("offline".to_string()));
        let before = h.store.items().to_vec();

        h.coordinator
            .add_item(&h.store, NewItem::new("bread"))
            .unwrap();
        let reports = h.settle().await;

        assert!(matches!(reports[0], Reconciled::AddFailed(_)));
        assert!(reports[0].surfaced_error().is_some());
        assert_eq!(h.store.items(), before.as_slice());
    }

    #[tokio::test]
    async fn test_edit_is_validated_and_persisted() {
        let (mut h, detail) = Harness::new(&[("eggs", false)]);
        let eggs = id_of(&detail, "eggs");

        let blank = ItemEdit {
            note: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(h.coordinator.update_item(&mut h.store, eggs, &blank).is_err());
        assert_eq!(h.store.get(eggs).unwrap().note, "eggs");

        let edit = ItemEdit {
            quantity: Some(12.0),
            ..Default::default()
        };
        h.coordinator.update_item(&mut h.store, eggs, &edit).unwrap();
        h.settle().await;

        assert_eq!(h.fake.update_calls()[0].quantity, Some(12.0));
        assert_eq!(h.store.get(eggs).unwrap().quantity, Some(12.0));
    }

    #[tokio::test]
    async fn test_reload_keeps_intents_still_in_flight() {
        let (mut h, detail) = Harness::new(&[("eggs", false), ("milk", false)]);
        let milk = id_of(&detail, "milk");

        h.coordinator.toggle_checked(&mut h.store, milk, true).unwrap();
        // A reload lands while the update is still queued.
        let report = h
            .coordinator
            .apply(&mut h.store, Completion::Reloaded(Ok(detail.clone())));

        assert_eq!(report, Reconciled::Reloaded);
        assert!(h.store.get(milk).unwrap().checked);
        assert_eq!(h.coordinator.state_of(milk), MutationState::Persisting);

        h.settle().await;
        assert!(h.store.get(milk).unwrap().checked);
        assert!(h.fake.server_items().iter().any(|i| i.id == milk && i.checked));
    }
}
