//! Sequential multi-item deletes.
//!
//! Items are removed from the store up front, then deleted remotely one at
//! a time, each call awaited before the next starts. The first failure
//! stops the batch: deletes that already succeeded stay committed, and the
//! [`RestorePolicy`] decides which of the remaining items go back into the
//! store. The split between committed and restored is returned as a
//! [`BulkOutcome`] value.

use std::collections::VecDeque;
use std::sync::Arc;

use uuid::Uuid;

use crate::service::{RemoteError, RemoteListService};
use crate::store::{ListItemStore, RemovedItem};

/// Which items are put back when a batch aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorePolicy {
    /// Only the item whose delete failed. Items never attempted stay out
    /// of the store and are reported as skipped.
    FailedOnly,
    /// The failed item and every item not yet attempted.
    FailedAndPending,
}

/// The delete that stopped a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkFailure {
    pub item_id: Uuid,
    pub error: RemoteError,
}

/// Result of a batch: what was committed, what was put back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkOutcome {
    /// Deleted on the server, in call order.
    pub deleted: Vec<Uuid>,
    /// Reinserted into the store after the abort.
    pub restored: Vec<Uuid>,
    /// Never attempted and not restored.
    pub skipped: Vec<Uuid>,
    pub failure: Option<BulkFailure>,
}

impl BulkOutcome {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

pub struct BulkOperationRunner {
    service: Arc<dyn RemoteListService>,
}

impl BulkOperationRunner {
    pub fn new(service: Arc<dyn RemoteListService>) -> Self {
        Self { service }
    }

    /// Deletes the given items in order. On failure only the failing item
    /// is restored.
    pub async fn delete_many(&self, store: &mut ListItemStore, item_ids: &[Uuid]) -> BulkOutcome {
        self.run(store, item_ids, RestorePolicy::FailedOnly).await
    }

    /// Deletes every checked item. On failure the failing item and the
    /// checked items not yet attempted are restored.
    pub async fn remove_checked(&self, store: &mut ListItemStore) -> BulkOutcome {
        let checked = store.checked_ids();
        self.run(store, &checked, RestorePolicy::FailedAndPending)
            .await
    }

    pub async fn run(
        &self,
        store: &mut ListItemStore,
        item_ids: &[Uuid],
        policy: RestorePolicy,
    ) -> BulkOutcome {
        let mut removed = store.remove(item_ids);

        // Delete in the order requested, not the order they were displayed.
        let mut queue = VecDeque::with_capacity(removed.len());
        for id in item_ids {
            if let Some(pos) = removed.iter().position(|r| r.item.id == *id) {
                queue.push_back(removed.swap_remove(pos));
            } else if !queue.iter().any(|r: &RemovedItem| r.item.id == *id) {
                tracing::debug!(item = %id, "skipping unknown item");
            }
        }

        let mut outcome = BulkOutcome::default();
        while let Some(next) = queue.pop_front() {
            let item_id = next.item.id;
            match self.service.delete_item(item_id).await {
                Ok(()) => outcome.deleted.push(item_id),
                Err(error) => {
                    tracing::warn!(
                        item = %item_id,
                        %error,
                        deleted = outcome.deleted.len(),
                        remaining = queue.len(),
                        "bulk delete aborted"
                    );

                    let mut restore = vec![next];
                    match policy {
                        RestorePolicy::FailedOnly => {
                            outcome.skipped = queue.iter().map(|r| r.item.id).collect();
                        }
                        RestorePolicy::FailedAndPending => restore.extend(queue.drain(..)),
                    }

                    restore.sort_by_key(|r| r.index);
                    for r in restore {
                        outcome.restored.push(r.item.id);
                        store.reinsert(r.item, r.index);
                    }

                    outcome.failure = Some(BulkFailure { item_id, error });
                    break;
                }
            }
        }

        outcome
    }
}
