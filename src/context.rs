//! Shared plumbing for commands that talk to the server.
//!
//! Builds the tokio runtime and HTTP service from the configuration and
//! resolves the list and item references users type on the command line.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::Config;
use shopsync_core::{HttpListService, ListItemStore, ListSession, RemoteListService, ShoppingList};

pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Runtime for one command.
pub fn runtime() -> CommandResult<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Runtime::new()?)
}

/// HTTP service built from the configured server and token.
pub fn connect(config: &Config) -> CommandResult<Arc<dyn RemoteListService>> {
    let (url, token) = config.credentials()?;
    let service = HttpListService::with_timeout(url.to_string(), token.to_string(), config.timeout())?;
    tracing::debug!(server = %service.server_url(), "using server");
    Ok(Arc::new(service))
}

/// Opens the list named by `--list`, the configured default, or the only
/// list on the server.
pub async fn open_list(
    service: Arc<dyn RemoteListService>,
    config: &Config,
    list: Option<&str>,
) -> CommandResult<ListSession> {
    let reference = list.or(config.default_list.value.as_deref());
    let list_id = match reference.map(|r| r.trim().parse::<Uuid>()) {
        Some(Ok(id)) => id,
        _ => {
            let lists = service.fetch_lists().await?;
            match_list(&lists, reference)?
        }
    };
    Ok(ListSession::open(service, list_id).await?)
}

/// Finds a list by case-insensitive name. Without a name, a server with a
/// single list resolves to it.
pub fn match_list(lists: &[ShoppingList], reference: Option<&str>) -> CommandResult<Uuid> {
    let Some(name) = reference.map(str::trim) else {
        return match lists {
            [only] => Ok(only.id),
            [] => Err("No shopping lists found. Create one with 'shop list create'.".into()),
            _ => Err("Several lists exist; pass --list or set default_list.".into()),
        };
    };

    let matches: Vec<&ShoppingList> = lists
        .iter()
        .filter(|l| l.display_name().eq_ignore_ascii_case(name))
        .collect();
    match matches.as_slice() {
        [only] => Ok(only.id),
        [] => Err(format!("List not found: {}", name).into()),
        _ => Err(format!("List name '{}' is ambiguous; use its id", name).into()),
    }
}

/// Finds an item by id, id prefix, or case-insensitive label.
pub fn resolve_item(store: &ListItemStore, reference: &str) -> CommandResult<Uuid> {
    let reference = reference.trim();
    if let Ok(id) = reference.parse::<Uuid>() {
        if store.contains(id) {
            return Ok(id);
        }
        return Err(format!("Item not found: {}", id).into());
    }

    let by_label: Vec<Uuid> = store
        .items()
        .iter()
        .filter(|i| i.label().eq_ignore_ascii_case(reference) || i.note.eq_ignore_ascii_case(reference))
        .map(|i| i.id)
        .collect();
    let candidates = if by_label.is_empty() && reference.len() >= 4 {
        store
            .items()
            .iter()
            .filter(|i| i.id.to_string().starts_with(&reference.to_lowercase()))
            .map(|i| i.id)
            .collect()
    } else {
        by_label
    };

    match candidates.as_slice() {
        [id] => Ok(*id),
        [] => Err(format!("Item not found: {}", reference).into()),
        _ => Err(format!("'{}' matches several items; use the item id", reference).into()),
    }
}

/// Turns the session's last error into a command error.
pub fn check(session: &ListSession) -> CommandResult {
    match session.last_error() {
        Some(error) => Err(error.clone().into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopsync_core::{ListDetail, ShoppingListItem};

    fn store() -> ListItemStore {
        let list_id = Uuid::new_v4();
        let items = vec![
            ShoppingListItem::new(Uuid::new_v4(), list_id, "Milk"),
            ShoppingListItem::new(Uuid::new_v4(), list_id, "Eggs").with_position(1),
            ShoppingListItem::new(Uuid::new_v4(), list_id, "eggs").with_position(2),
        ];
        ListItemStore::new(
            ListDetail::new(ShoppingList::new(list_id, Some("Weekly".to_string()))).with_items(items),
        )
    }

    #[test]
    fn test_match_list_by_name() {
        let weekly = ShoppingList::new(Uuid::new_v4(), Some("Weekly".to_string()));
        let party = ShoppingList::new(Uuid::new_v4(), Some("Party".to_string()));
        let lists = vec![weekly.clone(), party];

        assert_eq!(match_list(&lists, Some("weekly")).unwrap(), weekly.id);
        assert!(match_list(&lists, Some("missing")).is_err());
        assert!(match_list(&lists, None).is_err());
        assert_eq!(match_list(&lists[..1], None).unwrap(), weekly.id);
    }

    #[test]
    fn test_resolve_item_by_label() {
        let store = store();
        let milk = store.items()[0].id;

        assert_eq!(resolve_item(&store, "milk").unwrap(), milk);
        assert_eq!(resolve_item(&store, &milk.to_string()).unwrap(), milk);
    }

    #[test]
    fn test_resolve_item_ambiguous_and_missing() {
        let store = store();

        let err = resolve_item(&store, "EGGS").unwrap_err();
        assert!(err.to_string().contains("several items"));
        assert!(resolve_item(&store, "bread").is_err());
    }

    #[test]
    fn test_resolve_item_by_id_prefix() {
        let store = store();
        let milk = store.items()[0].id;
        let prefix = &milk.to_string()[..8];

        assert_eq!(resolve_item(&store, prefix).unwrap(), milk);
    }
}
