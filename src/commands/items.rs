//! Item commands: show, add, edit, check, uncheck, delete, clear-checked.
//!
//! Every command opens the list, applies its change optimistically through
//! a session and waits for the server to settle before reporting.

use clap::Args;
use uuid::Uuid;

use super::{ListSelector, OutputFormat};
use crate::config::Config;
use crate::context::{self, CommandResult};
use shopsync_core::{BulkOutcome, ItemEdit, ListSession, NewItem, ShoppingListItem};

#[derive(Args)]
pub struct ShowCommand {
    #[command(flatten)]
    selector: ListSelector,

    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    format: OutputFormat,
}

impl ShowCommand {
    pub fn run(&self, config: &Config) -> CommandResult {
        let service = context::connect(config)?;
        let rt = context::runtime()?;
        let session = rt.block_on(context::open_list(service, config, self.selector.list.as_deref()))?;
        let store = session.store();

        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "list": store.list(),
                    "items": store.items(),
                    "recipeReferences": store.recipe_references(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                let name = store.list().map(|l| l.display_name()).unwrap_or_default();
                println!("{}", name);
                println!("{}", "=".repeat(44));

                if store.is_empty() {
                    println!("No items on this list.");
                    return Ok(());
                }
                for item in store.items() {
                    println!("{}", item);
                }

                if !store.recipe_references().is_empty() {
                    println!("{}", "-".repeat(44));
                    println!("Recipes:");
                    for recipe in store.recipe_references() {
                        println!(
                            "  {}",
                            recipe.recipe_name.as_deref().unwrap_or("(unnamed recipe)")
                        );
                    }
                }

                println!("{}", "-".repeat(44));
                println!(
                    "{} of {} items checked",
                    store.checked_ids().len(),
                    store.len()
                );
            }
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct AddCommand {
    /// Item text
    note: String,

    /// Quantity (default 1)
    #[arg(long, short)]
    qty: Option<f64>,

    /// Link to a food by id (see 'shop foods')
    #[arg(long)]
    food: Option<Uuid>,

    /// Unit id
    #[arg(long)]
    unit: Option<Uuid>,

    #[command(flatten)]
    selector: ListSelector,
}

impl AddCommand {
    pub fn run(&self, config: &Config) -> CommandResult {
        context::runtime()?.block_on(self.execute(config))
    }

    async fn execute(&self, config: &Config) -> CommandResult {
        let service = context::connect(config)?;
        let mut session = context::open_list(service, config, self.selector.list.as_deref()).await?;

        let mut draft = NewItem::new(self.note.trim())
            .with_food(self.food)
            .with_unit(self.unit);
        if let Some(qty) = self.qty {
            draft = draft.with_quantity(qty);
        }

        session.add_item(draft);
        context::check(&session)?;
        settle(&mut session).await?;

        println!("Added '{}'", self.note.trim());
        Ok(())
    }
}

#[derive(Args)]
pub struct EditCommand {
    /// Item id or text
    item: String,

    /// New text
    #[arg(long, short)]
    note: Option<String>,

    /// New quantity
    #[arg(long, short)]
    qty: Option<f64>,

    /// Link to a food by id
    #[arg(long)]
    food: Option<Uuid>,

    /// Unit id
    #[arg(long)]
    unit: Option<Uuid>,

    #[command(flatten)]
    selector: ListSelector,
}

impl EditCommand {
    pub fn run(&self, config: &Config) -> CommandResult {
        let edit = ItemEdit {
            note: self.note.clone(),
            quantity: self.qty,
            food_id: self.food,
            unit_id: self.unit,
            label_id: None,
        };
        if edit == ItemEdit::default() {
            return Err("Nothing to change. Pass --note, --qty, --food or --unit.".into());
        }

        context::runtime()?.block_on(self.execute(config, &edit))
    }

    async fn execute(&self, config: &Config, edit: &ItemEdit) -> CommandResult {
        let service = context::connect(config)?;
        let mut session = context::open_list(service, config, self.selector.list.as_deref()).await?;
        let item_id = context::resolve_item(session.store(), &self.item)?;

        session.update_item(item_id, edit);
        context::check(&session)?;
        settle(&mut session).await?;

        if let Some(item) = session.store().get(item_id) {
            println!("Updated: {}", item);
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct CheckCommand {
    /// Item ids or texts
    #[arg(required = true)]
    items: Vec<String>,

    #[command(flatten)]
    selector: ListSelector,
}

impl CheckCommand {
    /// Sets every named item to `checked`.
    pub fn run(&self, config: &Config, checked: bool) -> CommandResult {
        context::runtime()?.block_on(self.execute(config, checked))
    }

    async fn execute(&self, config: &Config, checked: bool) -> CommandResult {
        let service = context::connect(config)?;
        let mut session = context::open_list(service, config, self.selector.list.as_deref()).await?;
        let ids = resolve_all(&session, &self.items)?;

        let mut changed = Vec::new();
        for id in ids {
            let Some(item) = session.store().get(id) else {
                continue;
            };
            if item.checked == checked {
                println!(
                    "'{}' is already {}",
                    item.label(),
                    if checked { "checked" } else { "unchecked" }
                );
                continue;
            }
            changed.push(item.label().to_string());
            session.toggle_checked(id, checked);
            context::check(&session)?;
        }
        settle(&mut session).await?;

        let verb = if checked { "Checked" } else { "Unchecked" };
        for label in changed {
            println!("{} '{}'", verb, label);
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct DeleteCommand {
    /// Item ids or texts, deleted in the order given
    #[arg(required = true)]
    items: Vec<String>,

    #[command(flatten)]
    selector: ListSelector,
}

impl DeleteCommand {
    pub fn run(&self, config: &Config) -> CommandResult {
        context::runtime()?.block_on(self.execute(config))
    }

    async fn execute(&self, config: &Config) -> CommandResult {
        let service = context::connect(config)?;
        let mut session = context::open_list(service, config, self.selector.list.as_deref()).await?;
        let ids = resolve_all(&session, &self.items)?;
        let labels = labels_of(&session, &ids);

        let outcome = session.delete_items(&ids).await;
        report_bulk(&outcome, &labels);
        context::check(&session)
    }
}

#[derive(Args)]
pub struct ClearCheckedCommand {
    #[command(flatten)]
    selector: ListSelector,
}

impl ClearCheckedCommand {
    pub fn run(&self, config: &Config) -> CommandResult {
        context::runtime()?.block_on(self.execute(config))
    }

    async fn execute(&self, config: &Config) -> CommandResult {
        let service = context::connect(config)?;
        let mut session = context::open_list(service, config, self.selector.list.as_deref()).await?;
        let checked = session.store().checked_ids();
        if checked.is_empty() {
            println!("No checked items to clear");
            return Ok(());
        }
        let labels = labels_of(&session, &checked);

        let outcome = session.remove_checked().await;
        report_bulk(&outcome, &labels);
        context::check(&session)
    }
}

/// Waits for queued changes and turns a surfaced failure into an error.
async fn settle(session: &mut ListSession) -> CommandResult {
    session.settle().await;
    context::check(session)
}

fn resolve_all(session: &ListSession, references: &[String]) -> CommandResult<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(references.len());
    for reference in references {
        let id = context::resolve_item(session.store(), reference)?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn labels_of(session: &ListSession, ids: &[Uuid]) -> Vec<(Uuid, String)> {
    ids.iter()
        .filter_map(|id| session.store().get(*id))
        .map(|item: &ShoppingListItem| (item.id, item.label().to_string()))
        .collect()
}

fn report_bulk(outcome: &BulkOutcome, labels: &[(Uuid, String)]) {
    let label = |id: &Uuid| {
        labels
            .iter()
            .find(|(l, _)| l == id)
            .map(|(_, name)| name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    println!(
        "Deleted {} item{}",
        outcome.deleted.len(),
        if outcome.deleted.len() == 1 { "" } else { "s" }
    );
    if let Some(failure) = &outcome.failure {
        println!("Stopped at '{}': {}", label(&failure.item_id), failure.error);
        for id in &outcome.restored {
            println!("  kept '{}'", label(id));
        }
        for id in &outcome.skipped {
            println!("  not attempted '{}'", label(id));
        }
    }
}
