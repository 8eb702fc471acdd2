//! List-level commands: show all lists, create, rename, delete.

use std::sync::Arc;

use clap::{Args, Subcommand};

use super::{ListSelector, OutputFormat};
use crate::config::Config;
use crate::context::{self, CommandResult};
use shopsync_core::{ListSession, RemoteListService, ShoppingList};

#[derive(Args)]
pub struct ListsCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    format: OutputFormat,
}

impl ListsCommand {
    pub fn run(&self, config: &Config) -> CommandResult {
        let service = context::connect(config)?;
        let lists = context::runtime()?.block_on(service.fetch_lists())?;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&lists)?),
            OutputFormat::Table => print_lists(&lists, config.default_list.value.as_deref()),
        }
        Ok(())
    }
}

fn print_lists(lists: &[ShoppingList], default_list: Option<&str>) {
    if lists.is_empty() {
        println!("No shopping lists found.");
        return;
    }

    println!("{:<38} NAME", "ID");
    println!("{}", "-".repeat(60));
    for list in lists {
        let is_default = default_list.is_some_and(|d| {
            d.eq_ignore_ascii_case(list.display_name()) || d == list.id.to_string()
        });
        let marker = if is_default { " (default)" } else { "" };
        println!("{:<38} {}{}", list.id, list.display_name(), marker);
    }
}

#[derive(Args)]
pub struct ListCommand {
    #[command(subcommand)]
    pub command: ListSubcommand,
}

#[derive(Subcommand)]
pub enum ListSubcommand {
    /// Create a new shopping list
    Create {
        /// List name (optional)
        name: Option<String>,
    },

    /// Rename a list; an empty name clears it
    Rename {
        /// New name
        name: String,

        #[command(flatten)]
        selector: ListSelector,
    },

    /// Delete a list and all its items
    Delete {
        #[command(flatten)]
        selector: ListSelector,

        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
    },
}

impl ListCommand {
    pub fn run(&self, config: &Config) -> CommandResult {
        let service = context::connect(config)?;
        let rt = context::runtime()?;

        match &self.command {
            ListSubcommand::Create { name } => {
                let session = rt.block_on(ListSession::create(service, name.as_deref()))?;
                if let Some(list) = session.store().list() {
                    println!("Created list '{}' ({})", list.display_name(), list.id);
                }
                Ok(())
            }

            ListSubcommand::Rename { name, selector } => {
                rt.block_on(rename(service, config, selector, name))
            }

            ListSubcommand::Delete { selector, yes } => {
                rt.block_on(delete(service, config, selector, *yes))
            }
        }
    }
}

async fn rename(
    service: Arc<dyn RemoteListService>,
    config: &Config,
    selector: &ListSelector,
    name: &str,
) -> CommandResult {
    let mut session = context::open_list(service, config, selector.list.as_deref()).await?;
    let old = list_name(&session);
    session.rename_list(name).await;
    context::check(&session)?;
    println!("Renamed '{}' to '{}'", old, list_name(&session));
    Ok(())
}

async fn delete(
    service: Arc<dyn RemoteListService>,
    config: &Config,
    selector: &ListSelector,
    yes: bool,
) -> CommandResult {
    let mut session = context::open_list(service, config, selector.list.as_deref()).await?;
    let name = list_name(&session);
    if !yes {
        return Err(format!(
            "Refusing to delete '{}' ({} items) without --yes",
            name,
            session.store().len()
        )
        .into());
    }
    session.delete_list().await;
    context::check(&session)?;
    println!("Deleted list '{}'", name);
    Ok(())
}

fn list_name(session: &ListSession) -> String {
    session
        .store()
        .list()
        .map(|l| l.display_name().to_string())
        .unwrap_or_default()
}
