//! Food catalogue search.

use std::time::Duration;

use clap::Args;

use super::OutputFormat;
use crate::config::Config;
use crate::context::{self, CommandResult};
use shopsync_core::FoodSearch;

#[derive(Args)]
pub struct FoodsCommand {
    /// Search text
    query: String,

    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    format: OutputFormat,
}

impl FoodsCommand {
    pub fn run(&self, config: &Config) -> CommandResult {
        context::runtime()?.block_on(self.execute(config))
    }

    async fn execute(&self, config: &Config) -> CommandResult {
        if self.query.trim().is_empty() {
            return Err("Search text cannot be empty".into());
        }

        let service = context::connect(config)?;
        // A single query has nothing to debounce.
        let mut search = FoodSearch::with_debounce(service, Duration::ZERO);
        let mut results = search.subscribe();

        search.query(&self.query);
        results.changed().await?;
        let found = results.borrow().clone();

        if let Some(error) = found.error {
            return Err(error.into());
        }

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&found.foods)?),
            OutputFormat::Table => {
                if found.foods.is_empty() {
                    println!("No foods match '{}'", found.query);
                    return Ok(());
                }
                println!("{:<38} NAME", "ID");
                println!("{}", "-".repeat(60));
                for food in &found.foods {
                    println!("{:<38} {}", food.id, food);
                }
            }
        }
        Ok(())
    }
}
