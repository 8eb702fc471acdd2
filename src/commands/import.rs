//! Meal-plan import command.
//!
//! Adds the ingredients of every recipe planned in a date range to a list.

use chrono::{Datelike, Local, NaiveDate};
use clap::Args;

use super::ListSelector;
use crate::config::Config;
use crate::context::{self, CommandResult};
use shopsync_core::service::DATE_FORMAT;
use shopsync_core::{DateRange, ImportOutcome};

#[derive(Args)]
pub struct ImportCommand {
    /// First day (YYYY-MM-DD), defaults to the start of the current week
    #[arg(long)]
    from: Option<String>,

    /// Last day (YYYY-MM-DD), defaults to six days after --from
    #[arg(long)]
    to: Option<String>,

    #[command(flatten)]
    selector: ListSelector,
}

impl ImportCommand {
    pub fn run(&self, config: &Config) -> CommandResult {
        let range = parse_range(self.from.as_deref(), self.to.as_deref(), Local::now().date_naive())?;
        context::runtime()?.block_on(self.execute(config, &range))
    }

    async fn execute(&self, config: &Config, range: &DateRange) -> CommandResult {
        let service = context::connect(config)?;
        let mut session = context::open_list(service, config, self.selector.list.as_deref()).await?;
        let before = session.store().len();

        let outcome = session.import_meal_plan(range).await;
        context::check(&session)?;

        if let Some(notice) = session.notice() {
            println!("{}", notice);
        }
        if let Some(ImportOutcome::Imported { .. }) = outcome {
            let added = session.store().len().saturating_sub(before);
            println!("{} ({} new items, {})", session_name(&session), added, range);
        }
        Ok(())
    }
}

fn session_name(session: &shopsync_core::ListSession) -> String {
    session
        .store()
        .list()
        .map(|l| l.display_name().to_string())
        .unwrap_or_default()
}

/// Resolves the command's date bounds against `today`.
fn parse_range(
    from: Option<&str>,
    to: Option<&str>,
    today: NaiveDate,
) -> Result<DateRange, Box<dyn std::error::Error>> {
    let start = match from {
        Some(s) => parse_date(s)?,
        None => get_week_start(today),
    };
    let end = match to {
        Some(s) => parse_date(s)?,
        None => start + chrono::Duration::days(6),
    };
    Ok(DateRange::new(start, end))
}

fn parse_date(s: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", s).into())
}

/// Get the Sunday that starts the week containing the given date.
fn get_week_start(date: NaiveDate) -> NaiveDate {
    let days_since_sunday = date.weekday().num_days_from_sunday();
    date - chrono::Duration::days(days_since_sunday as i64)
}
