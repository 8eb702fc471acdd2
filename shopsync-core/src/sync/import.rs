//! Meal-plan ingredient import.
//!
//! Turns a date range into one bulk "add these recipes' ingredients"
//! request: fetch the scheduled entries, keep the recipe ids, deduplicate,
//! send them in a single call, then reload the list so the new items show
//! up with server-assigned ids and positions.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use super::error::SyncError;
use crate::models::MealPlanEntry;
use crate::service::{RemoteListService, DATE_FORMAT};
use crate::store::ListItemStore;

/// A closed range of whole calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateRange {
    /// From the start of `start` through the end of `end`. Reversed bounds
    /// are swapped.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        let (first, last) = if start <= end {
            (start, end)
        } else {
            (end, start)
        };
        Self {
            start: first.and_time(NaiveTime::MIN),
            end: last.and_time(end_of_day()),
        }
    }

    /// Widens arbitrary timestamps to day boundaries.
    pub fn from_datetimes(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self::new(start.date(), end.date())
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }

    /// Bounds formatted for the remote query.
    pub fn query_bounds(&self) -> (String, String) {
        (
            self.start_date().format(DATE_FORMAT).to_string(),
            self.end_date().format(DATE_FORMAT).to_string(),
        )
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = self.query_bounds();
        write!(f, "{} to {}", start, end)
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
}

/// Successful results of an import.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    /// One bulk call was made with these recipe ids.
    Imported { recipe_ids: Vec<Uuid> },
    /// The range holds no recipe-linked entries; nothing was sent.
    NoRecipesInRange,
}

pub struct MealPlanImportMerger {
    service: Arc<dyn RemoteListService>,
}

impl MealPlanImportMerger {
    pub fn new(service: Arc<dyn RemoteListService>) -> Self {
        Self { service }
    }

    /// Recipe ids referenced by the entries, each once, in first-seen order.
    pub fn collect_recipe_ids(entries: &[MealPlanEntry]) -> Vec<Uuid> {
        let mut seen = HashSet::new();
        entries
            .iter()
            .filter_map(|entry| entry.recipe_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Imports the ingredients of every recipe planned in `range`.
    ///
    /// On any failure the store is left as it was.
    pub async fn import(
        &self,
        store: &mut ListItemStore,
        range: &DateRange,
    ) -> Result<ImportOutcome, SyncError> {
        let list_id = store.list_id().ok_or(SyncError::NoList)?;

        let entries = self
            .service
            .fetch_meal_plan_entries(range.start_date(), range.end_date())
            .await?;
        let recipe_ids = Self::collect_recipe_ids(&entries);
        tracing::debug!(
            %range,
            entries = entries.len(),
            recipes = recipe_ids.len(),
            "meal plan entries fetched"
        );

        if recipe_ids.is_empty() {
            return Ok(ImportOutcome::NoRecipesInRange);
        }

        self.service
            .bulk_add_recipes_to_list(list_id, &recipe_ids)
            .await?;
        let detail = self.service.fetch_list_detail(list_id).await?;
        store.load(detail);

        tracing::info!(list = %list_id, recipes = recipe_ids.len(), "imported meal plan");
        Ok(ImportOutcome::Imported { recipe_ids })
    }
}
