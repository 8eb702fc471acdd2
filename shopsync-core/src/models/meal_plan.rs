use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::entry_type::EntryType;

/// A scheduled meal as reported by the remote service.
///
/// Entries are read-only from this crate's point of view. Freeform entries
/// (a note like "leftovers") carry no recipe and are skipped on import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub entry_type: EntryType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub recipe_id: Option<Uuid>,
}

impl MealPlanEntry {
    pub fn new(id: i64, date: NaiveDate, entry_type: EntryType) -> Self {
        Self {
            id,
            date,
            entry_type,
            title: String::new(),
            text: String::new(),
            recipe_id: None,
        }
    }

    pub fn with_recipe(mut self, recipe_id: Uuid) -> Self {
        self.recipe_id = Some(recipe_id);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl fmt::Display for MealPlanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.title.is_empty() {
            "(untitled)"
        } else {
            self.title.as_str()
        };
        write!(f, "{} {:<9} {}", self.date, self.entry_type, label)?;
        if self.recipe_id.is_none() {
            write!(f, " [no recipe]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_builder() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let recipe = Uuid::new_v4();
        let entry = MealPlanEntry::new(7, date, EntryType::Dinner)
            .with_title("Lasagna")
            .with_recipe(recipe);

        assert_eq!(entry.recipe_id, Some(recipe));
        assert_eq!(entry.title, "Lasagna");
    }

    #[test]
    fn test_entry_display_marks_freeform() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let entry = MealPlanEntry::new(1, date, EntryType::Lunch).with_title("Leftovers");

        let output = format!("{}", entry);
        assert!(output.contains("2025-01-01"));
        assert!(output.contains("lunch"));
        assert!(output.contains("[no recipe]"));
    }

    #[test]
    fn test_entry_deserializes_without_recipe() {
        let json = r#"{"id": 3, "date": "2025-02-10", "entryType": "side", "title": "Salad"}"#;
        let entry: MealPlanEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.entry_type, EntryType::Side);
        assert!(entry.recipe_id.is_none());
        assert!(entry.text.is_empty());
    }
}
