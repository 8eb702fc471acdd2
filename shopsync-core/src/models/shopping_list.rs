//! Shopping lists and their items.
//!
//! Field names serialize in camelCase to match the remote API. An item
//! always belongs to exactly one list; the owning list id is set at
//! construction and has no setter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Quantity used when an item does not carry one.
pub const DEFAULT_QUANTITY: f64 = 1.0;

/// Reasons an item is rejected before any network call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("An item needs a note or a linked food")]
    EmptyItem,

    #[error("Quantity must be a positive number, got {0}")]
    InvalidQuantity(f64),

    #[error("Item not found: {0}")]
    UnknownItem(Uuid),
}

/// Link from an item or a list to the recipe that contributed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeReference {
    pub recipe_id: Uuid,
    #[serde(default)]
    pub recipe_name: Option<String>,
}

impl RecipeReference {
    pub fn new(recipe_id: Uuid, recipe_name: Option<String>) -> Self {
        Self {
            recipe_id,
            recipe_name,
        }
    }
}

/// Summary fields of a shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updateAt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub group_id: Option<Uuid>,
    #[serde(default)]
    pub household_id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

impl ShoppingList {
    pub fn new(id: Uuid, name: Option<String>) -> Self {
        Self {
            id,
            name,
            created_at: None,
            updated_at: None,
            group_id: None,
            household_id: None,
            user_id: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Untitled list")
    }
}

/// A list with its items, as returned by a detail fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDetail {
    #[serde(flatten)]
    pub list: ShoppingList,
    #[serde(default)]
    pub list_items: Vec<ShoppingListItem>,
    #[serde(default)]
    pub recipe_references: Vec<RecipeReference>,
}

impl ListDetail {
    pub fn new(list: ShoppingList) -> Self {
        Self {
            list,
            list_items: Vec::new(),
            recipe_references: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: Vec<ShoppingListItem>) -> Self {
        self.list_items = items;
        self
    }
}

/// One line on a shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListItem {
    pub id: Uuid,
    shopping_list_id: Uuid,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub food_id: Option<Uuid>,
    #[serde(default)]
    pub unit_id: Option<Uuid>,
    #[serde(default)]
    pub label_id: Option<Uuid>,
    #[serde(default)]
    pub recipe_references: Vec<RecipeReference>,
    /// Server-rendered text such as "2 cups flour".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl ShoppingListItem {
    pub fn new(id: Uuid, shopping_list_id: Uuid, note: impl Into<String>) -> Self {
        Self {
            id,
            shopping_list_id,
            quantity: Some(DEFAULT_QUANTITY),
            checked: false,
            position: 0,
            note: note.into(),
            food_id: None,
            unit_id: None,
            label_id: None,
            recipe_references: Vec::new(),
            display: None,
        }
    }

    pub fn with_quantity(mut self, quantity: Option<f64>) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    pub fn with_food(mut self, food_id: Uuid) -> Self {
        self.food_id = Some(food_id);
        self
    }

    /// The list this item belongs to.
    pub fn list_id(&self) -> Uuid {
        self.shopping_list_id
    }

    pub fn effective_quantity(&self) -> f64 {
        self.quantity.unwrap_or(DEFAULT_QUANTITY)
    }

    /// Label shown to the user: server display text, then note.
    pub fn label(&self) -> &str {
        match self.display.as_deref() {
            Some(d) if !d.trim().is_empty() => d,
            _ => self.note.as_str(),
        }
    }

    /// Checks the content rules every submitted item must satisfy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_content(&self.note, self.food_id)?;
        validate_quantity(self.quantity)
    }

    /// Full field set for an update call. The remote API replaces the
    /// whole item, so nothing here is optional to send.
    pub fn to_update(&self) -> ItemUpdate {
        ItemUpdate {
            id: self.id,
            shopping_list_id: self.shopping_list_id,
            note: self.note.clone(),
            quantity: self.quantity,
            checked: self.checked,
            food_id: self.food_id,
            unit_id: self.unit_id,
            label_id: self.label_id,
            position: self.position,
        }
    }

    /// Returns a copy with the edit applied; fields left `None` are kept.
    pub fn apply_edit(&self, edit: &ItemEdit) -> ShoppingListItem {
        let mut item = self.clone();
        if let Some(note) = &edit.note {
            item.note = note.clone();
            item.display = None;
        }
        if let Some(quantity) = edit.quantity {
            item.quantity = Some(quantity);
        }
        if let Some(food_id) = edit.food_id {
            item.food_id = Some(food_id);
        }
        if let Some(unit_id) = edit.unit_id {
            item.unit_id = Some(unit_id);
        }
        if let Some(label_id) = edit.label_id {
            item.label_id = Some(label_id);
        }
        item
    }
}

impl fmt::Display for ShoppingListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let check = if self.checked { "[x]" } else { "[ ]" };
        let qty = self.effective_quantity();
        if qty.fract() == 0.0 {
            write!(f, "{} {:<4} {}", check, qty as i64, self.label())
        } else {
            write!(f, "{} {:<4.1} {}", check, qty, self.label())
        }
    }
}

/// Request body for creating an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub note: String,
    pub quantity: Option<f64>,
    pub food_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
}

impl NewItem {
    pub fn new(note: impl Into<String>) -> Self {
        Self {
            note: note.into(),
            quantity: Some(DEFAULT_QUANTITY),
            food_id: None,
            unit_id: None,
        }
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_food(mut self, food_id: Option<Uuid>) -> Self {
        self.food_id = food_id;
        self
    }

    pub fn with_unit(mut self, unit_id: Option<Uuid>) -> Self {
        self.unit_id = unit_id;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_content(&self.note, self.food_id)?;
        validate_quantity(self.quantity)
    }
}

/// Partial edit of an existing item. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemEdit {
    pub note: Option<String>,
    pub quantity: Option<f64>,
    pub food_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub label_id: Option<Uuid>,
}

/// Complete item state sent on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    pub id: Uuid,
    pub shopping_list_id: Uuid,
    pub note: String,
    pub quantity: Option<f64>,
    pub checked: bool,
    pub food_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub label_id: Option<Uuid>,
    pub position: i32,
}

/// Response of an item create call. Only `created_items` is consulted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMutations {
    #[serde(default)]
    pub created_items: Vec<ShoppingListItem>,
    #[serde(default)]
    pub updated_items: Vec<ShoppingListItem>,
    #[serde(default)]
    pub deleted_items: Vec<ShoppingListItem>,
}

fn validate_content(note: &str, food_id: Option<Uuid>) -> Result<(), ValidationError> {
    if note.trim().is_empty() && food_id.is_none() {
        return Err(ValidationError::EmptyItem);
    }
    Ok(())
}

fn validate_quantity(quantity: Option<f64>) -> Result<(), ValidationError> {
    match quantity {
        Some(q) if !q.is_finite() || q <= 0.0 => Err(ValidationError::InvalidQuantity(q)),
        _ => Ok(()),
    }
}
