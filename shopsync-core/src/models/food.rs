//! Foods an item can link to.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A food from the remote catalogue, as returned by food search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub label_id: Option<Uuid>,
}

impl fmt::Display for Food {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
