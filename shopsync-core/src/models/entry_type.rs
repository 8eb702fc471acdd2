use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Slot of the day a meal-plan entry is scheduled for.
///
/// The import merger never looks at this; it is carried so entries can be
/// displayed and round-tripped without loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Breakfast,
    Lunch,
    Dinner,
    Side,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::Breakfast => write!(f, "breakfast"),
            EntryType::Lunch => write!(f, "lunch"),
            EntryType::Dinner => write!(f, "dinner"),
            EntryType::Side => write!(f, "side"),
        }
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(EntryType::Breakfast),
            "lunch" => Ok(EntryType::Lunch),
            "dinner" => Ok(EntryType::Dinner),
            "side" => Ok(EntryType::Side),
            _ => Err(format!(
                "Invalid entry type '{}'. Valid options: breakfast, lunch, dinner, side",
                s
            )),
        }
    }
}
