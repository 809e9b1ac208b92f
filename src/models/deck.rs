use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, ordered list of card identifiers. Duplicates are allowed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cards: Vec<String>,
    pub created_at: DateTime<Utc>,
}
