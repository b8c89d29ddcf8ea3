use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub name: String,
    pub team: Option<String>,
    pub position: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

const NAME_SUFFIXES: [&str; 6] = ["Jr.", "Jr", "Sr.", "Sr", "II", "III"];

/// Identity fields carried by a raw row, before the player has an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerCandidate {
    pub name: String,
    pub team: Option<String>,
    pub position: Option<String>,
}

impl PlayerCandidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            team: None,
            position: None,
        }
    }

    /// Splits the display name into (first, last) the way the people
    /// registers index it: first token and last token, ignoring a
    /// generational suffix.
    pub fn first_and_last(&self) -> Option<(&str, &str)> {
        let parts: Vec<&str> = self
            .name
            .split_whitespace()
            .filter(|p| !NAME_SUFFIXES.contains(p))
            .collect();
        match parts.as_slice() {
            [first, .., last] => Some((*first, *last)),
            _ => None,
        }
    }
}
