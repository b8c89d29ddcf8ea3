use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::field::{parse_int, parse_text};
use crate::stat_kind::StatKind;

pub const NAME_COLUMN: &str = "Name";
pub const SEASON_COLUMN: &str = "Season";
pub const TEAM_COLUMN: &str = "Team";
pub const POSITION_COLUMN: &str = "Pos";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinKey {
    pub name: String,
    pub season: i32,
    pub position: Option<String>,
}

/// One provider row: column name to raw JSON value, as delivered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(BTreeMap<String, Value>);

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `column`, treating JSON null as absent.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column).filter(|v| !v.is_null())
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(column.into(), value)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn name(&self) -> Option<String> {
        self.get(NAME_COLUMN)
            .and_then(|v| parse_text(v).ok().flatten())
    }

    pub fn season(&self) -> Option<i32> {
        self.get(SEASON_COLUMN)
            .and_then(|v| parse_int(v).ok().flatten())
            .and_then(|s| i32::try_from(s).ok())
    }

    pub fn position(&self) -> Option<String> {
        self.get(POSITION_COLUMN)
            .and_then(|v| parse_text(v).ok().flatten())
    }

    /// The key rows from different stat groups of `kind` are joined on:
    /// (name, season), plus the position for fielding rows.
    pub fn join_key(&self, kind: StatKind) -> Option<JoinKey> {
        let position = match kind {
            StatKind::Fielding => self.position(),
            StatKind::Batting | StatKind::Pitching => None,
        };
        Some(JoinKey {
            name: self.name()?,
            season: self.season()?,
            position,
        })
    }

    /// Copies every column of `other` this row lacks (or holds as null).
    /// Values already present are kept.
    pub fn fill_missing_from(&mut self, other: RawRow) {
        for (column, value) in other.0 {
            if value.is_null() {
                continue;
            }
            let slot = self.0.entry(column).or_insert(Value::Null);
            if slot.is_null() {
                *slot = value;
            }
        }
    }
}

impl From<Map<String, Value>> for RawRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map.into_iter().collect())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
