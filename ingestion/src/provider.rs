use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use types::{RawRow, StatKind, YearRange};

use crate::error::SourceError;

/// One leaderboard column set offered by the provider for a stat kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatGroup {
    pub name: String,
    /// Provider-side leaderboard type code.
    pub code: u32,
}

impl StatGroup {
    pub fn new(name: impl Into<String>, code: u32) -> Self {
        Self {
            name: name.into(),
            code,
        }
    }
}

/// Base group plus the extension groups merged onto it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSet {
    pub base: StatGroup,
    #[serde(default)]
    pub extensions: Vec<StatGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatGroups {
    pub batting: GroupSet,
    pub pitching: GroupSet,
    pub fielding: GroupSet,
}

impl StatGroups {
    pub fn for_kind(&self, kind: StatKind) -> &GroupSet {
        match kind {
            StatKind::Batting => &self.batting,
            StatKind::Pitching => &self.pitching,
            StatKind::Fielding => &self.fielding,
        }
    }
}

impl Default for StatGroups {
    fn default() -> Self {
        Self {
            batting: GroupSet {
                base: StatGroup::new("dashboard", 8),
                extensions: vec![
                    StatGroup::new("standard", 0),
                    StatGroup::new("advanced", 1),
                    StatGroup::new("batted_ball", 2),
                    StatGroup::new("win_probability", 3),
                    StatGroup::new("plate_discipline", 5),
                    StatGroup::new("value", 6),
                    StatGroup::new("pitch_value", 7),
                    StatGroup::new("statcast", 24),
                ],
            },
            pitching: GroupSet {
                base: StatGroup::new("dashboard", 8),
                extensions: vec![
                    StatGroup::new("standard", 0),
                    StatGroup::new("advanced", 1),
                    StatGroup::new("batted_ball", 2),
                    StatGroup::new("win_probability", 3),
                    StatGroup::new("pitch_type", 4),
                    StatGroup::new("plate_discipline", 5),
                    StatGroup::new("pitch_value", 7),
                    StatGroup::new("statcast", 24),
                ],
            },
            fielding: GroupSet {
                base: StatGroup::new("standard", 0),
                extensions: vec![StatGroup::new("advanced", 1), StatGroup::new("statcast", 24)],
            },
        }
    }
}

/// A source of season-level leaderboard tables.
///
/// Rows are returned one per player per season per table, with at least the
/// `Name` and `Season` columns when the provider knows them.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_table(
        &self,
        kind: StatKind,
        group: &StatGroup,
        years: YearRange,
    ) -> Result<Vec<RawRow>, SourceError>;
}
