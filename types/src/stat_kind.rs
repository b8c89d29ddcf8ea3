use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Batting,
    Pitching,
    Fielding,
}

impl StatKind {
    pub const ALL: [StatKind; 3] = [StatKind::Batting, StatKind::Pitching, StatKind::Fielding];

    pub fn as_str(self) -> &'static str {
        match self {
            StatKind::Batting => "batting",
            StatKind::Pitching => "pitching",
            StatKind::Fielding => "fielding",
        }
    }
}

impl Display for StatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
