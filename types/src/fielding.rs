use crate::stat_kind::StatKind;

stat_record! {
    /// One player's fielding line at one position for one season.
    pub struct FieldingRecord {
        kind: StatKind::Fielding,
        table: "fielding_stats",
        key: ["player_id", "year", "position"],
        fields {
            position: Text => "Pos" => Required,
            games: Int => "G",
            games_started: Int => "GS",
            innings: Float => "Inn",
            putouts: Int => "PO",
            assists: Int => "A",
            errors: Int => "E",
            double_plays: Int => "DP",
            fielding_pct: Float => "FP",
            drs: Float => "DRS",
            uzr: Float => "UZR",
            uzr_150: Float => "UZR/150",
            defense: Float => "Def",
            oaa: Float => "OAA",
        }
    }
}
