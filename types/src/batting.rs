use crate::stat_kind::StatKind;

stat_record! {
    /// One player's batting line for one season.
    pub struct BattingRecord {
        kind: StatKind::Batting,
        table: "batting_stats",
        key: ["player_id", "year"],
        fields {
            // Standard
            games: Int => "G",
            pa: Int => "PA",
            ab: Int => "AB",
            runs: Int => "R",
            hits: Int => "H",
            doubles: Int => "2B",
            triples: Int => "3B",
            hr: Int => "HR",
            rbi: Int => "RBI",
            sb: Int => "SB",
            cs: Int => "CS",
            bb: Int => "BB",
            ibb: Int => "IBB",
            so: Int => "SO",
            hbp: Int => "HBP",
            sf: Int => "SF",
            sh: Int => "SH",
            gdp: Int => "GDP",

            // Rate
            avg: Float => "AVG",
            obp: Float => "OBP",
            slg: Float => "SLG",
            ops: Float => "OPS",
            iso: Float => "ISO",
            babip: Float => "BABIP",

            // Advanced
            woba: Float => "wOBA",
            wrc_plus: Float => "wRC+",
            war: Float => "WAR",

            // Plate discipline
            o_swing_pct: Float => "O-Swing%",
            z_swing_pct: Float => "Z-Swing%",
            swing_pct: Float => "Swing%",
            o_contact_pct: Float => "O-Contact%",
            z_contact_pct: Float => "Z-Contact%",
            contact_pct: Float => "Contact%",
            zone_pct: Float => "Zone%",
            f_strike_pct: Float => "F-Strike%",
            swstr_pct: Float => "SwStr%",
            cstr_pct: Float => "CStr%",
            csw_pct: Float => "CSW%",

            // Batted ball
            gb_pct: Float => "GB%",
            fb_pct: Float => "FB%",
            ld_pct: Float => "LD%",
            iffb_pct: Float => "IFFB%",
            hr_fb: Float => "HR/FB",
            pull_pct: Float => "Pull%",
            cent_pct: Float => "Cent%",
            oppo_pct: Float => "Oppo%",
            soft_pct: Float => "Soft%",
            med_pct: Float => "Med%",
            hard_pct: Float => "Hard%",

            // Value
            batting_runs: Float => "Batting",
            baserunning_runs: Float => "BsR",
            fielding_runs: Float => "Fielding",
            positional: Float => "Positional",
            offense: Float => "Off",
            defense: Float => "Def",
            league: Float => "League",
            replacement: Float => "Replacement",
            rar: Float => "RAR",
            dollars: Float => "Dollars",

            // Win probability
            wpa: Float => "WPA",
            neg_wpa: Float => "-WPA",
            pos_wpa: Float => "+WPA",
            re24: Float => "RE24",
            rew: Float => "REW",
            pli: Float => "pLI",
            phli: Float => "phLI",
            clutch: Float => "Clutch",

            // Pitch values faced
            wfb: Float => "wFB",
            wsl: Float => "wSL",
            wct: Float => "wCT",
            wcb: Float => "wCB",
            wch: Float => "wCH",

            // Statcast
            exit_velocity: Float => "EV",
            launch_angle: Float => "LA",
            barrel_pct: Float => "Barrel%",
            hard_hit_pct: Float => "HardHit%",
            xba: Float => "xBA",
            xslg: Float => "xSLG",
            xwoba: Float => "xwOBA",
        }
    }
}
