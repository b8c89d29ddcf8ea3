use crate::stat_kind::StatKind;

stat_record! {
    /// One player's pitching line for one season.
    pub struct PitchingRecord {
        kind: StatKind::Pitching,
        table: "pitching_stats",
        key: ["player_id", "year"],
        fields {
            // Traditional
            games: Int => "G",
            games_started: Int => "GS",
            wins: Int => "W",
            losses: Int => "L",
            saves: Int => "SV",
            holds: Int => "HLD",
            innings: Float => "IP",
            hits_allowed: Int => "H",
            runs: Int => "R",
            earned_runs: Int => "ER",
            hr_allowed: Int => "HR",
            bb: Int => "BB",
            ibb: Int => "IBB",
            so: Int => "SO",
            hbp: Int => "HBP",
            wp: Int => "WP",
            bk: Int => "BK",

            // Rate
            era: Float => "ERA",
            whip: Float => "WHIP",
            k_9: Float => "K/9",
            bb_9: Float => "BB/9",
            hr_9: Float => "HR/9",
            k_bb: Float => "K/BB",

            // Advanced
            fip: Float => "FIP",
            xfip: Float => "xFIP",
            siera: Float => "SIERA",
            war: Float => "WAR",
            babip: Float => "BABIP",
            lob_pct: Float => "LOB%",
            k_pct: Float => "K%",
            bb_pct: Float => "BB%",
            hr_fb: Float => "HR/FB",
            gb_pct: Float => "GB%",
            fb_pct: Float => "FB%",
            ld_pct: Float => "LD%",

            // Win probability
            wpa: Float => "WPA",
            neg_wpa: Float => "-WPA",
            pos_wpa: Float => "+WPA",
            re24: Float => "RE24",
            rew: Float => "REW",
            pli: Float => "pLI",
            inli: Float => "inLI",
            clutch: Float => "Clutch",

            // Pitch mix
            fa_pct: Float => "FA%",
            fc_pct: Float => "FC%",
            fs_pct: Float => "FS%",
            si_pct: Float => "SI%",
            sl_pct: Float => "SL%",
            cu_pct: Float => "CU%",
            kc_pct: Float => "KC%",
            ch_pct: Float => "CH%",

            // Pitch values
            wfb: Float => "wFB",
            wsl: Float => "wSL",
            wct: Float => "wCT",
            wcb: Float => "wCB",
            wch: Float => "wCH",

            // Statcast
            avg_velocity: Float => "vFA (sc)",
            whiff_pct: Float => "SwStr%",
            chase_rate: Float => "O-Swing%",
            csw_rate: Float => "CSW%",
            barrel_pct: Float => "Barrel%",
            hard_hit_pct: Float => "HardHit%",
        }
    }
}
