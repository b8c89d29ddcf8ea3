use std::fmt;

use itertools::Itertools;
use sqlx::{Row, SqlitePool};
use types::{plan_ranges, StatKind, YearRange};

use crate::DatabaseError;

/// Which columns the completeness audit looks at for one stat kind.
#[derive(Debug, Clone, Copy)]
pub struct AuditProfile {
    pub kind: StatKind,
    pub table: &'static str,
    /// Playing-time column averaged per era.
    pub volume: &'static str,
    pub metrics: &'static [&'static str],
}

pub fn profile_for(kind: StatKind) -> AuditProfile {
    match kind {
        StatKind::Batting => AuditProfile {
            kind,
            table: "batting_stats",
            volume: "pa",
            metrics: &["pa", "war", "woba", "wrc_plus", "barrel_pct", "hard_pct"],
        },
        StatKind::Pitching => AuditProfile {
            kind,
            table: "pitching_stats",
            volume: "innings",
            metrics: &["innings", "war", "fip", "xfip", "fa_pct", "wfb"],
        },
        StatKind::Fielding => AuditProfile {
            kind,
            table: "fielding_stats",
            volume: "innings",
            metrics: &["innings", "drs", "uzr", "oaa"],
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCoverage {
    pub metric: &'static str,
    pub populated: i64,
    /// `None` when the era has no rows.
    pub pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EraCompleteness {
    pub kind: StatKind,
    pub era: YearRange,
    pub total_rows: i64,
    /// Seasons in the era with at least one row.
    pub seasons: i64,
    pub avg_rows_per_season: Option<f64>,
    pub metrics: Vec<MetricCoverage>,
    /// Mean of the per-season averages of the volume column.
    pub avg_volume: Option<f64>,
}

impl EraCompleteness {
    pub fn pct_with(&self, metric: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|m| m.metric == metric)
            .and_then(|m| m.pct)
    }
}

impl fmt::Display for EraCompleteness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = |value: Option<f64>| match value {
            Some(v) => format!("{v:.1}%"),
            None => "-".to_string(),
        };
        write!(
            f,
            "{} {}: {} rows over {}/{} seasons",
            self.kind,
            self.era,
            self.total_rows,
            self.seasons,
            self.era.season_count()
        )?;
        if self.total_rows > 0 {
            write!(
                f,
                " | {}",
                self.metrics
                    .iter()
                    .map(|m| format!("{} {}", m.metric, pct(m.pct)))
                    .join(", ")
            )?;
        }
        Ok(())
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Read-only population report over stored seasons.
pub struct CompletenessAuditor {
    pool: SqlitePool,
}

impl CompletenessAuditor {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// One entry per era (newest first) per stat kind.
    pub async fn audit(
        &self,
        start_year: i32,
        end_year: i32,
        era_size: u32,
    ) -> Result<Vec<EraCompleteness>, DatabaseError> {
        let eras = plan_ranges(start_year, end_year, era_size)?;
        let mut report = Vec::with_capacity(eras.len() * StatKind::ALL.len());
        for era in eras {
            for kind in StatKind::ALL {
                let entry = self.audit_era(profile_for(kind), era).await?;
                tracing::info!(kind = %kind, era = %era, rows = entry.total_rows, "Audited era");
                report.push(entry);
            }
        }
        Ok(report)
    }

    async fn audit_era(
        &self,
        profile: AuditProfile,
        era: YearRange,
    ) -> Result<EraCompleteness, DatabaseError> {
        let counts = profile
            .metrics
            .iter()
            .map(|metric| format!("COUNT({metric}) AS has_{metric}"))
            .join(", ");
        // Volume is averaged per season first so thin and full seasons
        // weigh the same.
        let sql = format!(
            "SELECT COUNT(*) AS total, COUNT(DISTINCT year) AS seasons, \
             (SELECT AVG(season_volume) FROM \
                (SELECT AVG({volume}) AS season_volume FROM {table} \
                 WHERE year BETWEEN ?1 AND ?2 GROUP BY year)) AS avg_volume, \
             {counts} \
             FROM {table} WHERE year BETWEEN ?1 AND ?2",
            volume = profile.volume,
            table = profile.table,
        );

        let row = sqlx::query(&sql)
            .bind(era.start)
            .bind(era.end)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;

        let total: i64 = row.get("total");
        let seasons: i64 = row.get("seasons");
        let metrics = profile
            .metrics
            .iter()
            .map(|&metric| {
                let populated: i64 = row.get(format!("has_{metric}").as_str());
                MetricCoverage {
                    metric,
                    populated,
                    pct: (total > 0).then(|| round1(populated as f64 / total as f64 * 100.0)),
                }
            })
            .collect();

        Ok(EraCompleteness {
            kind: profile.kind,
            era,
            total_rows: total,
            seasons,
            avg_rows_per_season: (seasons > 0).then(|| round1(total as f64 / seasons as f64)),
            metrics,
            avg_volume: row.get::<Option<f64>, _>("avg_volume").map(round1),
        })
    }
}
