use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use itertools::Itertools;
use types::{JoinKey, RawRow, StatKind, YearRange};

use crate::error::SourceError;
use crate::provider::{StatGroup, StatGroups, StatsProvider};
use crate::rate_limit::{RateLimit, Unthrottled};
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Fetches complete stat tables: the base group joined with every
/// extension group on (Name, Season), and Pos for fielding.
pub struct SourceClient {
    provider: Arc<dyn StatsProvider>,
    limiter: Arc<dyn RateLimit>,
    retry: RetryPolicy,
    groups: StatGroups,
}

impl SourceClient {
    pub fn new(provider: Arc<dyn StatsProvider>, groups: StatGroups) -> Self {
        Self {
            provider,
            limiter: Arc::new(Unthrottled),
            retry: RetryPolicy::default(),
            groups,
        }
    }

    pub fn with_rate_limit(mut self, limiter: Arc<dyn RateLimit>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn fetch_batting(&self, years: YearRange) -> Result<Vec<RawRow>, SourceError> {
        self.fetch(StatKind::Batting, years).await
    }

    pub async fn fetch_pitching(&self, years: YearRange) -> Result<Vec<RawRow>, SourceError> {
        self.fetch(StatKind::Pitching, years).await
    }

    pub async fn fetch_fielding(&self, years: YearRange) -> Result<Vec<RawRow>, SourceError> {
        self.fetch(StatKind::Fielding, years).await
    }

    /// Fails only when the base group cannot be fetched. A failed extension
    /// is logged and its columns stay absent.
    pub async fn fetch(&self, kind: StatKind, years: YearRange) -> Result<Vec<RawRow>, SourceError> {
        let groups = self.groups.for_kind(kind);
        log::debug!(
            "Fetching {kind} stats for {years} from {} ({} groups)",
            self.provider.name(),
            groups.extensions.len() + 1
        );
        let mut rows = self.fetch_group(kind, &groups.base, years).await?;

        for extension in &groups.extensions {
            match self.fetch_group(kind, extension, years).await {
                Ok(extra) => rows = outer_join(kind, rows, extra),
                Err(e) => log::warn!(
                    "Error fetching {} {kind} stats for {years}, continuing without them: {e}",
                    extension.name
                ),
            }
        }

        log::info!("Found {} {kind} records for {years}", rows.len());
        Ok(rows)
    }

    async fn fetch_group(
        &self,
        kind: StatKind,
        group: &StatGroup,
        years: YearRange,
    ) -> Result<Vec<RawRow>, SourceError> {
        let provider = self.provider.as_ref();
        let limiter = self.limiter.as_ref();
        retry_with_backoff(
            move || async move {
                limiter.acquire().await;
                provider.fetch_table(kind, group, years).await
            },
            &self.retry,
            SourceError::is_retryable,
        )
        .await
    }
}

/// Outer join on [`RawRow::join_key`] for `kind`. Rows from either side are
/// kept; for a key on both sides, values already in `left` win. Rows without
/// a key pass through unmerged.
pub fn outer_join(kind: StatKind, left: Vec<RawRow>, right: Vec<RawRow>) -> Vec<RawRow> {
    let mut merged = left;
    let mut index: HashMap<JoinKey, usize> = merged
        .iter()
        .enumerate()
        .filter_map(|(i, row)| row.join_key(kind).map(|key| (key, i)))
        .collect();

    for row in right {
        match row.join_key(kind) {
            Some(key) => match index.get(&key) {
                Some(&i) => merged[i].fill_missing_from(row),
                None => {
                    index.insert(key, merged.len());
                    merged.push(row);
                }
            },
            None => merged.push(row),
        }
    }
    merged
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnCoverage {
    pub column: String,
    pub missing: usize,
    pub pct_missing: f64,
}

/// How many rows lack each column seen anywhere in `rows`, worst first.
pub fn column_coverage(rows: &[RawRow]) -> Vec<ColumnCoverage> {
    if rows.is_empty() {
        return Vec::new();
    }
    let mut present: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        for column in row.columns() {
            if row.contains(column) {
                *present.entry(column).or_default() += 1;
            } else {
                present.entry(column).or_default();
            }
        }
    }

    present
        .into_iter()
        .map(|(column, count)| {
            let missing = rows.len() - count;
            ColumnCoverage {
                column: column.to_string(),
                missing,
                pct_missing: (missing as f64 / rows.len() as f64 * 1000.0).round() / 10.0,
            }
        })
        .sorted_by(|a, b| b.missing.cmp(&a.missing).then_with(|| a.column.cmp(&b.column)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn row(name: &str, season: i32, extra: &[(&str, Value)]) -> RawRow {
        let mut row = RawRow::from_iter([("Name", json!(name)), ("Season", json!(season))]);
        for (column, value) in extra {
            row.insert(*column, value.clone());
        }
        row
    }

    #[test]
    fn test_outer_join_keeps_rows_from_both_sides() {
        let left = vec![
            row("Aaron Judge", 2024, &[("WAR", json!(10.8))]),
            row("Juan Soto", 2024, &[("WAR", json!(7.9))]),
        ];
        let right = vec![
            row("Juan Soto", 2024, &[("wOBA", json!(0.419))]),
            row("Pete Alonso", 2024, &[("wOBA", json!(0.339))]),
        ];

        let merged = outer_join(StatKind::Batting, left, right);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[1].get("WAR"), Some(&json!(7.9)));
        assert_eq!(merged[1].get("wOBA"), Some(&json!(0.419)));
        assert_eq!(merged[2].name().as_deref(), Some("Pete Alonso"));
        assert!(!merged[2].contains("WAR"));
    }

    #[test]
    fn test_outer_join_existing_values_win() {
        let left = vec![row("Aaron Judge", 2024, &[("HR", json!(58)), ("SB", Value::Null)])];
        let right = vec![row("Aaron Judge", 2024, &[("HR", json!(0)), ("SB", json!(10))])];

        let merged = outer_join(StatKind::Batting, left, right);

        assert_eq!(merged[0].get("HR"), Some(&json!(58)));
        assert_eq!(merged[0].get("SB"), Some(&json!(10)));
    }

    #[test]
    fn test_outer_join_same_name_different_season() {
        let merged = outer_join(
            StatKind::Batting,
            vec![row("Aaron Judge", 2023, &[])],
            vec![row("Aaron Judge", 2024, &[])],
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_fielding_join_matches_each_position() {
        let left = vec![
            row("Mookie Betts", 2024, &[("Pos", json!("SS")), ("Inn", json!(550.1))]),
            row("Mookie Betts", 2024, &[("Pos", json!("RF")), ("Inn", json!(320.0))]),
        ];
        let right = vec![
            row("Mookie Betts", 2024, &[("Pos", json!("SS")), ("UZR", json!(-3.0))]),
            row("Mookie Betts", 2024, &[("Pos", json!("RF")), ("UZR", json!(4.0))]),
        ];

        let merged = outer_join(StatKind::Fielding, left, right);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].get("Inn"), Some(&json!(550.1)));
        assert_eq!(merged[0].get("UZR"), Some(&json!(-3.0)));
        assert_eq!(merged[1].get("Inn"), Some(&json!(320.0)));
        assert_eq!(merged[1].get("UZR"), Some(&json!(4.0)));
    }

    #[test]
    fn test_fielding_join_keeps_unmatched_position() {
        let left = vec![row("Mookie Betts", 2024, &[("Pos", json!("SS"))])];
        let right = vec![row("Mookie Betts", 2024, &[("Pos", json!("2B")), ("UZR", json!(1.5))])];

        let merged = outer_join(StatKind::Fielding, left, right);

        assert_eq!(merged.len(), 2);
        assert!(!merged[0].contains("UZR"));
        assert_eq!(merged[1].get("Pos"), Some(&json!("2B")));
    }

    #[test]
    fn test_rows_without_key_pass_through() {
        let keyless = RawRow::from_iter([("WAR", json!(1.0))]);
        let merged = outer_join(StatKind::Batting, vec![keyless.clone()], vec![keyless]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_column_coverage_reports_missing() {
        let rows = vec![
            row("A", 2024, &[("WAR", json!(1.0)), ("Barrel%", json!(0.1))]),
            row("B", 2024, &[("WAR", json!(2.0)), ("Barrel%", Value::Null)]),
            row("C", 2024, &[("WAR", json!(3.0))]),
        ];

        let coverage = column_coverage(&rows);

        assert_eq!(coverage[0].column, "Barrel%");
        assert_eq!(coverage[0].missing, 2);
        assert_eq!(coverage[0].pct_missing, 66.7);
        let war = coverage.iter().find(|c| c.column == "WAR").unwrap();
        assert_eq!(war.missing, 0);
        assert!(column_coverage(&[]).is_empty());
    }
}
