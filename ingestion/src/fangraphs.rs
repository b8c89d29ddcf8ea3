//! FanGraphs major-league leaderboard API.
//!
//! One request returns every player-season in the year range for one stat
//! group (`ind=1` splits by season, `qual=0` drops the playing-time floor).

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use types::raw_row::{NAME_COLUMN, POSITION_COLUMN, TEAM_COLUMN};
use types::{RawRow, StatKind, YearRange};

use crate::config::SourceSettings;
use crate::error::SourceError;
use crate::provider::{StatGroup, StatsProvider};

const LEADERBOARD_PATH: &str = "/api/leaders/major-league/data";
const PAGE_ITEMS: &str = "2000000000";

#[derive(Debug, Deserialize)]
struct LeaderboardPage {
    #[serde(default)]
    data: Vec<Map<String, Value>>,
}

pub struct FanGraphsProvider {
    client: Client,
    base_url: String,
    html_tag: Regex,
}

impl FanGraphsProvider {
    pub fn new(settings: &SourceSettings) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout())
            .build()?;
        let html_tag = Regex::new(r"<[^>]*>").map_err(|e| SourceError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            html_tag,
        })
    }

    fn stats_param(kind: StatKind) -> &'static str {
        match kind {
            StatKind::Batting => "bat",
            StatKind::Pitching => "pit",
            StatKind::Fielding => "fld",
        }
    }

    fn strip_html(&self, value: &Value) -> Option<Value> {
        value
            .as_str()
            .map(|s| Value::String(self.html_tag.replace_all(s, "").trim().to_string()))
    }

    /// Renames provider columns to the ones the normalizer expects.
    fn canonicalize(&self, mut row: Map<String, Value>) -> RawRow {
        if let Some(name) = row.remove("PlayerName") {
            row.insert(NAME_COLUMN.to_string(), name);
        }
        if let Some(name) = row.get(NAME_COLUMN).and_then(|v| self.strip_html(v)) {
            row.insert(NAME_COLUMN.to_string(), name);
        }

        if let Some(team) = row.remove("TeamNameAbb") {
            row.insert(TEAM_COLUMN.to_string(), team);
        } else if let Some(team) = row.get(TEAM_COLUMN).and_then(|v| self.strip_html(v)) {
            row.insert(TEAM_COLUMN.to_string(), team);
        }

        if !row.contains_key(POSITION_COLUMN) {
            if let Some(position) = row.remove("position") {
                row.insert(POSITION_COLUMN.to_string(), position);
            }
        }

        RawRow::from(row)
    }
}

#[async_trait]
impl StatsProvider for FanGraphsProvider {
    fn name(&self) -> &str {
        "fangraphs"
    }

    async fn fetch_table(
        &self,
        kind: StatKind,
        group: &StatGroup,
        years: YearRange,
    ) -> Result<Vec<RawRow>, SourceError> {
        let url = format!("{}{}", self.base_url, LEADERBOARD_PATH);
        let start = years.start.to_string();
        let end = years.end.to_string();
        let code = group.code.to_string();
        log::debug!("GET {url} {kind} {} {years}", group.name);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("pos", "all"),
                ("stats", Self::stats_param(kind)),
                ("lg", "all"),
                ("qual", "0"),
                ("season", end.as_str()),
                ("season1", start.as_str()),
                ("month", "0"),
                ("team", "0"),
                ("ind", "1"),
                ("type", code.as_str()),
                ("pageitems", PAGE_ITEMS),
                ("pagenum", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(SourceError::Throttled {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Http {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let page: LeaderboardPage = response.json().await?;
        log::info!(
            "Fetched {} {kind} rows ({} group) for {years}",
            page.data.len(),
            group.name
        );
        Ok(page
            .data
            .into_iter()
            .map(|row| self.canonicalize(row))
            .collect())
    }
}
