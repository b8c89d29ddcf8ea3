use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use database::{BirthDateLookup, LookupError};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::OnceCell;
use types::PlayerCandidate;

const SHARDS: &str = "0123456789abcdef";

#[derive(Debug, Deserialize)]
struct PersonRow {
    name_first: Option<String>,
    name_last: Option<String>,
    birth_year: Option<i32>,
    birth_month: Option<u32>,
    birth_day: Option<u32>,
}

type Register = HashMap<(String, String), NaiveDate>;

fn register_key(first: &str, last: &str) -> (String, String) {
    (first.to_lowercase(), last.to_lowercase())
}

/// Adds every person with a complete birth date to `register`. The first
/// entry for a (first, last) pair wins.
fn read_shard<R: Read>(reader: R, register: &mut Register) -> Result<usize, LookupError> {
    let mut csv = csv::Reader::from_reader(reader);
    let mut added = 0;
    for row in csv.deserialize::<PersonRow>() {
        let row = row.map_err(|e| LookupError::Failed(e.to_string()))?;
        let (Some(first), Some(last), Some(y), Some(m), Some(d)) = (
            row.name_first,
            row.name_last,
            row.birth_year,
            row.birth_month,
            row.birth_day,
        ) else {
            continue;
        };
        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
            register.entry(register_key(&first, &last)).or_insert(date);
            added += 1;
        }
    }
    Ok(added)
}

/// Birth dates from the Chadwick Bureau people register.
///
/// The register is downloaded once, on first use, and kept for the life of
/// the process. A failed download is kept too: later lookups report it
/// without retrying.
pub struct ChadwickRegister {
    client: Client,
    base_url: String,
    register: OnceCell<Result<Arc<Register>, LookupError>>,
}

impl ChadwickRegister {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            register: OnceCell::new(),
        }
    }

    /// Builds an already-loaded register from CSV text.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LookupError> {
        let mut register = Register::new();
        read_shard(reader, &mut register)?;
        Ok(Self {
            client: Client::new(),
            base_url: String::new(),
            register: OnceCell::new_with(Some(Ok(Arc::new(register)))),
        })
    }

    async fn download(&self) -> Result<Arc<Register>, LookupError> {
        let mut register = Register::new();
        for shard in SHARDS.chars() {
            let url = format!("{}/people-{shard}.csv", self.base_url);
            let body = self
                .client
                .get(&url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| LookupError::Unavailable(format!("{url}: {e}")))?
                .bytes()
                .await
                .map_err(|e| LookupError::Unavailable(format!("{url}: {e}")))?;
            read_shard(body.as_ref(), &mut register)?;
        }
        log::info!("Loaded {} people from the Chadwick register", register.len());
        Ok(Arc::new(register))
    }

    async fn loaded(&self) -> Result<Arc<Register>, LookupError> {
        self.register
            .get_or_init(|| async {
                let result = self.download().await;
                if let Err(e) = &result {
                    log::warn!("People register unavailable, birth dates will be empty: {e}");
                }
                result
            })
            .await
            .clone()
    }
}

#[async_trait]
impl BirthDateLookup for ChadwickRegister {
    async fn birth_date(
        &self,
        candidate: &PlayerCandidate,
    ) -> Result<Option<NaiveDate>, LookupError> {
        let Some((first, last)) = candidate.first_and_last() else {
            return Ok(None);
        };
        let register = self.loaded().await?;
        Ok(register.get(&register_key(first, last)).copied())
    }
}
