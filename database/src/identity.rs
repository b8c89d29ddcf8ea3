use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use types::PlayerCandidate;

use crate::error::LookupError;
use crate::models::NewPlayer;
use crate::writers::{StatStore, StoreBatch};
use crate::DatabaseError;

/// External source of player biographical data.
#[async_trait]
pub trait BirthDateLookup: Send + Sync {
    async fn birth_date(&self, candidate: &PlayerCandidate)
        -> Result<Option<NaiveDate>, LookupError>;
}

/// Lookup for when biographical enrichment is not wanted.
pub struct NoBirthDateLookup;

#[async_trait]
impl BirthDateLookup for NoBirthDateLookup {
    async fn birth_date(
        &self,
        _candidate: &PlayerCandidate,
    ) -> Result<Option<NaiveDate>, LookupError> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPlayer {
    pub id: i64,
    pub created: bool,
}

/// Maps player names to stable ids, creating players on first sight.
///
/// Matching is by exact name. Creation goes through the store's atomic
/// insert-or-get, so two writers resolving the same new name end up with
/// one row. Ids are cached only once the batch that produced them commits.
pub struct IdentityResolver {
    lookup: Arc<dyn BirthDateLookup>,
    known: Mutex<HashMap<String, i64>>,
    pending_birth_dates: Mutex<HashMap<String, Option<NaiveDate>>>,
}

impl IdentityResolver {
    pub fn new(lookup: Arc<dyn BirthDateLookup>) -> Self {
        Self {
            lookup,
            known: Mutex::new(HashMap::new()),
            pending_birth_dates: Mutex::new(HashMap::new()),
        }
    }

    pub fn without_lookup() -> Self {
        Self::new(Arc::new(NoBirthDateLookup))
    }

    pub async fn cached(&self, name: &str) -> Option<i64> {
        self.known.lock().await.get(name).copied()
    }

    /// Runs the birth date lookup for every name the store has not seen yet.
    ///
    /// Called before the batch transaction opens so no network I/O happens
    /// while it is held. Lookup failures leave the birth date empty.
    pub async fn prepare(&self, store: &dyn StatStore, candidates: &[&PlayerCandidate]) {
        for candidate in candidates {
            let name = candidate.name.as_str();
            if self.cached(name).await.is_some()
                || self.pending_birth_dates.lock().await.contains_key(name)
            {
                continue;
            }

            match store.find_player(name).await {
                Ok(Some(id)) => {
                    self.remember(name, id).await;
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(player = %name, error = %e, "Player lookup failed, resolving inside batch");
                }
            }

            let birth_date = match self.lookup.birth_date(candidate).await {
                Ok(date) => date,
                Err(e) => {
                    tracing::warn!(player = %name, error = %e, "Birth date lookup failed");
                    None
                }
            };
            self.pending_birth_dates
                .lock()
                .await
                .insert(name.to_string(), birth_date);
        }
    }

    pub async fn resolve(
        &self,
        batch: &mut dyn StoreBatch,
        candidate: &PlayerCandidate,
    ) -> Result<ResolvedPlayer, DatabaseError> {
        if let Some(id) = self.cached(&candidate.name).await {
            return Ok(ResolvedPlayer { id, created: false });
        }

        let birth_date = self
            .pending_birth_dates
            .lock()
            .await
            .get(&candidate.name)
            .copied()
            .flatten();

        let (id, created) = batch
            .insert_or_get_player(&NewPlayer {
                name: candidate.name.clone(),
                team: candidate.team.clone(),
                position: candidate.position.clone(),
                birth_date,
            })
            .await?;

        if created {
            tracing::debug!(player = %candidate.name, id, "Created player");
        }
        Ok(ResolvedPlayer { id, created })
    }

    /// Records a committed id.
    pub async fn remember(&self, name: &str, id: i64) {
        self.known.lock().await.insert(name.to_string(), id);
        self.pending_birth_dates.lock().await.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SqliteStore;
    use crate::tests::setup_test_db;
    use sqlx::Row;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedLookup {
        calls: AtomicUsize,
        result: Result<Option<NaiveDate>, LookupError>,
    }

    #[async_trait]
    impl BirthDateLookup for FixedLookup {
        async fn birth_date(
            &self,
            _candidate: &PlayerCandidate,
        ) -> Result<Option<NaiveDate>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    #[tokio::test]
    async fn test_new_player_gets_birth_date() {
        let store = SqliteStore::new(setup_test_db().await);
        let lookup = Arc::new(FixedLookup {
            calls: AtomicUsize::new(0),
            result: Ok(NaiveDate::from_ymd_opt(1992, 4, 26)),
        });
        let resolver = IdentityResolver::new(lookup.clone());
        let candidate = PlayerCandidate::new("Aaron Judge");

        resolver.prepare(&store, &[&candidate]).await;
        let mut batch = store.begin_batch().await.unwrap();
        let resolved = resolver.resolve(batch.as_mut(), &candidate).await.unwrap();
        batch.commit().await.unwrap();
        resolver.remember(&candidate.name, resolved.id).await;

        assert!(resolved.created);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
        let row = sqlx::query("SELECT birth_date FROM players WHERE id = ?")
            .bind(resolved.id)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(
            row.get::<Option<NaiveDate>, _>("birth_date"),
            NaiveDate::from_ymd_opt(1992, 4, 26)
        );

        // Known players are neither looked up again nor re-created.
        resolver.prepare(&store, &[&candidate]).await;
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
        let mut batch = store.begin_batch().await.unwrap();
        let again = resolver.resolve(batch.as_mut(), &candidate).await.unwrap();
        batch.commit().await.unwrap();
        assert_eq!(again, ResolvedPlayer { id: resolved.id, created: false });
    }

    #[tokio::test]
    async fn test_lookup_failure_is_not_fatal() {
        let store = SqliteStore::new(setup_test_db().await);
        let resolver = IdentityResolver::new(Arc::new(FixedLookup {
            calls: AtomicUsize::new(0),
            result: Err(LookupError::Unavailable("offline".to_string())),
        }));
        let candidate = PlayerCandidate::new("Bobby Witt Jr.");

        resolver.prepare(&store, &[&candidate]).await;
        let mut batch = store.begin_batch().await.unwrap();
        let resolved = resolver.resolve(batch.as_mut(), &candidate).await.unwrap();
        batch.commit().await.unwrap();

        assert!(resolved.created);
        let row = sqlx::query("SELECT birth_date FROM players WHERE id = ?")
            .bind(resolved.id)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(row.get::<Option<NaiveDate>, _>("birth_date"), None);
    }

    #[tokio::test]
    async fn test_existing_player_found_in_store() {
        let store = SqliteStore::new(setup_test_db().await);
        let first = IdentityResolver::without_lookup();
        let candidate = PlayerCandidate::new("Gunnar Henderson");
        let mut batch = store.begin_batch().await.unwrap();
        let created = first.resolve(batch.as_mut(), &candidate).await.unwrap();
        batch.commit().await.unwrap();

        // A fresh resolver (new process) finds the committed player.
        let second = IdentityResolver::without_lookup();
        second.prepare(&store, &[&candidate]).await;
        assert_eq!(second.cached(&candidate.name).await, Some(created.id));
    }
}
