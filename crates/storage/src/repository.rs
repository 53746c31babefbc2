use async_trait::async_trait;
use cefr_core::model::{
    GrammarReadKey, GrammarReadRecord, Level, ProgressSnapshot, WordScoreKey, WordScoreRecord,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("constraint violated: {0}")]
    Constraint(String),
}

/// Per-(level, headword, mode) scores.
#[async_trait]
pub trait WordScoreRepository: Send + Sync {
    /// Fetch the stored score for a key, if it has ever been graded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_word_score(
        &self,
        key: &WordScoreKey,
    ) -> Result<Option<WordScoreRecord>, StorageError>;

    /// Overwrite the score for a key and bump its attempt counter by one.
    ///
    /// The read of the previous attempt count and the write happen atomically,
    /// so concurrent callers never lose an increment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write does not complete.
    async fn record_word_score(
        &self,
        key: &WordScoreKey,
        score: i64,
        at: DateTime<Utc>,
    ) -> Result<WordScoreRecord, StorageError>;

    /// All stored word scores of a level.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn word_scores_for_level(&self, level: Level)
    -> Result<Vec<WordScoreRecord>, StorageError>;
}

/// Per-(level, name) grammar read counters.
#[async_trait]
pub trait GrammarReadRepository: Send + Sync {
    /// Create the counter at 1 or increment it, and stamp `at` as the last read.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write does not complete.
    async fn mark_read(
        &self,
        key: &GrammarReadKey,
        at: DateTime<Utc>,
    ) -> Result<GrammarReadRecord, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_read(&self, key: &GrammarReadKey)
    -> Result<Option<GrammarReadRecord>, StorageError>;

    /// Names of every grammar item read at least once in a level.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn read_names_for_level(&self, level: Level) -> Result<HashSet<String>, StorageError>;
}

/// Whole-store access for export and import.
#[async_trait]
pub trait ProgressSnapshotRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn snapshot(&self) -> Result<ProgressSnapshot, StorageError>;

    /// Replace every word score and grammar read with the snapshot's contents.
    ///
    /// Readers observe either the old contents or the new ones, never a mix.
    /// On error the previous contents remain.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Constraint` if the snapshot holds two records for
    /// one key, or another `StorageError` if the replacement cannot be committed.
    async fn replace_all(&self, snapshot: &ProgressSnapshot) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
struct ProgressState {
    word_scores: BTreeMap<WordScoreKey, WordScoreRecord>,
    grammar_reads: BTreeMap<GrammarReadKey, GrammarReadRecord>,
}

/// Volatile store scoped to one session; lost when dropped unless exported.
///
/// One mutex guards both collections, which makes every update and the
/// wholesale replace atomic.
#[derive(Clone, Default)]
pub struct InMemoryProgressRepository {
    state: Arc<Mutex<ProgressState>>,
}

impl InMemoryProgressRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, ProgressState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl WordScoreRepository for InMemoryProgressRepository {
    async fn get_word_score(
        &self,
        key: &WordScoreKey,
    ) -> Result<Option<WordScoreRecord>, StorageError> {
        Ok(self.lock()?.word_scores.get(key).cloned())
    }

    async fn record_word_score(
        &self,
        key: &WordScoreKey,
        score: i64,
        at: DateTime<Utc>,
    ) -> Result<WordScoreRecord, StorageError> {
        let mut guard = self.lock()?;
        let attempts = guard
            .word_scores
            .get(key)
            .map_or(0, |r| r.attempts)
            .saturating_add(1);
        let record = WordScoreRecord {
            key: key.clone(),
            score,
            attempts,
            updated_at: at,
        };
        guard.word_scores.insert(key.clone(), record.clone());
        Ok(record)
    }

    async fn word_scores_for_level(
        &self,
        level: Level,
    ) -> Result<Vec<WordScoreRecord>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .word_scores
            .values()
            .filter(|r| r.key.level == level)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl GrammarReadRepository for InMemoryProgressRepository {
    async fn mark_read(
        &self,
        key: &GrammarReadKey,
        at: DateTime<Utc>,
    ) -> Result<GrammarReadRecord, StorageError> {
        let mut guard = self.lock()?;
        let record = guard
            .grammar_reads
            .entry(key.clone())
            .and_modify(|r| {
                r.read_count = r.read_count.saturating_add(1);
                r.last_read_at = at;
            })
            .or_insert_with(|| GrammarReadRecord {
                key: key.clone(),
                read_count: 1,
                last_read_at: at,
            });
        Ok(record.clone())
    }

    async fn get_read(
        &self,
        key: &GrammarReadKey,
    ) -> Result<Option<GrammarReadRecord>, StorageError> {
        Ok(self.lock()?.grammar_reads.get(key).cloned())
    }

    async fn read_names_for_level(&self, level: Level) -> Result<HashSet<String>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .grammar_reads
            .keys()
            .filter(|k| k.level == level)
            .map(|k| k.name.clone())
            .collect())
    }
}

#[async_trait]
impl ProgressSnapshotRepository for InMemoryProgressRepository {
    async fn snapshot(&self) -> Result<ProgressSnapshot, StorageError> {
        let guard = self.lock()?;
        Ok(ProgressSnapshot {
            word_scores: guard.word_scores.values().cloned().collect(),
            grammar_reads: guard.grammar_reads.values().cloned().collect(),
        })
    }

    async fn replace_all(&self, snapshot: &ProgressSnapshot) -> Result<(), StorageError> {
        let mut next = ProgressState::default();
        for record in &snapshot.word_scores {
            if next
                .word_scores
                .insert(record.key.clone(), record.clone())
                .is_some()
            {
                return Err(duplicate_key(&record.key));
            }
        }
        for record in &snapshot.grammar_reads {
            if next
                .grammar_reads
                .insert(record.key.clone(), record.clone())
                .is_some()
            {
                return Err(duplicate_key(&record.key));
            }
        }
        *self.lock()? = next;
        Ok(())
    }
}

fn duplicate_key(key: &impl std::fmt::Debug) -> StorageError {
    StorageError::Constraint(format!("duplicate key {key:?}"))
}

/// Bundles the progress repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub word_scores: Arc<dyn WordScoreRepository>,
    pub grammar_reads: Arc<dyn GrammarReadRepository>,
    pub snapshots: Arc<dyn ProgressSnapshotRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryProgressRepository::new())
    }

    /// Use one repository value for every role.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: WordScoreRepository
            + GrammarReadRepository
            + ProgressSnapshotRepository
            + Clone
            + 'static,
    {
        let word_scores: Arc<dyn WordScoreRepository> = Arc::new(repo.clone());
        let grammar_reads: Arc<dyn GrammarReadRepository> = Arc::new(repo.clone());
        let snapshots: Arc<dyn ProgressSnapshotRepository> = Arc::new(repo);
        Self {
            word_scores,
            grammar_reads,
            snapshots,
        }
    }
}
