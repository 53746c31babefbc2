use async_trait::async_trait;
use cefr_core::model::{Level, WordScoreKey, WordScoreRecord};
use chrono::{DateTime, Utc};

use super::SqliteRepository;
use super::mapping::{conn, map_word_score_row, write};
use crate::repository::{StorageError, WordScoreRepository};

#[async_trait]
impl WordScoreRepository for SqliteRepository {
    async fn get_word_score(
        &self,
        key: &WordScoreKey,
    ) -> Result<Option<WordScoreRecord>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT level, headword, mode, score, attempts, updated_at
                FROM word_scores
                WHERE level = ?1 AND headword = ?2 AND mode = ?3
            ",
        )
        .bind(key.level.as_str())
        .bind(key.headword.as_str())
        .bind(i64::from(key.mode))
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_word_score_row).transpose()
    }

    async fn record_word_score(
        &self,
        key: &WordScoreKey,
        score: i64,
        at: DateTime<Utc>,
    ) -> Result<WordScoreRecord, StorageError> {
        // Single statement: the attempt increment is computed inside the write lock.
        let row = sqlx::query(
            r"
                INSERT INTO word_scores (level, headword, mode, score, attempts, updated_at)
                VALUES (?1, ?2, ?3, ?4, 1, ?5)
                ON CONFLICT(level, headword, mode) DO UPDATE SET
                    score = excluded.score,
                    attempts = word_scores.attempts + 1,
                    updated_at = excluded.updated_at
                RETURNING level, headword, mode, score, attempts, updated_at
            ",
        )
        .bind(key.level.as_str())
        .bind(key.headword.as_str())
        .bind(i64::from(key.mode))
        .bind(score)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(write)?;

        map_word_score_row(&row)
    }

    async fn word_scores_for_level(
        &self,
        level: Level,
    ) -> Result<Vec<WordScoreRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT level, headword, mode, score, attempts, updated_at
                FROM word_scores
                WHERE level = ?1
                ORDER BY headword ASC, mode ASC
            ",
        )
        .bind(level.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_word_score_row).collect()
    }
}
