use async_trait::async_trait;
use cefr_core::model::ProgressSnapshot;

use super::SqliteRepository;
use super::mapping::{conn, map_grammar_read_row, map_word_score_row, write};
use crate::repository::{ProgressSnapshotRepository, StorageError};

#[async_trait]
impl ProgressSnapshotRepository for SqliteRepository {
    async fn snapshot(&self) -> Result<ProgressSnapshot, StorageError> {
        // Both reads share one transaction so a concurrent import cannot split them.
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let word_rows = sqlx::query(
            r"
                SELECT level, headword, mode, score, attempts, updated_at
                FROM word_scores
                ORDER BY level ASC, headword ASC, mode ASC
            ",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(conn)?;

        let grammar_rows = sqlx::query(
            r"
                SELECT level, name, read_count, last_read_at
                FROM grammar_reads
                ORDER BY level ASC, name ASC
            ",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;

        Ok(ProgressSnapshot {
            word_scores: word_rows
                .iter()
                .map(map_word_score_row)
                .collect::<Result<_, _>>()?,
            grammar_reads: grammar_rows
                .iter()
                .map(map_grammar_read_row)
                .collect::<Result<_, _>>()?,
        })
    }

    async fn replace_all(&self, snapshot: &ProgressSnapshot) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query("DELETE FROM word_scores")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        sqlx::query("DELETE FROM grammar_reads")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for record in &snapshot.word_scores {
            sqlx::query(
                r"
                    INSERT INTO word_scores (level, headword, mode, score, attempts, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(record.key.level.as_str())
            .bind(record.key.headword.as_str())
            .bind(i64::from(record.key.mode))
            .bind(record.score)
            .bind(i64::from(record.attempts))
            .bind(record.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(write)?;
        }

        for record in &snapshot.grammar_reads {
            sqlx::query(
                r"
                    INSERT INTO grammar_reads (level, name, read_count, last_read_at)
                    VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(record.key.level.as_str())
            .bind(record.key.name.as_str())
            .bind(i64::from(record.read_count))
            .bind(record.last_read_at)
            .execute(&mut *tx)
            .await
            .map_err(write)?;
        }

        // Dropping `tx` on any error above rolls the whole replacement back.
        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
