use std::collections::HashSet;

use async_trait::async_trait;
use cefr_core::model::{GrammarReadKey, GrammarReadRecord, Level};
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_grammar_read_row, ser, write};
use crate::repository::{GrammarReadRepository, StorageError};

#[async_trait]
impl GrammarReadRepository for SqliteRepository {
    async fn mark_read(
        &self,
        key: &GrammarReadKey,
        at: DateTime<Utc>,
    ) -> Result<GrammarReadRecord, StorageError> {
        let row = sqlx::query(
            r"
                INSERT INTO grammar_reads (level, name, read_count, last_read_at)
                VALUES (?1, ?2, 1, ?3)
                ON CONFLICT(level, name) DO UPDATE SET
                    read_count = grammar_reads.read_count + 1,
                    last_read_at = excluded.last_read_at
                RETURNING level, name, read_count, last_read_at
            ",
        )
        .bind(key.level.as_str())
        .bind(key.name.as_str())
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(write)?;

        map_grammar_read_row(&row)
    }

    async fn get_read(
        &self,
        key: &GrammarReadKey,
    ) -> Result<Option<GrammarReadRecord>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT level, name, read_count, last_read_at
                FROM grammar_reads
                WHERE level = ?1 AND name = ?2
            ",
        )
        .bind(key.level.as_str())
        .bind(key.name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_grammar_read_row).transpose()
    }

    async fn read_names_for_level(&self, level: Level) -> Result<HashSet<String>, StorageError> {
        let rows = sqlx::query("SELECT name FROM grammar_reads WHERE level = ?1")
            .bind(level.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(ser))
            .collect()
    }
}
