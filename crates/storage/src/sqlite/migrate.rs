use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs schema migrations that have not been applied yet.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: word scores and grammar reads.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS word_scores (
                    level TEXT NOT NULL,
                    headword TEXT NOT NULL,
                    mode INTEGER NOT NULL CHECK (mode BETWEEN 1 AND 5),
                    score INTEGER NOT NULL,
                    attempts INTEGER NOT NULL CHECK (attempts >= 1),
                    updated_at TEXT NOT NULL,
                    PRIMARY KEY (level, headword, mode)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS grammar_reads (
                    level TEXT NOT NULL,
                    name TEXT NOT NULL,
                    read_count INTEGER NOT NULL CHECK (read_count >= 1),
                    last_read_at TEXT NOT NULL,
                    PRIMARY KEY (level, name)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        log::info!("applied progress schema migration 1");
    }

    Ok(())
}
