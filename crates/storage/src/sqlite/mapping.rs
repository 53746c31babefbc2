use cefr_core::model::{
    GrammarReadKey, GrammarReadRecord, Level, QuizMode, WordScoreKey, WordScoreRecord,
};
use sqlx::Row;
use sqlx::error::ErrorKind;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Classifies a failed write: constraint violations are not connection trouble.
pub(crate) fn write(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if matches!(
            db.kind(),
            ErrorKind::UniqueViolation
                | ErrorKind::CheckViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::ForeignKeyViolation
        ) {
            return StorageError::Constraint(db.message().to_owned());
        }
    }
    conn(e)
}

pub(crate) fn count_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn parse_level(s: &str) -> Result<Level, StorageError> {
    s.parse::<Level>().map_err(ser)
}

pub(crate) fn parse_mode(v: i64) -> Result<QuizMode, StorageError> {
    QuizMode::try_from(v).map_err(ser)
}

pub(crate) fn map_word_score_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<WordScoreRecord, StorageError> {
    let level: String = row.try_get("level").map_err(ser)?;
    let key = WordScoreKey {
        level: parse_level(&level)?,
        headword: row.try_get("headword").map_err(ser)?,
        mode: parse_mode(row.try_get::<i64, _>("mode").map_err(ser)?)?,
    };
    Ok(WordScoreRecord {
        key,
        score: row.try_get("score").map_err(ser)?,
        attempts: count_from_i64("attempts", row.try_get("attempts").map_err(ser)?)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

pub(crate) fn map_grammar_read_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<GrammarReadRecord, StorageError> {
    let level: String = row.try_get("level").map_err(ser)?;
    Ok(GrammarReadRecord {
        key: GrammarReadKey {
            level: parse_level(&level)?,
            name: row.try_get("name").map_err(ser)?,
        },
        read_count: count_from_i64("read_count", row.try_get("read_count").map_err(ser)?)?,
        last_read_at: row.try_get("last_read_at").map_err(ser)?,
    })
}
