//! Versioned progress document used to move a whole store between sessions.
//!
//! ```json
//! {
//!   "version": 1,
//!   "exported_at": "2023-11-14T22:13:20Z",
//!   "word_scores":   { "A1|apple|1": { "score": 10, "attempts": 2, "updated_at": "..." } },
//!   "grammar_reads": { "A1|present perfect": { "read_count": 3, "last_read_at": "..." } }
//! }
//! ```
//!
//! Word keys are split at the first `|` (level) and the last `|` (mode), and
//! grammar keys at the first `|`, so headwords and names may themselves
//! contain `|` without colliding.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    GrammarReadKey, GrammarReadRecord, Level, ProgressSnapshot, QuizMode, WordScoreKey,
    WordScoreRecord,
};

pub const PROGRESS_DOCUMENT_VERSION: i64 = 1;

const KEY_DELIMITER: char = '|';

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
    #[error("malformed progress document: {0}")]
    Malformed(String),
    #[error("progress document is missing `{0}`")]
    MissingSection(&'static str),
    #[error("unsupported progress document version {0}")]
    UnsupportedVersion(i64),
    #[error("invalid progress key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },
    #[error("invalid entry {key:?}: {reason}")]
    InvalidEntry { key: String, reason: String },
}

fn invalid_key(key: &str, reason: impl Into<String>) -> FormatError {
    FormatError::InvalidKey {
        key: key.to_owned(),
        reason: reason.into(),
    }
}

fn invalid_entry(key: &str, reason: impl Into<String>) -> FormatError {
    FormatError::InvalidEntry {
        key: key.to_owned(),
        reason: reason.into(),
    }
}

//
// ─── KEYS ──────────────────────────────────────────────────────────────────────
//

#[must_use]
pub fn encode_word_key(key: &WordScoreKey) -> String {
    format!(
        "{}{KEY_DELIMITER}{}{KEY_DELIMITER}{}",
        key.level,
        key.headword,
        key.mode.number()
    )
}

#[must_use]
pub fn encode_grammar_key(key: &GrammarReadKey) -> String {
    format!("{}{KEY_DELIMITER}{}", key.level, key.name)
}

/// # Errors
///
/// Returns `FormatError::InvalidKey` if the level, headword or mode part is unusable.
pub fn decode_word_key(raw: &str) -> Result<WordScoreKey, FormatError> {
    let (level, rest) = raw
        .split_once(KEY_DELIMITER)
        .ok_or_else(|| invalid_key(raw, "expected level|headword|mode"))?;
    let (headword, mode) = rest
        .rsplit_once(KEY_DELIMITER)
        .ok_or_else(|| invalid_key(raw, "expected level|headword|mode"))?;

    let level: Level = level.parse().map_err(|e| invalid_key(raw, format!("{e}")))?;
    if headword.trim().is_empty() {
        return Err(invalid_key(raw, "empty headword"));
    }
    let mode: i64 = mode
        .trim()
        .parse()
        .map_err(|_| invalid_key(raw, format!("mode {mode:?} is not a number")))?;
    let mode = QuizMode::try_from(mode).map_err(|e| invalid_key(raw, e.to_string()))?;

    Ok(WordScoreKey::new(level, headword, mode))
}

/// # Errors
///
/// Returns `FormatError::InvalidKey` if the level or name part is unusable.
pub fn decode_grammar_key(raw: &str) -> Result<GrammarReadKey, FormatError> {
    let (level, name) = raw
        .split_once(KEY_DELIMITER)
        .ok_or_else(|| invalid_key(raw, "expected level|name"))?;
    let level: Level = level.parse().map_err(|e| invalid_key(raw, format!("{e}")))?;
    if name.trim().is_empty() {
        return Err(invalid_key(raw, "empty grammar name"));
    }
    Ok(GrammarReadKey::new(level, name))
}

//
// ─── TIMESTAMPS ────────────────────────────────────────────────────────────────
//

#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses RFC 3339, or an offset-less ISO timestamp taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

//
// ─── DOCUMENT ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordScoreEntry {
    pub score: i64,
    pub attempts: i64,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarReadEntry {
    pub read_count: i64,
    pub last_read_at: String,
}

/// A validated progress document, ready to be written out or applied to a store.
///
/// Read-only once built: the serialized maps and the snapshot applied on
/// import always describe the same entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressDocument {
    version: i64,
    exported_at: String,
    word_scores: BTreeMap<String, WordScoreEntry>,
    grammar_reads: BTreeMap<String, GrammarReadEntry>,
    #[serde(skip)]
    snapshot: ProgressSnapshot,
}

impl ProgressDocument {
    #[must_use]
    pub fn from_snapshot(snapshot: ProgressSnapshot, exported_at: DateTime<Utc>) -> Self {
        let snapshot = snapshot.sorted();
        let word_scores = snapshot
            .word_scores
            .iter()
            .map(|r| {
                (
                    encode_word_key(&r.key),
                    WordScoreEntry {
                        score: r.score,
                        attempts: i64::from(r.attempts),
                        updated_at: format_timestamp(r.updated_at),
                    },
                )
            })
            .collect();
        let grammar_reads = snapshot
            .grammar_reads
            .iter()
            .map(|r| {
                (
                    encode_grammar_key(&r.key),
                    GrammarReadEntry {
                        read_count: i64::from(r.read_count),
                        last_read_at: format_timestamp(r.last_read_at),
                    },
                )
            })
            .collect();

        Self {
            version: PROGRESS_DOCUMENT_VERSION,
            exported_at: format_timestamp(exported_at),
            word_scores,
            grammar_reads,
            snapshot,
        }
    }

    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Export time as written in the document; empty if an imported document had none.
    #[must_use]
    pub fn exported_at(&self) -> &str {
        &self.exported_at
    }

    #[must_use]
    pub fn word_scores(&self) -> &BTreeMap<String, WordScoreEntry> {
        &self.word_scores
    }

    #[must_use]
    pub fn grammar_reads(&self) -> &BTreeMap<String, GrammarReadEntry> {
        &self.grammar_reads
    }

    #[must_use]
    pub fn snapshot(&self) -> &ProgressSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn into_snapshot(self) -> ProgressSnapshot {
        self.snapshot
    }

    #[must_use]
    pub fn word_score_count(&self) -> usize {
        self.word_scores.len()
    }

    #[must_use]
    pub fn grammar_read_count(&self) -> usize {
        self.grammar_reads.len()
    }
}

/// An unvalidated document as read from outside. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressDocumentDraft {
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub exported_at: Option<String>,
    #[serde(default)]
    pub word_scores: Option<BTreeMap<String, WordScoreEntry>>,
    #[serde(default)]
    pub grammar_reads: Option<BTreeMap<String, GrammarReadEntry>>,
}

impl ProgressDocumentDraft {
    /// Checks every key and entry and builds the snapshot the document describes.
    ///
    /// A missing `version` is read as version 1. A missing `exported_at` is
    /// kept empty.
    ///
    /// # Errors
    ///
    /// Returns `FormatError` if either entry collection is absent, the version is
    /// not 1, or any key or entry is invalid. Nothing is partially accepted.
    pub fn validate(self) -> Result<ProgressDocument, FormatError> {
        let word_scores = self
            .word_scores
            .ok_or(FormatError::MissingSection("word_scores"))?;
        let grammar_reads = self
            .grammar_reads
            .ok_or(FormatError::MissingSection("grammar_reads"))?;

        let version = self.version.unwrap_or(PROGRESS_DOCUMENT_VERSION);
        if version != PROGRESS_DOCUMENT_VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }

        let exported_at = match self.exported_at {
            Some(raw) => {
                if parse_timestamp(&raw).is_none() {
                    return Err(invalid_entry("exported_at", format!("bad timestamp {raw:?}")));
                }
                raw
            }
            None => String::new(),
        };

        let mut snapshot = ProgressSnapshot::default();

        for (raw_key, entry) in &word_scores {
            let key = decode_word_key(raw_key)?;
            let attempts = u32::try_from(entry.attempts)
                .ok()
                .filter(|a| *a > 0)
                .ok_or_else(|| {
                    invalid_entry(raw_key, format!("attempts must be positive, got {}", entry.attempts))
                })?;
            let updated_at = parse_timestamp(&entry.updated_at).ok_or_else(|| {
                invalid_entry(raw_key, format!("bad timestamp {:?}", entry.updated_at))
            })?;
            snapshot.word_scores.push(WordScoreRecord {
                key,
                score: entry.score,
                attempts,
                updated_at,
            });
        }

        for (raw_key, entry) in &grammar_reads {
            let key = decode_grammar_key(raw_key)?;
            let read_count = u32::try_from(entry.read_count)
                .ok()
                .filter(|c| *c > 0)
                .ok_or_else(|| {
                    invalid_entry(
                        raw_key,
                        format!("read_count must be positive, got {}", entry.read_count),
                    )
                })?;
            let last_read_at = parse_timestamp(&entry.last_read_at).ok_or_else(|| {
                invalid_entry(raw_key, format!("bad timestamp {:?}", entry.last_read_at))
            })?;
            snapshot.grammar_reads.push(GrammarReadRecord {
                key,
                read_count,
                last_read_at,
            });
        }

        let snapshot = snapshot.sorted();
        reject_duplicate_keys(&snapshot)?;

        Ok(ProgressDocument {
            version,
            exported_at,
            word_scores,
            grammar_reads,
            snapshot,
        })
    }
}

// Two raw keys can decode to the same key (e.g. "a1|x|1" and "A1|x|1").
fn reject_duplicate_keys(snapshot: &ProgressSnapshot) -> Result<(), FormatError> {
    if let Some(pair) = snapshot.word_scores.windows(2).find(|w| w[0].key == w[1].key) {
        return Err(invalid_key(&encode_word_key(&pair[1].key), "duplicate key"));
    }
    if let Some(pair) = snapshot
        .grammar_reads
        .windows(2)
        .find(|w| w[0].key == w[1].key)
    {
        return Err(invalid_key(&encode_grammar_key(&pair[1].key), "duplicate key"));
    }
    Ok(())
}
