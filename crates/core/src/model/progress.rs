use chrono::{DateTime, Utc};

use crate::model::{Level, QuizMode};

/// Score assumed for a (level, headword, mode) that has never been graded.
pub const DEFAULT_MODE_SCORE: i64 = 1;

//
// ─── MODE SCORE ────────────────────────────────────────────────────────────────
//

/// Current score and number of gradings for one (level, headword, mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeScore {
    pub score: i64,
    pub attempts: u32,
}

impl ModeScore {
    /// The logical value of an absent entry.
    pub const UNSEEN: ModeScore = ModeScore {
        score: DEFAULT_MODE_SCORE,
        attempts: 0,
    };

    #[must_use]
    pub fn is_seen(&self) -> bool {
        self.attempts > 0
    }
}

impl Default for ModeScore {
    fn default() -> Self {
        Self::UNSEEN
    }
}

//
// ─── WORD SCORES ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WordScoreKey {
    pub level: Level,
    pub headword: String,
    pub mode: QuizMode,
}

impl WordScoreKey {
    #[must_use]
    pub fn new(level: Level, headword: impl Into<String>, mode: QuizMode) -> Self {
        Self {
            level,
            headword: headword.into(),
            mode,
        }
    }
}

/// A stored word score. Exists only once the key has been graded at least once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordScoreRecord {
    pub key: WordScoreKey,
    pub score: i64,
    pub attempts: u32,
    pub updated_at: DateTime<Utc>,
}

impl WordScoreRecord {
    #[must_use]
    pub fn mode_score(&self) -> ModeScore {
        ModeScore {
            score: self.score,
            attempts: self.attempts,
        }
    }
}

/// All five mode scores of one headword, defaults filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordModeBreakdown {
    pub headword: String,
    pub modes: [(QuizMode, ModeScore); 5],
}

impl WordModeBreakdown {
    /// Builds a breakdown from whatever records exist for the headword.
    ///
    /// Records for other headwords or levels are ignored.
    #[must_use]
    pub fn from_records<'a>(
        level: Level,
        headword: &str,
        records: impl IntoIterator<Item = &'a WordScoreRecord>,
    ) -> Self {
        let mut modes = QuizMode::ALL.map(|m| (m, ModeScore::UNSEEN));
        for record in records {
            if record.key.level != level || record.key.headword != headword {
                continue;
            }
            if let Some(slot) = modes.iter_mut().find(|(m, _)| *m == record.key.mode) {
                slot.1 = record.mode_score();
            }
        }
        Self {
            headword: headword.to_owned(),
            modes,
        }
    }

    #[must_use]
    pub fn total(&self) -> i64 {
        self.modes
            .iter()
            .fold(0_i64, |acc, (_, s)| acc.saturating_add(s.score))
    }

    #[must_use]
    pub fn get(&self, mode: QuizMode) -> ModeScore {
        self.modes
            .iter()
            .find(|(m, _)| *m == mode)
            .map_or(ModeScore::UNSEEN, |(_, s)| *s)
    }
}

//
// ─── GRAMMAR READS ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GrammarReadKey {
    pub level: Level,
    pub name: String,
}

impl GrammarReadKey {
    #[must_use]
    pub fn new(level: Level, name: impl Into<String>) -> Self {
        Self {
            level,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarReadRecord {
    pub key: GrammarReadKey,
    pub read_count: u32,
    pub last_read_at: DateTime<Utc>,
}

/// Unique lessons read out of the lessons offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrammarReadStats {
    pub read_unique: usize,
    pub total: usize,
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Full contents of a progress store, sorted by key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub word_scores: Vec<WordScoreRecord>,
    pub grammar_reads: Vec<GrammarReadRecord>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.word_scores.is_empty() && self.grammar_reads.is_empty()
    }

    /// Sorts both collections by key so snapshots from different backends compare equal.
    #[must_use]
    pub fn sorted(mut self) -> Self {
        self.word_scores.sort_by(|a, b| a.key.cmp(&b.key));
        self.grammar_reads.sort_by(|a, b| a.key.cmp(&b.key));
        self
    }
}
