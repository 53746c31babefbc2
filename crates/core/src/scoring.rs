//! Mastery totals per headword and read counts per grammar level.
//!
//! A headword's total is the sum of its five mode scores, where an ungraded
//! mode counts as [`DEFAULT_MODE_SCORE`]. Totals start at 5 and reach 50 once
//! every mode has been graded correct. Nothing here clamps: a store holding
//! scores outside 0/5/10 produces totals outside `[0, 50]`, saturating at the
//! bounds of `i64`.

use std::collections::{HashMap, HashSet};

use crate::model::{DEFAULT_MODE_SCORE, GrammarReadStats, Level, QuizMode, WordScoreRecord};

/// Total of a headword with no graded modes.
pub const DEFAULT_WORD_TOTAL: i64 = DEFAULT_MODE_SCORE * QuizMode::ALL.len() as i64;

/// Total of a headword graded correct in every mode.
pub const MAX_WORD_TOTAL: i64 = 50;

/// Computes the mastery total of every requested headword.
///
/// Each requested headword starts at [`DEFAULT_WORD_TOTAL`]; every stored
/// record for `level` then swaps its mode's default of 1 for the stored score.
/// Records for headwords outside `headwords` or for other levels are ignored.
/// Duplicate headwords collapse into a single entry.
#[must_use]
pub fn word_totals<'a, S, I>(level: Level, headwords: &[S], records: I) -> HashMap<String, i64>
where
    S: AsRef<str>,
    I: IntoIterator<Item = &'a WordScoreRecord>,
{
    let mut totals: HashMap<String, i64> = headwords
        .iter()
        .map(|hw| (hw.as_ref().to_owned(), DEFAULT_WORD_TOTAL))
        .collect();

    for record in records {
        if record.key.level != level {
            continue;
        }
        if let Some(total) = totals.get_mut(record.key.headword.as_str()) {
            *total = total.saturating_add(record.score.saturating_sub(DEFAULT_MODE_SCORE));
        }
    }

    totals
}

/// Counts how many of `names` appear in `read_names`.
///
/// `total` is the length of `names` as given, duplicates included. Names that
/// were read but are not offered in `names` do not count.
#[must_use]
pub fn grammar_read_stats<S: AsRef<str>>(names: &[S], read_names: &HashSet<String>) -> GrammarReadStats {
    GrammarReadStats {
        read_unique: names
            .iter()
            .filter(|n| read_names.contains(n.as_ref()))
            .count(),
        total: names.len(),
    }
}
