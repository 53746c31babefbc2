use std::sync::Arc;

use cefr_core::model::{
    GrammarReadKey, GrammarReadStats, Level, ModeScore, QuizMode, SelfGrade, WordModeBreakdown,
    WordScoreKey,
};
use cefr_core::scoring::grammar_read_stats;
use storage::repository::{GrammarReadRepository, WordScoreRepository};

use crate::Clock;
use crate::error::{PreconditionError, ProgressError};

/// Reads and writes per-word mode scores and grammar read counts.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    words: Arc<dyn WordScoreRepository>,
    grammar: Arc<dyn GrammarReadRepository>,
}

fn require_headword(headword: &str) -> Result<(), PreconditionError> {
    if headword.trim().is_empty() {
        return Err(PreconditionError::EmptyHeadword);
    }
    Ok(())
}

fn require_grammar_name(name: &str) -> Result<(), PreconditionError> {
    if name.trim().is_empty() {
        return Err(PreconditionError::EmptyGrammarName);
    }
    Ok(())
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        words: Arc<dyn WordScoreRepository>,
        grammar: Arc<dyn GrammarReadRepository>,
    ) -> Self {
        Self {
            clock,
            words,
            grammar,
        }
    }

    /// Current score and attempt count, or `(1, 0)` for a key never graded.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Precondition` for an empty headword, or
    /// `ProgressError::Storage` if the store cannot be read.
    pub async fn word_mode_score(
        &self,
        level: Level,
        headword: &str,
        mode: QuizMode,
    ) -> Result<ModeScore, ProgressError> {
        require_headword(headword)?;
        let key = WordScoreKey::new(level, headword, mode);
        Ok(self
            .words
            .get_word_score(&key)
            .await?
            .map_or(ModeScore::UNSEEN, |r| r.mode_score()))
    }

    /// Record a self-grade: the score becomes the grade's points and attempts grow by one.
    ///
    /// Returns the stored state after the write.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Precondition` for an empty headword, or
    /// `ProgressError::Storage` if the write is not confirmed.
    pub async fn set_word_mode_score(
        &self,
        level: Level,
        headword: &str,
        mode: QuizMode,
        grade: SelfGrade,
    ) -> Result<ModeScore, ProgressError> {
        require_headword(headword)?;
        let key = WordScoreKey::new(level, headword, mode);
        let record = self
            .words
            .record_word_score(&key, grade.points(), self.clock.now())
            .await?;
        log::info!(
            "graded {level} {headword:?} mode {mode}: score {} after {} attempt(s)",
            record.score,
            record.attempts
        );
        Ok(record.mode_score())
    }

    /// All five mode scores of a headword with defaults filled in.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Precondition` for an empty headword, or
    /// `ProgressError::Storage` if the store cannot be read.
    pub async fn word_mode_breakdown(
        &self,
        level: Level,
        headword: &str,
    ) -> Result<WordModeBreakdown, ProgressError> {
        require_headword(headword)?;
        let mut records = Vec::with_capacity(QuizMode::ALL.len());
        for mode in QuizMode::ALL {
            let key = WordScoreKey::new(level, headword, mode);
            if let Some(record) = self.words.get_word_score(&key).await? {
                records.push(record);
            }
        }
        Ok(WordModeBreakdown::from_records(level, headword, &records))
    }

    /// Count one more read of a grammar lesson. Returns the new read count.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Precondition` for an empty name, or
    /// `ProgressError::Storage` if the write is not confirmed.
    pub async fn mark_grammar_read(&self, level: Level, name: &str) -> Result<u32, ProgressError> {
        require_grammar_name(name)?;
        let key = GrammarReadKey::new(level, name);
        let record = self.grammar.mark_read(&key, self.clock.now()).await?;
        log::info!(
            "marked {level} grammar {name:?} read ({} time(s))",
            record.read_count
        );
        Ok(record.read_count)
    }

    /// How many of `names` have been read at least once in `level`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the store cannot be read.
    pub async fn grammar_read_stats<S: AsRef<str> + Sync>(
        &self,
        level: Level,
        names: &[S],
    ) -> Result<GrammarReadStats, ProgressError> {
        let read = self.grammar.read_names_for_level(level).await?;
        Ok(grammar_read_stats(names, &read))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cefr_core::time::fixed_clock;
    use storage::repository::Storage;

    fn service() -> ProgressService {
        let storage = Storage::in_memory();
        ProgressService::new(fixed_clock(), storage.word_scores, storage.grammar_reads)
    }

    #[tokio::test]
    async fn unseen_keys_read_as_default() {
        let svc = service();
        for mode in QuizMode::ALL {
            let score = svc.word_mode_score(Level::B2, "ubiquitous", mode).await.unwrap();
            assert_eq!(score, ModeScore { score: 1, attempts: 0 });
        }
    }

    #[tokio::test]
    async fn latest_grade_wins_and_attempts_climb() {
        let svc = service();
        let mode = QuizMode::WordToMeaning;

        svc.set_word_mode_score(Level::A1, "apple", mode, SelfGrade::Correct)
            .await
            .unwrap();
        assert_eq!(
            svc.word_mode_score(Level::A1, "apple", mode).await.unwrap(),
            ModeScore { score: 10, attempts: 1 }
        );

        let after = svc
            .set_word_mode_score(Level::A1, "apple", mode, SelfGrade::Wrong)
            .await
            .unwrap();
        assert_eq!(after, ModeScore { score: 0, attempts: 2 });
    }

    #[tokio::test]
    async fn breakdown_reports_each_mode() {
        let svc = service();
        svc.set_word_mode_score(Level::A2, "borrow", QuizMode::Listening, SelfGrade::Partial)
            .await
            .unwrap();

        let breakdown = svc.word_mode_breakdown(Level::A2, "borrow").await.unwrap();
        assert_eq!(breakdown.get(QuizMode::Listening).score, 5);
        assert_eq!(breakdown.total(), 9);
    }

    #[tokio::test]
    async fn grammar_reads_count_unique_names() {
        let svc = service();
        assert_eq!(svc.mark_grammar_read(Level::A1, "can / can't").await.unwrap(), 1);
        assert_eq!(svc.mark_grammar_read(Level::A1, "can / can't").await.unwrap(), 2);

        let stats = svc
            .grammar_read_stats(Level::A1, &["can / can't", "there is / there are"])
            .await
            .unwrap();
        assert_eq!(stats, GrammarReadStats { read_unique: 1, total: 2 });
    }

    #[tokio::test]
    async fn empty_keys_are_preconditions() {
        let svc = service();
        let err = svc
            .set_word_mode_score(Level::A1, " ", QuizMode::WordToMeaning, SelfGrade::Correct)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProgressError::Precondition(PreconditionError::EmptyHeadword)
        ));
        let err = svc.mark_grammar_read(Level::A1, "").await.unwrap_err();
        assert!(matches!(
            err,
            ProgressError::Precondition(PreconditionError::EmptyGrammarName)
        ));
    }
}
