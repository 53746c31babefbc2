use std::collections::HashMap;
use std::sync::Arc;

use cefr_core::model::Level;
use cefr_core::scoring::word_totals;
use storage::repository::WordScoreRepository;

use crate::error::ProgressError;

/// Computes per-headword mastery totals from the stored mode scores.
#[derive(Clone)]
pub struct ScoreAggregator {
    words: Arc<dyn WordScoreRepository>,
}

impl ScoreAggregator {
    #[must_use]
    pub fn new(words: Arc<dyn WordScoreRepository>) -> Self {
        Self { words }
    }

    /// Totals for every headword in `headwords`, each defaulting to 5.
    ///
    /// Stored records for headwords outside the list do not appear in the result.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the store cannot be read.
    pub async fn get_all_word_totals<S: AsRef<str> + Sync>(
        &self,
        level: Level,
        headwords: &[S],
    ) -> Result<HashMap<String, i64>, ProgressError> {
        let records = self.words.word_scores_for_level(level).await?;
        log::debug!(
            "aggregating {} stored score(s) over {} headword(s) at {level}",
            records.len(),
            headwords.len()
        );
        Ok(word_totals(level, headwords, &records))
    }
}
