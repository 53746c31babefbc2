use rand::Rng;

use cefr_core::model::{Level, QuizMode, QuizTurn, VocabularyItem};
use cefr_core::selection::{choose_mode, choose_weighted_index, row_weights};

use crate::error::{PreconditionError, ProgressError};
use crate::score_aggregator::ScoreAggregator;

/// Picks the next question: a weak word is more likely, the mode is uniform.
///
/// The random source is always supplied by the caller, so a seeded RNG gives
/// reproducible sessions.
#[derive(Clone)]
pub struct QuestionSelector {
    aggregator: ScoreAggregator,
}

impl QuestionSelector {
    #[must_use]
    pub fn new(aggregator: ScoreAggregator) -> Self {
        Self { aggregator }
    }

    /// Draw a row index of `items`, weighted by `51 - total` of the row's headword.
    ///
    /// Draws are independent; a row may come up again immediately.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Precondition` when `items` is empty, or
    /// `ProgressError::Storage` if scores cannot be read.
    pub async fn choose_weighted_item<R: Rng + ?Sized>(
        &self,
        level: Level,
        items: &[VocabularyItem],
        rng: &mut R,
    ) -> Result<usize, ProgressError> {
        if items.is_empty() {
            return Err(PreconditionError::EmptyItems.into());
        }

        let headwords: Vec<&str> = items.iter().map(|i| i.headword.as_str()).collect();
        let totals = self.aggregator.get_all_word_totals(level, &headwords).await?;
        let weights = row_weights(&headwords, &totals);

        if weights.iter().all(|w| *w == 0) {
            log::warn!(
                "every {level} item is at or above the weight ceiling; drawing uniformly"
            );
        }

        let index = choose_weighted_index(&weights, rng)?;
        log::debug!(
            "drew {level} row {index} ({:?}, weight {})",
            headwords[index],
            weights[index]
        );
        Ok(index)
    }

    /// Uniform pick among the enabled modes.
    ///
    /// Listening is returned even for rows without an example sentence; check
    /// `VocabularyItem::supports_mode` before presenting.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Precondition` if no mode is enabled.
    pub fn choose_mode<R: Rng + ?Sized>(
        &self,
        enabled: &[QuizMode],
        rng: &mut R,
    ) -> Result<QuizMode, ProgressError> {
        Ok(choose_mode(enabled, rng)?)
    }

    /// Draw a row and a mode together.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Precondition` for empty `items` or `enabled`,
    /// or `ProgressError::Storage` if scores cannot be read.
    pub async fn next_turn<R: Rng + ?Sized>(
        &self,
        level: Level,
        items: &[VocabularyItem],
        enabled: &[QuizMode],
        rng: &mut R,
    ) -> Result<QuizTurn, ProgressError> {
        if enabled.is_empty() {
            return Err(PreconditionError::NoModesEnabled.into());
        }
        let index = self.choose_weighted_item(level, items, rng).await?;
        let mode = self.choose_mode(enabled, rng)?;
        Ok(QuizTurn::new(index, mode))
    }
}
