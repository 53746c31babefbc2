//! Weighted choice of the next vocabulary row and uniform choice of quiz mode.
//!
//! Each row weighs `51 - total`, floored at zero, so weak words come up often
//! and fully mastered words (total 50) keep a weight of 1. When every weight is
//! zero the draw falls back to uniform so the quiz never gets stuck.

use std::collections::HashMap;

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::IndexedRandom;
use thiserror::Error;

use crate::model::QuizMode;
use crate::scoring::DEFAULT_WORD_TOTAL;

/// A row's weight is this minus its headword's total.
pub const WEIGHT_CEILING: i64 = 51;

/// Upper bound on a single row's weight, so any realistic item list sums without overflow.
pub const MAX_ROW_WEIGHT: u64 = u32::MAX as u64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("no items to choose from")]
    NoItems,
    #[error("no quiz modes enabled")]
    NoModes,
    #[error("invalid selection weights: {0}")]
    InvalidWeights(String),
}

/// `51 - total`, floored at zero and capped at [`MAX_ROW_WEIGHT`].
#[must_use]
pub fn weight_for_total(total: i64) -> u64 {
    u64::try_from(WEIGHT_CEILING.saturating_sub(total))
        .unwrap_or(0)
        .min(MAX_ROW_WEIGHT)
}

/// One weight per row, in row order.
///
/// Rows sharing a headword each get that headword's weight independently.
/// A headword missing from `totals` is treated as unseen.
#[must_use]
pub fn row_weights<S: AsRef<str>>(headwords: &[S], totals: &HashMap<String, i64>) -> Vec<u64> {
    headwords
        .iter()
        .map(|hw| {
            let total = totals
                .get(hw.as_ref())
                .copied()
                .unwrap_or(DEFAULT_WORD_TOTAL);
            weight_for_total(total)
        })
        .collect()
}

/// Draws one row index with probability proportional to its weight.
///
/// Falls back to a uniform draw when the weights sum to zero.
///
/// # Errors
///
/// Returns `SelectionError::NoItems` for an empty slice, or
/// `SelectionError::InvalidWeights` if the weights overflow.
pub fn choose_weighted_index<R: Rng + ?Sized>(
    weights: &[u64],
    rng: &mut R,
) -> Result<usize, SelectionError> {
    if weights.is_empty() {
        return Err(SelectionError::NoItems);
    }

    if weights.iter().all(|w| *w == 0) {
        return Ok(rng.random_range(0..weights.len()));
    }

    let dist = WeightedIndex::new(weights)
        .map_err(|e| SelectionError::InvalidWeights(e.to_string()))?;
    Ok(dist.sample(rng))
}

/// Picks one of the enabled modes uniformly.
///
/// Listening is not filtered out for rows without an example sentence; that
/// fallback belongs to whoever presents the question.
///
/// # Errors
///
/// Returns `SelectionError::NoModes` if `enabled` is empty.
pub fn choose_mode<R: Rng + ?Sized>(
    enabled: &[QuizMode],
    rng: &mut R,
) -> Result<QuizMode, SelectionError> {
    enabled.choose(rng).copied().ok_or(SelectionError::NoModes)
}
