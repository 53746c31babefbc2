use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModeError {
    #[error("quiz mode must be between 1 and 5, got {0}")]
    OutOfRange(i64),
}

/// One of the five quiz presentation directions.
///
/// The numeric identifiers (1..=5) are part of the persisted key format and
/// must not be renumbered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub enum QuizMode {
    /// Headword shown, recall the meaning.
    WordToMeaning,
    /// Meaning shown, recall the headword.
    MeaningToWord,
    /// Example sentence shown, recall its translation.
    SentenceToTranslation,
    /// Translated sentence shown, recall the example sentence.
    TranslationToSentence,
    /// Example sentence played aloud, recall both sentences.
    Listening,
}

impl QuizMode {
    pub const ALL: [QuizMode; 5] = [
        QuizMode::WordToMeaning,
        QuizMode::MeaningToWord,
        QuizMode::SentenceToTranslation,
        QuizMode::TranslationToSentence,
        QuizMode::Listening,
    ];

    /// Modes enabled when listening has not been opted into.
    pub const WITHOUT_LISTENING: [QuizMode; 4] = [
        QuizMode::WordToMeaning,
        QuizMode::MeaningToWord,
        QuizMode::SentenceToTranslation,
        QuizMode::TranslationToSentence,
    ];

    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            QuizMode::WordToMeaning => 1,
            QuizMode::MeaningToWord => 2,
            QuizMode::SentenceToTranslation => 3,
            QuizMode::TranslationToSentence => 4,
            QuizMode::Listening => 5,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            QuizMode::WordToMeaning => "word -> meaning",
            QuizMode::MeaningToWord => "meaning -> word",
            QuizMode::SentenceToTranslation => "example sentence -> translation",
            QuizMode::TranslationToSentence => "translation -> example sentence",
            QuizMode::Listening => "listening -> both sentences",
        }
    }

    /// True when the item must carry a non-empty example sentence to be presentable.
    #[must_use]
    pub fn needs_example_sentence(self) -> bool {
        matches!(self, QuizMode::Listening)
    }
}

impl TryFrom<i64> for QuizMode {
    type Error = ModeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(QuizMode::WordToMeaning),
            2 => Ok(QuizMode::MeaningToWord),
            3 => Ok(QuizMode::SentenceToTranslation),
            4 => Ok(QuizMode::TranslationToSentence),
            5 => Ok(QuizMode::Listening),
            other => Err(ModeError::OutOfRange(other)),
        }
    }
}

impl From<QuizMode> for i64 {
    fn from(mode: QuizMode) -> Self {
        i64::from(mode.number())
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_map_both_ways() {
        for (i, mode) in QuizMode::ALL.iter().enumerate() {
            let n = i64::try_from(i).unwrap() + 1;
            assert_eq!(i64::from(*mode), n);
            assert_eq!(QuizMode::try_from(n).unwrap(), *mode);
        }
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        assert_eq!(QuizMode::try_from(0), Err(ModeError::OutOfRange(0)));
        assert_eq!(QuizMode::try_from(6), Err(ModeError::OutOfRange(6)));
    }

    #[test]
    fn only_listening_needs_an_example_sentence() {
        assert!(QuizMode::Listening.needs_example_sentence());
        assert!(
            QuizMode::WITHOUT_LISTENING
                .iter()
                .all(|m| !m.needs_example_sentence())
        );
    }
}
