use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::QuizMode;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ItemError {
    #[error("vocabulary headword cannot be empty")]
    EmptyHeadword,
    #[error("grammar item name cannot be empty")]
    EmptyGrammarName,
}

/// A vocabulary row supplied by the data source for one level.
///
/// `headword` is the join key into progress records. Two rows with the same
/// headword share one set of mode scores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub headword: String,
    #[serde(default)]
    pub part_of_speech: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub pronunciation: String,
    #[serde(default)]
    pub example_sentence: String,
    #[serde(default)]
    pub translated_sentence: String,
}

impl VocabularyItem {
    /// Creates an item with only a headword and meaning; other fields stay empty.
    #[must_use]
    pub fn new(headword: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            headword: headword.into(),
            meaning: meaning.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_example(
        mut self,
        sentence: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        self.example_sentence = sentence.into();
        self.translated_sentence = translation.into();
        self
    }

    /// # Errors
    ///
    /// Returns `ItemError::EmptyHeadword` if the headword is blank.
    pub fn validate(&self) -> Result<(), ItemError> {
        if self.headword.trim().is_empty() {
            return Err(ItemError::EmptyHeadword);
        }
        Ok(())
    }

    /// Whether this item can be shown in `mode`.
    ///
    /// Selection never consults this; a presentation layer uses it to show a
    /// "cannot present" fallback for listening questions without a sentence.
    #[must_use]
    pub fn supports_mode(&self, mode: QuizMode) -> bool {
        !mode.needs_example_sentence() || !self.example_sentence.trim().is_empty()
    }
}

/// A grammar lesson supplied by the data source for one level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarItem {
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub example_original: String,
    #[serde(default)]
    pub example_translation: String,
}

impl GrammarItem {
    #[must_use]
    pub fn new(name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns `ItemError::EmptyGrammarName` if the name is blank.
    pub fn validate(&self) -> Result<(), ItemError> {
        if self.name.trim().is_empty() {
            return Err(ItemError::EmptyGrammarName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let item: VocabularyItem = serde_json::from_str(r#"{"headword":"apple"}"#).unwrap();
        assert_eq!(item.headword, "apple");
        assert!(item.meaning.is_empty());
        assert!(item.example_sentence.is_empty());
        assert!(item.validate().is_ok());

        let grammar: GrammarItem = serde_json::from_str(r#"{"name":"be going to"}"#).unwrap();
        assert!(grammar.explanation.is_empty());
        assert!(grammar.validate().is_ok());
    }

    #[test]
    fn blank_keys_are_rejected() {
        assert_eq!(
            VocabularyItem::new("  ", "x").validate(),
            Err(ItemError::EmptyHeadword)
        );
        assert_eq!(
            GrammarItem::new("", "x").validate(),
            Err(ItemError::EmptyGrammarName)
        );
    }

    #[test]
    fn listening_needs_a_sentence_other_modes_do_not() {
        let bare = VocabularyItem::new("run", "to move fast");
        assert!(!bare.supports_mode(QuizMode::Listening));
        assert!(bare.supports_mode(QuizMode::SentenceToTranslation));

        let with_sentence = bare.with_example("I run every day.", "");
        assert!(with_sentence.supports_mode(QuizMode::Listening));
    }
}
