use thiserror::Error;

use crate::model::QuizMode;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuizStateError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
}

/// The question currently on screen: a row index into the caller's item list
/// and the direction it is asked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizTurn {
    pub index: usize,
    pub mode: QuizMode,
}

impl QuizTurn {
    #[must_use]
    pub fn new(index: usize, mode: QuizMode) -> Self {
        Self { index, mode }
    }
}

/// Caller-held quiz flow: `Idle -> Questioning -> Revealed -> Questioning ...`.
///
/// Every transition consumes the state and returns the next one; nothing is
/// stored inside the progress core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuizState {
    #[default]
    Idle,
    Questioning(QuizTurn),
    Revealed(QuizTurn),
}

impl QuizState {
    fn name(self) -> &'static str {
        match self {
            QuizState::Idle => "idle",
            QuizState::Questioning(_) => "questioning",
            QuizState::Revealed(_) => "revealed",
        }
    }

    fn invalid(self, action: &'static str) -> QuizStateError {
        QuizStateError::InvalidTransition {
            state: self.name(),
            action,
        }
    }

    /// Asks a freshly drawn question. Allowed from every state, so starting
    /// again mid-question or after a reveal simply replaces the current turn.
    #[must_use]
    pub fn start(self, turn: QuizTurn) -> Self {
        QuizState::Questioning(turn)
    }

    /// # Errors
    ///
    /// Fails unless a question is being asked.
    pub fn reveal(self) -> Result<Self, QuizStateError> {
        match self {
            QuizState::Questioning(turn) => Ok(QuizState::Revealed(turn)),
            other => Err(other.invalid("reveal")),
        }
    }

    /// Moves on to the next question, graded or skipped.
    ///
    /// # Errors
    ///
    /// Fails unless the answer has been revealed.
    pub fn next(self, turn: QuizTurn) -> Result<Self, QuizStateError> {
        match self {
            QuizState::Revealed(_) => Ok(QuizState::Questioning(turn)),
            other => Err(other.invalid("move to the next question")),
        }
    }

    #[must_use]
    pub fn stop(self) -> Self {
        QuizState::Idle
    }

    /// The turn that may be graded right now. Grading is only allowed after reveal.
    #[must_use]
    pub fn gradable_turn(self) -> Option<QuizTurn> {
        match self {
            QuizState::Revealed(turn) => Some(turn),
            _ => None,
        }
    }

    #[must_use]
    pub fn current_turn(self) -> Option<QuizTurn> {
        match self {
            QuizState::Idle => None,
            QuizState::Questioning(turn) | QuizState::Revealed(turn) => Some(turn),
        }
    }
}
