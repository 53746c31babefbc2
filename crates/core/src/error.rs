use thiserror::Error;

use crate::document::FormatError;
use crate::model::{GradeError, ItemError, LevelError, ModeError, QuizStateError};
use crate::selection::SelectionError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Mode(#[from] ModeError),
    #[error(transparent)]
    Grade(#[from] GradeError),
    #[error(transparent)]
    Item(#[from] ItemError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    QuizState(#[from] QuizStateError),
    #[error(transparent)]
    Format(#[from] FormatError),
}
