//! Shared error types for the services crate.

use thiserror::Error;

use cefr_core::document::FormatError;
use cefr_core::model::{GradeError, ItemError, LevelError};
use cefr_core::selection::SelectionError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// A caller passed arguments the progress core refuses to guess about.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PreconditionError {
    #[error("no items were supplied")]
    EmptyItems,
    #[error("no quiz modes are enabled")]
    NoModesEnabled,
    #[error("headword cannot be empty")]
    EmptyHeadword,
    #[error("grammar name cannot be empty")]
    EmptyGrammarName,
    #[error(transparent)]
    Level(#[from] LevelError),
}

impl From<SelectionError> for PreconditionError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::NoModes => PreconditionError::NoModesEnabled,
            _ => PreconditionError::EmptyItems,
        }
    }
}

/// Errors emitted by the progress services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Grade(#[from] GradeError),
    #[error(transparent)]
    Item(#[from] ItemError),
    #[error("selection failed: {0}")]
    Selection(SelectionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<SelectionError> for ProgressError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::NoItems | SelectionError::NoModes => {
                ProgressError::Precondition(err.into())
            }
            other => ProgressError::Selection(other),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
