mod grade;
mod items;
mod level;
mod mode;
mod progress;
mod quiz;

pub use grade::{GradeError, SelfGrade};
pub use items::{GrammarItem, ItemError, VocabularyItem};
pub use level::{Level, LevelError};
pub use mode::{ModeError, QuizMode};
pub use progress::{
    DEFAULT_MODE_SCORE, GrammarReadKey, GrammarReadRecord, GrammarReadStats, ModeScore,
    ProgressSnapshot, WordModeBreakdown, WordScoreKey, WordScoreRecord,
};
pub use quiz::{QuizState, QuizStateError, QuizTurn};
