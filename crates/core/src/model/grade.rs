use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GradeError {
    #[error("self-grade must be 0, 5 or 10, got {0}")]
    InvalidPoints(i64),
}

/// The learner's own verdict after revealing an answer.
///
/// Live grading only ever writes these three scores. Storage does not enforce
/// the convention, so imported documents may carry other values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfGrade {
    /// Recalled correctly.
    Correct,
    /// Partly recalled.
    Partial,
    /// Not recalled.
    Wrong,
}

impl SelfGrade {
    #[must_use]
    pub fn points(self) -> i64 {
        match self {
            SelfGrade::Correct => 10,
            SelfGrade::Partial => 5,
            SelfGrade::Wrong => 0,
        }
    }

    /// # Errors
    ///
    /// Returns `GradeError::InvalidPoints` for anything other than 0, 5 or 10.
    pub fn from_points(points: i64) -> Result<Self, GradeError> {
        match points {
            10 => Ok(SelfGrade::Correct),
            5 => Ok(SelfGrade::Partial),
            0 => Ok(SelfGrade::Wrong),
            other => Err(GradeError::InvalidPoints(other)),
        }
    }
}
