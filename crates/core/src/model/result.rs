use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::attempt::AnsweredQuestion;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("score ({score}) exceeds total ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("more answers ({answers}) than slots ({total})")]
    TooManyAnswers { answers: usize, total: u32 },

    #[error("score ({score}) does not match correct answers ({counted})")]
    CountMismatch { score: u32, counted: u32 },
}

/// One completed (or partially completed, saved early) test attempt.
///
/// Immutable once created; owned by a single user identity in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    timestamp: DateTime<Utc>,
    score: u32,
    total: u32,
    answers: Vec<AnsweredQuestion>,
}

impl TestResult {
    /// Creates a validated result.
    ///
    /// `total` is the slot count of the session's pool; a stopped-early
    /// attempt has fewer answers than slots, never more, and the score must
    /// agree with the recorded answers.
    ///
    /// # Errors
    ///
    /// Returns `ResultError::ScoreExceedsTotal`, `TooManyAnswers`, or
    /// `CountMismatch` when the parts do not line up.
    pub fn new(
        timestamp: DateTime<Utc>,
        score: u32,
        total: u32,
        answers: Vec<AnsweredQuestion>,
    ) -> Result<Self, ResultError> {
        if score > total {
            return Err(ResultError::ScoreExceedsTotal { score, total });
        }
        if answers.len() > total as usize {
            return Err(ResultError::TooManyAnswers {
                answers: answers.len(),
                total,
            });
        }
        let counted = u32::try_from(answers.iter().filter(|a| a.is_correct).count())
            .unwrap_or(u32::MAX);
        if counted != score {
            return Err(ResultError::CountMismatch { score, counted });
        }

        Ok(Self {
            timestamp,
            score,
            total,
            answers,
        })
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn answers(&self) -> &[AnsweredQuestion] {
        &self.answers
    }

    /// Percentage score of this attempt; `0.0` for a zero-slot session.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.score) / f64::from(self.total) * 100.0
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
