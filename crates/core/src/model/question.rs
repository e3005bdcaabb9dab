use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("section code cannot be empty")]
    EmptySection,

    #[error("question text cannot be empty")]
    EmptyText,

    #[error("answer text cannot be empty")]
    EmptyAnswer,

    #[error("duplicate answer option: {0}")]
    DuplicateOption(String),
}

//
// ─── IDENTIFIERS ───────────────────────────────────────────────────────────────
//

/// Unique identifier for a question in the bank (e.g. `B-001-003`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(String);

impl QuestionId {
    /// Creates a validated `QuestionId` (trimmed, non-empty).
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyId` if the id is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, QuestionError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QuestionError::EmptyId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── TOPIC ─────────────────────────────────────────────────────────────────────
//

/// The two-level topic classification of the bank: a section code plus a
/// numeric group within it.
///
/// Ordering is section-ascending, then group-ascending **numerically** —
/// group 2 sorts before group 10.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Topic {
    section: String,
    group: u32,
}

impl Topic {
    /// Creates a validated topic key.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptySection` if the section code is empty
    /// after trimming.
    pub fn new(section: impl Into<String>, group: u32) -> Result<Self, QuestionError> {
        let section = section.into();
        let section = section.trim();
        if section.is_empty() {
            return Err(QuestionError::EmptySection);
        }
        Ok(Self {
            section: section.to_owned(),
            group,
        })
    }

    #[must_use]
    pub fn section(&self) -> &str {
        &self.section
    }

    #[must_use]
    pub fn group(&self) -> u32 {
        self.group
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} group {}", self.section, self.group)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question from the bank: one correct answer and three
/// distractors. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    topic: Topic,
    section_name: String,
    text: String,
    correct_answer: String,
    incorrect_answers: [String; 3],
}

impl Question {
    /// Creates a validated question.
    ///
    /// The four answer options must be pairwise distinct so that a shuffled
    /// option list always carries the full set.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` / `EmptyAnswer` for blank fields and
    /// `QuestionError::DuplicateOption` when two options share the same text.
    pub fn new(
        id: QuestionId,
        topic: Topic,
        section_name: impl Into<String>,
        text: impl Into<String>,
        correct_answer: impl Into<String>,
        incorrect_answers: [String; 3],
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        let correct_answer = correct_answer.into();
        if correct_answer.trim().is_empty() {
            return Err(QuestionError::EmptyAnswer);
        }
        for incorrect in &incorrect_answers {
            if incorrect.trim().is_empty() {
                return Err(QuestionError::EmptyAnswer);
            }
        }

        let mut seen: Vec<&str> = Vec::with_capacity(4);
        for option in std::iter::once(correct_answer.as_str())
            .chain(incorrect_answers.iter().map(String::as_str))
        {
            if seen.contains(&option) {
                return Err(QuestionError::DuplicateOption(option.to_owned()));
            }
            seen.push(option);
        }

        Ok(Self {
            id,
            topic,
            section_name: section_name.into(),
            text,
            correct_answer,
            incorrect_answers,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    #[must_use]
    pub fn section_name(&self) -> &str {
        &self.section_name
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn incorrect_answers(&self) -> &[String; 3] {
        &self.incorrect_answers
    }

    /// All four answer options, correct answer first.
    #[must_use]
    pub fn options(&self) -> [&str; 4] {
        [
            self.correct_answer.as_str(),
            self.incorrect_answers[0].as_str(),
            self.incorrect_answers[1].as_str(),
            self.incorrect_answers[2].as_str(),
        ]
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
