use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::model::question::{Question, QuestionId, Topic};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("duplicate question id: {0}")]
    DuplicateQuestionId(QuestionId),
}

/// Immutable in-memory view of the whole question bank.
///
/// Built once from two already-parsed tabular inputs — the study-guide table
/// (section code → display name) and the question rows — and then shared by
/// reference for the rest of the process lifetime. The spreadsheet ingestion
/// itself lives outside this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
    section_names: BTreeMap<String, String>,
}

impl QuestionBank {
    /// Assembles a bank from section-name rows and question rows.
    ///
    /// # Errors
    ///
    /// Returns `BankError::DuplicateQuestionId` when two rows carry the same
    /// question id.
    pub fn new(
        section_names: impl IntoIterator<Item = (String, String)>,
        questions: Vec<Question>,
    ) -> Result<Self, BankError> {
        let mut seen: HashSet<QuestionId> = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id().clone()) {
                return Err(BankError::DuplicateQuestionId(question.id().clone()));
            }
        }

        Ok(Self {
            questions,
            section_names: section_names.into_iter().collect(),
        })
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Distinct topics present in the bank, sorted section-then-group.
    #[must_use]
    pub fn topics(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self
            .questions
            .iter()
            .map(|q| q.topic().clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        topics.sort();
        topics
    }

    /// All questions belonging to one topic cell, in bank order.
    #[must_use]
    pub fn questions_in_topic(&self, topic: &Topic) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.topic() == topic)
            .collect()
    }

    /// Display name for a section code, from the study-guide table.
    #[must_use]
    pub fn section_name(&self, section: &str) -> Option<&str> {
        self.section_names.get(section).map(String::as_str)
    }

    /// Section codes known to the study-guide table, sorted.
    #[must_use]
    pub fn sections(&self) -> Vec<&str> {
        self.section_names.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn find(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
