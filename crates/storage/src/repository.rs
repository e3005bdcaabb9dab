use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use study_core::model::{AnsweredQuestion, TestResult, UserIdentity};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── WIRE RECORDS ──────────────────────────────────────────────────────────────
//

/// Serializes the numeric group as a string on the wire (the persisted
/// documents always carried group as text) while accepting bare numbers on
/// read.
mod group_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(group: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(group)
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Persisted shape for one answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub section: String,
    #[serde(with = "group_string")]
    pub group: u32,
    pub question: String,
    pub selected: String,
    pub correct: String,
    pub is_correct: bool,
}

impl AnswerRecord {
    #[must_use]
    pub fn from_answer(answer: &AnsweredQuestion) -> Self {
        Self {
            section: answer.section.clone(),
            group: answer.group,
            question: answer.question.clone(),
            selected: answer.selected.clone(),
            correct: answer.correct.clone(),
            is_correct: answer.is_correct,
        }
    }

    #[must_use]
    pub fn into_answer(self) -> AnsweredQuestion {
        AnsweredQuestion {
            section: self.section,
            group: self.group,
            question: self.question,
            selected: self.selected,
            correct: self.correct,
            is_correct: self.is_correct,
        }
    }
}

/// Persisted shape for one test result.
///
/// This mirrors the domain `TestResult` so adapters can serialize without
/// leaking wire concerns into the domain layer. Timestamps travel as ISO-8601
/// strings; the reader also accepts naive timestamps (assumed UTC), which
/// older documents contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub timestamp: String,
    pub score: u32,
    pub total: u32,
    pub answers: Vec<AnswerRecord>,
}

impl ResultRecord {
    #[must_use]
    pub fn from_result(result: &TestResult) -> Self {
        Self {
            timestamp: result.timestamp().to_rfc3339(),
            score: result.score(),
            total: result.total(),
            answers: result.answers().iter().map(AnswerRecord::from_answer).collect(),
        }
    }

    /// Convert the record back into a domain `TestResult`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Malformed` if the timestamp cannot be parsed or
    /// the score/total/answers fail domain validation.
    pub fn into_result(self) -> Result<TestResult, StorageError> {
        let timestamp = parse_timestamp(&self.timestamp)?;
        let answers = self.answers.into_iter().map(AnswerRecord::into_answer).collect();
        TestResult::new(timestamp, self.score, self.total, answers)
            .map_err(|e| StorageError::Malformed(e.to_string()))
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|_| StorageError::Malformed(format!("unparseable timestamp: {raw}")))
}

//
// ─── REPOSITORY CONTRACT ──────────────────────────────────────────────────────
//

/// Repository contract for per-identity result histories.
///
/// `append_result` is a full read-modify-write of the identity's document:
/// two concurrent writers for the same identity can lose one append (last
/// writer wins). This matches the external object store the production
/// system targets and is an accepted limitation, not a bug to paper over.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append one result to the identity's history.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be read back or written.
    async fn append_result(
        &self,
        identity: &UserIdentity,
        result: &TestResult,
    ) -> Result<(), StorageError>;

    /// Load the identity's full history in append order.
    ///
    /// An unknown identity yields an empty history, never an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` on transient I/O failure.
    async fn load_history(&self, identity: &UserIdentity)
        -> Result<Vec<TestResult>, StorageError>;

    /// All identities with at least one stored result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` on transient I/O failure.
    async fn list_identities(&self) -> Result<Vec<UserIdentity>, StorageError>;
}

//
// ─── IN-MEMORY BACKEND ────────────────────────────────────────────────────────
//

/// Simple in-memory repository for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryHistoryRepository {
    histories: Arc<Mutex<HashMap<UserIdentity, Vec<TestResult>>>>,
}

impl InMemoryHistoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            histories: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn append_result(
        &self,
        identity: &UserIdentity,
        result: &TestResult,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .histories
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard
            .entry(identity.clone())
            .or_default()
            .push(result.clone());
        Ok(())
    }

    async fn load_history(
        &self,
        identity: &UserIdentity,
    ) -> Result<Vec<TestResult>, StorageError> {
        let guard = self
            .histories
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(guard.get(identity).cloned().unwrap_or_default())
    }

    async fn list_identities(&self) -> Result<Vec<UserIdentity>, StorageError> {
        let guard = self
            .histories
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let mut identities: Vec<UserIdentity> = guard.keys().cloned().collect();
        identities.sort();
        Ok(identities)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
