use chrono::{DateTime, Utc};
use rand::rng;
use rand::seq::SliceRandom;
use std::fmt;

use study_core::model::{AnsweredQuestion, Question, TestResult};

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── SLOTS ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of one pool slot. The single authority on whether a slot may be
/// presented or submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Unseen,
    Presented,
    Answered,
}

/// A question plus its four options in the one shuffled order fixed for the
/// lifetime of this session's slot. Re-presenting must not reshuffle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PooledQuestion {
    question: Question,
    options: Vec<String>,
}

impl PooledQuestion {
    fn materialize(question: &Question) -> Self {
        let mut options: Vec<String> =
            question.options().iter().map(|s| (*s).to_owned()).collect();
        options.as_mut_slice().shuffle(&mut rng());
        Self {
            question: question.clone(),
            options,
        }
    }

    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }
}

#[derive(Debug, Clone)]
struct Slot {
    question: Question,
    status: SlotStatus,
    presented: Option<PooledQuestion>,
    answer: Option<AnsweredQuestion>,
}

impl Slot {
    fn new(question: Question) -> Self {
        Self {
            question,
            status: SlotStatus::Unseen,
            presented: None,
            answer: None,
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state for one test attempt.
///
/// Steps through an ordered, already-capped pool of questions, materializing
/// each slot's shuffled options on first presentation and recording at most
/// one answer per slot. Never persisted itself — only the `TestResult` it
/// finalizes into is. Restart or abandon simply drops the value.
pub struct QuizSession {
    slots: Vec<Slot>,
    current: usize,
    correct: u32,
    incorrect: u32,
    started_at: DateTime<Utc>,
    finalized_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Create a session over `pool`. An empty pool is allowed and produces a
    /// session that is immediately complete; only finalizing it is an error.
    ///
    /// `started_at` should come from the services layer clock.
    #[must_use]
    pub fn new(pool: Vec<Question>, started_at: DateTime<Utc>) -> Self {
        Self {
            slots: pool.into_iter().map(Slot::new).collect(),
            current: 0,
            correct: 0,
            incorrect: 0,
            started_at,
            finalized_at: None,
        }
    }

    /// Total number of slots in this session.
    #[must_use]
    pub fn total(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots that have been answered.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        (self.correct + self.incorrect) as usize
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finalized_at(&self) -> Option<DateTime<Utc>> {
        self.finalized_at
    }

    /// The session is complete once the cursor has moved past the last slot.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current >= self.slots.len()
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized_at.is_some()
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.total(),
            answered: self.answered_count(),
            correct: self.correct,
            incorrect: self.incorrect,
            remaining: self.slots.len().saturating_sub(self.current),
            is_complete: self.is_complete(),
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.slots.get(self.current).map(|slot| &slot.question)
    }

    /// Lifecycle status of one slot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SlotOutOfRange` for an invalid index.
    pub fn slot_status(&self, index: usize) -> Result<SlotStatus, SessionError> {
        self.slots
            .get(index)
            .map(|slot| slot.status)
            .ok_or(SessionError::SlotOutOfRange {
                index,
                total: self.slots.len(),
            })
    }

    /// Present the slot at `index`, materializing its shuffled option list on
    /// first call. Idempotent: repeated calls return the identical order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SlotOutOfRange` for an invalid index.
    pub fn present(&mut self, index: usize) -> Result<&PooledQuestion, SessionError> {
        let total = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(SessionError::SlotOutOfRange { index, total })?;

        if slot.presented.is_none() {
            slot.presented = Some(PooledQuestion::materialize(&slot.question));
            slot.status = SlotStatus::Presented;
        }
        slot.presented
            .as_ref()
            .ok_or(SessionError::SlotOutOfRange { index, total })
    }

    /// Record an answer for the slot at `index`.
    ///
    /// At most one answer is recorded per slot: a duplicate submission
    /// returns the already-recorded answer without touching the counters.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once finalized,
    /// `SessionError::SlotOutOfRange` for an invalid index, and
    /// `SessionError::NotPresented` when the slot was never shown.
    pub fn submit(
        &mut self,
        index: usize,
        selected: &str,
    ) -> Result<&AnsweredQuestion, SessionError> {
        if self.is_finalized() {
            return Err(SessionError::Completed);
        }
        let total = self.slots.len();

        let newly_correct = {
            let slot = self
                .slots
                .get_mut(index)
                .ok_or(SessionError::SlotOutOfRange { index, total })?;

            // The one guard against double-counting: an answered slot is
            // returned as-is, counters untouched.
            if slot.answer.is_some() {
                None
            } else {
                if slot.status == SlotStatus::Unseen {
                    return Err(SessionError::NotPresented { index });
                }
                let answer = AnsweredQuestion::for_question(&slot.question, selected);
                let is_correct = answer.is_correct;
                slot.answer = Some(answer);
                slot.status = SlotStatus::Answered;
                Some(is_correct)
            }
        };

        match newly_correct {
            Some(true) => self.correct += 1,
            Some(false) => self.incorrect += 1,
            None => {}
        }

        self.slots
            .get(index)
            .and_then(|slot| slot.answer.as_ref())
            .ok_or(SessionError::SlotOutOfRange { index, total })
    }

    /// Move the cursor to the next slot, completing the session once it
    /// passes the last one. Returns the new cursor position.
    pub fn advance(&mut self) -> usize {
        if self.current < self.slots.len() {
            self.current += 1;
        }
        self.current
    }

    /// Answers recorded so far, in slot order.
    #[must_use]
    pub fn answers(&self) -> Vec<&AnsweredQuestion> {
        self.slots
            .iter()
            .filter_map(|slot| slot.answer.as_ref())
            .collect()
    }

    /// Finalize this attempt into an immutable `TestResult`.
    ///
    /// `total` stays the full slot count even when the user stopped early.
    /// Terminal: after this call the session accepts no further submissions,
    /// so a save can never run twice off one attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` for a zero-question session and
    /// `SessionError::Completed` on a second call.
    pub fn finalize(&mut self, completed_at: DateTime<Utc>) -> Result<TestResult, SessionError> {
        if self.slots.is_empty() {
            return Err(SessionError::Empty);
        }
        if self.is_finalized() {
            return Err(SessionError::Completed);
        }

        let answers: Vec<AnsweredQuestion> = self
            .slots
            .iter()
            .filter_map(|slot| slot.answer.clone())
            .collect();
        let total = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        let result = TestResult::new(completed_at, self.correct, total, answers)?;

        self.finalized_at = Some(completed_at);
        Ok(result)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("slots_len", &self.slots.len())
            .field("current", &self.current)
            .field("correct", &self.correct)
            .field("incorrect", &self.incorrect)
            .field("started_at", &self.started_at)
            .field("finalized_at", &self.finalized_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
