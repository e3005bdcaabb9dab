use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use storage::repository::{HistoryRepository, StorageError};
use study_core::model::{QuestionBank, StudySettings, TestResult, UserIdentity};

use super::pool::PoolBuilder;
use super::service::QuizSession;
use crate::Clock;
use crate::analytics;
use crate::error::SessionError;

const STORE_ATTEMPTS: u32 = 3;
const STORE_BACKOFF: Duration = Duration::from_millis(50);

/// Orchestrates session start, personalized pools, and persisted results.
///
/// Owns the time source and the shared read-only bank handle; repositories
/// stay behind the `HistoryRepository` trait so backends can be swapped.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    settings: StudySettings,
    bank: Arc<QuestionBank>,
    history: Arc<dyn HistoryRepository>,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: StudySettings,
        bank: Arc<QuestionBank>,
        history: Arc<dyn HistoryRepository>,
    ) -> Self {
        Self {
            clock,
            settings,
            bank,
            history,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &StudySettings {
        &self.settings
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    fn pool_builder(&self) -> PoolBuilder {
        PoolBuilder::from_settings(&self.settings)
    }

    /// Start a fresh session sampled from the whole bank.
    ///
    /// An empty bank yields an empty (immediately complete) session; callers
    /// report 0/0 rather than failing.
    #[must_use]
    pub fn start_session(&self) -> QuizSession {
        let plan = self.pool_builder().build(self.bank.questions());
        QuizSession::new(plan.questions, self.clock.now())
    }

    /// Start a session over questions the user has never seen, backfilled
    /// from the rest of the bank.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the history cannot be loaded.
    pub async fn start_unseen_session(
        &self,
        identity: &UserIdentity,
    ) -> Result<QuizSession, SessionError> {
        let history = self.history_with_retry(identity).await?;
        let subset = analytics::unseen_questions(&self.bank, &history);
        let plan = self.pool_builder().build_from_subset(&subset, &self.bank);
        Ok(QuizSession::new(plan.questions, self.clock.now()))
    }

    /// Start a session over questions the user keeps getting wrong,
    /// backfilled from the rest of the bank.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the history cannot be loaded.
    pub async fn start_weak_session(
        &self,
        identity: &UserIdentity,
    ) -> Result<QuizSession, SessionError> {
        let history = self.history_with_retry(identity).await?;
        let subset = analytics::weak_questions(&self.bank, &history);
        let plan = self.pool_builder().build_from_subset(&subset, &self.bank);
        Ok(QuizSession::new(plan.questions, self.clock.now()))
    }

    /// Finalize a session into its result using the service clock.
    ///
    /// # Errors
    ///
    /// Propagates `SessionError::Empty` / `SessionError::Completed` from the
    /// session.
    pub fn finish_session(&self, session: &mut QuizSession) -> Result<TestResult, SessionError> {
        session.finalize(self.clock.now())
    }

    /// Persist a finalized result to the identity's history.
    ///
    /// Separate from [`finish_session`](Self::finish_session) so a failed
    /// save can be retried with the same result: finalization is terminal,
    /// so one attempt can never be recorded twice.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` after retries are exhausted.
    pub async fn save_result(
        &self,
        identity: &UserIdentity,
        result: &TestResult,
    ) -> Result<(), SessionError> {
        let mut delay = STORE_BACKOFF;
        let mut attempt = 1;
        loop {
            match self.history.append_result(identity, result).await {
                Err(StorageError::Unavailable(reason)) if attempt < STORE_ATTEMPTS => {
                    debug!(attempt, %reason, "result append failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                other => return Ok(other?),
            }
        }
    }

    /// Load the identity's full history.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` after retries are exhausted.
    pub async fn history(
        &self,
        identity: &UserIdentity,
    ) -> Result<Vec<TestResult>, SessionError> {
        Ok(self.history_with_retry(identity).await?)
    }

    /// All identities with stored results.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the listing fails.
    pub async fn identities(&self) -> Result<Vec<UserIdentity>, SessionError> {
        Ok(self.history.list_identities().await?)
    }

    async fn history_with_retry(
        &self,
        identity: &UserIdentity,
    ) -> Result<Vec<TestResult>, StorageError> {
        let mut delay = STORE_BACKOFF;
        let mut attempt = 1;
        loop {
            match self.history.load_history(identity).await {
                Err(StorageError::Unavailable(reason)) if attempt < STORE_ATTEMPTS => {
                    debug!(attempt, %reason, "history load failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use storage::repository::InMemoryHistoryRepository;
    use study_core::model::{Question, QuestionId, Topic};
    use study_core::time::{fixed_clock, fixed_now};

    fn build_question(id: &str, section: &str, group: u32) -> Question {
        Question::new(
            QuestionId::new(id).unwrap(),
            Topic::new(section, group).unwrap(),
            format!("Section {section}"),
            format!("Question {id}"),
            format!("Correct {id}"),
            [
                format!("Wrong {id} a"),
                format!("Wrong {id} b"),
                format!("Wrong {id} c"),
            ],
        )
        .unwrap()
    }

    fn build_bank() -> Arc<QuestionBank> {
        let mut questions = Vec::new();
        for section in ["B-001", "B-002"] {
            for group in 1..=3 {
                for variant in 0..2 {
                    questions.push(build_question(
                        &format!("{section}-{group}-{variant}"),
                        section,
                        group,
                    ));
                }
            }
        }
        Arc::new(QuestionBank::new(Vec::new(), questions).unwrap())
    }

    fn build_service(history: Arc<dyn HistoryRepository>) -> SessionLoopService {
        SessionLoopService::new(
            fixed_clock(),
            StudySettings::default(),
            build_bank(),
            history,
        )
    }

    /// Fails the first `failures` calls with `Unavailable`, then delegates.
    struct FlakyRepository {
        inner: InMemoryHistoryRepository,
        failures: AtomicU32,
    }

    impl FlakyRepository {
        fn new(failures: u32) -> Self {
            Self {
                inner: InMemoryHistoryRepository::new(),
                failures: AtomicU32::new(failures),
            }
        }

        fn take_failure(&self) -> bool {
            self.failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                    left.checked_sub(1)
                })
                .is_ok()
        }
    }

    #[async_trait]
    impl HistoryRepository for FlakyRepository {
        async fn append_result(
            &self,
            identity: &UserIdentity,
            result: &TestResult,
        ) -> Result<(), StorageError> {
            if self.take_failure() {
                return Err(StorageError::Unavailable("flaky".into()));
            }
            self.inner.append_result(identity, result).await
        }

        async fn load_history(
            &self,
            identity: &UserIdentity,
        ) -> Result<Vec<TestResult>, StorageError> {
            if self.take_failure() {
                return Err(StorageError::Unavailable("flaky".into()));
            }
            self.inner.load_history(identity).await
        }

        async fn list_identities(&self) -> Result<Vec<UserIdentity>, StorageError> {
            self.inner.list_identities().await
        }
    }

    /// Always refuses writes with a non-transient error.
    struct BrokenRepository {
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl HistoryRepository for BrokenRepository {
        async fn append_result(
            &self,
            _identity: &UserIdentity,
            _result: &TestResult,
        ) -> Result<(), StorageError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            Err(StorageError::Serialization("broken".into()))
        }

        async fn load_history(
            &self,
            _identity: &UserIdentity,
        ) -> Result<Vec<TestResult>, StorageError> {
            Ok(Vec::new())
        }

        async fn list_identities(&self) -> Result<Vec<UserIdentity>, StorageError> {
            Ok(Vec::new())
        }
    }

    fn run_full_session(service: &SessionLoopService, session: &mut QuizSession) -> TestResult {
        for index in 0..session.total() {
            let selected = session.present(index).unwrap().options()[0].clone();
            session.submit(index, &selected).unwrap();
            session.advance();
        }
        service.finish_session(session).unwrap()
    }

    #[test]
    fn start_session_samples_one_per_topic() {
        let service = build_service(Arc::new(InMemoryHistoryRepository::new()));
        let session = service.start_session();
        // 2 sections x 3 groups = 6 topics.
        assert_eq!(session.total(), 6);
    }

    #[tokio::test]
    async fn save_then_history_round_trips() {
        let repo = Arc::new(InMemoryHistoryRepository::new());
        let service = build_service(repo);
        let identity = UserIdentity::new("alice@example.com").unwrap();

        let mut session = service.start_session();
        let result = run_full_session(&service, &mut session);
        service.save_result(&identity, &result).await.unwrap();

        let history = service.history(&identity).await.unwrap();
        assert_eq!(history, vec![result]);
        assert_eq!(
            service.identities().await.unwrap(),
            vec![identity]
        );
    }

    #[tokio::test]
    async fn unseen_session_prefers_unanswered_questions() {
        let repo = Arc::new(InMemoryHistoryRepository::new());
        let service = build_service(repo);
        let identity = UserIdentity::new("bob@example.com").unwrap();

        // Answer everything in one full-bank session first.
        let mut session = QuizSession::new(service.bank().questions().to_vec(), fixed_now());
        for index in 0..session.total() {
            session.present(index).unwrap();
            session.submit(index, "nope").unwrap();
            session.advance();
        }
        let result = service.finish_session(&mut session).unwrap();
        service.save_result(&identity, &result).await.unwrap();

        // Nothing is unseen, so the pool is pure backfill — and still capped
        // by the bank size with no duplicate ids.
        let session = service.start_unseen_session(&identity).await.unwrap();
        assert_eq!(session.total(), service.bank().len());
    }

    #[tokio::test]
    async fn weak_session_targets_missed_questions() {
        let repo = Arc::new(InMemoryHistoryRepository::new());
        let service = build_service(repo);
        let identity = UserIdentity::new("carol@example.com").unwrap();

        // Miss every question: all of them become weak.
        let mut session = QuizSession::new(service.bank().questions().to_vec(), fixed_now());
        for index in 0..session.total() {
            session.present(index).unwrap();
            session.submit(index, "definitely wrong").unwrap();
            session.advance();
        }
        let result = service.finish_session(&mut session).unwrap();
        service.save_result(&identity, &result).await.unwrap();

        let session = service.start_weak_session(&identity).await.unwrap();
        assert_eq!(session.total(), service.bank().len());
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let repo = Arc::new(FlakyRepository::new(2));
        let service = build_service(repo);
        let identity = UserIdentity::new("dave@example.com").unwrap();

        let mut session = service.start_session();
        let result = run_full_session(&service, &mut session);

        // Two transient failures, third attempt lands.
        service.save_result(&identity, &result).await.unwrap();

        // Reads retry the same way.
        let history = service.history(&identity).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn non_transient_failures_are_not_retried() {
        let repo = Arc::new(BrokenRepository {
            calls: Mutex::new(0),
        });
        let service = SessionLoopService::new(
            fixed_clock(),
            StudySettings::default(),
            build_bank(),
            Arc::clone(&repo) as Arc<dyn HistoryRepository>,
        );
        let identity = UserIdentity::new("eve@example.com").unwrap();

        let mut session = service.start_session();
        let result = run_full_session(&service, &mut session);

        let err = service.save_result(&identity, &result).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Storage(StorageError::Serialization(_))
        ));
        assert_eq!(*repo.calls.lock().unwrap(), 1);
    }
}
