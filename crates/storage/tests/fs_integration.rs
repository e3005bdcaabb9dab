use study_core::model::{AnsweredQuestion, TestResult, UserIdentity};
use study_core::time::fixed_now;
use storage::fs::FsHistoryStore;
use storage::repository::HistoryRepository;

fn build_result(score: u32, total: u32) -> TestResult {
    let answers = (0..score)
        .map(|i| AnsweredQuestion::new("B-005", 3, format!("Q{i}"), "ans", "ans", true))
        .collect();
    TestResult::new(fixed_now(), score, total, answers).unwrap()
}

#[tokio::test]
async fn append_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsHistoryStore::open(dir.path()).unwrap();
    let identity = UserIdentity::new("carol@example.com").unwrap();

    let first = build_result(2, 3);
    let second = build_result(3, 3);
    store.append_result(&identity, &first).await.unwrap();
    store.append_result(&identity, &second).await.unwrap();

    let history = store.load_history(&identity).await.unwrap();
    assert_eq!(history, vec![first, second]);
}

#[tokio::test]
async fn unknown_identity_loads_empty_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsHistoryStore::open(dir.path()).unwrap();
    let identity = UserIdentity::new("ghost@example.com").unwrap();

    let history = store.load_history(&identity).await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn differently_cased_identities_share_one_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsHistoryStore::open(dir.path()).unwrap();

    let upper = UserIdentity::new("  Dave@Example.COM ").unwrap();
    let lower = UserIdentity::new("dave@example.com").unwrap();

    store.append_result(&upper, &build_result(1, 2)).await.unwrap();
    let history = store.load_history(&lower).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn list_identities_scans_documents() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsHistoryStore::open(dir.path()).unwrap();

    let alice = UserIdentity::new("alice@example.com").unwrap();
    let bob = UserIdentity::new("bob@example.com").unwrap();
    store.append_result(&bob, &build_result(0, 1)).await.unwrap();
    store.append_result(&alice, &build_result(1, 1)).await.unwrap();

    // An unrelated file in the directory is ignored.
    std::fs::write(dir.path().join("notes.txt"), "not a history").unwrap();

    let identities = store.list_identities().await.unwrap();
    assert_eq!(identities, vec![alice, bob]);
}

#[tokio::test]
async fn malformed_records_are_skipped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsHistoryStore::open(dir.path()).unwrap();
    let identity = UserIdentity::new("eve@example.com").unwrap();

    let document = r#"[
        {
            "timestamp": "2024-12-24T00:26:40+00:00",
            "score": 1,
            "total": 1,
            "answers": [{
                "section": "B-001",
                "group": "4",
                "question": "Q",
                "selected": "a",
                "correct": "a",
                "is_correct": true
            }]
        },
        { "score": "not even close" }
    ]"#;
    std::fs::write(
        dir.path().join("test_results_eve@example.com.json"),
        document,
    )
    .unwrap();

    let history = store.load_history(&identity).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].score(), 1);
    assert_eq!(history[0].answers()[0].group, 4);
}

#[tokio::test]
async fn unparseable_document_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsHistoryStore::open(dir.path()).unwrap();
    let identity = UserIdentity::new("frank@example.com").unwrap();

    std::fs::write(
        dir.path().join("test_results_frank@example.com.json"),
        "{{{ definitely not json",
    )
    .unwrap();

    let history = store.load_history(&identity).await.unwrap();
    assert!(history.is_empty());

    // Appending on top of the damaged document starts a fresh history.
    store.append_result(&identity, &build_result(1, 1)).await.unwrap();
    let history = store.load_history(&identity).await.unwrap();
    assert_eq!(history.len(), 1);
}
