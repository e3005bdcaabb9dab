use std::sync::Arc;

use services::{Clock, SessionLoopService, analytics, export};
use storage::repository::InMemoryHistoryRepository;
use study_core::model::{Question, QuestionBank, QuestionId, StudySettings, Topic, UserIdentity};
use study_core::time::fixed_now;

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
    for section in ["B-001", "B-002", "B-003"] {
        for group in 1..=2 {
            for variant in 0..3 {
                questions.push(build_question(
                    &format!("{section}-{group}-{variant}"),
                    section,
                    group,
                ));
            }
        }
    }
    Arc::new(
        QuestionBank::new(
            vec![
                ("B-001".to_owned(), "Regulations".to_owned()),
                ("B-002".to_owned(), "Operating".to_owned()),
                ("B-003".to_owned(), "Theory".to_owned()),
            ],
            questions,
        )
        .unwrap(),
    )
}

#[tokio::test]
async fn full_study_flow_persists_and_analyzes() {
    let bank = build_bank();
    let repo = Arc::new(InMemoryHistoryRepository::new());
    let service = SessionLoopService::new(
        Clock::fixed(fixed_now()),
        StudySettings::default(),
        Arc::clone(&bank),
        repo,
    );
    let identity = UserIdentity::new("  Smoke@Example.COM ").unwrap();

    // One question per (section, group) cell: 3 sections x 2 groups.
    let mut session = service.start_session();
    assert_eq!(session.total(), 6);

    // Answer everything correctly except the last question.
    let total = session.total();
    for index in 0..total {
        let pooled = session.present(index).unwrap();
        let selected = if index == total - 1 {
            pooled
                .options()
                .iter()
                .find(|o| o.as_str() != pooled.question().correct_answer())
                .cloned()
                .unwrap()
        } else {
            pooled.question().correct_answer().to_owned()
        };
        session.submit(index, &selected).unwrap();
        session.advance();
    }
    assert!(session.is_complete());

    let result = service.finish_session(&mut session).unwrap();
    assert_eq!(result.score(), 5);
    assert_eq!(result.total(), 6);
    service.save_result(&identity, &result).await.unwrap();

    // A differently-cased identity resolves to the same history.
    let identity = UserIdentity::new("smoke@example.com").unwrap();
    let history = service.history(&identity).await.unwrap();
    assert_eq!(history.len(), 1);

    let summary = analytics::summary(&history).unwrap();
    assert_eq!(summary.count, 1);
    assert!((summary.latest_score - result.percent()).abs() < f64::EPSILON);

    // Six answered cells in the breakdown, five perfect and one at zero.
    let scores = analytics::breakdown(&history);
    assert_eq!(scores.len(), 6);
    assert_eq!(scores.iter().filter(|s| s.percent == 100.0).count(), 5);
    assert_eq!(analytics::weak_topics(&history, 70.0).len(), 1);

    // Coverage accounts for every bank cell and sums cleanly.
    let coverage = analytics::coverage(&history, &bank);
    assert_eq!(coverage.len(), 6);
    for cell in &coverage {
        assert_eq!(cell.answered_questions + cell.remaining, cell.total_questions);
        assert_eq!(cell.answered_questions, 1);
    }

    // Export shapes line up with the stored history.
    let rows = export::history_rows(&history);
    assert_eq!(rows.len(), 6);
    let csv = export::history_to_csv(&history).unwrap();
    assert_eq!(csv.lines().count(), 7);
    let json = export::history_to_json(&history).unwrap();
    assert!(json.contains("\"score\": 5"));

    // A weak-question session focuses on the one missed question, topped up
    // from the bank without duplicate ids.
    let weak = analytics::weak_questions(&bank, &history);
    assert_eq!(weak.len(), 1);
    let session = service.start_weak_session(&identity).await.unwrap();
    assert_eq!(session.total(), bank.len());
}
