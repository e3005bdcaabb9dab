use crate::model::question::{Question, Topic};

/// Record of a single answered pool slot.
///
/// Captures the question and answer texts rather than ids: the persisted
/// history stays meaningful even if the bank is re-keyed between releases.
/// Immutable once recorded — a session records at most one per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsweredQuestion {
    pub section: String,
    pub group: u32,
    pub question: String,
    pub selected: String,
    pub correct: String,
    pub is_correct: bool,
}

impl AnsweredQuestion {
    #[must_use]
    pub fn new(
        section: impl Into<String>,
        group: u32,
        question: impl Into<String>,
        selected: impl Into<String>,
        correct: impl Into<String>,
        is_correct: bool,
    ) -> Self {
        Self {
            section: section.into(),
            group,
            question: question.into(),
            selected: selected.into(),
            correct: correct.into(),
            is_correct,
        }
    }

    /// Builds the record for a question answered with `selected`.
    #[must_use]
    pub fn for_question(question: &Question, selected: impl Into<String>) -> Self {
        let selected = selected.into();
        let is_correct = selected == question.correct_answer();
        Self::new(
            question.topic().section(),
            question.topic().group(),
            question.text(),
            selected,
            question.correct_answer(),
            is_correct,
        )
    }

    /// The (section, group) cell this answer counts toward.
    ///
    /// Returns `None` only if the stored section code is blank, which a
    /// well-formed record never is.
    #[must_use]
    pub fn topic(&self) -> Option<Topic> {
        Topic::new(self.section.as_str(), self.group).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::QuestionId;

    fn build_question() -> Question {
        Question::new(
            QuestionId::new("B-001-001").unwrap(),
            Topic::new("B-001", 3).unwrap(),
            "Regulations",
            "What is the question?",
            "Right",
            ["Wrong a".into(), "Wrong b".into(), "Wrong c".into()],
        )
        .unwrap()
    }

    #[test]
    fn for_question_marks_correct_selection() {
        let answer = AnsweredQuestion::for_question(&build_question(), "Right");
        assert!(answer.is_correct);
        assert_eq!(answer.section, "B-001");
        assert_eq!(answer.group, 3);
        assert_eq!(answer.correct, "Right");
    }

    #[test]
    fn for_question_marks_incorrect_selection() {
        let answer = AnsweredQuestion::for_question(&build_question(), "Wrong b");
        assert!(!answer.is_correct);
        assert_eq!(answer.selected, "Wrong b");
    }

    #[test]
    fn topic_rebuilds_the_cell_key() {
        let answer = AnsweredQuestion::for_question(&build_question(), "Right");
        let topic = answer.topic().unwrap();
        assert_eq!(topic.section(), "B-001");
        assert_eq!(topic.group(), 3);
    }
}
