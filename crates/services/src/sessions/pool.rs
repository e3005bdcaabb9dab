use rand::rng;
use rand::seq::{IndexedRandom, SliceRandom};
use std::collections::{BTreeMap, HashSet};

use study_core::model::{Question, QuestionBank, QuestionId, StudySettings, Topic};

/// Selection result for a pool build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolPlan {
    pub questions: Vec<Question>,
    pub topics_covered: usize,
    pub backfilled: usize,
}

impl PoolPlan {
    /// Total number of questions in this pool.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Returns true when no questions were selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Builds a session pool under the one-question-per-topic sampling rule.
///
/// Draws are independent and intentionally non-repeatable: two builds over
/// the same source produce different pools.
pub struct PoolBuilder {
    cap: usize,
}

impl PoolBuilder {
    /// Builder with the default session cap.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cap: StudySettings::default().session_cap() as usize,
        }
    }

    /// Builder using the cap from `settings`.
    #[must_use]
    pub fn from_settings(settings: &StudySettings) -> Self {
        Self {
            cap: settings.session_cap() as usize,
        }
    }

    /// Override the session cap.
    #[must_use]
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap;
        self
    }

    /// Build a pool from an arbitrary set of source questions.
    ///
    /// Partitions the source by topic, draws exactly one question uniformly
    /// from each partition, shuffles the picks as a whole, then truncates to
    /// the cap. An empty source yields an empty pool, not an error.
    #[must_use]
    pub fn build(&self, source: &[Question]) -> PoolPlan {
        let mut by_topic: BTreeMap<&Topic, Vec<&Question>> = BTreeMap::new();
        for question in source {
            by_topic.entry(question.topic()).or_default().push(question);
        }

        let mut rng = rng();
        let mut picks: Vec<Question> = by_topic
            .values()
            .filter_map(|partition| partition.as_slice().choose(&mut rng))
            .map(|q| (*q).clone())
            .collect();
        let topics_covered = picks.len();

        picks.as_mut_slice().shuffle(&mut rng);
        picks.truncate(self.cap);

        PoolPlan {
            questions: picks,
            topics_covered,
            backfilled: 0,
        }
    }

    /// Build a personalized pool from a pre-selected subset (unseen or weak
    /// questions), backfilling from the rest of the bank when the subset is
    /// smaller than the cap.
    ///
    /// The subset is taken whole (shuffled and capped); backfill draws
    /// uniformly from bank questions whose id is not already in the pool, so
    /// the result never contains a duplicate question id. When the bank runs
    /// out the pool simply stays short.
    #[must_use]
    pub fn build_from_subset(&self, subset: &[Question], bank: &QuestionBank) -> PoolPlan {
        let mut rng = rng();
        let mut picks: Vec<Question> = subset.to_vec();
        picks.as_mut_slice().shuffle(&mut rng);
        picks.truncate(self.cap);

        let mut backfilled = 0;
        if picks.len() < self.cap {
            let chosen: HashSet<QuestionId> = picks.iter().map(|q| q.id().clone()).collect();
            let mut extras: Vec<Question> = bank
                .questions()
                .iter()
                .filter(|q| !chosen.contains(q.id()))
                .cloned()
                .collect();
            extras.as_mut_slice().shuffle(&mut rng);

            let need = self.cap - picks.len();
            backfilled = need.min(extras.len());
            picks.extend(extras.into_iter().take(need));
            picks.as_mut_slice().shuffle(&mut rng);
        }

        let topics_covered = picks
            .iter()
            .map(Question::topic)
            .collect::<HashSet<_>>()
            .len();

        PoolPlan {
            questions: picks,
            topics_covered,
            backfilled,
        }
    }
}

impl Default for PoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
