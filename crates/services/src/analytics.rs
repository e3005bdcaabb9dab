//! Aggregate statistics over a user's result history.
//!
//! Every function here is pure and total over well-formed inputs: empty
//! histories produce empty outputs (or `None`), never errors or NaN.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};

use study_core::model::{Question, QuestionBank, TestResult, Topic};

/// Per-question mean correctness below which a question counts as weak when
/// assembling a practice pool.
pub const WEAK_QUESTION_SHARE: f64 = 0.70;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

//
// ─── SUMMARY & TREND ───────────────────────────────────────────────────────────
//

/// Headline numbers for one user's history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub count: usize,
    pub average_score: f64,
    pub best_score: f64,
    pub latest_score: f64,
}

/// One attempt on the score-over-time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub score_percent: f64,
}

/// Percentage scores per attempt, sorted ascending by timestamp.
///
/// Append order usually matches timestamp order already, but the sort is
/// applied regardless so an out-of-order document cannot skew the trend.
/// The sort is stable: attempts sharing a timestamp keep append order.
#[must_use]
pub fn score_trend(history: &[TestResult]) -> Vec<TrendPoint> {
    let mut points: Vec<TrendPoint> = history
        .iter()
        .map(|result| TrendPoint {
            timestamp: result.timestamp(),
            score_percent: result.percent(),
        })
        .collect();
    points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    points
}

/// Count, mean, best, and latest percentage score; `None` for an empty
/// history ("no data" rather than a division by zero).
#[must_use]
pub fn summary(history: &[TestResult]) -> Option<HistorySummary> {
    let trend = score_trend(history);
    let latest_score = trend.last()?.score_percent;

    let count = trend.len();
    let average_score =
        trend.iter().map(|p| p.score_percent).sum::<f64>() / count as f64;
    let best_score = trend
        .iter()
        .map(|p| p.score_percent)
        .fold(0.0_f64, f64::max);

    Some(HistorySummary {
        count,
        average_score,
        best_score,
        latest_score,
    })
}

//
// ─── TOPIC BREAKDOWN ───────────────────────────────────────────────────────────
//

/// Accuracy within one (section, group) cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicScore {
    pub topic: Topic,
    pub correct: u32,
    pub total: u32,
    pub percent: f64,
}

/// Per-topic accuracy over every answer in the history, sorted by topic
/// (section ascending, then group ascending numerically).
///
/// Topics the user has never answered are absent — a cell with no data shows
/// as a gap, not as 0%.
#[must_use]
pub fn breakdown(history: &[TestResult]) -> Vec<TopicScore> {
    let mut cells: BTreeMap<Topic, (u32, u32)> = BTreeMap::new();
    for result in history {
        for answer in result.answers() {
            let Some(topic) = answer.topic() else { continue };
            let cell = cells.entry(topic).or_insert((0, 0));
            cell.1 += 1;
            if answer.is_correct {
                cell.0 += 1;
            }
        }
    }

    cells
        .into_iter()
        .map(|(topic, (correct, total))| TopicScore {
            topic,
            correct,
            total,
            percent: round1(f64::from(correct) / f64::from(total) * 100.0),
        })
        .collect()
}

/// Accuracy for a single topic cell; `None` when the user has never answered
/// in that cell.
#[must_use]
pub fn topic_breakdown(history: &[TestResult], topic: &Topic) -> Option<TopicScore> {
    breakdown(history).into_iter().find(|score| &score.topic == topic)
}

/// Topic cells scoring strictly below `threshold` percent, sorted by topic.
#[must_use]
pub fn weak_topics(history: &[TestResult], threshold: f64) -> Vec<TopicScore> {
    breakdown(history)
        .into_iter()
        .filter(|score| score.percent < threshold)
        .collect()
}

//
// ─── COVERAGE ──────────────────────────────────────────────────────────────────
//

/// How much of one topic cell of the bank the user has been exposed to.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicCoverage {
    pub topic: Topic,
    pub total_questions: usize,
    pub answered_questions: usize,
    pub remaining: usize,
    pub coverage_percent: f64,
}

/// Bank coverage per topic cell, one entry for every topic in the bank.
///
/// `answered_questions` counts distinct question texts from the history that
/// exist in the bank's cell, so `answered + remaining == total` even when the
/// history predates a bank revision. An empty cell reports 0%, never NaN.
#[must_use]
pub fn coverage(history: &[TestResult], bank: &QuestionBank) -> Vec<TopicCoverage> {
    let mut seen: BTreeMap<Topic, HashSet<&str>> = BTreeMap::new();
    for result in history {
        for answer in result.answers() {
            let Some(topic) = answer.topic() else { continue };
            seen.entry(topic).or_default().insert(answer.question.as_str());
        }
    }

    bank.topics()
        .into_iter()
        .map(|topic| {
            let bank_texts: HashSet<&str> = bank
                .questions_in_topic(&topic)
                .iter()
                .map(|q| q.text())
                .collect();
            let total_questions = bank_texts.len();
            let answered_questions = seen
                .get(&topic)
                .map_or(0, |texts| texts.intersection(&bank_texts).count());
            let coverage_percent = if total_questions == 0 {
                0.0
            } else {
                round1(answered_questions as f64 / total_questions as f64 * 100.0)
            };

            TopicCoverage {
                topic,
                total_questions,
                answered_questions,
                remaining: total_questions - answered_questions,
                coverage_percent,
            }
        })
        .collect()
}

//
// ─── PER-QUESTION STATS & PERSONALIZED SUBSETS ────────────────────────────────
//

/// Attempt counts for one question text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionStat {
    pub attempts: u32,
    pub correct: u32,
}

impl QuestionStat {
    /// Share of attempts answered correctly, 0.0 with no attempts.
    #[must_use]
    pub fn mean_correct(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.attempts)
    }
}

/// Attempts and correctness per question text across the whole history.
#[must_use]
pub fn question_stats(history: &[TestResult]) -> BTreeMap<String, QuestionStat> {
    let mut stats: BTreeMap<String, QuestionStat> = BTreeMap::new();
    for result in history {
        for answer in result.answers() {
            let stat = stats
                .entry(answer.question.clone())
                .or_insert(QuestionStat {
                    attempts: 0,
                    correct: 0,
                });
            stat.attempts += 1;
            if answer.is_correct {
                stat.correct += 1;
            }
        }
    }
    stats
}

/// Bank questions whose text never appears in the history, in bank order.
#[must_use]
pub fn unseen_questions(bank: &QuestionBank, history: &[TestResult]) -> Vec<Question> {
    let seen: HashSet<&str> = history
        .iter()
        .flat_map(|result| result.answers())
        .map(|answer| answer.question.as_str())
        .collect();

    bank.questions()
        .iter()
        .filter(|q| !seen.contains(q.text()))
        .cloned()
        .collect()
}

/// Bank questions the user has attempted with mean correctness below
/// [`WEAK_QUESTION_SHARE`], in bank order.
#[must_use]
pub fn weak_questions(bank: &QuestionBank, history: &[TestResult]) -> Vec<Question> {
    let stats = question_stats(history);

    bank.questions()
        .iter()
        .filter(|q| {
            stats
                .get(q.text())
                .is_some_and(|stat| stat.mean_correct() < WEAK_QUESTION_SHARE)
        })
        .cloned()
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
