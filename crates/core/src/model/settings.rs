use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("session cap must be > 0")]
    InvalidSessionCap,

    #[error("score marks must be within 0..=100")]
    InvalidMark,

    #[error("pass mark must be <= honours mark")]
    MarksOutOfOrder,

    #[error("weak-topic threshold must be within 0..=100")]
    InvalidThreshold,
}

/// Display band for a percentage score.
///
/// The marks are presentation cutoffs only; no behaviour is gated on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBand {
    Honours,
    Pass,
    Fail,
}

/// Tunables for pool building and score display.
#[derive(Debug, Clone, PartialEq)]
pub struct StudySettings {
    session_cap: u32,
    pass_mark: u32,
    honours_mark: u32,
    weak_topic_threshold: f64,
}

impl StudySettings {
    /// Creates validated settings.
    ///
    /// # Errors
    ///
    /// Returns a `SettingsError` when the cap is zero, a mark falls outside
    /// 0..=100, or the pass mark exceeds the honours mark.
    pub fn new(
        session_cap: u32,
        pass_mark: u32,
        honours_mark: u32,
        weak_topic_threshold: f64,
    ) -> Result<Self, SettingsError> {
        if session_cap == 0 {
            return Err(SettingsError::InvalidSessionCap);
        }
        if pass_mark > 100 || honours_mark > 100 {
            return Err(SettingsError::InvalidMark);
        }
        if pass_mark > honours_mark {
            return Err(SettingsError::MarksOutOfOrder);
        }
        if !weak_topic_threshold.is_finite()
            || !(0.0..=100.0).contains(&weak_topic_threshold)
        {
            return Err(SettingsError::InvalidThreshold);
        }

        Ok(Self {
            session_cap,
            pass_mark,
            honours_mark,
            weak_topic_threshold,
        })
    }

    #[must_use]
    pub fn session_cap(&self) -> u32 {
        self.session_cap
    }

    #[must_use]
    pub fn pass_mark(&self) -> u32 {
        self.pass_mark
    }

    #[must_use]
    pub fn honours_mark(&self) -> u32 {
        self.honours_mark
    }

    /// Topics scoring strictly below this percentage count as weak.
    #[must_use]
    pub fn weak_topic_threshold(&self) -> f64 {
        self.weak_topic_threshold
    }

    /// Classifies a percentage score against the pass/honours marks.
    #[must_use]
    pub fn band(&self, percent: f64) -> ScoreBand {
        if percent >= f64::from(self.honours_mark) {
            ScoreBand::Honours
        } else if percent >= f64::from(self.pass_mark) {
            ScoreBand::Pass
        } else {
            ScoreBand::Fail
        }
    }
}

impl Default for StudySettings {
    /// 100-question sessions, 70% pass, 80% honours, weak topics below 70%.
    fn default() -> Self {
        Self {
            session_cap: 100,
            pass_mark: 70,
            honours_mark: 80,
            weak_topic_threshold: 70.0,
        }
    }
}
