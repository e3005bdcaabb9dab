use study_core::model::{ScoreBand, StudySettings};

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub correct: u32,
    pub incorrect: u32,
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    /// Running score over the answered slots so far; `None` before the first
    /// answer so a fresh session shows a placeholder instead of 0%.
    #[must_use]
    pub fn score_percent(&self) -> Option<f64> {
        if self.answered == 0 {
            return None;
        }
        Some(f64::from(self.correct) / self.answered as f64 * 100.0)
    }

    /// Display band for the running score, when there is one.
    #[must_use]
    pub fn band(&self, settings: &StudySettings) -> Option<ScoreBand> {
        self.score_percent().map(|percent| settings.band(percent))
    }
}
