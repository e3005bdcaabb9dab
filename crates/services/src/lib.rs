#![forbid(unsafe_code)]

pub mod analytics;
pub mod error;
pub mod export;
pub mod sessions;

pub use study_core::Clock;

pub use error::{ExportError, SessionError};
pub use sessions::{
    PoolBuilder, PoolPlan, PooledQuestion, QuizSession, SessionLoopService, SessionProgress,
    SlotStatus,
};
