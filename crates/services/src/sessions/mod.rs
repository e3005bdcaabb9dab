mod pool;
mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use pool::{PoolBuilder, PoolPlan};
pub use progress::SessionProgress;
pub use service::{PooledQuestion, QuizSession, SlotStatus};
pub use workflow::SessionLoopService;
