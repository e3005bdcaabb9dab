mod attempt;
mod bank;
mod identity;
mod question;
mod result;
mod settings;

pub use attempt::AnsweredQuestion;
pub use bank::{BankError, QuestionBank};
pub use identity::{IdentityError, UserIdentity};
pub use question::{Question, QuestionError, QuestionId, Topic};
pub use result::{ResultError, TestResult};
pub use settings::{ScoreBand, SettingsError, StudySettings};
