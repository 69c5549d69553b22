mod ai_settings;
mod category;
mod problem;
mod progress;

pub use ai_settings::{AiSettings, AiSettingsDraft, AiSettingsError, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use category::{Category, CategoryError};
pub use problem::{AnswerKind, Problem, ProblemDraft, ProblemError};
pub use progress::PlayerProgress;

pub(crate) use problem::is_numeric;
