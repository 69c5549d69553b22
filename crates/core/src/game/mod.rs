pub mod config;
pub mod scoring;
mod session;

pub use config::{EliminationPolicy, GameConfig, GameConfigError, TimerMode};
pub use scoring::{Outcome, apply_delta, score_delta};
pub use session::{
    AnswerFeedback, AnswerResult, EndCause, GameError, GameEvent, GamePhase, GameSession,
    GameSnapshot, InputError, ProblemApplied, ProblemRequest, ProblemSource, ProblemView,
    TickOutcome,
};
