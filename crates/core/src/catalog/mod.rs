mod difficulty;
mod fallback;

pub use difficulty::{CategoryProfile, DifficultyBand, ProblemShape, difficulty_for, profile};
pub use fallback::fallback_problem;
