//! Score deltas per turn outcome.

use serde::{Deserialize, Serialize};

/// Points awarded per level for a correct answer.
pub const POINTS_PER_LEVEL: i64 = 10;

/// What happened to the current problem.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum Outcome {
    Correct,
    Wrong,
    /// Skipped with the configured penalty rate.
    Skipped { penalty_rate: f64 },
    Timeout,
}

/// Signed score change for an outcome at `level`.
///
/// ```
/// # use study_core::game::scoring::{score_delta, Outcome};
/// assert_eq!(score_delta(3, Outcome::Correct), 30);
/// assert_eq!(score_delta(3, Outcome::Skipped { penalty_rate: 0.5 }), -1);
/// assert_eq!(score_delta(3, Outcome::Timeout), 0);
/// ```
#[must_use]
pub fn score_delta(level: u32, outcome: Outcome) -> i64 {
    let level = i64::from(level);
    match outcome {
        Outcome::Correct => POINTS_PER_LEVEL * level,
        Outcome::Skipped { penalty_rate } => -skip_penalty(level, penalty_rate),
        Outcome::Wrong | Outcome::Timeout => 0,
    }
}

/// Apply a delta to a cumulative score, flooring at zero.
#[must_use]
pub fn apply_delta(score: u32, delta: i64) -> u32 {
    let next = i64::from(score).saturating_add(delta).max(0);
    u32::try_from(next).unwrap_or(u32::MAX)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn skip_penalty(level: i64, penalty_rate: f64) -> i64 {
    if !penalty_rate.is_finite() || penalty_rate <= 0.0 {
        return 0;
    }
    (penalty_rate * level as f64).floor() as i64
}
