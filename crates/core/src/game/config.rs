use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Category;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum GameConfigError {
    #[error("max level must be > 0")]
    InvalidMaxLevel,

    #[error("timer duration must be > 0 seconds")]
    InvalidTimer,

    #[error("skip penalty rate must be finite and >= 0, got {0}")]
    InvalidPenaltyRate(f64),
}

//
// ─── POLICY & TIMER ───────────────────────────────────────────────────────────
//

/// What happens when the player answers incorrectly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationPolicy {
    /// One wrong answer ends the session.
    StrictElimination,
    /// The correct answer is revealed and the session moves on.
    RevealAndContinue,
}

/// Countdown attached to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "seconds")]
pub enum TimerMode {
    Untimed,
    /// One budget for the whole session, set on `start`.
    PerSession(u32),
    /// Budget restored every time a new problem is shown.
    PerProblem(u32),
}

impl TimerMode {
    #[must_use]
    pub fn duration(self) -> Option<u32> {
        match self {
            TimerMode::Untimed => None,
            TimerMode::PerSession(secs) | TimerMode::PerProblem(secs) => Some(secs),
        }
    }

    #[must_use]
    pub fn is_timed(self) -> bool {
        !matches!(self, TimerMode::Untimed)
    }
}

//
// ─── CONFIG ───────────────────────────────────────────────────────────────────
//

/// Validated rules for one game instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameConfig {
    category: Category,
    max_level: u32,
    policy: EliminationPolicy,
    timer: TimerMode,
    skip_penalty_rate: Option<f64>,
}

impl GameConfig {
    /// Creates a game configuration.
    ///
    /// `skip_penalty_rate` of `None` disables skipping.
    ///
    /// # Errors
    ///
    /// Returns `GameConfigError` if `max_level` is zero, a timer has zero
    /// seconds, or the penalty rate is negative or not finite.
    pub fn new(
        category: Category,
        max_level: u32,
        policy: EliminationPolicy,
        timer: TimerMode,
        skip_penalty_rate: Option<f64>,
    ) -> Result<Self, GameConfigError> {
        if max_level == 0 {
            return Err(GameConfigError::InvalidMaxLevel);
        }
        if timer.duration() == Some(0) {
            return Err(GameConfigError::InvalidTimer);
        }
        if let Some(rate) = skip_penalty_rate {
            if !rate.is_finite() || rate < 0.0 {
                return Err(GameConfigError::InvalidPenaltyRate(rate));
            }
        }

        Ok(Self {
            category,
            max_level,
            policy,
            timer,
            skip_penalty_rate,
        })
    }

    /// Default rules for a category.
    ///
    /// - timed arithmetic games (dice, BODMAS, word problems) use strict elimination
    /// - riddles reveal the answer and continue, untimed, without skip
    /// - the K-12 quiz is strict but untimed, one level per grade
    #[must_use]
    pub fn for_category(category: Category) -> Self {
        use EliminationPolicy::{RevealAndContinue, StrictElimination};

        let (max_level, policy, timer, skip_penalty_rate) = match category {
            Category::DiceProbability => (10, StrictElimination, TimerMode::PerProblem(30), Some(0.5)),
            Category::LogicRiddle | Category::HindiRiddle => {
                (10, RevealAndContinue, TimerMode::Untimed, None)
            }
            Category::K12Quiz => (12, StrictElimination, TimerMode::Untimed, Some(1.0)),
            Category::Bodmas => (10, StrictElimination, TimerMode::PerSession(60), Some(0.5)),
            Category::WordProblem => (10, StrictElimination, TimerMode::PerProblem(45), Some(1.0)),
        };

        Self {
            category,
            max_level,
            policy,
            timer,
            skip_penalty_rate,
        }
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    #[must_use]
    pub fn policy(&self) -> EliminationPolicy {
        self.policy
    }

    #[must_use]
    pub fn timer(&self) -> TimerMode {
        self.timer
    }

    #[must_use]
    pub fn skip_penalty_rate(&self) -> Option<f64> {
        self.skip_penalty_rate
    }

    #[must_use]
    pub fn supports_skip(&self) -> bool {
        self.skip_penalty_rate.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_configs() {
        for category in Category::ALL {
            let config = GameConfig::for_category(category);
            let rebuilt = GameConfig::new(
                category,
                config.max_level(),
                config.policy(),
                config.timer(),
                config.skip_penalty_rate(),
            )
            .unwrap();
            assert_eq!(rebuilt, config);
        }
    }

    #[test]
    fn riddles_reveal_and_arithmetic_is_strict() {
        assert_eq!(
            GameConfig::for_category(Category::LogicRiddle).policy(),
            EliminationPolicy::RevealAndContinue
        );
        assert_eq!(
            GameConfig::for_category(Category::Bodmas).policy(),
            EliminationPolicy::StrictElimination
        );
        assert!(GameConfig::for_category(Category::Bodmas).timer().is_timed());
        assert!(!GameConfig::for_category(Category::HindiRiddle).supports_skip());
    }

    #[test]
    fn rejects_invalid_values() {
        let strict = EliminationPolicy::StrictElimination;
        assert_eq!(
            GameConfig::new(Category::Bodmas, 0, strict, TimerMode::Untimed, None).unwrap_err(),
            GameConfigError::InvalidMaxLevel
        );
        assert_eq!(
            GameConfig::new(Category::Bodmas, 5, strict, TimerMode::PerProblem(0), None)
                .unwrap_err(),
            GameConfigError::InvalidTimer
        );
        assert!(matches!(
            GameConfig::new(Category::Bodmas, 5, strict, TimerMode::Untimed, Some(-1.0)),
            Err(GameConfigError::InvalidPenaltyRate(_))
        ));
        assert!(matches!(
            GameConfig::new(Category::Bodmas, 5, strict, TimerMode::Untimed, Some(f64::NAN)),
            Err(GameConfigError::InvalidPenaltyRate(_))
        ));
    }
}
