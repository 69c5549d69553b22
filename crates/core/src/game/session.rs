use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::catalog::fallback_problem;
use crate::game::config::{EliminationPolicy, GameConfig, TimerMode};
use crate::game::scoring::{Outcome, apply_delta, score_delta};
use crate::model::{AnswerKind, Category, Problem, ProblemDraft, ProblemError, is_numeric};

//
// ─── PHASES & EVENTS ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Idle,
    Loading,
    AwaitingAnswer,
    Answered,
    GameOver,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GamePhase::Idle => "idle",
            GamePhase::Loading => "loading",
            GamePhase::AwaitingAnswer => "awaiting answer",
            GamePhase::Answered => "answered",
            GamePhase::GameOver => "game over",
        };
        f.write_str(name)
    }
}

/// Why a session reached `GameOver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndCause {
    /// Every level up to `max_level` was played.
    Completed,
    WrongAnswer,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    ProblemReady,
    ProblemFailed,
    Submit,
    Skip,
    Advance,
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameEvent::ProblemReady => "problem ready",
            GameEvent::ProblemFailed => "problem failed",
            GameEvent::Submit => "submit",
            GameEvent::Skip => "skip",
            GameEvent::Advance => "advance",
        };
        f.write_str(name)
    }
}

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Player input that cannot be judged. The session is left unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InputError {
    #[error("please enter an answer")]
    Empty,

    #[error("{0:?} is not a number")]
    NotANumber(String),

    #[error("{0:?} is not one of the options")]
    NotAnOption(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GameError {
    #[error("cannot handle {event} while {phase}")]
    InvalidTransition { event: GameEvent, phase: GamePhase },

    #[error("this game does not allow skipping")]
    SkipUnsupported,

    #[error(transparent)]
    InvalidInput(#[from] InputError),
}

//
// ─── REQUESTS & RESULTS ───────────────────────────────────────────────────────
//

/// Ticket for one provider call.
///
/// Responses must be handed back with the ticket they were issued for; a ticket
/// from an earlier request, `start` or `reset` is stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemRequest {
    category: Category,
    level: u32,
    generation: u64,
}

impl ProblemRequest {
    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Where the problem on screen came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemSource {
    Provider,
    /// Provider call failed; `reason` is its error message.
    FallbackAfterFailure { reason: String },
    /// Provider answered with a shape that broke the problem invariant.
    FallbackAfterInvalidShape(ProblemError),
}

impl ProblemSource {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        !matches!(self, ProblemSource::Provider)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemApplied {
    /// The session now awaits an answer.
    Ready(ProblemSource),
    /// The response belonged to an older request and was dropped.
    Stale,
}

/// Judgement of a submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerFeedback {
    pub selected: String,
    pub correct_answer: String,
    pub correct: bool,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerResult {
    pub feedback: AnswerFeedback,
    /// Set when the session moved straight to `Loading`.
    pub next: Option<ProblemRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Untimed game, or not waiting for an answer.
    Ignored,
    Running { remaining: u32 },
    TimedOut,
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

/// Turn-based quiz session.
///
/// All transitions are synchronous and leave the session consistent. Provider
/// calls happen outside: `start`, `skip`, `advance` and a correct strict answer
/// hand out a `ProblemRequest`, and the caller later reports the outcome via
/// `on_problem_ready` or `on_problem_failed`.
///
/// While `AwaitingAnswer`, `current_problem` is always set and satisfies the
/// problem invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    config: GameConfig,
    phase: GamePhase,
    level: u32,
    score: u32,
    time_remaining: Option<u32>,
    current_problem: Option<Problem>,
    problem_source: Option<ProblemSource>,
    last_answer: Option<AnswerFeedback>,
    end_cause: Option<EndCause>,
    problems_served: u32,
    correct_answers: u32,
    generation: u64,
}

impl GameSession {
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        Self::idle(config, 0)
    }

    fn idle(config: GameConfig, generation: u64) -> Self {
        Self {
            config,
            phase: GamePhase::Idle,
            level: 1,
            score: 0,
            time_remaining: None,
            current_problem: None,
            problem_source: None,
            last_answer: None,
            end_cause: None,
            problems_served: 0,
            correct_answers: 0,
            generation,
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.config.category()
    }

    /// Elimination policy active for this session.
    #[must_use]
    pub fn policy(&self) -> EliminationPolicy {
        self.config.policy()
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn time_remaining(&self) -> Option<u32> {
        self.time_remaining
    }

    #[must_use]
    pub fn current_problem(&self) -> Option<&Problem> {
        self.current_problem.as_ref()
    }

    #[must_use]
    pub fn problem_source(&self) -> Option<&ProblemSource> {
        self.problem_source.as_ref()
    }

    #[must_use]
    pub fn last_answer(&self) -> Option<&AnswerFeedback> {
        self.last_answer.as_ref()
    }

    #[must_use]
    pub fn end_cause(&self) -> Option<EndCause> {
        self.end_cause
    }

    #[must_use]
    pub fn problems_served(&self) -> u32 {
        self.problems_served
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    // ─── Transitions ────────────────────────────────────────────────────────

    /// Begin (or replay) a session at level 1 with a zero score.
    ///
    /// Any request issued earlier becomes stale.
    pub fn start(&mut self) -> ProblemRequest {
        let generation = self.generation;
        *self = Self::idle(self.config.clone(), generation);
        self.time_remaining = self.config.timer().duration();
        self.enter_loading()
    }

    /// Store a provider result and wait for the answer.
    ///
    /// A draft that breaks the problem invariant is replaced by the
    /// category's fallback problem.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidTransition` if a current ticket arrives
    /// while the session is not loading.
    pub fn on_problem_ready(
        &mut self,
        request: &ProblemRequest,
        draft: ProblemDraft,
    ) -> Result<ProblemApplied, GameError> {
        if !self.accepts(request, GameEvent::ProblemReady)? {
            return Ok(ProblemApplied::Stale);
        }

        let (problem, source) = match draft.validate(self.level, self.config.max_level()) {
            Ok(problem) => (problem, ProblemSource::Provider),
            Err(err) => (
                fallback_problem(self.category(), self.level),
                ProblemSource::FallbackAfterInvalidShape(err),
            ),
        };
        Ok(ProblemApplied::Ready(self.present(problem, source)))
    }

    /// Recover from a failed provider call with the fallback problem.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidTransition` if a current ticket arrives
    /// while the session is not loading.
    pub fn on_problem_failed(
        &mut self,
        request: &ProblemRequest,
        reason: impl fmt::Display,
    ) -> Result<ProblemApplied, GameError> {
        if !self.accepts(request, GameEvent::ProblemFailed)? {
            return Ok(ProblemApplied::Stale);
        }

        let problem = fallback_problem(self.category(), self.level);
        let source = ProblemSource::FallbackAfterFailure {
            reason: reason.to_string(),
        };
        Ok(ProblemApplied::Ready(self.present(problem, source)))
    }

    /// Judge an answer by exact comparison with the correct answer.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidInput` for blank, non-numeric (when a number
    /// is expected) or unlisted selections, and `GameError::InvalidTransition`
    /// outside `AwaitingAnswer`. Neither changes the session.
    pub fn submit_answer(&mut self, selected: &str) -> Result<AnswerResult, GameError> {
        let problem = self.awaiting(GameEvent::Submit)?;
        check_input(problem, selected)?;

        let selected = selected.trim().to_string();
        let correct = problem.is_correct(&selected);
        let outcome = if correct {
            Outcome::Correct
        } else {
            Outcome::Wrong
        };
        let delta = score_delta(self.level, outcome);
        let feedback = AnswerFeedback {
            selected,
            correct_answer: problem.correct_answer().to_string(),
            correct,
            delta,
        };

        self.score = apply_delta(self.score, delta);
        if correct {
            self.correct_answers = self.correct_answers.saturating_add(1);
        }
        self.last_answer = Some(feedback.clone());

        let next = match (self.policy(), correct) {
            (EliminationPolicy::StrictElimination, true) => self.next_level(),
            (EliminationPolicy::StrictElimination, false) => {
                self.finish(EndCause::WrongAnswer);
                None
            }
            (EliminationPolicy::RevealAndContinue, _) => {
                self.phase = GamePhase::Answered;
                None
            }
        };

        Ok(AnswerResult { feedback, next })
    }

    /// Move past a revealed answer.
    ///
    /// Returns the next request, or `None` when the last level was played.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidTransition` outside `Answered`.
    pub fn advance(&mut self) -> Result<Option<ProblemRequest>, GameError> {
        if self.phase != GamePhase::Answered {
            return Err(GameError::InvalidTransition {
                event: GameEvent::Advance,
                phase: self.phase,
            });
        }
        Ok(self.next_level())
    }

    /// Trade the current problem for another one at the same level.
    ///
    /// Costs `floor(rate * level)` points; the score never drops below zero.
    ///
    /// # Errors
    ///
    /// Returns `GameError::SkipUnsupported` if the config has no penalty rate,
    /// or `GameError::InvalidTransition` outside `AwaitingAnswer`.
    pub fn skip(&mut self) -> Result<ProblemRequest, GameError> {
        self.awaiting(GameEvent::Skip)?;
        let penalty_rate = self
            .config
            .skip_penalty_rate()
            .ok_or(GameError::SkipUnsupported)?;

        let delta = score_delta(self.level, Outcome::Skipped { penalty_rate });
        self.score = apply_delta(self.score, delta);
        self.last_answer = None;
        Ok(self.enter_loading())
    }

    /// Advance the countdown by one second.
    ///
    /// The clock only runs while an answer is awaited.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != GamePhase::AwaitingAnswer {
            return TickOutcome::Ignored;
        }
        let Some(remaining) = self.time_remaining else {
            return TickOutcome::Ignored;
        };

        let remaining = remaining.saturating_sub(1);
        self.time_remaining = Some(remaining);
        if remaining == 0 {
            // Timeouts carry no score delta.
            self.finish(EndCause::Timeout);
            TickOutcome::TimedOut
        } else {
            TickOutcome::Running { remaining }
        }
    }

    /// Discard the session and return to `Idle`.
    ///
    /// Outstanding requests become stale. Calling it on an idle session is a
    /// no-op.
    pub fn reset(&mut self) {
        if self.phase == GamePhase::Idle {
            return;
        }
        let generation = self.generation.wrapping_add(1);
        *self = Self::idle(self.config.clone(), generation);
    }

    /// Read-only view for presentation.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            category: self.category(),
            policy: self.policy(),
            phase: self.phase,
            level: self.level,
            max_level: self.config.max_level(),
            score: self.score,
            time_remaining: self.time_remaining,
            problem: self.current_problem.as_ref().map(ProblemView::from),
            used_fallback: self
                .problem_source
                .as_ref()
                .is_some_and(ProblemSource::is_fallback),
            last_answer: self.last_answer.clone(),
            end_cause: self.end_cause,
            can_skip: self.phase == GamePhase::AwaitingAnswer && self.config.supports_skip(),
        }
    }

    // ─── Internals ──────────────────────────────────────────────────────────

    fn enter_loading(&mut self) -> ProblemRequest {
        self.generation = self.generation.wrapping_add(1);
        self.phase = GamePhase::Loading;
        self.current_problem = None;
        self.problem_source = None;
        ProblemRequest {
            category: self.category(),
            level: self.level,
            generation: self.generation,
        }
    }

    /// `Ok(false)` for stale tickets.
    fn accepts(&self, request: &ProblemRequest, event: GameEvent) -> Result<bool, GameError> {
        if request.generation != self.generation {
            return Ok(false);
        }
        if self.phase != GamePhase::Loading {
            return Err(GameError::InvalidTransition {
                event,
                phase: self.phase,
            });
        }
        Ok(true)
    }

    fn awaiting(&self, event: GameEvent) -> Result<&Problem, GameError> {
        match (&self.phase, &self.current_problem) {
            (GamePhase::AwaitingAnswer, Some(problem)) => Ok(problem),
            _ => Err(GameError::InvalidTransition {
                event,
                phase: self.phase,
            }),
        }
    }

    fn present(&mut self, problem: Problem, source: ProblemSource) -> ProblemSource {
        if let TimerMode::PerProblem(secs) = self.config.timer() {
            self.time_remaining = Some(secs);
        }
        self.current_problem = Some(problem);
        self.problem_source = Some(source.clone());
        self.problems_served = self.problems_served.saturating_add(1);
        self.phase = GamePhase::AwaitingAnswer;
        source
    }

    fn next_level(&mut self) -> Option<ProblemRequest> {
        if self.level < self.config.max_level() {
            self.level += 1;
            Some(self.enter_loading())
        } else {
            self.finish(EndCause::Completed);
            None
        }
    }

    fn finish(&mut self, cause: EndCause) {
        self.phase = GamePhase::GameOver;
        self.end_cause = Some(cause);
    }
}

fn check_input(problem: &Problem, selected: &str) -> Result<(), InputError> {
    let trimmed = selected.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    match problem.answer_kind() {
        AnswerKind::Choice if !problem.options().iter().any(|opt| opt == trimmed) => {
            Err(InputError::NotAnOption(trimmed.to_string()))
        }
        AnswerKind::Numeric if !is_numeric(trimmed) => {
            Err(InputError::NotANumber(trimmed.to_string()))
        }
        _ => Ok(()),
    }
}

//
// ─── SNAPSHOT ─────────────────────────────────────────────────────────────────
//

/// Problem as shown to the player, without the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProblemView {
    pub statement: String,
    pub options: Vec<String>,
    pub answer_kind: AnswerKind,
    pub level: u32,
}

impl From<&Problem> for ProblemView {
    fn from(problem: &Problem) -> Self {
        Self {
            statement: problem.statement().to_string(),
            options: problem.options().to_vec(),
            answer_kind: problem.answer_kind(),
            level: problem.level(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    pub category: Category,
    pub policy: EliminationPolicy,
    pub phase: GamePhase,
    pub level: u32,
    pub max_level: u32,
    pub score: u32,
    pub time_remaining: Option<u32>,
    pub problem: Option<ProblemView>,
    pub used_fallback: bool,
    pub last_answer: Option<AnswerFeedback>,
    pub end_cause: Option<EndCause>,
    pub can_skip: bool,
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
