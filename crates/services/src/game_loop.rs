use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use study_core::game::{
    AnswerFeedback, GameError, GameSession, GameSnapshot, ProblemApplied, ProblemRequest,
    ProblemSource,
};
use study_core::model::ProblemDraft;

use crate::error::ProviderError;
use crate::provider::ProblemProvider;

/// Longest a provider may take before the fallback problem is served.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

const NOTICE_PROVIDER_DOWN: &str =
    "Couldn't reach the problem generator, so here is a practice problem instead.";
const NOTICE_BAD_PROBLEM: &str =
    "The generated problem didn't make sense, so here is a practice problem instead.";

/// Outcome of one player action, ready for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub snapshot: GameSnapshot,
    pub feedback: Option<AnswerFeedback>,
    /// Transient message, e.g. after a fallback substitution.
    pub notice: Option<String>,
}

/// Drives a `GameSession` against a problem provider.
///
/// Each action runs the state machine transition and, when it issued a
/// `ProblemRequest`, awaits the provider and feeds the result back. A call
/// that outlives the fetch timeout counts as a provider failure, so the
/// session never stays in `Loading`.
#[derive(Clone)]
pub struct GameLoopService {
    provider: Arc<dyn ProblemProvider>,
    fetch_timeout: Duration,
}

impl GameLoopService {
    #[must_use]
    pub fn new(provider: Arc<dyn ProblemProvider>) -> Self {
        Self {
            provider,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Start (or replay) the session and load its first problem.
    ///
    /// # Errors
    ///
    /// Returns `GameError` only if the session rejects its own fresh request.
    pub async fn start(&self, session: &mut GameSession) -> Result<TurnReport, GameError> {
        let request = session.start();
        info!(
            category = %session.category(),
            policy = ?session.policy(),
            "game started"
        );
        let notice = self.load(session, request).await?;
        Ok(report(session, None, notice))
    }

    /// Submit an answer; loads the next problem when the session moves on.
    ///
    /// # Errors
    ///
    /// Returns `GameError` for invalid input or an event in the wrong phase.
    pub async fn submit(
        &self,
        session: &mut GameSession,
        answer: &str,
    ) -> Result<TurnReport, GameError> {
        let result = session.submit_answer(answer)?;
        debug!(
            correct = result.feedback.correct,
            score = session.score(),
            level = session.level(),
            "answer judged"
        );
        let notice = match result.next {
            Some(request) => self.load(session, request).await?,
            None => None,
        };
        if session.is_over() {
            info!(score = session.score(), cause = ?session.end_cause(), "game over");
        }
        Ok(report(session, Some(result.feedback), notice))
    }

    /// Skip the current problem.
    ///
    /// # Errors
    ///
    /// Returns `GameError` if skipping is unsupported or not allowed now.
    pub async fn skip(&self, session: &mut GameSession) -> Result<TurnReport, GameError> {
        let request = session.skip()?;
        let notice = self.load(session, request).await?;
        Ok(report(session, None, notice))
    }

    /// Continue after a revealed answer.
    ///
    /// # Errors
    ///
    /// Returns `GameError` outside the `Answered` phase.
    pub async fn advance(&self, session: &mut GameSession) -> Result<TurnReport, GameError> {
        let notice = match session.advance()? {
            Some(request) => self.load(session, request).await?,
            None => {
                info!(score = session.score(), "game over");
                None
            }
        };
        Ok(report(session, None, notice))
    }

    /// Call the provider for a request without touching any session.
    ///
    /// Pair with [`GameLoopService::apply`] when the session must stay
    /// available while the call is in flight.
    ///
    /// # Errors
    ///
    /// Returns whatever the provider failed with, or
    /// `ProviderError::Unavailable` once the fetch timeout elapses.
    pub async fn fetch(&self, request: &ProblemRequest) -> Result<ProblemDraft, ProviderError> {
        let call = self
            .provider
            .fetch_problem(request.level(), request.category());
        match tokio::time::timeout(self.fetch_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Unavailable(format!(
                "no problem within {}s",
                self.fetch_timeout.as_secs_f32()
            ))),
        }
    }

    /// Hand a provider result to the session it was requested for.
    ///
    /// Returns a notice when a fallback problem was substituted.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidTransition` if a current request arrives
    /// outside `Loading`.
    pub fn apply(
        &self,
        session: &mut GameSession,
        request: &ProblemRequest,
        fetched: Result<ProblemDraft, ProviderError>,
    ) -> Result<Option<String>, GameError> {
        let applied = match fetched {
            Ok(draft) => session.on_problem_ready(request, draft)?,
            Err(err) => {
                warn!(
                    error = %err,
                    level = request.level(),
                    category = %request.category(),
                    "problem provider failed; using fallback"
                );
                session.on_problem_failed(request, &err)?
            }
        };

        Ok(match applied {
            ProblemApplied::Stale => {
                debug!(generation = request.generation(), "dropped stale problem");
                None
            }
            ProblemApplied::Ready(ProblemSource::Provider) => None,
            ProblemApplied::Ready(ProblemSource::FallbackAfterFailure { .. }) => {
                Some(NOTICE_PROVIDER_DOWN.to_string())
            }
            ProblemApplied::Ready(ProblemSource::FallbackAfterInvalidShape(err)) => {
                warn!(error = %err, "provider returned an invalid problem; using fallback");
                Some(NOTICE_BAD_PROBLEM.to_string())
            }
        })
    }

    async fn load(
        &self,
        session: &mut GameSession,
        request: ProblemRequest,
    ) -> Result<Option<String>, GameError> {
        let fetched = self.fetch(&request).await;
        self.apply(session, &request, fetched)
    }
}

fn report(
    session: &GameSession,
    feedback: Option<AnswerFeedback>,
    notice: Option<String>,
) -> TurnReport {
    TurnReport {
        snapshot: session.snapshot(),
        feedback,
        notice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ScriptedProblemProvider;
    use study_core::game::{GameConfig, GamePhase};
    use study_core::model::Category;

    fn stalled_loop(timeout: Duration) -> GameLoopService {
        let provider = ScriptedProblemProvider::new().then_stall();
        GameLoopService::new(Arc::new(provider)).with_fetch_timeout(timeout)
    }

    #[tokio::test]
    async fn stalled_provider_times_out_into_fallback() {
        let game_loop = stalled_loop(Duration::from_millis(50));
        let mut session = GameSession::new(GameConfig::for_category(Category::Bodmas));

        let report = game_loop.start(&mut session).await.unwrap();

        assert_eq!(report.snapshot.phase, GamePhase::AwaitingAnswer);
        assert!(report.snapshot.used_fallback);
        assert_eq!(report.notice.as_deref(), Some(NOTICE_PROVIDER_DOWN));
        assert!(matches!(
            session.problem_source(),
            Some(ProblemSource::FallbackAfterFailure { .. })
        ));
    }

    #[tokio::test]
    async fn fetch_reports_the_timeout_as_unavailable() {
        let game_loop = stalled_loop(Duration::from_millis(20));
        let mut session = GameSession::new(GameConfig::for_category(Category::K12Quiz));
        let request = session.start();

        let err = game_loop.fetch(&request).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }
}
