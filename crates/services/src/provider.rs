use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use rand::seq::SliceRandom;

use study_core::model::{Category, ProblemDraft};

use crate::ai::{StructuredClient, problem_prompt};
use crate::error::ProviderError;

/// Source of problems for a game.
///
/// Implementations may fail; callers treat failures and malformed drafts the
/// same way (fallback substitution).
#[async_trait]
pub trait ProblemProvider: Send + Sync {
    /// Produce a problem for `category` at `level`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when no problem can be produced.
    async fn fetch_problem(
        &self,
        level: u32,
        category: Category,
    ) -> Result<ProblemDraft, ProviderError>;
}

//
// ─── LLM ──────────────────────────────────────────────────────────────────────
//

/// Problems generated by the hosted language model.
#[derive(Clone)]
pub struct LlmProblemProvider {
    client: StructuredClient,
    shuffle_options: bool,
}

impl LlmProblemProvider {
    #[must_use]
    pub fn new(client: StructuredClient) -> Self {
        Self {
            client,
            shuffle_options: true,
        }
    }

    /// Keep options in the order the model returned them.
    #[must_use]
    pub fn without_shuffle(mut self) -> Self {
        self.shuffle_options = false;
        self
    }
}

#[async_trait]
impl ProblemProvider for LlmProblemProvider {
    async fn fetch_problem(
        &self,
        level: u32,
        category: Category,
    ) -> Result<ProblemDraft, ProviderError> {
        let prompt = problem_prompt(category, level);
        let mut draft: ProblemDraft = self.client.generate(&prompt).await?;
        // Models tend to put the right answer first.
        if self.shuffle_options {
            draft.options.shuffle(&mut rand::rng());
        }
        Ok(draft)
    }
}

//
// ─── OFFLINE ──────────────────────────────────────────────────────────────────
//

/// Provider for play without a model; every game runs on fallback problems.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider;

#[async_trait]
impl ProblemProvider for OfflineProvider {
    async fn fetch_problem(
        &self,
        _level: u32,
        _category: Category,
    ) -> Result<ProblemDraft, ProviderError> {
        Err(ProviderError::Disabled)
    }
}

//
// ─── SCRIPTED ─────────────────────────────────────────────────────────────────
//

enum Scripted {
    Problem(ProblemDraft),
    Failure(String),
    /// Never answers.
    Stall,
}

/// Replays canned results in order. Used by tests and demos.
#[derive(Default)]
pub struct ScriptedProblemProvider {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<(u32, Category)>>,
}

impl ScriptedProblemProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then_problem(self, draft: ProblemDraft) -> Self {
        self.push(Scripted::Problem(draft));
        self
    }

    #[must_use]
    pub fn then_failure(self, reason: impl Into<String>) -> Self {
        self.push(Scripted::Failure(reason.into()));
        self
    }

    /// The next call hangs until the caller gives up on it.
    #[must_use]
    pub fn then_stall(self) -> Self {
        self.push(Scripted::Stall);
        self
    }

    fn push(&self, entry: Scripted) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(entry);
        }
    }

    /// `(level, category)` of every call so far.
    #[must_use]
    pub fn requests(&self) -> Vec<(u32, Category)> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProblemProvider for ScriptedProblemProvider {
    async fn fetch_problem(
        &self,
        level: u32,
        category: Category,
    ) -> Result<ProblemDraft, ProviderError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((level, category));
        }
        let next = self
            .script
            .lock()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?
            .pop_front();
        match next {
            Some(Scripted::Problem(draft)) => Ok(draft),
            Some(Scripted::Failure(reason)) => Err(ProviderError::Unavailable(reason)),
            Some(Scripted::Stall) => std::future::pending().await,
            None => Err(ProviderError::Unavailable("script exhausted".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_provider_replays_in_order() {
        let provider = ScriptedProblemProvider::new()
            .then_problem(ProblemDraft::open("1+1", "2"))
            .then_failure("boom");

        let first = provider.fetch_problem(1, Category::Bodmas).await.unwrap();
        assert_eq!(first.statement, "1+1");

        let second = provider.fetch_problem(2, Category::Bodmas).await.unwrap_err();
        assert!(matches!(second, ProviderError::Unavailable(reason) if reason == "boom"));

        assert!(provider.fetch_problem(3, Category::Bodmas).await.is_err());
        assert_eq!(
            provider.requests(),
            vec![
                (1, Category::Bodmas),
                (2, Category::Bodmas),
                (3, Category::Bodmas)
            ]
        );
    }

    #[tokio::test]
    async fn offline_provider_is_disabled() {
        let err = OfflineProvider
            .fetch_problem(1, Category::LogicRiddle)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Disabled));
    }
}
