use std::sync::Arc;

use tracing::info;

use storage::repository::{KeyValueStore, StoreScope};
use study_core::Clock;
use study_core::game::GameSession;
use study_core::model::{Category, PlayerProgress};

use crate::error::ProgressError;

fn progress_key(category: Category) -> String {
    format!("progress:{}", category.slug())
}

/// Per-player game results kept in the scoped store.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    store: Arc<dyn KeyValueStore>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn KeyValueStore>) -> Self {
        Self { clock, store }
    }

    /// Saved progress for one category, or defaults if none.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` on storage failures or unreadable data.
    pub async fn progress(
        &self,
        scope: &StoreScope,
        category: Category,
    ) -> Result<PlayerProgress, ProgressError> {
        match self.store.get(scope, &progress_key(category)).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(PlayerProgress::default()),
        }
    }

    /// Progress for every category the player has finished a game in.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` on storage failures or unreadable data.
    pub async fn all(
        &self,
        scope: &StoreScope,
    ) -> Result<Vec<(Category, PlayerProgress)>, ProgressError> {
        let mut out = Vec::new();
        for category in Category::ALL {
            let progress = self.progress(scope, category).await?;
            if progress.games_played > 0 {
                out.push((category, progress));
            }
        }
        Ok(out)
    }

    /// Fold a finished session into the player's progress.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::GameNotOver` unless the session has ended, or
    /// storage errors.
    pub async fn record_game(
        &self,
        scope: &StoreScope,
        session: &GameSession,
    ) -> Result<PlayerProgress, ProgressError> {
        if !session.is_over() {
            return Err(ProgressError::GameNotOver);
        }

        let category = session.category();
        let mut progress = self.progress(scope, category).await?;
        progress.record(session.score(), session.level(), self.clock.now());

        let value = serde_json::to_value(&progress)?;
        self.store.set(scope, &progress_key(category), &value).await?;
        info!(
            player = %scope,
            %category,
            score = session.score(),
            best = progress.best_score,
            "recorded game"
        );
        Ok(progress)
    }

    /// Forget everything stored for the player.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` on storage failures.
    pub async fn clear(&self, scope: &StoreScope) -> Result<u64, ProgressError> {
        Ok(self.store.clear(scope).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryStore;
    use study_core::game::GameConfig;
    use study_core::model::ProblemDraft;
    use study_core::time::fixed_now;

    fn service() -> ProgressService {
        ProgressService::new(Clock::fixed(fixed_now()), Arc::new(InMemoryStore::new()))
    }

    fn finished_session(answers: &[&str]) -> GameSession {
        let mut session = GameSession::new(GameConfig::for_category(Category::K12Quiz));
        let mut request = session.start();
        for answer in answers {
            session
                .on_problem_ready(&request, ProblemDraft::new("2+2", ["3", "4"], "4"))
                .unwrap();
            match session.submit_answer(answer).unwrap().next {
                Some(next) => request = next,
                None => break,
            }
        }
        session
    }

    #[tokio::test]
    async fn unfinished_game_is_not_recorded() {
        let svc = service();
        let scope = StoreScope::new("ana@example.com").unwrap();
        let mut session = GameSession::new(GameConfig::for_category(Category::K12Quiz));
        session.start();

        let err = svc.record_game(&scope, &session).await.unwrap_err();
        assert!(matches!(err, ProgressError::GameNotOver));
    }

    #[tokio::test]
    async fn records_best_score_and_level() {
        let svc = service();
        let scope = StoreScope::new("ana@example.com").unwrap();

        let good = finished_session(&["4", "4", "3"]);
        assert_eq!(good.score(), 30);
        svc.record_game(&scope, &good).await.unwrap();

        let bad = finished_session(&["3"]);
        let progress = svc.record_game(&scope, &bad).await.unwrap();

        assert_eq!(progress.games_played, 2);
        assert_eq!(progress.best_score, 30);
        assert_eq!(progress.highest_level, 3);
        assert_eq!(progress.last_played_at, Some(fixed_now()));

        let listed = svc.all(&scope).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0, Category::K12Quiz);
    }

    #[tokio::test]
    async fn clear_forgets_the_player() {
        let svc = service();
        let scope = StoreScope::new("ana@example.com").unwrap();
        svc.record_game(&scope, &finished_session(&["3"]))
            .await
            .unwrap();

        assert_eq!(svc.clear(&scope).await.unwrap(), 1);
        assert_eq!(
            svc.progress(&scope, Category::K12Quiz).await.unwrap(),
            PlayerProgress::default()
        );
    }
}
