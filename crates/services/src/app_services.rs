use std::sync::Arc;

use tracing::info;

use storage::repository::Storage;
use study_core::model::AiSettings;

use crate::Clock;
use crate::ai::StructuredClient;
use crate::error::AppServicesError;
use crate::game_loop::GameLoopService;
use crate::progress_service::ProgressService;
use crate::provider::{LlmProblemProvider, OfflineProvider, ProblemProvider};

/// Assembles the services the front end talks to.
#[derive(Clone)]
pub struct AppServices {
    game_loop: Arc<GameLoopService>,
    progress: Arc<ProgressService>,
    online: bool,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// With `ai` unset every game runs on fallback problems.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        ai: Option<AiSettings>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, ai))
    }

    /// Build services over an already opened storage.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, ai: Option<AiSettings>) -> Self {
        let online = ai.is_some();
        let provider: Arc<dyn ProblemProvider> = match ai {
            Some(settings) => {
                info!(model = settings.api_model(), "problem generation enabled");
                Arc::new(LlmProblemProvider::new(StructuredClient::new(Some(
                    settings,
                ))))
            }
            None => {
                info!("no model configured; playing offline");
                Arc::new(OfflineProvider)
            }
        };

        Self {
            game_loop: Arc::new(GameLoopService::new(provider)),
            progress: Arc::new(ProgressService::new(clock, Arc::clone(&storage.store))),
            online,
        }
    }

    #[must_use]
    pub fn game_loop(&self) -> Arc<GameLoopService> {
        Arc::clone(&self.game_loop)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    /// Whether problems come from the model rather than the fallback tables.
    #[must_use]
    pub fn online(&self) -> bool {
        self.online
    }
}
