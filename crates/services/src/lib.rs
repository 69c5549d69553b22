#![forbid(unsafe_code)]

pub mod ai;
pub mod app_services;
pub mod error;
pub mod game_loop;
pub mod progress_service;
pub mod provider;

pub use study_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ProgressError, ProviderError};
pub use game_loop::{GameLoopService, TurnReport};
pub use progress_service::ProgressService;
pub use provider::{
    LlmProblemProvider, OfflineProvider, ProblemProvider, ScriptedProblemProvider,
};
