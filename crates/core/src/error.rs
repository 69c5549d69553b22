use thiserror::Error;

use crate::game::{GameConfigError, GameError};
use crate::model::{AiSettingsError, CategoryError, ProblemError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Problem(#[from] ProblemError),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    GameConfig(#[from] GameConfigError),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    AiSettings(#[from] AiSettingsError),
}
