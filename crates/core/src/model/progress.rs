use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Saved results of one player in one category.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerProgress {
    pub games_played: u32,
    pub best_score: u32,
    pub highest_level: u32,
    pub last_played_at: Option<DateTime<Utc>>,
}

impl PlayerProgress {
    /// Fold a finished game into the totals.
    pub fn record(&mut self, score: u32, level: u32, played_at: DateTime<Utc>) {
        self.games_played = self.games_played.saturating_add(1);
        self.best_score = self.best_score.max(score);
        self.highest_level = self.highest_level.max(level);
        self.last_played_at = Some(played_at);
    }
}
