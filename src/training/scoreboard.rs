//! Trainer scoreboard.
//!
//! Entries are kept in first-award order. Ranking uses a stable sort, so
//! trainers with equal scores rank in the order they first scored.

use serde::{Deserialize, Serialize};

use super::{TrainingState, TRAINER_SCOREBOARD};
use crate::error::TrainingError;
use crate::store;

/// Default number of trainers reported by `train status`.
pub const DEFAULT_TOP_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub trainer: String,
    pub score: u64,
}

impl TrainingState {
    /// Adds `points` to `trainer`, creating the entry if needed.
    pub async fn award(
        &self,
        trainer: &str,
        points: u64,
    ) -> Result<Vec<ScoreEntry>, TrainingError> {
        let _guard = self.locks.lock(TRAINER_SCOREBOARD).await;

        let mut board: Vec<ScoreEntry> = store::load(self.store(), TRAINER_SCOREBOARD).await?;
        match board.iter_mut().find(|e| e.trainer == trainer) {
            Some(entry) => entry.score = entry.score.saturating_add(points),
            None => board.push(ScoreEntry {
                trainer: trainer.to_string(),
                score: points,
            }),
        }
        store::save(self.store(), TRAINER_SCOREBOARD, &board).await?;

        tracing::debug!(trainer = trainer, points = points, "Updated trainer scoreboard");
        Ok(board)
    }

    /// The full scoreboard in first-award order.
    pub async fn scoreboard(&self) -> Result<Vec<ScoreEntry>, TrainingError> {
        Ok(store::load(self.store(), TRAINER_SCOREBOARD).await?)
    }

    pub async fn score_of(&self, trainer: &str) -> Result<Option<u64>, TrainingError> {
        Ok(self
            .scoreboard()
            .await?
            .into_iter()
            .find(|e| e.trainer == trainer)
            .map(|e| e.score))
    }

    /// Up to `limit` `(trainer, score)` pairs, highest score first.
    pub async fn top_n(&self, limit: usize) -> Result<Vec<(String, u64)>, TrainingError> {
        Ok(rank(self.scoreboard().await?, limit))
    }
}

fn rank(mut board: Vec<ScoreEntry>, limit: usize) -> Vec<(String, u64)> {
    board.sort_by(|a, b| b.score.cmp(&a.score));
    board
        .into_iter()
        .take(limit)
        .map(|e| (e.trainer, e.score))
        .collect()
}
