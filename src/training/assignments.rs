//! Trainer -> assigned tweet table.

use std::collections::BTreeMap;

use super::{TrainingState, TRAINER_QUEUE};
use crate::error::TrainingError;
use crate::store;

/// Assignment table as persisted: an empty slot is `None`.
pub type AssignmentTable = BTreeMap<String, Option<String>>;

impl TrainingState {
    /// Assigns `tweet` to `trainer`, replacing any pending assignment.
    pub async fn assign(
        &self,
        trainer: &str,
        tweet: &str,
    ) -> Result<AssignmentTable, TrainingError> {
        let _guard = self.locks.lock(TRAINER_QUEUE).await;

        let mut table: AssignmentTable = store::load(self.store(), TRAINER_QUEUE).await?;
        table.insert(trainer.to_string(), Some(tweet.to_string()));
        store::save(self.store(), TRAINER_QUEUE, &table).await?;

        tracing::debug!(trainer = trainer, "Assigned tweet to trainer");
        Ok(table)
    }

    /// Takes the tweet assigned to `trainer`, leaving the slot empty.
    pub async fn take_assignment(&self, trainer: &str) -> Result<Option<String>, TrainingError> {
        let _guard = self.locks.lock(TRAINER_QUEUE).await;

        let mut table: AssignmentTable = store::load(self.store(), TRAINER_QUEUE).await?;
        let tweet = match table.get_mut(trainer) {
            Some(slot) if slot.as_deref().is_some_and(|t| !t.is_empty()) => slot.take(),
            _ => return Ok(None),
        };
        store::save(self.store(), TRAINER_QUEUE, &table).await?;
        Ok(tweet)
    }

    /// The full assignment table.
    pub async fn assignments(&self) -> Result<AssignmentTable, TrainingError> {
        Ok(store::load(self.store(), TRAINER_QUEUE).await?)
    }
}
