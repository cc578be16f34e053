//! Labeling workflow bookkeeping.
//!
//! Four persisted collections back the workflow:
//!
//! | Key                       | Shape                          |
//! |---------------------------|--------------------------------|
//! | `SUPPORT_TRAINING_QUEUE`  | list of [`Tweet`]              |
//! | `SUPPORT_TRAINER_QUEUE`   | map trainer -> assigned text   |
//! | `TRAINER_SCOREBOARD`      | list of [`ScoreEntry`]         |
//! | `SUPPORT_TRAINING_CORPUS` | list of [`CorpusRecord`]       |
//!
//! Every mutation is a read-modify-write of the whole collection under a
//! per-key lock, so concurrent commands cannot lose updates.
//!
//! [`Tweet`]: crate::twitter::Tweet

pub mod assignments;
pub mod corpus;
pub mod locks;
pub mod queue;
pub mod scoreboard;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::StoreError;
use crate::store::{self, KeyValueStore};
use crate::twitter::Tweet;

pub use corpus::CorpusRecord;
pub use locks::KeyLocks;
pub use queue::QueueRefill;
pub use scoreboard::ScoreEntry;

/// Persisted list of labeled examples.
pub const TRAINING_CORPUS: &str = "SUPPORT_TRAINING_CORPUS";
/// Persisted queue of tweets awaiting a trainer.
pub const TRAINING_QUEUE: &str = "SUPPORT_TRAINING_QUEUE";
/// Persisted trainer -> assigned tweet table.
pub const TRAINER_QUEUE: &str = "SUPPORT_TRAINER_QUEUE";
/// Persisted trainer scoreboard.
pub const TRAINER_SCOREBOARD: &str = "TRAINER_SCOREBOARD";

/// Handle over the persisted training collections.
#[derive(Clone)]
pub struct TrainingState {
    store: Arc<dyn KeyValueStore>,
    locks: Arc<KeyLocks>,
}

impl TrainingState {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            locks: Arc::new(KeyLocks::new()),
        }
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Seeds the four collections empty.
    ///
    /// With `reset` false, collections that already exist are left alone.
    pub async fn initialize(&self, reset: bool) -> Result<(), StoreError> {
        self.seed(TRAINING_CORPUS, &Vec::<CorpusRecord>::new(), reset).await?;
        self.seed(TRAINING_QUEUE, &Vec::<Tweet>::new(), reset).await?;
        self.seed(TRAINER_QUEUE, &BTreeMap::<String, Option<String>>::new(), reset)
            .await?;
        self.seed(TRAINER_SCOREBOARD, &Vec::<ScoreEntry>::new(), reset)
            .await?;
        Ok(())
    }

    async fn seed<T: serde::Serialize>(
        &self,
        key: &str,
        empty: &T,
        reset: bool,
    ) -> Result<(), StoreError> {
        let _guard = self.locks.lock(key).await;
        if reset || !self.store.contains(key).await? {
            tracing::debug!(key = key, "Seeding empty collection");
            store::save(self.store(), key, empty).await?;
        }
        Ok(())
    }
}
