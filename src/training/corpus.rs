//! Labeled training corpus.

use serde::{Deserialize, Serialize};

use super::TrainingState;
use crate::error::TrainingError;
use crate::store;

/// One labeled example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub text: String,
    pub label: String,
}

impl CorpusRecord {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

impl TrainingState {
    /// Appends a labeled example to `corpus` and returns the whole corpus.
    pub async fn append(
        &self,
        corpus: &str,
        text: &str,
        label: &str,
    ) -> Result<Vec<CorpusRecord>, TrainingError> {
        let _guard = self.locks.lock(corpus).await;

        let mut records: Vec<CorpusRecord> = store::load(self.store(), corpus).await?;
        records.push(CorpusRecord::new(text, label));
        store::save(self.store(), corpus, &records).await?;

        tracing::debug!(corpus = corpus, size = records.len(), "Corpus updated");
        Ok(records)
    }

    pub async fn corpus(&self, corpus: &str) -> Result<Vec<CorpusRecord>, TrainingError> {
        Ok(store::load(self.store(), corpus).await?)
    }

    pub async fn corpus_len(&self, corpus: &str) -> Result<usize, TrainingError> {
        Ok(self.corpus(corpus).await?.len())
    }
}
