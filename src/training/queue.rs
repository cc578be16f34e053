//! Named tweet queues.
//!
//! A refill appends a fresh search batch to the end of the queue and a pop
//! takes from the end, so the most recently fetched tweet is labeled first.

use tracing::{debug, info};

use super::TrainingState;
use crate::error::TrainingError;
use crate::store;
use crate::twitter::{Tweet, TweetSource};

/// Outcome of a queue refill.
#[derive(Debug, Clone)]
pub struct QueueRefill {
    /// Tweets fetched by this refill.
    pub added: usize,
    /// The queue after the refill, oldest first.
    pub items: Vec<Tweet>,
}

impl TrainingState {
    /// Tweets currently in `queue`, oldest first.
    pub async fn queue_items(&self, queue: &str) -> Result<Vec<Tweet>, TrainingError> {
        Ok(store::load(self.store(), queue).await?)
    }

    pub async fn queue_len(&self, queue: &str) -> Result<usize, TrainingError> {
        Ok(self.queue_items(queue).await?.len())
    }

    /// Fetches up to `limit` tweets from `source` into `queue`.
    ///
    /// An empty queue is replaced by the fetched batch; a non-empty queue has
    /// the batch appended. Already queued or labeled tweets are not filtered
    /// out.
    pub async fn load_into_queue(
        &self,
        queue: &str,
        source: &dyn TweetSource,
        limit: usize,
    ) -> Result<QueueRefill, TrainingError> {
        let _guard = self.locks.lock(queue).await;
        info!(queue = queue, "Loading tweets into queue");

        let mut current: Vec<Tweet> = store::load(self.store(), queue).await?;
        let fetched = source.fetch_tweets(limit).await?;
        let added = fetched.len();

        if current.is_empty() {
            info!(queue = queue, "No tweets found in queue");
            current = fetched;
        } else {
            info!(queue = queue, existing = current.len(), "Tweets found in queue");
            for tweet in fetched {
                debug!(tweet_id = tweet.id, "Adding tweet");
                current.push(tweet);
            }
        }

        store::save(self.store(), queue, &current).await?;
        info!(
            queue = queue,
            added = added,
            total = current.len(),
            since_id = ?source.since_id(),
            "Tweets added to queue"
        );
        Ok(QueueRefill {
            added,
            items: current,
        })
    }

    /// Removes the last tweet of `queue`, or returns `None` if it is empty.
    ///
    /// The emptiness check and the removal happen under one lock.
    pub async fn try_pop(&self, queue: &str) -> Result<Option<Tweet>, TrainingError> {
        let _guard = self.locks.lock(queue).await;

        let mut current: Vec<Tweet> = store::load(self.store(), queue).await?;
        let Some(tweet) = current.pop() else {
            return Ok(None);
        };
        store::save(self.store(), queue, &current).await?;

        debug!(queue = queue, tweet_id = tweet.id, remaining = current.len(), "Popped tweet");
        Ok(Some(tweet))
    }

    /// Removes the last tweet of `queue` and returns its text.
    pub async fn pop_from_queue(&self, queue: &str) -> Result<String, TrainingError> {
        self.try_pop(queue)
            .await?
            .map(|tweet| tweet.text)
            .ok_or_else(|| TrainingError::EmptyQueue(queue.to_string()))
    }

    /// Puts `tweet` back on the end of `queue` so it is the next one popped.
    pub async fn requeue(&self, queue: &str, tweet: Tweet) -> Result<usize, TrainingError> {
        let _guard = self.locks.lock(queue).await;

        let mut current: Vec<Tweet> = store::load(self.store(), queue).await?;
        debug!(queue = queue, tweet_id = tweet.id, "Requeued tweet");
        current.push(tweet);
        store::save(self.store(), queue, &current).await?;
        Ok(current.len())
    }
}
