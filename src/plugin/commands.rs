//! Chat commands: `train status` and `train gimme`.
//!
//! Each handler returns the lines it would post to the chat, in order.

use tracing::warn;

use super::SocialSupport;
use crate::error::TrainingError;
use crate::training::scoreboard::DEFAULT_TOP_LIMIT;
use crate::training::{TRAINING_CORPUS, TRAINING_QUEUE};

const EMPTY_CORPUS: &str =
    "No tweets found in training corpus. Use !train gimme to receive a tweet to classify.";
const EMPTY_QUEUE_STATUS: &str = "No tweets awaiting classification - fetching more to classify.";
const EMPTY_QUEUE_GIMME: &str = "No tweets awaiting classification - fetching more to classify. \
     Try !train gimme again to get a tweet to classify.";
const CLASSIFY_PROMPT: &str = "Does the person submitting this tweet need technical support? \
     Respond with !train yes or !train no.";

/// Commands the plugin answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    Status,
    Gimme,
}

impl ChatCommand {
    /// Parses a chat line such as `!train status`.
    ///
    /// The leading `!` is optional, case and repeated whitespace are ignored.
    /// Returns `None` for anything that is not one of the plugin's commands.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let line = line.strip_prefix('!').unwrap_or(line);
        let words: Vec<String> = line.split_whitespace().map(str::to_lowercase).collect();

        match words.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["train", "status"] => Some(Self::Status),
            ["train", "gimme"] => Some(Self::Gimme),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Gimme => "gimme",
        }
    }
}

impl SocialSupport {
    /// Runs `command` on behalf of `sender`.
    pub async fn run_command(
        &self,
        command: ChatCommand,
        sender: &str,
    ) -> Result<Vec<String>, TrainingError> {
        let result = match command {
            ChatCommand::Status => self.train_status().await,
            ChatCommand::Gimme => self.train_gimme(sender).await,
        };
        self.metrics.record_command(command.name(), result.is_ok());
        result
    }

    /// Reports corpus size, queue size and the top trainers.
    ///
    /// An empty queue is refilled after it is reported.
    pub async fn train_status(&self) -> Result<Vec<String>, TrainingError> {
        let mut lines = Vec::new();

        let corpus_count = self.training.corpus_len(TRAINING_CORPUS).await?;
        if corpus_count == 0 {
            lines.push(EMPTY_CORPUS.to_string());
        } else {
            lines.push(format!("Training corpus size: {corpus_count}"));
        }

        let queue_count = self.training.queue_len(TRAINING_QUEUE).await?;
        if queue_count == 0 {
            lines.push(EMPTY_QUEUE_STATUS.to_string());
            self.refill(&mut lines).await;
        } else {
            lines.push(format!("Tweets awaiting classification: {queue_count}"));
        }

        let top = self.training.top_n(DEFAULT_TOP_LIMIT).await?;
        if !top.is_empty() {
            lines.push(format!("Top {DEFAULT_TOP_LIMIT} trainers:"));
            lines.extend(
                top.iter()
                    .enumerate()
                    .map(|(i, (trainer, score))| format!("{}: {} - {}", i + 1, trainer, score)),
            );
        }

        Ok(lines)
    }

    /// Hands the next queued tweet to `sender` for classification.
    ///
    /// A tweet whose assignment cannot be stored goes back on the queue.
    pub async fn train_gimme(&self, sender: &str) -> Result<Vec<String>, TrainingError> {
        let Some(tweet) = self.training.try_pop(TRAINING_QUEUE).await? else {
            let mut lines = vec![EMPTY_QUEUE_GIMME.to_string()];
            self.refill(&mut lines).await;
            return Ok(lines);
        };

        if let Err(e) = self.training.assign(sender, &tweet.text).await {
            warn!(sender = sender, tweet_id = tweet.id, error = %e, "Assignment failed");
            if let Err(requeue_err) = self.training.requeue(TRAINING_QUEUE, tweet).await {
                warn!(error = %requeue_err, "Could not return tweet to queue");
            }
            return Err(e);
        }

        self.refresh_queue_depth(TRAINING_QUEUE).await;
        Ok(vec![CLASSIFY_PROMPT.to_string(), tweet.text])
    }

    /// Refills the training queue, reporting a failed search to the user.
    async fn refill(&self, lines: &mut Vec<String>) {
        if let Err(e) = self.load_into_queue(TRAINING_QUEUE).await {
            warn!(error = %e, "Queue refill failed");
            lines.push(format!("Could not fetch tweets: {e}"));
        }
    }
}
