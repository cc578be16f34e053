//! The social-support plugin.
//!
//! [`SocialSupport`] is the plugin's whole state, built once at activation:
//! the training collections in the host store, the tweet source used for
//! refills and the Zendesk client. Chat commands live in [`commands`]; the
//! minimal host that activates the plugin and routes chat lines to it lives in
//! [`host`].

pub mod commands;
pub mod host;

use std::sync::Arc;

use tracing::info;

use crate::config::{PluginSettings, SocialSupportConfig};
use crate::error::{PluginError, TrainingError};
use crate::metrics::MetricsCollector;
use crate::store::KeyValueStore;
use crate::training::{
    assignments::AssignmentTable, CorpusRecord, QueueRefill, ScoreEntry, TrainingState,
    TRAINING_CORPUS,
};
use crate::twitter::{Tweet, TweetSource, TwitterSearchClient};
use crate::zendesk::ZendeskClient;

pub use commands::ChatCommand;
pub use host::PluginHost;

/// Plugin name as reported by the host.
pub const PLUGIN_NAME: &str = "SocialSupport";

/// Activated plugin state.
pub struct SocialSupport {
    training: TrainingState,
    source: Arc<dyn TweetSource>,
    ticketing: Option<ZendeskClient>,
    settings: PluginSettings,
    metrics: MetricsCollector,
}

impl SocialSupport {
    /// Activates the plugin against the real Twitter and Zendesk APIs.
    ///
    /// Builds both clients from `config` and seeds the persisted collections.
    pub async fn activate(
        config: &SocialSupportConfig,
        store: Arc<dyn KeyValueStore>,
        settings: PluginSettings,
    ) -> Result<Self, PluginError> {
        config.validate()?;
        let source = Arc::new(TwitterSearchClient::from_config(config));
        let ticketing = ZendeskClient::from_config(config)?;

        info!("Starting SocialSupport.");
        let mut plugin = Self::with_source(store, source, settings).await?;
        plugin.ticketing = Some(ticketing);
        Ok(plugin)
    }

    /// Activates the plugin with a custom tweet source and no ticketing client.
    pub async fn with_source(
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn TweetSource>,
        settings: PluginSettings,
    ) -> Result<Self, PluginError> {
        let training = TrainingState::new(store);

        info!(reset = settings.reset_on_activate, "Setting up persistence.");
        training.initialize(settings.reset_on_activate).await?;

        Ok(Self {
            training,
            source,
            ticketing: None,
            settings,
            metrics: MetricsCollector::new(),
        })
    }

    pub fn training(&self) -> &TrainingState {
        &self.training
    }

    pub fn ticketing(&self) -> Option<&ZendeskClient> {
        self.ticketing.as_ref()
    }

    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }

    /// Fetches up to the configured limit of tweets for the search query.
    pub async fn fetch_tweets(&self) -> Result<Vec<Tweet>, TrainingError> {
        Ok(self.source.fetch_tweets(self.settings.fetch_limit).await?)
    }

    /// Id of the last tweet seen by a refill.
    pub fn since_id(&self) -> Option<u64> {
        self.source.since_id()
    }

    /// Refills `queue` from the tweet source; see
    /// [`TrainingState::load_into_queue`].
    pub async fn load_into_queue(&self, queue: &str) -> Result<QueueRefill, TrainingError> {
        let refill = self
            .training
            .load_into_queue(queue, self.source.as_ref(), self.settings.fetch_limit)
            .await?;
        self.metrics.record_fetch(queue, refill.added);
        self.metrics.set_queue_depth(queue, refill.items.len());
        Ok(refill)
    }

    pub async fn pop_from_queue(&self, queue: &str) -> Result<String, TrainingError> {
        let text = self.training.pop_from_queue(queue).await?;
        self.refresh_queue_depth(queue).await;
        Ok(text)
    }

    async fn refresh_queue_depth(&self, queue: &str) {
        if let Ok(depth) = self.training.queue_len(queue).await {
            self.metrics.set_queue_depth(queue, depth);
        }
    }

    pub async fn assign(
        &self,
        trainer: &str,
        tweet: &str,
    ) -> Result<AssignmentTable, TrainingError> {
        self.training.assign(trainer, tweet).await
    }

    pub async fn take_assignment(&self, trainer: &str) -> Result<Option<String>, TrainingError> {
        self.training.take_assignment(trainer).await
    }

    pub async fn append(
        &self,
        corpus: &str,
        text: &str,
        label: &str,
    ) -> Result<Vec<CorpusRecord>, TrainingError> {
        self.training.append(corpus, text, label).await
    }

    pub async fn award(
        &self,
        trainer: &str,
        points: u64,
    ) -> Result<Vec<ScoreEntry>, TrainingError> {
        self.training.award(trainer, points).await
    }

    pub async fn top_n(&self, limit: usize) -> Result<Vec<(String, u64)>, TrainingError> {
        self.training.top_n(limit).await
    }

    /// Completes a labeling round for `trainer`.
    ///
    /// Not routed to a chat command. Consumes the trainer's assignment, awards
    /// one point and stores the labeled example. The label is not validated.
    pub async fn train_with_label(
        &self,
        trainer: &str,
        label: &str,
    ) -> Result<String, TrainingError> {
        let Some(tweet) = self.training.take_assignment(trainer).await? else {
            return Ok("Have I given you a tweet to classify yet? Send !train gimme to receive one."
                .to_string());
        };

        let board = self.training.award(trainer, 1).await?;
        self.training.append(TRAINING_CORPUS, &tweet, label).await?;
        self.metrics.record_label();

        let score = board
            .iter()
            .find(|e| e.trainer == trainer)
            .map(|e| e.score)
            .unwrap_or(1);
        info!(trainer = trainer, label = label, score = score, "Recorded label");
        Ok(format!("Thank you for the training! Your score is now: {score}"))
    }
}
