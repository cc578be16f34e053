//! End-to-end chat scenarios against an in-memory store and a canned tweet
//! source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use social_support::config::{PluginSettings, SocialSupportConfig};
use social_support::error::{SearchError, StoreError};
use social_support::plugin::{PluginHost, SocialSupport};
use social_support::store::{self, KeyValueStore, MemoryStore};
use social_support::training::{TRAINER_QUEUE, TRAINER_SCOREBOARD, TRAINING_CORPUS, TRAINING_QUEUE};
use social_support::twitter::{Tweet, TweetSource};

const FRANCESCA: &str = "RT @OhioState_WTEN: Good luck to freshman Francesca Di Lorenzo who \
     opens play in @usopen juniors Sunday! http://t.co/b3a2m6S2BN #GoBucks ht…";

/// Serves a fixed batch of 100 tweets, newest last, and counts fetches.
struct CannedSource {
    fetches: AtomicUsize,
}

impl CannedSource {
    fn new() -> Self {
        Self {
            fetches: AtomicUsize::new(0),
        }
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TweetSource for CannedSource {
    async fn fetch_tweets(&self, limit: usize) -> Result<Vec<Tweet>, SearchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut tweets: Vec<Tweet> = (1..100u64)
            .map(|i| Tweet::new(640303466536148000 + i, format!("#usopen tweet number {i}")))
            .collect();
        tweets.push(Tweet::new(640303466536148992, FRANCESCA));
        tweets.truncate(limit);
        Ok(tweets)
    }

    fn since_id(&self) -> Option<u64> {
        (self.fetches() > 0).then_some(640303466536148992)
    }
}

struct BrokenSource;

#[async_trait]
impl TweetSource for BrokenSource {
    async fn fetch_tweets(&self, _limit: usize) -> Result<Vec<Tweet>, SearchError> {
        Err(SearchError::Api {
            status: 429,
            body: "Rate limit exceeded".to_string(),
        })
    }
}

/// Wraps a [`MemoryStore`] with slow reads and switchable assignment writes.
struct SlowStore {
    inner: MemoryStore,
    read_delay: Duration,
    fail_assignments: AtomicBool,
}

impl SlowStore {
    fn new(read_delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            read_delay,
            fail_assignments: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl KeyValueStore for SlowStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        tokio::time::sleep(self.read_delay).await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        if key == TRAINER_QUEUE && self.fail_assignments.load(Ordering::SeqCst) {
            return Err(StoreError::ConnectionFailed("assignment write refused".to_string()));
        }
        self.inner.set(key, value).await
    }
}

async fn activate(source: Arc<CannedSource>) -> (Arc<MemoryStore>, PluginHost) {
    let store = Arc::new(MemoryStore::new());
    let plugin = SocialSupport::with_source(store.clone(), source, PluginSettings::default()).await;

    let mut host = PluginHost::new();
    assert!(host.install(plugin));
    (store, host)
}

fn plugin(host: &PluginHost) -> &SocialSupport {
    host.plugin().expect("plugin active")
}

// ============================================================================
// Activation
// ============================================================================

#[tokio::test]
async fn test_no_configuration() {
    let mut host = PluginHost::new();
    let active = host
        .activate(None, Arc::new(MemoryStore::new()), PluginSettings::default())
        .await;
    assert!(!active);
    assert!(!host.active_plugin_names().contains(&"SocialSupport"));
}

#[tokio::test]
async fn test_wrong_configuration() {
    let incomplete = HashMap::from([("TWITTER_CONSUMER_KEY".to_string(), "xxxx".to_string())]);

    let mut host = PluginHost::new();
    let active = host
        .activate(
            Some(&incomplete),
            Arc::new(MemoryStore::new()),
            PluginSettings::default(),
        )
        .await;
    assert!(!active);
    assert!(host.active_plugin_names().is_empty());
    assert!(host.dispatch("gbin@localhost", "!train status").await.is_none());
}

#[tokio::test]
async fn test_complete_configuration_activates_and_seeds_store() {
    let raw: HashMap<String, String> = SocialSupportConfig::template()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let store = Arc::new(MemoryStore::new());

    let mut host = PluginHost::new();
    assert!(host.activate(Some(&raw), store.clone(), PluginSettings::default()).await);
    assert_eq!(host.active_plugin_names(), vec!["SocialSupport"]);

    for key in [TRAINING_CORPUS, TRAINING_QUEUE, TRAINER_QUEUE, TRAINER_SCOREBOARD] {
        assert!(store.contains(key).await.expect("contains"), "{key} not seeded");
    }

    host.deactivate();
    assert!(!host.is_active());
}

// ============================================================================
// Queue utilities
// ============================================================================

#[tokio::test]
async fn test_load_tweets_into_queue_empty() {
    let (_store, host) = activate(Arc::new(CannedSource::new())).await;
    plugin(&host).load_into_queue(TRAINING_QUEUE).await.expect("load");
    let len = plugin(&host).training().queue_len(TRAINING_QUEUE).await.expect("len");
    assert_eq!(len, 100);
}

#[tokio::test]
async fn test_load_tweets_into_queue_not_empty() {
    let (store, host) = activate(Arc::new(CannedSource::new())).await;
    store::save(store.as_ref(), TRAINING_QUEUE, &vec![Tweet::new(1, "Item")])
        .await
        .expect("save");

    plugin(&host).load_into_queue(TRAINING_QUEUE).await.expect("load");
    let len = plugin(&host).training().queue_len(TRAINING_QUEUE).await.expect("len");
    assert_eq!(len, 101);
}

#[tokio::test]
async fn test_pop_tweet_from_queue() {
    let source = Arc::new(CannedSource::new());
    let (_store, host) = activate(source.clone()).await;
    plugin(&host).load_into_queue(TRAINING_QUEUE).await.expect("load");

    let tweet = plugin(&host).pop_from_queue(TRAINING_QUEUE).await.expect("pop");
    assert!(tweet.contains("Good luck to freshman Francesca Di Lorenzo"));
    assert_eq!(
        plugin(&host).training().queue_len(TRAINING_QUEUE).await.expect("len"),
        99
    );
    assert_eq!(plugin(&host).since_id(), Some(640303466536148992));
}

#[tokio::test]
async fn test_assign_tweet_to_trainer() {
    let (_store, host) = activate(Arc::new(CannedSource::new())).await;
    plugin(&host).load_into_queue(TRAINING_QUEUE).await.expect("load");
    let tweet = plugin(&host).pop_from_queue(TRAINING_QUEUE).await.expect("pop");

    let table = plugin(&host).assign("Tester", &tweet).await.expect("assign");
    assert_eq!(table.len(), 1);
    assert_eq!(table.get("Tester"), Some(&Some(FRANCESCA.to_string())));
}

#[tokio::test]
async fn test_pop_tweet_for_trainer() {
    let (_store, host) = activate(Arc::new(CannedSource::new())).await;
    plugin(&host).assign("Tester", "I need help!").await.expect("assign");
    assert_eq!(
        plugin(&host).take_assignment("Tester").await.expect("take"),
        Some("I need help!".to_string())
    );
}

// ============================================================================
// Chat commands
// ============================================================================

#[tokio::test]
async fn test_train_status_uninitialized() {
    let source = Arc::new(CannedSource::new());
    let (_store, host) = activate(source.clone()).await;

    let replies = host
        .dispatch("gbin@localhost", "!train status")
        .await
        .expect("handled");
    assert_eq!(replies.len(), 2);
    assert!(replies[0].contains("No tweets found in training corpus"));
    assert!(replies[1].contains("No tweets awaiting classification"));

    assert_eq!(source.fetches(), 1);
    assert_eq!(
        plugin(&host).training().queue_len(TRAINING_QUEUE).await.expect("len"),
        100
    );
}

#[tokio::test]
async fn test_train_status_no_corpus() {
    let (_store, host) = activate(Arc::new(CannedSource::new())).await;
    plugin(&host).load_into_queue(TRAINING_QUEUE).await.expect("load");

    let replies = host
        .dispatch("gbin@localhost", "!train status")
        .await
        .expect("handled");
    assert!(replies[0].contains("No tweets found in training corpus"));
    assert!(replies[1].contains("Tweets awaiting classification: 100"));
}

#[tokio::test]
async fn test_train_status() {
    let source = Arc::new(CannedSource::new());
    let (_store, host) = activate(source.clone()).await;
    let p = plugin(&host);
    p.load_into_queue(TRAINING_QUEUE).await.expect("load");
    p.append(TRAINING_CORPUS, "I need help!", "pos").await.expect("append");
    for (points, name) in ["One", "Two", "Three", "Four", "Five", "Six"].iter().enumerate() {
        p.award(name, points as u64 + 1).await.expect("award");
    }

    let replies = host
        .dispatch("gbin@localhost", "!train status")
        .await
        .expect("handled");
    assert_eq!(
        replies,
        vec![
            "Training corpus size: 1",
            "Tweets awaiting classification: 100",
            "Top 5 trainers:",
            "1: Six - 6",
            "2: Five - 5",
            "3: Four - 4",
            "4: Three - 3",
            "5: Two - 2",
        ]
    );
    assert_eq!(source.fetches(), 1, "non-empty queue must not trigger a refill");
}

#[tokio::test]
async fn test_train_gimme() {
    let (_store, host) = activate(Arc::new(CannedSource::new())).await;
    plugin(&host).load_into_queue(TRAINING_QUEUE).await.expect("load");

    let replies = host
        .dispatch("gbin@localhost", "!train gimme")
        .await
        .expect("handled");
    assert_eq!(replies.len(), 2);
    assert!(replies[0].contains("Does the person submitting this tweet"));
    assert!(replies[1].contains("Good luck to freshman Francesca Di Lorenzo"));

    let table = plugin(&host).training().assignments().await.expect("table");
    assert_eq!(table.len(), 1);
    assert_eq!(table.get("gbin@localhost"), Some(&Some(FRANCESCA.to_string())));
}

#[tokio::test]
async fn test_train_gimme_empty_queue() {
    let source = Arc::new(CannedSource::new());
    let (_store, host) = activate(source.clone()).await;

    let replies = host
        .dispatch("gbin@localhost", "!train gimme")
        .await
        .expect("handled");
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("No tweets awaiting classification"));
    assert!(replies[0].contains("Try !train gimme again"));

    assert_eq!(source.fetches(), 1);
    assert!(plugin(&host).training().assignments().await.expect("table").is_empty());

    let retry = host
        .dispatch("gbin@localhost", "!train gimme")
        .await
        .expect("handled");
    assert_eq!(retry[1], FRANCESCA);
}

#[tokio::test]
async fn test_refill_failure_is_reported() {
    let store = Arc::new(MemoryStore::new());
    let plugin =
        SocialSupport::with_source(store, Arc::new(BrokenSource), PluginSettings::default())
            .await
            .expect("activate");

    let replies = plugin.train_gimme("gbin@localhost").await.expect("handled");
    assert_eq!(replies.len(), 2);
    assert!(replies[1].starts_with("Could not fetch tweets:"));
    assert!(replies[1].contains("429"));
}

#[tokio::test]
async fn test_unrouted_lines_are_ignored() {
    let (_store, host) = activate(Arc::new(CannedSource::new())).await;
    assert!(host.dispatch("gbin@localhost", "!train yes").await.is_none());
    assert!(host.dispatch("gbin@localhost", "good morning").await.is_none());
}

#[tokio::test]
async fn test_gimme_then_label_round_trip() {
    let (_store, host) = activate(Arc::new(CannedSource::new())).await;
    plugin(&host).load_into_queue(TRAINING_QUEUE).await.expect("load");
    host.dispatch("alice", "!train gimme").await.expect("handled");

    let reply = plugin(&host)
        .train_with_label("alice", "yes")
        .await
        .expect("train");
    assert_eq!(reply, "Thank you for the training! Your score is now: 1");

    let replies = host.dispatch("alice", "!train status").await.expect("handled");
    assert_eq!(replies[0], "Training corpus size: 1");
    assert_eq!(replies[1], "Tweets awaiting classification: 99");
    assert_eq!(replies[3], "1: alice - 1");
}

#[tokio::test]
async fn test_concurrent_awards_are_not_lost() {
    let (_store, host) = activate(Arc::new(CannedSource::new())).await;
    let host = Arc::new(host);

    let mut handles = Vec::new();
    for _ in 0..20 {
        let host = host.clone();
        handles.push(tokio::spawn(async move {
            plugin(&host).award("Tester", 1).await.expect("award");
        }));
    }
    for handle in handles {
        handle.await.expect("task");
    }

    let top = plugin(&host).top_n(5).await.expect("top");
    assert_eq!(top, vec![("Tester".to_string(), 20)]);
}

#[tokio::test]
async fn test_concurrent_gimme_for_last_tweet() {
    let store = Arc::new(SlowStore::new(Duration::from_millis(5)));
    let source = Arc::new(CannedSource::new());
    let support = SocialSupport::with_source(store.clone(), source, PluginSettings::default())
        .await
        .expect("activate");
    store::save(store.as_ref(), TRAINING_QUEUE, &vec![Tweet::new(1, "only")])
        .await
        .expect("save");

    let mut host = PluginHost::new();
    assert!(host.install(Ok(support)));

    let (alice, bob) = tokio::join!(
        host.dispatch("alice", "!train gimme"),
        host.dispatch("bob", "!train gimme"),
    );
    let replies = [alice.expect("handled"), bob.expect("handled")];

    let winners: Vec<_> = replies.iter().filter(|r| r.len() == 2 && r[1] == "only").collect();
    assert_eq!(winners.len(), 1, "exactly one trainer gets the last tweet: {replies:?}");

    for reply in &replies {
        assert!(!reply[0].starts_with("Sorry"), "error leaked to chat: {reply:?}");
    }
    let losers: Vec<_> = replies
        .iter()
        .filter(|r| r[0].contains("Try !train gimme again"))
        .collect();
    assert_eq!(losers.len(), 1);
}

#[tokio::test]
async fn test_failed_assignment_keeps_tweet_queued() {
    let store = Arc::new(SlowStore::new(Duration::ZERO));
    let source = Arc::new(CannedSource::new());
    let support = SocialSupport::with_source(store.clone(), source, PluginSettings::default())
        .await
        .expect("activate");
    support.load_into_queue(TRAINING_QUEUE).await.expect("load");

    let mut host = PluginHost::new();
    assert!(host.install(Ok(support)));
    store.fail_assignments.store(true, Ordering::SeqCst);

    let replies = host.dispatch("alice", "!train gimme").await.expect("handled");
    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("Sorry, train gimme failed:"));

    let training = plugin(&host).training();
    assert_eq!(training.queue_len(TRAINING_QUEUE).await.expect("len"), 100);

    store.fail_assignments.store(false, Ordering::SeqCst);
    let retry = host.dispatch("alice", "!train gimme").await.expect("handled");
    assert_eq!(retry[1], FRANCESCA);
}
