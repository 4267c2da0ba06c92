use async_trait::async_trait;
use iine_collector::Collector;
use iine_core::{
    ArticlePage, ArticleRecord, ArticleSource, ArticleStore, DeliveryResult, Error, EventKind,
    InvocationResult, Liker, NotificationChannel, Result,
};
use iine_notifier::{Notifier, RecordOutcome};
use iine_storage::InMemoryStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Stand-in for the platform: one article whose like count can be bumped.
struct Platform {
    article: Mutex<ArticleRecord>,
    likers: Mutex<Vec<String>>,
}

impl Platform {
    fn new(article: ArticleRecord, likers: usize) -> Arc<Self> {
        Arc::new(Self {
            article: Mutex::new(article),
            likers: Mutex::new((1..=likers).rev().map(|n| format!("user{}", n)).collect()),
        })
    }

    fn like(&self, user: &str) {
        self.likers.lock().unwrap().insert(0, user.to_string());
        self.article.lock().unwrap().like_count += 1;
    }
}

#[async_trait]
impl ArticleSource for Platform {
    async fn fetch_page(&self, _page: u32, _per_page: u32) -> Result<ArticlePage> {
        Ok(ArticlePage {
            items: vec![self.article.lock().unwrap().clone()],
            total_count: Some(1),
        })
    }

    async fn fetch_likers(&self, _article_id: &str) -> Result<Vec<Liker>> {
        Ok(self
            .likers
            .lock()
            .unwrap()
            .iter()
            .map(|id| Liker { user_id: id.clone() })
            .collect())
    }
}

#[derive(Default)]
struct Inbox {
    messages: Mutex<Vec<String>>,
}

#[async_trait]
impl NotificationChannel for Inbox {
    async fn send(&self, message: &str) -> Result<DeliveryResult> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(DeliveryResult { status: 200, message: "ok".to_string() })
    }
}

/// Rejects the first `outages` deliveries, then behaves like `Inbox`.
struct FlakyInbox {
    outages: AtomicUsize,
    inbox: Inbox,
}

#[async_trait]
impl NotificationChannel for FlakyInbox {
    async fn send(&self, message: &str) -> Result<DeliveryResult> {
        let remaining = self.outages.load(Ordering::SeqCst);
        if remaining > 0 {
            self.outages.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::from_status(503, "down"));
        }
        self.inbox.send(message).await
    }
}

#[tokio::test]
async fn test_new_likes_are_notified_once() {
    let store = Arc::new(InMemoryStore::new());
    store.conditional_update("a1", "Intro to X", 5).await.unwrap();
    store.take_changes(100).await.unwrap();

    let platform = Platform::new(ArticleRecord::new("a1", "Intro to X", 5), 5);
    for user in ["carol", "dave", "erin"] {
        platform.like(user);
    }

    let inbox = Arc::new(Inbox::default());
    let collector = Collector::new(platform.clone(), store.clone(), 20);
    let notifier = Notifier::new(platform.clone(), inbox.clone());

    let collected = collector.run().await.unwrap();
    assert_eq!(collected.status_code, 200);

    let batch = store.take_changes(100).await.unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].event_kind, EventKind::Modify);

    let response = notifier.handle(&batch).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.outcomes,
        vec![RecordOutcome::Notified {
            article_id: "a1".to_string(),
            likers: vec!["erin".to_string(), "dave".to_string(), "carol".to_string()],
        }]
    );

    let messages = inbox.messages.lock().unwrap().clone();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("erin, dave, carol"));
    assert!(messages[0].contains("「Intro to X」"));
    assert!(!messages[0].contains('8'));

    // Polling again without new likes changes nothing downstream.
    collector.run().await.unwrap();
    collector.run().await.unwrap();
    assert!(store.take_changes(100).await.unwrap().is_empty());
    assert_eq!(inbox.messages.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_first_sighting_does_not_notify() {
    let store = Arc::new(InMemoryStore::new());
    let platform = Platform::new(ArticleRecord::new("a1", "Intro to X", 2), 2);
    let inbox = Arc::new(Inbox::default());

    Collector::new(platform.clone(), store.clone(), 20).run().await.unwrap();
    let batch = store.take_changes(100).await.unwrap();
    assert_eq!(batch[0].event_kind, EventKind::Insert);

    let response = Notifier::new(platform, inbox.clone()).handle(&batch).await;
    assert_eq!(response.outcomes, vec![RecordOutcome::Ignored]);
    assert!(inbox.messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_delivery_is_retried_on_next_drain() {
    let store = Arc::new(InMemoryStore::new());
    store.conditional_update("a1", "Intro to X", 5).await.unwrap();
    store.take_changes(100).await.unwrap();

    let platform = Platform::new(ArticleRecord::new("a1", "Intro to X", 5), 5);
    for user in ["carol", "dave", "erin"] {
        platform.like(user);
    }

    let channel = Arc::new(FlakyInbox {
        outages: AtomicUsize::new(1),
        inbox: Inbox::default(),
    });
    let collector = Collector::new(platform.clone(), store.clone(), 20);
    let notifier = Notifier::new(platform.clone(), channel.clone());

    collector.run().await.unwrap();
    let status = notifier.drain(&*store, 10).await.unwrap();
    assert_eq!(status, InvocationResult::FAILED);
    assert_eq!(store.pending_changes().await, 1);
    assert!(channel.inbox.messages.lock().unwrap().is_empty());

    // The count is unchanged, so the collector adds nothing; the retry comes
    // from the requeued record.
    collector.run().await.unwrap();
    let status = notifier.drain(&*store, 10).await.unwrap();
    assert_eq!(status, InvocationResult::OK);
    assert_eq!(store.pending_changes().await, 0);

    let messages = channel.inbox.messages.lock().unwrap().clone();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("erin, dave, carol"));

    assert_eq!(notifier.drain(&*store, 10).await.unwrap(), InvocationResult::OK);
    assert_eq!(channel.inbox.messages.lock().unwrap().len(), 1);
}
