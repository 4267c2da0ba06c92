use async_trait::async_trait;
use crate::types::{ArticleRecord, ChangeRecord, WriteOutcome};
use crate::Result;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Write `title` and `like_count` for `id` only if the article is new or
    /// its stored like count differs. An unchanged count fails with
    /// `Error::ConditionNotMet` and leaves the change feed untouched.
    async fn conditional_update(&self, id: &str, title: &str, like_count: u64) -> Result<WriteOutcome>;

    /// Get the stored record for an article
    async fn get(&self, id: &str) -> Result<Option<ArticleRecord>>;

    /// All stored records, ordered by id
    async fn list(&self) -> Result<Vec<ArticleRecord>>;

    /// Consume up to `max` pending change records, oldest first
    async fn take_changes(&self, max: usize) -> Result<Vec<ChangeRecord>>;

    /// Append change records back onto the feed, in the given order, so a
    /// later `take_changes` hands them out again
    async fn requeue_changes(&self, changes: Vec<ChangeRecord>) -> Result<()>;
}
