use iine_core::{ArticleSource, ChangeRecord, DiffResult, EventKind, Result};

/// Turns MODIFY records into the likers added since the previous count.
pub struct DiffReconciler<'a> {
    source: &'a dyn ArticleSource,
}

impl<'a> DiffReconciler<'a> {
    pub fn new(source: &'a dyn ArticleSource) -> Self {
        Self { source }
    }

    /// `Ok(None)` means the record carries no diff at all. A diff whose
    /// `new_likers` is empty means the like list showed nobody new.
    pub async fn reconcile(&self, record: &ChangeRecord) -> Result<Option<DiffResult>> {
        if record.event_kind != EventKind::Modify {
            return Ok(None);
        }

        let (article_id, past_like_count) = record
            .before
            .as_ref()
            .map(|before| (before.id.clone(), before.like_count))
            .unwrap_or_default();
        let title = record
            .after
            .as_ref()
            .map(|after| after.title.clone())
            .unwrap_or_default();

        if article_id.is_empty() {
            tracing::warn!("MODIFY record without an article id, nothing to look up");
            return Ok(Some(DiffResult {
                article_id,
                title,
                new_likers: Vec::new(),
            }));
        }

        let likers = self.source.fetch_likers(&article_id).await?;
        let user_ids: Vec<String> = likers.into_iter().map(|liker| liker.user_id).collect();
        let new_likers = newest_likers(&user_ids, past_like_count);
        tracing::debug!(
            article_id = %article_id,
            past_like_count,
            likers = user_ids.len(),
            new = new_likers.len(),
            "reconciled likers"
        );

        Ok(Some(DiffResult {
            article_id,
            title,
            new_likers,
        }))
    }
}

/// The first `len - past_like_count` ids of a most-recent-first list,
/// or nothing when the list is not longer than the recorded count.
pub fn newest_likers(likers: &[String], past_like_count: u64) -> Vec<String> {
    let past = usize::try_from(past_like_count).unwrap_or(usize::MAX);
    let new_count = likers.len().saturating_sub(past);
    likers[..new_count]
        .iter()
        .filter(|id| !id.is_empty())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use iine_core::{ArticlePage, ArticleRecord, Error, Liker};
    use std::sync::Mutex;

    struct LikersSource {
        likers: Vec<&'static str>,
        lookups: Mutex<Vec<String>>,
    }

    impl LikersSource {
        fn new(likers: Vec<&'static str>) -> Self {
            Self {
                likers,
                lookups: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ArticleSource for LikersSource {
        async fn fetch_page(&self, _page: u32, _per_page: u32) -> Result<ArticlePage> {
            Ok(ArticlePage::default())
        }

        async fn fetch_likers(&self, article_id: &str) -> Result<Vec<Liker>> {
            self.lookups.lock().unwrap().push(article_id.to_string());
            Ok(self
                .likers
                .iter()
                .map(|id| Liker { user_id: id.to_string() })
                .collect())
        }
    }

    fn modify(past: u64, current: u64) -> ChangeRecord {
        ChangeRecord::modify(
            ArticleRecord::new("a1", "Intro to X", past),
            ArticleRecord::new("a1", "Intro to X", current),
        )
    }

    #[tokio::test]
    async fn test_returns_most_recent_likers() {
        let source = LikersSource::new(vec!["u8", "u7", "u6", "u5", "u4", "u3", "u2", "u1"]);
        let diff = DiffReconciler::new(&source)
            .reconcile(&modify(5, 8))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(diff.article_id, "a1");
        assert_eq!(diff.title, "Intro to X");
        assert_eq!(diff.new_likers, vec!["u8", "u7", "u6"]);
        assert_eq!(*source.lookups.lock().unwrap(), vec!["a1".to_string()]);
    }

    #[tokio::test]
    async fn test_stale_likers_list_yields_empty_diff() {
        let source = LikersSource::new(vec!["u3", "u2", "u1"]);
        let diff = DiffReconciler::new(&source)
            .reconcile(&modify(5, 8))
            .await
            .unwrap()
            .unwrap();
        assert!(diff.new_likers.is_empty());
    }

    #[tokio::test]
    async fn test_non_modify_records_are_discarded() {
        let source = LikersSource::new(vec!["u1"]);
        let reconciler = DiffReconciler::new(&source);

        let insert = ChangeRecord::insert(ArticleRecord::new("a1", "Intro to X", 1));
        let remove = ChangeRecord {
            event_kind: EventKind::Remove,
            before: Some(ArticleRecord::new("a1", "Intro to X", 1)),
            ..ChangeRecord::default()
        };
        assert!(reconciler.reconcile(&insert).await.unwrap().is_none());
        assert!(reconciler.reconcile(&remove).await.unwrap().is_none());
        assert!(reconciler.reconcile(&ChangeRecord::default()).await.unwrap().is_none());
        assert!(source.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_images_degrade_to_defaults() {
        let source = LikersSource::new(vec!["u2", "u1"]);
        let record = ChangeRecord {
            event_kind: EventKind::Modify,
            before: Some(ArticleRecord { id: "a1".to_string(), ..ArticleRecord::default() }),
            after: None,
            recorded_at: None,
        };
        let diff = DiffReconciler::new(&source).reconcile(&record).await.unwrap().unwrap();
        assert_eq!(diff.title, "");
        assert_eq!(diff.new_likers, vec!["u2", "u1"]);

        let record = ChangeRecord {
            event_kind: EventKind::Modify,
            ..ChangeRecord::default()
        };
        let diff = DiffReconciler::new(&source).reconcile(&record).await.unwrap().unwrap();
        assert!(diff.new_likers.is_empty());
        assert_eq!(source.lookups.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_errors_propagate() {
        struct Broken;

        #[async_trait]
        impl ArticleSource for Broken {
            async fn fetch_page(&self, _page: u32, _per_page: u32) -> Result<ArticlePage> {
                Ok(ArticlePage::default())
            }

            async fn fetch_likers(&self, _article_id: &str) -> Result<Vec<Liker>> {
                Err(Error::from_status(401, "expired token"))
            }
        }

        let result = DiffReconciler::new(&Broken).reconcile(&modify(1, 2)).await;
        assert!(matches!(result, Err(Error::Auth(_))));
    }

    #[test]
    fn test_newest_likers_slices_and_drops_blank_ids() {
        let ids: Vec<String> = ["u4", "", "u2", "u1"].iter().map(|s| s.to_string()).collect();
        assert_eq!(newest_likers(&ids, 1), vec!["u4", "u2"]);
        assert_eq!(newest_likers(&ids, 4), Vec::<String>::new());
        assert_eq!(newest_likers(&ids, 40), Vec::<String>::new());
        assert_eq!(newest_likers(&ids, 0).len(), 3);
    }
}
