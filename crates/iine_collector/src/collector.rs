use iine_core::logging::Logger;
use iine_core::{ArticleSource, ArticleStore, InvocationResult, Result, WriteOutcome};
use std::sync::Arc;

use crate::pagination::fetch_all_articles;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectReport {
    pub fetched: usize,
    pub inserted: usize,
    pub modified: usize,
    pub unchanged: usize,
    /// Listing items without an id
    pub skipped: usize,
}

/// Reconciles the remote article listing into the store.
pub struct Collector {
    source: Arc<dyn ArticleSource>,
    store: Arc<dyn ArticleStore>,
    page_size: u32,
    logger: Logger,
}

impl Collector {
    pub fn new(source: Arc<dyn ArticleSource>, store: Arc<dyn ArticleStore>, page_size: u32) -> Self {
        Self {
            source,
            store,
            page_size,
            logger: Logger::new("collector"),
        }
    }

    pub async fn run(&self) -> Result<InvocationResult> {
        self.run_with_report().await?;
        Ok(InvocationResult::OK)
    }

    /// Fetch every page, then write each article. A store error other than
    /// an unchanged count aborts the run.
    pub async fn run_with_report(&self) -> Result<CollectReport> {
        let articles = fetch_all_articles(self.source.as_ref(), self.page_size).await?;
        let mut report = CollectReport {
            fetched: articles.len(),
            ..CollectReport::default()
        };

        for article in &articles {
            if article.id.is_empty() {
                tracing::warn!(title = %article.title, "listing item has no id, skipping");
                report.skipped += 1;
                continue;
            }
            match self
                .store
                .conditional_update(&article.id, &article.title, article.like_count)
                .await
            {
                Ok(WriteOutcome::Inserted) => {
                    tracing::info!(article_id = %article.id, like_count = article.like_count, "new article recorded");
                    report.inserted += 1;
                }
                Ok(WriteOutcome::Modified) => {
                    tracing::info!(article_id = %article.id, like_count = article.like_count, "like count changed");
                    report.modified += 1;
                }
                Err(e) if e.is_condition_not_met() => {
                    tracing::debug!(article_id = %article.id, "{}", e);
                    report.unchanged += 1;
                }
                Err(e) => {
                    self.logger.error(&format!("Failed to record {}: {}", article.id, e));
                    return Err(e);
                }
            }
        }

        self.logger.info(&format!(
            "{} articles fetched: {} new, {} changed, {} unchanged, {} skipped",
            report.fetched, report.inserted, report.modified, report.unchanged, report.skipped
        ));
        Ok(report)
    }
}
