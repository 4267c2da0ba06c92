use iine_core::logging::Logger;
use iine_core::{ArticleSource, ArticleStore, ChangeRecord, InvocationResult, NotificationChannel, Result};
use serde::Serialize;
use std::sync::Arc;

use crate::formatter::{format_message, DEFAULT_MAX_TITLE_LENGTH};
use crate::reconciler::DiffReconciler;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// Not a like-count change
    Ignored,
    NoNewLikers { article_id: String },
    Notified { article_id: String, likers: Vec<String> },
    Failed { article_id: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifierResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub outcomes: Vec<RecordOutcome>,
}

impl NotifierResponse {
    pub fn invocation_result(&self) -> InvocationResult {
        InvocationResult {
            status_code: self.status_code,
        }
    }

    pub fn notified(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RecordOutcome::Notified { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RecordOutcome::Failed { .. }))
            .count()
    }
}

/// Handles one batch of change records, one record at a time.
pub struct Notifier {
    source: Arc<dyn ArticleSource>,
    channel: Arc<dyn NotificationChannel>,
    max_title_length: usize,
    logger: Logger,
}

impl Notifier {
    pub fn new(source: Arc<dyn ArticleSource>, channel: Arc<dyn NotificationChannel>) -> Self {
        Self {
            source,
            channel,
            max_title_length: DEFAULT_MAX_TITLE_LENGTH,
            logger: Logger::new("notifier"),
        }
    }

    pub fn with_max_title_length(mut self, max_title_length: usize) -> Self {
        self.max_title_length = max_title_length;
        self
    }

    /// A failing record is logged and recorded; the rest of the batch still
    /// runs. Any failure turns the batch status into 500.
    pub async fn handle(&self, batch: &[ChangeRecord]) -> NotifierResponse {
        let mut outcomes = Vec::with_capacity(batch.len());
        for record in batch {
            let outcome = match self.process(record).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let article_id = record_article_id(record);
                    self.logger
                        .clone()
                        .with_prefix(article_id.clone())
                        .error(&format!("notification failed: {}", e));
                    RecordOutcome::Failed {
                        article_id,
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let status = if outcomes.iter().any(|o| matches!(o, RecordOutcome::Failed { .. })) {
            InvocationResult::FAILED
        } else {
            InvocationResult::OK
        };
        let response = NotifierResponse {
            status_code: status.status_code,
            outcomes,
        };
        self.logger.info(&format!(
            "{} records: {} notified, {} failed",
            batch.len(),
            response.notified(),
            response.failed()
        ));
        response
    }

    /// Notify every pending change in `store`, `batch_size` records at a
    /// time. Failed records go back onto the feed once it is drained, so the
    /// next call retries them.
    pub async fn drain(&self, store: &dyn ArticleStore, batch_size: usize) -> Result<InvocationResult> {
        let mut retry = Vec::new();
        let drained = self.drain_into(store, batch_size.max(1), &mut retry).await;
        if !retry.is_empty() {
            self.logger
                .warn(&format!("{} records failed, returning them to the feed", retry.len()));
            store.requeue_changes(retry).await?;
        }
        drained
    }

    async fn drain_into(
        &self,
        store: &dyn ArticleStore,
        batch_size: usize,
        retry: &mut Vec<ChangeRecord>,
    ) -> Result<InvocationResult> {
        let mut status = InvocationResult::OK;
        loop {
            let batch = store.take_changes(batch_size).await?;
            if batch.is_empty() {
                return Ok(status);
            }
            let response = self.handle(&batch).await;
            if response.status_code != InvocationResult::OK.status_code {
                status = response.invocation_result();
            }
            retry.extend(
                batch
                    .into_iter()
                    .zip(&response.outcomes)
                    .filter(|(_, outcome)| matches!(outcome, RecordOutcome::Failed { .. }))
                    .map(|(record, _)| record),
            );
        }
    }

    async fn process(&self, record: &ChangeRecord) -> Result<RecordOutcome> {
        let diff = match DiffReconciler::new(self.source.as_ref()).reconcile(record).await? {
            Some(diff) => diff,
            None => return Ok(RecordOutcome::Ignored),
        };
        if diff.new_likers.is_empty() {
            tracing::debug!(article_id = %diff.article_id, "no new likers");
            return Ok(RecordOutcome::NoNewLikers {
                article_id: diff.article_id,
            });
        }

        let message = format_message(&diff, self.max_title_length);
        let delivery = self.channel.send(&message).await?;
        tracing::info!(
            article_id = %diff.article_id,
            likers = diff.new_likers.len(),
            status = delivery.status,
            "notification sent"
        );

        Ok(RecordOutcome::Notified {
            article_id: diff.article_id,
            likers: diff.new_likers,
        })
    }
}

fn record_article_id(record: &ChangeRecord) -> String {
    record
        .before
        .as_ref()
        .or(record.after.as_ref())
        .map(|r| r.id.clone())
        .unwrap_or_default()
}
