use async_trait::async_trait;
use iine_core::{ArticleRecord, ArticleStore, ChangeRecord, Error, Result, WriteOutcome};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::{StorageBackend, StoreConfig};

#[derive(Debug, Default)]
struct MemoryState {
    records: BTreeMap<String, ArticleRecord>,
    changes: VecDeque<ChangeRecord>,
}

impl MemoryState {
    fn conditional_update(&mut self, id: &str, title: &str, like_count: u64) -> Result<WriteOutcome> {
        let after = ArticleRecord::new(id, title, like_count);
        let (outcome, change) = match self.records.get(id) {
            Some(existing) if existing.like_count == like_count => {
                return Err(Error::ConditionNotMet(format!(
                    "{} already has {} likes",
                    id, like_count
                )));
            }
            Some(existing) => (WriteOutcome::Modified, ChangeRecord::modify(existing.clone(), after.clone())),
            None => (WriteOutcome::Inserted, ChangeRecord::insert(after.clone())),
        };
        self.records.insert(id.to_string(), after);
        self.changes.push_back(change);
        Ok(outcome)
    }

    fn take_changes(&mut self, max: usize) -> Vec<ChangeRecord> {
        let n = max.min(self.changes.len());
        self.changes.drain(..n).collect()
    }
}

/// Process-local store; the check and the write share one write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of change records not yet consumed.
    pub async fn pending_changes(&self) -> usize {
        self.state.read().await.changes.len()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStore {
    fn name() -> &'static str {
        "memory"
    }

    async fn open(_config: &StoreConfig) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStore for InMemoryStore {
    async fn conditional_update(&self, id: &str, title: &str, like_count: u64) -> Result<WriteOutcome> {
        let mut state = self.state.write().await;
        state.conditional_update(id, title, like_count)
    }

    async fn get(&self, id: &str) -> Result<Option<ArticleRecord>> {
        let state = self.state.read().await;
        Ok(state.records.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<ArticleRecord>> {
        let state = self.state.read().await;
        Ok(state.records.values().cloned().collect())
    }

    async fn take_changes(&self, max: usize) -> Result<Vec<ChangeRecord>> {
        let mut state = self.state.write().await;
        Ok(state.take_changes(max))
    }

    async fn requeue_changes(&self, changes: Vec<ChangeRecord>) -> Result<()> {
        let mut state = self.state.write().await;
        state.changes.extend(changes);
        Ok(())
    }
}
