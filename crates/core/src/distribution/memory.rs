//! In-memory implementation of the storage collaborators.
//!
//! Writes go through an [`InMemoryScope`] that holds a per-source async mutex,
//! so concurrent applies to one source are serialized while different sources
//! proceed in parallel.

use std::collections::BTreeMap;
use std::sync::Arc;

use allotment_shared::types::{BudgetSourceId, Money, WorkItemId};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::error::DistributionError;
use super::provider::{AllocationScope, BudgetSourceProvider, WorkItemProvider};
use super::types::{BudgetSource, WorkItem};

#[derive(Debug, Default)]
struct Inner {
    sources: RwLock<BTreeMap<BudgetSourceId, BudgetSource>>,
    items: RwLock<BTreeMap<WorkItemId, WorkItem>>,
    locks: DashMap<BudgetSourceId, Arc<Mutex<()>>>,
}

/// Budget sources and work items held in process memory.
///
/// Cloning shares the underlying data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a budget source.
    pub async fn insert_source(&self, source: BudgetSource) {
        self.inner.sources.write().await.insert(source.id, source);
    }

    /// Insert or replace a work item.
    pub async fn insert_work_item(&self, item: WorkItem) {
        self.inner.items.write().await.insert(item.id, item);
    }

    /// Look up a single work item.
    pub async fn work_item(&self, id: WorkItemId) -> Option<WorkItem> {
        self.inner.items.read().await.get(&id).cloned()
    }

    fn lock_for(&self, budget_source_id: BudgetSourceId) -> Arc<Mutex<()>> {
        self.inner
            .locks
            .entry(budget_source_id)
            .or_default()
            .value()
            .clone()
    }
}

impl Inner {
    async fn children_of(&self, budget_source_id: BudgetSourceId) -> Vec<WorkItem> {
        self.items
            .read()
            .await
            .values()
            .filter(|item| item.budget_source_id == budget_source_id)
            .cloned()
            .collect()
    }
}

impl BudgetSourceProvider for InMemoryStore {
    async fn get(&self, id: BudgetSourceId) -> Result<BudgetSource, DistributionError> {
        self.inner
            .sources
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(DistributionError::BudgetSourceNotFound(id))
    }
}

impl WorkItemProvider for InMemoryStore {
    type Scope = InMemoryScope;

    async fn children_of(
        &self,
        budget_source_id: BudgetSourceId,
    ) -> Result<Vec<WorkItem>, DistributionError> {
        Ok(self.inner.children_of(budget_source_id).await)
    }

    async fn begin(
        &self,
        budget_source_id: BudgetSourceId,
    ) -> Result<InMemoryScope, DistributionError> {
        if !self.inner.sources.read().await.contains_key(&budget_source_id) {
            return Err(DistributionError::BudgetSourceNotFound(budget_source_id));
        }

        let guard = self.lock_for(budget_source_id).lock_owned().await;
        let source = self.get(budget_source_id).await?;
        Ok(InMemoryScope {
            inner: Arc::clone(&self.inner),
            source,
            staged: BTreeMap::new(),
            _guard: guard,
        })
    }
}

/// Exclusive write scope over one budget source in an [`InMemoryStore`].
#[derive(Debug)]
pub struct InMemoryScope {
    inner: Arc<Inner>,
    source: BudgetSource,
    staged: BTreeMap<WorkItemId, Option<Money>>,
    _guard: OwnedMutexGuard<()>,
}

impl AllocationScope for InMemoryScope {
    fn budget_source(&self) -> &BudgetSource {
        &self.source
    }

    async fn children(&mut self) -> Result<Vec<WorkItem>, DistributionError> {
        let mut children = self.inner.children_of(self.source.id).await;
        for child in &mut children {
            if let Some(staged) = self.staged.get(&child.id) {
                child.allocated_budget = *staged;
            }
        }
        Ok(children)
    }

    async fn save(&mut self, item: &WorkItem) -> Result<(), DistributionError> {
        let belongs = self
            .inner
            .items
            .read()
            .await
            .get(&item.id)
            .is_some_and(|stored| stored.budget_source_id == self.source.id);
        if !belongs {
            return Err(DistributionError::UnknownWorkItem {
                budget_source_id: self.source.id,
                work_item_id: item.id,
            });
        }

        self.staged.insert(item.id, item.allocated_budget);
        Ok(())
    }

    async fn commit(self) -> Result<(), DistributionError> {
        let mut items = self.inner.items.write().await;
        for (id, allocated_budget) in &self.staged {
            if let Some(item) = items.get_mut(id) {
                item.allocated_budget = *allocated_budget;
            }
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), DistributionError> {
        Ok(())
    }
}
