//! Storage collaborators for the distribution service.
//!
//! These traits are implemented by the db crate for PostgreSQL and by
//! [`InMemoryStore`](super::memory::InMemoryStore) for tests and embedding.

use std::future::Future;

use allotment_shared::types::BudgetSourceId;

use super::error::DistributionError;
use super::types::{BudgetSource, WorkItem};

/// Read access to budget sources.
pub trait BudgetSourceProvider: Send + Sync {
    /// Fetch a budget source.
    ///
    /// Returns [`DistributionError::BudgetSourceNotFound`] if it does not exist.
    fn get(
        &self,
        id: BudgetSourceId,
    ) -> impl Future<Output = Result<BudgetSource, DistributionError>> + Send;
}

/// Access to the work items under a budget source.
pub trait WorkItemProvider: Send + Sync {
    /// Scope type returned by [`WorkItemProvider::begin`].
    type Scope: AllocationScope;

    /// Direct children of a budget source, ordered by id.
    fn children_of(
        &self,
        budget_source_id: BudgetSourceId,
    ) -> impl Future<Output = Result<Vec<WorkItem>, DistributionError>> + Send;

    /// Open an exclusive write scope on a budget source.
    ///
    /// Only one scope per budget source may be open at a time; a second call
    /// waits until the first is committed, rolled back, or dropped.
    fn begin(
        &self,
        budget_source_id: BudgetSourceId,
    ) -> impl Future<Output = Result<Self::Scope, DistributionError>> + Send;
}

/// An all-or-nothing batch of work item writes under one budget source.
///
/// Writes made through [`save`](AllocationScope::save) become visible to other
/// readers only on [`commit`](AllocationScope::commit). Dropping a scope
/// without committing discards them.
pub trait AllocationScope: Send {
    /// The budget source as read after the lock was taken.
    fn budget_source(&self) -> &BudgetSource;

    /// Children of the locked source as seen inside this scope.
    fn children(
        &mut self,
    ) -> impl Future<Output = Result<Vec<WorkItem>, DistributionError>> + Send;

    /// Stage a work item's allocation.
    fn save(
        &mut self,
        item: &WorkItem,
    ) -> impl Future<Output = Result<(), DistributionError>> + Send;

    /// Make all staged writes visible and release the lock.
    fn commit(self) -> impl Future<Output = Result<(), DistributionError>> + Send;

    /// Discard all staged writes and release the lock.
    fn rollback(self) -> impl Future<Output = Result<(), DistributionError>> + Send;
}
