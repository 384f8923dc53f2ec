//! PostgreSQL-backed storage for the distribution engine.
//!
//! Write scopes are database transactions that start by locking the budget
//! source row (`SELECT ... FOR UPDATE`), so concurrent applies and clears on the
//! same source are serialized by PostgreSQL.

use allotment_core::distribution::{
    AllocationScope, BudgetSource, BudgetSourceProvider, DistributionError, WorkItem,
    WorkItemProvider,
};
use allotment_shared::types::{BudgetSourceId, Money, WorkItemId};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{budget_sources, work_items};

/// Distribution store backed by `SeaORM`.
#[derive(Debug, Clone)]
pub struct SeaOrmDistributionStore {
    db: DatabaseConnection,
}

impl SeaOrmDistributionStore {
    /// Creates a new store.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a budget source.
    pub async fn create_budget_source(&self, source: &BudgetSource) -> Result<(), DistributionError> {
        let now = Utc::now().into();
        budget_sources::ActiveModel {
            id: Set(source.id.into_inner()),
            title: Set(source.title.clone()),
            total_budget: Set(source.total_budget.map(Decimal::from)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(storage)?;
        Ok(())
    }

    /// Insert a work item.
    pub async fn create_work_item(&self, item: &WorkItem) -> Result<(), DistributionError> {
        let now = Utc::now().into();
        work_items::ActiveModel {
            id: Set(item.id.into_inner()),
            budget_source_id: Set(item.budget_source_id.into_inner()),
            parent_id: Set(item.parent_id.map(WorkItemId::into_inner)),
            title: Set(item.title.clone()),
            allocated_budget: Set(item.allocated_budget.map(Decimal::from)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(storage)?;
        Ok(())
    }

    /// Look up a single work item.
    pub async fn work_item(&self, id: WorkItemId) -> Result<Option<WorkItem>, DistributionError> {
        work_items::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?
            .map(to_work_item)
            .transpose()
    }
}

impl BudgetSourceProvider for SeaOrmDistributionStore {
    async fn get(&self, id: BudgetSourceId) -> Result<BudgetSource, DistributionError> {
        let model = budget_sources::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?
            .ok_or(DistributionError::BudgetSourceNotFound(id))?;
        to_budget_source(model)
    }
}

impl WorkItemProvider for SeaOrmDistributionStore {
    type Scope = SeaOrmAllocationScope;

    async fn children_of(
        &self,
        budget_source_id: BudgetSourceId,
    ) -> Result<Vec<WorkItem>, DistributionError> {
        load_children(&self.db, budget_source_id).await
    }

    async fn begin(
        &self,
        budget_source_id: BudgetSourceId,
    ) -> Result<SeaOrmAllocationScope, DistributionError> {
        let txn = self.db.begin().await.map_err(storage)?;

        let locked = budget_sources::Entity::find_by_id(budget_source_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(storage)?;
        let Some(locked) = locked else {
            txn.rollback().await.map_err(storage)?;
            return Err(DistributionError::BudgetSourceNotFound(budget_source_id));
        };
        let source = to_budget_source(locked)?;

        tracing::debug!(%budget_source_id, "Locked budget source");
        Ok(SeaOrmAllocationScope { txn, source })
    }
}

/// A transaction holding the row lock on one budget source.
///
/// Dropping it without committing rolls the transaction back.
pub struct SeaOrmAllocationScope {
    txn: DatabaseTransaction,
    source: BudgetSource,
}

impl AllocationScope for SeaOrmAllocationScope {
    fn budget_source(&self) -> &BudgetSource {
        &self.source
    }

    async fn children(&mut self) -> Result<Vec<WorkItem>, DistributionError> {
        load_children(&self.txn, self.source.id).await
    }

    async fn save(&mut self, item: &WorkItem) -> Result<(), DistributionError> {
        let model = work_items::Entity::find_by_id(item.id.into_inner())
            .filter(work_items::Column::BudgetSourceId.eq(self.source.id.into_inner()))
            .one(&self.txn)
            .await
            .map_err(storage)?
            .ok_or(DistributionError::UnknownWorkItem {
                budget_source_id: self.source.id,
                work_item_id: item.id,
            })?;

        let mut active: work_items::ActiveModel = model.into();
        active.allocated_budget = Set(item.allocated_budget.map(Decimal::from));
        active.updated_at = Set(Utc::now().into());
        active.update(&self.txn).await.map_err(storage)?;
        Ok(())
    }

    async fn commit(self) -> Result<(), DistributionError> {
        self.txn.commit().await.map_err(storage)
    }

    async fn rollback(self) -> Result<(), DistributionError> {
        self.txn.rollback().await.map_err(storage)
    }
}

async fn load_children<C: ConnectionTrait>(
    conn: &C,
    budget_source_id: BudgetSourceId,
) -> Result<Vec<WorkItem>, DistributionError> {
    work_items::Entity::find()
        .filter(work_items::Column::BudgetSourceId.eq(budget_source_id.into_inner()))
        .order_by_asc(work_items::Column::Id)
        .all(conn)
        .await
        .map_err(storage)?
        .into_iter()
        .map(to_work_item)
        .collect()
}

fn to_budget_source(model: budget_sources::Model) -> Result<BudgetSource, DistributionError> {
    Ok(BudgetSource {
        id: BudgetSourceId::from_uuid(model.id),
        title: model.title,
        total_budget: model.total_budget.map(to_money).transpose()?,
    })
}

fn to_work_item(model: work_items::Model) -> Result<WorkItem, DistributionError> {
    Ok(WorkItem {
        id: WorkItemId::from_uuid(model.id),
        budget_source_id: BudgetSourceId::from_uuid(model.budget_source_id),
        parent_id: model.parent_id.map(WorkItemId::from_uuid),
        title: model.title,
        allocated_budget: model.allocated_budget.map(to_money).transpose()?,
    })
}

fn to_money(amount: Decimal) -> Result<Money, DistributionError> {
    Money::new(amount).map_err(|e| DistributionError::storage(format!("stored amount: {e}")))
}

fn storage(err: DbErr) -> DistributionError {
    DistributionError::storage(err.to_string())
}
