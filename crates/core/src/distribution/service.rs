//! Distribution service: applies validated distributions and reports rollups.

use std::collections::BTreeMap;
use std::sync::Arc;

use allotment_shared::types::{BudgetSourceId, Money, WorkItemId};
use rust_decimal::Decimal;

use super::calculator::{distribute_equal, distribute_weighted_with_policy};
use super::error::DistributionError;
use super::provider::{AllocationScope, BudgetSourceProvider, WorkItemProvider};
use super::rollup::summarize;
use super::types::{
    BudgetSource, Distribution, DistributionPolicy, RollupReport, WeightMap, WorkItem,
};
use super::validator::{distribute_manual_with_policy, verify_for_apply};

/// Distribution service over pluggable storage.
pub struct DistributionService<S, W> {
    sources: Arc<S>,
    work_items: Arc<W>,
    policy: DistributionPolicy,
}

impl<S, W> DistributionService<S, W>
where
    S: BudgetSourceProvider,
    W: WorkItemProvider,
{
    /// Create a service with the default tolerances.
    #[must_use]
    pub fn new(sources: Arc<S>, work_items: Arc<W>) -> Self {
        Self::with_policy(sources, work_items, DistributionPolicy::default())
    }

    /// Create a service with explicit tolerances.
    #[must_use]
    pub fn with_policy(sources: Arc<S>, work_items: Arc<W>, policy: DistributionPolicy) -> Self {
        Self {
            sources,
            work_items,
            policy,
        }
    }

    /// Tolerances in effect.
    #[must_use]
    pub const fn policy(&self) -> &DistributionPolicy {
        &self.policy
    }

    /// Load a budget source by id.
    pub async fn budget_source(
        &self,
        id: BudgetSourceId,
    ) -> Result<BudgetSource, DistributionError> {
        self.sources.get(id).await
    }

    /// Equal distribution over all current children of `source`, in id order.
    pub async fn distribute_equal_for_source(
        &self,
        source: &BudgetSource,
    ) -> Result<Distribution, DistributionError> {
        let children = self.child_ids(source.id).await?;
        distribute_equal(source, &children)
    }

    /// Weighted distribution over all current children of `source`.
    pub async fn distribute_weighted_for_source(
        &self,
        source: &BudgetSource,
        weights: &WeightMap,
    ) -> Result<Distribution, DistributionError> {
        let children = self.child_ids(source.id).await?;
        distribute_weighted_with_policy(source, &children, weights, &self.policy)
    }

    /// Validate manual allocations against the current children of `source`.
    pub async fn distribute_manual_for_source(
        &self,
        source: &BudgetSource,
        allocations: &BTreeMap<WorkItemId, Decimal>,
    ) -> Result<Distribution, DistributionError> {
        let children = self.child_ids(source.id).await?;
        distribute_manual_with_policy(source, &children, allocations, &self.policy)
    }

    /// Write a distribution to the work items of `source`.
    ///
    /// All writes happen in one scope that holds the source exclusively. If the
    /// budget read under the lock differs from `source`, any write fails, or
    /// the projected rollup would be off, nothing is persisted. After commit the live rollup is checked again and a
    /// [`DistributionError::RollupMismatch`] is returned if it disagrees; the
    /// stored values are left as written.
    ///
    /// Returns the number of work items updated.
    pub async fn apply_distribution(
        &self,
        source: &BudgetSource,
        distribution: Distribution,
    ) -> Result<usize, DistributionError> {
        let budget = verify_for_apply(source, &distribution, &self.policy)?;

        let mut scope = self.work_items.begin(source.id).await?;
        let count = match self.write_allocations(&mut scope, source, &distribution, budget).await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(
                    budget_source_id = %source.id,
                    strategy = %distribution.strategy(),
                    error = %err,
                    "Rolling back distribution"
                );
                rollback_quietly(scope, source.id).await;
                return Err(err);
            }
        };
        scope.commit().await?;

        let report = self.validate_rollup(source).await?;
        if !report.is_valid {
            tracing::warn!(
                budget_source_id = %source.id,
                budget = %report.budget,
                work_items_total = %report.work_items_total,
                difference = %report.difference,
                "Rollup mismatch after applying distribution"
            );
            return Err(DistributionError::RollupMismatch {
                budget_source_id: source.id,
                expected: report.budget,
                actual: report.work_items_total,
                difference: report.difference,
            });
        }

        tracing::info!(
            budget_source_id = %source.id,
            strategy = %distribution.strategy(),
            count,
            total = %distribution.total(),
            "Applied distribution"
        );

        Ok(count)
    }

    /// Compare the source budget with the live sum of its children.
    pub async fn validate_rollup(
        &self,
        source: &BudgetSource,
    ) -> Result<RollupReport, DistributionError> {
        let children = self.work_items.children_of(source.id).await?;
        let report = summarize(source, &children, self.policy.rollup_tolerance);

        tracing::debug!(
            budget_source_id = %source.id,
            is_valid = report.is_valid,
            difference = %report.difference,
            "Validated rollup"
        );

        Ok(report)
    }

    /// Reset every child of `source` to an unset allocation.
    ///
    /// Returns the number of work items cleared.
    pub async fn clear_distribution(
        &self,
        source: &BudgetSource,
    ) -> Result<usize, DistributionError> {
        let mut scope = self.work_items.begin(source.id).await?;

        let cleared = match clear_all(&mut scope).await {
            Ok(cleared) => cleared,
            Err(err) => {
                tracing::warn!(
                    budget_source_id = %source.id,
                    error = %err,
                    "Rolling back clear"
                );
                rollback_quietly(scope, source.id).await;
                return Err(err);
            }
        };
        scope.commit().await?;

        tracing::info!(budget_source_id = %source.id, count = cleared, "Cleared distribution");
        Ok(cleared)
    }

    /// Live allocation of every child of `source`; unset reads as zero.
    pub async fn get_current_distribution(
        &self,
        source: &BudgetSource,
    ) -> Result<BTreeMap<WorkItemId, Money>, DistributionError> {
        let children = self.work_items.children_of(source.id).await?;
        Ok(children
            .iter()
            .map(|child| (child.id, child.allocated_or_zero()))
            .collect())
    }

    async fn child_ids(
        &self,
        budget_source_id: BudgetSourceId,
    ) -> Result<Vec<WorkItemId>, DistributionError> {
        let children = self.work_items.children_of(budget_source_id).await?;
        Ok(children.into_iter().map(|child| child.id).collect())
    }

    async fn write_allocations(
        &self,
        scope: &mut W::Scope,
        source: &BudgetSource,
        distribution: &Distribution,
        budget: Money,
    ) -> Result<usize, DistributionError> {
        let locked = scope.budget_source();
        if locked.total_budget != source.total_budget {
            return Err(DistributionError::BudgetChanged {
                budget_source_id: source.id,
                expected: source.total_budget,
                actual: locked.total_budget,
            });
        }

        let mut children: BTreeMap<WorkItemId, WorkItem> = scope
            .children()
            .await?
            .into_iter()
            .map(|child| (child.id, child))
            .collect();

        if let Some(unknown) = distribution
            .allocations()
            .keys()
            .find(|id| !children.contains_key(*id))
        {
            return Err(DistributionError::UnknownWorkItem {
                budget_source_id: source.id,
                work_item_id: *unknown,
            });
        }

        for (id, amount) in distribution.iter() {
            if let Some(child) = children.get_mut(id) {
                child.allocated_budget = Some(*amount);
                scope.save(child).await?;
            }
        }

        let projected = Money::checked_sum(children.values().map(WorkItem::allocated_or_zero))
            .ok_or(DistributionError::AmountOverflow {
                budget_source_id: source.id,
            })?;
        if !projected.within(budget, self.policy.rollup_tolerance) {
            return Err(DistributionError::RollupMismatch {
                budget_source_id: source.id,
                expected: budget,
                actual: projected,
                difference: (budget - projected).abs(),
            });
        }

        Ok(distribution.len())
    }
}

async fn clear_all<T: AllocationScope>(scope: &mut T) -> Result<usize, DistributionError> {
    let children = scope.children().await?;
    for mut child in children.iter().cloned() {
        child.allocated_budget = None;
        scope.save(&child).await?;
    }
    Ok(children.len())
}

async fn rollback_quietly<T: AllocationScope>(scope: T, budget_source_id: BudgetSourceId) {
    if let Err(err) = scope.rollback().await {
        tracing::error!(%budget_source_id, error = %err, "Rollback failed");
    }
}
