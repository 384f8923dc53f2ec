//! Distribution data types.

use std::collections::BTreeMap;

use allotment_shared::config::DistributionConfig;
use allotment_shared::types::{BudgetSourceId, Money, WorkItemId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DistributionError;

/// Weight per work item for weighted distribution (`0 <= w <= 1`).
pub type WeightMap = BTreeMap<WorkItemId, Decimal>;

/// A budget-holding entity (Program/Project/Activity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSource {
    /// Budget source ID.
    pub id: BudgetSourceId,
    /// Display title.
    pub title: String,
    /// Declared total budget. `None` when planning has not set one yet.
    pub total_budget: Option<Money>,
}

impl BudgetSource {
    /// Creates a budget source with a fresh ID.
    #[must_use]
    pub fn new(title: impl Into<String>, total_budget: Option<Money>) -> Self {
        Self {
            id: BudgetSourceId::new(),
            title: title.into(),
            total_budget,
        }
    }

    /// Returns the budget if it is set and positive.
    pub fn require_budget(&self) -> Result<Money, DistributionError> {
        match self.total_budget {
            Some(budget) if budget.is_positive() => Ok(budget),
            budget => Err(DistributionError::InvalidBudget {
                budget_source_id: self.id,
                budget,
            }),
        }
    }
}

/// A unit of execution eligible to receive an allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Work item ID.
    pub id: WorkItemId,
    /// Budget source this item draws from.
    pub budget_source_id: BudgetSourceId,
    /// Parent work item, if nested.
    pub parent_id: Option<WorkItemId>,
    /// Display title.
    pub title: String,
    /// Allocated amount. `None` means unset.
    pub allocated_budget: Option<Money>,
}

impl WorkItem {
    /// Creates an unallocated work item under a budget source.
    #[must_use]
    pub fn new(budget_source_id: BudgetSourceId, title: impl Into<String>) -> Self {
        Self {
            id: WorkItemId::new(),
            budget_source_id,
            parent_id: None,
            title: title.into(),
            allocated_budget: None,
        }
    }

    /// Allocated amount, treating unset as zero.
    #[must_use]
    pub fn allocated_or_zero(&self) -> Money {
        self.allocated_budget.unwrap_or(Money::ZERO)
    }
}

/// How a distribution was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStrategy {
    /// Even split; the first item absorbs the rounding remainder.
    Equal,
    /// Split by weight; the last item (by id) absorbs the remainder.
    Weighted,
    /// Caller-supplied amounts.
    Manual,
}

impl DistributionStrategy {
    /// Whether distributions of this kind must match the budget exactly.
    ///
    /// Manual amounts come from outside and are only held to the rollup
    /// tolerance.
    #[must_use]
    pub const fn requires_exact_total(self) -> bool {
        matches!(self, Self::Equal | Self::Weighted)
    }
}

impl std::fmt::Display for DistributionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equal => write!(f, "equal"),
            Self::Weighted => write!(f, "weighted"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// A validated, not yet applied mapping of work item to amount.
///
/// Only the calculators and the manual validator construct this type, so a
/// value in hand has already passed validation. Applying it consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Distribution {
    budget_source_id: BudgetSourceId,
    strategy: DistributionStrategy,
    allocations: BTreeMap<WorkItemId, Money>,
    #[serde(skip)]
    total: Money,
}

impl Distribution {
    /// Fails with [`DistributionError::AmountOverflow`] if the allocations
    /// cannot be summed.
    pub(crate) fn new(
        budget_source_id: BudgetSourceId,
        strategy: DistributionStrategy,
        allocations: BTreeMap<WorkItemId, Money>,
    ) -> Result<Self, DistributionError> {
        let total = Money::checked_sum(allocations.values().copied())
            .ok_or(DistributionError::AmountOverflow { budget_source_id })?;
        Ok(Self {
            budget_source_id,
            strategy,
            allocations,
            total,
        })
    }

    /// Budget source this distribution was computed for.
    #[must_use]
    pub const fn budget_source_id(&self) -> BudgetSourceId {
        self.budget_source_id
    }

    /// Strategy that produced this distribution.
    #[must_use]
    pub const fn strategy(&self) -> DistributionStrategy {
        self.strategy
    }

    /// Amount assigned to a work item.
    #[must_use]
    pub fn get(&self, id: &WorkItemId) -> Option<Money> {
        self.allocations.get(id).copied()
    }

    /// Allocations ordered by work item id.
    pub fn iter(&self) -> impl Iterator<Item = (&WorkItemId, &Money)> {
        self.allocations.iter()
    }

    /// Allocations ordered by work item id.
    #[must_use]
    pub const fn allocations(&self) -> &BTreeMap<WorkItemId, Money> {
        &self.allocations
    }

    /// Number of work items covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    /// Returns true if no work items are covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// Sum of all allocations.
    #[must_use]
    pub const fn total(&self) -> Money {
        self.total
    }
}

/// Comparison of a source's declared budget against its children's allocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollupReport {
    /// Budget source ID.
    pub budget_source_id: BudgetSourceId,
    /// Declared budget (unset reads as zero).
    pub budget: Money,
    /// Sum of children's allocations (unset reads as zero).
    pub work_items_total: Money,
    /// Absolute difference.
    pub difference: Money,
    /// Whether the difference is within tolerance.
    pub is_valid: bool,
    /// Human-readable verdict.
    pub message: String,
}

/// Tolerances applied by the validator, applicator, and rollup reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributionPolicy {
    /// Allowed absolute difference for manual input and rollup checks.
    pub rollup_tolerance: Money,
    /// Allowed absolute deviation of a weight sum from 1.
    pub weight_sum_epsilon: Decimal,
}

impl DistributionPolicy {
    /// One cent.
    pub const ROLLUP_TOLERANCE: Money = Money::CENT;

    /// 0.0001.
    pub const WEIGHT_SUM_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 4);
}

impl Default for DistributionPolicy {
    fn default() -> Self {
        Self {
            rollup_tolerance: Self::ROLLUP_TOLERANCE,
            weight_sum_epsilon: Self::WEIGHT_SUM_EPSILON,
        }
    }
}

impl From<&DistributionConfig> for DistributionPolicy {
    /// Sub-cent tolerances are truncated to whole cents.
    fn from(config: &DistributionConfig) -> Self {
        Self {
            rollup_tolerance: Money::floor(config.rollup_tolerance.abs()).unwrap_or(Money::MAX),
            weight_sum_epsilon: config.weight_sum_epsilon.abs(),
        }
    }
}
