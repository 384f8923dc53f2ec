//! Distribution error types.
//!
//! Validation errors are raised before any storage mutation and leave no side
//! effects. Consistency errors are raised when stored totals disagree with what
//! was just written; they are never corrected automatically.

use allotment_shared::AppError;
use allotment_shared::types::{BudgetSourceId, Money, WorkItemId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Broad classification of a [`DistributionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller input is wrong. Nothing was written.
    Validation,
    /// Stored rollup disagrees with the source budget.
    Consistency,
    /// A collaborator failed. Any open scope was rolled back.
    Storage,
}

/// Errors that can occur while computing, validating, or applying a distribution.
#[derive(Debug, Error)]
pub enum DistributionError {
    // ========== Validation Errors ==========
    /// Budget source has no budget, or a budget that is not positive.
    #[error("Budget source {budget_source_id} has invalid budget: {}", display_budget(.budget))]
    InvalidBudget {
        /// The budget source.
        budget_source_id: BudgetSourceId,
        /// The budget found on the source.
        budget: Option<Money>,
    },

    /// No work items to distribute across.
    #[error("Cannot distribute budget of {budget_source_id}: no work items provided")]
    EmptyTargetSet {
        /// The budget source.
        budget_source_id: BudgetSourceId,
    },

    /// The same work item was listed more than once.
    #[error("Work item {0} is listed more than once")]
    DuplicateWorkItem(WorkItemId),

    /// Weight keys do not match the work item set one-to-one.
    #[error(
        "Weights do not match work items (missing: [{}], extra: [{}])",
        join_ids(.missing),
        join_ids(.extra)
    )]
    WeightSetMismatch {
        /// Work items without a weight.
        missing: Vec<WorkItemId>,
        /// Weights for ids that are not in the work item set.
        extra: Vec<WorkItemId>,
    },

    /// Weights do not sum to 1.
    #[error("Weights must sum to 1.0, got {sum}")]
    InvalidWeightSum {
        /// The computed weight sum.
        sum: Decimal,
    },

    /// A weight is below zero.
    #[error("Invalid weight for {work_item_id}: {weight}. Weights must be non-negative")]
    NegativeWeight {
        /// The offending work item.
        work_item_id: WorkItemId,
        /// The weight supplied.
        weight: Decimal,
    },

    /// A distribution would assign a negative amount.
    #[error("Work item {work_item_id} would receive a negative amount: {amount}")]
    NegativeAllocation {
        /// The offending work item.
        work_item_id: WorkItemId,
        /// The amount that would be assigned.
        amount: Money,
    },

    /// An allocation amount is not a valid non-negative monetary value.
    #[error("Invalid allocation for {work_item_id}: {value} ({reason})")]
    InvalidAmount {
        /// The offending work item.
        work_item_id: WorkItemId,
        /// The raw value supplied.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A work item id could not be parsed.
    #[error("Invalid work item id: {0}")]
    InvalidWorkItemId(String),

    /// A work item is not a child of the budget source.
    #[error("Work item {work_item_id} is not a child of budget source {budget_source_id}")]
    UnknownWorkItem {
        /// The budget source.
        budget_source_id: BudgetSourceId,
        /// The unknown work item.
        work_item_id: WorkItemId,
    },

    /// Allocations do not add up to the budget.
    #[error("Allocations total ({actual}) does not match budget ({expected}). Difference: {difference}")]
    SumMismatch {
        /// The source budget.
        expected: Money,
        /// The allocation total.
        actual: Money,
        /// Absolute difference.
        difference: Money,
    },

    /// Allocations add up to more than the largest representable amount.
    #[error("Allocations for budget source {budget_source_id} exceed the representable amount range")]
    AmountOverflow {
        /// The budget source.
        budget_source_id: BudgetSourceId,
    },

    /// The budget changed between computing a distribution and locking the source.
    #[error(
        "Budget of {budget_source_id} changed from {} to {} before the distribution was applied",
        display_budget(.expected),
        display_budget(.actual)
    )]
    BudgetChanged {
        /// The budget source.
        budget_source_id: BudgetSourceId,
        /// The budget the distribution was checked against.
        expected: Option<Money>,
        /// The budget found under the lock.
        actual: Option<Money>,
    },

    /// Distribution was computed for a different budget source.
    #[error("Distribution belongs to budget source {actual}, not {expected}")]
    SourceMismatch {
        /// The budget source being applied to.
        expected: BudgetSourceId,
        /// The budget source the distribution was computed for.
        actual: BudgetSourceId,
    },

    /// Budget source not found.
    #[error("Budget source not found: {0}")]
    BudgetSourceNotFound(BudgetSourceId),

    // ========== Consistency Errors ==========
    /// Work item rollup disagrees with the budget after writing.
    #[error(
        "Budget rollup validation failed for {budget_source_id}. Budget: {expected}, work item total: {actual}, difference: {difference}"
    )]
    RollupMismatch {
        /// The budget source.
        budget_source_id: BudgetSourceId,
        /// The source budget.
        expected: Money,
        /// The live sum of work item allocations.
        actual: Money,
        /// Absolute difference.
        difference: Money,
    },

    // ========== Storage Errors ==========
    /// A collaborator failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

fn display_budget(budget: &Option<Money>) -> String {
    budget.map_or_else(|| "unset".to_string(), |b| b.to_string())
}

fn join_ids(ids: &[WorkItemId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl DistributionError {
    /// Create a storage error.
    #[must_use]
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Returns the broad classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RollupMismatch { .. } => ErrorKind::Consistency,
            Self::Storage(_) => ErrorKind::Storage,
            _ => ErrorKind::Validation,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidBudget { .. } => "INVALID_BUDGET",
            Self::EmptyTargetSet { .. } => "EMPTY_TARGET_SET",
            Self::DuplicateWorkItem(_) => "DUPLICATE_WORK_ITEM",
            Self::WeightSetMismatch { .. } => "WEIGHT_SET_MISMATCH",
            Self::InvalidWeightSum { .. } => "INVALID_WEIGHT_SUM",
            Self::NegativeWeight { .. } => "NEGATIVE_WEIGHT",
            Self::NegativeAllocation { .. } => "NEGATIVE_ALLOCATION",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::InvalidWorkItemId(_) => "INVALID_WORK_ITEM_ID",
            Self::UnknownWorkItem { .. } => "UNKNOWN_WORK_ITEM",
            Self::SumMismatch { .. } => "SUM_MISMATCH",
            Self::AmountOverflow { .. } => "AMOUNT_OVERFLOW",
            Self::BudgetChanged { .. } => "BUDGET_CHANGED",
            Self::SourceMismatch { .. } => "SOURCE_MISMATCH",
            Self::BudgetSourceNotFound(_) => "BUDGET_SOURCE_NOT_FOUND",
            Self::RollupMismatch { .. } => "ROLLUP_MISMATCH",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<DistributionError> for AppError {
    fn from(err: DistributionError) -> Self {
        match (&err, err.kind()) {
            (DistributionError::BudgetSourceNotFound(_), _) => Self::NotFound(err.to_string()),
            (_, ErrorKind::Validation) => Self::Validation(err.to_string()),
            (_, ErrorKind::Consistency) => Self::Consistency(err.to_string()),
            (_, ErrorKind::Storage) => Self::Database(err.to_string()),
        }
    }
}
