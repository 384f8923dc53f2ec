//! Rollup checks between a budget source and its children.

use allotment_shared::types::Money;

use super::types::{BudgetSource, RollupReport, WorkItem};

/// Compare a source's budget against the sum of its children's allocations.
///
/// Unset budgets and unset allocations both count as zero. The report is
/// valid when the absolute difference is at most `tolerance`. Totals that
/// overflow are reported as [`Money::MAX`].
#[must_use]
pub fn summarize(source: &BudgetSource, children: &[WorkItem], tolerance: Money) -> RollupReport {
    let budget = source.total_budget.unwrap_or(Money::ZERO);
    let work_items_total = Money::checked_sum(children.iter().map(WorkItem::allocated_or_zero));
    let difference = work_items_total
        .and_then(|total| budget.checked_sub(total))
        .map_or(Money::MAX, Money::abs);
    let work_items_total = work_items_total.unwrap_or(Money::MAX);
    let is_valid = difference <= tolerance;

    let message = if is_valid {
        "Budget rollup is valid".to_string()
    } else {
        format!(
            "Work items total ({work_items_total}) does not match budget ({budget}). Difference: {difference}"
        )
    };

    RollupReport {
        budget_source_id: source.id,
        budget,
        work_items_total,
        difference,
        is_valid,
        message,
    }
}
