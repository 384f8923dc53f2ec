//! Equal and weighted distribution calculators.
//!
//! Both calculators round every per-item amount toward zero to cents and hand
//! the leftover to one designated item, so the distributed total always equals
//! the budget exactly:
//! - equal: the first item in caller order absorbs the remainder
//! - weighted: the last item in id order receives `budget - running_total`

use std::collections::{BTreeMap, BTreeSet};

use allotment_shared::types::{Money, WorkItemId};
use rust_decimal::Decimal;

use super::error::DistributionError;
use super::types::{BudgetSource, Distribution, DistributionPolicy, DistributionStrategy, WeightMap};
use super::validator::ensure_exact_total;

/// Distribute a source's budget equally across work items.
///
/// `work_items` must be in a stable order (for example sorted by id); the
/// first entry receives the rounding remainder.
///
/// # Example
///
/// ```
/// use allotment_core::distribution::{BudgetSource, distribute_equal};
/// use allotment_shared::types::{Money, WorkItemId};
///
/// let source = BudgetSource::new("PPA", Some(Money::from_cents(10_000)));
/// let items = [WorkItemId::new(), WorkItemId::new(), WorkItemId::new()];
///
/// let distribution = distribute_equal(&source, &items).unwrap();
/// assert_eq!(distribution.get(&items[0]), Some(Money::from_cents(3_334)));
/// assert_eq!(distribution.total(), Money::from_cents(10_000));
/// ```
pub fn distribute_equal(
    source: &BudgetSource,
    work_items: &[WorkItemId],
) -> Result<Distribution, DistributionError> {
    let budget = source.require_budget()?;
    ensure_targets(source, work_items)?;

    let count = work_items.len();
    let base = budget
        .split_floor(count)
        .ok_or(DistributionError::EmptyTargetSet {
            budget_source_id: source.id,
        })?;
    let remainder = budget - base.times(count);

    let allocations: BTreeMap<WorkItemId, Money> = work_items
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let amount = if i == 0 { base + remainder } else { base };
            (*id, amount)
        })
        .collect();

    let distribution = Distribution::new(source.id, DistributionStrategy::Equal, allocations)?;
    ensure_exact_total(budget, &distribution)?;

    tracing::debug!(
        budget_source_id = %source.id,
        count,
        %base,
        %remainder,
        "Computed equal distribution"
    );

    Ok(distribution)
}

/// Distribute a source's budget by weight using the default epsilon.
///
/// # Example
///
/// ```
/// use allotment_core::distribution::{BudgetSource, WeightMap, distribute_weighted};
/// use allotment_shared::types::{Money, WorkItemId};
/// use rust_decimal_macros::dec;
///
/// let source = BudgetSource::new("PPA", Some(Money::from_cents(10_000_000)));
/// let (a, b) = (WorkItemId::new(), WorkItemId::new());
/// let weights = WeightMap::from([(a, dec!(0.6)), (b, dec!(0.4))]);
///
/// let distribution = distribute_weighted(&source, &[a, b], &weights).unwrap();
/// assert_eq!(distribution.total(), Money::from_cents(10_000_000));
/// ```
pub fn distribute_weighted(
    source: &BudgetSource,
    work_items: &[WorkItemId],
    weights: &WeightMap,
) -> Result<Distribution, DistributionError> {
    distribute_weighted_with_policy(source, work_items, weights, &DistributionPolicy::default())
}

/// Distribute a source's budget by weight.
///
/// Weights must cover exactly the work item set, be non-negative, and sum to
/// 1 within `policy.weight_sum_epsilon`. Items are processed in id order;
/// every item except the last receives `floor(budget * weight)`, and the last
/// receives what is left.
pub fn distribute_weighted_with_policy(
    source: &BudgetSource,
    work_items: &[WorkItemId],
    weights: &WeightMap,
    policy: &DistributionPolicy,
) -> Result<Distribution, DistributionError> {
    let budget = source.require_budget()?;
    let targets = ensure_targets(source, work_items)?;

    let missing: Vec<WorkItemId> = targets
        .iter()
        .filter(|id| !weights.contains_key(*id))
        .copied()
        .collect();
    let extra: Vec<WorkItemId> = weights
        .keys()
        .filter(|id| !targets.contains(*id))
        .copied()
        .collect();
    if !missing.is_empty() || !extra.is_empty() {
        return Err(DistributionError::WeightSetMismatch { missing, extra });
    }

    if let Some((id, weight)) = weights.iter().find(|(_, w)| **w < Decimal::ZERO) {
        return Err(DistributionError::NegativeWeight {
            work_item_id: *id,
            weight: *weight,
        });
    }

    let sum: Decimal = weights.values().copied().sum();
    if (sum - Decimal::ONE).abs() > policy.weight_sum_epsilon {
        return Err(DistributionError::InvalidWeightSum { sum });
    }

    // `targets` is a BTreeSet, so iteration is already in id order.
    let last_index = targets.len() - 1;
    let overflow = || DistributionError::AmountOverflow {
        budget_source_id: source.id,
    };
    let mut running_total = Money::ZERO;
    let mut allocations = BTreeMap::new();

    for (i, id) in targets.iter().enumerate() {
        let amount = if i == last_index {
            let remainder = budget - running_total;
            if remainder.is_negative() {
                return Err(DistributionError::NegativeAllocation {
                    work_item_id: *id,
                    amount: remainder,
                });
            }
            remainder
        } else {
            let amount = budget.mul_floor(weights[id]).ok_or_else(overflow)?;
            running_total = running_total.checked_add(amount).ok_or_else(overflow)?;
            amount
        };
        allocations.insert(*id, amount);
    }

    let distribution = Distribution::new(source.id, DistributionStrategy::Weighted, allocations)?;
    ensure_exact_total(budget, &distribution)?;

    tracing::debug!(
        budget_source_id = %source.id,
        count = distribution.len(),
        %sum,
        "Computed weighted distribution"
    );

    Ok(distribution)
}

/// Checks the target list is non-empty and duplicate-free.
fn ensure_targets(
    source: &BudgetSource,
    work_items: &[WorkItemId],
) -> Result<BTreeSet<WorkItemId>, DistributionError> {
    if work_items.is_empty() {
        return Err(DistributionError::EmptyTargetSet {
            budget_source_id: source.id,
        });
    }

    let mut seen = BTreeSet::new();
    for id in work_items {
        if !seen.insert(*id) {
            return Err(DistributionError::DuplicateWorkItem(*id));
        }
    }
    Ok(seen)
}
