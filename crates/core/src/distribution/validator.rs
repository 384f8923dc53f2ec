//! Manual distribution validation and pre-apply checks.
//!
//! Manual allocations are supplied by a person, so they are only held to the
//! rollup tolerance. Generated distributions are checked for exact equality.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use allotment_shared::types::{Money, WorkItemId};
use rust_decimal::Decimal;

use super::error::DistributionError;
use super::types::{BudgetSource, Distribution, DistributionPolicy, DistributionStrategy};

/// Validate caller-supplied allocations using the default tolerance.
///
/// See [`distribute_manual_with_policy`].
pub fn distribute_manual(
    source: &BudgetSource,
    children: &[WorkItemId],
    allocations: &BTreeMap<WorkItemId, Decimal>,
) -> Result<Distribution, DistributionError> {
    distribute_manual_with_policy(source, children, allocations, &DistributionPolicy::default())
}

/// Validate caller-supplied allocations against a budget source.
///
/// Checks, in order:
/// 1. the source has a positive budget and at least one allocation is given
/// 2. every amount is a non-negative value with at most two decimals
/// 3. every id is one of `children`
/// 4. the total is within `policy.rollup_tolerance` of the budget
///
/// Children without an entry are left out of the distribution; applying it
/// does not touch them.
pub fn distribute_manual_with_policy(
    source: &BudgetSource,
    children: &[WorkItemId],
    allocations: &BTreeMap<WorkItemId, Decimal>,
    policy: &DistributionPolicy,
) -> Result<Distribution, DistributionError> {
    let budget = source.require_budget()?;

    if allocations.is_empty() {
        return Err(DistributionError::EmptyTargetSet {
            budget_source_id: source.id,
        });
    }

    let mut validated = BTreeMap::new();
    let mut running_total = Money::ZERO;
    for (id, amount) in allocations {
        let money = Money::new(*amount).map_err(|e| DistributionError::InvalidAmount {
            work_item_id: *id,
            value: amount.to_string(),
            reason: e.to_string(),
        })?;
        if money.is_negative() {
            return Err(DistributionError::InvalidAmount {
                work_item_id: *id,
                value: amount.to_string(),
                reason: "allocations must be non-negative".to_string(),
            });
        }
        running_total =
            running_total
                .checked_add(money)
                .ok_or_else(|| DistributionError::InvalidAmount {
                    work_item_id: *id,
                    value: amount.to_string(),
                    reason: "allocations total exceeds the representable range".to_string(),
                })?;
        validated.insert(*id, money);
    }

    let known: BTreeSet<&WorkItemId> = children.iter().collect();
    if let Some(unknown) = validated.keys().find(|id| !known.contains(id)) {
        return Err(DistributionError::UnknownWorkItem {
            budget_source_id: source.id,
            work_item_id: *unknown,
        });
    }

    let distribution = Distribution::new(source.id, DistributionStrategy::Manual, validated)?;
    ensure_within_tolerance(budget, distribution.total(), policy.rollup_tolerance)?;

    tracing::debug!(
        budget_source_id = %source.id,
        count = distribution.len(),
        total = %distribution.total(),
        "Validated manual distribution"
    );

    Ok(distribution)
}

/// Parse untrusted `(work item id, amount)` text pairs, e.g. from a form post.
///
/// Amounts are parsed as decimals only; range and precision checks happen in
/// [`distribute_manual`].
pub fn parse_manual_allocations<I, K, V>(
    raw: I,
) -> Result<BTreeMap<WorkItemId, Decimal>, DistributionError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut parsed = BTreeMap::new();
    for (raw_id, raw_amount) in raw {
        let raw_id = raw_id.as_ref().trim();
        let id = WorkItemId::from_str(raw_id)
            .map_err(|_| DistributionError::InvalidWorkItemId(raw_id.to_string()))?;

        let raw_amount = raw_amount.as_ref().trim();
        let amount = Decimal::from_str(raw_amount).map_err(|e| DistributionError::InvalidAmount {
            work_item_id: id,
            value: raw_amount.to_string(),
            reason: e.to_string(),
        })?;

        if parsed.insert(id, amount).is_some() {
            return Err(DistributionError::DuplicateWorkItem(id));
        }
    }
    Ok(parsed)
}

/// Re-check a distribution immediately before it is written.
///
/// Equal and weighted distributions must still match the budget exactly;
/// manual ones are held to `policy.rollup_tolerance`. Returns the source
/// budget on success.
pub fn verify_for_apply(
    source: &BudgetSource,
    distribution: &Distribution,
    policy: &DistributionPolicy,
) -> Result<Money, DistributionError> {
    let budget = source.require_budget()?;

    if distribution.budget_source_id() != source.id {
        return Err(DistributionError::SourceMismatch {
            expected: source.id,
            actual: distribution.budget_source_id(),
        });
    }

    if distribution.is_empty() {
        return Err(DistributionError::EmptyTargetSet {
            budget_source_id: source.id,
        });
    }

    if let Some((id, amount)) = distribution.iter().find(|(_, amount)| amount.is_negative()) {
        return Err(DistributionError::NegativeAllocation {
            work_item_id: *id,
            amount: *amount,
        });
    }

    if distribution.strategy().requires_exact_total() {
        ensure_exact_total(budget, distribution)?;
    } else {
        ensure_within_tolerance(budget, distribution.total(), policy.rollup_tolerance)?;
    }
    Ok(budget)
}

/// Require a generated distribution to match the budget exactly.
pub(crate) fn ensure_exact_total(
    budget: Money,
    distribution: &Distribution,
) -> Result<(), DistributionError> {
    ensure_within_tolerance(budget, distribution.total(), Money::ZERO)
}

fn ensure_within_tolerance(
    budget: Money,
    total: Money,
    tolerance: Money,
) -> Result<(), DistributionError> {
    if total.within(budget, tolerance) {
        return Ok(());
    }
    Err(DistributionError::SumMismatch {
        expected: budget,
        actual: total,
        difference: total.checked_sub(budget).map_or(Money::MAX, Money::abs),
    })
}
