//! Property-based tests for the distribution calculators.
//!
//! - Equal and weighted distributions sum exactly to the budget
//! - Every allocation is non-negative
//! - Output is a pure function of its input

use std::collections::BTreeMap;

use allotment_shared::types::{Money, WorkItemId};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::calculator::{distribute_equal, distribute_weighted};
use super::types::{BudgetSource, WeightMap};
use super::validator::distribute_manual;

/// Strategy to generate positive budgets (0.01 to 10,000,000,000.00).
fn positive_cents() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000_000i64
}

/// Strategy to generate 1 to 60 distinct work item ids.
fn work_items() -> impl Strategy<Value = Vec<WorkItemId>> {
    prop::collection::btree_set(any::<u128>(), 1..60).prop_map(|ids| {
        ids.into_iter()
            .map(|n| WorkItemId::from_uuid(Uuid::from_u128(n)))
            .collect()
    })
}

/// Strategy to generate weights summing to exactly 1 at 4 decimal places.
fn weights_for(count: usize) -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(0u32..1_000, count).prop_map(|raw| {
        let total: u32 = raw.iter().sum();
        if total == 0 {
            let mut even = vec![Decimal::ZERO; raw.len()];
            even[0] = Decimal::ONE;
            return even;
        }
        let mut weights: Vec<Decimal> = raw
            .iter()
            .map(|v| (Decimal::from(*v) / Decimal::from(total)).trunc_with_scale(4))
            .collect();
        let assigned: Decimal = weights.iter().copied().sum();
        weights[0] += Decimal::ONE - assigned;
        weights
    })
}

fn source(cents: i64) -> BudgetSource {
    BudgetSource::new("Property PPA", Some(Money::from_cents(cents)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Equal distribution always sums exactly to the budget.
    #[test]
    fn prop_equal_sum_is_exact(cents in positive_cents(), items in work_items()) {
        let src = source(cents);
        let result = distribute_equal(&src, &items).unwrap();

        prop_assert_eq!(result.total(), Money::from_cents(cents));
        prop_assert_eq!(result.len(), items.len());
        prop_assert!(result.iter().all(|(_, amount)| !amount.is_negative()));
    }

    /// Non-first items in an equal split differ from each other by nothing.
    #[test]
    fn prop_equal_only_first_differs(cents in positive_cents(), items in work_items()) {
        let result = distribute_equal(&source(cents), &items).unwrap();
        let base = result.get(&items[items.len() - 1]);

        for id in &items[1..] {
            prop_assert_eq!(result.get(id), base);
        }
        prop_assert!(result.get(&items[0]) >= base);
    }

    /// Equal distribution is deterministic.
    #[test]
    fn prop_equal_deterministic(cents in positive_cents(), items in work_items()) {
        let src = source(cents);
        prop_assert_eq!(
            distribute_equal(&src, &items).unwrap(),
            distribute_equal(&src, &items).unwrap()
        );
    }

    /// Weighted distribution always sums exactly to the budget.
    #[test]
    fn prop_weighted_sum_is_exact(
        cents in positive_cents(),
        (items, weights) in work_items().prop_flat_map(|items| {
            let count = items.len();
            (Just(items), weights_for(count))
        }),
    ) {
        let map: WeightMap = items.iter().copied().zip(weights).collect();
        let result = distribute_weighted(&source(cents), &items, &map).unwrap();

        prop_assert_eq!(result.total(), Money::from_cents(cents));
        prop_assert!(result.iter().all(|(_, amount)| !amount.is_negative()));
    }

    /// Weighted distribution does not depend on caller order.
    #[test]
    fn prop_weighted_ignores_caller_order(
        cents in positive_cents(),
        (items, weights) in work_items().prop_flat_map(|items| {
            let count = items.len();
            (Just(items), weights_for(count))
        }),
    ) {
        let src = source(cents);
        let map: WeightMap = items.iter().copied().zip(weights).collect();
        let mut reversed = items.clone();
        reversed.reverse();

        prop_assert_eq!(
            distribute_weighted(&src, &items, &map).unwrap(),
            distribute_weighted(&src, &reversed, &map).unwrap()
        );
    }

    /// An equal distribution always passes manual validation unchanged.
    #[test]
    fn prop_equal_passes_manual_validation(cents in positive_cents(), items in work_items()) {
        let src = source(cents);
        let equal = distribute_equal(&src, &items).unwrap();
        let raw: BTreeMap<WorkItemId, Decimal> =
            equal.iter().map(|(id, amount)| (*id, amount.amount())).collect();

        let manual = distribute_manual(&src, &items, &raw).unwrap();
        prop_assert_eq!(manual.allocations(), equal.allocations());
    }
}
