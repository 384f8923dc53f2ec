//! Budget distribution across work items.
//!
//! This module implements:
//! - Equal and weighted distribution calculators
//! - Manual allocation validation
//! - Atomic application of a distribution to storage
//! - Rollup checks between a budget source and its children
//! - Storage collaborator traits with an in-memory implementation

pub mod calculator;
pub mod error;
pub mod memory;
pub mod provider;
pub mod rollup;
pub mod service;
pub mod types;
pub mod validator;

#[cfg(test)]
mod props;

pub use calculator::{distribute_equal, distribute_weighted, distribute_weighted_with_policy};
pub use error::{DistributionError, ErrorKind};
pub use memory::{InMemoryScope, InMemoryStore};
pub use provider::{AllocationScope, BudgetSourceProvider, WorkItemProvider};
pub use rollup::summarize;
pub use service::DistributionService;
pub use types::{
    BudgetSource, Distribution, DistributionPolicy, DistributionStrategy, RollupReport, WeightMap,
    WorkItem,
};
pub use validator::{
    distribute_manual, distribute_manual_with_policy, parse_manual_allocations, verify_for_apply,
};
