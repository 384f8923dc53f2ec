//! Repository abstractions for data access.
//!
//! Repositories implement the storage traits from `allotment-core`, hiding the
//! `SeaORM` implementation details from the distribution engine.

pub mod distribution;

pub use distribution::{SeaOrmAllocationScope, SeaOrmDistributionStore};
