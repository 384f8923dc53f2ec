//! Core business logic for Allotment.
//!
//! This crate contains the budget distribution engine with ZERO web or database
//! dependencies. Storage is reached through the traits in
//! [`distribution::provider`]; the db crate implements them for PostgreSQL.
//!
//! # Modules
//!
//! - `distribution` - Equal, weighted, and manual distribution of a budget
//!   source across its work items, plus atomic apply and rollup checks

pub mod distribution;
