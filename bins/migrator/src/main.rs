//! Database migration runner for Allotment.
//!
//! Creates and drops the `budget_sources` and `work_items` tables.
//!
//! Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! The connection string is read from `DATABASE_URL` (a `.env` file is honored).

use allotment_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The migration CLI installs its own tracing subscriber.
    cli::run_cli(Migrator).await;
}
