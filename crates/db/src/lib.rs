//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for budget sources and work items
//! - A PostgreSQL implementation of the distribution storage traits
//! - Database migrations
//!
//! Embedding applications connect with [`connect_with`] using the
//! `database` section of the application configuration.

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::SeaOrmDistributionStore;

use allotment_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection using application configuration.
///
/// Intended for embedding applications, together with
/// [`AppConfig::load`](allotment_shared::config::AppConfig::load).
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);

    tracing::debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connecting to database"
    );
    Database::connect(options).await
}
