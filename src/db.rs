// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePool, Sqlite};

use crate::error::EtlError;

/// Connect to the warehouse, creating the database file and running the
/// schema migrations on first use. The pool is acquired once per run and
/// closed by the caller when the run ends. Connectivity failures are
/// fatal.
pub async fn create_db_pool(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        Sqlite::create_database(db_url)
            .await
            .map_err(EtlError::Warehouse)?;
    }

    let pool = SqlitePool::connect(db_url)
        .await
        .map_err(EtlError::Warehouse)?;
    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
pub async fn create_test_pool() -> Result<SqlitePool> {
    create_db_pool("sqlite::memory:").await
}
