// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use sqlx::sqlite::SqlitePool;
use std::collections::HashSet;

use crate::models::{FactKey, FactRow};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    pub inserted: usize,
    pub skipped: usize,
}

/// The composite keys already present in the fact table, read once per run.
pub async fn existing_fact_keys(pool: &SqlitePool) -> Result<HashSet<FactKey>> {
    let rows = sqlx::query_as::<_, (i64, i64, i64)>(
        r#"
        SELECT date_key, base_currency_key, target_currency_key
        FROM fact_exchange_rate
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

pub async fn count_facts(pool: &SqlitePool) -> Result<i64> {
    let (count,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM fact_exchange_rate")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Insert the candidates whose key is not yet in the warehouse, in one
/// transaction. Existing rows are never touched, so re-running the whole
/// pipeline over the same data is a no-op.
pub async fn load_facts(pool: &SqlitePool, candidates: &[FactRow]) -> Result<LoadOutcome> {
    let mut present = existing_fact_keys(pool).await?;

    let mut to_insert = Vec::new();
    let mut skipped = 0usize;
    for fact in candidates {
        // `present` also absorbs keys staged this batch, guarding against
        // duplicates within the candidate set itself.
        if present.insert(fact.key()) {
            to_insert.push(fact);
        } else {
            skipped += 1;
        }
    }

    let mut tx = pool.begin().await?;
    for fact in &to_insert {
        sqlx::query(
            r#"
            INSERT INTO fact_exchange_rate (
                date_key, base_currency_key, target_currency_key, rate
            )
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(fact.date_key)
        .bind(fact.base_currency_key)
        .bind(fact.target_currency_key)
        .bind(fact.rate)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(LoadOutcome {
        inserted: to_insert.len(),
        skipped,
    })
}
