// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use crate::error::EtlError;
use crate::models::RawRateRecord;

/// Append-only store of raw API responses, one record per date, persisted
/// as a JSON array. Downstream stages only ever read it; every append
/// rewrites the whole file, so an interrupted run leaves a valid cache
/// with the dates fetched so far.
pub struct CacheStore {
    path: PathBuf,
    records: Vec<RawRateRecord>,
    dates: HashSet<NaiveDate>,
}

impl CacheStore {
    /// Open the cache at `path`. A missing file is an empty cache; an
    /// unreadable one starts clean (matching the fetch scripts this store
    /// replaces), with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating cache directory {}", parent.display()))?;
        }

        let records: Vec<RawRateRecord> = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(records) => records,
                Err(e) => {
                    eprintln!(
                        "⚠️  cache file {} is not valid JSON ({}), starting clean",
                        path.display(),
                        e
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading cache file {}", path.display()))
            }
        };

        let dates = records.iter().map(|r| r.date).collect();
        Ok(Self {
            path,
            records,
            dates,
        })
    }

    pub fn has(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    /// Append one record and persist. Fails if the cache already holds a
    /// record for that date.
    pub fn append(&mut self, record: RawRateRecord) -> Result<()> {
        if self.has(record.date) {
            return Err(EtlError::DuplicateCacheEntry(record.date).into());
        }
        self.dates.insert(record.date);
        self.records.push(record);
        self.persist()
    }

    /// All cached records ordered by date ascending. Side-effect free and
    /// repeatable.
    pub fn read_all(&self) -> Vec<RawRateRecord> {
        let mut records = self.records.clone();
        records.sort_by_key(|r| r.date);
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn persist(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, contents)
            .with_context(|| format!("writing cache file {}", self.path.display()))?;
        Ok(())
    }
}
