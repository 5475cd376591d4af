// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File-backed response cache.
//!
//! Three namespaces under one root directory, one file per key:
//! - `activity/` holds activity lists keyed by `"{start}_{end}"` date ranges
//! - `trip/` holds trip detail records keyed by trip UUID
//! - `receipt/` holds raw receipt PDF bytes keyed by trip UUID
//!
//! Entries have no TTL: a present key is valid until [`CacheStore::clear`]
//! removes the whole root. A miss is an expected outcome (`Ok(None)`), never
//! an error; only real I/O failures propagate. Writes are best-effort from
//! the pipeline's point of view: callers log a failed `put` and keep going
//! with the in-memory data.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::{ActivityRecord, TripDetail};

const ACTIVITY_DIR: &str = "activity";
const TRIP_DIR: &str = "trip";
const RECEIPT_DIR: &str = "receipt";

/// Cache over a local directory tree.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

/// Per-namespace entry counts and on-disk footprint.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub activity_count: usize,
    pub trip_count: usize,
    pub receipt_count: usize,
    pub total_bytes: u64,
    /// Human-scaled total, e.g. `"1.46 MB"`
    pub total_size: String,
    pub root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build the activity-list cache key for a date range.
    pub fn range_key(start: chrono::NaiveDate, end: chrono::NaiveDate) -> String {
        format!("{}_{}", start, end)
    }

    // ─── Activity-list namespace ─────────────────────────────────────────

    pub async fn get_activities(&self, key: &str) -> Result<Option<Vec<ActivityRecord>>> {
        self.read_json(self.activity_path(key)).await
    }

    pub async fn put_activities(&self, key: &str, records: &[ActivityRecord]) -> Result<()> {
        self.write_json(self.activity_path(key), records).await
    }

    // ─── Trip-detail namespace ───────────────────────────────────────────

    pub async fn get_trip(&self, trip_uuid: &str) -> Result<Option<TripDetail>> {
        self.read_json(self.trip_path(trip_uuid)).await
    }

    pub async fn put_trip(&self, trip_uuid: &str, detail: &TripDetail) -> Result<()> {
        self.write_json(self.trip_path(trip_uuid), detail).await
    }

    // ─── Receipt-blob namespace ──────────────────────────────────────────

    pub async fn get_receipt(&self, trip_uuid: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.receipt_path(trip_uuid)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Cache(format!(
                "Failed to read cached receipt {}: {}",
                trip_uuid, e
            ))),
        }
    }

    pub async fn put_receipt(&self, trip_uuid: &str, bytes: &[u8]) -> Result<()> {
        self.ensure_dirs().await?;
        tokio::fs::write(self.receipt_path(trip_uuid), bytes)
            .await
            .map_err(|e| {
                AppError::Cache(format!("Failed to cache receipt {}: {}", trip_uuid, e))
            })
    }

    /// Path of the cached receipt blob for a trip (present or not).
    pub fn receipt_path(&self, trip_uuid: &str) -> PathBuf {
        self.root.join(RECEIPT_DIR).join(format!("{}.pdf", trip_uuid))
    }

    // ─── Maintenance ─────────────────────────────────────────────────────

    /// Count entries and sum file sizes across the namespaces.
    pub async fn stats(&self) -> Result<CacheStats> {
        self.ensure_dirs().await?;

        let (activity_count, activity_bytes) =
            scan_dir(self.root.join(ACTIVITY_DIR), "json").await?;
        let (trip_count, trip_bytes) = scan_dir(self.root.join(TRIP_DIR), "json").await?;
        let (receipt_count, receipt_bytes) = scan_dir(self.root.join(RECEIPT_DIR), "pdf").await?;

        let total_bytes = activity_bytes + trip_bytes + receipt_bytes;
        Ok(CacheStats {
            activity_count,
            trip_count,
            receipt_count,
            total_bytes,
            total_size: format_size(total_bytes),
            root: self.root.clone(),
        })
    }

    /// Remove the whole cache root, then recreate the empty namespace
    /// directories so subsequent calls need no missing-root special case.
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(AppError::Cache(format!(
                    "Failed to clear cache root {}: {}",
                    self.root.display(),
                    e
                )))
            }
        }
        self.ensure_dirs().await?;
        tracing::info!(root = %self.root.display(), "Cache cleared");
        Ok(())
    }

    /// Create the namespace directories if absent.
    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [ACTIVITY_DIR, TRIP_DIR, RECEIPT_DIR] {
            tokio::fs::create_dir_all(self.root.join(dir))
                .await
                .map_err(|e| {
                    AppError::Cache(format!("Failed to create cache directory {}: {}", dir, e))
                })?;
        }
        Ok(())
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn activity_path(&self, key: &str) -> PathBuf {
        self.root
            .join(ACTIVITY_DIR)
            .join(format!("{}_activity_cache.json", key))
    }

    fn trip_path(&self, trip_uuid: &str) -> PathBuf {
        self.root.join(TRIP_DIR).join(format!("{}.json", trip_uuid))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(&self, path: PathBuf) -> Result<Option<T>> {
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::Cache(format!(
                    "Failed to read cache entry {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_slice(&data).map(Some).map_err(|e| {
            AppError::Cache(format!(
                "Corrupt cache entry {}: {}",
                path.display(),
                e
            ))
        })
    }

    async fn write_json<T: serde::Serialize + ?Sized>(&self, path: PathBuf, value: &T) -> Result<()> {
        self.ensure_dirs().await?;
        let data = serde_json::to_vec_pretty(value)
            .map_err(|e| AppError::Cache(format!("Failed to serialize cache entry: {}", e)))?;
        tokio::fs::write(&path, data).await.map_err(|e| {
            AppError::Cache(format!(
                "Failed to write cache entry {}: {}",
                path.display(),
                e
            ))
        })
    }
}

/// Count files with `extension` and sum the size of every file in `dir`.
async fn scan_dir(dir: PathBuf, extension: &str) -> Result<(usize, u64)> {
    let mut entries = tokio::fs::read_dir(&dir)
        .await
        .map_err(|e| AppError::Cache(format!("Failed to scan {}: {}", dir.display(), e)))?;

    let mut count = 0usize;
    let mut bytes = 0u64;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::Cache(format!("Failed to scan {}: {}", dir.display(), e)))?
    {
        let Ok(meta) = entry.metadata().await else {
            continue; // unreadable entries are skipped, not fatal
        };
        if !meta.is_file() {
            continue;
        }
        bytes += meta.len();
        if entry.path().extension().is_some_and(|e| e == extension) {
            count += 1;
        }
    }
    Ok((count, bytes))
}

/// Human-scaled size string: 1024-based units, rounded to two decimals.
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = (bytes as f64 / 1024f64.powi(exp as i32) * 100.0).round() / 100.0;
    format!("{} {}", value, UNITS[exp])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1_499_000), "1.43 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3 GB");
    }

    #[test]
    fn test_range_key_format() {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = chrono::NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(CacheStore::range_key(start, end), "2024-01-01_2024-01-31");
    }
}
