//! Lifetime import counters for the /health endpoint.
//! Updated by the upload handler after each successful import.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Default)]
pub struct HealthState {
    /// Uploads that reached the store (including ones with rejected rows).
    pub imports: AtomicU64,
    pub rows_imported: AtomicU64,
    pub rows_rejected: AtomicU64,
    /// Unix milliseconds of the last successful import (0 = none).
    pub last_import_at_ms: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_import(&self, imported: usize, rejected: usize) {
        self.imports.fetch_add(1, Ordering::Relaxed);
        self.rows_imported.fetch_add(imported as u64, Ordering::Relaxed);
        self.rows_rejected.fetch_add(rejected as u64, Ordering::Relaxed);
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        self.last_import_at_ms.store(now_ms, Ordering::Relaxed);
    }

    pub fn imports(&self) -> u64 {
        self.imports.load(Ordering::Relaxed)
    }

    pub fn rows_imported(&self) -> u64 {
        self.rows_imported.load(Ordering::Relaxed)
    }

    pub fn rows_rejected(&self) -> u64 {
        self.rows_rejected.load(Ordering::Relaxed)
    }

    pub fn last_import_at_ms(&self) -> u64 {
        self.last_import_at_ms.load(Ordering::Relaxed)
    }
}
