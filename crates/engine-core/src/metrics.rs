use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    rows_read: AtomicU64,
    documents_written: AtomicU64,
    pages_loaded: AtomicU64,
    collections_cleared: AtomicU64,
    retries: AtomicU64,
    failed_mappings: AtomicU64,
}

/// Run-wide counters shared by every mapping pipeline.
#[derive(Debug, Clone)]
pub struct SyncMetrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Source rows whose page was confirmed by the target.
    pub rows_read: u64,
    pub documents_written: u64,
    pub pages_loaded: u64,
    pub collections_cleared: u64,
    pub retries: u64,
    pub failed_mappings: u64,
}

impl SyncMetrics {
    pub fn new() -> Self {
        SyncMetrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_rows(&self, count: u64) {
        self.inner.rows_read.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_documents(&self, count: u64) {
        self.inner
            .documents_written
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_pages(&self, count: u64) {
        self.inner.pages_loaded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_cleared(&self, count: u64) {
        self.inner
            .collections_cleared
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_retries(&self, count: u64) {
        self.inner.retries.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_failures(&self, count: u64) {
        self.inner.failed_mappings.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_read: self.inner.rows_read.load(Ordering::Relaxed),
            documents_written: self.inner.documents_written.load(Ordering::Relaxed),
            pages_loaded: self.inner.pages_loaded.load(Ordering::Relaxed),
            collections_cleared: self.inner.collections_cleared.load(Ordering::Relaxed),
            retries: self.inner.retries.load(Ordering::Relaxed),
            failed_mappings: self.inner.failed_mappings.load(Ordering::Relaxed),
        }
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}
