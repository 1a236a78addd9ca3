use crate::{
    error::SyncError,
    metrics::SyncMetrics,
    retry::{RetryDisposition, RetryError, RetryPolicy},
};
use connectors::document::{
    base::{error::StoreError, store::DocumentStore},
    bson::Document,
};
use model::pagination::cursor::Cursor;
use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};
use tracing::{debug, info, warn};

/// Where a page lands in its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageWrite {
    /// Cursor the page was read after.
    pub after: Cursor,
    /// Empty the collection before inserting.
    pub reset: bool,
    /// Drop documents past `after` before inserting. Set for the first page
    /// of a resumed run, where an earlier run may have left unconfirmed rows.
    pub trim: bool,
}

impl PageWrite {
    pub fn after(cursor: Cursor) -> Self {
        Self {
            after: cursor,
            ..Self::default()
        }
    }

    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }
}

/// Outcome of writing one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadResult {
    /// Documents removed by the reset, when one happened.
    pub cleared: Option<u64>,
    pub inserted: usize,
}

/// Writes pages of documents into target collections.
#[derive(Clone)]
pub struct BatchLoader {
    store: Arc<dyn DocumentStore>,
    retry: RetryPolicy,
    metrics: SyncMetrics,
}

impl BatchLoader {
    pub fn new(store: Arc<dyn DocumentStore>, retry: RetryPolicy, metrics: SyncMetrics) -> Self {
        Self {
            store,
            retry,
            metrics,
        }
    }

    /// Clears the collection first when `write.reset` is set, then inserts
    /// the whole page in one batch. The acknowledged count must match the
    /// page size.
    ///
    /// An insert whose reply was lost may still have been applied, so every
    /// retry first removes what lies past `write.after`. Replaying a page
    /// never trips the unique `_id` index.
    pub async fn load_page(
        &self,
        collection: &str,
        documents: Vec<Document>,
        write: PageWrite,
    ) -> Result<LoadResult, SyncError> {
        let mut result = LoadResult::default();

        if write.reset {
            let deleted = self
                .with_retry("clear", collection, || self.store.clear(collection))
                .await?;
            info!(collection, deleted, "Target collection cleared");
            self.metrics.increment_cleared(1);
            result.cleared = Some(deleted);
        }

        if documents.is_empty() {
            return Ok(result);
        }

        let expected = documents.len();
        let after = write.after.ordinal().unwrap_or(0);
        let first_attempt = AtomicBool::new(true);
        let inserted = self
            .with_retry("insert_batch", collection, || {
                let retrying = !first_attempt.swap(false, Ordering::Relaxed);
                let trim = retrying || (write.trim && !write.reset);
                let documents = documents.clone();
                async move {
                    if trim {
                        let removed = self.store.remove_after(collection, after).await?;
                        if removed > 0 {
                            warn!(collection, removed, after, "Removed unconfirmed documents");
                        }
                    }
                    self.store.insert_batch(collection, documents).await
                }
            })
            .await?;

        if inserted != expected {
            return Err(SyncError::LoadCountMismatch {
                collection: collection.to_string(),
                expected,
                inserted,
            });
        }

        debug!(collection, inserted, "Page written");
        self.metrics.increment_documents(inserted as u64);
        result.inserted = inserted;
        Ok(result)
    }

    async fn with_retry<F, Fut, T>(
        &self,
        operation: &'static str,
        collection: &str,
        mut op: F,
    ) -> Result<T, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let attempts = AtomicU64::new(0);
        let outcome = self
            .retry
            .run(
                operation,
                || {
                    attempts.fetch_add(1, Ordering::Relaxed);
                    op()
                },
                |e: &StoreError| RetryDisposition::from_transient(e.is_transient()),
            )
            .await;

        let retries = attempts.load(Ordering::Relaxed).saturating_sub(1);
        if retries > 0 {
            self.metrics.increment_retries(retries);
        }

        outcome.map_err(|e: RetryError<StoreError>| {
            SyncError::target_failure(operation, collection, e.into_inner())
        })
    }
}
