use connectors::sql::base::{adapter::SqlAdapter, error::DbError};
use engine_core::{
    cursor::{CursorTracker, PageStep},
    error::SyncError,
    listener::{PageEvent, SyncListener},
    loader::{BatchLoader, PageWrite},
    mapper::map_page,
    metrics::SyncMetrics,
    report::{MappingReport, MappingStatus},
    retry::{RetryDisposition, RetryPolicy},
    schema::SchemaIntrospector,
};
use model::{core::schema::ColumnSchema, mapping::TableMapping};
use planner::query::page::build_page_query;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

/// Everything a mapping needs that outlives it: one per run.
#[derive(Clone)]
pub struct PipelineContext {
    pub source: Arc<dyn SqlAdapter>,
    pub introspector: SchemaIntrospector,
    pub loader: BatchLoader,
    pub retry: RetryPolicy,
    pub metrics: SyncMetrics,
    pub listener: Arc<dyn SyncListener>,
    pub cancel: CancellationToken,
}

#[derive(Debug)]
enum MappingState {
    Init,
    SchemaDiscovered(ColumnSchema),
    Paging {
        schema: ColumnSchema,
        step: PageStep,
    },
    Done,
    Failed(SyncError),
    Cancelled,
}

impl MappingState {
    fn name(&self) -> &'static str {
        match self {
            MappingState::Init => "Init",
            MappingState::SchemaDiscovered(_) => "SchemaDiscovered",
            MappingState::Paging { .. } => "Paging",
            MappingState::Done => "Done",
            MappingState::Failed(_) => "Failed",
            MappingState::Cancelled => "Cancelled",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            MappingState::Done | MappingState::Failed(_) | MappingState::Cancelled
        )
    }
}

/// Copies one table into one collection, page by page.
pub struct MappingPipeline<'a> {
    ctx: &'a PipelineContext,
    mapping: &'a TableMapping,
    tracker: CursorTracker,
    report: MappingReport,
}

impl<'a> MappingPipeline<'a> {
    pub fn new(ctx: &'a PipelineContext, mapping: &'a TableMapping) -> Self {
        let table = mapping.source_table.to_string();
        Self {
            ctx,
            mapping,
            tracker: CursorTracker::new(&table, mapping.last_sync_cursor),
            report: MappingReport {
                source_table: table,
                target_collection: mapping.target_collection.clone(),
                status: MappingStatus::Done,
                rows_copied: 0,
                pages: 0,
                start_cursor: mapping.last_sync_cursor,
                final_cursor: mapping.last_sync_cursor,
                reset: false,
                error: None,
                error_kind: None,
                duration_ms: 0,
            },
        }
    }

    pub async fn run(self) -> MappingReport {
        let span = info_span!(
            "mapping",
            table = %self.mapping.source_table,
            collection = %self.mapping.target_collection
        );
        self.drive().instrument(span).await
    }

    async fn drive(mut self) -> MappingReport {
        let started = Instant::now();
        self.ctx.listener.mapping_started(self.mapping);

        let mut state = MappingState::Init;
        while !state.is_terminal() {
            let from = state.name();
            state = self.advance(state).await;
            debug!(from, to = state.name(), "Mapping state changed");
        }

        match state {
            MappingState::Failed(err) => {
                self.ctx.metrics.increment_failures(1);
                self.report.fail(&err);
            }
            MappingState::Cancelled => {
                warn!(cursor = %self.report.final_cursor, "Mapping cancelled");
                self.report.status = MappingStatus::Cancelled;
            }
            _ => self.report.status = MappingStatus::Done,
        }

        self.report.duration_ms = started.elapsed().as_millis() as u64;
        self.ctx.listener.mapping_finished(&self.report);
        self.report
    }

    async fn advance(&mut self, state: MappingState) -> MappingState {
        match state {
            MappingState::Init => {
                if self.ctx.cancel.is_cancelled() {
                    return MappingState::Cancelled;
                }
                match self.ctx.introspector.discover(&self.mapping.source_table).await {
                    Ok(schema) if schema.is_empty() => {
                        info!("Table has no columns, nothing to copy");
                        MappingState::Done
                    }
                    Ok(schema) => MappingState::SchemaDiscovered(schema),
                    Err(err) => MappingState::Failed(err),
                }
            }
            MappingState::SchemaDiscovered(schema) => MappingState::Paging {
                schema,
                step: PageStep::start(self.tracker.start()),
            },
            MappingState::Paging { schema, step } => {
                if self.ctx.cancel.is_cancelled() {
                    return MappingState::Cancelled;
                }
                match self.load_next_page(&schema, step).await {
                    Ok((step, true)) => MappingState::Paging { schema, step },
                    Ok((_, false)) => MappingState::Done,
                    Err(err) => MappingState::Failed(err),
                }
            }
            terminal => terminal,
        }
    }

    /// Fetches, maps and writes the page after `step.cursor`. Returns the new
    /// step and whether another page may follow (the page was full).
    async fn load_next_page(
        &mut self,
        schema: &ColumnSchema,
        step: PageStep,
    ) -> Result<(PageStep, bool), SyncError> {
        let mapping = self.mapping;
        let table = self.report.source_table.as_str();
        let primary_key = mapping.primary_key_column.as_deref();

        let query = build_page_query(
            schema,
            primary_key,
            mapping.page_size,
            &mapping.source_table,
            &step.cursor,
        )?;

        let attempts = AtomicU64::new(0);
        let rows = self
            .ctx
            .retry
            .run(
                "fetch_page",
                || {
                    attempts.fetch_add(1, Ordering::Relaxed);
                    self.ctx.source.fetch_page(&query)
                },
                |e: &DbError| RetryDisposition::from_transient(e.is_transient()),
            )
            .await
            .map_err(|e| SyncError::source_failure("fetch_page", table, e.into_inner()))?;
        let retries = attempts.load(Ordering::Relaxed).saturating_sub(1);
        if retries > 0 {
            self.ctx.metrics.increment_retries(retries);
        }

        let documents = map_page(schema, &rows, primary_key)?;
        let next = self.tracker.next_cursor(step, &rows)?;
        let reset = self.tracker.requires_reset(self.report.pages);
        let write = PageWrite::after(step.cursor)
            .with_reset(reset)
            .with_trim(self.report.pages == 0);

        self.ctx
            .loader
            .load_page(&mapping.target_collection, documents, write)
            .await?;

        // The page is confirmed: only now does the cursor move.
        self.ctx.metrics.increment_rows(rows.len() as u64);
        self.report.reset |= reset;
        self.report.final_cursor = next.cursor;
        self.report.rows_copied = next.rows_seen;

        if !rows.is_empty() {
            self.report.pages += 1;
            self.ctx.metrics.increment_pages(1);
            self.ctx.listener.page_loaded(&PageEvent {
                collection: mapping.target_collection.clone(),
                page: self.report.pages,
                rows: rows.len(),
                cursor: next.cursor,
                reset,
            });
        }

        Ok((next, rows.len() == mapping.page_size.get()))
    }
}
