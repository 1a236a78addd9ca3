use crate::execution::{
    factory,
    options::RunOptions,
    pipeline::{MappingPipeline, PipelineContext},
};
use chrono::Utc;
use connectors::{
    document::base::store::DocumentStore,
    sql::{base::adapter::SqlAdapter, mssql::version::ServerVersion},
};
use engine_core::{
    error::SyncError,
    listener::{SyncListener, TracingListener},
    loader::BatchLoader,
    metrics::SyncMetrics,
    report::{MappingReport, MappingStatus, RunReport},
    schema::SchemaIntrospector,
};
use futures::{StreamExt, stream};
use model::mapping::{SyncSettings, TableMapping};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

/// Connects to both ends named in `settings` and runs every selected mapping.
///
/// Missing connection strings, an unreachable source and an unsupported
/// source version abort the run before any mapping starts. Failures inside a
/// mapping are recorded in its report and the run moves on.
pub async fn translate(
    settings: &SyncSettings,
    options: RunOptions,
    listener: Arc<dyn SyncListener>,
    cancel: CancellationToken,
) -> Result<RunReport, SyncError> {
    validate(settings, &options)?;

    let source =
        factory::connect_source(&settings.source_connection, options.max_parallel_mappings).await?;
    let version = factory::verify_source_version(source.as_ref(), &options.retry).await?;
    let target = factory::connect_target(&settings.target_connection).await?;

    SyncEngine::new(source, target)
        .with_options(options)
        .with_listener(listener)
        .with_cancellation(cancel)
        .execute(settings, version)
        .await
}

fn validate(settings: &SyncSettings, options: &RunOptions) -> Result<(), SyncError> {
    settings.check_connections()?;
    settings.check_mappings()?;

    if let Some(tables) = &options.tables {
        for name in tables {
            if !settings.mappings.iter().any(|m| m.source_table.matches(name)) {
                warn!(table = %name, "Requested table has no mapping");
            }
        }
    }
    Ok(())
}

/// Sync engine bound to an open source and target.
pub struct SyncEngine {
    source: Arc<dyn SqlAdapter>,
    target: Arc<dyn DocumentStore>,
    options: RunOptions,
    listener: Arc<dyn SyncListener>,
    cancel: CancellationToken,
}

impl SyncEngine {
    pub fn new(source: Arc<dyn SqlAdapter>, target: Arc<dyn DocumentStore>) -> Self {
        Self {
            source,
            target,
            options: RunOptions::default(),
            listener: Arc::new(TracingListener),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn SyncListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Validates settings, checks the source version and runs the mappings.
    pub async fn run(&self, settings: &SyncSettings) -> Result<RunReport, SyncError> {
        validate(settings, &self.options)?;
        let version =
            factory::verify_source_version(self.source.as_ref(), &self.options.retry).await?;
        self.execute(settings, version).await
    }

    async fn execute(
        &self,
        settings: &SyncSettings,
        version: ServerVersion,
    ) -> Result<RunReport, SyncError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("sync_run", %run_id);
        self.execute_mappings(settings, run_id, version)
            .instrument(span)
            .await
    }

    async fn execute_mappings(
        &self,
        settings: &SyncSettings,
        run_id: Uuid,
        version: ServerVersion,
    ) -> Result<RunReport, SyncError> {
        let started_at = Utc::now();
        self.listener.run_started(run_id, &version.to_string());

        let metrics = SyncMetrics::new();
        let ctx = PipelineContext {
            source: self.source.clone(),
            introspector: SchemaIntrospector::new(self.source.clone(), self.options.retry.clone()),
            loader: BatchLoader::new(self.target.clone(), self.options.retry.clone(), metrics.clone()),
            retry: self.options.retry.clone(),
            metrics: metrics.clone(),
            listener: self.listener.clone(),
            cancel: self.cancel.clone(),
        };

        let mappings = settings.mappings_to_run(self.options.tables.as_deref());
        let parallelism = self.options.max_parallel_mappings.max(1);
        info!(mappings = mappings.len(), parallelism, "Running mappings");

        let mut reports: Vec<(usize, MappingReport)> = stream::iter(mappings.into_iter().enumerate())
            .map(|(idx, mapping)| {
                let ctx = &ctx;
                async move { (idx, run_mapping(ctx, mapping).await) }
            })
            .buffer_unordered(parallelism)
            .collect()
            .await;
        reports.sort_by_key(|(idx, _)| *idx);

        let mappings: Vec<MappingReport> = reports.into_iter().map(|(_, report)| report).collect();
        let cancelled = self.cancel.is_cancelled()
            || mappings.iter().any(|m| m.status == MappingStatus::Cancelled);

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            source_version: version.to_string(),
            total_rows: mappings.iter().map(|m| m.rows_copied).sum(),
            mappings,
            cancelled,
            metrics: metrics.snapshot(),
        };

        self.listener.run_finished(&report);
        Ok(report)
    }
}

async fn run_mapping(ctx: &PipelineContext, mapping: &TableMapping) -> MappingReport {
    MappingPipeline::new(ctx, mapping).run().await
}
