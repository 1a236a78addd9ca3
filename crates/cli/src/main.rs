use crate::{
    commands::Commands,
    conn::{ConnectionPinger, MongoPinger, SqlServerPinger},
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use engine_config::settings::{
    encoding, load_settings, render_settings, save_settings, writeback::apply_report,
};
use engine_core::listener::TracingListener;
use engine_runtime::execution::{executor, options::RunOptions, probe};
use model::mapping::TableName;
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "sqltomongo",
    version = "0.1.0",
    about = "Incremental SQL Server to MongoDB sync"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so JSON written to stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let shutdown = ShutdownCoordinator::new();
    shutdown.register_handlers();

    let code = match run(cli.command, &shutdown).await {
        Ok(()) => ExitCode::Success,
        Err(CliError::ShutdownRequested) => {
            warn!("Stopped before completion, confirmed progress was kept");
            ExitCode::ShutdownRequested
        }
        Err(err) => {
            error!(error = %err, "Command failed");
            eprintln!("Error: {err}");
            ExitCode::GeneralError
        }
    };

    std::process::exit(code.as_i32());
}

async fn run(command: Commands, shutdown: &ShutdownCoordinator) -> Result<(), CliError> {
    match command {
        Commands::Sync {
            config,
            encoded,
            tables,
            parallel,
            report,
            no_save,
        } => {
            let options = RunOptions::default()
                .with_parallelism(parallel)
                .with_tables(tables);
            sync(config, encoded, options, report, no_save, shutdown).await
        }
        Commands::TestConn { source, target } => {
            if let Some(conn_str) = source {
                println!("{}", SqlServerPinger { conn_str }.ping().await?);
            }
            if let Some(uri) = target {
                println!("{}", MongoPinger { uri }.ping().await?);
            }
            Ok(())
        }
        Commands::Tables {
            source,
            target,
            output,
            encoded,
        } => {
            let keyed = probe::keyed_tables(&source).await?;
            info!(tables = keyed.len(), "Found tables with a primary key");
            let settings = probe::scaffold_settings(&source, &target, &keyed);
            let content = render_settings(&settings, encoded)?;
            output::emit(&content, output.as_deref()).await
        }
        Commands::Schema { source, table } => {
            let table: TableName = table.parse()?;
            let schema = probe::table_schema(&source, &table).await?;
            output::print_json(&schema)
        }
        Commands::Encode { config, output } => {
            let xml = tokio::fs::read_to_string(&config).await?;
            output::emit(&encoding::encode(&xml), output.as_deref()).await
        }
        Commands::Decode { input, output } => {
            let encoded = tokio::fs::read_to_string(&input).await?;
            output::emit(&encoding::decode(&encoded)?, output.as_deref()).await
        }
    }
}

async fn sync(
    config: PathBuf,
    encoded: bool,
    options: RunOptions,
    report_path: Option<PathBuf>,
    no_save: bool,
    shutdown: &ShutdownCoordinator,
) -> Result<(), CliError> {
    let mut settings = load_settings(&config, encoded)?;

    let report = executor::translate(
        &settings,
        options,
        Arc::new(TracingListener),
        shutdown.cancel_token(),
    )
    .await?;

    if let Some(path) = report_path {
        output::write_report(&report, &path).await?;
    }
    output::print_summary(&report);

    if !no_save {
        let updated = apply_report(&mut settings, &report);
        if updated > 0 {
            save_settings(&config, &settings, encoded)?;
            info!(updated, "Cursors written back");
        }
    }

    if report.cancelled || shutdown.is_shutdown_requested() {
        return Err(CliError::ShutdownRequested);
    }

    let failed = report.failed().count();
    if failed > 0 {
        return Err(CliError::MappingsFailed {
            failed,
            total: report.mappings.len(),
        });
    }
    Ok(())
}
