//! crane daemon
//!
//! Fleet host lifecycle service: a reconciler that turns the host catalog
//! into queued corrective actions, a pool of workers that carry them out,
//! and a small axum HTTP surface for reporting state and health.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crane_core::{DefaultReconciler, HostCatalog, ReconcileRunner, Worker};
use crane_store::ActionStore;

mod api;
mod config;
mod factory;
mod router;
mod state;

use config::{Config, LogFormat};
use state::AppState;

/// Fleet host lifecycle daemon
#[derive(Debug, Parser)]
#[command(name = "crane", version, about)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let (config, source) = match args.config {
        Some(path) => (Config::load(&path)?, Some(path)),
        None => Config::load_default()?,
    };
    init_tracing(&config);

    match &source {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => warn!("no config file found, using defaults"),
    }

    info!(bind = %config.daemon.bind, "crane daemon starting");

    let (hosts, queue) = factory::open_stores(&config.storage)?;
    let hosts = Arc::new(hosts);
    let queue: Arc<dyn ActionStore> = Arc::new(queue);
    let catalog = HostCatalog::new(hosts.clone());

    let seeded = factory::seed_hosts(&catalog, &config.host)?;
    info!(seeded, configured = config.host.len(), "host catalog seeded");

    factory::recover_stale(queue.as_ref(), config.worker.stale_after())?;

    let executor = factory::create_executor(&config.executor);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    if config.reconciler.enabled {
        let reconciler = Arc::new(DefaultReconciler::new(hosts.clone(), queue.clone()));
        let runner = ReconcileRunner::new(reconciler, config.reconciler.interval());
        let rx = shutdown_rx.clone();
        tasks.push(tokio::spawn(async move { runner.run(rx).await }));
    } else {
        info!("reconciler disabled");
    }

    for n in 0..config.worker.count {
        let worker = Worker::new(format!("worker-{n}"), queue.clone(), executor.clone());
        let worker_config = config.worker.clone();
        let rx = shutdown_rx.clone();
        tasks.push(tokio::spawn(async move { worker.run(&worker_config, rx).await }));
    }
    info!(workers = config.worker.count, executor = executor.executor_type(), "workers started");

    let state = Arc::new(AppState::new(catalog, queue));
    let app = router::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.daemon.bind).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down background loops");
    shutdown_tx.send(true)?;
    for task in tasks {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "background task panicked");
        }
    }

    info!("crane daemon stopped");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.daemon.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.daemon.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("received ctrl-c");
}
