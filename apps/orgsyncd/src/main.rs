//! orgsyncd: reconciles LDAP groups and users into Gitea.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use orgsync_config::Config;

mod app;
mod logging;
mod scheduler;

use app::App;
use scheduler::{CycleRunner, Scheduler};

#[tokio::main]
async fn main() {
    logging::init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        cron_enabled = config.cron_enabled,
        full_sync = config.sync.full_sync,
        "Starting orgsyncd"
    );

    let cron_enabled = config.cron_enabled;
    let cron_timer = config.cron_timer.clone();
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);

    let app = match App::new(config) {
        Ok(app) => Arc::new(app),
        Err(e) => {
            eprintln!("Failed to initialize: {e}");
            std::process::exit(1);
        }
    };

    if !cron_enabled {
        match app.run_cycle().await {
            Ok(report) => {
                info!(mutated = report.mutated(), "Cycle complete, exiting");
            }
            Err(e) => {
                error!(error = %e, "Reconciliation cycle failed");
                std::process::exit(1);
            }
        }
        return;
    }

    // The schedule must parse before anything touches the network.
    let scheduler = match Scheduler::new(&cron_timer, app.clone(), shutdown_timeout) {
        Ok(scheduler) => scheduler,
        Err(e) => {
            eprintln!("Invalid cron expression {cron_timer:?}: {e}");
            std::process::exit(1);
        }
    };

    // One cycle right away; the schedule only governs subsequent runs.
    if let Err(e) = app.run_cycle().await {
        error!(error = %e, "Initial reconciliation cycle failed");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    scheduler.run(shutdown_rx).await;

    info!("Shutdown complete");
}

/// Completes on SIGINT, SIGTERM, or SIGQUIT.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(unix)]
    let quit = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::quit())
            .expect("failed to install SIGQUIT handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    #[cfg(not(unix))]
    let quit = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
        () = quit => {}
    }
}
