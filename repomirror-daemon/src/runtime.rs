use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinError;
use tokio::time::MissedTickBehavior;

use repomirror_client::HttpInstanceClient;
use repomirror_core::AppConfig;
use repomirror_engine::SyncOrchestrator;

use crate::error::{io_err, DaemonError};
use crate::paths::{PRODUCT_NAME, SHUTDOWN_GRACE};
use crate::version;

pub type HttpOrchestrator = SyncOrchestrator<HttpInstanceClient, HttpInstanceClient>;

/// Wire HTTP clients for the source and every target into an orchestrator.
pub fn build_orchestrator(config: &AppConfig) -> Result<HttpOrchestrator, DaemonError> {
    let source = HttpInstanceClient::from_config(&config.source, config.request_timeout)?;
    let targets = config
        .targets
        .iter()
        .map(|target| HttpInstanceClient::from_config(target, config.request_timeout))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SyncOrchestrator::new(
        source,
        config.source.credentials.clone(),
        targets,
        config.sync.clone(),
    ))
}

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(config: AppConfig) -> Result<(), DaemonError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    let result = runtime.block_on(run(config));
    // A cycle that outlived the grace period is still parked on the blocking
    // pool; do not wait for it.
    runtime.shutdown_background();
    result
}

/// Run the scheduler until SIGINT or SIGTERM.
pub async fn run(config: AppConfig) -> Result<(), DaemonError> {
    log_banner();
    if config.print_env {
        tracing::info!(config = %config.redacted(), "resolved configuration");
    }

    let orchestrator = Arc::new(build_orchestrator(&config)?);
    tracing::info!(
        source = %config.source.url,
        targets = config.targets.len(),
        interval_secs = config.sync_interval.as_secs(),
        "sync scheduler starting",
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(4);

    let scheduler_handle = {
        let shutdown = shutdown_tx.clone();
        let shutdown_rx = shutdown.subscribe();
        let interval = config.sync_interval;
        tokio::spawn(async move {
            let cycle = move || {
                orchestrator.run_cycle();
            };
            let result = run_scheduler(cycle, interval, SHUTDOWN_GRACE, shutdown_rx).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        let mut shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = wait_for_signal() => {
                    let signal = signal?;
                    tracing::info!(signal, "received shutdown signal");
                    let _ = shutdown.send(());
                    Ok(())
                }
            }
        })
    };

    let (scheduler_result, signal_result) = tokio::join!(scheduler_handle, signal_handle);
    let cycles = handle_join("scheduler", scheduler_result)?;
    handle_join("signal_handler", signal_result)?;
    tracing::info!(cycles, "daemon stopped");
    Ok(())
}

/// Run `cycle` immediately and then once per `interval` until `shutdown`
/// fires. Returns the number of cycles that ran to completion.
///
/// Each cycle runs on the blocking pool and the next tick is only awaited
/// after it returns, so cycles never overlap; ticks missed meanwhile are
/// skipped. A shutdown during a cycle waits up to `grace` for it.
pub async fn run_scheduler<F>(
    cycle: F,
    interval: Duration,
    grace: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<u64, DaemonError>
where
    F: Fn() + Send + Sync + 'static,
{
    let cycle = Arc::new(cycle);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut completed = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            _ = ticker.tick() => {}
        }

        let job = Arc::clone(&cycle);
        let mut handle = tokio::task::spawn_blocking(move || job());

        tokio::select! {
            joined = &mut handle => {
                completed += cycle_finished(joined);
            }
            _ = shutdown.recv() => {
                tracing::info!(
                    grace_secs = grace.as_secs_f64(),
                    "shutdown requested, waiting for in-flight sync cycle",
                );
                match tokio::time::timeout(grace, handle).await {
                    Ok(joined) => completed += cycle_finished(joined),
                    Err(_) => {
                        tracing::error!(
                            grace_secs = grace.as_secs_f64(),
                            "sync cycle still running after grace period, exiting anyway",
                        );
                        return Err(DaemonError::ShutdownTimeout { grace });
                    }
                }
                break;
            }
        }
    }

    Ok(completed)
}

fn cycle_finished(joined: Result<(), JoinError>) -> u64 {
    match joined {
        Ok(()) => 1,
        Err(err) => {
            tracing::error!(error = %err, "sync cycle panicked");
            0
        }
    }
}

fn log_banner() {
    tracing::info!(
        product = PRODUCT_NAME,
        version = version::version(),
        pid = std::process::id(),
        "starting",
    );
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<&'static str, DaemonError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).map_err(|e| io_err("SIGINT handler", e))?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(|e| io_err("SIGTERM handler", e))?;
    tokio::select! {
        _ = sigint.recv() => Ok("SIGINT"),
        _ = sigterm.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Result<&'static str, DaemonError> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| io_err("ctrl-c handler", e))?;
    Ok("ctrl-c")
}

fn handle_join<T>(
    task: &'static str,
    result: Result<Result<T, DaemonError>, JoinError>,
) -> Result<T, DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Join {
            task,
            message: err.to_string(),
        }),
    }
}
