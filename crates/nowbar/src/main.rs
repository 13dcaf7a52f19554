mod cli;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use nowbar_core::config::AppConfig;
use nowbar_core::output::RenderMode;
use nowbar_core::{Aggregator, CoreError};
use tokio::sync::mpsc;

use crate::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("nowbar: {e}");
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut config);

    let _guard = match logging::init(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("nowbar: failed to set up logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config, cli.render_mode()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fatal error");
            eprintln!("nowbar: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Single-threaded event loop: one transport event at a time, until a stop
/// signal arrives or the consumer closes stdout.
async fn run(config: &AppConfig, mode: RenderMode) -> Result<(), CoreError> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Watch names before listing players so no appearance falls in between.
    let _watch = nowbar_detect::watch_bus_names(tx.clone()).await?;
    let source = nowbar_detect::open(tx)?;

    let mut aggregator = Aggregator::new(source, std::io::stdout().lock(), config, mode);
    if let Err(e) = aggregator.start() {
        return closed_output_is_ok(e);
    }
    tracing::info!("starting main loop");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            res = &mut shutdown => {
                res?;
                tracing::info!("received signal to stop, exiting");
                return aggregator.finish().or_else(closed_output_is_ok);
            }
            event = rx.recv() => {
                let Some(event) = event else {
                    tracing::warn!("event channel closed");
                    return aggregator.finish().or_else(closed_output_is_ok);
                };
                tracing::trace!(?event, "dispatching event");
                if let Err(e) = aggregator.handle(event) {
                    return closed_output_is_ok(e);
                }
            }
        }
    }
}

/// A consumer that went away is a normal way to end.
fn closed_output_is_ok(e: CoreError) -> Result<(), CoreError> {
    if e.is_output_closed() {
        tracing::debug!("output closed by consumer");
        Ok(())
    } else {
        Err(e)
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = interrupt.recv() => {}
        _ = terminate.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
