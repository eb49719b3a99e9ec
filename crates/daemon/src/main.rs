// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Processor Daemon (evpd)
//!
//! Hosts one processor between an input and an output topic until it is
//! signalled, its input ends, or its consume loop dies.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use evp_adapters::{Broker, StdioBroker};
use evp_daemon::{
    register_builtin, startup, supervise, BrokerKind, DaemonConfig, ExitReason, LifecycleError,
};
use evp_engine::ProcessorRegistry;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "evpd", version, about = "Event processor daemon")]
struct Args {
    /// Daemon configuration file (TOML)
    #[arg(short, long, required_unless_present = "list")]
    config: Option<PathBuf>,

    /// Print the registered processors and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut registry = ProcessorRegistry::new();
    register_builtin(&mut registry)?;

    if args.list {
        let mut stdout = std::io::stdout().lock();
        for description in registry.descriptions() {
            writeln!(stdout, "{description}")?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    let Some(config_path) = args.config else {
        return Err("--config is required".into());
    };
    let config = match DaemonConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            write_startup_error(None, &e.to_string());
            return Ok(ExitCode::FAILURE);
        }
    };

    let _log_guard = setup_logging(config.log_path.as_deref())?;
    info!(
        config = %config_path.display(),
        processor = %config.processor,
        "starting evpd"
    );
    for description in registry.descriptions() {
        info!(%description, "processor registered");
    }

    let result = match config.broker.kind {
        BrokerKind::Stdio => {
            let broker = StdioBroker::new();
            let exhausted = broker.clone();
            run(&config, &registry, broker, move || exhausted.input_exhausted()).await
        }
        BrokerKind::Kafka => run_kafka(&config, &registry).await,
    };

    match result {
        Ok(ExitReason::ProcessorStopped) => Ok(ExitCode::FAILURE),
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            write_startup_error(config.log_path.as_deref(), &e.to_string());
            error!("failed to start: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(feature = "kafka")]
async fn run_kafka(
    config: &DaemonConfig,
    registry: &ProcessorRegistry,
) -> Result<ExitReason, LifecycleError> {
    run(config, registry, evp_adapters::KafkaBroker::new(), || false).await
}

#[cfg(not(feature = "kafka"))]
async fn run_kafka(
    _config: &DaemonConfig,
    _registry: &ProcessorRegistry,
) -> Result<ExitReason, LifecycleError> {
    Err(LifecycleError::BrokerUnavailable("kafka"))
}

async fn run<B: Broker>(
    config: &DaemonConfig,
    registry: &ProcessorRegistry,
    broker: B,
    input_exhausted: impl Fn() -> bool,
) -> Result<ExitReason, LifecycleError> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut daemon = startup(config, registry, broker).await?;
    let signalled = async {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    };

    let reason = supervise(&daemon, signalled, input_exhausted).await;
    daemon.shutdown(reason).await;
    Ok(reason)
}

/// Write a startup error synchronously; the non-blocking log writer may not
/// flush before the process exits.
fn write_startup_error(log_path: Option<&Path>, message: &str) {
    let line = format!("ERROR failed to start evpd: {}", message);
    let Some(path) = log_path else {
        eprintln!("{line}");
        return;
    };
    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    else {
        eprintln!("{line}");
        return;
    };
    let _ = writeln!(file, "{line}");
}

fn setup_logging(
    log_path: Option<&Path>,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (writer, guard) = match log_path {
        Some(path) => {
            let dir = match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir,
                _ => Path::new("."),
            };
            std::fs::create_dir_all(dir)?;
            let file_name = path.file_name().ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("log_path has no file name: {}", path.display()),
                )
            })?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    Ok(guard)
}
