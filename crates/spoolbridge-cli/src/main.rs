//! spoolbridge - keeps a Spoolman inventory in step with printer feeders
//!
//! The daemon reads printer reports as `<topic> <payload>` lines on stdin,
//! e.g. piped from `mosquitto_sub -v -t 'device/+/report'`, and reconciles
//! every RFID-tagged tray against the inventory service.
//!
//! # Usage
//!
//! ```bash
//! # With spoolbridge.toml in the working directory, or defaults
//! mosquitto_sub -v -h 192.168.1.50 -t 'device/+/report' ... | spoolbridge
//!
//! # With a custom config file
//! spoolbridge /etc/spoolbridge.toml
//!
//! # Without touching the inventory service
//! spoolbridge --dry-run < captured-reports.txt
//!
//! # Print a mosquitto_sub command line for every configured printer
//! spoolbridge --print-subscribe
//! ```
//!
//! When the input ends, every report already read is reconciled before the
//! process exits. Ctrl-C stops right after the reports in flight.

mod config;
mod feed;

use anyhow::{Context, Result};
use config::AppConfig;
use spoolbridge_catalog::{AnyCatalog, CatalogClient, InMemoryCatalog, Preflight, SpoolmanClient};
use spoolbridge_engine::ReconcileContext;
use spoolbridge_telemetry::PrinterManager;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "spoolbridge.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let dry_run = args.iter().any(|a| a == "--dry-run");
    let print_subscribe = args.iter().any(|a| a == "--print-subscribe");
    let config_path = args.iter().find(|a| !a.starts_with("--"));

    let mut config = match config_path {
        Some(path) => AppConfig::load(Path::new(path))
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            AppConfig::load(Path::new(DEFAULT_CONFIG_FILE))
                .with_context(|| format!("failed to load {DEFAULT_CONFIG_FILE}"))?
        }
        None => AppConfig::default(),
    };
    let skipped_printers = config.apply_process_env()?;
    config.validate()?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    for index in skipped_printers {
        warn!(index = %index, "Printer entry incomplete, expected ID, IP and CODE; skipping");
    }

    if print_subscribe {
        for printer in config.printer_configs() {
            println!("mosquitto_sub {}", printer.subscribe_args().join(" "));
        }
        return Ok(());
    }

    info!(version = spoolbridge_core::VERSION, dry_run, "spoolbridge starting");

    let catalog = Arc::new(if dry_run {
        AnyCatalog::from(InMemoryCatalog::new())
    } else {
        AnyCatalog::from(SpoolmanClient::new(config.spoolman_config())?)
    });

    if let Err(e) = catalog.health().await {
        warn!(error = %e, "Inventory service not reachable at startup");
    }

    let tag = config.tag_field();
    let preflight = Preflight::new(catalog.as_ref(), &tag).run().await;
    let context = Arc::new(ReconcileContext::new(
        Arc::clone(&catalog),
        tag,
        preflight.vendor_id,
    ));

    let mut manager = PrinterManager::new(context);
    for printer in config.printer_configs() {
        if let Err(e) = manager.register(printer) {
            warn!(error = %e, "Skipping printer");
        }
    }
    if manager.printer_count() == 0 {
        warn!("No printers configured, every report will be ignored");
    }

    let handle = manager.start();
    let router = handle.router();

    let cancel = CancellationToken::new();
    let health_task = config
        .healthcheck_interval()
        .map(|period| tokio::spawn(health_loop(Arc::clone(&catalog), period, cancel.clone())));

    let stdin = BufReader::new(tokio::io::stdin());
    let input_ended = tokio::select! {
        result = feed::run_feed(stdin, &router) => {
            match result {
                Ok(stats) => info!(routed = stats.routed, ignored = stats.ignored, "Report feed ended"),
                Err(e) => error!(error = %e, "Report feed failed"),
            }
            true
        }
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown requested");
            false
        }
    };
    drop(router);

    let printers = if input_ended {
        info!("Reconciling queued reports");
        handle.drain().await
    } else {
        handle.shutdown().await
    };
    for printer in printers {
        info!(
            printer = %printer.printer_id,
            status = %printer.status,
            ams_units = ?printer.ams_unit_count,
            last_ams_message = ?printer.last_ams_message,
            "Printer summary"
        );
    }

    cancel.cancel();
    if let Some(task) = health_task
        && let Err(e) = task.await
    {
        warn!(error = %e, "Health check task ended abnormally");
    }
    log_catalog_status(&catalog);

    info!("spoolbridge stopped");
    Ok(())
}

/// Check the inventory service every `period` until cancelled.
async fn health_loop(catalog: Arc<AnyCatalog>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    // The startup check already covered the first tick
    ticker.tick().await;

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = catalog.health().await {
                    warn!(error = %e, unreachable = e.is_unreachable(), "Periodic health check failed");
                }
                log_catalog_status(&catalog);
            }
        }
    }
}

fn log_catalog_status(catalog: &AnyCatalog) {
    if let Some(status) = catalog.status() {
        info!(
            connected = status.connected,
            last_check = ?status.last_check,
            "Inventory service status"
        );
    }
}
