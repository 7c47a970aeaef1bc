use tokio::io::BufReader;

pub mod bus;
pub mod config;
pub mod report;
pub mod worker;

pub use crate::bus::{Bus, Subscription};
pub use crate::config::WorkerConfig;
pub use crate::report::{DocumentWriter, ReportMessage};
pub use crate::worker::{ReportWorker, RunSummary};

/// Run the report worker over newline-delimited JSON reports on stdin.
pub async fn run() -> anyhow::Result<()> {
    // reads .env before the logger so RUST_LOG can come from there too
    let config = WorkerConfig::from_env()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let bus = Bus::open(&config);
    let worker = ReportWorker::with_writer(DocumentWriter::new(&config.reports_dir));
    let subscription = bus.subscribe_lines(BufReader::new(tokio::io::stdin()));

    log::info!(
        "Listening for doctor reports as {}, writing to {}",
        bus.subscriber_id(),
        config.reports_dir.display()
    );

    let summary = worker
        .run_until(subscription, config.concurrency, shutdown_signal())
        .await;

    log::info!(
        "Processed {} reports ({} failed, {} rejected)",
        summary.succeeded,
        summary.failed,
        summary.rejected
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
