use anyhow::{bail, Result};
use oasis_client::FetchWindow;
use snapshot_service::{
    config::AppConfig,
    observability,
    pipeline::Pipeline,
    sinks::CsvSnapshotSink,
    sources::PayloadDirSource,
};
use std::env;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!("usage: replay_snapshot <payload_dir> <window_end_rfc3339>");
    }
    let payload_dir = &args[1];
    let end = OffsetDateTime::parse(&args[2], &Rfc3339)
        .map_err(|e| anyhow::anyhow!("invalid window end '{}': {e}", args[2]))?;

    // Lookback and output directory come from the same config as live runs.
    let cfg = AppConfig::load()?;
    let window = FetchWindow::ending_at(end, cfg.window.lookback());

    let pipeline = Pipeline {
        source: PayloadDirSource::new(payload_dir),
        sink: CsvSnapshotSink::new(&cfg.output.dir),
    };

    let report = pipeline.run(&window).await?;
    report.log_summary();

    Ok(())
}
