use anyhow::Result;
use oasis_client::{FetchWindow, OasisClient};
use snapshot_service::{
    config::AppConfig,
    observability,
    pipeline::Pipeline,
    sinks::CsvSnapshotSink,
    sources::OasisFeedSource,
};
use time::OffsetDateTime;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    let window = FetchWindow::ending_at(OffsetDateTime::now_utc(), cfg.window.lookback());
    tracing::info!(
        start = %window.start,
        end = %window.end,
        last_slot = %window.last_completed_slot(),
        "fetching CAISO snapshot"
    );

    let client = OasisClient::new(cfg.api.base_url.clone(), cfg.api.request_timeout())?;
    let pipeline = Pipeline {
        source: OasisFeedSource::new(client),
        sink: CsvSnapshotSink::new(&cfg.output.dir),
    };

    let report = pipeline.run(&window).await?;
    report.log_summary();

    Ok(())
}
