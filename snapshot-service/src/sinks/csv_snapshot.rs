use std::path::{Path, PathBuf};

use oasis_client::{api::FetchWindow, CombinedRow, HubRow};
use serde::Serialize;
use time::{format_description::BorrowedFormatItem, macros::format_description, OffsetDateTime, UtcOffset};

use crate::pipeline::{PipelineError, TableSink};
use crate::transform::Tables;

const DETAIL_HEADER: [&str; 6] = [
    "timestamp_utc_interval",
    "hub",
    "lmp_total",
    "congestion",
    "energy",
    "loss",
];

const COMBINED_HEADER: [&str; 10] = [
    "timestamp_utc_interval",
    "lmp_total",
    "congestion",
    "energy",
    "loss",
    "Solar",
    "Wind",
    "total_generation",
    "renewables_total",
    "thermal_and_other",
];

const FILE_STAMP: &[BorrowedFormatItem<'static>] = format_description!("[year][month][day]_[hour][minute]");
const ROW_TIMESTAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]+00:00");

#[derive(Serialize)]
struct DetailRecord<'a> {
    ts: String,
    hub: &'a str,
    lmp_total: Option<f64>,
    congestion: Option<f64>,
    energy: Option<f64>,
    loss: Option<f64>,
}

#[derive(Serialize)]
struct CombinedRecord {
    ts: String,
    lmp_total: Option<f64>,
    congestion: Option<f64>,
    energy: Option<f64>,
    loss: Option<f64>,
    solar: Option<f64>,
    wind: Option<f64>,
    total_generation: Option<f64>,
    renewables_total: Option<f64>,
    thermal_and_other: Option<f64>,
}

fn format_row_ts(ts: OffsetDateTime) -> Result<String, PipelineError> {
    ts.to_offset(UtcOffset::UTC)
        .format(ROW_TIMESTAMP)
        .map_err(|e| PipelineError::Sink(format!("failed to format timestamp {ts}: {e}")))
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    // Headers are written explicitly so empty tables still get one.
    csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new())
}

fn finish(w: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, PipelineError> {
    w.into_inner()
        .map_err(|e| PipelineError::Sink(format!("failed to flush CSV buffer: {e}")))
}

fn csv_err(e: csv::Error) -> PipelineError {
    PipelineError::Sink(format!("CSV encoding failed: {e}"))
}

/// Renders the per-hub detail table.
pub fn render_detail(rows: &[HubRow]) -> Result<Vec<u8>, PipelineError> {
    let mut w = csv_writer();
    w.write_record(DETAIL_HEADER).map_err(csv_err)?;

    for r in rows {
        w.serialize(DetailRecord {
            ts: format_row_ts(r.ts)?,
            hub: r.hub.as_str(),
            lmp_total: r.lmp_total,
            congestion: r.congestion,
            energy: r.energy,
            loss: r.loss,
        })
        .map_err(csv_err)?;
    }

    finish(w)
}

/// Renders the hub-averaged price + generation table.
pub fn render_combined(rows: &[CombinedRow]) -> Result<Vec<u8>, PipelineError> {
    let mut w = csv_writer();
    w.write_record(COMBINED_HEADER).map_err(csv_err)?;

    for r in rows {
        w.serialize(CombinedRecord {
            ts: format_row_ts(r.ts)?,
            lmp_total: r.lmp_total,
            congestion: r.congestion,
            energy: r.energy,
            loss: r.loss,
            solar: r.solar,
            wind: r.wind,
            total_generation: r.total_generation,
            renewables_total: r.renewables_total,
            thermal_and_other: r.thermal_and_other,
        })
        .map_err(csv_err)?;
    }

    finish(w)
}

/// Output locations of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPaths {
    pub detail: PathBuf,
    pub combined: PathBuf,
}

/// Writes the two snapshot CSVs into a directory, both or neither.
pub struct CsvSnapshotSink {
    dir: PathBuf,
}

impl CsvSnapshotSink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// File names are stamped with the window end, e.g. `..._20250304_1007UTC.csv`.
    pub fn paths_for(&self, window: &FetchWindow) -> Result<SnapshotPaths, PipelineError> {
        let stamp = window
            .end
            .to_offset(UtcOffset::UTC)
            .format(FILE_STAMP)
            .map_err(|e| PipelineError::Sink(format!("failed to format file stamp: {e}")))?;

        Ok(SnapshotPaths {
            detail: self.dir.join(format!("caiso_lmp_last_hour_{stamp}UTC.csv")),
            combined: self.dir.join(format!("caiso_lmp_generation_{stamp}UTC.csv")),
        })
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

async fn remove_all(paths: &[PathBuf]) {
    for p in paths {
        match tokio::fs::remove_file(p).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %p.display(), error = %e, "failed to clean up snapshot file");
            }
        }
    }
}

#[async_trait::async_trait]
impl TableSink for CsvSnapshotSink {
    async fn write(&self, window: &FetchWindow, tables: &Tables) -> Result<(), PipelineError> {
        let paths = self.paths_for(window)?;
        let files = [
            (paths.detail, render_detail(&tables.detail)?),
            (paths.combined, render_combined(&tables.combined)?),
        ];

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PipelineError::Sink(format!("failed to create {}: {e}", self.dir.display())))?;

        let mut staged = Vec::with_capacity(files.len());
        for (path, bytes) in &files {
            let partial = partial_path(path);
            if let Err(e) = tokio::fs::write(&partial, bytes).await {
                metrics::counter!("snapshot_write_errors_total").increment(1);
                staged.push(partial);
                remove_all(&staged).await;
                return Err(PipelineError::Sink(format!("failed to write {}: {e}", path.display())));
            }
            staged.push(partial);
        }

        let mut published = Vec::with_capacity(files.len());
        for ((path, _), partial) in files.iter().zip(&staged) {
            if let Err(e) = tokio::fs::rename(partial, path).await {
                metrics::counter!("snapshot_write_errors_total").increment(1);
                remove_all(&staged[published.len()..]).await;
                remove_all(&published).await;
                return Err(PipelineError::Sink(format!("failed to publish {}: {e}", path.display())));
            }
            published.push(path.clone());
        }

        metrics::counter!("snapshot_rows_written_total")
            .increment((tables.detail.len() + tables.combined.len()) as u64);
        for p in &published {
            tracing::info!(path = %p.display(), "snapshot file written");
        }

        Ok(())
    }
}
