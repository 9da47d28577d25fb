pub mod csv_snapshot;

pub use csv_snapshot::{render_combined, render_detail, CsvSnapshotSink, SnapshotPaths};
