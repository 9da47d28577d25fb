use std::{collections::HashMap, fs, path::Path};

use oasis_client::{FeedKind, FeedPayload, FetchWindow};
use snapshot_service::{
    pipeline::{Envelope, FeedSource, Pipeline, PipelineError},
    sinks::CsvSnapshotSink,
};
use time::macros::datetime;

/// Serves canned payloads; a feed without an entry is unavailable.
struct StaticSource {
    payloads: HashMap<FeedKind, FeedPayload>,
}

impl StaticSource {
    fn new(entries: &[(FeedKind, &str)]) -> Self {
        let payloads = entries
            .iter()
            .map(|(kind, body)| {
                let payload = if body.is_empty() {
                    FeedPayload::Empty
                } else {
                    FeedPayload::Csv(body.as_bytes().to_vec())
                };
                (*kind, payload)
            })
            .collect();
        Self { payloads }
    }
}

#[async_trait::async_trait]
impl FeedSource for StaticSource {
    async fn fetch(
        &self,
        feed: FeedKind,
        _window: &FetchWindow,
    ) -> Result<Envelope<FeedPayload>, PipelineError> {
        self.payloads
            .get(&feed)
            .cloned()
            .map(Envelope::now)
            .ok_or_else(|| PipelineError::FeedUnavailable {
                feed,
                reason: "connection refused".to_string(),
            })
    }
}

fn window() -> FetchWindow {
    FetchWindow::last_hour(datetime!(2025-03-04 10:07:33 UTC))
}

const LMP: &str = "\
INTERVALSTARTTIME_GMT,INTERVALENDTIME_GMT,OPR_DT,NODE,MARKET_RUN_ID,LMP_TYPE,MW
2025-03-04T10:00:00-00:00,2025-03-04T10:05:00-00:00,2025-03-04,TH_SP15_GEN-APND,RTM,LMP,40.0
2025-03-04T10:00:00-00:00,2025-03-04T10:05:00-00:00,2025-03-04,TH_SP15_GEN-APND,RTM,LMP,41.0
2025-03-04T10:00:00-00:00,2025-03-04T10:05:00-00:00,2025-03-04,TH_SP15_GEN-APND,RTM,MCC,2.0
2025-03-04T10:00:00-00:00,2025-03-04T10:05:00-00:00,2025-03-04,TH_NP15_GEN-APND,RTM,LMP,43.0
2025-03-04T10:00:00-00:00,2025-03-04T10:05:00-00:00,2025-03-04,TH_NP15_GEN-APND,RTM,MCL,1.5
2025-03-04T10:00:00-00:00,2025-03-04T10:05:00-00:00,2025-03-04,TH_ZP26_GEN-APND,RTM,LMP,45.0
2025-03-04T10:00:00-00:00,2025-03-04T10:05:00-00:00,2025-03-04,TH_ZP26_GEN-APND,RTM,MCL,1.7
2025-03-04T10:05:00-00:00,2025-03-04T10:10:00-00:00,2025-03-04,TH_SP15_GEN-APND,RTM,LMP,39.0
2025-03-04T10:05:00-00:00,2025-03-04T10:10:00-00:00,2025-03-04,TH_NP15_GEN-APND,RTM,LMP,bad
";

const RENEWABLES: &str = "\
INTERVALSTARTTIME_GMT,INTERVALENDTIME_GMT,TRADING_HUB,RENEWABLE_TYPE,MARKET_RUN_ID,MW
2025-03-04T09:55:00-00:00,2025-03-04T10:00:00-00:00,NP15,Solar,RTD,1000
2025-03-04T09:55:00-00:00,2025-03-04T10:00:00-00:00,SP15,Solar,RTD,5000
2025-03-04T09:55:00-00:00,2025-03-04T10:00:00-00:00,SP15,Wind,RTD,700
2025-03-04T10:00:00-00:00,2025-03-04T10:05:00-00:00,SP15,Solar,RTD,6000
2025-03-04T10:00:00-00:00,2025-03-04T10:05:00-00:00,SP15,Wind,RTD,800
";

const SLRS: &str = "\
INTERVALSTARTTIME_GMT,INTERVALENDTIME_GMT,TAC_ZONE_NAME,SCHEDULE,SLRS_TYPE,MW
2025-03-04T09:55:00-00:00,2025-03-04T10:00:00-00:00,Caiso_Totals,Generation,ALL,20000
2025-03-04T10:00:00-00:00,2025-03-04T10:05:00-00:00,Caiso_Totals,Generation,ALL,21000
";

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn writes_detail_and_combined_tables() {
    let out = tempfile::tempdir().unwrap();
    let pipeline = Pipeline {
        source: StaticSource::new(&[
            (FeedKind::IntervalLmp, LMP),
            (FeedKind::RenewableForecast, RENEWABLES),
            (FeedKind::LoadResources, SLRS),
        ]),
        sink: CsvSnapshotSink::new(out.path()),
    };

    let report = pipeline.run(&window()).await.unwrap();
    let lmp_stats = report
        .feeds
        .iter()
        .find(|f| f.feed == FeedKind::IntervalLmp)
        .unwrap();
    assert_eq!(lmp_stats.dropped, 1);

    let paths = pipeline.sink.paths_for(&window()).unwrap();
    assert_eq!(
        read(&paths.detail),
        "timestamp_utc_interval,hub,lmp_total,congestion,energy,loss\n\
         2025-03-04 10:00:00+00:00,SP15,41.0,2.0,,\n\
         2025-03-04 10:00:00+00:00,NP15,43.0,,,1.5\n\
         2025-03-04 10:00:00+00:00,ZP26,45.0,,,1.7\n\
         2025-03-04 10:05:00+00:00,SP15,39.0,,,\n"
    );

    let combined = read(&paths.combined);
    let lines: Vec<&str> = combined.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "timestamp_utc_interval,lmp_total,congestion,energy,loss,Solar,Wind,\
         total_generation,renewables_total,thermal_and_other"
    );
    // generation only: no prices before 10:00
    assert_eq!(
        lines[1],
        "2025-03-04 09:55:00+00:00,,,,,6000.0,700.0,20000.0,6700.0,13300.0"
    );
    let at_ten: Vec<&str> = lines[2].split(',').collect();
    assert_eq!(at_ten[0], "2025-03-04 10:00:00+00:00");
    assert_eq!(at_ten[1], "43.0");
    assert_eq!(at_ten[2], "2.0");
    assert_eq!(at_ten[3], "");
    assert!((at_ten[4].parse::<f64>().unwrap() - 1.6).abs() < 1e-9);
    assert_eq!(&at_ten[5..], ["6000.0", "800.0", "21000.0", "6800.0", "14200.0"]);
    // prices only: generation columns are empty
    assert_eq!(lines[3], "2025-03-04 10:05:00+00:00,39.0,,,,,,,,");
}

#[tokio::test]
async fn empty_feeds_produce_header_only_files() {
    let out = tempfile::tempdir().unwrap();
    let pipeline = Pipeline {
        source: StaticSource::new(&[
            (FeedKind::IntervalLmp, ""),
            (FeedKind::RenewableForecast, ""),
            (FeedKind::LoadResources, ""),
        ]),
        sink: CsvSnapshotSink::new(out.path()),
    };

    let report = pipeline.run(&window()).await.unwrap();
    assert!(report.feeds.iter().all(|f| f.empty));

    let paths = pipeline.sink.paths_for(&window()).unwrap();
    assert_eq!(read(&paths.detail).lines().count(), 1);
    assert_eq!(read(&paths.combined).lines().count(), 1);
}

#[tokio::test]
async fn unavailable_feed_aborts_without_writing() {
    let out = tempfile::tempdir().unwrap();
    let pipeline = Pipeline {
        source: StaticSource::new(&[
            (FeedKind::IntervalLmp, LMP),
            (FeedKind::RenewableForecast, RENEWABLES),
        ]),
        sink: CsvSnapshotSink::new(out.path()),
    };

    let err = pipeline.run(&window()).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::FeedUnavailable { feed: FeedKind::LoadResources, .. }
    ));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn rerun_produces_identical_files() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let feeds = [
        (FeedKind::IntervalLmp, LMP),
        (FeedKind::RenewableForecast, RENEWABLES),
        (FeedKind::LoadResources, SLRS),
    ];

    for dir in [&first, &second] {
        let pipeline = Pipeline {
            source: StaticSource::new(&feeds),
            sink: CsvSnapshotSink::new(dir.path()),
        };
        pipeline.run(&window()).await.unwrap();
    }

    let a = CsvSnapshotSink::new(first.path()).paths_for(&window()).unwrap();
    let b = CsvSnapshotSink::new(second.path()).paths_for(&window()).unwrap();
    assert_eq!(fs::read(&a.detail).unwrap(), fs::read(&b.detail).unwrap());
    assert_eq!(fs::read(&a.combined).unwrap(), fs::read(&b.combined).unwrap());
}
