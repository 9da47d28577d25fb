use std::time::SystemTime;

use oasis_client::{CombinedRow, FeedKind, FeedPayload, FetchWindow};

use crate::parse::{self, ParsedFeed};
use crate::transform::{self, MergeError, Tables};

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub received_at: SystemTime,
}

impl<T> Envelope<T> {
    pub fn now(payload: T) -> Self {
        Self {
            payload,
            received_at: SystemTime::now(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("feed {feed} unavailable: {reason}")]
    FeedUnavailable { feed: FeedKind, reason: String },
    #[error("feed {feed} payload could not be decoded: {reason}")]
    Decode { feed: FeedKind, reason: String },
    #[error("merge error: {0}")]
    Merge(#[from] MergeError),
    #[error("sink error: {0}")]
    Sink(String),
}

/// Where raw feed payloads come from: the live API or saved files.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(
        &self,
        feed: FeedKind,
        window: &FetchWindow,
    ) -> Result<Envelope<FeedPayload>, PipelineError>;
}

#[async_trait::async_trait]
pub trait TableSink: Send + Sync {
    async fn write(&self, window: &FetchWindow, tables: &Tables) -> Result<(), PipelineError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedStats {
    pub feed: FeedKind,
    pub empty: bool,
    pub observations: usize,
    pub dropped: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub window: FetchWindow,
    pub feeds: Vec<FeedStats>,
    pub tables: Tables,
}

impl RunReport {
    pub fn log_summary(&self) {
        for f in &self.feeds {
            tracing::info!(
                feed = %f.feed,
                empty = f.empty,
                observations = f.observations,
                dropped = f.dropped,
                skipped = f.skipped,
                "feed parsed"
            );
        }

        tracing::info!(
            detail_rows = self.tables.detail.len(),
            combined_rows = self.tables.combined.len(),
            "snapshot merged"
        );

        let tail = self.tables.combined.len().saturating_sub(5);
        for row in &self.tables.combined[tail..] {
            log_combined_row(row);
        }
    }
}

fn log_combined_row(row: &CombinedRow) {
    tracing::info!(
        ts = %row.ts,
        lmp_total = ?row.lmp_total,
        congestion = ?row.congestion,
        energy = ?row.energy,
        loss = ?row.loss,
        solar = ?row.solar,
        wind = ?row.wind,
        total_generation = ?row.total_generation,
        total_load = ?row.total_load,
        thermal_and_other = ?row.thermal_and_other,
        "latest interval"
    );
}

/// One snapshot run: fetch all feeds, merge, write.
pub struct Pipeline<S, K> {
    pub source: S,
    pub sink: K,
}

impl<S, K> Pipeline<S, K>
where
    S: FeedSource,
    K: TableSink,
{
    /// Runs the snapshot for `window`.
    ///
    /// The feeds are fetched concurrently and all must succeed before the
    /// merge starts; nothing is written when any feed is unavailable.
    pub async fn run(&self, window: &FetchWindow) -> Result<RunReport, PipelineError> {
        let (lmp, renewables, load) = tokio::try_join!(
            self.collect(FeedKind::IntervalLmp, window),
            self.collect(FeedKind::RenewableForecast, window),
            self.collect(FeedKind::LoadResources, window),
        )?;

        let mut feeds = Vec::with_capacity(3);
        let mut observations = Vec::new();
        for (stats, parsed) in [lmp, renewables, load] {
            feeds.push(stats);
            observations.extend(parsed.observations);
        }

        let tables = transform::merge(observations)?;
        self.sink.write(window, &tables).await?;

        Ok(RunReport {
            window: *window,
            feeds,
            tables,
        })
    }

    async fn collect(
        &self,
        feed: FeedKind,
        window: &FetchWindow,
    ) -> Result<(FeedStats, ParsedFeed), PipelineError> {
        let requested_at = SystemTime::now();
        let env = self.source.fetch(feed, window).await?;

        if let Ok(dur) = env.received_at.duration_since(requested_at) {
            metrics::histogram!("feed_fetch_seconds", "feed" => feed.query_name())
                .record(dur.as_secs_f64());
        }

        let parsed = parse::parse_feed(feed, &env.payload, window)?;
        let stats = FeedStats {
            feed,
            empty: parsed.observations.is_empty(),
            observations: parsed.observations.len(),
            dropped: parsed.dropped,
            skipped: parsed.skipped,
        };

        if stats.empty {
            tracing::warn!(feed = %feed, "feed returned no usable records; its columns will be empty");
        }

        Ok((stats, parsed))
    }
}
