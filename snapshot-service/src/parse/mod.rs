//! Decoding of OASIS CSV payloads into [`Observation`]s.
//!
//! Each report gets a [`FeedParser`]; [`parse_feed`] dispatches on
//! [`FeedKind`] and applies the shared rules: header lookup by name, malformed
//! records dropped and counted, out-of-scope records skipped and counted.

mod lmp;
mod load_resources;
mod renewables;

use std::collections::HashMap;

use csv::StringRecord;
use oasis_client::{
    api::{interval_slots, FetchWindow},
    FeedKind, FeedPayload, Observation,
};
use time::{
    format_description::{well_known::Rfc3339, BorrowedFormatItem},
    macros::format_description,
    Duration, OffsetDateTime, UtcOffset,
};

use crate::pipeline::PipelineError;

pub use lmp::IntervalLmpParser;
pub use load_resources::LoadResourcesParser;
pub use renewables::RenewableForecastParser;

pub(crate) const INTERVAL_START: &str = "INTERVALSTARTTIME_GMT";
pub(crate) const INTERVAL_END: &str = "INTERVALENDTIME_GMT";

/// Reporting intervals longer than this are corrupt; the feeds are at most hourly.
const MAX_INTERVAL: Duration = Duration::DAY;

/// OASIS writes GMT instants as `2025-03-04T09:05:00-00:00`.
const OASIS_GMT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
);

/// Observations decoded from one feed, with diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    pub observations: Vec<Observation>,
    /// Malformed records (bad number, bad timestamp, missing key).
    pub dropped: usize,
    /// Well-formed records outside this snapshot's scope.
    pub skipped: usize,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RecordError {
    #[error("missing value for column '{0}'")]
    Missing(&'static str),
    #[error("invalid {column} '{value}'")]
    Invalid { column: &'static str, value: String },
    #[error("unreadable record: {0}")]
    Csv(String),
}

/// Per-report decoding rules.
pub trait FeedParser {
    /// Columns that must appear in the header row.
    fn required_columns(&self) -> &'static [&'static str];

    /// Turns one record into observations. An empty result means the record
    /// is out of scope (skipped); an error means it is malformed (dropped).
    fn parse_record(&self, row: &Row<'_>, window: &FetchWindow) -> Result<Vec<Observation>, RecordError>;
}

/// Decodes a feed payload with the parser matching `feed`.
pub fn parse_feed(
    feed: FeedKind,
    payload: &FeedPayload,
    window: &FetchWindow,
) -> Result<ParsedFeed, PipelineError> {
    let bytes = match payload {
        FeedPayload::Csv(bytes) => bytes.as_slice(),
        FeedPayload::Empty => return Ok(ParsedFeed::default()),
    };

    match feed {
        FeedKind::IntervalLmp => parse_with(&IntervalLmpParser, feed, bytes, window),
        FeedKind::RenewableForecast => parse_with(&RenewableForecastParser, feed, bytes, window),
        FeedKind::LoadResources => parse_with(&LoadResourcesParser, feed, bytes, window),
    }
}

fn parse_with<P: FeedParser>(
    parser: &P,
    feed: FeedKind,
    bytes: &[u8],
    window: &FetchWindow,
) -> Result<ParsedFeed, PipelineError> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::Decode {
            feed,
            reason: format!("failed to read CSV headers: {e}"),
        })?
        .clone();

    let columns = Columns::new(&headers);
    if let Some(missing) = parser
        .required_columns()
        .iter()
        .find(|c| !columns.contains(c))
    {
        return Err(PipelineError::Decode {
            feed,
            reason: format!("missing column '{missing}'"),
        });
    }

    let mut out = ParsedFeed::default();
    let mut first_error: Option<RecordError> = None;

    for result in rdr.records() {
        let outcome = match result {
            Ok(record) => parser.parse_record(&Row::new(&record, &columns), window),
            Err(e) => Err(RecordError::Csv(e.to_string())),
        };

        match outcome {
            Ok(obs) if obs.is_empty() => out.skipped += 1,
            Ok(obs) => out.observations.extend(obs),
            Err(e) => {
                out.dropped += 1;
                first_error.get_or_insert(e);
            }
        }
    }

    if let Some(e) = first_error {
        metrics::counter!("feed_records_dropped_total", "feed" => feed.query_name())
            .increment(out.dropped as u64);
        tracing::warn!(feed = %feed, dropped = out.dropped, first = %e, "dropped malformed records");
    }
    if out.skipped > 0 {
        metrics::counter!("feed_records_skipped_total", "feed" => feed.query_name())
            .increment(out.skipped as u64);
    }

    Ok(out)
}

/// Header name to column index, resolved once per payload.
pub struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Self { index }
    }

    fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

/// One CSV record with by-name access.
pub struct Row<'a> {
    record: &'a StringRecord,
    columns: &'a Columns,
}

impl<'a> Row<'a> {
    fn new(record: &'a StringRecord, columns: &'a Columns) -> Self {
        Self { record, columns }
    }

    /// Trimmed value, `None` when the column is absent or the cell is blank.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        let idx = *self.columns.index.get(name)?;
        self.record
            .get(idx)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn require(&self, name: &'static str) -> Result<&'a str, RecordError> {
        self.get(name).ok_or(RecordError::Missing(name))
    }

    /// Finite numeric value of a required column.
    pub fn f64(&self, name: &'static str) -> Result<f64, RecordError> {
        let raw = self.require(name)?;
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| RecordError::Invalid {
                column: name,
                value: raw.to_string(),
            })
    }

    pub fn timestamp(&self, name: &'static str) -> Result<OffsetDateTime, RecordError> {
        let raw = self.require(name)?;
        parse_gmt(raw).ok_or_else(|| RecordError::Invalid {
            column: name,
            value: raw.to_string(),
        })
    }

    /// Grid slots covered by this record's reporting interval that the
    /// window admits.
    pub fn slots(&self, window: &FetchWindow) -> Result<Vec<OffsetDateTime>, RecordError> {
        let start = self.timestamp(INTERVAL_START)?;
        let end = match self.get(INTERVAL_END) {
            Some(_) => Some(self.timestamp(INTERVAL_END)?),
            None => None,
        };

        if let Some(end) = end {
            if end - start > MAX_INTERVAL {
                return Err(RecordError::Invalid {
                    column: INTERVAL_END,
                    value: self.require(INTERVAL_END)?.to_string(),
                });
            }
        }

        Ok(interval_slots(start, end, window))
    }
}

/// Parses an OASIS GMT instant, falling back to RFC 3339.
pub fn parse_gmt(s: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(s, OASIS_GMT)
        .or_else(|_| OffsetDateTime::parse(s, &Rfc3339))
        .ok()
        .map(|ts| ts.to_offset(UtcOffset::UTC))
}
