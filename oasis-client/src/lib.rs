pub mod api;
pub mod domain;

pub use api::{ClientError, FeedKind, FeedPayload, FeedQuery, FetchWindow, OasisClient};
pub use domain::{CombinedRow, Field, HubRow, Hub, Observation, SeriesKey};
