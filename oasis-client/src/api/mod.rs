pub mod oasis;
pub mod queries;
pub mod window;

pub use oasis::{decode_archive, OasisClient, DEFAULT_BASE_URL};
pub use queries::{FeedKind, FeedQuery};
pub use window::{floor_to_slot, interval_slots, FetchWindow, DEFAULT_LOOKBACK, SLOT};

/// Raw payload of one feed after download and decompression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedPayload {
    /// CSV bytes including the header row.
    Csv(Vec<u8>),
    /// OASIS answered successfully but had no rows for the window.
    Empty,
}

impl FeedPayload {
    pub fn len(&self) -> usize {
        match self {
            FeedPayload::Csv(b) => b.len(),
            FeedPayload::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("OASIS returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive contains no entries")]
    EmptyArchive,
    #[error("OASIS error {code}: {message}")]
    Oasis { code: String, message: String },
}
