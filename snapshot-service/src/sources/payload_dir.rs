use std::{io::ErrorKind, path::PathBuf};

use oasis_client::{api::decode_archive, FeedKind, FeedPayload, FetchWindow};

use crate::pipeline::{Envelope, FeedSource, PipelineError};

/// Saved feed payloads in a directory, one file per report.
///
/// For each feed the source looks for `<QUERYNAME>.csv` (already unpacked)
/// and then `<QUERYNAME>.zip` (a raw `SingleZip` response). The window is not
/// used to select files; it still bounds which records are parsed.
pub struct PayloadDirSource {
    dir: PathBuf,
}

impl PayloadDirSource {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    async fn read_optional(&self, file: &str) -> Result<Option<Vec<u8>>, std::io::Error> {
        match tokio::fs::read(self.dir.join(file)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait::async_trait]
impl FeedSource for PayloadDirSource {
    async fn fetch(
        &self,
        feed: FeedKind,
        _window: &FetchWindow,
    ) -> Result<Envelope<FeedPayload>, PipelineError> {
        let unavailable = |reason: String| PipelineError::FeedUnavailable { feed, reason };
        let name = feed.query_name();

        if let Some(bytes) = self
            .read_optional(&format!("{name}.csv"))
            .await
            .map_err(|e| unavailable(format!("failed to read {name}.csv: {e}")))?
        {
            let payload = if bytes.iter().all(|b| b.is_ascii_whitespace()) {
                FeedPayload::Empty
            } else {
                FeedPayload::Csv(bytes)
            };
            return Ok(Envelope::now(payload));
        }

        let archive = self
            .read_optional(&format!("{name}.zip"))
            .await
            .map_err(|e| unavailable(format!("failed to read {name}.zip: {e}")))?
            .ok_or_else(|| {
                unavailable(format!(
                    "neither {name}.csv nor {name}.zip found in {}",
                    self.dir.display()
                ))
            })?;

        decode_archive(&archive)
            .map(Envelope::now)
            .map_err(|e| unavailable(e.to_string()))
    }
}
