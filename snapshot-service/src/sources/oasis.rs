use oasis_client::{FeedKind, FeedPayload, FeedQuery, FetchWindow, OasisClient};

use crate::pipeline::{Envelope, FeedSource, PipelineError};

/// Live feeds from the OASIS `SingleZip` API.
pub struct OasisFeedSource {
    client: OasisClient,
}

impl OasisFeedSource {
    pub fn new(client: OasisClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl FeedSource for OasisFeedSource {
    async fn fetch(
        &self,
        feed: FeedKind,
        window: &FetchWindow,
    ) -> Result<Envelope<FeedPayload>, PipelineError> {
        let query = FeedQuery::for_feed(feed, window);

        match self.client.fetch(&query).await {
            Ok(payload) => {
                tracing::info!(feed = %feed, bytes = payload.len(), "feed downloaded");
                Ok(Envelope::now(payload))
            }
            Err(e) => {
                metrics::counter!("feed_fetch_errors_total", "feed" => feed.query_name()).increment(1);
                tracing::error!(feed = %feed, error = %e, "feed download failed");
                Err(PipelineError::FeedUnavailable {
                    feed,
                    reason: e.to_string(),
                })
            }
        }
    }
}
