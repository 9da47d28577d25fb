use std::{
    io::{Cursor, Read},
    time::Duration,
};

use zip::ZipArchive;

use super::{ClientError, FeedPayload, FeedQuery};

pub const DEFAULT_BASE_URL: &str = "http://oasis.caiso.com/oasisapi/SingleZip";

/// OASIS error code for "No data returned for the specified selection".
const NO_DATA_CODE: &str = "1000";

/// Thin client for the OASIS `SingleZip` endpoint.
#[derive(Debug, Clone)]
pub struct OasisClient {
    http: reqwest::Client,
    base_url: String,
}

impl OasisClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Downloads one report and unpacks its single archive entry.
    pub async fn fetch(&self, query: &FeedQuery) -> Result<FeedPayload, ClientError> {
        tracing::debug!(feed = %query.kind, url = %self.base_url, "requesting OASIS report");

        let response = self
            .http
            .get(&self.base_url)
            .query(&query.params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let bytes = response.bytes().await?;
        decode_archive(&bytes)
    }
}

/// Unpacks a `SingleZip` response body.
///
/// OASIS always answers with a zip. A CSV entry is the report itself; an XML
/// entry is an error document, of which only "no data" is not an error.
pub fn decode_archive(bytes: &[u8]) -> Result<FeedPayload, ClientError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    if archive.is_empty() {
        return Err(ClientError::EmptyArchive);
    }

    let mut entry = archive.by_index(0)?;
    let name = entry.name().to_ascii_lowercase();
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf)?;

    if name.ends_with(".xml") {
        return oasis_error(&buf);
    }

    if buf.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(FeedPayload::Empty);
    }

    Ok(FeedPayload::Csv(buf))
}

fn oasis_error(xml: &[u8]) -> Result<FeedPayload, ClientError> {
    let doc = String::from_utf8_lossy(xml);
    let code = element_text(&doc, "ERR_CODE").unwrap_or_else(|| "unknown".to_string());

    if code == NO_DATA_CODE {
        return Ok(FeedPayload::Empty);
    }

    Err(ClientError::Oasis {
        code,
        message: element_text(&doc, "ERR_DESC").unwrap_or_default(),
    })
}

/// Text of the first element whose (possibly prefixed) name is `local_name`.
fn element_text(doc: &str, local_name: &str) -> Option<String> {
    let start = [format!("<{local_name}>"), format!(":{local_name}>")]
        .iter()
        .filter_map(|open| doc.find(open.as_str()).map(|at| at + open.len()))
        .min()?;
    let len = doc[start..].find('<')?;
    Some(doc[start..start + len].trim().to_string())
}
