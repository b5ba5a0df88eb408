use std::time::Duration;

use bulk_source::{ByteStream, ClientError, ResultFetcher};
use futures::StreamExt;

use crate::client::USER_AGENT;

/// Downloads result artifacts with a plain GET.
///
/// Result URLs are pre-signed, so no credentials are sent. The body is
/// streamed, so `request_timeout` bounds connecting and each read rather
/// than the whole download.
pub struct HttpResultFetcher {
    client: reqwest::Client,
}

impl HttpResultFetcher {
    pub fn new(request_timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(request_timeout)
            .read_timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Network(format!("could not build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ResultFetcher for HttpResultFetcher {
    async fn fetch(&self, url: &str) -> Result<ByteStream, ClientError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Network(format!("result download failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ClientError::Network(format!(
                "result download returned HTTP {}",
                response.status()
            )));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| {
                chunk.map_err(|e| ClientError::Network(format!("failed to read result body: {e}")))
            })
            .boxed())
    }
}
