use futures::StreamExt;
use serde_json::Value;
use tracing::debug;

use crate::client::{ByteStream, ResultFetcher};
use crate::error::{DecodeError, SourcingError};
use crate::global_id::GlobalId;
use crate::record::ResultRecord;

const PARENT_ID_FIELD: &str = "__parentId";

/// Downloads a result artifact and decodes it line by line.
pub struct ResultIngester<'a> {
    fetcher: &'a dyn ResultFetcher,
}

impl<'a> ResultIngester<'a> {
    pub fn new(fetcher: &'a dyn ResultFetcher) -> Self {
        Self { fetcher }
    }

    /// Open `url` with a single GET. Records are decoded as the body
    /// arrives, in file order.
    pub async fn ingest(&self, url: &str) -> Result<ResultLines, SourcingError> {
        let body = self.fetcher.fetch(url).await?;
        debug!(%url, "streaming bulk operation result");
        Ok(ResultLines::new(body))
    }
}

/// Single-pass reader over a newline-delimited JSON body.
///
/// Only the unread tail of the latest chunk is buffered. Empty lines are
/// skipped. A malformed line yields a [`DecodeError`] and reading carries on
/// with the next line; a transport fault mid-body ends the read with an error.
pub struct ResultLines {
    chunks: ByteStream,
    buffer: Vec<u8>,
    /// Start of the unread part of `buffer`.
    cursor: usize,
    line: usize,
    exhausted: bool,
    received: usize,
}

impl ResultLines {
    pub fn new(chunks: ByteStream) -> Self {
        Self {
            chunks,
            buffer: Vec::new(),
            cursor: 0,
            line: 0,
            exhausted: false,
            received: 0,
        }
    }

    /// Next decoded line, or `Ok(None)` once the body is exhausted.
    pub async fn next_record(
        &mut self,
    ) -> Result<Option<Result<ResultRecord, DecodeError>>, SourcingError> {
        loop {
            if let Some(decoded) = self.take_line() {
                return Ok(Some(decoded));
            }
            if self.exhausted {
                return Ok(None);
            }

            match self.chunks.next().await {
                Some(Ok(chunk)) => {
                    self.buffer.drain(..self.cursor);
                    self.cursor = 0;
                    self.received += chunk.len();
                    self.buffer.extend_from_slice(&chunk);
                }
                Some(Err(err)) => return Err(err.into()),
                None => {
                    debug!(bytes = self.received, lines = self.line, "bulk operation result read");
                    self.exhausted = true;
                }
            }
        }
    }

    /// Decode the next complete non-blank line already in the buffer. Once
    /// the body is exhausted, trailing bytes count as a final line.
    fn take_line(&mut self) -> Option<Result<ResultRecord, DecodeError>> {
        loop {
            let rest = &self.buffer[self.cursor..];
            let (end, advance) = match rest.iter().position(|b| *b == b'\n') {
                Some(end) => (end, end + 1),
                None if self.exhausted && !rest.is_empty() => (rest.len(), rest.len()),
                None => return None,
            };

            let start = self.cursor;
            self.cursor += advance;
            self.line += 1;

            let raw = &self.buffer[start..start + end];
            let text = match std::str::from_utf8(raw) {
                Ok(text) => text.trim(),
                Err(e) => {
                    return Some(Err(DecodeError {
                        line: self.line,
                        reason: format!("invalid UTF-8: {e}"),
                    }));
                }
            };
            if text.is_empty() {
                continue;
            }
            return Some(decode_line(self.line, text));
        }
    }
}

fn decode_line(line: usize, text: &str) -> Result<ResultRecord, DecodeError> {
    let fail = |reason: String| DecodeError { line, reason };

    let value: Value = serde_json::from_str(text).map_err(|e| fail(e.to_string()))?;
    let Value::Object(mut fields) = value else {
        return Err(fail("expected a JSON object".into()));
    };

    let id = match fields.remove("id") {
        Some(Value::String(id)) => GlobalId::new(id),
        Some(_) => return Err(fail("`id` is not a string".into())),
        None => return Err(fail("missing `id` field".into())),
    };

    let parent_id = match fields.remove(PARENT_ID_FIELD) {
        Some(Value::String(parent)) => Some(GlobalId::new(parent)),
        Some(_) => return Err(fail(format!("`{PARENT_ID_FIELD}` is not a string"))),
        None => None,
    };

    Ok(ResultRecord {
        id,
        parent_id,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::stream;

    use crate::client::ClientError;
    use crate::test_support::StaticResultFetcher;

    use super::*;

    fn chunked(chunks: &[&str]) -> ResultLines {
        let chunks: Vec<Result<Bytes, ClientError>> = chunks
            .iter()
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk.as_bytes())))
            .collect();
        ResultLines::new(stream::iter(chunks).boxed())
    }

    async fn drain(mut records: ResultLines) -> Vec<Result<ResultRecord, DecodeError>> {
        let mut out = Vec::new();
        while let Some(decoded) = records.next_record().await.unwrap() {
            out.push(decoded);
        }
        out
    }

    async fn lines(body: &str) -> Vec<Result<ResultRecord, DecodeError>> {
        drain(chunked(&[body])).await
    }

    #[tokio::test]
    async fn decodes_records_in_file_order() {
        let records = lines(
            "{\"id\":\"gid://shopify/Product/1\",\"title\":\"Hat\"}\n{\"id\":\"gid://shopify/Product/2\"}\n",
        )
        .await;

        assert_eq!(records.len(), 2);
        let first = records[0].as_ref().unwrap();
        assert_eq!(first.id.as_str(), "gid://shopify/Product/1");
        assert_eq!(first.fields["title"], "Hat");
        assert!(!first.fields.contains_key("id"));
        assert_eq!(
            records[1].as_ref().unwrap().id.as_str(),
            "gid://shopify/Product/2"
        );
    }

    #[tokio::test]
    async fn skips_blank_lines_and_handles_missing_trailing_newline() {
        let records =
            lines("\n{\"id\":\"gid://shopify/Product/1\"}\n\n   \n{\"id\":\"gid://shopify/Product/2\"}").await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(Result::is_ok));
    }

    #[tokio::test]
    async fn tolerates_crlf_line_endings() {
        let records =
            lines("{\"id\":\"gid://shopify/Product/1\"}\r\n{\"id\":\"gid://shopify/Product/2\"}\r\n").await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(Result::is_ok));
    }

    #[tokio::test]
    async fn malformed_line_reports_its_number_and_ingestion_continues() {
        let records = lines(
            "{\"id\":\"gid://shopify/Product/1\"}\n{not json\n{\"id\":\"gid://shopify/Product/3\"}\n",
        )
        .await;

        assert_eq!(records.len(), 3);
        assert!(records[0].is_ok());
        assert_eq!(records[1].as_ref().unwrap_err().line, 2);
        assert_eq!(
            records[2].as_ref().unwrap().id.as_str(),
            "gid://shopify/Product/3"
        );
    }

    #[tokio::test]
    async fn lines_without_ids_are_decode_errors() {
        let records = lines("{\"title\":\"no id\"}\n[1,2]\n{\"id\":5}\n").await;
        assert_eq!(records.len(), 3);
        assert!(records[0].as_ref().unwrap_err().reason.contains("missing"));
        assert!(records[1].as_ref().unwrap_err().reason.contains("object"));
        assert!(records[2].as_ref().unwrap_err().reason.contains("not a string"));
    }

    #[tokio::test]
    async fn lifts_parent_id_out_of_fields() {
        let records = lines(
            "{\"id\":\"gid://shopify/ProductVariant/7\",\"sku\":\"A\",\"__parentId\":\"gid://shopify/Product/1\"}",
        )
        .await;
        let record = records[0].as_ref().unwrap();

        assert_eq!(
            record.parent_id.as_ref().map(|p| p.as_str()),
            Some("gid://shopify/Product/1")
        );
        assert!(!record.fields.contains_key("__parentId"));
        assert_eq!(record.fields["sku"], "A");
    }

    #[tokio::test]
    async fn lines_split_across_chunks_are_reassembled() {
        let records = drain(chunked(&[
            "{\"id\":\"gid://shopify/Product/1\",\"ti",
            "tle\":\"Hat\"}\n{\"id\":\"gid://sho",
            "pify/Product/2\"}\r",
            "\n{broken\n",
            "{\"id\":\"gid://shopify/Product/4\"}",
        ]))
        .await;

        assert_eq!(records.len(), 4);
        let hat = records[0].as_ref().unwrap();
        assert_eq!(hat.id.as_str(), "gid://shopify/Product/1");
        assert_eq!(hat.fields["title"], "Hat");
        assert_eq!(
            records[1].as_ref().unwrap().id.as_str(),
            "gid://shopify/Product/2"
        );
        assert_eq!(records[2].as_ref().unwrap_err().line, 3);
        assert_eq!(
            records[3].as_ref().unwrap().id.as_str(),
            "gid://shopify/Product/4"
        );
    }

    #[tokio::test]
    async fn multibyte_characters_split_across_chunks_decode() {
        let line = "{\"id\":\"gid://shopify/Product/1\",\"title\":\"Café\"}\n".as_bytes();
        let split = line.len() - 4;
        let chunks: Vec<Result<Bytes, ClientError>> = vec![
            Ok(Bytes::copy_from_slice(&line[..split])),
            Ok(Bytes::copy_from_slice(&line[split..])),
        ];

        let records = drain(ResultLines::new(stream::iter(chunks).boxed())).await;
        assert_eq!(records[0].as_ref().unwrap().fields["title"], "Café");
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_skipped() {
        let chunks: Vec<Result<Bytes, ClientError>> = vec![Ok(Bytes::from_static(
            b"{\"id\":\"\xff\"}\n{\"id\":\"gid://shopify/Product/2\"}\n",
        ))];

        let records = drain(ResultLines::new(stream::iter(chunks).boxed())).await;
        assert_eq!(records.len(), 2);
        assert!(records[0].as_ref().unwrap_err().reason.contains("UTF-8"));
        assert!(records[1].is_ok());
    }

    #[tokio::test]
    async fn transport_fault_mid_body_ends_the_read() {
        let chunks: Vec<Result<Bytes, ClientError>> = vec![
            Ok(Bytes::from_static(b"{\"id\":\"gid://shopify/Product/1\"}\n{\"id\"")),
            Err(ClientError::Network("connection reset".into())),
        ];
        let mut records = ResultLines::new(stream::iter(chunks).boxed());

        assert!(records.next_record().await.unwrap().unwrap().is_ok());
        assert!(matches!(
            records.next_record().await,
            Err(SourcingError::Network(_))
        ));
    }

    #[tokio::test]
    async fn ingest_fetches_url_once() {
        let fetcher = StaticResultFetcher::new();
        fetcher.insert(
            "http://results.url",
            "{\"id\":\"gid://shopify/Product/12345\"}\n",
        );

        let records = ResultIngester::new(&fetcher)
            .ingest("http://results.url")
            .await
            .unwrap();

        assert_eq!(drain(records).await.len(), 1);
        assert_eq!(fetcher.fetched(), vec!["http://results.url".to_owned()]);
    }

    #[tokio::test]
    async fn ingest_reads_chunked_bodies() {
        let fetcher = StaticResultFetcher::new();
        fetcher.insert_chunked(
            "http://results.url",
            &["{\"id\":\"gid://shopify/Pro", "duct/1\"}\n{\"id\":\"gid://shopify/Product/2\"}\n"],
        );

        let records = ResultIngester::new(&fetcher)
            .ingest("http://results.url")
            .await
            .unwrap();

        let ids: Vec<String> = drain(records)
            .await
            .into_iter()
            .map(|r| r.unwrap().id.as_str().to_owned())
            .collect();
        assert_eq!(ids, vec!["gid://shopify/Product/1", "gid://shopify/Product/2"]);
    }

    #[tokio::test]
    async fn ingest_propagates_fetch_failures() {
        let fetcher = StaticResultFetcher::new();
        let result = ResultIngester::new(&fetcher).ingest("http://missing").await;
        assert!(matches!(result, Err(SourcingError::Network(_))));
    }
}
