use std::time::Duration;

use bulk_source::{BulkOperation, ClientError, Credentials, OperationClient, OperationId};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::dto::{
    CancelData, CurrentData, GraphqlError, GraphqlRequest, GraphqlResponse, NodeData, StartData,
};
use crate::queries;

const DEFAULT_API_VERSION: &str = "2024-01";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
pub(crate) const USER_AGENT: &str = "bulk-source";

/// Configuration for the Admin API GraphQL client.
#[derive(Debug, Clone)]
pub struct ShopifyClientConfig {
    /// Store domain, e.g. `my-shop.myshopify.com`.
    pub store: String,
    pub credentials: Credentials,
    pub api_version: String,
    /// Overrides `https://{store}`; used by tests.
    pub api_base_url: Option<String>,
    /// Applied to every request.
    pub request_timeout: Duration,
}

impl ShopifyClientConfig {
    pub fn new(store: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            store: store.into(),
            credentials,
            api_version: DEFAULT_API_VERSION.to_owned(),
            api_base_url: None,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// `OperationClient` backed by the Shopify Admin GraphQL API.
pub struct ShopifyOperationClient {
    config: ShopifyClientConfig,
    client: reqwest::Client,
}

impl ShopifyOperationClient {
    pub fn new(config: ShopifyClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Network(format!("could not build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        let base = match &self.config.api_base_url {
            Some(base) => base.trim_end_matches('/').to_owned(),
            None => format!("https://{}", self.config.store),
        };
        format!("{base}/admin/api/{}/graphql.json", self.config.api_version)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, ClientError> {
        let response = self
            .client
            .post(self.endpoint())
            .header(ACCESS_TOKEN_HEADER, self.config.credentials.expose())
            .json(&GraphqlRequest { query, variables })
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown".into());
            let message = format!("HTTP {status}: {body}");
            // Rate limits and server faults are retried on the next attempt;
            // any other 4xx will not get better by asking again.
            return Err(
                if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
                    ClientError::Rejected(vec![message])
                } else {
                    ClientError::Network(message)
                },
            );
        }

        let envelope: GraphqlResponse<T> = response
            .json()
            .await
            .map_err(|e| ClientError::Malformed(e.to_string()))?;

        if !envelope.errors.is_empty() {
            let transient = envelope.errors.iter().all(GraphqlError::is_transient);
            let messages: Vec<String> = envelope.errors.into_iter().map(|e| e.message).collect();
            if transient {
                warn!(errors = ?messages, "transient GraphQL errors");
                return Err(ClientError::Network(messages.join("; ")));
            }
            return Err(ClientError::Rejected(messages));
        }

        envelope
            .data
            .ok_or_else(|| ClientError::Malformed("response carried no data".into()))
    }
}

#[async_trait::async_trait]
impl OperationClient for ShopifyOperationClient {
    async fn start(&self, query: &str) -> Result<BulkOperation, ClientError> {
        let data: StartData = self
            .execute(queries::START_OPERATION, json!({ "query": query }))
            .await?;
        let operation = data.bulk_operation_run_query.into_operation()?;
        debug!(operation_id = %operation.id, status = %operation.status, "started bulk operation");
        Ok(operation)
    }

    async fn cancel(&self, id: &OperationId) -> Result<BulkOperation, ClientError> {
        let data: CancelData = self
            .execute(queries::CANCEL_OPERATION, json!({ "id": id.as_str() }))
            .await?;
        data.bulk_operation_cancel.into_operation()
    }

    async fn current(&self) -> Result<Option<BulkOperation>, ClientError> {
        let data: CurrentData = self
            .execute(queries::OPERATION_STATUS, json!({}))
            .await?;
        data.current_bulk_operation
            .map(|node| node.into_operation())
            .transpose()
    }

    async fn by_id(&self, id: &OperationId) -> Result<BulkOperation, ClientError> {
        let data: NodeData = self
            .execute(queries::OPERATION_BY_ID, json!({ "id": id.as_str() }))
            .await?;
        data.node
            .ok_or_else(|| ClientError::Rejected(vec![format!("no bulk operation with id {id}")]))?
            .into_operation()
    }
}
