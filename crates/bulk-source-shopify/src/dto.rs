//! Wire shapes of Admin API responses.

use bulk_source::{BulkOperation, ClientError, OperationId, OperationStatus};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Request body for `POST /admin/api/{version}/graphql.json`.
#[derive(Debug, Serialize)]
pub struct GraphqlRequest<'a> {
    pub query: &'a str,
    pub variables: Value,
}

/// Standard GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<GraphqlErrorExtensions>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlErrorExtensions {
    #[serde(default)]
    pub code: Option<String>,
}

impl GraphqlError {
    /// Rate limiting and server faults clear up on their own.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.extensions.as_ref().and_then(|e| e.code.as_deref()),
            Some("THROTTLED" | "INTERNAL_SERVER_ERROR")
        )
    }
}

/// A `BulkOperation` object as selected by [`crate::queries`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationNode {
    pub id: String,
    pub status: String,
    /// `UnsignedInt64` is serialized as a string.
    #[serde(default, deserialize_with = "object_count")]
    pub object_count: u64,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
}

impl BulkOperationNode {
    pub fn into_operation(self) -> Result<BulkOperation, ClientError> {
        let status = OperationStatus::parse(&self.status).ok_or_else(|| {
            ClientError::Malformed(format!("unknown bulk operation status `{}`", self.status))
        })?;

        Ok(BulkOperation {
            id: OperationId::new(self.id),
            status,
            object_count: self.object_count,
            query: self.query.unwrap_or_default(),
            url: self.url.filter(|url| !url.is_empty()),
            error_code: self.error_code,
        })
    }
}

fn object_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    match Option::<Count>::deserialize(deserializer)? {
        Some(Count::Number(n)) => Ok(n),
        Some(Count::Text(s)) => s.parse().map_err(serde::de::Error::custom),
        None => Ok(0),
    }
}

#[derive(Debug, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

impl UserError {
    pub fn describe(&self) -> String {
        match &self.field {
            Some(field) if !field.is_empty() => format!("{}: {}", field.join("."), self.message),
            _ => self.message.clone(),
        }
    }
}

/// Payload shared by `bulkOperationRunQuery` and `bulkOperationCancel`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationPayload {
    pub bulk_operation: Option<BulkOperationNode>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

impl MutationPayload {
    pub fn into_operation(self) -> Result<BulkOperation, ClientError> {
        if !self.user_errors.is_empty() {
            return Err(ClientError::Rejected(
                self.user_errors.iter().map(UserError::describe).collect(),
            ));
        }
        self.bulk_operation
            .ok_or_else(|| ClientError::Malformed("mutation returned no bulk operation".into()))?
            .into_operation()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartData {
    pub bulk_operation_run_query: MutationPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelData {
    pub bulk_operation_cancel: MutationPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentData {
    pub current_bulk_operation: Option<BulkOperationNode>,
}

#[derive(Debug, Deserialize)]
pub struct NodeData {
    pub node: Option<BulkOperationNode>,
}
