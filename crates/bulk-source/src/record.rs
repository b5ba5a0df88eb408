use serde::Serialize;
use serde_json::{Map, Value};

use crate::global_id::GlobalId;
use crate::host::Host;

/// Host-assigned identifier of a materialized local file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One decoded line of a result artifact.
///
/// `id` and `__parentId` are lifted out of `fields`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub id: GlobalId,
    pub parent_id: Option<GlobalId>,
    pub fields: Map<String, Value>,
}

/// A record reshaped for the host. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentNode {
    pub id: String,
    pub shopify_id: GlobalId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_shopify_id: Option<GlobalId>,
    pub node_type: String,
    pub content_digest: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ContentNode {
    pub fn from_record(record: ResultRecord, host: &dyn Host, type_prefix: &str) -> Self {
        let entity_type = record.id.entity_type().unwrap_or("Node");
        let node_type = format!("{type_prefix}{entity_type}");
        let content_digest = host.content_digest(&Value::Object(record.fields.clone()));

        Self {
            id: host.create_node_id(record.id.as_str()),
            node_type,
            content_digest,
            shopify_id: record.id,
            parent_shopify_id: record.parent_id,
            fields: record.fields,
        }
    }
}
