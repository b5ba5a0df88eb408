//! GraphQL documents for the Admin API bulk operation endpoints.
//!
//! Every document selects the same `BulkOperation` fields:
//! `id status objectCount query url errorCode`.

pub const START_OPERATION: &str = "mutation START_OPERATION($query: String!) { \
    bulkOperationRunQuery(query: $query) { \
    bulkOperation { id status objectCount query url errorCode } \
    userErrors { field message } } }";

pub const CANCEL_OPERATION: &str = "mutation CANCEL_OPERATION($id: ID!) { \
    bulkOperationCancel(id: $id) { \
    bulkOperation { id status objectCount query url errorCode } \
    userErrors { field message } } }";

pub const OPERATION_STATUS: &str = "query OPERATION_STATUS { \
    currentBulkOperation { id status objectCount query url errorCode } }";

pub const OPERATION_BY_ID: &str = "query OPERATION_BY_ID($id: ID!) { \
    node(id: $id) { ... on BulkOperation { id status objectCount query url errorCode } } }";
