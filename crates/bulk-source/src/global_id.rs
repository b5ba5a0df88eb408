use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque global identifier of a remote entity,
/// shaped like `gid://shopify/Product/12345`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalId(String);

impl GlobalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The entity type segment (`Product` in `gid://shopify/Product/1`).
    pub fn entity_type(&self) -> Option<&str> {
        self.segments().map(|(_, kind, _)| kind)
    }

    /// The trailing id segment, with any query suffix removed.
    pub fn numeric_id(&self) -> Option<&str> {
        self.segments().map(|(_, _, id)| id)
    }

    fn segments(&self) -> Option<(&str, &str, &str)> {
        let (_scheme, rest) = self.0.split_once("://")?;
        let mut parts = rest.splitn(3, '/');
        let namespace = parts.next().filter(|s| !s.is_empty())?;
        let kind = parts.next().filter(|s| !s.is_empty())?;
        let id = parts.next()?;
        let id = id.split('?').next().unwrap_or(id);
        if id.is_empty() {
            return None;
        }
        Some((namespace, kind, id))
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
