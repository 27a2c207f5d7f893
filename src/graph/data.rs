//! Data links: references from a node to payloads held by the blob store

use super::types::EntityKind;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Blob store identifier, `<entityKind>/<key>/<key>___<dataName>.<ext>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        FileId(id.into())
    }

    /// Conventional id for a data attachment
    pub fn for_data(kind: EntityKind, key: &str, data_name: &str, extension: &str) -> Self {
        FileId(format!(
            "{}/{}/{}___{}.{}",
            kind.as_str(),
            key,
            key,
            data_name,
            extension
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entry of a node's data map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLink {
    /// Data name as declared in the `data` clause
    pub name: String,
    pub file_id: FileId,
    /// Declared type name of the payload (defaults to `json`)
    pub type_name: String,
}

/// Payload attached to a write statement, before it is uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataAttachment {
    pub name: String,
    pub type_name: String,
    pub payload: Bytes,
}

impl DataAttachment {
    pub fn json(name: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            type_name: "json".to_string(),
            payload: payload.into(),
        }
    }
}

/// A data link returned by `select ... return`, with its payload when the
/// blob store could serve it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataLinkResult {
    pub node_key: String,
    pub link: DataLink,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_convention() {
        let id = FileId::for_data(EntityKind::Node, "node1", "contract", "json");
        assert_eq!(id.as_str(), "node/node1/node1___contract.json");
    }

    #[test]
    fn test_json_attachment() {
        let attachment = DataAttachment::json("doc", r#"{"a":1}"#);
        assert_eq!(attachment.type_name, "json");
        assert_eq!(attachment.payload, Bytes::from_static(br#"{"a":1}"#));
    }
}
