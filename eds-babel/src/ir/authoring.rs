//! Top-level shape of an authored document.
//!
//! ```yaml
//! metadata: {...}        # written on export, ignored on import
//! properties:
//!   owner: "Jan Peeters"
//! sitplan:
//!   defaults: {scale: 0.5}
//!   layers: [...]
//! elements:
//!   - Kring: {...}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EdsError;
use crate::ir::flat::{encode_free_text, DocumentProperties, DEFAULT_INFO};
use crate::ir::sitplan::SitePlanSpec;

const DOCUMENT_KEYS: &[&str] = &["metadata", "properties", "sitplan", "sitplanjson", "elements"];

/// Free-text fields of the `properties:` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthoredProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl AuthoredProperties {
    pub fn is_empty(&self) -> bool {
        self.owner.is_none()
            && self.installer.is_none()
            && self.control.is_none()
            && self.info.is_none()
    }

    /// Container form: trimmed, newlines encoded, `info` falling back to the
    /// standard supply description.
    pub fn to_document_properties(&self) -> DocumentProperties {
        let text = |field: &Option<String>| encode_free_text(field.as_deref().unwrap_or(""));
        DocumentProperties {
            owner: text(&self.owner),
            installer: text(&self.installer),
            control: text(&self.control),
            info: encode_free_text(self.info.as_deref().unwrap_or(DEFAULT_INFO)),
            ..DocumentProperties::default()
        }
    }
}

/// Provenance block written at the top of exported files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub schema_version: String,
    pub tool_version: String,
    pub generated_at: String,
}

/// A parsed authored document, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthoredDocument {
    pub properties: AuthoredProperties,
    pub sitplan: Option<SitePlanSpec>,
    /// A single node or a list of root nodes, still in authored form.
    pub elements: Value,
}

impl AuthoredDocument {
    /// Split a parsed YAML/JSON value into its blocks.
    ///
    /// A mapping carrying any of the document keys is a document; anything
    /// else (a list, a bare type name, a single node mapping) is taken as the
    /// element tree itself.
    pub fn from_value(value: Value) -> Result<Self, EdsError> {
        let Value::Object(mut map) = value else {
            return Ok(AuthoredDocument {
                elements: value,
                ..Default::default()
            });
        };
        if !DOCUMENT_KEYS.iter().any(|k| map.contains_key(*k)) {
            return Ok(AuthoredDocument {
                elements: Value::Object(map),
                ..Default::default()
            });
        }

        let properties = match map.remove("properties") {
            Some(Value::Null) | None => AuthoredProperties::default(),
            Some(value) => serde_json::from_value(value)?,
        };
        let sitplan_value = map
            .remove("sitplan")
            .filter(|v| !v.is_null())
            .or_else(|| map.remove("sitplanjson"));
        let sitplan = match sitplan_value {
            Some(Value::Null) | None => None,
            Some(value) => Some(serde_json::from_value(value)?),
        };
        let elements = map.remove("elements").unwrap_or(Value::Array(Vec::new()));

        Ok(AuthoredDocument {
            properties,
            sitplan,
            elements,
        })
    }
}

/// Assemble the export mapping in its fixed key order.
pub fn document_value(
    metadata: Option<&Metadata>,
    properties: &AuthoredProperties,
    sitplan: Option<&SitePlanSpec>,
    elements: Vec<Value>,
) -> Result<Value, EdsError> {
    let mut map = Map::new();
    if let Some(metadata) = metadata {
        map.insert("metadata".to_string(), serde_json::to_value(metadata)?);
    }
    if !properties.is_empty() {
        map.insert("properties".to_string(), serde_json::to_value(properties)?);
    }
    if let Some(sitplan) = sitplan {
        map.insert("sitplan".to_string(), serde_json::to_value(sitplan)?);
    }
    map.insert("elements".to_string(), Value::Array(elements));
    Ok(Value::Object(map))
}
