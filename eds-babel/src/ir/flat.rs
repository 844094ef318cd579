//! The persisted, id-indexed document stored inside an EDS container.
//!
//! Record order is the pre-order traversal of the installation tree. `parent`
//! holds an id, not an index, and `0` marks a root. The `active` and `id`
//! sequences run parallel to `data`.
//!
//! Keys the editor writes that this crate does not model are kept in `extra`
//! so an EDS → EDS pass does not drop them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use crate::error::EdsError;
use crate::ir::sitplan::SitePlanDocument;

/// Placeholder the editor uses for the supply description.
pub const DEFAULT_INFO: &str = "2 x 230V ~50 Hz";
/// Two-character-plus line break marker used inside free-text properties.
pub const LINE_BREAK: &str = "<br>";

/// One element of the installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub id: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parent: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub indent: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub collapsed: bool,
    /// Always contains `type` and `nr` for records produced by the flattener.
    #[serde(default, deserialize_with = "null_as_default")]
    pub props: Map<String, Value>,
    #[serde(default)]
    pub sourcelist: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlatRecord {
    pub fn node_type(&self) -> &str {
        self.props.get("type").and_then(Value::as_str).unwrap_or("")
    }

    /// The record's sequence number as text; empty when absent.
    pub fn nr(&self) -> String {
        self.props.get("nr").map(value_text).unwrap_or_default()
    }
}

/// Owner/installer/control/info block of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentProperties {
    #[serde(default, deserialize_with = "nullable_string")]
    pub filename: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub owner: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub installer: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub control: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub info: String,
    #[serde(rename = "currentView", default)]
    pub current_view: Value,
    #[serde(rename = "legacySchakelaars", default)]
    pub legacy_schakelaars: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DocumentProperties {
    fn default() -> Self {
        DocumentProperties {
            filename: String::new(),
            owner: String::new(),
            installer: String::new(),
            control: String::new(),
            info: DEFAULT_INFO.to_string(),
            current_view: Value::Null,
            legacy_schakelaars: false,
            extra: Map::new(),
        }
    }
}

/// The complete payload of an EDS container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatDocument {
    #[serde(rename = "currentView", default)]
    pub current_view: String,
    #[serde(rename = "idToOrdinalMap", default)]
    pub id_to_ordinal_map: Map<String, Value>,
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub data: Vec<FlatRecord>,
    #[serde(default)]
    pub active: Vec<bool>,
    #[serde(rename = "id", default)]
    pub ids: Vec<u32>,
    #[serde(default = "default_print_table")]
    pub print_table: Value,
    #[serde(default)]
    pub properties: DocumentProperties,
    #[serde(default)]
    pub curid: u32,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub sitplan: Value,
    #[serde(default)]
    pub sitplanjson: Option<SitePlanDocument>,
    #[serde(default)]
    pub sitplanview: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlatDocument {
    /// Assemble a document around freshly flattened records.
    pub fn new(
        records: Vec<FlatRecord>,
        next_id: u32,
        properties: DocumentProperties,
        sitplan: SitePlanDocument,
    ) -> Self {
        let active = vec![true; records.len()];
        let ids = records.iter().map(|r| r.id).collect();
        FlatDocument {
            current_view: String::new(),
            id_to_ordinal_map: Map::new(),
            length: records.len(),
            data: records,
            active,
            ids,
            print_table: default_print_table(),
            properties,
            curid: next_id,
            mode: default_mode(),
            sitplan: Value::Null,
            sitplanjson: Some(sitplan),
            sitplanview: Value::Null,
            extra: Map::new(),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, EdsError> {
        if !value.is_object() {
            return Err(EdsError::Malformed(
                "payload is not a JSON object".to_string(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Result<Value, EdsError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn record(&self, id: u32) -> Option<&FlatRecord> {
        self.data.iter().find(|r| r.id == id)
    }
}

/// Print layout the editor expects on a new document.
pub fn default_print_table() -> Value {
    json!({
        "height": 562,
        "maxwidth": 484,
        "displaypage": 0,
        "enableAutopage": true,
        "printPageMode": "all",
        "printPageRange": "",
        "pages": [{"height": 562, "start": 0, "stop": 484, "info": DEFAULT_INFO}],
        "pagemarkers": {"markers": []},
        "modevertical": "alles",
        "starty": 0,
        "stopy": 562,
        "papersize": "A4"
    })
}

fn default_mode() -> String {
    "edit".to_string()
}

/// Trim authored free text and replace newlines with the line break marker.
pub fn encode_free_text(text: &str) -> String {
    text.trim().replace('\n', LINE_BREAK)
}

/// Inverse of [`encode_free_text`] (trimming is not undone).
pub fn decode_free_text(text: &str) -> String {
    text.replace(LINE_BREAK, "\n")
}

/// Textual form of a property value, used wherever the container compares or
/// stores values as text. Strings are taken verbatim; everything else uses its
/// JSON spelling, so `1` and `"1"` compare equal but `1` and `1.0` do not.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    null_as_default(deserializer)
}

/// Reads `null` as the type's default, the same as a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
