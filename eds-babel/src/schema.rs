//! Type defaults registry
//!
//! Maps every element type name to the property set a fresh record of that
//! type starts with. The registry is built once (from the bundled schema or an
//! external file) and is read-only afterwards; callers share it behind an `Arc`.
//!
//! Schema file layout:
//!
//! ```yaml
//! version: "1.0.0"
//! types:
//!   Kring:
//!     defaults:
//!       amperage: "16"
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::EdsError;

const BUNDLED_SCHEMA: &str = include_str!("../schema/schema.yaml");
const FALLBACK_VERSION: &str = "1.0.0";

/// Type name that opens a reference group and auto-numbers its children.
pub const GROUP_TYPE: &str = "Kring";
/// Property of the grouping type that the editor fills in by itself.
pub const GROUP_NAME_PROPERTY: &str = "naam";
/// Properties whose literal value `"auto"` means "let the editor decide".
pub const AUTO_FIELDS: &[&str] = &["autonr", "autoKringNaam"];

#[derive(Debug, Deserialize)]
struct SchemaFile {
    version: Option<String>,
    #[serde(default)]
    types: IndexMap<String, Option<TypeEntry>>,
}

#[derive(Debug, Default, Deserialize)]
struct TypeEntry {
    #[serde(default)]
    defaults: Option<Map<String, Value>>,
}

/// Read-only lookup from type name to its default property set.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefaults {
    version: String,
    types: IndexMap<String, Map<String, Value>>,
}

impl TypeDefaults {
    /// The schema bundled with this crate.
    pub fn builtin() -> Result<Self, EdsError> {
        Self::from_yaml_str(BUNDLED_SCHEMA)
    }

    /// Load an external schema file. A missing or malformed file is fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EdsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| EdsError::io(path, e))?;
        Self::from_yaml_str(&text)
            .map_err(|e| EdsError::Schema(format!("{}: {e}", path.display())))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, EdsError> {
        let file: SchemaFile =
            serde_yaml::from_str(text).map_err(|e| EdsError::Schema(e.to_string()))?;
        let types = file
            .types
            .into_iter()
            .map(|(name, entry)| {
                let defaults = entry.and_then(|e| e.defaults).unwrap_or_default();
                (name, defaults)
            })
            .collect();
        Ok(TypeDefaults {
            version: file.version.unwrap_or_else(|| FALLBACK_VERSION.to_string()),
            types,
        })
    }

    /// Build a registry directly from in-memory defaults.
    pub fn from_types(
        version: impl Into<String>,
        types: impl IntoIterator<Item = (String, Map<String, Value>)>,
    ) -> Self {
        TypeDefaults {
            version: version.into(),
            types: types.into_iter().collect(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Defaults for `type_name`; empty for unknown types.
    pub fn defaults_for(&self, type_name: &str) -> Map<String, Value> {
        self.types.get(type_name).cloned().unwrap_or_default()
    }

    /// Default value of a single property, if the type declares one.
    pub fn default_value(&self, type_name: &str, key: &str) -> Option<&Value> {
        self.types.get(type_name).and_then(|d| d.get(key))
    }

    pub fn is_known(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Type names in schema order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}
