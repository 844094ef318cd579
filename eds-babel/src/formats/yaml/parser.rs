//! Authored YAML → flat document.

use std::path::Path;

use log::debug;
use serde_json::Value;

use crate::common::nested_to_flat::compile_document;
use crate::error::EdsError;
use crate::ir::authoring::AuthoredDocument;
use crate::ir::flat::FlatDocument;
use crate::schema::TypeDefaults;

/// Parse YAML text into the generic value model.
///
/// Goes through `serde_yaml::Value` first so non-string mapping keys (a bare
/// `1:` in a hand-written file) become their string spelling instead of
/// failing.
pub fn yaml_to_value(source: &str) -> Result<Value, EdsError> {
    if source.trim().is_empty() {
        return Ok(Value::Null);
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(source)?;
    Ok(serde_json::to_value(yaml)?)
}

/// Parse an authored document and compile it into the container model.
pub fn parse_document(
    source: &str,
    schema: &TypeDefaults,
    asset_dir: Option<&Path>,
) -> Result<FlatDocument, EdsError> {
    let value = yaml_to_value(source)?;
    let authored = AuthoredDocument::from_value(value)?;
    let doc = compile_document(&authored, schema, asset_dir);
    debug!(
        "compiled {} records, {} site-plan elements",
        doc.data.len(),
        doc.sitplanjson.as_ref().map_or(0, |s| s.elements.len())
    );
    Ok(doc)
}
