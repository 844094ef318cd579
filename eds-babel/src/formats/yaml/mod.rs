//! YAML authoring format
//!
//! The human-written side of the converter. A document has four optional
//! top-level blocks:
//!
//! | Key          | Content                                               |
//! |--------------|-------------------------------------------------------|
//! | `metadata`   | provenance, written on export and ignored on import   |
//! | `properties` | owner / installer / control / info free text          |
//! | `sitplan`    | site-plan layers (`sitplanjson` is accepted as alias) |
//! | `elements`   | the element tree, in any shorthand                    |
//!
//! A file without any of these keys is read as the element tree itself.
//!
//! # Options
//!
//! - `asset-dir` (parse): directory site-plan images are read from
//! - `image-dir` (serialize): directory embedded images are extracted to
//! - `metadata` (serialize): `true`/`false`, overrides the format default
//!
//! # Lossy Conversions
//!
//! - properties equal to their type default are not written, and come back
//!   as defaults on import
//! - the grouping type's `naam` is never written
//! - site-plan positions are rounded to one decimal
//! - embedded images that are not extracted come back as empty pictures

mod parser;
mod serializer;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub use parser::{parse_document, yaml_to_value};
pub use serializer::{
    authored_properties, inline_annotations, metadata_now, serialize_document, ExportOptions,
};

use crate::common::sitplan::media::ImageExtractor;
use crate::error::EdsError;
use crate::format::Format;
use crate::ir::flat::FlatDocument;
use crate::schema::TypeDefaults;

/// Format implementation for authored YAML
pub struct YamlFormat {
    schema: Arc<TypeDefaults>,
    include_metadata: bool,
}

impl YamlFormat {
    pub fn new(schema: Arc<TypeDefaults>) -> Self {
        Self {
            schema,
            include_metadata: true,
        }
    }

    /// Whether exported files start with a `metadata:` block.
    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    pub fn schema(&self) -> &TypeDefaults {
        &self.schema
    }
}

impl Format for YamlFormat {
    fn name(&self) -> &str {
        "yaml"
    }

    fn description(&self) -> &str {
        "Authored installation tree in YAML"
    }

    fn file_extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<FlatDocument, EdsError> {
        parse_document(source, &self.schema, None)
    }

    fn serialize(&self, doc: &FlatDocument) -> Result<String, EdsError> {
        serialize_document(
            doc,
            &self.schema,
            ExportOptions {
                include_metadata: self.include_metadata,
                images: None,
            },
        )
    }

    fn parse_with_options(
        &self,
        source: &str,
        options: &HashMap<String, String>,
    ) -> Result<FlatDocument, EdsError> {
        reject_unknown(options, &["asset-dir"])?;
        let asset_dir = options.get("asset-dir").map(Path::new);
        parse_document(source, &self.schema, asset_dir)
    }

    fn serialize_with_options(
        &self,
        doc: &FlatDocument,
        options: &HashMap<String, String>,
    ) -> Result<String, EdsError> {
        reject_unknown(options, &["image-dir", "metadata"])?;
        let include_metadata = match options.get("metadata").map(String::as_str) {
            None => self.include_metadata,
            Some("true") => true,
            Some("false") => false,
            Some(other) => {
                return Err(EdsError::NotSupported(format!(
                    "metadata option expects true or false, got '{other}'"
                )))
            }
        };
        let mut extractor = options.get("image-dir").map(ImageExtractor::new);
        serialize_document(
            doc,
            &self.schema,
            ExportOptions {
                include_metadata,
                images: extractor.as_mut(),
            },
        )
    }
}

fn reject_unknown(options: &HashMap<String, String>, known: &[&str]) -> Result<(), EdsError> {
    match options.keys().find(|key| !known.contains(&key.as_str())) {
        Some(key) => Err(EdsError::NotSupported(format!(
            "Format 'yaml' does not support parameter '{key}'"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::EdsFormat;

    fn format() -> YamlFormat {
        YamlFormat::new(Arc::new(TypeDefaults::builtin().unwrap())).with_metadata(false)
    }

    #[test]
    fn exports_stripped_tree_with_annotations() {
        let doc = format()
            .parse("- Kring:\n    amperage: '20'\n    children: [Lichtcircuit, Contactdoos]\n")
            .unwrap();
        insta::assert_snapshot!(format().serialize(&doc).unwrap(), @r"
        elements:
        - Kring: #A
            amperage: '20'
            children:
            - Lichtcircuit: #A.1
            - Contactdoos: #A.2
        ");
    }

    #[test]
    fn exported_yaml_reimports_to_the_same_records() {
        let yaml = format();
        let first = yaml
            .parse(
                "properties:\n  owner: Jan\nelements:\n  - Bord:\n      children:\n        - Kring:\n            children: [Lichtpunt, {Contactdoos: {aantal: 2}}]\n",
            )
            .unwrap();
        let text = yaml.serialize(&first).unwrap();
        let second = yaml.parse(&text).unwrap();
        assert_eq!(second.data, first.data);
        assert_eq!(second.properties, first.properties);
    }

    #[test]
    fn eds_to_yaml_to_eds_keeps_records() {
        let yaml = format();
        let doc = yaml.parse("- Kring:\n    children: [Lichtcircuit]\n").unwrap();
        let container = EdsFormat.serialize(&doc).unwrap();
        let decoded = EdsFormat.parse(&container).unwrap();
        let again = yaml.parse(&yaml.serialize(&decoded).unwrap()).unwrap();
        assert_eq!(again.data, doc.data);
    }

    #[test]
    fn metadata_option_overrides_default() {
        let yaml = format();
        let doc = yaml.parse("[Lichtcircuit]").unwrap();
        let options = HashMap::from([("metadata".to_string(), "true".to_string())]);
        let text = yaml.serialize_with_options(&doc, &options).unwrap();
        assert!(text.starts_with("metadata:\n"));
        assert!(text.contains("schema_version:"));
    }

    #[test]
    fn unknown_option_is_rejected() {
        let options = HashMap::from([("theme".to_string(), "dark".to_string())]);
        let result = format().parse_with_options("[]", &options);
        assert!(matches!(result, Err(EdsError::NotSupported(_))));
    }
}
