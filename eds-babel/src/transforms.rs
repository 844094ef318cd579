//! Inspect transforms
//!
//! Views of a parsed document for debugging a container, as opposed to the
//! round-trippable formats in the registry:
//!
//! - `payload-json`: the decoded container payload, pretty-printed
//! - `records-treeviz`: the record list drawn as a tree (accepts `props`)
//! - `refs-list`: one `<ref>\t<id>\t<type>` line per cross-reference

use std::collections::HashMap;

use crate::common::groups::scan_groups;
use crate::error::EdsError;
use crate::formats::treeviz::to_treeviz_str_with_params;
use crate::ir::flat::FlatDocument;

/// All available inspect transforms
pub const AVAILABLE_TRANSFORMS: &[&str] = &["payload-json", "records-treeviz", "refs-list"];

pub const DEFAULT_TRANSFORM: &str = "records-treeviz";

/// Execute a named transform on a parsed document
pub fn execute_transform(
    doc: &FlatDocument,
    transform_name: &str,
    params: &HashMap<String, String>,
) -> Result<String, EdsError> {
    match transform_name {
        "payload-json" => {
            let mut text = serde_json::to_string_pretty(&doc.to_value()?)?;
            text.push('\n');
            Ok(text)
        }
        "records-treeviz" => Ok(to_treeviz_str_with_params(doc, params)),
        "refs-list" => Ok(refs_list(doc)),
        other => Err(EdsError::NotSupported(format!(
            "Unknown transform '{other}'"
        ))),
    }
}

fn refs_list(doc: &FlatDocument) -> String {
    let scan = scan_groups(&doc.data);
    scan.cross_references(&doc.data)
        .iter()
        .map(|(reference, &id)| {
            let node_type = doc.record(id).map_or("", |r| r.node_type());
            format!("{reference}\t{id}\t{node_type}\n")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FormatRegistry;

    fn document() -> FlatDocument {
        FormatRegistry::with_defaults()
            .unwrap()
            .parse(
                "- Kring:\n    children: [Lichtcircuit, Contactdoos]\n- Kring:\n    children: [Lichtpunt]\n",
                "yaml",
            )
            .unwrap()
    }

    #[test]
    fn refs_list_follows_record_order() {
        let output = execute_transform(&document(), "refs-list", &HashMap::new()).unwrap();
        insta::assert_snapshot!(output, @r"
        A.1	2	Lichtcircuit
        A.2	3	Contactdoos
        B.1	5	Lichtpunt
        ");
    }

    #[test]
    fn payload_json_is_the_container_payload() {
        let output = execute_transform(&document(), "payload-json", &HashMap::new()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["length"], 5);
        assert_eq!(value["mode"], "edit");
    }

    #[test]
    fn unknown_transform_is_rejected() {
        let result = execute_transform(&document(), "ast-tag", &HashMap::new());
        assert!(matches!(result, Err(EdsError::NotSupported(_))));
    }
}
