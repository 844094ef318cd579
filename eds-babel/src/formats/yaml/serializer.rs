//! Flat document → authored YAML.
//!
//! The element tree comes from `flat_to_nested`, the site plan from the
//! inverse layer transform. Group annotations travel as `_comment` entries
//! until the very end, where they are folded into inline `#A` / `#A.1`
//! comments on the line that names the element. Site-plan `pos` and `size`
//! pairs are written as flow lists.

use std::sync::OnceLock;

use chrono::{SecondsFormat, Utc};
use regex::Regex;

use crate::common::flat_to_nested::build_tree;
use crate::common::groups::scan_groups;
use crate::common::sitplan::inverse::site_plan_layers;
use crate::common::sitplan::media::ImageExtractor;
use crate::error::EdsError;
use crate::ir::authoring::{document_value, AuthoredProperties, Metadata};
use crate::ir::flat::{decode_free_text, DocumentProperties, FlatDocument, DEFAULT_INFO};
use crate::schema::TypeDefaults;

/// Export settings for one serialization run.
#[derive(Debug, Default)]
pub struct ExportOptions<'a> {
    pub include_metadata: bool,
    /// Where embedded site-plan images are written; `None` keeps only their size.
    pub images: Option<&'a mut ImageExtractor>,
}

/// Provenance block for a document exported now.
pub fn metadata_now(schema: &TypeDefaults) -> Metadata {
    Metadata {
        schema_version: schema.version().to_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

/// Authored `properties:` block; empty fields and the standard supply
/// description are left out.
pub fn authored_properties(props: &DocumentProperties) -> AuthoredProperties {
    let text = |value: &str| (!value.is_empty()).then(|| decode_free_text(value));
    AuthoredProperties {
        owner: text(&props.owner),
        installer: text(&props.installer),
        control: text(&props.control),
        info: text(&props.info).filter(|_| props.info != DEFAULT_INFO),
    }
}

pub fn serialize_document(
    doc: &FlatDocument,
    schema: &TypeDefaults,
    options: ExportOptions<'_>,
) -> Result<String, EdsError> {
    let elements = build_tree(&doc.data, schema);
    let scan = scan_groups(&doc.data);
    let sitplan = site_plan_layers(doc.sitplanjson.as_ref(), &scan.references, options.images)?;
    let metadata = options.include_metadata.then(|| metadata_now(schema));

    let value = document_value(
        metadata.as_ref(),
        &authored_properties(&doc.properties),
        sitplan.as_ref(),
        elements,
    )?;
    let text = serde_yaml::to_string(&value)?;
    Ok(inline_annotations(&flow_pairs(&text)))
}

fn pair_key_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\s*(?:- )?)(pos|size):\s*$").expect("pair key pattern is valid")
    })
}

fn number_item_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\s*)- (-?[0-9]+(?:\.[0-9]+)?(?:[eE][-+]?[0-9]+)?)\s*$")
            .expect("number item pattern is valid")
    })
}

/// Rewrite block sequences of exactly two numbers under `pos:` or `size:` as
/// `[x, y]`.
pub fn flow_pairs(yaml: &str) -> String {
    let lines: Vec<&str> = yaml.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;
    while i < lines.len() {
        if let Some(folded) = fold_pair(&lines[i..]) {
            out.push(folded);
            i += 3;
        } else {
            out.push(lines[i].to_string());
            i += 1;
        }
    }
    let mut text = out.join("\n");
    if yaml.ends_with('\n') {
        text.push('\n');
    }
    text
}

fn fold_pair(lines: &[&str]) -> Option<String> {
    let key = pair_key_line().captures(lines.first()?)?;
    let column = key[1].len();
    let item = |line: Option<&&str>| {
        let captures = number_item_line().captures(line?)?;
        let indent = captures[1].len();
        (indent == column || indent == column + 2).then(|| captures[2].to_string())
    };
    let x = item(lines.get(1))?;
    let y = item(lines.get(2))?;
    if item(lines.get(3)).is_some() {
        return None;
    }
    Some(format!("{}{}: [{x}, {y}]", &key[1], &key[2]))
}

fn annotation_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^\s*_comment:\s*["']?(#[A-Z]+(?:\.[^"'\s]+)?)["']?\s*$"#)
            .expect("annotation pattern is valid")
    })
}

/// Fold `_comment: '#A.1'` lines into a trailing comment on the line above.
pub fn inline_annotations(yaml: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in yaml.lines() {
        match (annotation_line().captures(line), lines.last_mut()) {
            (Some(captures), Some(previous)) => {
                let separator = if previous.trim_end().ends_with(':') { " " } else { "  " };
                previous.push_str(separator);
                previous.push_str(&captures[1]);
            }
            _ => lines.push(line.to_string()),
        }
    }
    let mut out = lines.join("\n");
    if yaml.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotations_move_to_the_element_line() {
        let yaml = "elements:\n- Kring:\n    _comment: '#A'\n    children:\n    - Lichtcircuit:\n        _comment: '#A.1'\n";
        insta::assert_snapshot!(inline_annotations(yaml), @r"
        elements:
        - Kring: #A
            children:
            - Lichtcircuit: #A.1
        ");
    }

    #[test]
    fn position_and_size_pairs_become_flow_lists() {
        let yaml = "sitplan:\n  layers:\n  - pos:\n    - 120.0\n    - -8.5\n    size:\n    - 400\n    - 300\n    ref: A.1\n";
        insta::assert_snapshot!(flow_pairs(yaml), @r"
        sitplan:
          layers:
          - pos: [120.0, -8.5]
            size: [400, 300]
            ref: A.1
        ");
    }

    #[test]
    fn other_sequences_stay_block_style() {
        let three = "pos:\n- 1.0\n- 2.0\n- 3.0\n";
        assert_eq!(flow_pairs(three), three);
        let text = "size:\n- groot\n- klein\n";
        assert_eq!(flow_pairs(text), text);
    }

    #[test]
    fn ordinary_comment_keys_are_left_alone() {
        let yaml = "props:\n  _comment: gewoon tekst\n";
        assert_eq!(inline_annotations(yaml), yaml);
    }

    #[test]
    fn default_info_is_not_exported() {
        let props = DocumentProperties {
            owner: "Jan<br>Kerkstraat 1".to_string(),
            ..Default::default()
        };
        let authored = authored_properties(&props);
        assert_eq!(authored.owner.as_deref(), Some("Jan\nKerkstraat 1"));
        assert_eq!(authored.installer, None);
        assert_eq!(authored.info, None);
    }

    #[test]
    fn metadata_carries_schema_version() {
        let schema = TypeDefaults::builtin().unwrap();
        let metadata = metadata_now(&schema);
        assert_eq!(metadata.schema_version, schema.version());
        assert!(metadata.generated_at.ends_with('Z'));
    }
}
