//! Treeviz formatter for flat record lists
//!
//! Draws the installation tree that the parent links describe, one record per
//! line, in stored order:
//!
//! ```text
//! ⧉ Installation (3 records, 1 site-plan elements)
//! └─ #1 Kring [A]
//!   ├─ #2 Lichtcircuit 1 (A.1)
//!   └─ #3 Contactdoos 2 (A.2)
//! ```
//!
//! Group openings show their letter in brackets, referenced records their
//! cross-reference in parentheses.
//!
//! # Parameters
//!
//! - `"props"`: when `"true"`, every property except `type`/`nr` is listed
//!   under its record

use std::collections::HashMap;

use crate::common::groups::{scan_groups, GroupScan};
use crate::error::EdsError;
use crate::format::Format;
use crate::ir::flat::{value_text, FlatDocument, FlatRecord};

struct TreePrinter<'a> {
    records: &'a [FlatRecord],
    children: HashMap<u32, Vec<usize>>,
    scan: GroupScan,
    show_props: bool,
}

impl<'a> TreePrinter<'a> {
    fn new(records: &'a [FlatRecord], show_props: bool) -> Self {
        let mut children: HashMap<u32, Vec<usize>> = HashMap::new();
        for (index, record) in records.iter().enumerate() {
            if record.parent != record.id {
                children.entry(record.parent).or_default().push(index);
            }
        }
        TreePrinter {
            records,
            children,
            scan: scan_groups(records),
            show_props,
        }
    }

    fn label(&self, record: &FlatRecord) -> String {
        let mut label = format!("#{} {}", record.id, record.node_type());
        let nr = record.nr();
        if !nr.is_empty() {
            label.push(' ');
            label.push_str(&nr);
        }
        if let Some(group) = self.scan.openings.get(&record.id) {
            label.push_str(&format!(" [{group}]"));
        }
        if let Some(reference) = self.scan.references.get(&record.id) {
            label.push_str(&format!(" ({reference})"));
        }
        label
    }

    fn format_children(&self, parent: u32, prefix: &str, output: &mut String) {
        let Some(children) = self.children.get(&parent) else {
            return;
        };
        for (i, &index) in children.iter().enumerate() {
            let record = &self.records[index];
            let is_last = i == children.len() - 1;
            let connector = if is_last { "└─" } else { "├─" };
            output.push_str(&format!("{prefix}{connector} {}\n", self.label(record)));

            let child_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
            if self.show_props {
                for (key, value) in &record.props {
                    if key != "type" && key != "nr" {
                        output.push_str(&format!("{child_prefix}· {key}={}\n", value_text(value)));
                    }
                }
            }
            self.format_children(record.id, &child_prefix, output);
        }
    }
}

pub fn to_treeviz_str(doc: &FlatDocument) -> String {
    to_treeviz_str_with_params(doc, &HashMap::new())
}

/// Render the record tree, honouring the `props` parameter.
pub fn to_treeviz_str_with_params(doc: &FlatDocument, params: &HashMap<String, String>) -> String {
    let show_props = params
        .get("props")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false);

    let elements = doc.sitplanjson.as_ref().map_or(0, |s| s.elements.len());
    let mut output = format!(
        "⧉ Installation ({} records, {} site-plan elements)\n",
        doc.data.len(),
        elements
    );
    TreePrinter::new(&doc.data, show_props).format_children(0, "", &mut output);
    output
}

/// Format implementation for treeviz format
pub struct TreevizFormat;

impl Format for TreevizFormat {
    fn name(&self) -> &str {
        "treeviz"
    }

    fn description(&self) -> &str {
        "Visual tree of the record list with group letters and references"
    }

    fn file_extensions(&self) -> &[&str] {
        &["tree", "treeviz"]
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn serialize(&self, doc: &FlatDocument) -> Result<String, EdsError> {
        Ok(to_treeviz_str(doc))
    }

    fn serialize_with_options(
        &self,
        doc: &FlatDocument,
        options: &HashMap<String, String>,
    ) -> Result<String, EdsError> {
        Ok(to_treeviz_str_with_params(doc, options))
    }
}
