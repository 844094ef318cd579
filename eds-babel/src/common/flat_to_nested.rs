//! Converts the flat record list back into an authored element tree.
//!
//! # The High-Level Concept
//!
//! Records only know their parent id, so the tree is rebuilt from two lookups:
//! id → record and parent id → children. Children keep the order in which they
//! appear in the record list; ids are never used for ordering because edits in
//! the editor can leave them out of sequence.
//!
//! # Stripping
//!
//! Every node is written with the least text that re-flattens to the same
//! record:
//!
//! - `type` becomes the node key, `nr` is only written when re-flattening would
//!   not derive the same number. Under a grouping node a known type writes
//!   its `nr` in the body and keeps its turn in the numbering; an unknown type
//!   whose number does not match its turn is written with a top-level `nr`,
//!   which takes it out of the numbering
//! - the grouping type's `naam` and `"auto"` values of the auto-fields are left
//!   to the editor
//! - a property whose text equals the text of its type default is dropped.
//!   The comparison is textual on purpose: the container stores many numbers
//!   as strings, so `16` and `"16"` are the same value
//!
//! A node with nothing left collapses to its bare type name.
//!
//! # Annotations
//!
//! Group openings carry `#<letter>` and referenced records `#<letter>.<nr>` in
//! a leading `_comment` entry, which the YAML writer turns into comments.

use std::collections::HashMap;

use log::warn;
use serde_json::{Map, Value};

use crate::common::groups::{scan_groups, GroupScan};
use crate::common::normalize::ANNOTATION_KEY;
use crate::ir::flat::{value_text, FlatRecord};
use crate::schema::{TypeDefaults, AUTO_FIELDS, GROUP_NAME_PROPERTY, GROUP_TYPE};

/// Residual properties of a record after removing what the flattener derives.
pub fn strip_defaults(
    node_type: &str,
    props: &Map<String, Value>,
    schema: &TypeDefaults,
) -> Map<String, Value> {
    props
        .iter()
        .filter(|(key, value)| {
            let key = key.as_str();
            if key == "type" || key == "nr" {
                return false;
            }
            if node_type == GROUP_TYPE && key == GROUP_NAME_PROPERTY {
                return false;
            }
            if AUTO_FIELDS.contains(&key) && value.as_str() == Some("auto") {
                return false;
            }
            match schema.default_value(node_type, key) {
                Some(default) if !default.is_null() => value_text(value) != value_text(default),
                _ => true,
            }
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Rebuild the authored root list from records in stored order.
pub fn build_tree(records: &[FlatRecord], schema: &TypeDefaults) -> Vec<Value> {
    let scan = scan_groups(records);
    let builder = TreeBuilder::new(records, schema, &scan);
    let roots = builder.children_of(0);
    let reachable = builder.count_reachable(&roots);
    if reachable < records.len() {
        warn!(
            "{} records are not reachable from a root and were skipped",
            records.len() - reachable
        );
    }
    builder.build_children(0, false)
}

/// How a node's `nr` relates to its parent's numbering.
enum NrSlot {
    /// Takes the parent's next number; carries that number.
    Numbered(String),
    /// Written with a top-level `nr` so the parent's numbering passes it by.
    Skipped,
    /// The parent does not number its children.
    Free,
}

struct TreeBuilder<'a> {
    records: &'a [FlatRecord],
    schema: &'a TypeDefaults,
    scan: &'a GroupScan,
    children: HashMap<u32, Vec<usize>>,
}

impl<'a> TreeBuilder<'a> {
    fn new(records: &'a [FlatRecord], schema: &'a TypeDefaults, scan: &'a GroupScan) -> Self {
        let mut children: HashMap<u32, Vec<usize>> = HashMap::new();
        for (index, record) in records.iter().enumerate() {
            if record.parent == record.id {
                continue;
            }
            children.entry(record.parent).or_default().push(index);
        }
        TreeBuilder {
            records,
            schema,
            scan,
            children,
        }
    }

    fn children_of(&self, id: u32) -> Vec<usize> {
        self.children.get(&id).cloned().unwrap_or_default()
    }

    fn count_reachable(&self, roots: &[usize]) -> usize {
        roots
            .iter()
            .map(|&i| 1 + self.count_reachable(&self.children_of(self.records[i].id)))
            .sum()
    }

    fn build_children(&self, parent_id: u32, parent_is_group: bool) -> Vec<Value> {
        let mut next_auto = 1usize;
        let mut nodes = Vec::new();
        for index in self.children_of(parent_id) {
            let record = &self.records[index];
            let slot = if parent_is_group {
                let expected = next_auto.to_string();
                // A keyed node always takes its turn; a canonical one only
                // when it carries the number it would be handed.
                if self.schema.is_known(record.node_type()) || record.nr() == expected {
                    next_auto += 1;
                    NrSlot::Numbered(expected)
                } else {
                    NrSlot::Skipped
                }
            } else {
                NrSlot::Free
            };
            nodes.push(self.build_node(record, slot));
        }
        nodes
    }

    fn build_node(&self, record: &FlatRecord, slot: NrSlot) -> Value {
        let node_type = record.node_type().to_string();
        let known = self.schema.is_known(&node_type);
        let residual = strip_defaults(&node_type, &record.props, self.schema);

        let nr = record.nr();
        let explicit_nr = match slot {
            NrSlot::Numbered(expected) => (nr != expected).then_some(nr),
            NrSlot::Skipped => Some(nr),
            NrSlot::Free => {
                let default_nr = self
                    .schema
                    .default_value(&node_type, "nr")
                    .map(value_text)
                    .unwrap_or_default();
                (nr != default_nr).then_some(nr)
            }
        };

        let annotation = self
            .scan
            .openings
            .get(&record.id)
            .map(|group| format!("#{group}"))
            .or_else(|| {
                self.scan
                    .references
                    .get(&record.id)
                    .map(|reference| format!("#{reference}"))
            });

        let children = self.build_children(record.id, node_type == GROUP_TYPE);

        let mut body = Map::new();
        if let Some(annotation) = annotation {
            body.insert(ANNOTATION_KEY.to_string(), Value::String(annotation));
        }
        if !known {
            body.insert("type".to_string(), Value::String(node_type.clone()));
        }
        if let Some(nr) = explicit_nr {
            body.insert("nr".to_string(), Value::String(nr));
        }
        if known {
            body.extend(residual);
        } else if !residual.is_empty() {
            body.insert("props".to_string(), Value::Object(residual));
        }
        if !children.is_empty() {
            body.insert("children".to_string(), Value::Array(children));
        }

        if known {
            if body.is_empty() {
                Value::String(node_type)
            } else {
                let mut keyed = Map::new();
                keyed.insert(node_type, Value::Object(body));
                Value::Object(keyed)
            }
        } else if body.len() == 1 && !node_type.is_empty() {
            // Only `type` is left.
            Value::String(node_type)
        } else {
            Value::Object(body)
        }
    }
}
