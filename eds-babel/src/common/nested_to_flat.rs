//! Converts the authored element tree into the flat record list.
//!
//! # The Algorithm
//!
//! 1. **Initialization:**
//!    - Start a [`TraversalState`]: ids from 1, no group open
//!    - Treat the input as one root or an ordered list of roots (parent 0)
//!
//! 2. **Visiting a node (pre-order):**
//!    - Reserve the next id and normalize the node's shorthand
//!    - Merge the type defaults with the authored props (authored wins)
//!    - Resolve `nr`: an `nr` in the props, else a top-level `nr`, else the
//!      sequence number handed down by a grouping parent, else the type
//!      default, else empty
//!    - If the node is a grouping node, open the next group letter
//!    - Register `<letter>.<nr>` when a group is open and `nr` is non-empty
//!    - Emit the record
//!
//! 3. **Children:**
//!    - Visit left to right at `indent + 1`
//!    - Under a grouping node, children are numbered 1, 2, ... in order.
//!      Only a top-level `nr` (canonical form) skips a child; an `nr` in the
//!      props replaces the number but still uses it up
//!
//! The reverse process lives in `flat_to_nested`.

use std::path::Path;

use log::debug;
use serde_json::{Map, Value};

use crate::common::groups::{CrossReferences, TraversalState};
use crate::common::normalize::normalize;
use crate::common::sitplan::forward::build_site_plan;
use crate::ir::authoring::AuthoredDocument;
use crate::ir::flat::{value_text, FlatDocument, FlatRecord};
use crate::ir::nodes::CanonicalNode;
use crate::schema::{TypeDefaults, GROUP_TYPE};

/// Records plus the bookkeeping the site-plan transform needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Flattened {
    pub records: Vec<FlatRecord>,
    pub references: CrossReferences,
    pub next_id: u32,
}

/// Two-layer merge: a copy of `defaults` with every key of `overrides` applied.
pub fn merge_props(defaults: &Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = defaults.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Flatten an element tree given as one node or a list of root nodes.
pub fn flatten_elements(elements: &Value, schema: &TypeDefaults) -> Flattened {
    let roots: Vec<CanonicalNode> = match elements {
        Value::Array(items) => items.iter().map(|n| normalize(n, schema)).collect(),
        Value::Null => Vec::new(),
        single => vec![normalize(single, schema)],
    };
    flatten_roots(&roots, schema)
}

/// Flatten already normalized roots.
pub fn flatten_roots(roots: &[CanonicalNode], schema: &TypeDefaults) -> Flattened {
    let mut walker = Walker {
        schema,
        state: TraversalState::new(),
        records: Vec::new(),
        references: CrossReferences::new(),
    };
    for root in roots {
        walker.walk(root, 0, 0, None);
    }
    debug!(
        "flattened {} records, {} cross-references",
        walker.records.len(),
        walker.references.len()
    );
    Flattened {
        records: walker.records,
        references: walker.references,
        next_id: walker.state.next_id,
    }
}

/// Build the complete container payload for an authored document.
///
/// `asset_dir` is the directory image layers are resolved against.
pub fn compile_document(
    doc: &AuthoredDocument,
    schema: &TypeDefaults,
    asset_dir: Option<&Path>,
) -> FlatDocument {
    let flattened = flatten_elements(&doc.elements, schema);
    let sitplan = build_site_plan(doc.sitplan.as_ref(), &flattened.references, asset_dir);
    FlatDocument::new(
        flattened.records,
        flattened.next_id,
        doc.properties.to_document_properties(),
        sitplan,
    )
}

struct Walker<'a> {
    schema: &'a TypeDefaults,
    state: TraversalState,
    records: Vec<FlatRecord>,
    references: CrossReferences,
}

impl Walker<'_> {
    fn walk(&mut self, node: &CanonicalNode, parent: u32, indent: u32, auto_nr: Option<usize>) {
        let id = self.state.reserve_id();
        let defaults = self.schema.defaults_for(&node.node_type);
        let mut merged = merge_props(&defaults, &node.props);
        merged.insert("type".to_string(), Value::String(node.node_type.clone()));

        merged.remove("nr");
        let default_nr = defaults.get("nr").map(value_text);
        let nr = node
            .prop_nr()
            .or_else(|| node.nr.clone())
            .or_else(|| auto_nr.map(|n| n.to_string()))
            .or(default_nr)
            .unwrap_or_default();

        let mut props = Map::with_capacity(merged.len() + 1);
        props.insert("nr".to_string(), Value::String(nr.clone()));
        props.extend(merged);

        self.state.groups.visit(&node.node_type);
        if let Some(reference) = self.state.groups.reference_for(&nr) {
            self.references.insert(reference, id);
        }

        self.records.push(FlatRecord {
            id,
            parent,
            indent,
            collapsed: false,
            props,
            sourcelist: Value::Null,
            extra: Map::new(),
        });

        let is_group = node.node_type == GROUP_TYPE;
        let mut next_child_nr = 1;
        for child in &node.children {
            if is_group && !child.skips_numbering() {
                self.walk(child, id, indent + 1, Some(next_child_nr));
                next_child_nr += 1;
            } else {
                self.walk(child, id, indent + 1, None);
            }
        }
    }
}
