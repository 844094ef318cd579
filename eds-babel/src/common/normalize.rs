//! Shorthand normalization.
//!
//! Classifies an authored node into a [`NodeForm`] and rewrites it into a
//! [`CanonicalNode`]. For the keyed form, explicit `props` are applied first and
//! the remaining implicit keys are merged over them, so an implicit key wins
//! when both spell the same property.

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::ir::flat::value_text;
use crate::ir::nodes::{CanonicalNode, NodeForm};
use crate::schema::TypeDefaults;

/// Key the exporter uses to carry group annotations; never a property.
pub const ANNOTATION_KEY: &str = "_comment";

/// Decide which authored shape `node` uses.
pub fn classify(node: &Value, schema: &TypeDefaults) -> NodeForm {
    match node {
        Value::String(name) => NodeForm::Bare(name.clone()),
        Value::Object(map) if map.contains_key("type") => NodeForm::Canonical(map.clone()),
        Value::Object(map) => {
            let keyed = map
                .iter()
                .find(|(key, _)| schema.is_known(key.as_str()));
            match keyed {
                Some((type_name, body)) => {
                    let ignored: Vec<_> = map
                        .keys()
                        .filter(|k| *k != type_name && k.as_str() != ANNOTATION_KEY)
                        .collect();
                    if !ignored.is_empty() {
                        warn!("ignoring keys {ignored:?} next to element type '{type_name}'");
                    }
                    NodeForm::KeyedShorthand {
                        type_name: type_name.clone(),
                        body: body.clone(),
                    }
                }
                None => NodeForm::Opaque(node.clone()),
            }
        }
        other => NodeForm::Opaque(other.clone()),
    }
}

/// Normalize a node and, recursively, its children.
pub fn normalize(node: &Value, schema: &TypeDefaults) -> CanonicalNode {
    classify(node, schema).into_canonical(schema)
}

impl NodeForm {
    pub fn into_canonical(self, schema: &TypeDefaults) -> CanonicalNode {
        match self {
            NodeForm::Bare(name) => CanonicalNode::new(name),
            NodeForm::Canonical(mut map) => {
                let node_type = map.remove("type").map(|t| value_text(&t)).unwrap_or_default();
                let props = take_mapping(&mut map, "props");
                let children = take_children(&mut map, schema);
                let top_level_nr = take_nr(&mut map);
                build(node_type, top_level_nr, props, children)
            }
            NodeForm::KeyedShorthand { type_name, body } => match body {
                Value::Object(mut body) => {
                    body.remove(ANNOTATION_KEY);
                    let children = take_children(&mut body, schema);
                    let mut props = take_mapping(&mut body, "props");
                    for (key, value) in body {
                        props.insert(key, value);
                    }
                    build(type_name, None, props, children)
                }
                _ => CanonicalNode::new(type_name),
            },
            NodeForm::Opaque(Value::Object(mut map)) => {
                debug!("element without a recognizable type: {map:?}");
                map.remove(ANNOTATION_KEY);
                let children = take_children(&mut map, schema);
                build(String::new(), None, map, children)
            }
            NodeForm::Opaque(Value::Null) => CanonicalNode::new(""),
            NodeForm::Opaque(other) => CanonicalNode::new(value_text(&other)),
        }
    }
}

fn build(
    node_type: String,
    top_level_nr: Option<String>,
    mut props: Map<String, Value>,
    children: Vec<CanonicalNode>,
) -> CanonicalNode {
    props.remove(ANNOTATION_KEY);
    if props.get("nr").is_some_and(Value::is_null) {
        props.remove("nr");
    }
    let mut node = CanonicalNode::new(node_type).with_children(children);
    node.props = props;
    match top_level_nr {
        Some(nr) => node.with_nr(nr),
        None => node,
    }
}

fn take_nr(map: &mut Map<String, Value>) -> Option<String> {
    match map.remove("nr") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value_text(&value)),
    }
}

fn take_mapping(map: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match map.remove(key) {
        Some(Value::Object(inner)) => inner,
        _ => Map::new(),
    }
}

fn take_children(map: &mut Map<String, Value>, schema: &TypeDefaults) -> Vec<CanonicalNode> {
    match map.remove("children") {
        Some(Value::Array(children)) => children.iter().map(|c| normalize(c, schema)).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![normalize(&single, schema)],
    }
}
