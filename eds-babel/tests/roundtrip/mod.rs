//! Tree <-> flat round trips
//!
//! The flattener and the unflattener must agree on ids, sequence numbers and
//! group names, so a second pass through both never changes the records.

use crate::common::{fixture, schema};
use eds_babel::common::flat_to_nested::build_tree;
use eds_babel::common::groups::{group_name, scan_groups};
use eds_babel::common::nested_to_flat::flatten_elements;
use eds_babel::FormatRegistry;
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

#[test]
fn single_bare_root_gets_type_defaults() {
    let schema = schema();
    let flat = flatten_elements(&json!(["Lichtcircuit"]), &schema);

    assert_eq!(flat.records.len(), 1);
    let record = &flat.records[0];
    assert_eq!((record.id, record.parent, record.indent), (1, 0, 0));
    assert_eq!(record.nr(), "");
    assert_eq!(record.node_type(), "Lichtcircuit");
    for (key, default) in schema.defaults_for("Lichtcircuit") {
        assert_eq!(record.props.get(&key), Some(&default), "default for {key}");
    }
    assert_eq!(record.props.len(), schema.defaults_for("Lichtcircuit").len() + 2);
    assert!(flat.references.is_empty());
}

#[test]
fn grouping_root_numbers_its_children() {
    let schema = schema();
    let flat = flatten_elements(
        &json!([{"Kring": {"children": ["Lichtcircuit", "Contactdoos"]}}]),
        &schema,
    );

    assert_eq!(flat.records[1].nr(), "1");
    assert_eq!(flat.records[2].nr(), "2");
    assert_eq!(flat.references.get("A.1"), Some(&flat.records[1].id));
    assert_eq!(flat.references.get("A.2"), Some(&flat.records[2].id));
    assert_eq!(flat.next_id, 4);
}

#[test]
fn authored_document_compiles_to_the_expected_records() {
    let registry = FormatRegistry::with_defaults().unwrap();
    let doc = registry.parse(&fixture("woning.yaml"), "yaml").unwrap();

    let summary: Vec<(u32, u32, u32, &str, String)> = doc
        .data
        .iter()
        .map(|r| (r.id, r.parent, r.indent, r.node_type(), r.nr()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, 0, 0, "Aansluiting", String::new()),
            (2, 1, 1, "Bord", String::new()),
            (3, 2, 2, "Kring", String::new()),
            (4, 3, 3, "Lichtcircuit", "1".to_string()),
            (5, 3, 3, "Contactdoos", "2".to_string()),
            (6, 2, 2, "Kring", String::new()),
            (7, 6, 3, "Lichtpunt", "1".to_string()),
            (8, 6, 3, "Verbruiker", "2".to_string()),
            (9, 6, 3, "Schakelaars", "9".to_string()),
        ]
    );
    assert_eq!(doc.curid, 10);
    assert_eq!(doc.ids, (1..=9).collect::<Vec<u32>>());
    assert!(doc.active.iter().all(|a| *a));
    assert_eq!(doc.data[7].props["omschrijving"], json!("Warmtepomp"));
    assert_eq!(doc.properties.installer, "Elektro Peeters<br>Kerkstraat 1");
    assert_eq!(doc.properties.info, "2 x 230V ~50 Hz");
}

#[test]
fn yaml_export_reimports_to_the_same_records() {
    let registry = FormatRegistry::with_defaults().unwrap();
    let doc = registry.parse(&fixture("woning.yaml"), "yaml").unwrap();

    let yaml = registry.serialize(&doc, "yaml").unwrap();
    let again = registry.parse(&yaml, "yaml").unwrap();

    // The authored Kring name is left to the editor.
    let without_names = |records: &[eds_babel::FlatRecord]| {
        records
            .iter()
            .cloned()
            .map(|mut r| {
                if r.node_type() == "Kring" {
                    r.props.insert("naam".to_string(), json!(""));
                }
                r
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(again.data, without_names(&doc.data));
    assert_eq!(again.properties, doc.properties);
    assert_eq!(
        again.sitplanjson.as_ref().unwrap().elements,
        doc.sitplanjson.as_ref().unwrap().elements
    );
}

#[test]
fn unnumbered_group_member_survives_yaml() {
    let registry = FormatRegistry::with_defaults().unwrap();
    let source = fixture("keuken.eds").replace(
        r#""props":{"nr":"1","type":"Lichtpunt"}"#,
        r#""props":{"nr":"","type":"Lichtpunt"}"#,
    );
    let doc = registry.parse(&source, "eds").unwrap();
    assert_eq!(doc.data[2].nr(), "");

    let yaml = registry.serialize(&doc, "yaml").unwrap();
    assert!(yaml.contains("nr: ''"));
    let again = registry.parse(&yaml, "yaml").unwrap();

    let nrs: Vec<String> = again.data.iter().map(|r| r.nr()).collect();
    assert_eq!(nrs, vec!["", "", ""]);
    assert_eq!(again.data[2].node_type(), "Lichtpunt");
    assert_eq!(again.data[2].parent, 2);
}

#[test]
fn eds_export_annotates_groups_and_references() {
    let registry = FormatRegistry::with_defaults().unwrap();
    let yaml = registry
        .convert(&fixture("keuken.eds"), "eds", "yaml")
        .unwrap();

    assert!(yaml.contains("owner: Jan Peeters"));
    assert!(yaml.contains("Kring: #A"));
    assert!(yaml.contains("Lichtpunt: #A.1"));
    assert!(yaml.contains("omschrijving: Keuken"));
    assert!(yaml.contains("ref: A.1"));
    assert!(!yaml.contains("naam: A\n"));
}

#[test]
fn unknown_types_survive_in_canonical_form() {
    let schema = schema();
    let tree = json!([{"type": "Zonnepaneel", "nr": "3", "props": {"vermogen": 400}}]);
    let flat = flatten_elements(&tree, &schema);
    let rebuilt = build_tree(&flat.records, &schema);

    assert_eq!(
        rebuilt,
        vec![json!({"type": "Zonnepaneel", "nr": "3", "props": {"vermogen": 400}})]
    );
}

const GROUP_TYPES: &[&str] = &["Kring", "Bord", "Splitsing"];
const UNKNOWN_TYPE: &str = "Zonnepaneel";
const LEAF_TYPES: &[&str] = &[
    "Lichtcircuit",
    "Lichtpunt",
    "Contactdoos",
    "Schakelaars",
    UNKNOWN_TYPE,
];

/// Where an authored node spells its `nr`.
#[derive(Debug, Clone, Copy)]
enum NrForm {
    /// `{type: X, nr: ..}`: skips the parent's numbering
    TopLevel,
    /// `{type: X, props: {nr: ..}}`
    InProps,
    /// `{X: {nr: ..}}`, only possible for known types
    Keyed,
}

fn authored_node(
    node_type: &str,
    nr: Option<(NrForm, &str)>,
    note: Option<Value>,
    children: Vec<Value>,
) -> Value {
    let mut props = Map::new();
    let mut top_level_nr = None;
    let mut keyed = false;
    match nr {
        Some((NrForm::TopLevel, nr)) => top_level_nr = Some(nr),
        Some((NrForm::InProps, nr)) => {
            props.insert("nr".to_string(), json!(nr));
        }
        Some((NrForm::Keyed, nr)) => {
            props.insert("nr".to_string(), json!(nr));
            keyed = node_type != UNKNOWN_TYPE;
        }
        None => {}
    }
    if let Some(note) = note {
        props.insert("opmerking".to_string(), note);
    }

    if keyed {
        let mut body = props;
        if !children.is_empty() {
            body.insert("children".to_string(), Value::Array(children));
        }
        let mut node = Map::new();
        node.insert(node_type.to_string(), Value::Object(body));
        return Value::Object(node);
    }

    let mut map = Map::new();
    map.insert("type".to_string(), json!(node_type));
    if let Some(nr) = top_level_nr {
        map.insert("nr".to_string(), json!(nr));
    }
    if !props.is_empty() {
        map.insert("props".to_string(), Value::Object(props));
    }
    if !children.is_empty() {
        map.insert("children".to_string(), Value::Array(children));
    }
    Value::Object(map)
}

fn note() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z]{1,5}[0-9]".prop_map(Value::from),
        (0i64..1000).prop_map(Value::from),
    ]
}

fn explicit_nr() -> impl Strategy<Value = (NrForm, &'static str)> {
    (
        prop::sample::select(vec![NrForm::TopLevel, NrForm::InProps, NrForm::Keyed]),
        prop::sample::select(vec!["", "1", "2", "3", "7", "x"]),
    )
}

fn tree() -> impl Strategy<Value = Value> {
    let leaf = (
        prop::sample::select(LEAF_TYPES),
        prop::option::of(explicit_nr()),
        prop::option::of(note()),
    )
        .prop_map(|(t, nr, note)| authored_node(t, nr, note, Vec::new()));
    let node = leaf.prop_recursive(3, 24, 4, |inner| {
        (
            prop::sample::select(GROUP_TYPES),
            prop::option::of(explicit_nr()),
            prop::option::of(note()),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(t, nr, note, children)| authored_node(t, nr, note, children))
    });
    prop::collection::vec(node, 0..5).prop_map(Value::Array)
}

/// Inverse of `group_name`.
fn group_index(name: &str) -> usize {
    name.bytes()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A' + 1) as usize)
        - 1
}

proptest! {
    #[test]
    fn second_round_trip_is_a_fixed_point(tree in tree()) {
        let schema = schema();
        let first = flatten_elements(&tree, &schema);
        let rebuilt = build_tree(&first.records, &schema);
        let second = flatten_elements(&Value::Array(rebuilt), &schema);

        prop_assert_eq!(&second.records, &first.records);
        prop_assert_eq!(&second.references, &first.references);
    }

    #[test]
    fn group_names_are_a_bijection(counter in 0usize..200_000) {
        let name = group_name(counter);
        prop_assert!(name.bytes().all(|b| b.is_ascii_uppercase()));
        prop_assert_eq!(group_index(&name), counter);
    }

    #[test]
    fn references_point_at_records_with_that_number(tree in tree()) {
        let schema = schema();
        let flat = flatten_elements(&tree, &schema);
        let by_id: HashMap<u32, String> =
            flat.records.iter().map(|r| (r.id, r.nr())).collect();

        let position = |id: u32| flat.records.iter().position(|r| r.id == id).unwrap();
        let openings = scan_groups(&flat.records).openings;
        let opening_of = |letter: &str| {
            openings.iter().find(|(_, l)| l.as_str() == letter).map(|(id, _)| position(*id))
        };

        for (reference, id) in &flat.references {
            let (letter, nr) = reference.split_once('.').unwrap();
            prop_assert_eq!(by_id.get(id).map(String::as_str), Some(nr));

            let at = position(*id);
            let opened = opening_of(letter).unwrap();
            prop_assert!(opened <= at);
            if let Some(next) = opening_of(&group_name(group_index(letter) + 1)) {
                prop_assert!(at < next);
            }
        }
    }
}
