//! Container codec and EDS format tests

use crate::common::{fixture, fixture_path};
use eds_babel::codec::{self, EDS_HEADER};
use eds_babel::{EdsError, FlatDocument, FormatRegistry};
use proptest::prelude::*;
use serde_json::{json, Value};

#[test]
fn uncompressed_container_reencodes_compressed() {
    let value = codec::decode_str("TXT0040000{\"a\":1}").unwrap();
    assert_eq!(value, json!({"a": 1}));

    let encoded = codec::encode(&value).unwrap();
    assert!(encoded.starts_with(EDS_HEADER));
    assert_eq!(codec::decode_str(&encoded).unwrap(), value);
}

#[test]
fn fixture_decodes_into_a_flat_document() {
    let value = codec::read_container(fixture_path("keuken.eds")).unwrap();
    let doc = FlatDocument::from_value(value).unwrap();

    assert_eq!(doc.length, 3);
    assert_eq!(doc.curid, 4);
    assert_eq!(doc.properties.owner, "Jan Peeters");
    assert_eq!(doc.data[2].parent, 2);
    assert_eq!(doc.data[2].nr(), "1");
    assert_eq!(doc.extra.get("editorBuild"), Some(&json!("2024.1")));
    assert_eq!(doc.sitplanjson.as_ref().unwrap().elements.len(), 2);
}

#[test]
fn eds_to_eds_preserves_the_payload() {
    let registry = FormatRegistry::with_defaults().unwrap();
    let original = registry.parse(&fixture("keuken.eds"), "eds").unwrap();

    let encoded = registry.serialize(&original, "eds").unwrap();
    assert!(encoded.starts_with(EDS_HEADER));
    let reparsed = registry.parse(&encoded, "eds").unwrap();

    assert_eq!(reparsed, original);
}

#[test]
fn eds_to_json_keeps_the_editor_spelling() {
    let registry = FormatRegistry::with_defaults().unwrap();
    let source = codec::read_container(fixture_path("keuken.eds")).unwrap();
    let doc = registry.parse(&fixture("keuken.eds"), "eds").unwrap();

    let json: Value = serde_json::from_str(&registry.serialize(&doc, "json").unwrap()).unwrap();
    assert_eq!(json["data"], source["data"]);
    // The second element is sparse and must not gain keys.
    assert_eq!(json["sitplanjson"], source["sitplanjson"]);
    assert!(json["sitplanjson"]["elements"][0]["sizex"].is_u64());
    assert_eq!(json["sitplanjson"]["elements"][0]["posx"], json!(120.04));
}

#[test]
fn unknown_record_and_element_keys_survive_eds_to_eds() {
    let text = fixture("keuken.eds")
        .replace(r#""sourcelist":null},{"id":3"#, r#""sourcelist":null,"locked":true},{"id":3"#)
        .replace(r#""electroItemId":3}"#, r#""electroItemId":3,"zIndex":2}"#);
    let registry = FormatRegistry::with_defaults().unwrap();
    let doc = registry.parse(&text, "eds").unwrap();

    let value = codec::decode_str(&registry.serialize(&doc, "eds").unwrap()).unwrap();
    assert_eq!(value["data"][1]["locked"], json!(true));
    assert_eq!(value["sitplanjson"]["elements"][0]["zIndex"], json!(2));
}

#[test]
fn null_site_plan_values_fall_back_to_defaults() {
    let text = fixture("keuken.eds")
        .replace(r#""labelfontsize":11"#, r#""labelfontsize":null"#)
        .replace(r##""color":"#000000""##, r#""color":null"#);
    let registry = FormatRegistry::with_defaults().unwrap();
    let doc = registry.parse(&text, "eds").unwrap();

    let element = &doc.sitplanjson.as_ref().unwrap().elements[0];
    assert_eq!(element.labelfontsize, 10.0);
    assert_eq!(element.color, "#000000");
    assert_eq!(element.electro_item_id, Some(3));
}

#[test]
fn write_container_then_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("uit.eds");
    let value = json!({"length": 0, "data": []});

    codec::write_container(&path, &value).unwrap();
    assert_eq!(codec::read_container(&path).unwrap(), value);
}

#[test]
fn unknown_tag_is_reported_with_the_tag() {
    let err = codec::decode_str("ABC0040000{}").unwrap_err();
    assert!(matches!(&err, EdsError::UnknownHeader(tag) if tag == "ABC0040000"));
}

#[test]
fn corrupt_compressed_body_is_an_error() {
    let err = codec::decode_str("EDS0040000AAAA").unwrap_err();
    assert!(matches!(err, EdsError::Compression(_)));

    let err = codec::decode_str("EDS0040000@@@@").unwrap_err();
    assert!(matches!(err, EdsError::Base64(_)));
}

#[test]
fn container_must_be_text() {
    let err = codec::decode(&[0xff, 0xfe, 0x00]).unwrap_err();
    assert!(matches!(err, EdsError::Malformed(_)));
}

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[ -~éü<>]{0,12}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-zA-Z_]{1,8}", inner), 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn decode_inverts_encode(value in json_value()) {
        let encoded = codec::encode(&value).unwrap();
        prop_assert!(encoded.starts_with(EDS_HEADER));
        prop_assert_eq!(codec::decode_str(&encoded).unwrap(), value);
    }
}
