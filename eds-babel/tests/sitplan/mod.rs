//! Site-plan layers in both directions

use crate::common::{fixture, schema};
use eds_babel::common::nested_to_flat::flatten_elements;
use eds_babel::common::sitplan::forward::build_site_plan;
use eds_babel::ir::sitplan::{LayerSpec, SitePlanSpec};
use eds_babel::FormatRegistry;
use serde_json::json;
use std::collections::HashMap;
use std::fs;
use tempfile::tempdir;

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 13];

fn options(key: &str, value: &std::path::Path) -> HashMap<String, String> {
    HashMap::from([(key.to_string(), value.display().to_string())])
}

#[test]
fn reference_layer_resolves_to_the_grouped_child() {
    let schema = schema();
    let flat = flatten_elements(
        &json!([{"Kring": {"children": ["Lichtcircuit", "Contactdoos"]}}]),
        &schema,
    );
    let spec = SitePlanSpec {
        layers: Some(vec![LayerSpec {
            reference: Some("A.1".to_string()),
            pos: Some([10.0, 20.0]),
            scale: Some(0.5),
            ..Default::default()
        }]),
        ..Default::default()
    };

    let plan = build_site_plan(Some(&spec), &flat.references, None);
    let element = &plan.elements[0];

    assert_eq!(element.electro_item_id, Some(flat.records[1].id));
    assert_eq!((element.sizex, element.sizey), (101.0, 100.0));
    assert!((element.labelposx - (10.0 + 101.0 * 0.2)).abs() < 1e-9);
    assert_eq!(element.labelposy, 21.0);
}

#[test]
fn authored_layers_compile_with_page_defaults() {
    let registry = FormatRegistry::with_defaults().unwrap();
    let doc = registry.parse(&fixture("woning.yaml"), "yaml").unwrap();
    let plan = doc.sitplanjson.unwrap();

    assert_eq!(plan.defaults.scale, 0.5);
    assert_eq!(plan.defaults.fontsize, 10.0);
    // Z.9 names no element and is dropped.
    assert_eq!(plan.elements.len(), 2);
    assert_eq!(plan.elements[0].electro_item_id, Some(4));
    assert_eq!(plan.elements[1].electro_item_id, Some(8));
    assert_eq!(plan.elements[1].color, "red");
    assert_eq!(plan.elements[0].sizex, 101.0);
}

#[test]
fn document_without_site_plan_gets_the_empty_plan() {
    let registry = FormatRegistry::with_defaults().unwrap();
    let doc = registry.parse("- Lichtpunt\n", "yaml").unwrap();
    let plan = doc.sitplanjson.unwrap();

    assert!(plan.elements.is_empty());
    assert_eq!(plan.defaults.fontsize, 11.0);
    assert_eq!(plan.defaults.scale, 0.7);
}

#[test]
fn images_are_embedded_then_extracted_again() {
    let assets = tempdir().unwrap();
    fs::write(assets.path().join("grondplan.png"), PNG_BYTES).unwrap();
    let source = "\
sitplan:
  layers:
    - image: grondplan.png
      pos: [0, 0]
      size: [800, 600]
    - ref: A.1
      pos: [100, 50]
elements:
  - Kring:
      children: [Lichtpunt]
";
    let registry = FormatRegistry::with_defaults().unwrap();
    let doc = registry
        .parse_with_options(source, "yaml", &options("asset-dir", assets.path()))
        .unwrap();
    let plan = doc.sitplanjson.as_ref().unwrap();
    assert!(plan.elements[0].svg.starts_with("<svg width=\"800\" height=\"600\">"));
    assert!(plan.elements[0].svg.contains("data:image/png;base64,"));
    assert_eq!(plan.elements[0].electro_item_id, None);

    let export = tempdir().unwrap();
    let yaml = registry
        .serialize_with_options(&doc, "yaml", &options("image-dir", export.path()))
        .unwrap();
    assert!(yaml.contains("image: image_0.png"));
    assert!(yaml.contains("ref: A.1"));
    assert_eq!(fs::read(export.path().join("image_0.png")).unwrap(), PNG_BYTES);

    let again = registry
        .parse_with_options(&yaml, "yaml", &options("asset-dir", export.path()))
        .unwrap();
    assert_eq!(again.sitplanjson, doc.sitplanjson);
}

#[test]
fn missing_image_embeds_an_empty_picture() {
    let assets = tempdir().unwrap();
    let source = "sitplan:\n  layers:\n    - image: weg.png\nelements: []\n";
    let registry = FormatRegistry::with_defaults().unwrap();
    let doc = registry
        .parse_with_options(source, "yaml", &options("asset-dir", assets.path()))
        .unwrap();

    let plan = doc.sitplanjson.unwrap();
    assert_eq!(plan.elements.len(), 1);
    assert_eq!(plan.elements[0].svg, "");
    assert_eq!((plan.elements[0].sizex, plan.elements[0].sizey), (200.0, 200.0));
}

#[test]
fn export_without_image_dir_records_the_embedded_size() {
    let assets = tempdir().unwrap();
    fs::write(assets.path().join("grondplan.png"), PNG_BYTES).unwrap();
    let source = "sitplan:\n  layers:\n    - image: grondplan.png\nelements: []\n";
    let registry = FormatRegistry::with_defaults().unwrap();
    let doc = registry
        .parse_with_options(source, "yaml", &options("asset-dir", assets.path()))
        .unwrap();
    let svg_length = doc.sitplanjson.as_ref().unwrap().elements[0].svg.len();

    let yaml = registry.serialize(&doc, "yaml").unwrap();
    assert!(yaml.contains(&format!("svg_length: {svg_length}")));
    assert!(!yaml.contains("image:"));
}

#[test]
fn markers_for_unreferenced_records_keep_their_id() {
    let registry = FormatRegistry::with_defaults().unwrap();
    let mut doc = registry.parse(&fixture("keuken.eds"), "eds").unwrap();
    // Point the marker at the Bord, which has no group reference.
    doc.sitplanjson.as_mut().unwrap().elements[0].electro_item_id = Some(1);

    let yaml = registry.serialize(&doc, "yaml").unwrap();
    assert!(yaml.contains("id: 1"));
    assert!(!yaml.contains("ref:"));
}

#[test]
fn exported_positions_are_flow_lists() {
    let registry = FormatRegistry::with_defaults().unwrap();
    let doc = registry.parse(&fixture("woning.yaml"), "yaml").unwrap();

    let yaml = registry.serialize(&doc, "yaml").unwrap();
    assert!(yaml.contains("pos: ["), "{yaml}");
    assert!(!yaml.lines().any(|line| line.trim_end().ends_with("pos:")));

    let again = registry.parse(&yaml, "yaml").unwrap();
    assert_eq!(again.sitplanjson, doc.sitplanjson);
}
