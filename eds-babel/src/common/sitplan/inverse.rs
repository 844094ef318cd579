//! Container site-plan elements → authored layers.

use std::collections::HashMap;

use crate::error::EdsError;
use crate::ir::sitplan::{
    LayerSpec, SitePlanDefaultsSpec, SitePlanDocument, SitePlanElement, SitePlanSpec,
    DEFAULT_COLOR,
};

use super::media::ImageExtractor;

fn round_position(element: &SitePlanElement) -> [f64; 2] {
    let round = |v: f64| (v * 10.0).round() / 10.0;
    [round(element.posx), round(element.posy)]
}

/// Build the authored `sitplan:` block, or `None` when there is nothing to
/// place.
///
/// Markers are written as `ref` when `id_to_ref` knows the record and as a raw
/// `id` otherwise. With an `images` extractor, embedded pictures are written
/// to disk and referenced by file name; without one only their size is kept.
/// Elements with neither a record nor a picture are dropped.
pub fn site_plan_layers(
    doc: Option<&SitePlanDocument>,
    id_to_ref: &HashMap<u32, String>,
    mut images: Option<&mut ImageExtractor>,
) -> Result<Option<SitePlanSpec>, EdsError> {
    let Some(doc) = doc else {
        return Ok(None);
    };
    let defaults = doc.defaults;
    let mut layers = Vec::new();

    for element in &doc.elements {
        let mut layer = LayerSpec {
            pos: Some(round_position(element)),
            ..Default::default()
        };
        match element.electro_item_id {
            Some(id) => {
                match id_to_ref.get(&id) {
                    Some(reference) => layer.reference = Some(reference.clone()),
                    None => layer.id = Some(id),
                }
                layer.color = (element.color != DEFAULT_COLOR && element.color != "black")
                    .then(|| element.color.clone());
            }
            None if !element.svg.is_empty() => {
                layer.size = Some([element.sizex, element.sizey]);
                let written = match images.as_deref_mut() {
                    Some(extractor) => extractor.extract(&element.svg)?,
                    None => None,
                };
                match written {
                    Some(filename) => layer.image = Some(filename),
                    None if images.is_none() => layer.svg_length = Some(element.svg.len()),
                    None => {}
                }
            }
            None => continue,
        }
        layer.page = (element.page != 1).then_some(element.page);
        layer.scale = (element.scale != defaults.scale).then_some(element.scale);
        layer.rotate = (element.rotate != defaults.rotate).then_some(element.rotate);
        layers.push(layer);
    }

    if layers.is_empty() {
        return Ok(None);
    }
    Ok(Some(SitePlanSpec {
        defaults: Some(SitePlanDefaultsSpec {
            fontsize: Some(defaults.fontsize),
            scale: Some(defaults.scale),
            rotate: Some(defaults.rotate),
        }),
        layers: Some(layers),
        ..Default::default()
    }))
}
