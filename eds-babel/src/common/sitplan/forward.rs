//! Authored site-plan layers → container elements.

use std::path::Path;

use log::warn;

use super::media::load_image_as_svg;
use crate::common::groups::CrossReferences;
use crate::ir::sitplan::{
    LayerSpec, SitePlanDefaults, SitePlanDocument, SitePlanElement, SitePlanSpec,
    BASE_SYMBOL_SIZE, DEFAULT_ADRESLOCATION, DEFAULT_COLOR, LABEL_OFFSET_RATIO,
};

const DEFAULT_IMAGE_SIZE: [f64; 2] = [200.0, 200.0];
/// Fallback scale for authored plans that omit `defaults.scale`.
const AUTHORED_SCALE: f64 = 0.25;

/// Rendered marker size for a symbol scale: `(floor(200*s)+1, floor(200*s))`.
///
/// The extra unit on the width keeps tiny scales from rendering zero-wide.
pub fn symbol_size(scale: f64) -> (f64, f64) {
    let edge = (BASE_SYMBOL_SIZE * scale).trunc();
    (edge + 1.0, edge)
}

/// Label anchor for an element at `pos` with width `width`.
pub fn label_position(pos: [f64; 2], width: f64) -> (f64, f64) {
    (pos[0] + width * LABEL_OFFSET_RATIO, pos[1] + 1.0)
}

/// Build the container site plan.
///
/// Markers resolve `ref` through `references`; unresolved ones are dropped
/// with a warning. Images are read relative to `asset_dir`; a missing file is
/// embedded as an empty picture.
pub fn build_site_plan(
    spec: Option<&SitePlanSpec>,
    references: &CrossReferences,
    asset_dir: Option<&Path>,
) -> SitePlanDocument {
    let Some(spec) = spec else {
        return SitePlanDocument::empty();
    };

    let authored = spec.defaults.clone().unwrap_or_default();
    let defaults = SitePlanDefaults {
        fontsize: authored.fontsize.unwrap_or(10.0),
        scale: authored.scale.unwrap_or(AUTHORED_SCALE),
        rotate: authored.rotate.unwrap_or(0.0),
    };

    let elements = spec
        .layer_list()
        .iter()
        .filter_map(|layer| match &layer.image {
            Some(image) => Some(image_element(layer, image, &defaults, asset_dir)),
            None => marker_element(layer, &defaults, references),
        })
        .collect();

    SitePlanDocument {
        num_pages: spec.num_pages.unwrap_or(1),
        active_page: spec.active_page.unwrap_or(1),
        defaults,
        elements,
    }
}

fn image_element(
    layer: &LayerSpec,
    image: &str,
    defaults: &SitePlanDefaults,
    asset_dir: Option<&Path>,
) -> SitePlanElement {
    let pos = layer.pos.unwrap_or([0.0, 0.0]);
    let size = layer.size.unwrap_or(DEFAULT_IMAGE_SIZE);
    let path = match asset_dir {
        Some(dir) => dir.join(image),
        None => Path::new(image).to_path_buf(),
    };
    let svg = load_image_as_svg(&path, size).unwrap_or_else(|e| {
        warn!("image file '{image}' could not be read ({e}); embedding an empty image");
        String::new()
    });
    let (labelposx, labelposy) = label_position(pos, size[0]);

    SitePlanElement {
        page: layer.page.unwrap_or(1),
        posx: pos[0],
        posy: pos[1],
        sizex: size[0],
        sizey: size[1],
        labelposx,
        labelposy,
        labelfontsize: defaults.fontsize,
        adrestype: None,
        adres: None,
        adreslocation: DEFAULT_ADRESLOCATION.to_string(),
        rotate: layer.rotate.unwrap_or(defaults.rotate),
        scale: layer.scale.unwrap_or(defaults.scale),
        movable: true,
        color: layer.color.clone().unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        svg,
        electro_item_id: None,
        ..Default::default()
    }
}

fn marker_element(
    layer: &LayerSpec,
    defaults: &SitePlanDefaults,
    references: &CrossReferences,
) -> Option<SitePlanElement> {
    let target = match layer.reference.as_deref().filter(|r| !r.is_empty()) {
        Some(reference) => match references.get(reference) {
            Some(&id) => id,
            None => {
                warn!("site-plan reference '{reference}' does not match any element; layer dropped");
                return None;
            }
        },
        None => layer.id.filter(|&id| id != 0)?,
    };

    let pos = layer.pos.unwrap_or([0.0, 0.0]);
    let scale = layer.scale.unwrap_or(defaults.scale);
    let (sizex, sizey) = symbol_size(scale);
    let (labelposx, labelposy) = label_position(pos, sizex);

    Some(SitePlanElement {
        page: layer.page.unwrap_or(1),
        posx: pos[0],
        posy: pos[1],
        sizex,
        sizey,
        labelposx,
        labelposy,
        labelfontsize: layer.labelfontsize.unwrap_or(defaults.fontsize),
        adrestype: Some("auto".to_string()),
        adres: None,
        adreslocation: layer
            .adreslocation
            .clone()
            .unwrap_or_else(|| DEFAULT_ADRESLOCATION.to_string()),
        rotate: layer.rotate.unwrap_or(defaults.rotate),
        scale,
        movable: true,
        color: layer.color.clone().unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        svg: String::new(),
        electro_item_id: Some(target),
        ..Default::default()
    })
}
