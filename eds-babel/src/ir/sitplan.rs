//! Site-plan overlay types.
//!
//! [`SitePlanDocument`] and [`SitePlanElement`] are the container-side shapes
//! (`sitplanjson`). [`SitePlanSpec`] and [`LayerSpec`] are the authored shapes:
//! a layer is either an embedded image (`image`) or a marker pointing at a
//! record (`ref` such as `A.1`, or a raw `id`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Number, Value};

use crate::ir::flat::null_as_default;

/// Symbol edge length the editor renders a marker at scale 1.
pub const BASE_SYMBOL_SIZE: f64 = 200.0;
/// Share of the width at which a label is anchored.
pub const LABEL_OFFSET_RATIO: f64 = 0.2;
pub const DEFAULT_COLOR: &str = "#000000";
pub const DEFAULT_ADRESLOCATION: &str = "rechts";

/// Page-wide fallbacks for element placement.
///
/// A `null` or missing value takes the decoder fallback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "SitePlanDefaultsSpec")]
pub struct SitePlanDefaults {
    #[serde(serialize_with = "js_number")]
    pub fontsize: f64,
    #[serde(serialize_with = "js_number")]
    pub scale: f64,
    #[serde(serialize_with = "js_number")]
    pub rotate: f64,
}

impl SitePlanDefaults {
    fn fallback_fontsize() -> f64 {
        10.0
    }

    fn fallback_scale() -> f64 {
        0.7
    }

    /// Defaults written when a document has no authored site plan at all.
    pub fn empty_plan() -> Self {
        SitePlanDefaults {
            fontsize: 11.0,
            scale: 0.7,
            rotate: 0.0,
        }
    }
}

impl Default for SitePlanDefaults {
    fn default() -> Self {
        SitePlanDefaults {
            fontsize: Self::fallback_fontsize(),
            scale: Self::fallback_scale(),
            rotate: 0.0,
        }
    }
}

impl From<SitePlanDefaultsSpec> for SitePlanDefaults {
    fn from(raw: SitePlanDefaultsSpec) -> Self {
        SitePlanDefaults {
            fontsize: raw.fontsize.unwrap_or_else(Self::fallback_fontsize),
            scale: raw.scale.unwrap_or_else(Self::fallback_scale),
            rotate: raw.rotate.unwrap_or(0.0),
        }
    }
}

/// One positioned overlay element as stored in the container.
///
/// Decoding treats `null` like a missing key. Keys that were missing are
/// listed in `absent` and stay missing when the element is written back, so a
/// sparse element is not padded with defaults. Unmodelled keys live in
/// `extra`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawElement")]
pub struct SitePlanElement {
    pub page: u32,
    pub posx: f64,
    pub posy: f64,
    pub sizex: f64,
    pub sizey: f64,
    pub labelposx: f64,
    pub labelposy: f64,
    pub labelfontsize: f64,
    pub adrestype: Option<String>,
    pub adres: Option<String>,
    pub adreslocation: String,
    pub rotate: f64,
    pub scale: f64,
    pub movable: bool,
    pub color: String,
    pub svg: String,
    pub electro_item_id: Option<u32>,
    pub extra: Map<String, Value>,
    pub absent: Vec<&'static str>,
}

impl Default for SitePlanElement {
    fn default() -> Self {
        let defaults = SitePlanDefaults::default();
        SitePlanElement {
            page: 1,
            posx: 0.0,
            posy: 0.0,
            sizex: 0.0,
            sizey: 0.0,
            labelposx: 0.0,
            labelposy: 0.0,
            labelfontsize: defaults.fontsize,
            adrestype: None,
            adres: None,
            adreslocation: DEFAULT_ADRESLOCATION.to_string(),
            rotate: defaults.rotate,
            scale: defaults.scale,
            movable: true,
            color: DEFAULT_COLOR.to_string(),
            svg: String::new(),
            electro_item_id: None,
            extra: Map::new(),
            absent: Vec::new(),
        }
    }
}

impl SitePlanElement {
    /// The element as the container stores it, in editor key order.
    pub fn to_map(&self) -> Map<String, Value> {
        let fields = [
            ("page", json!(self.page)),
            ("posx", number_value(self.posx)),
            ("posy", number_value(self.posy)),
            ("sizex", number_value(self.sizex)),
            ("sizey", number_value(self.sizey)),
            ("labelposx", number_value(self.labelposx)),
            ("labelposy", number_value(self.labelposy)),
            ("labelfontsize", number_value(self.labelfontsize)),
            ("adrestype", json!(self.adrestype)),
            ("adres", json!(self.adres)),
            ("adreslocation", json!(self.adreslocation)),
            ("rotate", number_value(self.rotate)),
            ("scale", number_value(self.scale)),
            ("movable", json!(self.movable)),
            ("color", json!(self.color)),
            ("svg", json!(self.svg)),
            ("electroItemId", json!(self.electro_item_id)),
        ];
        let mut map = Map::new();
        for (key, value) in fields {
            if !self.absent.contains(&key) {
                map.insert(key.to_string(), value);
            }
        }
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        map
    }
}

impl Serialize for SitePlanElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// Wire shape of an element before fallbacks are applied.
#[derive(Deserialize)]
struct RawElement {
    page: Option<u32>,
    posx: Option<f64>,
    posy: Option<f64>,
    sizex: Option<f64>,
    sizey: Option<f64>,
    labelposx: Option<f64>,
    labelposy: Option<f64>,
    labelfontsize: Option<f64>,
    #[serde(default, deserialize_with = "present")]
    adrestype: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    adres: Option<Option<String>>,
    adreslocation: Option<String>,
    rotate: Option<f64>,
    scale: Option<f64>,
    movable: Option<bool>,
    color: Option<String>,
    svg: Option<String>,
    #[serde(rename = "electroItemId", default, deserialize_with = "present")]
    electro_item_id: Option<Option<u32>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawElement> for SitePlanElement {
    fn from(raw: RawElement) -> Self {
        let fallback = SitePlanElement::default();
        let mut absent = Vec::new();
        let mut record = |key: &'static str, found: bool| {
            if !found {
                absent.push(key);
            }
        };
        record("page", raw.page.is_some());
        record("posx", raw.posx.is_some());
        record("posy", raw.posy.is_some());
        record("sizex", raw.sizex.is_some());
        record("sizey", raw.sizey.is_some());
        record("labelposx", raw.labelposx.is_some());
        record("labelposy", raw.labelposy.is_some());
        record("labelfontsize", raw.labelfontsize.is_some());
        record("adrestype", raw.adrestype.is_some());
        record("adres", raw.adres.is_some());
        record("adreslocation", raw.adreslocation.is_some());
        record("rotate", raw.rotate.is_some());
        record("scale", raw.scale.is_some());
        record("movable", raw.movable.is_some());
        record("color", raw.color.is_some());
        record("svg", raw.svg.is_some());
        record("electroItemId", raw.electro_item_id.is_some());

        SitePlanElement {
            page: raw.page.unwrap_or(fallback.page),
            posx: raw.posx.unwrap_or(fallback.posx),
            posy: raw.posy.unwrap_or(fallback.posy),
            sizex: raw.sizex.unwrap_or(fallback.sizex),
            sizey: raw.sizey.unwrap_or(fallback.sizey),
            labelposx: raw.labelposx.unwrap_or(fallback.labelposx),
            labelposy: raw.labelposy.unwrap_or(fallback.labelposy),
            labelfontsize: raw.labelfontsize.unwrap_or(fallback.labelfontsize),
            adrestype: raw.adrestype.flatten(),
            adres: raw.adres.flatten(),
            adreslocation: raw.adreslocation.unwrap_or(fallback.adreslocation),
            rotate: raw.rotate.unwrap_or(fallback.rotate),
            scale: raw.scale.unwrap_or(fallback.scale),
            movable: raw.movable.unwrap_or(fallback.movable),
            color: raw.color.unwrap_or(fallback.color),
            svg: raw.svg.unwrap_or(fallback.svg),
            electro_item_id: raw.electro_item_id.flatten(),
            extra: raw.extra,
            absent,
        }
    }
}

/// Distinguishes an explicit `null` (`Some(None)`) from a missing key (`None`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Whole numbers are written without a fraction, the way the editor writes
/// them.
fn number_value(value: f64) -> Value {
    const SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if value.fract() == 0.0 && value.abs() <= SAFE_INTEGER {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

fn js_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    number_value(*value).serialize(serializer)
}

/// The `sitplanjson` block of a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitePlanDocument {
    #[serde(rename = "numPages", default = "one", deserialize_with = "page_number")]
    pub num_pages: u32,
    #[serde(rename = "activePage", default = "one", deserialize_with = "page_number")]
    pub active_page: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub defaults: SitePlanDefaults,
    #[serde(default, deserialize_with = "null_as_default")]
    pub elements: Vec<SitePlanElement>,
}

impl SitePlanDocument {
    /// What a document without any authored site plan carries.
    pub fn empty() -> Self {
        SitePlanDocument {
            num_pages: 1,
            active_page: 1,
            defaults: SitePlanDefaults::empty_plan(),
            elements: Vec::new(),
        }
    }
}

fn one() -> u32 {
    1
}

fn page_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_else(one))
}

/// Authored `defaults:` block of a site plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitePlanDefaultsSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fontsize: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate: Option<f64>,
}

/// Authored `sitplan:` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitePlanSpec {
    #[serde(rename = "numPages", skip_serializing_if = "Option::is_none")]
    pub num_pages: Option<u32>,
    #[serde(rename = "activePage", skip_serializing_if = "Option::is_none")]
    pub active_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<SitePlanDefaultsSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<LayerSpec>>,
    /// Older files list layers under `elements`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<LayerSpec>>,
}

impl SitePlanSpec {
    /// `layers` wins over the legacy `elements` list.
    pub fn layer_list(&self) -> &[LayerSpec] {
        self.layers
            .as_deref()
            .or(self.elements.as_deref())
            .unwrap_or(&[])
    }
}

/// One authored overlay layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Byte length of an embedded image that was not written to disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svg_length: Option<usize>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labelfontsize: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adreslocation: Option<String>,
}
