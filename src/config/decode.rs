//! Decoding parameters shared by preprocessing, classification and packing.
//!
//! Every recognised option is a named field with a default. Keys written by
//! older tools under different spellings are accepted as aliases; anything
//! else lands in `unknown` so the loader can report it.
use crate::error::{Error, Result};
use crate::image::Channel;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Default pixel intensity cutoff for the binary threshold.
pub const DEFAULT_PIX_THRESH_MIN: u8 = 0xae;
/// Default bit threshold divisor: a cell is set when its aperture holds at
/// least a tenth of full brightness.
pub const DEFAULT_BIT_THRESH_DIV: u32 = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Aperture radius in pixels. `0` means "not derived yet".
    #[serde(deserialize_with = "de_pixels")]
    pub radius: u32,
    /// User-supplied radius used instead of the one derived from the step.
    #[serde(deserialize_with = "de_opt_pixels")]
    pub default_radius: Option<u32>,
    /// A bit is 1 when its aperture sum exceeds `radius² * 255 / bit_thresh_div`.
    pub bit_thresh_div: u32,
    /// Samples strictly above this value are considered occupied.
    pub pix_thresh_min: u8,
    /// Apply threshold + channel isolation before morphology.
    pub threshold: bool,
    /// Channel kept by the isolation mask.
    pub channel: Channel,
    /// 3×3 dilation iterations.
    pub dilate: u32,
    /// 3×3 erosion iterations.
    pub erode: u32,
    /// Complement bits before packing.
    pub inverted: bool,
    /// Reverse each packed byte (first bit becomes the least significant).
    #[serde(alias = "LSB_Mode")]
    pub lsb_mode: bool,
    /// Also write raw per-group `.dat` files on save.
    pub save_dat: bool,

    // Display flags: stored and persisted, ignored by the decoder.
    #[serde(rename = "img_display_grid")]
    pub display_grid: bool,
    #[serde(rename = "img_display_original")]
    pub display_original: bool,
    #[serde(rename = "img_display_blank_image")]
    pub display_blank_image: bool,
    #[serde(rename = "img_display_peephole")]
    pub display_peephole: bool,
    #[serde(rename = "img_display_data")]
    pub display_data: bool,
    #[serde(rename = "img_display_binary")]
    pub display_binary: bool,
    pub font_size: Option<f32>,

    /// Keys present in a loaded document that this version does not know.
    #[serde(flatten, skip_serializing)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            radius: 0,
            default_radius: None,
            bit_thresh_div: DEFAULT_BIT_THRESH_DIV,
            pix_thresh_min: DEFAULT_PIX_THRESH_MIN,
            threshold: true,
            channel: Channel::Red,
            dilate: 0,
            erode: 0,
            inverted: false,
            lsb_mode: false,
            save_dat: false,
            display_grid: true,
            display_original: false,
            display_blank_image: false,
            display_peephole: false,
            display_data: false,
            display_binary: false,
            font_size: Some(1.0),
            unknown: BTreeMap::new(),
        }
    }
}

impl DecodeConfig {
    /// Check the invariants the decoder relies on.
    pub fn validate(&self) -> Result<()> {
        if self.bit_thresh_div == 0 {
            return Err(Error::Config("bit_thresh_div must be at least 1".into()));
        }
        if self.pix_thresh_min == 0 {
            return Err(Error::Config("pix_thresh_min must be at least 1".into()));
        }
        Ok(())
    }

    /// Builder-style override of the default radius.
    pub fn with_default_radius(mut self, radius: u32) -> Self {
        self.default_radius = Some(radius);
        self.radius = radius;
        self
    }

    /// Drop and return the unrecognised keys collected during deserialization.
    pub fn take_unknown(&mut self) -> BTreeMap<String, serde_json::Value> {
        std::mem::take(&mut self.unknown)
    }
}

/// Grouping of columns and rows into decode units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLayout {
    pub cols: usize,
    pub rows: usize,
}

impl GroupLayout {
    pub fn new(cols: usize, rows: usize) -> Result<Self> {
        if cols == 0 {
            return Err(Error::Config("group_cols must be at least 1".into()));
        }
        if rows == 0 {
            return Err(Error::Config("group_rows must be at least 1".into()));
        }
        Ok(Self { cols, rows })
    }

    /// Bytes produced per row of one column group.
    pub fn bytes_per_chunk(&self) -> Result<usize> {
        if self.cols % 8 != 0 {
            return Err(Error::Config(format!(
                "group_cols ({}) must be a multiple of 8 to pack bytes",
                self.cols
            )));
        }
        Ok(self.cols / 8)
    }
}

/// Older documents stored derived radii as floats.
#[derive(Deserialize)]
#[serde(untagged)]
enum Pixels {
    Int(u64),
    Float(f64),
}

impl Pixels {
    fn to_u32(&self) -> u32 {
        match *self {
            Pixels::Int(v) => v.min(u32::MAX as u64) as u32,
            Pixels::Float(v) if v.is_finite() && v > 0.0 => v as u32,
            Pixels::Float(_) => 0,
        }
    }
}

fn de_pixels<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<u32, D::Error> {
    Ok(Option::<Pixels>::deserialize(de)?
        .map(|p| p.to_u32())
        .unwrap_or(0))
}

fn de_opt_pixels<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<Option<u32>, D::Error> {
    Ok(Option::<Pixels>::deserialize(de)?
        .map(|p| p.to_u32())
        .filter(|&v| v > 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = DecodeConfig::default();
        assert_eq!(cfg.bit_thresh_div, 10);
        assert_eq!(cfg.pix_thresh_min, 0xae);
        assert_eq!(cfg.radius, 0);
        assert!(cfg.threshold);
        assert!(!cfg.lsb_mode);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn legacy_keys_and_float_radius_are_accepted() {
        let json = r#"{
            "radius": 6.666,
            "default_radius": null,
            "LSB_Mode": true,
            "img_display_grid": false,
            "view": {"x": 0, "y": 0},
            "font_size": null
        }"#;
        let mut cfg: DecodeConfig = serde_json::from_str(json).expect("parse");
        assert_eq!(cfg.radius, 6);
        assert!(cfg.lsb_mode);
        assert!(!cfg.display_grid);
        assert_eq!(cfg.font_size, None);
        assert_eq!(cfg.bit_thresh_div, DEFAULT_BIT_THRESH_DIV);
        let unknown = cfg.take_unknown();
        assert!(unknown.contains_key("view"));
        assert!(cfg.unknown.is_empty());
    }

    #[test]
    fn unknown_keys_are_not_written_back() {
        let mut cfg = DecodeConfig::default();
        cfg.unknown.insert("view".into(), serde_json::json!(1));
        let json = serde_json::to_value(&cfg).expect("serialize");
        assert!(json.get("view").is_none());
        assert_eq!(json["lsb_mode"], serde_json::json!(false));
    }

    #[test]
    fn zero_divisor_is_rejected() {
        let cfg = DecodeConfig {
            bit_thresh_div: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn group_layout_validation() {
        assert!(GroupLayout::new(0, 4).is_err());
        assert!(GroupLayout::new(4, 0).is_err());
        let layout = GroupLayout::new(16, 4).expect("layout");
        assert_eq!(layout.bytes_per_chunk().expect("bytes"), 2);
        assert!(GroupLayout::new(4, 4)
            .expect("layout")
            .bytes_per_chunk()
            .is_err());
    }
}
