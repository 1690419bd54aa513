//! Versioned grid document.
//!
//! ```json
//! {
//!   "version": [1, 1],
//!   "grid_points_x": [100, 120, 140, 160],
//!   "grid_points_y": [40, 60],
//!   "data": ["0", "1", "1", "0", "0", "0", "1", "1"],
//!   "group_cols": 4,
//!   "group_rows": 2,
//!   "config": { "radius": 6, "bit_thresh_div": 10, ... },
//!   "img_fn": "rom.png"
//! }
//! ```
//!
//! `data` lists one token per intersection, column index outer and row index
//! inner. Readers also accept the tokens joined into one string.
//!
//! Version history:
//! - 1.0: no `channel` or `save_dat` config keys; `data` may be `null`.
//! - 1.1: current.
use crate::bits::BitMatrix;
use crate::config::{DecodeConfig, GroupLayout};
use crate::error::{Error, Result};
use crate::grid::GridLines;
use crate::image::io::write_atomic;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// `(major, minor)`. Majors are incompatible; minors only add fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FormatVersion(pub u32, pub u32);

pub const CURRENT_VERSION: FormatVersion = FormatVersion(1, 1);
const LEGACY_VERSION: FormatVersion = FormatVersion(1, 0);

fn legacy_version() -> FormatVersion {
    LEGACY_VERSION
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BitData {
    Tokens(Vec<String>),
    Joined(String),
}

impl BitData {
    fn from_matrix(bits: &BitMatrix) -> Self {
        BitData::Tokens(
            bits.as_slice()
                .iter()
                .map(|&b| if b { "1" } else { "0" }.to_string())
                .collect(),
        )
    }

    fn len(&self) -> usize {
        match self {
            BitData::Tokens(tokens) => tokens.len(),
            BitData::Joined(s) => s.chars().count(),
        }
    }

    /// Decode against a `cols x rows` grid. The count is checked before the
    /// characters, so a short list reports a shape mismatch.
    fn to_matrix(&self, cols: usize, rows: usize) -> Result<BitMatrix> {
        let (expected, found) = (cols * rows, self.len());
        if found != expected {
            return Err(Error::DataShapeMismatch { expected, found });
        }
        match self {
            BitData::Tokens(tokens) => {
                let bits = tokens
                    .iter()
                    .map(|t| bit_token(t))
                    .collect::<Result<Vec<bool>>>()?;
                BitMatrix::from_bits(cols, rows, bits)
            }
            BitData::Joined(s) => BitMatrix::parse_bit_string(cols, rows, s),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            BitData::Tokens(tokens) => tokens.is_empty(),
            BitData::Joined(s) => s.is_empty(),
        }
    }
}

fn bit_token(token: &str) -> Result<bool> {
    match token {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(Error::InvalidDocument(format!(
            "unexpected bit token {other:?}"
        ))),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridDocument {
    #[serde(alias = "format_version", default = "legacy_version")]
    pub version: FormatVersion,
    pub grid_points_x: Vec<usize>,
    pub grid_points_y: Vec<usize>,
    #[serde(default)]
    pub data: Option<BitData>,
    #[serde(default)]
    pub group_cols: Option<usize>,
    #[serde(default)]
    pub group_rows: Option<usize>,
    #[serde(default)]
    pub config: DecodeConfig,
    /// Source photograph the grid was aligned on.
    #[serde(default)]
    pub img_fn: Option<PathBuf>,
}

/// Geometry and (if it survived validation) bit data of a loaded document.
#[derive(Clone, Debug)]
pub struct DecodedGrid {
    pub lines: GridLines,
    pub bits: Option<BitMatrix>,
    /// Set when the stored data was dropped because of a shape mismatch.
    pub data_discarded: bool,
}

impl GridDocument {
    /// Snapshot the given state at the current format version.
    pub fn new(
        lines: &GridLines,
        bits: Option<&BitMatrix>,
        layout: GroupLayout,
        config: &DecodeConfig,
        img_fn: Option<&Path>,
    ) -> Self {
        let mut config = config.clone();
        config.unknown.clear();
        Self {
            version: CURRENT_VERSION,
            grid_points_x: lines.columns().to_vec(),
            grid_points_y: lines.rows().to_vec(),
            data: bits.map(BitData::from_matrix),
            group_cols: Some(layout.cols),
            group_rows: Some(layout.rows),
            config,
            img_fn: img_fn.map(Path::to_path_buf),
        }
    }

    /// Parse and validate a document.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut doc: GridDocument = serde_json::from_str(text)?;
        if doc.version.0 != CURRENT_VERSION.0 {
            return Err(Error::UnsupportedVersion {
                major: doc.version.0,
                minor: doc.version.1,
            });
        }
        if doc.version > CURRENT_VERSION {
            warn!(
                "grid document version {}.{} is newer than {}.{}; unknown fields are ignored",
                doc.version.0, doc.version.1, CURRENT_VERSION.0, CURRENT_VERSION.1
            );
        }
        for (key, _) in doc.config.take_unknown() {
            warn!("ignoring unknown config key {key:?} in grid document");
        }
        doc.config.validate()?;
        Ok(doc)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let doc = Self::from_json(&text)?;
        info!(
            "loaded grid {} ({} x, {} y)",
            path.display(),
            doc.grid_points_x.len(),
            doc.grid_points_y.len()
        );
        Ok(doc)
    }

    /// Write atomically; the previous file survives any failure.
    pub fn write(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.to_json()?.as_bytes())
    }

    /// Group layout stored in the document, if complete.
    pub fn layout(&self) -> Option<Result<GroupLayout>> {
        match (self.group_cols, self.group_rows) {
            (Some(cols), Some(rows)) => Some(GroupLayout::new(cols, rows)),
            _ => None,
        }
    }

    /// Sorted, de-duplicated grid lines.
    pub fn lines(&self) -> GridLines {
        GridLines::from_points(self.grid_points_x.clone(), self.grid_points_y.clone())
    }

    /// Bit data checked against the geometry.
    ///
    /// `Ok(None)` when the document carries no data. A token count that does
    /// not match the intersections is a `DataShapeMismatch`; any token other
    /// than `"0"` or `"1"` is `InvalidDocument`.
    pub fn bit_matrix(&self, lines: &GridLines) -> Result<Option<BitMatrix>> {
        let Some(data) = self.data.as_ref().filter(|d| !d.is_empty()) else {
            return Ok(None);
        };
        let (cols, rows) = lines.shape();
        data.to_matrix(cols, rows).map(Some)
    }

    /// Geometry plus data. Data that does not fit is logged and dropped;
    /// the grid lines always survive.
    pub fn decode(&self) -> DecodedGrid {
        let lines = self.lines();
        match self.bit_matrix(&lines) {
            Ok(bits) => DecodedGrid {
                lines,
                bits,
                data_discarded: false,
            },
            Err(err) => {
                warn!("{err}; ignoring stored data and keeping the grid");
                DecodedGrid {
                    lines,
                    bits: None,
                    data_discarded: true,
                }
            }
        }
    }
}
