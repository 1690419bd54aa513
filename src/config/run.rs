//! JSON configuration for the `rom_read` tool.
//!
//! ```json
//! {
//!   "input": "rom.png",
//!   "group_cols": 8,
//!   "group_rows": 8,
//!   "decode": { "bit_thresh_div": 12, "default_radius": 5 },
//!   "clicks": { "columns": [[101, 40], [240, 40]], "rows": [[101, 40], [101, 180]] },
//!   "output": { "save": true, "report_json": "out/report.json" }
//! }
//! ```
use super::decode::DecodeConfig;
use crate::types::ImgXY;
use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize)]
pub struct RunConfig {
    /// Source photograph. Optional when `grid_file` names one.
    #[serde(default)]
    pub input: Option<PathBuf>,
    /// Previously saved grid document to resume from.
    #[serde(default)]
    pub grid_file: Option<PathBuf>,
    /// Group layout; falls back to the grid document's when absent.
    #[serde(default)]
    pub group_cols: Option<usize>,
    #[serde(default)]
    pub group_rows: Option<usize>,
    /// Decode parameters. Overrides whatever a loaded grid document carries.
    #[serde(default)]
    pub decode: Option<DecodeConfig>,
    #[serde(default)]
    pub clicks: ClickScript,
    /// Classify the grid after the clicks are replayed.
    #[serde(default = "default_true")]
    pub read: bool,
    #[serde(default)]
    pub output: RunOutputConfig,
}

/// Clicks replayed through the grid builder, in order.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClickScript {
    pub columns: Vec<(usize, usize)>,
    pub rows: Vec<(usize, usize)>,
    /// Disable auto-centering for every scripted click.
    pub exact: bool,
}

impl ClickScript {
    pub fn column_clicks(&self) -> impl Iterator<Item = ImgXY> + '_ {
        self.columns.iter().map(|&(x, y)| ImgXY::new(x, y))
    }

    pub fn row_clicks(&self) -> impl Iterator<Item = ImgXY> + '_ {
        self.rows.iter().map(|&(x, y)| ImgXY::new(x, y))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RunOutputConfig {
    /// Write grid/txt/dat files next to the input image.
    pub save: bool,
    /// Optional JSON read report with timings.
    pub report_json: Option<PathBuf>,
    /// Optional PNG dump of the preprocessed raster.
    pub target_png: Option<PathBuf>,
    /// Optional PNG dump of the aperture mask.
    pub peephole_png: Option<PathBuf>,
    /// Print a hex dump of the packed rows.
    pub hex_dump: bool,
}

fn default_true() -> bool {
    true
}

pub fn load_config(path: &Path) -> Result<RunConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let mut config: RunConfig = serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    if let Some(decode) = config.decode.as_mut() {
        for (key, _) in decode.take_unknown() {
            warn!("ignoring unknown decode key {key:?} in {}", path.display());
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg: RunConfig = serde_json::from_str(r#"{"input": "rom.png"}"#).expect("parse");
        assert_eq!(cfg.input.as_deref(), Some(Path::new("rom.png")));
        assert!(cfg.read);
        assert!(!cfg.output.save);
        assert!(cfg.clicks.columns.is_empty());
        assert!(cfg.decode.is_none());
    }

    #[test]
    fn clicks_parse_as_pairs() {
        let cfg: RunConfig = serde_json::from_str(
            r#"{"grid_file": "rom.grid", "clicks": {"columns": [[10, 20], [30, 20]], "exact": true}}"#,
        )
        .expect("parse");
        let cols: Vec<ImgXY> = cfg.clicks.column_clicks().collect();
        assert_eq!(cols, vec![ImgXY::new(10, 20), ImgXY::new(30, 20)]);
        assert!(cfg.clicks.exact);
    }
}
