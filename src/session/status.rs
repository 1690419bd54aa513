use super::{Selection, Session};
use crate::types::Axis;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Snapshot of the session's configuration and grid state.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub image: Option<PathBuf>,
    pub width: usize,
    pub height: usize,
    pub columns: usize,
    pub rows: usize,
    pub group_cols: usize,
    pub group_rows: usize,
    pub step_x: Option<f64>,
    pub step_y: Option<f64>,
    pub radius: u32,
    pub bit_thresh_div: u32,
    pub pix_thresh_min: u8,
    pub threshold: bool,
    pub dilate: u32,
    pub erode: u32,
    pub inverted: bool,
    pub lsb_mode: bool,
    pub data_read: bool,
    pub ones: Option<usize>,
    pub selection: Selection,
    pub display_grid: bool,
    pub display_original: bool,
    pub display_peephole: bool,
    pub display_data: bool,
    pub display_binary: bool,
}

impl StatusReport {
    pub(super) fn from_session(s: &Session) -> Self {
        let cfg = s.config();
        let (columns, rows) = s.lines().shape();
        let layout = s.layout();
        Self {
            image: s.raster().source().map(PathBuf::from),
            width: s.raster().width(),
            height: s.raster().height(),
            columns,
            rows,
            group_cols: layout.cols,
            group_rows: layout.rows,
            step_x: s.step(Axis::Column),
            step_y: s.step(Axis::Row),
            radius: cfg.radius,
            bit_thresh_div: cfg.bit_thresh_div,
            pix_thresh_min: cfg.pix_thresh_min,
            threshold: cfg.threshold,
            dilate: cfg.dilate,
            erode: cfg.erode,
            inverted: cfg.inverted,
            lsb_mode: cfg.lsb_mode,
            data_read: s.data_read(),
            ones: s.bits().map(|b| b.count_ones()),
            selection: s.selection(),
            display_grid: cfg.display_grid,
            display_original: cfg.display_original,
            display_peephole: cfg.display_peephole,
            display_data: cfg.display_data,
            display_binary: cfg.display_binary,
        }
    }
}

fn on_off(v: bool) -> &'static str {
    if v {
        "on"
    } else {
        "off"
    }
}

fn opt<T: fmt::Display>(v: Option<T>) -> String {
    v.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let image = self
            .image
            .as_ref()
            .map_or_else(|| "<memory>".to_string(), |p| p.display().to_string());
        writeln!(f, "image:          {image} ({}x{})", self.width, self.height)?;
        writeln!(
            f,
            "display:        grid={} original={} peephole={} data={} binary={}",
            on_off(self.display_grid),
            on_off(self.display_original),
            on_off(self.display_peephole),
            on_off(self.display_data),
            on_off(self.display_binary)
        )?;
        writeln!(
            f,
            "grid:           {} columns x {} rows, groups {}x{}",
            self.columns, self.rows, self.group_cols, self.group_rows
        )?;
        writeln!(
            f,
            "step:           x={} y={}",
            opt(self.step_x.map(|s| format!("{s:.2}"))),
            opt(self.step_y.map(|s| format!("{s:.2}")))
        )?;
        writeln!(f, "radius:         {}", self.radius)?;
        writeln!(f, "bit_thresh_div: {}", self.bit_thresh_div)?;
        writeln!(
            f,
            "pix_thresh_min: 0x{:02x} (threshold {})",
            self.pix_thresh_min,
            on_off(self.threshold)
        )?;
        writeln!(f, "dilate/erode:   {}/{}", self.dilate, self.erode)?;
        writeln!(
            f,
            "packing:        inverted={} lsb={}",
            on_off(self.inverted),
            on_off(self.lsb_mode)
        )?;
        writeln!(
            f,
            "data:           {}",
            match self.ones {
                Some(ones) => format!("read, {ones} ones"),
                None => "not read".to_string(),
            }
        )?;
        write!(
            f,
            "selection:      column {} row {}",
            opt(self.selection.col),
            opt(self.selection.row)
        )
    }
}
