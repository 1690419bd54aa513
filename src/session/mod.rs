//! The editing session: one photograph, one grid, one bit matrix.
//!
//! `Session` owns every piece of mutable state and is passed explicitly to
//! whoever drives it (the `rom_read` tool, a viewer, tests). The grid lines
//! are authoritative; the bit matrix, when present, always has the shape of
//! the current lines. Any change to geometry or preprocessing re-reads the
//! whole grid if data had been read before, so manual toggles do not survive
//! such a change.
pub mod command;
pub mod status;

pub use command::{Command, DisplayFlag};
pub use status::StatusReport;

use crate::bits::BitMatrix;
use crate::classify::{classify_all, Aperture};
use crate::config::{DecodeConfig, GroupLayout};
use crate::diagnostics::{ReadReport, TimingBreakdown};
use crate::error::{Error, Result};
use crate::grid::{ClickOutcome, GridBuilder, GridLines, Lookup};
use crate::image::io::write_atomic;
use crate::image::ImageGray8;
use crate::packing::{self, PackOptions};
use crate::persist::{link_alias, GridDocument, SaveTarget, SavedFiles};
use crate::raster::{PreprocessParams, RasterBuffers};
use crate::types::{Axis, BitXY, ImgXY};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Column and row currently under edit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub col: Option<usize>,
    pub row: Option<usize>,
}

/// One intersection as the overlay draws it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayCell {
    pub bit: BitXY,
    pub at: ImgXY,
    /// `None` until the grid has been read.
    pub value: Option<bool>,
    /// Same row as the selection and inside the selected column's group.
    pub highlighted: bool,
}

/// Position of a searched byte in the packed stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ByteMatch {
    pub group: usize,
    pub row: usize,
    /// Byte offset inside the row's chunk of the group.
    pub offset: usize,
    pub value: u8,
}

#[derive(Debug)]
pub struct Session {
    raster: RasterBuffers,
    lines: GridLines,
    builder: GridBuilder,
    config: DecodeConfig,
    bits: Option<BitMatrix>,
    selection: Selection,
    search: Vec<u8>,
    save_target: Option<SaveTarget>,
}

impl Session {
    /// Start an empty grid over `raster`.
    pub fn new(raster: RasterBuffers, layout: GroupLayout, config: DecodeConfig) -> Result<Self> {
        config.validate()?;
        let save_target = raster.source().map(SaveTarget::for_image);
        let mut session = Self {
            raster,
            lines: GridLines::new(),
            builder: GridBuilder::new(layout),
            config,
            bits: None,
            selection: Selection::default(),
            search: Vec::new(),
            save_target,
        };
        session.refresh_target();
        Ok(session)
    }

    /// Resume from a saved document. `layout` overrides the stored grouping
    /// and is required when the document has none.
    ///
    /// Stored bit data that does not match the geometry, or holds anything
    /// but `"0"`/`"1"` tokens, is dropped with a warning; the grid itself is
    /// kept.
    pub fn from_document(
        raster: RasterBuffers,
        doc: &GridDocument,
        layout: Option<GroupLayout>,
    ) -> Result<Self> {
        let decoded = doc.decode();
        decoded.lines.check_extent(raster.width(), raster.height())?;
        let layout = match layout {
            Some(layout) => layout,
            None => doc.layout().transpose()?.ok_or_else(|| {
                Error::Config("grid document has no group_cols/group_rows; supply a layout".into())
            })?,
        };
        let mut config = doc.config.clone();
        let builder = GridBuilder::from_lines(layout, &decoded.lines);
        builder.derive_radius(&mut config);
        let save_target = raster.source().map(SaveTarget::for_image);
        let mut session = Self {
            raster,
            lines: decoded.lines,
            builder,
            config,
            bits: decoded.bits,
            selection: Selection::default(),
            search: Vec::new(),
            save_target,
        };
        session.refresh_target();
        Ok(session)
    }

    /// Load a grid document and the photograph it refers to. `image`
    /// overrides the document's `img_fn`; a relative `img_fn` that does not
    /// exist as given is looked up next to the grid file.
    pub fn open(grid: &Path, image: Option<&Path>, layout: Option<GroupLayout>) -> Result<Self> {
        let doc = GridDocument::load(grid)?;
        let image = match image {
            Some(path) => path.to_path_buf(),
            None => resolve_image(grid, doc.img_fn.as_deref())?,
        };
        let raster = RasterBuffers::load(&image)?;
        Self::from_document(raster, &doc, layout)
    }

    pub fn raster(&self) -> &RasterBuffers {
        &self.raster
    }

    pub fn lines(&self) -> &GridLines {
        &self.lines
    }

    /// Decoded bits, `None` until the grid has been read.
    pub fn bits(&self) -> Option<&BitMatrix> {
        self.bits.as_ref()
    }

    pub fn data_read(&self) -> bool {
        self.bits.is_some()
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    pub fn layout(&self) -> GroupLayout {
        self.builder.layout()
    }

    pub fn step(&self, axis: Axis) -> Option<f64> {
        self.builder.step(axis)
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn save_target(&self) -> Option<&SaveTarget> {
        self.save_target.as_ref()
    }

    pub fn set_save_target(&mut self, target: SaveTarget) {
        self.save_target = Some(target);
    }

    /// Replace the decode parameters wholesale.
    pub fn set_config(&mut self, config: DecodeConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        self.refresh_target();
        self.reread()
    }

    fn refresh_target(&mut self) {
        self.raster.preprocess(PreprocessParams::from(&self.config));
    }

    /// Re-classify if data has been read; otherwise nothing to do.
    fn reread(&mut self) -> Result<()> {
        if self.bits.is_some() {
            self.read_data()?;
        }
        Ok(())
    }

    fn extent(&self, axis: Axis) -> usize {
        match axis {
            Axis::Column => self.raster.width(),
            Axis::Row => self.raster.height(),
        }
    }

    fn lookup(&self, autocenter: bool) -> Lookup {
        if autocenter {
            Lookup::Nearby {
                radius: self.config.radius,
            }
        } else {
            Lookup::Exact
        }
    }

    // --- grid building -----------------------------------------------------

    pub fn add_column_line(&mut self, click: ImgXY, autocenter: bool) -> Result<ClickOutcome> {
        self.add_line(Axis::Column, click, autocenter)
    }

    pub fn add_row_line(&mut self, click: ImgXY, autocenter: bool) -> Result<ClickOutcome> {
        self.add_line(Axis::Row, click, autocenter)
    }

    /// Feed one click to the grid builder.
    pub fn add_line(&mut self, axis: Axis, click: ImgXY, autocenter: bool) -> Result<ClickOutcome> {
        let target = self.raster.preprocess(PreprocessParams::from(&self.config));
        let outcome = self
            .builder
            .click(&mut self.lines, target, axis, click, autocenter)?;
        debug!("{axis} click at {click}: {outcome:?}");
        if let ClickOutcome::Group {
            step_measured: true,
            ..
        } = outcome
        {
            self.builder.derive_radius(&mut self.config);
        }
        if outcome.changed_grid() {
            self.geometry_changed()?;
        }
        Ok(outcome)
    }

    /// Keep the bit matrix and the selection consistent with new lines.
    fn geometry_changed(&mut self) -> Result<()> {
        let (cols, rows) = self.lines.shape();
        if self.selection.col.is_some_and(|c| c >= cols) {
            self.selection.col = None;
        }
        if self.selection.row.is_some_and(|r| r >= rows) {
            self.selection.row = None;
        }
        if self.bits.as_ref().is_some_and(|b| b.shape() != (cols, rows)) {
            self.bits = Some(BitMatrix::new(cols, rows));
        }
        self.reread()
    }

    // --- coordinates -------------------------------------------------------

    pub fn bit_to_image(&self, bit: BitXY) -> Result<ImgXY> {
        self.lines.bit_to_image(bit)
    }

    /// Intersection under `img`: exact, or the first line within
    /// `radius / 2` on each axis when `autocenter` is set.
    pub fn image_to_bit(&self, img: ImgXY, autocenter: bool) -> Result<BitXY> {
        if !self.raster.contains(img) {
            return Err(Error::OutsideImage {
                x: img.x,
                y: img.y,
                width: self.raster.width(),
                height: self.raster.height(),
            });
        }
        self.lines.image_to_bit(img, self.lookup(autocenter))
    }

    // --- reading -----------------------------------------------------------

    /// Preprocess (if parameters changed) and classify every intersection.
    /// Replaces any previous bits, manual toggles included.
    pub fn read_data(&mut self) -> Result<ReadReport> {
        let start = Instant::now();
        let mut timing = TimingBreakdown::default();
        let aperture = Aperture::from_config(&self.config)?;
        if aperture.radius == 0 {
            warn!("radius is 0; every intersection will read as 0");
        }
        let target = self.raster.preprocess(PreprocessParams::from(&self.config));
        let lap = timing.lap("preprocess", start);
        let (bits, stats) = classify_all(target, &self.lines, &aperture)?;
        timing.lap("classify", lap);
        timing.finish(start);

        let (columns, rows) = bits.shape();
        let report = ReadReport {
            columns,
            rows,
            radius: self.config.radius,
            bit_thresh_div: self.config.bit_thresh_div,
            stats,
            timing,
        };
        info!(
            "read {}x{} grid: {} ones, {} zeros in {:.3} ms",
            columns,
            rows,
            report.stats.ones,
            report.zeros(),
            report.timing.total_ms
        );
        self.bits = Some(bits);
        Ok(report)
    }

    /// Forget decoded data and return to grid editing.
    pub fn reset_read(&mut self) {
        self.bits = None;
        self.selection = Selection::default();
    }

    // --- bit editing -------------------------------------------------------

    /// Flip the bit nearest to `img`. Returns the new value.
    pub fn toggle_at(&mut self, img: ImgXY) -> Result<bool> {
        let bit = self.image_to_bit(img, true)?;
        self.toggle(bit)
    }

    pub fn toggle(&mut self, bit: BitXY) -> Result<bool> {
        let bits = self.bits.as_mut().ok_or(Error::NoData)?;
        let value = bits.toggle(bit)?;
        debug!("toggled {bit} -> {}", u8::from(value));
        Ok(value)
    }

    /// Make the intersection nearest to `img` the edit target.
    pub fn select_at(&mut self, img: ImgXY) -> Result<BitXY> {
        let bit = self.image_to_bit(img, true)?;
        self.select(bit)?;
        Ok(bit)
    }

    pub fn select(&mut self, bit: BitXY) -> Result<()> {
        self.lines.check_bit(bit)?;
        self.selection = Selection {
            col: Some(bit.col),
            row: Some(bit.row),
        };
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::default();
    }

    fn selected(&self, axis: Axis) -> Option<usize> {
        match axis {
            Axis::Column => self.selection.col,
            Axis::Row => self.selection.row,
        }
    }

    fn set_selected(&mut self, axis: Axis, index: Option<usize>) {
        match axis {
            Axis::Column => self.selection.col = index,
            Axis::Row => self.selection.row = index,
        }
    }

    pub fn delete_selected_column(&mut self) -> Result<bool> {
        self.delete_selected(Axis::Column)
    }

    pub fn delete_selected_row(&mut self) -> Result<bool> {
        self.delete_selected(Axis::Row)
    }

    fn delete_selected(&mut self, axis: Axis) -> Result<bool> {
        let Some(index) = self.selected(axis) else {
            debug!("no {axis} selected; delete ignored");
            return Ok(false);
        };
        self.set_selected(axis, None);
        let Some(pos) = self.lines.remove(axis, index) else {
            return Ok(false);
        };
        if let Some(bits) = self.bits.as_mut() {
            match axis {
                Axis::Column => bits.remove_column(index)?,
                Axis::Row => bits.remove_row(index)?,
            }
        }
        debug!("deleted {axis} {index} at {pos}");
        self.geometry_changed()?;
        Ok(true)
    }

    pub fn insert_column(&mut self, x: usize) -> Result<bool> {
        self.insert_line(Axis::Column, x)
    }

    pub fn insert_row(&mut self, y: usize) -> Result<bool> {
        self.insert_line(Axis::Row, y)
    }

    /// Add one line without the group protocol. Duplicates and positions
    /// outside the image are ignored.
    fn insert_line(&mut self, axis: Axis, pos: usize) -> Result<bool> {
        if pos >= self.extent(axis) {
            debug!("{axis} insert at {pos} ignored: outside the image");
            return Ok(false);
        }
        let Some(index) = self.lines.insert(axis, pos) else {
            debug!("{axis} insert at {pos} ignored: line exists");
            return Ok(false);
        };
        if let Some(bits) = self.bits.as_mut() {
            match axis {
                Axis::Column => bits.insert_column(index)?,
                Axis::Row => bits.insert_row(index)?,
            }
        }
        if let Some(sel) = self.selected(axis).filter(|&s| s >= index) {
            self.set_selected(axis, Some(sel + 1));
        }
        debug!("inserted {axis} {index} at {pos}");
        self.geometry_changed()?;
        Ok(true)
    }

    pub fn shift_selected_column(&mut self, delta: i64) -> Result<bool> {
        self.shift_selected(Axis::Column, delta)
    }

    pub fn shift_selected_row(&mut self, delta: i64) -> Result<bool> {
        self.shift_selected(Axis::Row, delta)
    }

    fn shift_selected(&mut self, axis: Axis, delta: i64) -> Result<bool> {
        let Some(index) = self.selected(axis) else {
            debug!("no {axis} selected; shift ignored");
            return Ok(false);
        };
        let extent = self.extent(axis);
        if !self.lines.shift(axis, index, delta, extent) {
            return Ok(false);
        }
        self.geometry_changed()?;
        Ok(true)
    }

    /// Move every column of the selected column's group together.
    pub fn shift_selected_column_group(&mut self, delta: i64) -> Result<bool> {
        let Some(col) = self.selection.col else {
            debug!("no column selected; group shift ignored");
            return Ok(false);
        };
        let group = self.layout().cols;
        let start = col - col % group;
        let end = (start + group).min(self.lines.columns().len());
        let extent = self.raster.width();
        if !self
            .lines
            .shift_range(Axis::Column, start..end, delta, extent)
        {
            return Ok(false);
        }
        self.geometry_changed()?;
        Ok(true)
    }

    // --- parameters --------------------------------------------------------

    pub fn adjust_radius(&mut self, delta: i32) -> Result<u32> {
        let radius = step_param(self.config.radius, delta, 0, u32::MAX);
        if radius != self.config.radius {
            self.config.radius = radius;
            self.reread()?;
        }
        Ok(radius)
    }

    pub fn adjust_bit_thresh_div(&mut self, delta: i32) -> Result<u32> {
        let div = step_param(self.config.bit_thresh_div, delta, 1, u32::MAX);
        if div != self.config.bit_thresh_div {
            self.config.bit_thresh_div = div;
            self.reread()?;
        }
        Ok(div)
    }

    pub fn adjust_pix_thresh(&mut self, delta: i32) -> Result<u8> {
        let thresh = step_param(self.config.pix_thresh_min.into(), delta, 1, 255) as u8;
        if thresh != self.config.pix_thresh_min {
            self.config.pix_thresh_min = thresh;
            self.preprocessing_changed()?;
        }
        Ok(thresh)
    }

    pub fn adjust_dilate(&mut self, delta: i32) -> Result<u32> {
        let dilate = step_param(self.config.dilate, delta, 0, u32::MAX);
        if dilate != self.config.dilate {
            self.config.dilate = dilate;
            self.preprocessing_changed()?;
        }
        Ok(dilate)
    }

    pub fn adjust_erode(&mut self, delta: i32) -> Result<u32> {
        let erode = step_param(self.config.erode, delta, 0, u32::MAX);
        if erode != self.config.erode {
            self.config.erode = erode;
            self.preprocessing_changed()?;
        }
        Ok(erode)
    }

    fn preprocessing_changed(&mut self) -> Result<()> {
        self.refresh_target();
        self.reread()
    }

    /// Packing-time flags need no re-read.
    pub fn toggle_inverted(&mut self) -> bool {
        self.config.inverted = !self.config.inverted;
        self.config.inverted
    }

    pub fn toggle_lsb(&mut self) -> bool {
        self.config.lsb_mode = !self.config.lsb_mode;
        self.config.lsb_mode
    }

    pub fn toggle_display(&mut self, flag: DisplayFlag) -> bool {
        let slot = flag.slot(&mut self.config);
        *slot = !*slot;
        *slot
    }

    // --- data views --------------------------------------------------------

    fn read_bits(&self) -> Result<&BitMatrix> {
        self.bits.as_ref().ok_or(Error::NoData)
    }

    fn pack_options(&self) -> PackOptions {
        PackOptions::from(&self.config)
    }

    /// The decoded bits as one byte stream, group by group.
    pub fn packed_bytes(&self) -> Result<Vec<u8>> {
        packing::pack(self.read_bits()?, self.layout(), self.pack_options())
    }

    /// Packed bytes per column group, in group order.
    pub fn packed_groups(&self) -> Result<Vec<Vec<u8>>> {
        let bits = self.read_bits()?;
        let packed = packing::pack(bits, self.layout(), self.pack_options())?;
        let groups = packing::column_groups(bits.cols(), self.layout());
        Ok(packing::split_groups(&packed, groups)
            .into_iter()
            .map(<[u8]>::to_vec)
            .collect())
    }

    pub fn byte_rows(&self) -> Result<Vec<Vec<u8>>> {
        packing::byte_rows(self.read_bits()?, self.layout(), self.pack_options())
    }

    /// One formatted line per grid row, hex or binary per the display flag.
    pub fn data_rows(&self) -> Result<Vec<String>> {
        let binary = self.config.display_binary;
        Ok(self
            .byte_rows()?
            .iter()
            .map(|row| packing::format_byte_row(row, binary))
            .collect())
    }

    pub fn text_export(&self) -> Result<String> {
        Ok(packing::render_text(self.read_bits()?, self.layout()))
    }

    pub fn set_search(&mut self, bytes: impl Into<Vec<u8>>) {
        self.search = bytes.into();
    }

    pub fn search(&self) -> &[u8] {
        &self.search
    }

    /// Every occurrence of a searched byte in the packed stream.
    pub fn find_bytes(&self) -> Result<Vec<ByteMatch>> {
        if self.search.is_empty() {
            return Ok(Vec::new());
        }
        let bits = self.read_bits()?;
        let per_chunk = self.layout().bytes_per_chunk()?;
        let rows = bits.rows().max(1);
        let packed = packing::pack(bits, self.layout(), self.pack_options())?;
        Ok(packed
            .iter()
            .enumerate()
            .filter(|&(_, b)| self.search.contains(b))
            .map(|(i, &value)| {
                let chunk = i / per_chunk;
                ByteMatch {
                    group: chunk / rows,
                    row: chunk % rows,
                    offset: i % per_chunk,
                    value,
                }
            })
            .collect())
    }

    /// Every intersection with its position, value and highlight state.
    pub fn overlay(&self) -> impl Iterator<Item = OverlayCell> + '_ {
        let group = self.layout().cols;
        let sel = self.selection;
        self.lines.iter_bits().filter_map(move |bit| {
            let at = self.lines.bit_to_image(bit).ok()?;
            let value = self.bits.as_ref().and_then(|b| b.get(bit).ok());
            let highlighted = sel.row == Some(bit.row)
                && sel.col.is_some_and(|c| c / group == bit.col / group);
            Some(OverlayCell {
                bit,
                at,
                value,
                highlighted,
            })
        })
    }

    pub fn peephole_mask(&self) -> ImageGray8 {
        self.raster.peephole_mask(&self.lines, self.config.radius)
    }

    pub fn status(&self) -> StatusReport {
        StatusReport::from_session(self)
    }

    // --- persistence -------------------------------------------------------

    pub fn to_document(&self) -> GridDocument {
        GridDocument::new(
            &self.lines,
            self.bits.as_ref(),
            self.layout(),
            &self.config,
            self.raster.source(),
        )
    }

    /// Write the grid document to `path` without touching save slots.
    pub fn save_grid_to(&self, path: &Path) -> Result<()> {
        self.to_document().write(path)
    }

    /// Write the next save slot and, once all of its files exist, repoint
    /// the aliases at it.
    pub fn save(&mut self) -> Result<SavedFiles> {
        let Some(target) = self.save_target.as_mut() else {
            return Err(Error::Config(
                "no save location: the image was not loaded from a file".into(),
            ));
        };
        let slot = target.next_slot();
        let target = target.clone();

        // Everything that can fail on configuration is computed before the
        // first file is written.
        let text = self.bits.as_ref().map(|b| packing::render_text(b, self.layout()));
        let groups = if self.bits.is_some() && self.config.save_dat {
            self.packed_groups()?
        } else {
            Vec::new()
        };

        let mut saved = SavedFiles {
            slot,
            grid: target.grid_path(slot),
            ..Default::default()
        };
        // Slot files first; the aliases move only once the slot is complete.
        self.to_document().write(&saved.grid)?;
        if let Some(text) = text {
            let txt = target.txt_path(slot);
            write_atomic(&txt, text.as_bytes())?;
            saved.txt = Some(txt);
        }
        for (group, bytes) in groups.iter().enumerate() {
            let dat = target.dat_path(slot, group);
            write_atomic(&dat, bytes)?;
            saved.dat.push(dat);
        }

        link_alias(&saved.grid, &target.grid_alias())?;
        if let Some(txt) = &saved.txt {
            link_alias(txt, &target.txt_alias())?;
        }
        for (group, dat) in saved.dat.iter().enumerate() {
            link_alias(dat, &target.dat_alias(group))?;
        }
        info!("saved {}", saved.grid.display());
        Ok(saved)
    }
}

/// Clamp `value + delta` to `[min, max]`.
fn step_param(value: u32, delta: i32, min: u32, max: u32) -> u32 {
    (value as i64 + delta as i64).clamp(min as i64, max as i64) as u32
}

fn resolve_image(grid: &Path, img_fn: Option<&Path>) -> Result<PathBuf> {
    let img_fn = img_fn.ok_or_else(|| {
        Error::Config(format!(
            "{} does not name its image; supply one explicitly",
            grid.display()
        ))
    })?;
    if img_fn.is_absolute() || img_fn.exists() {
        return Ok(img_fn.to_path_buf());
    }
    Ok(grid
        .parent()
        .map(|dir| dir.join(img_fn))
        .unwrap_or_else(|| img_fn.to_path_buf()))
}
