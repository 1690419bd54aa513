//! Line acquisition protocol.
//!
//! Per axis:
//! 1. With no lines (or a group size of 1) a click stores a single line.
//! 2. The second click measures the group spacing
//!    `step = (second - first) / (group - 1)`, drops the single line and lays
//!    down a full group of `group` lines starting at the first click.
//! 3. Every later click lays down a full group from the click position using
//!    the measured step.
//!
//! Group lines past the raster edge are dropped. A later click inside the
//! span of a group placed this way is refused. Clicks are auto-centered on
//! the lit cell under the cursor unless the caller asks for exact placement.
use super::lines::GridLines;
use crate::config::{DecodeConfig, GroupLayout};
use crate::error::{Error, Result};
use crate::image::{ImageRgb8, ImageView};
use crate::types::{Axis, ImgXY};
use log::debug;

/// What a click did to the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClickOutcome {
    /// Auto-centering was requested but the pixel under the click is dark.
    Miss,
    /// A line already exists at the (centered) position.
    Duplicate,
    /// The position falls inside the span of an already placed group.
    InsideGroup,
    /// One line was stored.
    Single { index: usize },
    /// A group was laid down. `step_measured` is set on the click that
    /// established the spacing.
    Group { added: usize, step_measured: bool },
}

impl ClickOutcome {
    /// True when the grid lines changed.
    pub fn changed_grid(&self) -> bool {
        matches!(self, ClickOutcome::Single { .. } | ClickOutcome::Group { .. })
    }
}

#[derive(Clone, Debug)]
pub struct GridBuilder {
    layout: GroupLayout,
    step_x: Option<f64>,
    step_y: Option<f64>,
    /// `(first, last)` line of every group laid down, per axis.
    spans_x: Vec<(usize, usize)>,
    spans_y: Vec<(usize, usize)>,
}

impl GridBuilder {
    pub fn new(layout: GroupLayout) -> Self {
        Self {
            layout,
            step_x: None,
            step_y: None,
            spans_x: Vec::new(),
            spans_y: Vec::new(),
        }
    }

    /// Resume from existing lines: the step is the spacing of the first two
    /// lines on each axis, and group spans are recovered by walking the lines
    /// with that step.
    pub fn from_lines(layout: GroupLayout, lines: &GridLines) -> Self {
        let mut builder = Self::new(layout);
        for axis in [Axis::Column, Axis::Row] {
            let Some(step) = lines.first_spacing(axis) else {
                continue;
            };
            builder.set_step(axis, step);
            let spans = recover_spans(lines.axis(axis), step, builder.group_size(axis));
            *builder.spans_mut(axis) = spans;
        }
        builder
    }

    pub fn layout(&self) -> GroupLayout {
        self.layout
    }

    /// Measured spacing for an axis, if established.
    pub fn step(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Column => self.step_x,
            Axis::Row => self.step_y,
        }
    }

    fn set_step(&mut self, axis: Axis, step: f64) {
        match axis {
            Axis::Column => self.step_x = Some(step),
            Axis::Row => self.step_y = Some(step),
        }
    }

    fn spans(&self, axis: Axis) -> &[(usize, usize)] {
        match axis {
            Axis::Column => &self.spans_x,
            Axis::Row => &self.spans_y,
        }
    }

    fn spans_mut(&mut self, axis: Axis) -> &mut Vec<(usize, usize)> {
        match axis {
            Axis::Column => &mut self.spans_x,
            Axis::Row => &mut self.spans_y,
        }
    }

    fn group_size(&self, axis: Axis) -> usize {
        match axis {
            Axis::Column => self.layout.cols,
            Axis::Row => self.layout.rows,
        }
    }

    /// Run one click through auto-centering and the acquisition protocol.
    ///
    /// `target` is the preprocessed raster the centering heuristic reads.
    pub fn click(
        &mut self,
        lines: &mut GridLines,
        target: &ImageRgb8,
        axis: Axis,
        click: ImgXY,
        autocenter: bool,
    ) -> Result<ClickOutcome> {
        if !target.contains(click.x, click.y) {
            return Err(Error::OutsideImage {
                x: click.x,
                y: click.y,
                width: target.w,
                height: target.h,
            });
        }
        let click = if autocenter {
            if target.pixel_sum(click.x, click.y) == 0 {
                debug!("autocenter: miss at {click}");
                return Ok(ClickOutcome::Miss);
            }
            let centered = auto_center(target, click);
            debug!("autocenter: {click} -> {centered}");
            centered
        } else {
            click
        };
        let extent = match axis {
            Axis::Column => target.w,
            Axis::Row => target.h,
        };
        Ok(self.place(lines, axis, axis.coord(click), extent))
    }

    /// Apply the acquisition protocol to an already centered position.
    pub fn place(
        &mut self,
        lines: &mut GridLines,
        axis: Axis,
        pos: usize,
        extent: usize,
    ) -> ClickOutcome {
        if lines.contains(axis, pos) {
            return ClickOutcome::Duplicate;
        }
        let group = self.group_size(axis);
        let existing = lines.axis(axis).len();
        if existing == 0 || group == 1 {
            return match lines.insert(axis, pos) {
                Some(index) => ClickOutcome::Single { index },
                None => ClickOutcome::Duplicate,
            };
        }

        if existing == 1 {
            let first = lines.axis(axis)[0];
            let step = (pos as f64 - first as f64) / (group - 1) as f64;
            debug!("{axis} step measured: {step:.3}");
            self.set_step(axis, step);
            lines.clear_axis(axis);
            self.spans_mut(axis).clear();
            let (added, last) = expand_group(lines, axis, first, step, group, extent);
            if let Some(last) = last {
                self.spans_mut(axis).push((first.min(last), first.max(last)));
            }
            return ClickOutcome::Group {
                added,
                step_measured: true,
            };
        }

        if self.spans(axis).iter().any(|&(lo, hi)| lo <= pos && pos <= hi) {
            return ClickOutcome::InsideGroup;
        }
        let step = self
            .step(axis)
            .or_else(|| lines.first_spacing(axis))
            .unwrap_or(0.0);
        let (added, last) = expand_group(lines, axis, pos, step, group, extent);
        if let Some(last) = last {
            self.spans_mut(axis).push((pos.min(last), pos.max(last)));
        }
        ClickOutcome::Group {
            added,
            step_measured: false,
        }
    }

    /// Derive the aperture radius once: an explicit `default_radius` wins,
    /// then a third of the column step, then a third of the row step. A
    /// radius that is already set is never touched.
    pub fn derive_radius(&self, config: &mut DecodeConfig) -> bool {
        if config.radius != 0 {
            return false;
        }
        let derived = config.default_radius.or_else(|| {
            self.step_x
                .filter(|s| *s != 0.0)
                .or(self.step_y.filter(|s| *s != 0.0))
                .map(|s| (s.abs() / 3.0) as u32)
        });
        match derived {
            Some(r) if r > 0 => {
                debug!("radius derived: {r}");
                config.radius = r;
                true
            }
            _ => false,
        }
    }
}

/// Lay down `group` lines at `start + k * step`, stopping at the first one
/// outside `[0, extent)`. Returns the number of lines actually added and the
/// last position inside the raster, duplicates included.
fn expand_group(
    lines: &mut GridLines,
    axis: Axis,
    start: usize,
    step: f64,
    group: usize,
    extent: usize,
) -> (usize, Option<usize>) {
    let mut added = 0;
    let mut last = None;
    for k in 0..group {
        let pos = (start as f64 + k as f64 * step).floor();
        if pos < 0.0 || pos >= extent as f64 {
            break;
        }
        last = Some(pos as usize);
        if lines.insert(axis, pos as usize).is_some() {
            added += 1;
        }
    }
    (added, last)
}

/// Walk sorted lines and close a group once `group` lines have been taken or
/// the next line lies beyond `start + (group - 1) * step`. Lines that do not
/// fall into any multi-line run are left without a span.
fn recover_spans(lines: &[usize], step: f64, group: usize) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    if group < 2 || step <= 0.0 {
        return spans;
    }
    let reach = ((group - 1) as f64 * step).ceil() as usize;
    let mut i = 0;
    while i < lines.len() {
        let start = lines[i];
        let mut j = i + 1;
        while j < lines.len() && j - i < group && lines[j] <= start + reach {
            j += 1;
        }
        if j - i > 1 {
            spans.push((start, lines[j - 1]));
        }
        i = j;
    }
    spans
}

/// Move a click to the middle of the lit cell under it: first to the centre
/// of the horizontal run of non-zero pixels, then to the centre of the
/// vertical run through that x. Runs end at the first dark pixel or the
/// raster edge.
pub fn auto_center(target: &ImageRgb8, click: ImgXY) -> ImgXY {
    let lit = |x: i64, y: i64| {
        x >= 0
            && y >= 0
            && (x as usize) < target.w
            && (y as usize) < target.h
            && target.pixel_sum(x as usize, y as usize) != 0
    };

    let (cx, cy) = (click.x as i64, click.y as i64);
    let mut x_min = cx;
    while lit(x_min, cy) {
        x_min -= 1;
    }
    let mut x_max = cx;
    while lit(x_max, cy) {
        x_max += 1;
    }
    let x = x_min + (x_max - x_min) / 2;

    let mut y_min = cy;
    while lit(x, y_min) {
        y_min -= 1;
    }
    let mut y_max = cy;
    while lit(x, y_max) {
        y_max += 1;
    }
    let y = y_min + (y_max - y_min) / 2;

    ImgXY::new(
        x.clamp(0, target.w as i64 - 1) as usize,
        y.clamp(0, target.h as i64 - 1) as usize,
    )
}
