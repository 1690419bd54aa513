//! Discrete editing commands, as a UI dispatch loop would send them.
use super::Session;
use crate::config::DecodeConfig;
use crate::error::Result;
use crate::types::{Axis, ImgXY};
use serde::{Deserialize, Serialize};

/// Display-only switches persisted with the configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayFlag {
    Grid,
    Original,
    BlankImage,
    Peephole,
    Data,
    Binary,
}

impl DisplayFlag {
    pub(crate) fn slot(self, cfg: &mut DecodeConfig) -> &mut bool {
        match self {
            DisplayFlag::Grid => &mut cfg.display_grid,
            DisplayFlag::Original => &mut cfg.display_original,
            DisplayFlag::BlankImage => &mut cfg.display_blank_image,
            DisplayFlag::Peephole => &mut cfg.display_peephole,
            DisplayFlag::Data => &mut cfg.display_data,
            DisplayFlag::Binary => &mut cfg.display_binary,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Grid click; `exact` skips auto-centering.
    AddLine { axis: Axis, at: ImgXY, exact: bool },
    Read,
    ResetRead,
    ToggleAt { at: ImgXY },
    SelectAt { at: ImgXY },
    ClearSelection,
    DeleteColumn,
    DeleteRow,
    InsertColumn { x: usize },
    InsertRow { y: usize },
    ShiftColumn { delta: i64 },
    ShiftColumnGroup { delta: i64 },
    ShiftRow { delta: i64 },
    Radius { delta: i32 },
    BitThreshDiv { delta: i32 },
    PixThresh { delta: i32 },
    Dilate { delta: i32 },
    Erode { delta: i32 },
    ToggleInverted,
    ToggleLsb,
    ToggleDisplay { flag: DisplayFlag },
    Search { bytes: Vec<u8> },
}

impl Session {
    /// Run one command. Recoverable lookup failures come back as errors the
    /// caller reports as "no action taken"; the session is left unchanged.
    pub fn apply(&mut self, command: Command) -> Result<()> {
        match command {
            Command::AddLine { axis, at, exact } => {
                self.add_line(axis, at, !exact)?;
            }
            Command::Read => {
                self.read_data()?;
            }
            Command::ResetRead => self.reset_read(),
            Command::ToggleAt { at } => {
                self.toggle_at(at)?;
            }
            Command::SelectAt { at } => {
                self.select_at(at)?;
            }
            Command::ClearSelection => self.clear_selection(),
            Command::DeleteColumn => {
                self.delete_selected_column()?;
            }
            Command::DeleteRow => {
                self.delete_selected_row()?;
            }
            Command::InsertColumn { x } => {
                self.insert_column(x)?;
            }
            Command::InsertRow { y } => {
                self.insert_row(y)?;
            }
            Command::ShiftColumn { delta } => {
                self.shift_selected(Axis::Column, delta)?;
            }
            Command::ShiftColumnGroup { delta } => {
                self.shift_selected_column_group(delta)?;
            }
            Command::ShiftRow { delta } => {
                self.shift_selected(Axis::Row, delta)?;
            }
            Command::Radius { delta } => {
                self.adjust_radius(delta)?;
            }
            Command::BitThreshDiv { delta } => {
                self.adjust_bit_thresh_div(delta)?;
            }
            Command::PixThresh { delta } => {
                self.adjust_pix_thresh(delta)?;
            }
            Command::Dilate { delta } => {
                self.adjust_dilate(delta)?;
            }
            Command::Erode { delta } => {
                self.adjust_erode(delta)?;
            }
            Command::ToggleInverted => {
                self.toggle_inverted();
            }
            Command::ToggleLsb => {
                self.toggle_lsb();
            }
            Command::ToggleDisplay { flag } => {
                self.toggle_display(flag);
            }
            Command::Search { bytes } => self.set_search(bytes),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupLayout;
    use crate::image::ImageRgb8;
    use crate::raster::RasterBuffers;
    use crate::types::BitXY;

    fn lit_session() -> Session {
        let raster = RasterBuffers::from_image(ImageRgb8::filled(32, 16, [255, 255, 255]));
        let cfg = DecodeConfig::default().with_default_radius(2);
        Session::new(raster, GroupLayout::new(8, 1).expect("layout"), cfg).expect("session")
    }

    #[test]
    fn commands_parse_from_json() {
        let cmds: Vec<Command> = serde_json::from_str(
            r#"[
                {"cmd": "add_line", "axis": "column", "at": {"x": 3, "y": 4}, "exact": true},
                {"cmd": "shift_row", "delta": -1},
                {"cmd": "toggle_display", "flag": "peephole"},
                {"cmd": "read"}
            ]"#,
        )
        .expect("parse");
        assert_eq!(cmds[1], Command::ShiftRow { delta: -1 });
        assert_eq!(
            cmds[2],
            Command::ToggleDisplay {
                flag: DisplayFlag::Peephole
            }
        );
    }

    #[test]
    fn dispatch_drives_the_session() {
        let mut s = lit_session();
        for cmd in [
            Command::InsertColumn { x: 4 },
            Command::InsertColumn { x: 8 },
            Command::InsertRow { y: 4 },
            Command::Read,
            Command::SelectAt { at: ImgXY::new(8, 4) },
            Command::ShiftColumn { delta: 2 },
        ] {
            s.apply(cmd).expect("apply");
        }
        assert_eq!(s.lines().columns(), &[4, 10]);
        assert_eq!(s.selection().col, Some(1));
        assert_eq!(s.bits().map(|b| b.count_ones()), Some(2));

        s.apply(Command::ToggleAt { at: ImgXY::new(4, 4) }).expect("toggle");
        assert_eq!(s.bits().and_then(|b| b.get(BitXY::new(0, 0)).ok()), Some(false));

        s.apply(Command::ResetRead).expect("reset");
        assert!(!s.data_read());
        let err = s
            .apply(Command::ToggleAt { at: ImgXY::new(4, 4) })
            .expect_err("no data");
        assert!(err.is_recoverable());
    }
}
