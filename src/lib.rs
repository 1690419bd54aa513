#![doc = include_str!("../README.md")]

// Core engine
pub mod bits;
pub mod classify;
pub mod grid;
pub mod packing;
pub mod persist;
pub mod raster;
pub mod session;

// Supporting modules
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod types;

// --- High-level re-exports -------------------------------------------------

pub use crate::bits::BitMatrix;
pub use crate::config::{DecodeConfig, GroupLayout};
pub use crate::error::{Error, Result};
pub use crate::grid::{ClickOutcome, GridLines};
pub use crate::persist::{GridDocument, SaveTarget};
pub use crate::raster::RasterBuffers;
pub use crate::session::{Command, Session, StatusReport};
pub use crate::types::{Axis, BitXY, ImgXY};

pub use crate::diagnostics::ReadReport;

// --- Prelude ---------------------------------------------------------------

/// Everything needed to drive a session.
pub mod prelude {
    pub use crate::{
        Axis, BitMatrix, BitXY, ClickOutcome, Command, DecodeConfig, GridDocument, GridLines,
        GroupLayout, ImgXY, RasterBuffers, Session,
    };
}
