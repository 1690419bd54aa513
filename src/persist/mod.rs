//! Grid document codec and the save-slot discipline around it.
//!
//! - [`document`]: versioned JSON grid document.
//! - [`save`]: numbered save slots with "latest" alias links.

pub mod document;
pub mod save;

pub use document::{DecodedGrid, FormatVersion, GridDocument, CURRENT_VERSION};
pub use save::{link_alias, SaveTarget, SavedFiles};
