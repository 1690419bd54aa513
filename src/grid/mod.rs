//! Grid geometry: the column/row line sequences, the mapping between
//! pixel and bit coordinates, and the click-driven grid builder.
//!
//! - [`lines`]: sorted, duplicate-free line positions per axis.
//! - [`coords`]: bit ↔ image coordinate lookups.
//! - [`builder`]: line acquisition protocol and auto-centering.

pub mod builder;
pub mod coords;
pub mod lines;

pub use builder::{auto_center, ClickOutcome, GridBuilder};
pub use coords::Lookup;
pub use lines::GridLines;
