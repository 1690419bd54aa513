//! Crate-wide error type.
//!
//! Lookup errors (`OutOfRange`, `OutsideImage`, `NotFound`), `NoData` and
//! `DataShapeMismatch` are recoverable: callers treat them as "no action
//! taken". Everything else aborts the operation that raised it.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load image {path}: {reason}")]
    ImageLoad { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("bit coordinate ({col}, {row}) out of range for a {cols}x{rows} grid")]
    OutOfRange {
        col: usize,
        row: usize,
        cols: usize,
        rows: usize,
    },

    #[error("image coordinate ({x}, {y}) outside the {width}x{height} raster")]
    OutsideImage {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("no grid intersection at image coordinate ({x}, {y})")]
    NotFound { x: usize, y: usize },

    #[error("no bit data; the grid has not been read")]
    NoData,

    #[error("bit data length {found} does not match {expected} grid intersections")]
    DataShapeMismatch { expected: usize, found: usize },

    #[error("unsupported grid document version {major}.{minor}")]
    UnsupportedVersion { major: u32, minor: u32 },

    #[error("invalid grid document: {0}")]
    InvalidDocument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors that leave the session untouched and can be reported
    /// as "no action taken".
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::OutOfRange { .. }
                | Error::OutsideImage { .. }
                | Error::NotFound { .. }
                | Error::NoData
                | Error::DataShapeMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn lookup_errors_are_recoverable() {
        assert!(Error::NotFound { x: 1, y: 2 }.is_recoverable());
        assert!(Error::DataShapeMismatch {
            expected: 4,
            found: 3
        }
        .is_recoverable());
        assert!(!Error::Config("group_cols".into()).is_recoverable());
    }

    #[test]
    fn messages_name_the_coordinates() {
        let err = Error::OutOfRange {
            col: 9,
            row: 0,
            cols: 8,
            rows: 4,
        };
        assert_eq!(
            err.to_string(),
            "bit coordinate (9, 0) out of range for a 8x4 grid"
        );
    }
}
