//! Error type shared by every core operation.

use thiserror::Error;

use crate::grid::Position;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed caller input: channel values outside 0..=255, an empty
    /// palette, zero image dimensions, duplicate biome names.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A position outside the `width × height` grid.
    #[error("position ({}, {}) is outside the {width}x{height} grid", .position.column, .position.row)]
    OutOfBounds {
        position: Position,
        width: usize,
        height: usize,
    },

    /// A cancellable computation was abandoned by its caller.
    #[error("computation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
