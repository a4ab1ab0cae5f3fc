/// Result alias used across the crate.
pub type TileReelResult<T> = Result<T, TileReelError>;

/// Error taxonomy for display management, frame production and delivery.
#[derive(thiserror::Error, Debug)]
pub enum TileReelError {
    /// Invalid or conflicting setup: duplicate/missing display ids, bad tile grids, unusable
    /// frame directories, invalid config values.
    #[error("configuration error: {0}")]
    Config(String),

    /// A pixel buffer handed to a display does not cover its canvas exactly.
    #[error("frame size mismatch: expected {expected} pixels, got {actual}")]
    SizeMismatch {
        /// Pixel count of the display canvas.
        expected: usize,
        /// Length of the rejected buffer.
        actual: usize,
    },

    /// A single frame file could not be decoded or scaled.
    #[error("decode error: {0}")]
    Decode(String),

    /// A viewer sink refused a tile batch.
    #[error("delivery error: {0}")]
    Delivery(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TileReelError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    pub fn size_mismatch(expected: usize, actual: usize) -> Self {
        Self::SizeMismatch { expected, actual }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
