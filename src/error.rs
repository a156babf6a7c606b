//! Error types for sketch matching

use thiserror::Error;

/// Result type alias for sketch matching operations
pub type Result<T> = std::result::Result<T, KnnError>;

/// Error types that can occur while matching sketches
#[derive(Error, Debug)]
pub enum KnnError {
    #[error("Allocation failed: could not reserve {requested} slots for {what}")]
    AllocationFailed { what: &'static str, requested: usize },

    #[error("Selector is empty: {operation} requires at least one stored candidate")]
    EmptySelector { operation: &'static str },

    #[error("Key decrease in slot {slot}: insertion requires a key >= {current}, got {requested}")]
    KeyDecrease {
        slot: usize,
        current: f64,
        requested: f64,
    },

    #[error("Selector capacity must be at least 1")]
    ZeroCapacity,

    #[error("Number of neighbours k must be at least 1")]
    InvalidK,

    #[error("k ({k}) exceeds dataset size ({len})")]
    KExceedsDataset { k: usize, len: usize },

    #[error("Dataset must contain at least one sketch")]
    EmptyDataset,

    #[error("Sketch must contain at least one point")]
    NoPoints,

    #[error("Sketch {index} has no points")]
    EmptySketch { index: usize },

    #[error("Invalid point: {reason}")]
    InvalidPoint { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}
