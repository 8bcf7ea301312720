//! Error type shared by the classification and consolidation stages.

use thiserror::Error;

/// Errors surfaced by the consolidation pipeline.
#[derive(Debug, Error)]
pub enum ConsolidateError {
    #[error("tile '{0}' is not present in the footprint input")]
    UnknownTile(String),

    #[error("non-finite corner coordinate in tile '{tile}', record {index}")]
    NonFiniteCorner { tile: String, index: usize },

    #[error("invalid consolidation parameters: {0}")]
    InvalidParams(String),

    #[error("cluster growth in {band}-band from seed {seed} exceeded the {limit}-pass ceiling")]
    PassCeilingExceeded {
        band: String,
        seed: usize,
        limit: usize,
    },

    #[error("malformed footprint JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConsolidateError>;
