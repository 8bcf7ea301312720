//! Consolidation parameters, loadable from partial JSON.

use serde::{Deserialize, Serialize};

use crate::classify::thin_threshold_deg;
use crate::cluster::GroupingStrategy;
use crate::error::{ConsolidateError, Result};

/// Knobs for one consolidation run.
/// Defaults match the library behaviour of the production mask builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationParams {
    /// Matching radius in arcsec. Accepted for compatibility; has no effect
    /// on the overlap test.
    pub mrad: f64,
    /// Leave edge-bleeds out of the output entirely.
    pub skip_edge_bleed: bool,
    /// Dec extent (pixels) below which a trail is discarded as thin/small.
    pub thin_pix: f64,
    /// Minimum members for a cluster to be emitted; 0 and 1 keep everything.
    pub min_frame: usize,
    pub strategy: GroupingStrategy,
    /// Optional ceiling on fixed-point growth passes per cluster.
    pub max_passes: Option<usize>,
}

impl Default for ConsolidationParams {
    fn default() -> Self {
        Self {
            mrad: 4.0,
            skip_edge_bleed: false,
            thin_pix: 3.3,
            min_frame: 0,
            strategy: GroupingStrategy::FixedPoint,
            max_passes: None,
        }
    }
}

impl ConsolidationParams {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn thin_threshold_deg(&self) -> f64 {
        thin_threshold_deg(self.thin_pix)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.thin_pix.is_finite() || self.thin_pix < 0.0 {
            return Err(ConsolidateError::InvalidParams(format!(
                "thin_pix must be finite and non-negative, got {}",
                self.thin_pix
            )));
        }
        if self.max_passes == Some(0) {
            return Err(ConsolidateError::InvalidParams("max_passes must be at least 1".into()));
        }
        Ok(())
    }
}
