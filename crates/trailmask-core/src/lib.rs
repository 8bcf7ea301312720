//! Coadd bleed-trail mask consolidation.
//!
//! Single-epoch bleed-trail footprints for a coadd tile are classified per
//! band, overlapping normal trails are grouped into connected components and
//! each component becomes one consolidated mask region. Edge-bleeds are
//! folded into one extra region per band.
pub mod classify;
pub mod cluster;
pub mod consolidate;
pub mod error;
pub mod footprint;
pub mod input;
pub mod overlap;
pub mod params;
pub mod region;

pub use classify::{classify_tile, BandCounts, BandSet, TrailCategory};
pub use cluster::GroupingStrategy;
pub use consolidate::{BandResult, BandSummary, Consolidator, EdgeBleedOutcome, TileConsolidation};
pub use error::{ConsolidateError, Result};
pub use footprint::{normalize_ra, Footprint, FootprintRecord};
pub use input::{read_tile_footprints, TileFootprints};
pub use params::ConsolidationParams;
pub use region::{ConsolidatedRegion, RegionKind};
