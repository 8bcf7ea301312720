//! Per-band trail classification by declination extent.
//!
//! Every footprint of a band lands in exactly one category:
//! edge-bleeds (amplifier-scale blocks), thin/small trails (hot pixels and bad
//! columns that the coadd rejects anyway) and normal trails that go on to
//! clustering.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConsolidateError, Result};
use crate::footprint::{Footprint, FootprintRecord};
use crate::params::ConsolidationParams;

/// Dec extent (degrees) above which a trail is treated as an edge-bleed.
pub const EDGE_BLEED_MIN_DEC_DEG: f64 = 0.05;

/// Detector plate scale in arcsec/pixel.
pub const PLATE_SCALE_ARCSEC: f64 = 0.263;

/// Near-infrared and Y-band labels that this consolidation does not handle.
pub const EXCLUDED_BANDS: [&str; 5] = ["Y", "VY", "J", "H", "Ks"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailCategory {
    EdgeBleed,
    ThinSmall,
    Normal,
}

/// Thin-trail cutoff converted from detector pixels to degrees.
pub fn thin_threshold_deg(thin_pix: f64) -> f64 {
    thin_pix * PLATE_SCALE_ARCSEC / 3600.0
}

pub fn is_excluded_band(band: &str) -> bool {
    EXCLUDED_BANDS.contains(&band)
}

/// Rules are checked in order: edge-bleed, then thin, then normal.
pub fn classify(footprint: &Footprint, thin_deg: f64) -> TrailCategory {
    if footprint.dec_size > EDGE_BLEED_MIN_DEC_DEG {
        TrailCategory::EdgeBleed
    } else if footprint.dec_size < thin_deg {
        TrailCategory::ThinSmall
    } else {
        TrailCategory::Normal
    }
}

/// Category sizes for one band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandCounts {
    pub normal: usize,
    pub thin_small: usize,
    pub edge_bleed: usize,
}

impl BandCounts {
    pub fn total(&self) -> usize {
        self.normal + self.thin_small + self.edge_bleed
    }
}

/// Classified working set of one band, in input order within each category.
#[derive(Debug, Clone, PartialEq)]
pub struct BandSet {
    pub band: String,
    pub normal: Vec<Footprint>,
    pub thin_small: Vec<Footprint>,
    pub edge_bleed: Vec<Footprint>,
}

impl BandSet {
    pub fn new(band: impl Into<String>) -> Self {
        Self {
            band: band.into(),
            normal: Vec::new(),
            thin_small: Vec::new(),
            edge_bleed: Vec::new(),
        }
    }

    pub fn push(&mut self, category: TrailCategory, footprint: Footprint) {
        match category {
            TrailCategory::EdgeBleed => self.edge_bleed.push(footprint),
            TrailCategory::ThinSmall => self.thin_small.push(footprint),
            TrailCategory::Normal => self.normal.push(footprint),
        }
    }

    pub fn counts(&self) -> BandCounts {
        BandCounts {
            normal: self.normal.len(),
            thin_small: self.thin_small.len(),
            edge_bleed: self.edge_bleed.len(),
        }
    }
}

/// Split a tile's records by band and classify each footprint.
///
/// Bands come back in the order they first appear in `records`. Excluded
/// bands are dropped before any footprint is derived.
pub fn classify_tile(tile: &str, records: &[FootprintRecord], params: &ConsolidationParams) -> Result<Vec<BandSet>> {
    let thin_deg = params.thin_threshold_deg();
    let mut sets: Vec<BandSet> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    let mut n_excluded = 0usize;

    for (index, record) in records.iter().enumerate() {
        let band = record.band_label();
        if is_excluded_band(band) {
            n_excluded += 1;
            continue;
        }
        if !record.has_finite_corners() {
            return Err(ConsolidateError::NonFiniteCorner { tile: tile.to_owned(), index });
        }

        let footprint = Footprint::from_record(record);
        let category = classify(&footprint, thin_deg);
        if category == TrailCategory::ThinSmall {
            tracing::trace!(
                "ThinSmall {:11.7} {:11.7} {:9.6} {:9.6} expnum={:?} ccdnum={:?} ({:?})",
                footprint.ra_center,
                footprint.dec_center,
                footprint.ra_size,
                footprint.dec_size,
                record.expnum,
                record.ccdnum,
                record.filename,
            );
        }

        let i = *slot.entry(band).or_insert_with(|| {
            sets.push(BandSet::new(band));
            sets.len() - 1
        });
        sets[i].push(category, footprint);
    }

    if n_excluded > 0 {
        tracing::debug!("{tile}: dropped {n_excluded} trails from excluded bands {EXCLUDED_BANDS:?}");
    }
    for set in &sets {
        let c = set.counts();
        tracing::info!(
            "{tile} {}-band trails subdivided: {} normal, {} thin-small, and {} probable edge-bleeds",
            set.band,
            c.normal,
            c.thin_small,
            c.edge_bleed,
        );
    }

    Ok(sets)
}
