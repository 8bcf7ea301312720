//! Tile driver: classify every band, cluster its normal trails, fold in the
//! edge-bleeds and report per-band diagnostics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classify::{classify_tile, BandCounts, BandSet};
use crate::cluster::{group, GrowthCeiling};
use crate::error::{ConsolidateError, Result};
use crate::footprint::{Footprint, FootprintRecord};
use crate::input::TileFootprints;
use crate::overlap::OverlapMatrix;
use crate::params::ConsolidationParams;
use crate::region::{ConsolidatedRegion, RegionKind};

// ── Result types ──────────────────────────────────────────────────────────────

/// What happened to a band's edge-bleeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeBleedOutcome {
    /// The band had no edge-bleeds.
    #[default]
    Absent,
    /// Merged into one trailing region.
    Merged,
    /// Present but left out because edge-bleed handling was disabled.
    Skipped,
}

/// Per-band diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandSummary {
    pub band: String,
    pub counts: BandCounts,
    /// Cluster regions emitted (edge-bleed region not included).
    pub discrete: usize,
    /// Clusters dropped for having fewer than `min_frame` members.
    pub rejects: usize,
    /// Single-member clusters, emitted or not.
    pub orphans: usize,
    pub edge_bleed: EdgeBleedOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandResult {
    pub band: String,
    pub regions: Vec<ConsolidatedRegion>,
    pub summary: BandSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileConsolidation {
    pub tile: String,
    /// Bands in first-seen input order.
    pub bands: Vec<BandResult>,
}

impl TileConsolidation {
    /// Regions for `band`; empty when the band produced nothing.
    pub fn regions_for(&self, band: &str) -> &[ConsolidatedRegion] {
        self.bands
            .iter()
            .find(|b| b.band == band)
            .map(|b| b.regions.as_slice())
            .unwrap_or(&[])
    }

    pub fn summaries(&self) -> impl Iterator<Item = &BandSummary> {
        self.bands.iter().map(|b| &b.summary)
    }

    pub fn into_band_map(self) -> BTreeMap<String, Vec<ConsolidatedRegion>> {
        self.bands.into_iter().map(|b| (b.band, b.regions)).collect()
    }
}

/// Outcome of clustering one band's normal trails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterOutcome {
    pub regions: Vec<ConsolidatedRegion>,
    pub rejects: usize,
    pub orphans: usize,
}

// ── Stages ────────────────────────────────────────────────────────────────────

/// Cluster normal trails and turn each surviving component into a region,
/// in seed order.
pub fn consolidate_normal(
    footprints: &[Footprint],
    params: &ConsolidationParams,
) -> std::result::Result<ClusterOutcome, GrowthCeiling> {
    let matrix = OverlapMatrix::build(footprints);
    tracing::debug!(
        "overlap matrix: {} trails, {} overlapping pairs",
        matrix.len(),
        matrix.pair_count()
    );

    let clusters = group(&matrix, params.strategy, params.max_passes)?;

    let mut outcome = ClusterOutcome::default();
    for members in &clusters {
        if members.len() < 2 {
            outcome.orphans += 1;
        }
        if members.len() < params.min_frame {
            outcome.rejects += 1;
            continue;
        }
        if let Some(region) = ConsolidatedRegion::from_members(footprints, members, RegionKind::Cluster) {
            outcome.regions.push(region);
        }
    }
    Ok(outcome)
}

/// Merge every edge-bleed into one region, without any overlap test.
pub fn aggregate_edge_bleeds(edge_bleeds: &[Footprint]) -> Option<ConsolidatedRegion> {
    ConsolidatedRegion::from_footprints(edge_bleeds, RegionKind::EdgeBleed)
}

// ── Driver ────────────────────────────────────────────────────────────────────

pub struct Consolidator {
    params: ConsolidationParams,
}

impl Consolidator {
    pub fn new(params: ConsolidationParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Consolidate `tile` out of a multi-tile input.
    pub fn consolidate(&self, input: &TileFootprints, tile: &str) -> Result<TileConsolidation> {
        let records = input
            .get(tile)
            .ok_or_else(|| ConsolidateError::UnknownTile(tile.to_owned()))?;
        self.consolidate_tile(tile, records)
    }

    /// Run classification and clustering for every band of one tile.
    ///
    /// With the `threading` feature, bands run in parallel; output order is
    /// the same either way.
    pub fn consolidate_tile(&self, tile: &str, records: &[FootprintRecord]) -> Result<TileConsolidation> {
        tracing::debug!("working in tile {tile}: {} input trails", records.len());
        let sets = classify_tile(tile, records, &self.params)?;

        #[cfg(feature = "threading")]
        let results: Vec<Result<BandResult>> = {
            use rayon::prelude::*;
            sets.par_iter().map(|set| self.consolidate_band(tile, set)).collect()
        };
        #[cfg(not(feature = "threading"))]
        let results: Vec<Result<BandResult>> =
            sets.iter().map(|set| self.consolidate_band(tile, set)).collect();

        let bands = results.into_iter().collect::<Result<Vec<_>>>()?;
        Ok(TileConsolidation { tile: tile.to_owned(), bands })
    }

    /// Consolidate one classified band.
    pub fn consolidate_band(&self, tile: &str, set: &BandSet) -> Result<BandResult> {
        let outcome = consolidate_normal(&set.normal, &self.params).map_err(|c| {
            tracing::error!(
                "{tile} {}-band: cluster from seed {} did not settle within {} passes",
                set.band,
                c.seed,
                c.limit
            );
            ConsolidateError::PassCeilingExceeded { band: set.band.clone(), seed: c.seed, limit: c.limit }
        })?;

        let mut summary = BandSummary {
            band: set.band.clone(),
            counts: set.counts(),
            discrete: outcome.regions.len(),
            rejects: outcome.rejects,
            orphans: outcome.orphans,
            edge_bleed: EdgeBleedOutcome::Absent,
        };
        let mut regions = outcome.regions;

        tracing::info!(
            "{tile} {}-band integrated: {} discrete trails, {} rejects (min_frame<{}), {} orphans",
            set.band,
            summary.discrete,
            summary.rejects,
            self.params.min_frame,
            summary.orphans,
        );

        if !set.edge_bleed.is_empty() {
            if self.params.skip_edge_bleed {
                summary.edge_bleed = EdgeBleedOutcome::Skipped;
                tracing::info!(
                    "{tile} {}-band: skipping {} edge-bleeds",
                    set.band,
                    set.edge_bleed.len()
                );
            } else if let Some(region) = aggregate_edge_bleeds(&set.edge_bleed) {
                summary.edge_bleed = EdgeBleedOutcome::Merged;
                tracing::info!(
                    "{tile} {}-band: {} edge-bleeds consolidated as one",
                    set.band,
                    region.count
                );
                regions.push(region);
            }
        }

        Ok(BandResult { band: set.band.clone(), regions, summary })
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::GroupingStrategy;

    fn boxed(ra: f64, dec: f64, ra_size: f64, dec_size: f64) -> Footprint {
        Footprint::from_center_size(ra, dec, ra_size, dec_size)
    }

    fn record(band: &str, fp: Footprint) -> FootprintRecord {
        FootprintRecord::new(
            Some(band),
            [fp.ra_min, fp.ra_max, fp.ra_max, fp.ra_min],
            [fp.dec_min, fp.dec_min, fp.dec_max, fp.dec_max],
        )
    }

    fn params(min_frame: usize) -> ConsolidationParams {
        ConsolidationParams { min_frame, ..Default::default() }
    }

    #[test]
    fn two_identical_boxes_merge() {
        let fps = vec![boxed(10.0, -20.0, 0.01, 0.01), boxed(10.0, -20.0, 0.01, 0.01)];
        let out = consolidate_normal(&fps, &params(0)).unwrap();
        assert_eq!(out.regions.len(), 1);
        assert_eq!(out.regions[0].count, 2);
        assert_eq!(out.orphans, 0);
    }

    #[test]
    fn disjoint_boxes_respect_min_frame() {
        let fps = vec![boxed(10.0, -20.0, 0.01, 0.01), boxed(11.0, -20.0, 0.01, 0.01)];

        let keep = consolidate_normal(&fps, &params(1)).unwrap();
        assert_eq!(keep.regions.len(), 2);
        assert!(keep.regions.iter().all(|r| r.count == 1));
        assert_eq!(keep.orphans, 2);
        assert_eq!(keep.rejects, 0);

        let drop = consolidate_normal(&fps, &params(2)).unwrap();
        assert!(drop.regions.is_empty());
        assert_eq!(drop.rejects, 2);
        assert_eq!(drop.orphans, 2);
    }

    #[test]
    fn min_frame_zero_keeps_singletons() {
        let fps = vec![boxed(10.0, -20.0, 0.01, 0.01)];
        let out = consolidate_normal(&fps, &params(0)).unwrap();
        assert_eq!(out.regions.len(), 1);
    }

    #[test]
    fn regions_follow_seed_order() {
        let fps = vec![
            boxed(12.0, -20.0, 0.01, 0.01),
            boxed(10.0, -20.0, 0.01, 0.01),
            boxed(10.004, -20.0, 0.01, 0.01),
        ];
        let out = consolidate_normal(&fps, &params(0)).unwrap();
        assert_eq!(out.regions.len(), 2);
        assert_eq!(out.regions[0].count, 1);
        assert!((out.regions[0].ra_min - 11.995).abs() < 1e-9);
        assert_eq!(out.regions[1].count, 2);
    }

    #[test]
    fn edge_bleeds_merge_regardless_of_geometry() {
        let edges = vec![boxed(10.0, -20.0, 0.01, 0.1), boxed(40.0, 5.0, 0.02, 0.2)];
        let r = aggregate_edge_bleeds(&edges).unwrap();
        assert_eq!(r.count, 2);
        assert_eq!(r.kind, RegionKind::EdgeBleed);
        assert!((r.ra_min - 9.995).abs() < 1e-9);
        assert!((r.ra_max - 40.01).abs() < 1e-9);
        assert!((r.dec_max - 5.1).abs() < 1e-9);
        assert!(aggregate_edge_bleeds(&[]).is_none());
    }

    #[test]
    fn edge_bleed_region_trails_cluster_regions() {
        let records = vec![
            record("z", boxed(10.0, -20.0, 0.01, 0.01)),
            record("z", boxed(10.0, -20.0, 0.01, 0.3)),
            record("z", boxed(10.002, -20.0, 0.01, 0.01)),
        ];
        let c = Consolidator::new(params(0)).unwrap();
        let tile = c.consolidate_tile("T", &records).unwrap();
        let regions = tile.regions_for("z");
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].kind, RegionKind::Cluster);
        assert_eq!(regions[0].count, 2);
        assert_eq!(regions[1].kind, RegionKind::EdgeBleed);
        assert_eq!(regions[1].count, 1);
        assert_eq!(tile.bands[0].summary.edge_bleed, EdgeBleedOutcome::Merged);
    }

    #[test]
    fn skipped_edge_bleeds_are_noted() {
        let records = vec![
            record("z", boxed(10.0, -20.0, 0.01, 0.3)),
            record("z", boxed(10.0, -20.0, 0.01, 0.01)),
        ];
        let c = Consolidator::new(ConsolidationParams { skip_edge_bleed: true, ..Default::default() }).unwrap();
        let tile = c.consolidate_tile("T", &records).unwrap();
        assert_eq!(tile.regions_for("z").len(), 1);
        assert!(tile.regions_for("z").iter().all(|r| r.kind == RegionKind::Cluster));
        assert_eq!(tile.bands[0].summary.edge_bleed, EdgeBleedOutcome::Skipped);
    }

    #[test]
    fn unknown_tile_is_reported() {
        let c = Consolidator::new(ConsolidationParams::default()).unwrap();
        let err = c.consolidate(&TileFootprints::new(), "DES9999+9999").unwrap_err();
        assert!(matches!(err, ConsolidateError::UnknownTile(t) if t == "DES9999+9999"));
    }

    #[test]
    fn pass_ceiling_names_the_band() {
        let records: Vec<FootprintRecord> = (0..6)
            .rev()
            .map(|i| record("r", boxed(10.0 + 0.008 * i as f64, -20.0, 0.01, 0.01)))
            .collect();
        let c = Consolidator::new(ConsolidationParams { max_passes: Some(1), ..Default::default() }).unwrap();
        match c.consolidate_tile("T", &records) {
            Err(ConsolidateError::PassCeilingExceeded { band, limit, .. }) => {
                assert_eq!(band, "r");
                assert_eq!(limit, 1);
            }
            other => panic!("expected PassCeilingExceeded, got {other:?}"),
        }
    }

    #[test]
    fn rerun_is_bit_identical() {
        let records: Vec<FootprintRecord> = (0..40)
            .map(|i| {
                let t = i as f64;
                record(if i % 3 == 0 { "g" } else { "i" }, boxed(20.0 + 0.003 * t, -30.0 + 0.002 * (t % 7.0), 0.005, 0.004))
            })
            .collect();
        for strategy in [GroupingStrategy::FixedPoint, GroupingStrategy::UnionFind] {
            let c = Consolidator::new(ConsolidationParams { strategy, ..Default::default() }).unwrap();
            let a = c.consolidate_tile("T", &records).unwrap();
            let b = c.consolidate_tile("T", &records).unwrap();
            assert_eq!(a, b);
        }
    }
}
