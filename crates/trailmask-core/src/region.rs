//! Consolidated mask regions: envelope plus per-edge medians of a member set.

use serde::{Deserialize, Serialize};

use crate::footprint::Footprint;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// Connected component of overlapping normal trails.
    #[default]
    Cluster,
    /// Every edge-bleed of a band merged into one block.
    EdgeBleed,
}

/// One output mask region. The envelope fields bound every member; the
/// `m*` fields hold the median of each edge across members.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedRegion {
    pub count: usize,
    pub ra_min: f64,
    pub ra_max: f64,
    pub dec_min: f64,
    pub dec_max: f64,
    pub mra_min: f64,
    pub mra_max: f64,
    pub mdec_min: f64,
    pub mdec_max: f64,
    #[serde(default)]
    pub kind: RegionKind,
}

impl ConsolidatedRegion {
    /// Build from the `members` indices into `footprints`.
    /// Returns `None` for an empty member list.
    pub fn from_members(footprints: &[Footprint], members: &[usize], kind: RegionKind) -> Option<Self> {
        Self::from_member_iter(members.iter().map(|&i| &footprints[i]), kind)
    }

    /// Build from every footprint in the slice.
    pub fn from_footprints(footprints: &[Footprint], kind: RegionKind) -> Option<Self> {
        Self::from_member_iter(footprints.iter(), kind)
    }

    fn from_member_iter<'a>(members: impl Iterator<Item = &'a Footprint>, kind: RegionKind) -> Option<Self> {
        let mut ra_min = Vec::new();
        let mut ra_max = Vec::new();
        let mut dec_min = Vec::new();
        let mut dec_max = Vec::new();
        for fp in members {
            ra_min.push(fp.ra_min);
            ra_max.push(fp.ra_max);
            dec_min.push(fp.dec_min);
            dec_max.push(fp.dec_max);
        }
        if ra_min.is_empty() {
            return None;
        }

        Some(Self {
            count: ra_min.len(),
            ra_min: ra_min.iter().cloned().fold(f64::INFINITY, f64::min),
            ra_max: ra_max.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            dec_min: dec_min.iter().cloned().fold(f64::INFINITY, f64::min),
            dec_max: dec_max.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            mra_min: median(&mut ra_min)?,
            mra_max: median(&mut ra_max)?,
            mdec_min: median(&mut dec_min)?,
            mdec_max: median(&mut dec_max)?,
            kind,
        })
    }
}

/// Median with the even-length convention of averaging the two central
/// values. Sorts `values` in place; a single value is returned untouched.
pub fn median(values: &mut [f64]) -> Option<f64> {
    match values.len() {
        0 => None,
        1 => Some(values[0]),
        n => {
            values.sort_by(f64::total_cmp);
            if n % 2 == 1 {
                Some(values[n / 2])
            } else {
                Some((values[n / 2 - 1] + values[n / 2]) / 2.0)
            }
        }
    }
}
