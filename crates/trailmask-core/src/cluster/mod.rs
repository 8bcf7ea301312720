//! Connected components of the overlap relation.
//!
//! Two groupers produce the same partition: the fixed-point rescan used by
//! the production mask builder, and a disjoint-set pass. Components come out
//! ordered by their seed, the smallest member index.
pub mod union_find;

use serde::{Deserialize, Serialize};

use crate::overlap::OverlapMatrix;

pub use union_find::{union_find_components, DisjointSet};

/// Member indices of one component, seed first.
pub type Cluster = Vec<usize>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupingStrategy {
    #[default]
    FixedPoint,
    UnionFind,
}

/// A component kept growing past the caller's pass ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthCeiling {
    pub seed: usize,
    pub limit: usize,
}

pub fn group(
    matrix: &OverlapMatrix,
    strategy: GroupingStrategy,
    max_passes: Option<usize>,
) -> Result<Vec<Cluster>, GrowthCeiling> {
    match strategy {
        GroupingStrategy::FixedPoint => fixed_point_components(matrix, max_passes),
        GroupingStrategy::UnionFind => Ok(union_find_components(matrix)),
    }
}

/// Grow each component by rescanning the rows of all current members until
/// a full pass adds nobody.
///
/// Members found during a pass are only scanned on the next pass. Each pass
/// after the first adds at least one member or stops, so a component of `k`
/// members needs at most `k` passes.
pub fn fixed_point_components(
    matrix: &OverlapMatrix,
    max_passes: Option<usize>,
) -> Result<Vec<Cluster>, GrowthCeiling> {
    let n = matrix.len();
    let mut used = vec![false; n];
    let mut clusters = Vec::new();

    for seed in 0..n {
        if used[seed] {
            continue;
        }
        used[seed] = true;
        let mut members = vec![seed];
        absorb_row(matrix, seed, &mut used, &mut members);
        let mut passes = 1usize;

        let mut n_found = 1;
        while members.len() > n_found {
            n_found = members.len();
            for k in 0..n_found {
                absorb_row(matrix, members[k], &mut used, &mut members);
            }
            passes += 1;

            assert!(
                passes <= n,
                "component from seed {seed} needed {passes} passes over {n} footprints"
            );
            if let Some(limit) = max_passes {
                if passes > limit {
                    return Err(GrowthCeiling { seed, limit });
                }
            }
            tracing::trace!("seed {seed}: pass {passes} found a group of {}", members.len());
        }

        tracing::trace!("seed {seed}: finished with {} members after {passes} passes", members.len());
        clusters.push(members);
    }

    Ok(clusters)
}

/// Mark and append every unused footprint overlapping `row`.
fn absorb_row(matrix: &OverlapMatrix, row: usize, used: &mut [bool], members: &mut Cluster) {
    for (j, &hit) in matrix.row(row).iter().enumerate() {
        if hit && !used[j] {
            used[j] = true;
            members.push(j);
        }
    }
}
