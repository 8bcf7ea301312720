//! Planar bounding-box overlap between footprints.
//!
//! Boxes are compared in raw (RA, Dec) degrees with no cos(Dec) factor and no
//! wrap handling beyond the corner fold done at ingestion.

use crate::footprint::Footprint;

/// Strict axis-aligned intersection of two footprint boxes.
#[inline]
pub fn overlaps(a: &Footprint, b: &Footprint) -> bool {
    2.0 * (a.ra_center - b.ra_center).abs() < a.ra_size + b.ra_size
        && 2.0 * (a.dec_center - b.dec_center).abs() < a.dec_size + b.dec_size
}

/// Dense symmetric overlap relation, row-major `n × n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapMatrix {
    data: Vec<bool>,
    n: usize,
}

impl OverlapMatrix {
    pub fn build(footprints: &[Footprint]) -> Self {
        let n = footprints.len();
        let mut data = vec![false; n * n];
        for i in 0..n {
            for j in i..n {
                let hit = overlaps(&footprints[i], &footprints[j]);
                data[i * n + j] = hit;
                data[j * n + i] = hit;
            }
        }
        Self { data, n }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> bool {
        self.data[i * self.n + j]
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[bool] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Number of distinct overlapping pairs (diagonal excluded).
    pub fn pair_count(&self) -> usize {
        (0..self.n)
            .map(|i| self.row(i)[i + 1..].iter().filter(|&&hit| hit).count())
            .sum()
    }
}
