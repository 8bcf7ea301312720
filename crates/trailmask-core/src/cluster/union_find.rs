//! Disjoint-set grouping over the overlap matrix.

use super::Cluster;
use crate::overlap::OverlapMatrix;

/// Union-find over `0..n` with path halving and union by rank.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub fn new(n: usize) -> Self {
        Self { parent: (0..n).collect(), rank: vec![0; n] }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Components ordered by smallest member, members ascending.
pub fn union_find_components(matrix: &OverlapMatrix) -> Vec<Cluster> {
    let n = matrix.len();
    let mut set = DisjointSet::new(n);
    for i in 0..n {
        for j in i + 1..n {
            if matrix.get(i, j) {
                set.union(i, j);
            }
        }
    }

    let mut slot_of_root: Vec<Option<usize>> = vec![None; n];
    let mut clusters: Vec<Cluster> = Vec::new();
    for i in 0..n {
        let root = set.find(i);
        match slot_of_root[root] {
            Some(s) => clusters[s].push(i),
            None => {
                slot_of_root[root] = Some(clusters.len());
                clusters.push(vec![i]);
            }
        }
    }
    clusters
}
