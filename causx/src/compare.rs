// CausX - Rust library for representing and reasoning about mixed
//         causal graphs (DAGs, CPDAGs and PAGs)
// Copyright (C) 2021 - Aleks Kissinger
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Edge-type agreement counting between two graphs over the same
//! variables, used by comparison tooling.
//!
//! The node-pair list is partitioned into contiguous chunks; each chunk
//! accumulates a private count matrix and the partials are merged by
//! summation, which is associative, so the reduction is order-independent
//! and lock-free.

use itertools::Itertools;
use ndarray::Array2;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::graph::{EdgeTypeCode, GraphLike};

const CHUNK: usize = 256;

/// Count matrix of edge-type codes: entry (i, j) is the number of node
/// pairs classified as code i in `truth` and code j in `est`.
///
/// Pairs are matched by node name; a name missing from one graph counts as
/// no edge there. The pair list is the union of adjacent pairs of both
/// graphs, so the Nil/Nil entry is always zero. Pairs carrying a
/// non-canonical mark combination in either graph are skipped.
pub fn edge_misclassification_counts<G1: GraphLike, G2: GraphLike>(
    truth: &G1,
    est: &G2,
) -> Array2<u64> {
    let mut pairs: FxHashSet<(String, String)> = FxHashSet::default();
    for (s, t, _) in truth.edges() {
        pairs.insert(name_pair(truth.node_name(s), truth.node_name(t)));
    }
    for (s, t, _) in est.edges() {
        pairs.insert(name_pair(est.node_name(s), est.node_name(t)));
    }
    let pairs: Vec<(String, String)> = pairs.into_iter().sorted().collect();

    pairs
        .par_chunks(CHUNK)
        .map(|chunk| {
            let mut m = Array2::<u64>::zeros((EdgeTypeCode::COUNT, EdgeTypeCode::COUNT));
            for (a, b) in chunk {
                let Some(tc) = code_between(truth, a, b) else {
                    log::debug!("skipping pair ({a}, {b}): no canonical code in truth");
                    continue;
                };
                let Some(ec) = code_between(est, a, b) else {
                    log::debug!("skipping pair ({a}, {b}): no canonical code in estimate");
                    continue;
                };
                m[[tc.index(), ec.index()]] += 1;
            }
            m
        })
        .reduce(
            || Array2::zeros((EdgeTypeCode::COUNT, EdgeTypeCode::COUNT)),
            |a, b| a + b,
        )
}

/// Number of node pairs on which the two graphs disagree.
pub fn num_misclassified<G1: GraphLike, G2: GraphLike>(truth: &G1, est: &G2) -> u64 {
    let m = edge_misclassification_counts(truth, est);
    let total: u64 = m.iter().sum();
    let agree: u64 = (0..EdgeTypeCode::COUNT).map(|i| m[[i, i]]).sum();
    total - agree
}

fn name_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_owned(), b.to_owned())
    } else {
        (b.to_owned(), a.to_owned())
    }
}

fn code_between<G: GraphLike>(g: &G, a: &str, b: &str) -> Option<EdgeTypeCode> {
    let ends = match (g.node_by_name(a), g.node_by_name(b)) {
        (Some(va), Some(vb)) => g.edge_ends_opt(va, vb),
        _ => None,
    };
    EdgeTypeCode::of(ends)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphLike;
    use crate::hash_graph::Graph;

    fn three_node(edges: &[(&str, &str)]) -> Graph {
        let mut g = Graph::new();
        for n in ["A", "B", "C"] {
            g.add_node(n);
        }
        for &(s, t) in edges {
            let s = g.node_by_name(s).unwrap();
            let t = g.node_by_name(t).unwrap();
            g.add_edge(s, t);
        }
        g
    }

    #[test]
    fn identical_graphs_agree_everywhere() {
        let g = three_node(&[("A", "B"), ("B", "C")]);
        let m = edge_misclassification_counts(&g, &g);
        let total: u64 = m.iter().sum();
        assert_eq!(total, 2);
        assert_eq!(num_misclassified(&g, &g), 0);
    }

    #[test]
    fn flipped_edge_is_counted() {
        let truth = three_node(&[("A", "B")]);
        let est = three_node(&[("B", "A")]);
        let m = edge_misclassification_counts(&truth, &est);
        // (A, B) is A --> B in truth (ta) and A <-- B in the estimate (at)
        assert_eq!(m[[EdgeTypeCode::Ta.index(), EdgeTypeCode::At.index()]], 1);
        assert_eq!(num_misclassified(&truth, &est), 1);
    }

    #[test]
    fn missing_and_extra_edges() {
        let truth = three_node(&[("A", "B"), ("B", "C")]);
        let est = three_node(&[("A", "B")]);
        let m = edge_misclassification_counts(&truth, &est);
        assert_eq!(m[[EdgeTypeCode::Ta.index(), EdgeTypeCode::Ta.index()]], 1);
        assert_eq!(m[[EdgeTypeCode::Ta.index(), EdgeTypeCode::Nil.index()]], 1);
        assert_eq!(num_misclassified(&truth, &est), 1);
    }

    #[test]
    fn mixed_kinds() {
        let mut truth = Graph::new();
        let a = truth.add_node("A");
        let b = truth.add_node("B");
        truth.add_bidirected_edge(a, b).unwrap();

        let mut est = Graph::new();
        let a = est.add_node("A");
        let b = est.add_node("B");
        est.add_nondirected_edge(a, b).unwrap();

        let m = edge_misclassification_counts(&truth, &est);
        assert_eq!(m[[EdgeTypeCode::Aa.index(), EdgeTypeCode::Cc.index()]], 1);
    }
}
