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

//! The separation criterion: d-connection, m-connection over mixed graphs,
//! and the possible-d-connection relaxation used for PAG-level reasoning.
//!
//! The connection search is a BFS over *edge-states*: the frontier holds
//! ordered pairs (a, b) meaning the path has just arrived at `b` coming
//! from `a`. The incoming mark at `b` decides collider status, and a state
//! is keyed on the whole pair, since a vertex may be legally re-entered
//! from a different predecessor under different collider status.

use rustc_hash::FxHashSet;
use std::collections::VecDeque;

use crate::graph::{Endpoint, GraphLike, V};

fn check_query_nodes<G: GraphLike>(g: &G, vs: &[V]) {
    for &v in vs {
        if !g.contains_node(v) {
            panic!("Vertex not found");
        }
    }
}

/// The closure of `zs` under the parent relation, `zs` included: every
/// vertex with a directed path into some member of `zs`.
pub fn ancestors_of<G: GraphLike>(g: &G, zs: &[V]) -> FxHashSet<V> {
    check_query_nodes(g, zs);
    let mut an: FxHashSet<V> = zs.iter().copied().collect();
    let mut stack: Vec<V> = zs.to_vec();
    while let Some(u) = stack.pop() {
        for p in g.parents(u) {
            if an.insert(p) {
                stack.push(p);
            }
        }
    }
    an
}

/// The closure of `zs` under reverse semi-directed reachability: w is a
/// possible ancestor of `zs` if a path w ... z exists that leaves every
/// vertex over a Tail or Circle mark.
pub fn possible_ancestors_of<G: GraphLike>(g: &G, zs: &[V]) -> FxHashSet<V> {
    check_query_nodes(g, zs);
    let mut an: FxHashSet<V> = zs.iter().copied().collect();
    let mut stack: Vec<V> = zs.to_vec();
    while let Some(u) = stack.pop() {
        for w in g.neighbor_vec(u) {
            if !an.contains(&w) && g.traverse_semi_directed(w, u).is_some() {
                an.insert(w);
                stack.push(w);
            }
        }
    }
    an
}

/// True if some member of `xs` is d-connected to some member of `ys` given
/// the conditioning set `zs`.
///
/// Panics if a query vertex is absent or the source and target sets
/// overlap.
pub fn is_d_connected_to<G: GraphLike>(g: &G, xs: &[V], ys: &[V], zs: &[V]) -> bool {
    check_query_nodes(g, xs);
    check_query_nodes(g, ys);
    let yset: FxHashSet<V> = ys.iter().copied().collect();
    if xs.iter().any(|x| yset.contains(x)) {
        panic!("Source and target sets overlap");
    }

    let zset: FxHashSet<V> = zs.iter().copied().collect();
    let an_z = ancestors_of(g, zs);

    let mut visited: FxHashSet<(V, V)> = FxHashSet::default();
    let mut queue: VecDeque<(V, V)> = VecDeque::new();

    for &x in xs {
        for w in g.neighbors(x) {
            if yset.contains(&w) {
                return true;
            }
            if visited.insert((x, w)) {
                queue.push_back((x, w));
            }
        }
    }

    while let Some((a, b)) = queue.pop_front() {
        let into_b = g.endpoint_at(b, a) == Some(Endpoint::Arrow);
        for (c, ends) in g.incident_edges(b) {
            if c == a {
                continue;
            }
            let collider = into_b && ends.s == Endpoint::Arrow;
            let pass = if collider {
                an_z.contains(&b)
            } else {
                !zset.contains(&b)
            };
            if !pass {
                continue;
            }
            if yset.contains(&c) {
                return true;
            }
            if visited.insert((b, c)) {
                queue.push_back((b, c));
            }
        }
    }

    log::debug!(
        "no connecting path: {} edge-states visited",
        visited.len()
    );
    false
}

pub fn is_d_separated_from<G: GraphLike>(g: &G, xs: &[V], ys: &[V], zs: &[V]) -> bool {
    !is_d_connected_to(g, xs, ys, zs)
}

pub fn is_d_connected<G: GraphLike>(g: &G, x: V, y: V, zs: &[V]) -> bool {
    is_d_connected_to(g, &[x], &[y], zs)
}

pub fn is_d_separated<G: GraphLike>(g: &G, x: V, y: V, zs: &[V]) -> bool {
    !is_d_connected(g, x, y, zs)
}

/// The PAG-level relaxation of [`is_d_connected_to`] for graphs with
/// unresolved (Circle) marks.
///
/// A step through b on the subpath a-b-c is legal when b is a definite
/// noncollider outside `zs`, when b is a definite collider that is a
/// possible ancestor of `zs`, or, for triples whose collider status is
/// undetermined, when either of those rules lets it through. The stage
/// number records the BFS round an edge-state was first reached and is
/// used for progress tracking only.
pub fn is_possible_d_connected_to<G: GraphLike>(g: &G, xs: &[V], ys: &[V], zs: &[V]) -> bool {
    check_query_nodes(g, xs);
    check_query_nodes(g, ys);
    let yset: FxHashSet<V> = ys.iter().copied().collect();
    if xs.iter().any(|x| yset.contains(x)) {
        panic!("Source and target sets overlap");
    }

    let zset: FxHashSet<V> = zs.iter().copied().collect();
    let poss_an_z = possible_ancestors_of(g, zs);

    let mut visited: FxHashSet<(V, V)> = FxHashSet::default();
    let mut queue: VecDeque<(V, V, usize)> = VecDeque::new();

    for &x in xs {
        for w in g.neighbors(x) {
            if yset.contains(&w) {
                return true;
            }
            if visited.insert((x, w)) {
                queue.push_back((x, w, 1));
            }
        }
    }

    while let Some((a, b, stage)) = queue.pop_front() {
        for (c, _) in g.incident_edges(b) {
            if c == a {
                continue;
            }
            let pass = if g.is_def_noncollider(a, b, c) {
                !zset.contains(&b)
            } else if g.is_def_collider(a, b, c) {
                poss_an_z.contains(&b)
            } else {
                // an unresolved mark may stand for either role
                !zset.contains(&b) || poss_an_z.contains(&b)
            };
            if !pass {
                continue;
            }
            if yset.contains(&c) {
                log::debug!("possibly connecting path found at stage {stage}");
                return true;
            }
            if visited.insert((b, c)) {
                queue.push_back((b, c, stage + 1));
            }
        }
    }

    false
}

pub fn is_possible_d_separated_from<G: GraphLike>(g: &G, xs: &[V], ys: &[V], zs: &[V]) -> bool {
    !is_possible_d_connected_to(g, xs, ys, zs)
}

/// True if a directed path of length >= 1 runs from `from` to `to`.
pub fn exists_directed_path<G: GraphLike>(g: &G, from: V, to: V) -> bool {
    check_query_nodes(g, &[from, to]);
    let mut visited: FxHashSet<V> = FxHashSet::default();
    let mut stack: Vec<V> = g.children(from);
    while let Some(u) = stack.pop() {
        if u == to {
            return true;
        }
        if visited.insert(u) {
            stack.extend(g.children(u));
        }
    }
    false
}

/// Ancestry is reflexive: a node is its own ancestor.
pub fn is_ancestor_of<G: GraphLike>(g: &G, a: V, b: V) -> bool {
    ancestors_of(g, &[b]).contains(&a)
}

/// True if every edge is of Directed kind and no directed cycle exists.
///
/// Acyclicity is a property of some graph kinds, checked here on top of
/// the store; it is never a store invariant.
pub fn is_dag<G: GraphLike>(g: &G) -> bool {
    use crate::graph::EdgeKind;
    if g.edges().any(|(_, _, e)| e.kind() != Some(EdgeKind::Directed)) {
        return false;
    }
    g.nodes().all(|v| !exists_directed_path(g, v, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_graph::Graph;
    use rstest::rstest;

    /// A --> B --> C
    fn chain() -> (Graph, V, V, V) {
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        g.add_edge(a, b);
        g.add_edge(b, c);
        (g, a, b, c)
    }

    /// A --> B <-- C
    fn collider() -> (Graph, V, V, V) {
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        g.add_edge(a, b);
        g.add_edge(c, b);
        (g, a, b, c)
    }

    #[test]
    fn ancestors() {
        let (g, a, b, c) = chain();
        let an = ancestors_of(&g, &[c]);
        assert_eq!(an, [a, b, c].into_iter().collect());
        assert_eq!(ancestors_of(&g, &[a]), [a].into_iter().collect());
        assert!(is_ancestor_of(&g, a, c));
        assert!(!is_ancestor_of(&g, c, a));
    }

    #[test]
    fn chain_blocked_by_middle() {
        let (g, a, b, c) = chain();
        assert!(is_d_connected(&g, a, c, &[]));
        assert!(is_d_separated(&g, a, c, &[b]));
    }

    #[test]
    fn collider_opened_by_middle() {
        let (g, a, b, c) = collider();
        assert!(is_d_separated(&g, a, c, &[]));
        assert!(is_d_connected(&g, a, c, &[b]));
    }

    #[test]
    fn collider_opened_by_descendant() {
        // A --> B <-- C, B --> D: conditioning on D opens the collider
        let (mut g, a, b, c) = collider();
        let d = g.add_node("D");
        g.add_edge(b, d);
        assert!(is_d_separated(&g, a, c, &[]));
        assert!(is_d_connected(&g, a, c, &[d]));
    }

    #[test]
    fn fork_blocked_by_middle() {
        // A <-- B --> C
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        g.add_edge(b, a);
        g.add_edge(b, c);
        assert!(is_d_connected(&g, a, c, &[]));
        assert!(is_d_separated(&g, a, c, &[b]));
    }

    #[test]
    fn adjacency_ignores_conditioning() {
        let (g, a, b, _) = chain();
        assert!(is_d_connected(&g, a, b, &[]));
        // direct adjacency wins even when the target is conditioned away
        assert!(is_d_connected(&g, a, b, &[b]));
    }

    #[rstest]
    #[case(&[])]
    #[case(&[1])]
    fn symmetry(#[case] z: &[V]) {
        let (g, a, _, c) = chain();
        assert_eq!(is_d_connected(&g, a, c, z), is_d_connected(&g, c, a, z));
        let (g, a, _, c) = collider();
        assert_eq!(is_d_connected(&g, a, c, z), is_d_connected(&g, c, a, z));
    }

    #[test]
    fn reentry_through_different_predecessors() {
        // two paths meet at M: A --> M <-- B with M --> Y, plus A <-- H --> Y.
        // the node-keyed visited-set bug would drop one of the M entries.
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let m = g.add_node("M");
        let y = g.add_node("Y");
        let h = g.add_node("H");
        g.add_edge(a, m);
        g.add_edge(b, m);
        g.add_edge(m, y);
        g.add_edge(h, a);
        g.add_edge(h, y);
        // conditioning on Y opens the collider at M (M in An(Z) via M --> Y)
        assert!(is_d_connected(&g, b, a, &[y]));
        // with nothing conditioned, both routes are blocked at a collider
        assert!(is_d_separated(&g, b, a, &[]));
    }

    #[test]
    #[should_panic(expected = "Source and target sets overlap")]
    fn self_query_panics() {
        let (g, a, _, _) = chain();
        is_d_connected(&g, a, a, &[]);
    }

    #[test]
    #[should_panic(expected = "Vertex not found")]
    fn absent_query_node_panics() {
        let (g, a, _, _) = chain();
        is_d_connected(&g, a, 99, &[]);
    }

    #[test]
    fn possible_ancestors() {
        // A o-> B --> C: A is a possible ancestor of C, C is not one of A
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        g.add_partially_oriented_edge(a, b).unwrap();
        g.add_edge(b, c);
        let an = possible_ancestors_of(&g, &[c]);
        assert_eq!(an, [a, b, c].into_iter().collect());
        assert_eq!(possible_ancestors_of(&g, &[a]), [a].into_iter().collect());
    }

    #[test]
    fn possible_d_connection_relaxes() {
        // A o-o B o-o C: collider status at B is unresolved, so the path
        // counts as possibly connecting whether or not B is conditioned on
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        g.add_nondirected_edge(a, b).unwrap();
        g.add_nondirected_edge(b, c).unwrap();
        assert!(is_possible_d_connected_to(&g, &[a], &[c], &[]));
        assert!(is_possible_d_connected_to(&g, &[a], &[c], &[b]));

        // underlining (a, b, c) resolves B to a noncollider: now Z = {B}
        // blocks
        g.add_underline_triple(a, b, c);
        assert!(is_possible_d_connected_to(&g, &[a], &[c], &[]));
        assert!(!is_possible_d_connected_to(&g, &[a], &[c], &[b]));
    }

    #[test]
    fn possible_d_connection_definite_collider() {
        // A --> B <-- C with unresolved tails: B is a definite collider,
        // passable only when B possibly ancestors Z
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        let d = g.add_node("D");
        g.add_partially_oriented_edge(a, b).unwrap();
        g.add_partially_oriented_edge(c, b).unwrap();
        g.add_partially_oriented_edge(b, d).unwrap();
        assert!(!is_possible_d_connected_to(&g, &[a], &[c], &[]));
        // B o-> D makes B a possible ancestor of D
        assert!(is_possible_d_connected_to(&g, &[a], &[c], &[d]));
    }

    #[test]
    fn possible_d_connection_agrees_on_dags() {
        let (g, a, b, c) = chain();
        assert!(is_possible_d_connected_to(&g, &[a], &[c], &[]));
        assert!(!is_possible_d_connected_to(&g, &[a], &[c], &[b]));
        let (g, a, b, c) = collider();
        assert!(!is_possible_d_connected_to(&g, &[a], &[c], &[]));
        assert!(is_possible_d_connected_to(&g, &[a], &[c], &[b]));
    }

    #[test]
    fn dag_check() {
        let (g, _, _, _) = chain();
        assert!(is_dag(&g));

        let mut g2 = Graph::new();
        let a = g2.add_node("A");
        let b = g2.add_node("B");
        g2.add_bidirected_edge(a, b).unwrap();
        assert!(!is_dag(&g2));

        // directed cycle
        let mut g3 = Graph::new();
        let a = g3.add_node("A");
        let b = g3.add_node("B");
        let c = g3.add_node("C");
        g3.add_edge(a, b);
        g3.add_edge(b, c);
        g3.add_edge(c, a);
        assert!(!is_dag(&g3));
    }

    #[test]
    fn directed_paths() {
        let (g, a, _, c) = chain();
        assert!(exists_directed_path(&g, a, c));
        assert!(!exists_directed_path(&g, c, a));
        assert!(!exists_directed_path(&g, a, a));
    }

    #[test]
    fn separation_on_mixed_graph() {
        // latent-confounding pattern: A <-> B --> C
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        g.add_bidirected_edge(a, b).unwrap();
        g.add_edge(b, c);
        assert!(is_d_connected(&g, a, c, &[]));
        // B is a noncollider on A <-> B --> C, so conditioning blocks
        assert!(is_d_separated(&g, a, c, &[b]));

        // A <-> B <-- C: B is a collider, conditioning connects
        let mut g2 = Graph::new();
        let a = g2.add_node("A");
        let b = g2.add_node("B");
        let c = g2.add_node("C");
        g2.add_bidirected_edge(a, b).unwrap();
        g2.add_edge(c, b);
        assert!(is_d_separated(&g2, a, c, &[]));
        assert!(is_d_connected(&g2, a, c, &[b]));
    }

    #[test]
    fn set_valued_queries() {
        // X1 --> M <-- X2, M --> Y1, Y2 isolated-ish
        let mut g = Graph::new();
        let x1 = g.add_node("X1");
        let x2 = g.add_node("X2");
        let m = g.add_node("M");
        let y1 = g.add_node("Y1");
        let y2 = g.add_node("Y2");
        g.add_edge(x1, m);
        g.add_edge(x2, m);
        g.add_edge(m, y1);
        assert!(is_d_connected_to(&g, &[x1, x2], &[y1, y2], &[]));
        assert!(is_d_separated_from(&g, &[x1, x2], &[y1, y2], &[m]));
        assert!(is_d_separated_from(&g, &[y2], &[x1, x2], &[]));
    }

    #[test]
    fn works_on_matrix_backends() {
        use crate::mat_graph::{ByteMatrixGraph, ShortMatrixGraph};

        let mut g = ShortMatrixGraph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        g.add_edge(a, b);
        g.add_edge(c, b);
        assert!(is_d_separated(&g, a, c, &[]));
        assert!(is_d_connected(&g, a, c, &[b]));

        let mut g = ByteMatrixGraph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        g.add_edge(a, b);
        g.add_edge(b, c);
        assert!(is_d_connected(&g, a, c, &[]));
        assert!(is_d_separated(&g, a, c, &[b]));
    }
}
