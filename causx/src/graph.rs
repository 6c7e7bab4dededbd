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

use derive_more::Display;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use serde_json::Value as AttrValue;
use std::fmt;

use crate::triples::TripleStore;

pub type V = usize;

/// The type of a node in a causal graph.
///
/// The serialized names may differ.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum NodeType {
    #[default]
    #[serde(rename = "measured")]
    Measured,
    #[serde(rename = "latent")]
    Latent,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "selection")]
    Selection,
}

/// The data carried by a node: a display name, unique within a graph, and a
/// node type.
///
/// The name is *not* the node's identity. Vertex handles (`V`) stay valid
/// across renames; renaming goes through [`GraphLike::rename_node`] so the
/// graph's name index is updated in the same step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VData {
    pub name: String,
    pub ty: NodeType,
}

impl VData {
    pub fn new(name: impl Into<String>, ty: NodeType) -> VData {
        VData {
            name: name.into(),
            ty,
        }
    }
}

/// The mark at one end of an edge.
///
/// An absent edge is represented by `Option` in queries (and by a zero cell
/// in the matrix backends), not by an endpoint variant.
#[derive(
    Display, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Endpoint {
    #[serde(rename = "tail")]
    #[display("-")]
    Tail,
    #[serde(rename = "arrow")]
    #[display(">")]
    Arrow,
    #[serde(rename = "circle")]
    #[display("o")]
    Circle,
}

/// The kind of an edge, derived from its endpoint pair. Never stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Directed,
    Undirected,
    Bidirected,
    PartiallyOriented,
    Nondirected,
}

/// The endpoint pair of a single edge, ordered to match an `(s, t)` vertex
/// pair: `s` is the mark proximal to the first vertex, `t` the mark proximal
/// to the second.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeEnds {
    pub s: Endpoint,
    pub t: Endpoint,
}

impl EdgeEnds {
    pub fn new(s: Endpoint, t: Endpoint) -> EdgeEnds {
        EdgeEnds { s, t }
    }

    /// `s --> t`
    pub fn directed() -> EdgeEnds {
        EdgeEnds::new(Endpoint::Tail, Endpoint::Arrow)
    }

    /// `s --- t`
    pub fn undirected() -> EdgeEnds {
        EdgeEnds::new(Endpoint::Tail, Endpoint::Tail)
    }

    /// `s <-> t`
    pub fn bidirected() -> EdgeEnds {
        EdgeEnds::new(Endpoint::Arrow, Endpoint::Arrow)
    }

    /// `s o-> t`
    pub fn partially_oriented() -> EdgeEnds {
        EdgeEnds::new(Endpoint::Circle, Endpoint::Arrow)
    }

    /// `s o-o t`
    pub fn nondirected() -> EdgeEnds {
        EdgeEnds::new(Endpoint::Circle, Endpoint::Circle)
    }

    /// The same edge seen from the other side.
    pub fn reversed(self) -> EdgeEnds {
        EdgeEnds::new(self.t, self.s)
    }

    /// Derive the edge kind from the endpoint pair.
    ///
    /// A `Tail`/`Circle` pairing has no canonical kind and yields `None`.
    pub fn kind(self) -> Option<EdgeKind> {
        use Endpoint::*;
        match (self.s, self.t) {
            (Tail, Arrow) | (Arrow, Tail) => Some(EdgeKind::Directed),
            (Tail, Tail) => Some(EdgeKind::Undirected),
            (Arrow, Arrow) => Some(EdgeKind::Bidirected),
            (Circle, Arrow) | (Arrow, Circle) => Some(EdgeKind::PartiallyOriented),
            (Circle, Circle) => Some(EdgeKind::Nondirected),
            (Tail, Circle) | (Circle, Tail) => None,
        }
    }
}

impl fmt::Display for EdgeEnds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let left = match self.s {
            Endpoint::Tail => '-',
            Endpoint::Arrow => '<',
            Endpoint::Circle => 'o',
        };
        write!(f, "{}-{}", left, self.t)
    }
}

/// The eight canonical edge-type codes used by bootstrap support records and
/// the misclassification counter. Codes are relative to an ordered vertex
/// pair `(a, b)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeTypeCode {
    /// No edge.
    #[serde(rename = "nil")]
    Nil,
    /// `a --> b`
    #[serde(rename = "ta")]
    Ta,
    /// `a <-- b`
    #[serde(rename = "at")]
    At,
    /// `a o-> b`
    #[serde(rename = "ca")]
    Ca,
    /// `a <-o b`
    #[serde(rename = "ac")]
    Ac,
    /// `a o-o b`
    #[serde(rename = "cc")]
    Cc,
    /// `a <-> b`
    #[serde(rename = "aa")]
    Aa,
    /// `a --- b`
    #[serde(rename = "tt")]
    Tt,
}

impl EdgeTypeCode {
    pub const COUNT: usize = 8;

    pub fn index(self) -> usize {
        match self {
            EdgeTypeCode::Nil => 0,
            EdgeTypeCode::Ta => 1,
            EdgeTypeCode::At => 2,
            EdgeTypeCode::Ca => 3,
            EdgeTypeCode::Ac => 4,
            EdgeTypeCode::Cc => 5,
            EdgeTypeCode::Aa => 6,
            EdgeTypeCode::Tt => 7,
        }
    }

    /// Classify the endpoint pair of an edge over an ordered vertex pair.
    ///
    /// `None` input (no edge) classifies as `Nil`; a `Tail`/`Circle` pairing
    /// has no code.
    pub fn of(ends: Option<EdgeEnds>) -> Option<EdgeTypeCode> {
        use Endpoint::*;
        let Some(e) = ends else {
            return Some(EdgeTypeCode::Nil);
        };
        match (e.s, e.t) {
            (Tail, Arrow) => Some(EdgeTypeCode::Ta),
            (Arrow, Tail) => Some(EdgeTypeCode::At),
            (Circle, Arrow) => Some(EdgeTypeCode::Ca),
            (Arrow, Circle) => Some(EdgeTypeCode::Ac),
            (Circle, Circle) => Some(EdgeTypeCode::Cc),
            (Arrow, Arrow) => Some(EdgeTypeCode::Aa),
            (Tail, Tail) => Some(EdgeTypeCode::Tt),
            (Tail, Circle) | (Circle, Tail) => None,
        }
    }
}

/// Structural edge properties used for PAG edge colouring.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeProperty {
    /// Definitely direct.
    #[serde(rename = "dd")]
    Dd,
    /// No latent confounder.
    #[serde(rename = "nl")]
    Nl,
    /// Possibly direct.
    #[serde(rename = "pd")]
    Pd,
    /// Possibly confounded by a latent.
    #[serde(rename = "pl")]
    Pl,
}

/// Bootstrap support for one edge-type code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeTypeProbability {
    pub ty: EdgeTypeCode,
    pub probability: f64,
}

/// Optional decorations attached to an edge. Stored sparsely beside the
/// adjacency structure; `properties` and `type_probs` are unordered sets.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_probs: Vec<EdgeTypeProbability>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<EdgeProperty>,
}

impl EdgeAttrs {
    pub fn is_empty(&self) -> bool {
        self.probability.is_none() && self.type_probs.is_empty() && self.properties.is_empty()
    }
}

/// An (x, y, z) annotation over three path-adjacent nodes.
///
/// A triple and its mirror image (z, y, x) denote the same annotation, so
/// the outer pair is stored in canonical order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    x: V,
    y: V,
    z: V,
}

impl Triple {
    pub fn new(x: V, y: V, z: V) -> Triple {
        if x <= z {
            Triple { x, y, z }
        } else {
            Triple { x: z, y, z: x }
        }
    }

    pub fn x(&self) -> V {
        self.x
    }
    pub fn y(&self) -> V {
        self.y
    }
    pub fn z(&self) -> V {
        self.z
    }
}

/// A structural mutation, recorded in the graph's event buffer for observers
/// to drain via [`GraphLike::take_events`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    NodeAdded(V),
    NodeRemoved(V),
    EdgeAdded(V, V),
    EdgeRemoved(V, V),
}

/// Invariant violations surfaced to the caller as failure results.
///
/// Programmer errors (querying a vertex that is not in the graph, a
/// separation query between a node and itself) panic instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("an edge already exists between {0} and {1}")]
    DuplicateEdge(V, V),
    #[error("self-loops are not allowed (node {0})")]
    SelfLoop(V),
    #[error("a node named {0:?} already exists")]
    DuplicateName(String),
}

/// The graph store contract.
///
/// Three backends implement this: [`crate::hash_graph::Graph`] (the
/// canonical one) and the two dense variants in [`crate::mat_graph`]. All
/// backend-independent semantics live in default methods so the backends
/// cannot drift; a backend only supplies storage.
pub trait GraphLike: Clone + Sized + Send + Sync + std::fmt::Debug {
    /// Initialise a new empty graph
    fn new() -> Self;

    /// Next fresh vertex handle
    fn vindex(&self) -> V;

    /// Number of nodes
    fn num_nodes(&self) -> usize;

    /// Number of edges
    fn num_edges(&self) -> usize;

    /// Get iterator over all nodes, in insertion order
    fn nodes(&self) -> impl Iterator<Item = V>;

    /// Get iterator over all edges
    ///
    /// An "edge" is a triple (s, t, ends), where s < t and `ends` is
    /// oriented to match. No ordering guarantee across edges.
    fn edges(&self) -> impl Iterator<Item = (V, V, EdgeEnds)>;

    fn contains_node(&self, v: V) -> bool;

    /// Get the data associated to the given node
    ///
    /// Panics if the node is not in the graph.
    fn node_data(&self, v: V) -> &VData;

    /// Look a node up by display name. Absence is a normal outcome.
    fn node_by_name(&self, name: &str) -> Option<V>;

    /// Add a node, minting a fresh handle.
    ///
    /// Fails if another node already carries the same name.
    fn add_node_with_data(&mut self, d: VData) -> Result<V, GraphError>;

    /// Rename a node, updating the name index in the same step.
    ///
    /// Fails if the new name collides with a different node. Panics if the
    /// node is not in the graph.
    fn rename_node(&mut self, v: V, name: &str) -> Result<(), GraphError>;

    /// Set the type of a node
    fn set_node_type(&mut self, v: V, ty: NodeType);

    /// Remove a node and all incident edges. Returns false (and does
    /// nothing) if the node is absent.
    fn remove_node(&mut self, v: V) -> bool;

    /// Add an edge with the given endpoint pair.
    ///
    /// Re-adding an edge equal to an existing one is a no-op success;
    /// adding a *different* edge between the same pair fails, as does a
    /// self-loop. Panics if either vertex is not in the graph.
    fn add_edge_with_ends(&mut self, s: V, t: V, ends: EdgeEnds) -> Result<(), GraphError>;

    /// Remove the edge between s and t. Returns false if there is none.
    fn remove_edge(&mut self, s: V, t: V) -> bool;

    /// The endpoint pair of the edge between s and t, oriented (s, t), or
    /// `None` if there is no such edge (including when either vertex is
    /// absent).
    fn edge_ends_opt(&self, s: V, t: V) -> Option<EdgeEnds>;

    /// Replace the endpoint pair of an existing edge.
    ///
    /// Panics if there is no edge between s and t.
    fn set_edge_ends(&mut self, s: V, t: V, ends: EdgeEnds);

    /// Decorations of the edge between s and t, if any have been set.
    fn edge_attrs(&self, s: V, t: V) -> Option<&EdgeAttrs>;

    /// Mutable decorations of the edge between s and t, created on first
    /// access. Panics if there is no such edge.
    fn edge_attrs_mut(&mut self, s: V, t: V) -> &mut EdgeAttrs;

    /// Neighbors of v. Panics if v is not in the graph.
    fn neighbors(&self, v: V) -> impl Iterator<Item = V>;

    /// Incident edges of v as (neighbor, ends) with ends oriented (v,
    /// neighbor). Panics if v is not in the graph.
    fn incident_edges(&self, v: V) -> impl Iterator<Item = (V, EdgeEnds)>;

    fn degree(&self, v: V) -> usize;

    /// Graph-level attributes
    fn attributes(&self) -> &FxHashMap<String, AttrValue>;
    fn attributes_mut(&mut self) -> &mut FxHashMap<String, AttrValue>;

    /// The triple ledger storage. Semantics live in the default methods
    /// below; backends only own the sets.
    fn triples(&self) -> &TripleStore;
    fn triples_mut(&mut self) -> &mut TripleStore;

    /// Drain the structural-change event buffer.
    fn take_events(&mut self) -> Vec<GraphEvent>;

    /// Parents of v: neighbors w with w --> v.
    ///
    /// The canonical backend overrides this with a memoized version.
    fn parents(&self, v: V) -> Vec<V> {
        self.incident_edges(v)
            .filter(|&(_, e)| e.s == Endpoint::Arrow && e.t == Endpoint::Tail)
            .map(|(w, _)| w)
            .collect()
    }

    /// Children of v: neighbors w with v --> w.
    fn children(&self, v: V) -> Vec<V> {
        self.incident_edges(v)
            .filter(|&(_, e)| e.s == Endpoint::Tail && e.t == Endpoint::Arrow)
            .map(|(w, _)| w)
            .collect()
    }

    fn indegree(&self, v: V) -> usize {
        self.parents(v).len()
    }

    fn outdegree(&self, v: V) -> usize {
        self.children(v).len()
    }

    fn node_name(&self, v: V) -> &str {
        &self.node_data(v).name
    }

    fn node_type(&self, v: V) -> NodeType {
        self.node_data(v).ty
    }

    /// Add a measured node by name, panicking on a name collision.
    fn add_node(&mut self, name: impl Into<String>) -> V {
        self.add_node_of_type(name, NodeType::Measured)
    }

    fn add_node_of_type(&mut self, name: impl Into<String>, ty: NodeType) -> V {
        self.add_node_with_data(VData::new(name, ty))
            .unwrap_or_else(|e| panic!("{e}"))
    }

    fn is_adjacent(&self, s: V, t: V) -> bool {
        self.edge_ends_opt(s, t).is_some()
    }

    fn edge_ends(&self, s: V, t: V) -> EdgeEnds {
        self.edge_ends_opt(s, t).expect("Edge not found")
    }

    /// The mark proximal to v on the edge between v and w.
    fn endpoint_at(&self, v: V, w: V) -> Option<Endpoint> {
        self.edge_ends_opt(v, w).map(|e| e.s)
    }

    /// The mark at the far side of the edge between v and w.
    fn distal_endpoint(&self, v: V, w: V) -> Option<Endpoint> {
        self.edge_ends_opt(v, w).map(|e| e.t)
    }

    fn add_directed_edge(&mut self, s: V, t: V) -> Result<(), GraphError> {
        self.add_edge_with_ends(s, t, EdgeEnds::directed())
    }

    fn add_undirected_edge(&mut self, s: V, t: V) -> Result<(), GraphError> {
        self.add_edge_with_ends(s, t, EdgeEnds::undirected())
    }

    fn add_bidirected_edge(&mut self, s: V, t: V) -> Result<(), GraphError> {
        self.add_edge_with_ends(s, t, EdgeEnds::bidirected())
    }

    fn add_partially_oriented_edge(&mut self, s: V, t: V) -> Result<(), GraphError> {
        self.add_edge_with_ends(s, t, EdgeEnds::partially_oriented())
    }

    fn add_nondirected_edge(&mut self, s: V, t: V) -> Result<(), GraphError> {
        self.add_edge_with_ends(s, t, EdgeEnds::nondirected())
    }

    /// Add a directed edge s --> t, panicking on failure.
    fn add_edge(&mut self, s: V, t: V) {
        self.add_directed_edge(s, t).unwrap_or_else(|e| panic!("{e}"));
    }

    /// Step from v over the edge to w regardless of marks.
    fn traverse(&self, v: V, w: V) -> Option<V> {
        self.edge_ends_opt(v, w).map(|_| w)
    }

    /// Step from v to w only over v --> w.
    fn traverse_directed(&self, v: V, w: V) -> Option<V> {
        let e = self.edge_ends_opt(v, w)?;
        (e.s == Endpoint::Tail && e.t == Endpoint::Arrow).then_some(w)
    }

    /// Step from v to w over an edge whose mark at v is Tail or Circle.
    fn traverse_semi_directed(&self, v: V, w: V) -> Option<V> {
        let e = self.edge_ends_opt(v, w)?;
        (e.s == Endpoint::Tail || e.s == Endpoint::Circle).then_some(w)
    }

    /// Replace the mark proximal to `to` on the edge between `from` and
    /// `to`, synthesizing a `from --* to` edge (Tail at `from`) if none
    /// exists.
    fn set_endpoint(&mut self, from: V, to: V, ep: Endpoint) -> Result<(), GraphError> {
        match self.edge_ends_opt(from, to) {
            Some(e) => {
                self.set_edge_ends(from, to, EdgeEnds::new(e.s, ep));
                Ok(())
            }
            None => self.add_edge_with_ends(from, to, EdgeEnds::new(Endpoint::Tail, ep)),
        }
    }

    /// Set every mark of every edge to the given endpoint.
    fn reorient_all_with(&mut self, ep: Endpoint) {
        for (s, t, _) in self.edge_vec() {
            self.set_edge_ends(s, t, EdgeEnds::new(ep, ep));
        }
    }

    /// Remove all edges, then connect every node pair with `ep` at both
    /// ends.
    fn fully_connect(&mut self, ep: Endpoint) {
        for (s, t, _) in self.edge_vec() {
            self.remove_edge(s, t);
        }
        let vs = self.node_vec();
        for i in 0..vs.len() {
            for j in (i + 1)..vs.len() {
                self.add_edge_with_ends(vs[i], vs[j], EdgeEnds::new(ep, ep))
                    .unwrap_or_else(|e| panic!("{e}"));
            }
        }
    }

    /// Remove all nodes and edges. Graph-level attributes are kept.
    fn clear(&mut self) {
        for v in self.node_vec() {
            self.remove_node(v);
        }
    }

    /// Returns the induced subgraph on the given nodes: exactly those
    /// nodes, and the edges (with decorations) whose both sides are kept.
    fn subgraph(&self, keep: &[V]) -> Self {
        let kept: FxHashSet<V> = keep.iter().copied().collect();
        let mut g = Self::new();
        let mut vmap: FxHashMap<V, V> = FxHashMap::default();
        for v in self.nodes() {
            if kept.contains(&v) {
                let w = g
                    .add_node_with_data(self.node_data(v).clone())
                    .unwrap_or_else(|e| panic!("{e}"));
                vmap.insert(v, w);
            }
        }

        for (s, t, ends) in self.edges() {
            if vmap.contains_key(&s) && vmap.contains_key(&t) {
                g.add_edge_with_ends(vmap[&s], vmap[&t], ends)
                    .unwrap_or_else(|e| panic!("{e}"));
                if let Some(attrs) = self.edge_attrs(s, t) {
                    *g.edge_attrs_mut(vmap[&s], vmap[&t]) = attrs.clone();
                }
            }
        }

        g
    }

    fn node_vec(&self) -> Vec<V> {
        self.nodes().collect()
    }
    fn edge_vec(&self) -> Vec<(V, V, EdgeEnds)> {
        self.edges().collect()
    }
    fn neighbor_vec(&self, v: V) -> Vec<V> {
        self.neighbors(v).collect()
    }
    fn incident_edge_vec(&self, v: V) -> Vec<(V, EdgeEnds)> {
        self.incident_edges(v).collect()
    }

    /// True if (x, y, z) is "along a path": x-y and y-z are both edges.
    fn is_triple_along_path(&self, x: V, y: V, z: V) -> bool {
        self.is_adjacent(x, y) && self.is_adjacent(y, z)
    }

    /// Record (x, y, z) as ambiguous. A triple not along a path is silently
    /// ignored.
    fn add_ambiguous_triple(&mut self, x: V, y: V, z: V) {
        if self.is_triple_along_path(x, y, z) {
            self.triples_mut().insert_ambiguous(Triple::new(x, y, z));
        }
    }

    fn add_underline_triple(&mut self, x: V, y: V, z: V) {
        if self.is_triple_along_path(x, y, z) {
            self.triples_mut().insert_underline(Triple::new(x, y, z));
        }
    }

    fn add_dotted_underline_triple(&mut self, x: V, y: V, z: V) {
        if self.is_triple_along_path(x, y, z) {
            self.triples_mut()
                .insert_dotted_underline(Triple::new(x, y, z));
        }
    }

    /// Membership is re-validated against the current adjacency, so a
    /// triple invalidated by node or edge removal is never reported.
    fn is_ambiguous_triple(&self, x: V, y: V, z: V) -> bool {
        self.triples().contains_ambiguous(&Triple::new(x, y, z))
            && self.is_triple_along_path(x, y, z)
    }

    fn is_underline_triple(&self, x: V, y: V, z: V) -> bool {
        self.triples().contains_underline(&Triple::new(x, y, z))
            && self.is_triple_along_path(x, y, z)
    }

    fn is_dotted_underline_triple(&self, x: V, y: V, z: V) -> bool {
        self.triples()
            .contains_dotted_underline(&Triple::new(x, y, z))
            && self.is_triple_along_path(x, y, z)
    }

    fn ambiguous_triples(&self) -> Vec<Triple> {
        self.triples()
            .ambiguous()
            .iter()
            .filter(|t| self.is_triple_along_path(t.x(), t.y(), t.z()))
            .copied()
            .collect()
    }

    fn underline_triples(&self) -> Vec<Triple> {
        self.triples()
            .underline()
            .iter()
            .filter(|t| self.is_triple_along_path(t.x(), t.y(), t.z()))
            .copied()
            .collect()
    }

    fn dotted_underline_triples(&self) -> Vec<Triple> {
        self.triples()
            .dotted_underline()
            .iter()
            .filter(|t| self.is_triple_along_path(t.x(), t.y(), t.z()))
            .copied()
            .collect()
    }

    /// Eagerly prune ledger entries invalidated by node or edge removal.
    ///
    /// Gated on the store's dirty flag, so calling on a clean ledger is
    /// free. Idempotent.
    fn remove_triples_not_in_graph(&mut self) {
        if !self.triples().is_dirty() {
            return;
        }
        let keep = |ts: &FxHashSet<Triple>| -> FxHashSet<Triple> {
            ts.iter()
                .filter(|t| self.is_triple_along_path(t.x(), t.y(), t.z()))
                .copied()
                .collect()
        };
        let amb = keep(self.triples().ambiguous());
        let und = keep(self.triples().underline());
        let dot = keep(self.triples().dotted_underline());
        let ts = self.triples_mut();
        ts.replace(amb, und, dot);
        ts.clear_dirty();
    }

    /// True if both marks at y point into y along x-y-z.
    fn is_def_collider(&self, x: V, y: V, z: V) -> bool {
        self.endpoint_at(y, x) == Some(Endpoint::Arrow)
            && self.endpoint_at(y, z) == Some(Endpoint::Arrow)
    }

    /// True if a Tail at y on either side, or an underline annotation,
    /// rules out a collider at y along x-y-z.
    fn is_def_noncollider(&self, x: V, y: V, z: V) -> bool {
        self.endpoint_at(y, x) == Some(Endpoint::Tail)
            || self.endpoint_at(y, z) == Some(Endpoint::Tail)
            || self.is_underline_triple(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_graph::Graph;

    #[test]
    fn edge_kinds() {
        assert_eq!(EdgeEnds::directed().kind(), Some(EdgeKind::Directed));
        assert_eq!(EdgeEnds::undirected().kind(), Some(EdgeKind::Undirected));
        assert_eq!(EdgeEnds::bidirected().kind(), Some(EdgeKind::Bidirected));
        assert_eq!(
            EdgeEnds::partially_oriented().kind(),
            Some(EdgeKind::PartiallyOriented)
        );
        assert_eq!(EdgeEnds::nondirected().kind(), Some(EdgeKind::Nondirected));
        assert_eq!(
            EdgeEnds::new(Endpoint::Tail, Endpoint::Circle).kind(),
            None
        );
    }

    #[test]
    fn kind_invariant_under_reverse() {
        for ends in [
            EdgeEnds::directed(),
            EdgeEnds::undirected(),
            EdgeEnds::bidirected(),
            EdgeEnds::partially_oriented(),
            EdgeEnds::nondirected(),
        ] {
            assert_eq!(ends.kind(), ends.reversed().kind());
        }
        // directed flips sides, the symmetric kinds are fixed by reverse
        assert_eq!(EdgeEnds::directed().reversed().s, Endpoint::Arrow);
        assert_eq!(EdgeEnds::undirected().reversed(), EdgeEnds::undirected());
        assert_eq!(EdgeEnds::bidirected().reversed(), EdgeEnds::bidirected());
        assert_eq!(EdgeEnds::nondirected().reversed(), EdgeEnds::nondirected());
    }

    #[test]
    fn ends_display() {
        assert_eq!(EdgeEnds::directed().to_string(), "-->");
        assert_eq!(EdgeEnds::bidirected().to_string(), "<->");
        assert_eq!(EdgeEnds::partially_oriented().to_string(), "o->");
        assert_eq!(EdgeEnds::nondirected().to_string(), "o-o");
        assert_eq!(EdgeEnds::undirected().to_string(), "---");
    }

    #[test]
    fn traversal() {
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        g.add_edge(a, b);
        g.add_partially_oriented_edge(b, c).unwrap();

        assert_eq!(g.traverse(b, a), Some(a));
        assert_eq!(g.traverse_directed(a, b), Some(b));
        assert_eq!(g.traverse_directed(b, a), None);
        // b o-> c: leaving b is semi-directed but not directed
        assert_eq!(g.traverse_directed(b, c), None);
        assert_eq!(g.traverse_semi_directed(b, c), Some(c));
        assert_eq!(g.traverse_semi_directed(c, b), None);
        assert_eq!(g.traverse(a, c), None);
    }

    #[test]
    fn parents_and_children() {
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        let d = g.add_node("D");
        g.add_edge(a, b);
        g.add_edge(c, b);
        g.add_bidirected_edge(b, d).unwrap();

        let mut ps = g.parents(b);
        ps.sort();
        assert_eq!(ps, vec![a, c]);
        assert_eq!(g.children(a), vec![b]);
        // a bidirected edge contributes to neither
        assert_eq!(g.indegree(b), 2);
        assert_eq!(g.outdegree(b), 0);
        assert_eq!(g.degree(b), 3);
    }

    #[test]
    fn set_endpoint_synthesizes() {
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        g.set_endpoint(a, b, Endpoint::Arrow).unwrap();
        assert_eq!(g.edge_ends(a, b), EdgeEnds::directed());

        // replacing one mark leaves the other in place
        g.set_endpoint(b, a, Endpoint::Circle).unwrap();
        assert_eq!(g.edge_ends(a, b), EdgeEnds::new(Endpoint::Circle, Endpoint::Arrow));
    }

    #[test]
    fn reorient_and_fully_connect() {
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        g.add_edge(a, b);
        g.reorient_all_with(Endpoint::Circle);
        assert_eq!(g.edge_ends(a, b), EdgeEnds::nondirected());

        g.fully_connect(Endpoint::Circle);
        assert_eq!(g.num_edges(), 3);
        assert_eq!(g.edge_ends(a, c), EdgeEnds::nondirected());
    }

    #[test]
    fn subgraph_drops_unkept_edges() {
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        g.add_edge(a, b);
        g.add_edge(b, c);

        let h = g.subgraph(&[a, c]);
        assert_eq!(h.num_nodes(), 2);
        assert_eq!(h.num_edges(), 0);
        let names: Vec<&str> = h.nodes().map(|v| h.node_name(v)).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn triple_ledger_prunes_on_removal() {
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        g.add_edge(a, b);
        g.add_edge(c, b);
        g.add_ambiguous_triple(a, b, c);
        g.add_underline_triple(a, b, c);
        assert!(g.is_ambiguous_triple(a, b, c));
        // mirror image is the same annotation
        assert!(g.is_ambiguous_triple(c, b, a));

        g.remove_node(b);
        assert!(!g.is_ambiguous_triple(a, b, c));
        g.remove_triples_not_in_graph();
        assert!(g.triples().ambiguous().is_empty());
        assert!(g.triples().underline().is_empty());
    }

    #[test]
    fn triple_not_along_path_is_ignored() {
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        g.add_edge(a, b);
        // no b-c edge
        g.add_ambiguous_triple(a, b, c);
        assert!(g.triples().ambiguous().is_empty());
    }

    #[test]
    fn def_collider_tests() {
        let mut g = Graph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        g.add_edge(a, b);
        g.add_edge(c, b);
        assert!(g.is_def_collider(a, b, c));
        assert!(!g.is_def_noncollider(a, b, c));

        let mut h = Graph::new();
        let a = h.add_node("A");
        let b = h.add_node("B");
        let c = h.add_node("C");
        h.add_nondirected_edge(a, b).unwrap();
        h.add_nondirected_edge(b, c).unwrap();
        assert!(!h.is_def_collider(a, b, c));
        assert!(!h.is_def_noncollider(a, b, c));
        h.add_underline_triple(a, b, c);
        assert!(h.is_def_noncollider(a, b, c));
    }
}
