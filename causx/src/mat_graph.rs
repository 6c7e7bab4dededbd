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

//! Dense endpoint-matrix backends.
//!
//! These trade the canonical backend's O(1) amortized edge mutation for
//! O(n²) memory and a full matrix rebuild on node add. They pay off when
//! manipulating extreme numbers of small, dense graphs over a fixed node
//! set. Two cell widths are provided: [`ShortMatrixGraph`] (i16) and
//! [`ByteMatrixGraph`] (u8).

pub use crate::graph::*;
use crate::triples::TripleStore;
use ndarray::{s, Array2};
use rustc_hash::FxHashMap;
use serde_json::Value as AttrValue;
use std::mem;

/// A matrix cell: an endpoint mark or absence, packed into an integer.
pub trait EndpointCode:
    Copy + Default + PartialEq + Send + Sync + std::fmt::Debug + 'static
{
    fn encode(ep: Option<Endpoint>) -> Self;
    fn decode(self) -> Option<Endpoint>;
}

impl EndpointCode for u8 {
    fn encode(ep: Option<Endpoint>) -> u8 {
        match ep {
            None => 0,
            Some(Endpoint::Tail) => 1,
            Some(Endpoint::Arrow) => 2,
            Some(Endpoint::Circle) => 3,
        }
    }

    fn decode(self) -> Option<Endpoint> {
        match self {
            0 => None,
            1 => Some(Endpoint::Tail),
            2 => Some(Endpoint::Arrow),
            3 => Some(Endpoint::Circle),
            c => panic!("Bad endpoint code {c}"),
        }
    }
}

impl EndpointCode for i16 {
    fn encode(ep: Option<Endpoint>) -> i16 {
        u8::encode(ep) as i16
    }

    fn decode(self) -> Option<Endpoint> {
        match self {
            0 => None,
            1 => Some(Endpoint::Tail),
            2 => Some(Endpoint::Arrow),
            3 => Some(Endpoint::Circle),
            c => panic!("Bad endpoint code {c}"),
        }
    }
}

/// A graph stored as a dense n×n matrix of endpoint codes.
///
/// Cell (i, j) holds the mark proximal to i on the edge {i, j}, or zero if
/// there is none; the two cells of a pair are always written together.
/// Vertex slots are append-only (holes left by removal are never reused),
/// which keeps handles stable and makes index order equal insertion order.
#[derive(Debug, Clone)]
pub struct MatrixGraph<C: EndpointCode> {
    vdata: Vec<Option<VData>>,
    matrix: Array2<C>,
    eattrs: FxHashMap<(V, V), EdgeAttrs>,
    names: FxHashMap<String, V>,
    numv: usize,
    nume: usize,
    attrs: FxHashMap<String, AttrValue>,
    triples: TripleStore,
    events: Vec<GraphEvent>,
}

impl<C: EndpointCode> PartialEq for MatrixGraph<C> {
    /// Structural equality; the event buffer does not participate.
    fn eq(&self, other: &MatrixGraph<C>) -> bool {
        self.vdata == other.vdata
            && self.matrix == other.matrix
            && self.eattrs == other.eattrs
            && self.attrs == other.attrs
            && self.triples == other.triples
    }
}

/// Matrix backend with 16-bit cells.
pub type ShortMatrixGraph = MatrixGraph<i16>;

/// Matrix backend with 8-bit cells.
pub type ByteMatrixGraph = MatrixGraph<u8>;

impl<C: EndpointCode> MatrixGraph<C> {
    fn pair_key(s: V, t: V) -> (V, V) {
        if s < t {
            (s, t)
        } else {
            (t, s)
        }
    }

    fn slots(&self) -> usize {
        self.vdata.len()
    }

    fn check_node(&self, v: V, what: &str) {
        if v >= self.slots() || self.vdata[v].is_none() {
            panic!("{what} not found");
        }
    }
}

impl<C: EndpointCode> GraphLike for MatrixGraph<C> {
    fn new() -> MatrixGraph<C> {
        MatrixGraph {
            vdata: Vec::new(),
            matrix: Array2::default((0, 0)),
            eattrs: FxHashMap::default(),
            names: FxHashMap::default(),
            numv: 0,
            nume: 0,
            attrs: FxHashMap::default(),
            triples: TripleStore::new(),
            events: Vec::new(),
        }
    }

    fn vindex(&self) -> V {
        self.vdata.len()
    }

    fn num_nodes(&self) -> usize {
        self.numv
    }

    fn num_edges(&self) -> usize {
        self.nume
    }

    fn nodes(&self) -> impl Iterator<Item = V> {
        self.vdata
            .iter()
            .enumerate()
            .filter_map(|(v, d)| d.as_ref().map(|_| v))
    }

    fn edges(&self) -> impl Iterator<Item = (V, V, EdgeEnds)> {
        let n = self.slots();
        (0..n).flat_map(move |s| {
            ((s + 1)..n).filter_map(move |t| {
                let es = self.matrix[(s, t)].decode()?;
                let et = self.matrix[(t, s)].decode()?;
                Some((s, t, EdgeEnds::new(es, et)))
            })
        })
    }

    fn contains_node(&self, v: V) -> bool {
        v < self.slots() && self.vdata[v].is_some()
    }

    fn node_data(&self, v: V) -> &VData {
        self.vdata
            .get(v)
            .and_then(|d| d.as_ref())
            .expect("Vertex not found")
    }

    fn node_by_name(&self, name: &str) -> Option<V> {
        self.names.get(name).copied()
    }

    fn add_node_with_data(&mut self, d: VData) -> Result<V, GraphError> {
        if self.names.contains_key(&d.name) {
            return Err(GraphError::DuplicateName(d.name));
        }
        let v = self.vdata.len();
        self.names.insert(d.name.clone(), v);
        self.vdata.push(Some(d));
        self.numv += 1;

        // full matrix reconstruction: the old block is copied into the
        // top-left corner of an (n+1)² matrix
        let n = self.vdata.len();
        let mut m = Array2::default((n, n));
        if n > 1 {
            m.slice_mut(s![..n - 1, ..n - 1]).assign(&self.matrix);
        }
        self.matrix = m;

        self.events.push(GraphEvent::NodeAdded(v));
        Ok(v)
    }

    fn rename_node(&mut self, v: V, name: &str) -> Result<(), GraphError> {
        self.check_node(v, "Vertex");
        let d = self.vdata[v].as_mut().expect("Vertex not found");
        if d.name == name {
            return Ok(());
        }
        if self.names.contains_key(name) {
            return Err(GraphError::DuplicateName(name.to_owned()));
        }
        self.names.remove(&d.name);
        d.name = name.to_owned();
        self.names.insert(name.to_owned(), v);
        Ok(())
    }

    fn set_node_type(&mut self, v: V, ty: NodeType) {
        self.check_node(v, "Vertex");
        self.vdata[v].as_mut().expect("Vertex not found").ty = ty;
    }

    fn remove_node(&mut self, v: V) -> bool {
        if !self.contains_node(v) {
            return false;
        }

        for w in 0..self.slots() {
            if self.matrix[(v, w)].decode().is_some() {
                self.matrix[(v, w)] = C::encode(None);
                self.matrix[(w, v)] = C::encode(None);
                self.eattrs.remove(&MatrixGraph::<C>::pair_key(v, w));
                self.nume -= 1;
                self.events.push(GraphEvent::EdgeRemoved(v, w));
            }
        }

        let d = self.vdata[v].take().expect("Vertex not found");
        self.names.remove(&d.name);
        self.numv -= 1;
        self.triples.mark_dirty();
        self.events.push(GraphEvent::NodeRemoved(v));
        true
    }

    fn add_edge_with_ends(&mut self, s: V, t: V, ends: EdgeEnds) -> Result<(), GraphError> {
        self.check_node(s, "Source vertex");
        self.check_node(t, "Target vertex");
        if s == t {
            return Err(GraphError::SelfLoop(s));
        }
        if let Some(existing) = self.edge_ends_opt(s, t) {
            return if existing == ends {
                Ok(())
            } else {
                Err(GraphError::DuplicateEdge(s, t))
            };
        }

        self.matrix[(s, t)] = C::encode(Some(ends.s));
        self.matrix[(t, s)] = C::encode(Some(ends.t));
        self.nume += 1;
        self.events.push(GraphEvent::EdgeAdded(s, t));
        Ok(())
    }

    fn remove_edge(&mut self, s: V, t: V) -> bool {
        if self.edge_ends_opt(s, t).is_none() {
            return false;
        }
        self.matrix[(s, t)] = C::encode(None);
        self.matrix[(t, s)] = C::encode(None);
        self.eattrs.remove(&MatrixGraph::<C>::pair_key(s, t));
        self.nume -= 1;
        self.triples.mark_dirty();
        self.events.push(GraphEvent::EdgeRemoved(s, t));
        true
    }

    fn edge_ends_opt(&self, s: V, t: V) -> Option<EdgeEnds> {
        if s >= self.slots() || t >= self.slots() {
            return None;
        }
        let es = self.matrix[(s, t)].decode()?;
        let et = self.matrix[(t, s)].decode()?;
        Some(EdgeEnds::new(es, et))
    }

    fn set_edge_ends(&mut self, s: V, t: V, ends: EdgeEnds) {
        if self.edge_ends_opt(s, t).is_none() {
            panic!("Edge not found");
        }
        self.matrix[(s, t)] = C::encode(Some(ends.s));
        self.matrix[(t, s)] = C::encode(Some(ends.t));
    }

    fn edge_attrs(&self, s: V, t: V) -> Option<&EdgeAttrs> {
        self.eattrs.get(&MatrixGraph::<C>::pair_key(s, t))
    }

    fn edge_attrs_mut(&mut self, s: V, t: V) -> &mut EdgeAttrs {
        if self.edge_ends_opt(s, t).is_none() {
            panic!("Edge not found");
        }
        self.eattrs
            .entry(MatrixGraph::<C>::pair_key(s, t))
            .or_default()
    }

    fn neighbors(&self, v: V) -> impl Iterator<Item = V> {
        self.check_node(v, "Vertex");
        let n = self.slots();
        (0..n).filter(move |&w| self.matrix[(v, w)].decode().is_some())
    }

    fn incident_edges(&self, v: V) -> impl Iterator<Item = (V, EdgeEnds)> {
        self.check_node(v, "Vertex");
        let n = self.slots();
        (0..n).filter_map(move |w| {
            let ev = self.matrix[(v, w)].decode()?;
            let ew = self.matrix[(w, v)].decode()?;
            Some((w, EdgeEnds::new(ev, ew)))
        })
    }

    fn degree(&self, v: V) -> usize {
        self.neighbors(v).count()
    }

    fn attributes(&self) -> &FxHashMap<String, AttrValue> {
        &self.attrs
    }

    fn attributes_mut(&mut self) -> &mut FxHashMap<String, AttrValue> {
        &mut self.attrs
    }

    fn triples(&self) -> &TripleStore {
        &self.triples
    }

    fn triples_mut(&mut self) -> &mut TripleStore {
        &mut self.triples
    }

    fn take_events(&mut self) -> Vec<GraphEvent> {
        mem::take(&mut self.events)
    }
}
