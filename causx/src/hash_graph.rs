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

pub use crate::graph::*;
use crate::triples::TripleStore;
use rustc_hash::FxHashMap;
use serde_json::Value as AttrValue;
use std::mem;
use std::sync::RwLock;

pub type VTab<T> = FxHashMap<V, T>;

/// The canonical backend: hash-based adjacency lists with mirrored
/// half-edges.
///
/// Edge add/remove is O(1) amortized; memory is proportional to nodes plus
/// edges. Parent lists are memoized behind an `RwLock` so read-only sharing
/// across threads stays sound; the memo is invalidated on every structural
/// mutation touching a node.
#[derive(Debug)]
pub struct Graph {
    vdata: VTab<VData>,
    /// edata[v][w] holds the endpoint pair oriented (v, w); every edge is
    /// mirrored in both adjacency maps.
    edata: VTab<VTab<EdgeEnds>>,
    /// Sparse decorations, keyed (min, max).
    eattrs: FxHashMap<(V, V), EdgeAttrs>,
    names: FxHashMap<String, V>,
    /// Live vertices in insertion order.
    order: Vec<V>,
    numv: usize,
    nume: usize,
    freshv: V,
    attrs: FxHashMap<String, AttrValue>,
    triples: TripleStore,
    events: Vec<GraphEvent>,
    parent_cache: RwLock<FxHashMap<V, Vec<V>>>,
}

impl Clone for Graph {
    fn clone(&self) -> Graph {
        Graph {
            vdata: self.vdata.clone(),
            edata: self.edata.clone(),
            eattrs: self.eattrs.clone(),
            names: self.names.clone(),
            order: self.order.clone(),
            numv: self.numv,
            nume: self.nume,
            freshv: self.freshv,
            attrs: self.attrs.clone(),
            triples: self.triples.clone(),
            events: self.events.clone(),
            parent_cache: RwLock::new(FxHashMap::default()),
        }
    }
}

impl PartialEq for Graph {
    /// Structural equality; the memo and the event buffer do not
    /// participate.
    fn eq(&self, other: &Graph) -> bool {
        self.vdata == other.vdata
            && self.edata == other.edata
            && self.eattrs == other.eattrs
            && self.order == other.order
            && self.attrs == other.attrs
            && self.triples == other.triples
    }
}

impl Graph {
    fn pair_key(s: V, t: V) -> (V, V) {
        if s < t {
            (s, t)
        } else {
            (t, s)
        }
    }

    /// Removes vertex 't' from the adjacency map of 's'. This private method
    /// is used by remove_edge and remove_node to make the latter slightly
    /// more efficient.
    fn remove_half_edge(&mut self, s: V, t: V) {
        if let Some(nhd) = self.edata.get_mut(&s) {
            nhd.remove(&t);
        }
    }

    fn invalidate_parents(&mut self, v: V) {
        self.parent_cache
            .get_mut()
            .expect("parent cache poisoned")
            .remove(&v);
    }
}

impl GraphLike for Graph {
    fn new() -> Graph {
        Graph {
            vdata: FxHashMap::default(),
            edata: FxHashMap::default(),
            eattrs: FxHashMap::default(),
            names: FxHashMap::default(),
            order: Vec::new(),
            numv: 0,
            nume: 0,
            freshv: 0,
            attrs: FxHashMap::default(),
            triples: TripleStore::new(),
            events: Vec::new(),
            parent_cache: RwLock::new(FxHashMap::default()),
        }
    }

    fn vindex(&self) -> V {
        self.freshv
    }

    fn num_nodes(&self) -> usize {
        self.numv
    }

    fn num_edges(&self) -> usize {
        self.nume
    }

    fn nodes(&self) -> impl Iterator<Item = V> {
        self.order.iter().copied()
    }

    fn edges(&self) -> impl Iterator<Item = (V, V, EdgeEnds)> {
        self.edata.iter().flat_map(|(&s, nhd)| {
            nhd.iter()
                .filter_map(move |(&t, &ends)| (s < t).then_some((s, t, ends)))
        })
    }

    fn contains_node(&self, v: V) -> bool {
        self.vdata.contains_key(&v)
    }

    fn node_data(&self, v: V) -> &VData {
        self.vdata.get(&v).expect("Vertex not found")
    }

    fn node_by_name(&self, name: &str) -> Option<V> {
        self.names.get(name).copied()
    }

    fn add_node_with_data(&mut self, d: VData) -> Result<V, GraphError> {
        if self.names.contains_key(&d.name) {
            return Err(GraphError::DuplicateName(d.name));
        }
        let v = self.freshv;
        self.freshv += 1;
        self.numv += 1;
        self.names.insert(d.name.clone(), v);
        self.vdata.insert(v, d);
        self.edata.insert(v, FxHashMap::default());
        self.order.push(v);
        self.events.push(GraphEvent::NodeAdded(v));
        Ok(v)
    }

    fn rename_node(&mut self, v: V, name: &str) -> Result<(), GraphError> {
        let d = self.vdata.get_mut(&v).expect("Vertex not found");
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
        self.vdata.get_mut(&v).expect("Vertex not found").ty = ty;
    }

    fn remove_node(&mut self, v: V) -> bool {
        if !self.vdata.contains_key(&v) {
            return false;
        }

        for w in self.neighbor_vec(v) {
            self.nume -= 1;
            self.remove_half_edge(w, v);
            self.eattrs.remove(&Graph::pair_key(v, w));
            self.invalidate_parents(w);
            self.events.push(GraphEvent::EdgeRemoved(v, w));
        }

        let d = self.vdata.remove(&v).expect("Vertex not found");
        self.names.remove(&d.name);
        self.edata.remove(&v);
        self.order.retain(|&w| w != v);
        self.numv -= 1;
        self.invalidate_parents(v);
        self.triples.mark_dirty();
        self.events.push(GraphEvent::NodeRemoved(v));
        true
    }

    fn add_edge_with_ends(&mut self, s: V, t: V, ends: EdgeEnds) -> Result<(), GraphError> {
        if !self.vdata.contains_key(&s) {
            panic!("Source vertex not found");
        }
        if !self.vdata.contains_key(&t) {
            panic!("Target vertex not found");
        }
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

        self.nume += 1;
        self.edata
            .get_mut(&s)
            .expect("Source vertex not found")
            .insert(t, ends);
        self.edata
            .get_mut(&t)
            .expect("Target vertex not found")
            .insert(s, ends.reversed());
        self.invalidate_parents(s);
        self.invalidate_parents(t);
        self.events.push(GraphEvent::EdgeAdded(s, t));
        Ok(())
    }

    fn remove_edge(&mut self, s: V, t: V) -> bool {
        if self.edge_ends_opt(s, t).is_none() {
            return false;
        }
        self.nume -= 1;
        self.remove_half_edge(s, t);
        self.remove_half_edge(t, s);
        self.eattrs.remove(&Graph::pair_key(s, t));
        self.invalidate_parents(s);
        self.invalidate_parents(t);
        self.triples.mark_dirty();
        self.events.push(GraphEvent::EdgeRemoved(s, t));
        true
    }

    fn edge_ends_opt(&self, s: V, t: V) -> Option<EdgeEnds> {
        self.edata.get(&s).and_then(|nhd| nhd.get(&t)).copied()
    }

    fn set_edge_ends(&mut self, s: V, t: V, ends: EdgeEnds) {
        *self
            .edata
            .get_mut(&s)
            .expect("Source vertex not found")
            .get_mut(&t)
            .expect("Edge not found") = ends;
        *self
            .edata
            .get_mut(&t)
            .expect("Target vertex not found")
            .get_mut(&s)
            .expect("Edge not found") = ends.reversed();
        self.invalidate_parents(s);
        self.invalidate_parents(t);
    }

    fn edge_attrs(&self, s: V, t: V) -> Option<&EdgeAttrs> {
        self.eattrs.get(&Graph::pair_key(s, t))
    }

    fn edge_attrs_mut(&mut self, s: V, t: V) -> &mut EdgeAttrs {
        if self.edge_ends_opt(s, t).is_none() {
            panic!("Edge not found");
        }
        self.eattrs.entry(Graph::pair_key(s, t)).or_default()
    }

    fn neighbors(&self, v: V) -> impl Iterator<Item = V> {
        self.edata
            .get(&v)
            .expect("Vertex not found")
            .keys()
            .copied()
    }

    fn incident_edges(&self, v: V) -> impl Iterator<Item = (V, EdgeEnds)> {
        self.edata
            .get(&v)
            .expect("Vertex not found")
            .iter()
            .map(|(&w, &ends)| (w, ends))
    }

    fn degree(&self, v: V) -> usize {
        self.edata.get(&v).expect("Vertex not found").len()
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

    fn parents(&self, v: V) -> Vec<V> {
        if let Some(ps) = self
            .parent_cache
            .read()
            .expect("parent cache poisoned")
            .get(&v)
        {
            return ps.clone();
        }
        let ps: Vec<V> = self
            .incident_edges(v)
            .filter(|&(_, e)| e.s == Endpoint::Arrow && e.t == Endpoint::Tail)
            .map(|(w, _)| w)
            .collect();
        self.parent_cache
            .write()
            .expect("parent cache poisoned")
            .insert(v, ps.clone());
        ps
    }
}
