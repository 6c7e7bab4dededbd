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

//! Json encoding of graphs.
//!
//! Built entirely on the public graph API; decoding any encoded graph
//! reproduces an isomorphic one (same node names and types, same edge
//! endpoint pairs and decorations, same triple sets and attributes).
//! Nodes are referenced by name in the wire format, so vertex handles are
//! not preserved.

use serde::{Deserialize, Serialize};
use serde_json::Value as AttrValue;
use std::collections::HashMap;
use std::path::Path;

use crate::graph::{EdgeAttrs, EdgeEnds, Endpoint, GraphError, GraphLike, NodeType, VData};

#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    #[error("json: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("edge references unknown node {0:?}")]
    UnknownNode(String),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Returns the json-encoded representation of a graph.
pub fn encode_graph(graph: &impl GraphLike) -> serde_json::Result<String> {
    serde_json::to_string(&JsonGraph::from_graph(graph))
}

/// Reads a graph from its json-encoded representation.
pub fn decode_graph<G: GraphLike>(s: &str) -> Result<G, JsonError> {
    let jg: JsonGraph = serde_json::from_str(s)?;
    jg.to_graph()
}

/// Writes the json-encoded representation of a graph to a file.
pub fn write_graph(graph: &impl GraphLike, filename: &Path) -> Result<(), JsonError> {
    let file = std::fs::File::create(filename)?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer(writer, &JsonGraph::from_graph(graph))?;
    Ok(())
}

/// Reads a graph from a json-encoded file.
pub fn read_graph<G: GraphLike>(filename: &Path) -> Result<G, JsonError> {
    let file = std::fs::File::open(filename)?;
    let reader = std::io::BufReader::new(file);
    let jg: JsonGraph = serde_json::from_reader(reader)?;
    jg.to_graph()
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct JsonGraph {
    nodes: Vec<JsonNode>,
    #[serde(default)]
    edges: Vec<JsonEdge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    ambiguous_triples: Vec<[String; 3]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    underline_triples: Vec<[String; 3]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    dotted_underline_triples: Vec<[String; 3]>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    attributes: HashMap<String, AttrValue>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct JsonNode {
    name: String,
    #[serde(default)]
    ty: NodeType,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct JsonEdge {
    source: String,
    target: String,
    source_end: Endpoint,
    target_end: Endpoint,
    #[serde(flatten)]
    attrs: EdgeAttrs,
}

impl JsonGraph {
    pub fn from_graph(g: &impl GraphLike) -> JsonGraph {
        let nodes = g
            .nodes()
            .map(|v| JsonNode {
                name: g.node_name(v).to_owned(),
                ty: g.node_type(v),
            })
            .collect();

        let edges = g
            .edges()
            .map(|(s, t, ends)| JsonEdge {
                source: g.node_name(s).to_owned(),
                target: g.node_name(t).to_owned(),
                source_end: ends.s,
                target_end: ends.t,
                attrs: g.edge_attrs(s, t).cloned().unwrap_or_default(),
            })
            .collect();

        let names = |ts: Vec<crate::graph::Triple>| -> Vec<[String; 3]> {
            ts.into_iter()
                .map(|t| {
                    [
                        g.node_name(t.x()).to_owned(),
                        g.node_name(t.y()).to_owned(),
                        g.node_name(t.z()).to_owned(),
                    ]
                })
                .collect()
        };

        JsonGraph {
            nodes,
            edges,
            ambiguous_triples: names(g.ambiguous_triples()),
            underline_triples: names(g.underline_triples()),
            dotted_underline_triples: names(g.dotted_underline_triples()),
            attributes: g.attributes().iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    pub fn to_graph<G: GraphLike>(&self) -> Result<G, JsonError> {
        let mut g = G::new();
        for n in &self.nodes {
            g.add_node_with_data(VData::new(&n.name, n.ty))?;
        }

        let resolve = |g: &G, name: &str| {
            g.node_by_name(name)
                .ok_or_else(|| JsonError::UnknownNode(name.to_owned()))
        };

        for e in &self.edges {
            let s = resolve(&g, &e.source)?;
            let t = resolve(&g, &e.target)?;
            g.add_edge_with_ends(s, t, EdgeEnds::new(e.source_end, e.target_end))?;
            if !e.attrs.is_empty() {
                *g.edge_attrs_mut(s, t) = e.attrs.clone();
            }
        }

        for [x, y, z] in &self.ambiguous_triples {
            let (x, y, z) = (resolve(&g, x)?, resolve(&g, y)?, resolve(&g, z)?);
            g.add_ambiguous_triple(x, y, z);
        }
        for [x, y, z] in &self.underline_triples {
            let (x, y, z) = (resolve(&g, x)?, resolve(&g, y)?, resolve(&g, z)?);
            g.add_underline_triple(x, y, z);
        }
        for [x, y, z] in &self.dotted_underline_triples {
            let (x, y, z) = (resolve(&g, x)?, resolve(&g, y)?, resolve(&g, z)?);
            g.add_dotted_underline_triple(x, y, z);
        }

        g.attributes_mut()
            .extend(self.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));

        // decoding is a structural mutation sequence of its own; don't leak
        // it to observers of the fresh graph
        g.take_events();
        Ok(g)
    }
}
