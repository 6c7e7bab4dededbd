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

//! Side table pairing substantive nodes with their error-term nodes.
//!
//! SEM-style graphs decorate a substantive variable with an exogenous
//! error node. The pairing is kept here, outside node identity, rather
//! than encoded in a name convention.

use rustc_hash::FxHashMap;

use crate::graph::{GraphLike, NodeType, V};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ErrorTerms {
    by_substantive: FxHashMap<V, V>,
    by_error: FxHashMap<V, V>,
}

impl ErrorTerms {
    pub fn new() -> ErrorTerms {
        ErrorTerms::default()
    }

    /// Pair `error` with `substantive`, replacing and returning any
    /// previous pairing of the substantive node.
    pub fn attach(&mut self, substantive: V, error: V) -> Option<V> {
        let prev = self.by_substantive.insert(substantive, error);
        if let Some(e) = prev {
            self.by_error.remove(&e);
        }
        self.by_error.insert(error, substantive);
        prev
    }

    pub fn detach(&mut self, substantive: V) -> Option<V> {
        let e = self.by_substantive.remove(&substantive)?;
        self.by_error.remove(&e);
        Some(e)
    }

    pub fn error_for(&self, substantive: V) -> Option<V> {
        self.by_substantive.get(&substantive).copied()
    }

    pub fn substantive_for(&self, error: V) -> Option<V> {
        self.by_error.get(&error).copied()
    }

    pub fn len(&self) -> usize {
        self.by_substantive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_substantive.is_empty()
    }

    /// Drop pairings whose nodes left the graph or whose error side is no
    /// longer an Error node.
    pub fn prune<G: GraphLike>(&mut self, g: &G) {
        let dead: Vec<V> = self
            .by_substantive
            .iter()
            .filter(|&(&s, &e)| {
                !g.contains_node(s) || !g.contains_node(e) || g.node_type(e) != NodeType::Error
            })
            .map(|(&s, _)| s)
            .collect();
        for s in dead {
            self.detach(s);
        }
    }
}
