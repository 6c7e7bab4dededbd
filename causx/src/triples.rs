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

use rustc_hash::FxHashSet;

use crate::graph::Triple;

/// Storage for the three triple ledgers of a graph.
///
/// This is pure storage, owned by each backend and exposed through
/// [`crate::graph::GraphLike::triples`]. The "along a path" semantics live
/// in the trait's default methods, which need adjacency access.
///
/// The dirty flag is set by node and edge removal. Readers re-validate
/// entries against adjacency on the fly, so staleness is never observable;
/// the flag only makes the eager prune
/// ([`crate::graph::GraphLike::remove_triples_not_in_graph`]) free when
/// nothing was removed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TripleStore {
    ambiguous: FxHashSet<Triple>,
    underline: FxHashSet<Triple>,
    dotted_underline: FxHashSet<Triple>,
    dirty: bool,
}

impl TripleStore {
    pub fn new() -> TripleStore {
        TripleStore::default()
    }

    pub fn ambiguous(&self) -> &FxHashSet<Triple> {
        &self.ambiguous
    }

    pub fn underline(&self) -> &FxHashSet<Triple> {
        &self.underline
    }

    pub fn dotted_underline(&self) -> &FxHashSet<Triple> {
        &self.dotted_underline
    }

    pub fn insert_ambiguous(&mut self, t: Triple) {
        self.ambiguous.insert(t);
    }

    pub fn insert_underline(&mut self, t: Triple) {
        self.underline.insert(t);
    }

    pub fn insert_dotted_underline(&mut self, t: Triple) {
        self.dotted_underline.insert(t);
    }

    pub fn contains_ambiguous(&self, t: &Triple) -> bool {
        self.ambiguous.contains(t)
    }

    pub fn contains_underline(&self, t: &Triple) -> bool {
        self.underline.contains(t)
    }

    pub fn contains_dotted_underline(&self, t: &Triple) -> bool {
        self.dotted_underline.contains(t)
    }

    pub fn remove_ambiguous(&mut self, t: &Triple) -> bool {
        self.ambiguous.remove(t)
    }

    pub fn remove_underline(&mut self, t: &Triple) -> bool {
        self.underline.remove(t)
    }

    pub fn remove_dotted_underline(&mut self, t: &Triple) -> bool {
        self.dotted_underline.remove(t)
    }

    /// Swap in pruned copies of all three sets at once.
    pub fn replace(
        &mut self,
        ambiguous: FxHashSet<Triple>,
        underline: FxHashSet<Triple>,
        dotted_underline: FxHashSet<Triple>,
    ) {
        self.ambiguous = ambiguous;
        self.underline = underline;
        self.dotted_underline = dotted_underline;
    }

    pub fn clear(&mut self) {
        self.ambiguous.clear();
        self.underline.clear();
        self.dotted_underline.clear();
        self.dirty = false;
    }

    pub fn is_empty(&self) -> bool {
        self.ambiguous.is_empty() && self.underline.is_empty() && self.dotted_underline.is_empty()
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
