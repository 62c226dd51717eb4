// Blockflow - Incremental structural analysis for editor-embedded source code
// Copyright (C) 2026  Marcel Joachim Kloubert <marcel@kloubert.dev>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Long-lived analysis session.
//!
//! An editor keeps one [`AnalysisSession`] per document and calls
//! [`AnalysisSession::reanalyze`] on every change. The session runs
//! the full pipeline, then rewrites the provisional block ids so that
//! blocks surviving an edit keep the id they had before. Ids come from
//! a monotonic allocator and are never reused within a session, so a
//! deleted block's id stays dead even if an identical block reappears.
//!
//! A reanalysis that fails leaves the previous result untouched: the
//! editor keeps rendering the last coherent graph while the user is
//! mid-keystroke.

mod matching;

use std::collections::HashMap;

use log::debug;

use crate::classify::classify;
use crate::error::Result;
use crate::graph::build_graph;
use crate::model::{AnalysisResult, BlockId};
use crate::stream::tokenize;
use crate::vars::track_variables;

pub use matching::match_blocks;

/// Incremental analysis state for one document.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    /// Last successful analysis, if any.
    current: Option<AnalysisResult>,
    /// Next block id to hand out; monotonic for the session lifetime.
    next_id: u64,
}

impl AnalysisSession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last successful result, if any reanalysis has succeeded.
    pub fn last_good(&self) -> Option<&AnalysisResult> {
        self.current.as_ref()
    }

    fn fresh_id(&mut self) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Analyze `source` and update the session state.
    ///
    /// On success the returned result replaces the previous one and
    /// matched blocks keep their ids. On failure the error is returned
    /// and [`last_good`](Self::last_good) still serves the previous
    /// result.
    pub fn reanalyze(&mut self, source: &str) -> Result<&AnalysisResult> {
        let records = tokenize(source)?;
        let mut forest = classify(&records)?;

        let matched = match self.current.as_ref() {
            Some(previous) => match_blocks(&previous.graph, &forest),
            None => HashMap::new(),
        };

        // Total remap: matched blocks keep their stable id, everything
        // else draws from the allocator.
        let mut remap = HashMap::new();
        let mut fresh = 0usize;
        for block in forest.blocks() {
            let stable = match matched.get(&block.id) {
                Some(stable) => *stable,
                None => {
                    fresh += 1;
                    self.fresh_id()
                }
            };
            remap.insert(block.id, stable);
        }
        forest.remap_ids(&remap);

        let graph = build_graph(&forest)?;
        let variables = track_variables(&forest);
        debug!(
            "reanalyzed: {} blocks ({} new), {} edges, {} variables",
            graph.order.len(),
            fresh,
            graph.edges.len(),
            variables.len()
        );

        Ok(self.current.insert(AnalysisResult::new(graph, variables)))
    }
}
