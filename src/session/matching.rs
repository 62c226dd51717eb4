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

//! Block identity matching between two analysis passes.
//!
//! Pairs blocks of a freshly classified forest with blocks of the
//! previous graph so that stable ids survive edits. Matching runs per
//! sibling level, two passes:
//!
//! - pass 1 pairs blocks whose kind and statement texts are identical,
//!   in lexical order (insertions shift positions but not texts)
//! - pass 2 pairs the leftovers by position and kind alone, so a
//!   renamed condition or edited statement keeps its id
//!
//! Source line numbers never participate: moving a function down a
//! file is not an edit. Blocks left unmatched are new; the session
//! assigns them fresh ids.

use std::collections::HashMap;

use crate::classify::{BlockForest, ForestNode};
use crate::model::{BlockId, BlockKind, ControlFlowGraph};

/// Snapshot of one previous block, detached from the graph.
struct PrevNode {
    id: BlockId,
    kind: BlockKind,
    texts: Vec<String>,
    children: Vec<PrevNode>,
}

/// Rebuild the previous pass's block tree from parent links.
///
/// `ControlFlowGraph::order` preserves lexical emission order, so the
/// children of each parent come out in sibling order.
fn previous_tree(graph: &ControlFlowGraph) -> Vec<PrevNode> {
    fn build(graph: &ControlFlowGraph, parent: Option<BlockId>) -> Vec<PrevNode> {
        graph
            .order
            .iter()
            .filter_map(|id| graph.block(*id))
            .filter(|b| b.parent == parent)
            .map(|b| PrevNode {
                id: b.id,
                kind: b.kind,
                texts: b.statements.iter().map(|s| s.text.clone()).collect(),
                children: build(graph, Some(b.id)),
            })
            .collect()
    }
    build(graph, None)
}

/// Sibling view of a new forest node: children and else children in
/// lexical order, as the classifier emitted them.
fn new_children(node: &ForestNode) -> Vec<&ForestNode> {
    node.children.iter().chain(node.else_children.iter()).collect()
}

fn new_texts(node: &ForestNode) -> Vec<&str> {
    node.block.statements.iter().map(|s| s.text.as_str()).collect()
}

/// Match one sibling level, then recurse into paired subtrees.
fn match_level(prev: &[PrevNode], new: &[&ForestNode], map: &mut HashMap<BlockId, BlockId>) {
    let mut taken = vec![false; prev.len()];
    let mut paired: Vec<Option<&PrevNode>> = vec![None; new.len()];

    // Pass 1: identical kind and statement texts, in order.
    for (ni, node) in new.iter().enumerate() {
        let texts = new_texts(node);
        for (pi, candidate) in prev.iter().enumerate() {
            if taken[pi] || candidate.kind != node.block.kind {
                continue;
            }
            if candidate.texts.iter().map(String::as_str).eq(texts.iter().copied()) {
                taken[pi] = true;
                paired[ni] = Some(candidate);
                break;
            }
        }
    }

    // Pass 2: leftovers by position and kind, so edits keep identity.
    let mut free: Vec<usize> = (0..prev.len()).filter(|&pi| !taken[pi]).collect();
    for (ni, node) in new.iter().enumerate() {
        if paired[ni].is_some() {
            continue;
        }
        if let Some(pos) = free
            .iter()
            .position(|&pi| prev[pi].kind == node.block.kind)
        {
            let pi = free.remove(pos);
            paired[ni] = Some(&prev[pi]);
        }
    }

    for (ni, node) in new.iter().enumerate() {
        if let Some(candidate) = paired[ni] {
            map.insert(node.block.id, candidate.id);
            match_level(&candidate.children, &new_children(node), map);
        }
    }
}

/// Map provisional ids of `forest` to the stable ids of `previous`.
///
/// The result covers matched blocks only; unmatched provisional ids
/// are absent and need fresh allocations.
pub fn match_blocks(previous: &ControlFlowGraph, forest: &BlockForest) -> HashMap<BlockId, BlockId> {
    let prev_roots = previous_tree(previous);
    let new_roots: Vec<&ForestNode> = forest.roots.iter().collect();
    let mut map = HashMap::new();
    match_level(&prev_roots, &new_roots, &mut map);
    map
}
