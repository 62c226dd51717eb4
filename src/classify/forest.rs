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

//! Pre-finalization block forest produced by the classifier.
//!
//! The forest keeps the nesting structure the graph builder and variable
//! tracker walk: LOOP/BRANCH nodes carry their body as children, BRANCH
//! nodes additionally carry an else arm. Ids inside a freshly classified
//! forest are provisional (allocated 0..n in lexical order); the analysis
//! session rewrites them through the identity-preserving diff before the
//! result is published.

use std::collections::HashMap;

use crate::model::{Block, BlockId};

/// One node of the classified forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestNode {
    /// The block at this node.
    pub block: Block,
    /// Body blocks (the true arm for BRANCH nodes).
    pub children: Vec<ForestNode>,
    /// Else-arm blocks; only ever non-empty for BRANCH nodes.
    pub else_children: Vec<ForestNode>,
}

impl ForestNode {
    /// Create a leaf node.
    pub fn leaf(block: Block) -> Self {
        Self {
            block,
            children: Vec::new(),
            else_children: Vec::new(),
        }
    }

    /// Whether this node carries an else arm.
    pub fn has_else(&self) -> bool {
        !self.else_children.is_empty()
    }
}

/// The ordered forest of classified blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockForest {
    /// Root-level nodes: the START block followed by the function body
    /// blocks at depth 0.
    pub roots: Vec<ForestNode>,
}

impl BlockForest {
    /// Visit every block depth-first in lexical order.
    pub fn for_each_block<'a>(&'a self, f: &mut impl FnMut(&'a Block)) {
        fn walk<'a>(nodes: &'a [ForestNode], f: &mut impl FnMut(&'a Block)) {
            for node in nodes {
                f(&node.block);
                walk(&node.children, f);
                walk(&node.else_children, f);
            }
        }
        walk(&self.roots, f);
    }

    /// All blocks depth-first in lexical order.
    pub fn blocks(&self) -> Vec<&Block> {
        let mut out = Vec::new();
        self.for_each_block(&mut |b| out.push(b));
        out
    }

    /// Number of blocks in the forest.
    pub fn len(&self) -> usize {
        self.blocks().len()
    }

    /// Whether the forest holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Rewrite block ids (and parent references) through a map.
    ///
    /// Ids absent from the map are left untouched. Used by the session to
    /// replace provisional classifier ids with stable identities.
    pub fn remap_ids(&mut self, map: &HashMap<BlockId, BlockId>) {
        fn walk(nodes: &mut [ForestNode], map: &HashMap<BlockId, BlockId>) {
            for node in nodes {
                if let Some(&new) = map.get(&node.block.id) {
                    node.block.id = new;
                }
                if let Some(parent) = node.block.parent {
                    if let Some(&new) = map.get(&parent) {
                        node.block.parent = Some(new);
                    }
                }
                walk(&mut node.children, map);
                walk(&mut node.else_children, map);
            }
        }
        walk(&mut self.roots, map);
    }
}
