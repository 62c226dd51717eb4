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

//! Core data model for the Blockflow engine.
//!
//! This module defines the block, graph and variable structures shared by
//! the classifier, graph builder, tracker, session and exporter. The CFG
//! is an arena of blocks indexed by id plus a flat edge list - never a
//! cyclic object graph with back-pointers - which keeps ownership simple
//! and serialization trivial.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::stream::StatementRecord;

/// The single interchange schema version this build reads and writes.
pub const SCHEMA_VERSION: u32 = 1;

/// A stable block identity.
///
/// Assigned at block creation and preserved across incremental
/// re-analysis for structurally unchanged blocks, so external references
/// (selection, breakpoints) stay valid under trivial edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub u64);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b{}", self.0)
    }
}

impl BlockId {
    /// Parse the interchange string form (`"b<num>"`).
    pub fn parse(text: &str) -> Option<Self> {
        text.strip_prefix('b')?.parse().ok().map(BlockId)
    }
}

/// The block type under the division policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Unique function entry; holds the function header statement.
    Start,
    /// Re-entrant loop header.
    Loop,
    /// Conditional header with true and optional else arms.
    Branch,
    /// Path terminator; holds exactly one RETURN statement.
    End,
    /// Contiguous run of plain statements.
    Activity,
}

impl BlockKind {
    /// Get the schema name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Start => "START",
            BlockKind::Loop => "LOOP",
            BlockKind::Branch => "BRANCH",
            BlockKind::End => "END",
            BlockKind::Activity => "ACTIVITY",
        }
    }

    /// Parse a schema name back into a kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "START" => Some(BlockKind::Start),
            "LOOP" => Some(BlockKind::Loop),
            "BRANCH" => Some(BlockKind::Branch),
            "END" => Some(BlockKind::End),
            "ACTIVITY" => Some(BlockKind::Activity),
            _ => None,
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A contiguous, typed unit of source statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// The stable block identity.
    pub id: BlockId,
    /// The block type.
    pub kind: BlockKind,
    /// The statements this block holds, in source order. Empty only for
    /// the placeholder child of an empty LOOP/BRANCH body.
    pub statements: Vec<StatementRecord>,
    /// Loop/branch nesting depth; the function body is depth 0.
    pub depth: usize,
    /// The enclosing LOOP/BRANCH block, if any.
    pub parent: Option<BlockId>,
}

impl Block {
    /// First source line of this block, if it holds any statement.
    pub fn first_line(&self) -> Option<usize> {
        self.statements.first().map(|s| s.source_line)
    }
}

/// A typed control-flow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Fall-through between consecutive blocks (includes loop entry and
    /// branch-merge edges).
    Sequential,
    /// Branch taken when the condition holds.
    BranchTrue,
    /// Branch taken otherwise; synthetic when the branch has no else arm.
    BranchFalse,
    /// Re-entrant edge from a loop body back to its dominating header.
    LoopBack,
    /// Edge from a loop header to the block lexically following the loop.
    LoopExit,
}

impl EdgeKind {
    /// Get the schema name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            EdgeKind::Sequential => "SEQUENTIAL",
            EdgeKind::BranchTrue => "BRANCH_TRUE",
            EdgeKind::BranchFalse => "BRANCH_FALSE",
            EdgeKind::LoopBack => "LOOP_BACK",
            EdgeKind::LoopExit => "LOOP_EXIT",
        }
    }

    /// Parse a schema name back into a kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SEQUENTIAL" => Some(EdgeKind::Sequential),
            "BRANCH_TRUE" => Some(EdgeKind::BranchTrue),
            "BRANCH_FALSE" => Some(EdgeKind::BranchFalse),
            "LOOP_BACK" => Some(EdgeKind::LoopBack),
            "LOOP_EXIT" => Some(EdgeKind::LoopExit),
            _ => None,
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A directed edge between two blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Source block.
    pub from: BlockId,
    /// Target block.
    pub to: BlockId,
    /// Edge type.
    pub kind: EdgeKind,
}

/// The control-flow graph: an arena of blocks plus typed edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlFlowGraph {
    /// Block ids in lexical order; the interchange block array follows it.
    pub order: Vec<BlockId>,
    /// The block arena.
    pub blocks: HashMap<BlockId, Block>,
    /// The edge set, in emission order, without duplicates.
    pub edges: Vec<Edge>,
}

impl ControlFlowGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block to the arena, recording its lexical position.
    pub fn add_block(&mut self, block: Block) {
        self.order.push(block.id);
        self.blocks.insert(block.id, block);
    }

    /// Add an edge, ignoring exact duplicates.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId, kind: EdgeKind) {
        let edge = Edge { from, to, kind };
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }

    /// Look up a block by id.
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    /// Blocks in lexical order.
    pub fn blocks_in_order(&self) -> impl Iterator<Item = &Block> {
        self.order.iter().filter_map(|id| self.blocks.get(id))
    }

    /// The unique START block, if present.
    pub fn start_block(&self) -> Option<&Block> {
        self.blocks_in_order()
            .find(|b| b.kind == BlockKind::Start)
    }

    /// Number of incoming edges of a block.
    pub fn in_degree(&self, id: BlockId) -> usize {
        self.edges.iter().filter(|e| e.to == id).count()
    }

    /// Outgoing edges of a block.
    pub fn outgoing(&self, id: BlockId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.from == id)
    }

    /// Direct children of a block (blocks whose parent is `id`), in
    /// lexical order.
    pub fn children_of(&self, id: BlockId) -> Vec<BlockId> {
        self.blocks_in_order()
            .filter(|b| b.parent == Some(id))
            .map(|b| b.id)
            .collect()
    }

    /// Root-level blocks (no parent), in lexical order.
    pub fn roots(&self) -> Vec<BlockId> {
        self.blocks_in_order()
            .filter(|b| b.parent.is_none())
            .map(|b| b.id)
            .collect()
    }
}

/// Per-variable record of definition and use sites, keyed by block id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRecord {
    /// The variable name.
    pub name: String,
    /// Blocks in which an assignment or parameter binding defines it.
    pub definitions: BTreeSet<BlockId>,
    /// Blocks in which a read reference appears.
    pub uses: BTreeSet<BlockId>,
}

impl VariableRecord {
    /// Create an empty record for a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definitions: BTreeSet::new(),
            uses: BTreeSet::new(),
        }
    }
}

/// One record per distinct name observed in the analyzed function,
/// ordered by name for deterministic export.
pub type VariableTable = BTreeMap<String, VariableRecord>;

/// An immutable analysis snapshot: CFG plus variable table.
///
/// Owned by the analysis session; the shell and exporter receive
/// read-only views and never mutate it in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    /// The control-flow graph.
    pub graph: ControlFlowGraph,
    /// The variable table.
    pub variables: VariableTable,
    /// The interchange schema version this result conforms to.
    pub schema_version: u32,
}

impl AnalysisResult {
    /// Wrap a graph and variable table into a result at the current
    /// schema version.
    pub fn new(graph: ControlFlowGraph, variables: VariableTable) -> Self {
        Self {
            graph,
            variables,
            schema_version: SCHEMA_VERSION,
        }
    }
}
