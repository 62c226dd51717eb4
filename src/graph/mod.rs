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

//! Control-flow graph builder for the Blockflow engine.
//!
//! Walks the classified block forest depth-first and materializes typed
//! edges:
//! - SEQUENTIAL between consecutive siblings (and into loop bodies)
//! - BRANCH_TRUE / BRANCH_FALSE out of BRANCH headers, the false edge
//!   synthesized to the post-branch block when there is no else arm
//! - LOOP_BACK from the body's last block to its dominating header and
//!   LOOP_EXIT from the header to the block following the loop
//! - branch arms merge forward to the block following the BRANCH
//!
//! Where no lexically-following block exists the fall-through edge is
//! omitted and the open exit counts as implicit function termination.

use log::error;

use crate::classify::{BlockForest, ForestNode};
use crate::error::{AnalyzeError, ErrorCode, Result};
use crate::model::{BlockId, BlockKind, ControlFlowGraph, EdgeKind};

/// Where control continues after the last block of a sequence, and with
/// which edge kind. Inside a loop body the continuation is the header
/// itself with a LOOP_BACK kind.
#[derive(Debug, Clone, Copy)]
struct Continuation {
    target: Option<BlockId>,
    kind: EdgeKind,
}

impl Continuation {
    fn none() -> Self {
        Self {
            target: None,
            kind: EdgeKind::Sequential,
        }
    }

    fn sequential(target: BlockId) -> Self {
        Self {
            target: Some(target),
            kind: EdgeKind::Sequential,
        }
    }

    fn loop_back(header: BlockId) -> Self {
        Self {
            target: Some(header),
            kind: EdgeKind::LoopBack,
        }
    }
}

/// Emit edges for one sequence of sibling nodes.
fn link_sequence(graph: &mut ControlFlowGraph, nodes: &[ForestNode], after: Continuation) {
    for (i, node) in nodes.iter().enumerate() {
        let continuation = match nodes.get(i + 1) {
            Some(next) => Continuation::sequential(next.block.id),
            None => after,
        };
        link_node(graph, node, continuation);
    }
}

/// Emit the outgoing edges of one node and recurse into its body.
fn link_node(graph: &mut ControlFlowGraph, node: &ForestNode, continuation: Continuation) {
    let id = node.block.id;
    match node.block.kind {
        BlockKind::Start | BlockKind::Activity => {
            if let Some(target) = continuation.target {
                graph.add_edge(id, target, continuation.kind);
            }
        }
        // Terminal: the only exit is the implicit function exit.
        BlockKind::End => {}
        BlockKind::Loop => {
            if let Some(entry) = node.children.first() {
                graph.add_edge(id, entry.block.id, EdgeKind::Sequential);
            }
            if let Some(target) = continuation.target {
                // A loop that ends an enclosing loop's body falls
                // through to the outer header: that is the outer back
                // edge, not an exit to a lexical follower.
                let kind = if continuation.kind == EdgeKind::LoopBack {
                    EdgeKind::LoopBack
                } else {
                    EdgeKind::LoopExit
                };
                graph.add_edge(id, target, kind);
            }
            link_sequence(graph, &node.children, Continuation::loop_back(id));
        }
        BlockKind::Branch => {
            if let Some(entry) = node.children.first() {
                graph.add_edge(id, entry.block.id, EdgeKind::BranchTrue);
            }
            if let Some(alt) = node.else_children.first() {
                graph.add_edge(id, alt.block.id, EdgeKind::BranchFalse);
            } else if let Some(target) = continuation.target {
                // No else arm: synthesize the false edge to the block
                // that lexically follows the branch.
                graph.add_edge(id, target, EdgeKind::BranchFalse);
            }
            link_sequence(graph, &node.children, continuation);
            link_sequence(graph, &node.else_children, continuation);
        }
    }
}

/// Check the structural guarantees of a finished graph.
///
/// A non-START block with in-degree 0 signals a classifier defect, not a
/// user syntax error; it is logged and reported as `UnreachableBlock`.
fn validate(graph: &ControlFlowGraph) -> Result<()> {
    for block in graph.blocks_in_order() {
        if block.kind == BlockKind::Start {
            continue;
        }
        if graph.in_degree(block.id) == 0 {
            let line = block.first_line().unwrap_or(0);
            error!(
                "internal defect: block {} ({}) at line {} has no incoming edge",
                block.id, block.kind, line
            );
            return Err(AnalyzeError::new(
                ErrorCode::UnreachableBlock,
                format!("Block {} ({}) has no incoming edge", block.id, block.kind),
                line,
            ));
        }
    }
    Ok(())
}

/// Build the control-flow graph for a classified block forest.
pub fn build_graph(forest: &BlockForest) -> Result<ControlFlowGraph> {
    let mut graph = ControlFlowGraph::new();
    forest.for_each_block(&mut |block| graph.add_block(block.clone()));
    link_sequence(&mut graph, &forest.roots, Continuation::none());
    validate(&graph)?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::model::Edge;
    use crate::stream::tokenize;
    use pretty_assertions::assert_eq;

    fn graph_for(source: &str) -> ControlFlowGraph {
        build_graph(&classify(&tokenize(source).unwrap()).unwrap()).unwrap()
    }

    fn edge_kinds_from(graph: &ControlFlowGraph, id: BlockId) -> Vec<EdgeKind> {
        graph.outgoing(id).map(|e| e.kind).collect()
    }

    // ========================================
    // Sequential Flow Tests
    // ========================================

    #[test]
    fn test_straight_line_edges() {
        let graph = graph_for("def f():\n    x = 1\n    return x");
        let ids = graph.order.clone();
        assert_eq!(
            graph.edges,
            vec![
                Edge {
                    from: ids[0],
                    to: ids[1],
                    kind: EdgeKind::Sequential
                },
                Edge {
                    from: ids[1],
                    to: ids[2],
                    kind: EdgeKind::Sequential
                },
            ]
        );
    }

    #[test]
    fn test_end_block_is_terminal() {
        let graph = graph_for("def f():\n    x = 1\n    return x");
        let end = graph.order[2];
        assert_eq!(graph.outgoing(end).count(), 0);
    }

    #[test]
    fn test_start_in_degree_zero() {
        let graph = graph_for("def f():\n    while x:\n        x = x - 1\n    return x");
        let start = graph.start_block().unwrap().id;
        assert_eq!(graph.in_degree(start), 0);
        for block in graph.blocks_in_order() {
            if block.id != start {
                assert!(graph.in_degree(block.id) >= 1, "{} unreachable", block.id);
            }
        }
    }

    // ========================================
    // Loop Edge Tests
    // ========================================

    #[test]
    fn test_loop_edges() {
        let graph = graph_for("def f():\n    while x > 0:\n        x = x - 1\n    return x");
        let loop_id = graph.order[1];
        let body = graph.order[2];
        let end = graph.order[3];

        let mut kinds = edge_kinds_from(&graph, loop_id);
        kinds.sort_by_key(|k| k.name());
        assert_eq!(kinds, vec![EdgeKind::LoopExit, EdgeKind::Sequential]);
        assert!(graph.edges.contains(&Edge {
            from: loop_id,
            to: body,
            kind: EdgeKind::Sequential
        }));
        assert!(graph.edges.contains(&Edge {
            from: loop_id,
            to: end,
            kind: EdgeKind::LoopExit
        }));
        assert!(graph.edges.contains(&Edge {
            from: body,
            to: loop_id,
            kind: EdgeKind::LoopBack
        }));
    }

    #[test]
    fn test_loop_back_targets_dominating_header() {
        let source = "def f():\n    while a:\n        while b:\n            x = 1\n        y = 2\n    return y";
        let graph = graph_for(source);
        let outer = graph.order[1];
        let inner = graph.order[2];
        let inner_body = graph.order[3];
        let after_inner = graph.order[4];

        assert!(graph.edges.contains(&Edge {
            from: inner_body,
            to: inner,
            kind: EdgeKind::LoopBack
        }));
        assert!(graph.edges.contains(&Edge {
            from: after_inner,
            to: outer,
            kind: EdgeKind::LoopBack
        }));
        assert!(graph.edges.contains(&Edge {
            from: inner,
            to: after_inner,
            kind: EdgeKind::LoopExit
        }));
    }

    #[test]
    fn test_trailing_inner_loop_falls_back_to_outer_header() {
        let graph = graph_for("def f(n):\n    while n:\n        while n:\n            n = n - 1");
        let outer = graph.order[1];
        let inner = graph.order[2];

        // The inner loop ends the outer body, so leaving it re-enters
        // the outer header via the outer back edge.
        assert!(graph.edges.contains(&Edge {
            from: inner,
            to: outer,
            kind: EdgeKind::LoopBack
        }));
        assert!(
            !graph
                .edges
                .iter()
                .any(|e| e.from == inner && e.kind == EdgeKind::LoopExit),
            "no lexical follower, no exit edge"
        );
        let body = graph.order[3];
        assert_eq!(
            graph.edges,
            vec![
                Edge {
                    from: graph.order[0],
                    to: outer,
                    kind: EdgeKind::Sequential
                },
                Edge {
                    from: outer,
                    to: inner,
                    kind: EdgeKind::Sequential
                },
                Edge {
                    from: inner,
                    to: body,
                    kind: EdgeKind::Sequential
                },
                Edge {
                    from: inner,
                    to: outer,
                    kind: EdgeKind::LoopBack
                },
                Edge {
                    from: body,
                    to: inner,
                    kind: EdgeKind::LoopBack
                },
            ]
        );
    }

    #[test]
    fn test_empty_loop_body_placeholder_wired() {
        let graph = graph_for("def f():\n    while x:\n    return x");
        let loop_id = graph.order[1];
        let placeholder = graph.order[2];
        assert!(graph.block(placeholder).unwrap().statements.is_empty());
        assert!(graph.edges.contains(&Edge {
            from: loop_id,
            to: placeholder,
            kind: EdgeKind::Sequential
        }));
        assert!(graph.edges.contains(&Edge {
            from: placeholder,
            to: loop_id,
            kind: EdgeKind::LoopBack
        }));
    }

    // ========================================
    // Branch Edge Tests
    // ========================================

    #[test]
    fn test_branch_with_else() {
        let source =
            "def f():\n    if x:\n        a = 1\n    else:\n        b = 2\n    return a";
        let graph = graph_for(source);
        let branch = graph.order[1];
        let true_arm = graph.order[2];
        let else_arm = graph.order[3];
        let end = graph.order[4];

        assert!(graph.edges.contains(&Edge {
            from: branch,
            to: true_arm,
            kind: EdgeKind::BranchTrue
        }));
        assert!(graph.edges.contains(&Edge {
            from: branch,
            to: else_arm,
            kind: EdgeKind::BranchFalse
        }));
        // Both arms merge to the post-branch block.
        assert!(graph.edges.contains(&Edge {
            from: true_arm,
            to: end,
            kind: EdgeKind::Sequential
        }));
        assert!(graph.edges.contains(&Edge {
            from: else_arm,
            to: end,
            kind: EdgeKind::Sequential
        }));
    }

    #[test]
    fn test_branch_without_else_synthesizes_false_edge() {
        let source = "def f():\n    if x:\n        a = 1\n    return a";
        let graph = graph_for(source);
        let branch = graph.order[1];
        let end = graph.order[3];

        assert!(graph.edges.contains(&Edge {
            from: branch,
            to: end,
            kind: EdgeKind::BranchFalse
        }));
        let kinds = edge_kinds_from(&graph, branch);
        assert!(kinds.contains(&EdgeKind::BranchTrue));
        assert!(kinds.contains(&EdgeKind::BranchFalse));
        assert_eq!(kinds.len(), 2);
    }

    #[test]
    fn test_return_in_arm_has_no_merge_edge() {
        let source =
            "def f():\n    if x:\n        return 1\n    else:\n        b = 2\n    return b";
        let graph = graph_for(source);
        let true_end = graph.order[2];
        assert_eq!(graph.block(true_end).unwrap().kind, BlockKind::End);
        assert_eq!(graph.outgoing(true_end).count(), 0);
    }

    #[test]
    fn test_branch_last_in_loop_merges_back() {
        let source = "def f():\n    while a:\n        if b:\n            x = 1\n    return x";
        let graph = graph_for(source);
        let loop_id = graph.order[1];
        let branch = graph.order[2];
        let arm = graph.order[3];

        // The trailing branch's arm re-enters the loop.
        assert!(graph.edges.contains(&Edge {
            from: arm,
            to: loop_id,
            kind: EdgeKind::LoopBack
        }));
        // And its synthetic false edge also re-enters.
        assert!(graph.edges.contains(&Edge {
            from: branch,
            to: loop_id,
            kind: EdgeKind::BranchFalse
        }));
    }

    // ========================================
    // Validation Tests
    // ========================================

    #[test]
    fn test_code_after_return_is_unreachable() {
        let err = build_graph(
            &classify(&tokenize("def f():\n    return 1\n    x = 2").unwrap()).unwrap(),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnreachableBlock);
        assert!(err.code.is_defect());
    }

    #[test]
    fn test_empty_forest_builds_empty_graph() {
        let graph = build_graph(&BlockForest::default()).unwrap();
        assert!(graph.order.is_empty());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_start_only_graph() {
        let graph = graph_for("def f():");
        assert_eq!(graph.order.len(), 1);
        assert_eq!(graph.start_block().unwrap().kind, BlockKind::Start);
    }
}
