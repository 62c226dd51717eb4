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

//! Conformance tests for the analysis pipeline.
//!
//! Each test pins down the exact block and edge shape a documented
//! source pattern must produce, end to end through `analyze`.

use blockflow::{analyze, BlockId, BlockKind, EdgeKind};
use pretty_assertions::assert_eq;

fn kinds(source: &str) -> Vec<BlockKind> {
    analyze(source)
        .unwrap()
        .graph
        .blocks_in_order()
        .map(|b| b.kind)
        .collect()
}

fn edge_kinds_from(source: &str, from: BlockId) -> Vec<EdgeKind> {
    let result = analyze(source).unwrap();
    let mut out: Vec<EdgeKind> = result.graph.outgoing(from).map(|e| e.kind).collect();
    out.sort_by_key(|k| k.name());
    out
}

// ============================================================================
// Straight-Line Programs
// ============================================================================

#[test]
fn test_minimal_function_block_shape() {
    let result = analyze("def f():\n    x = 1\n    return x").unwrap();

    let blocks: Vec<_> = result.graph.blocks_in_order().collect();
    assert_eq!(blocks.len(), 3);

    assert_eq!(blocks[0].kind, BlockKind::Start);
    assert_eq!(blocks[0].depth, 0);
    assert_eq!(blocks[0].parent, None);

    assert_eq!(blocks[1].kind, BlockKind::Activity);
    assert_eq!(blocks[1].depth, 0);
    assert_eq!(blocks[1].statements[0].text, "x = 1");

    assert_eq!(blocks[2].kind, BlockKind::End);
    assert_eq!(blocks[2].depth, 0);
    assert_eq!(blocks[2].statements[0].text, "return x");
}

#[test]
fn test_minimal_function_variable_table() {
    let result = analyze("def f():\n    x = 1\n    return x").unwrap();

    let activity_id = result.graph.order[1];
    let end_id = result.graph.order[2];
    let record = &result.variables["x"];

    assert_eq!(
        record.definitions.iter().copied().collect::<Vec<_>>(),
        vec![activity_id]
    );
    assert_eq!(record.uses.iter().copied().collect::<Vec<_>>(), vec![end_id]);
}

#[test]
fn test_contiguous_plain_run_is_one_activity() {
    assert_eq!(
        kinds("def f():\n    a = 1\n    b = 2\n    c = 3"),
        vec![BlockKind::Start, BlockKind::Activity]
    );
}

#[test]
fn test_end_block_is_terminal() {
    let result = analyze("def f():\n    return 1").unwrap();
    let end_id = result.graph.order[1];
    assert_eq!(result.graph.outgoing(end_id).count(), 0);
}

#[test]
fn test_each_return_is_its_own_end_block() {
    assert_eq!(
        kinds("def f(x):\n    if x:\n        return 1\n    return 2"),
        vec![
            BlockKind::Start,
            BlockKind::Branch,
            BlockKind::End,
            BlockKind::End
        ]
    );
}

// ============================================================================
// Branch Shapes
// ============================================================================

#[test]
fn test_branch_without_else_synthesizes_false_edge() {
    let source = "def f(x):\n    if x:\n        y = 1\n    z = 2";
    let result = analyze(source).unwrap();

    let branch = result
        .graph
        .blocks_in_order()
        .find(|b| b.kind == BlockKind::Branch)
        .unwrap();
    let follower = *result.graph.order.last().unwrap();

    assert_eq!(
        edge_kinds_from(source, branch.id),
        vec![EdgeKind::BranchFalse, EdgeKind::BranchTrue]
    );
    assert!(
        result
            .graph
            .outgoing(branch.id)
            .any(|e| e.kind == EdgeKind::BranchFalse && e.to == follower),
        "the synthetic false edge targets the post-branch block"
    );
}

#[test]
fn test_branch_with_else_has_both_arm_edges() {
    let source = "def f(x):\n    if x:\n        y = 1\n    else:\n        y = 2";
    let result = analyze(source).unwrap();
    let branch = result
        .graph
        .blocks_in_order()
        .find(|b| b.kind == BlockKind::Branch)
        .unwrap();

    assert_eq!(
        edge_kinds_from(source, branch.id),
        vec![EdgeKind::BranchFalse, EdgeKind::BranchTrue]
    );
    // Both arms are children of the branch, one level deeper.
    for child in result.graph.children_of(branch.id) {
        let block = result.graph.block(child).unwrap();
        assert_eq!(block.depth, branch.depth + 1);
        assert_eq!(block.parent, Some(branch.id));
    }
}

#[test]
fn test_else_header_joins_branch_statements() {
    let result = analyze("def f(x):\n    if x:\n        y = 1\n    else:\n        y = 2").unwrap();
    let branch = result
        .graph
        .blocks_in_order()
        .find(|b| b.kind == BlockKind::Branch)
        .unwrap();

    let texts: Vec<&str> = branch.statements.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["if x:", "else:"]);
}

#[test]
fn test_branch_arms_merge_into_follower() {
    let source = "def f(x):\n    if x:\n        y = 1\n    else:\n        y = 2\n    return y";
    let result = analyze(source).unwrap();
    let end_id = *result.graph.order.last().unwrap();
    assert_eq!(result.graph.in_degree(end_id), 2, "both arms reach the return");
}

// ============================================================================
// Loop Shapes
// ============================================================================

#[test]
fn test_loop_has_one_back_and_one_exit_edge() {
    let source = "def f(x):\n    while x > 0:\n        x = x - 1\n    return x";
    let result = analyze(source).unwrap();
    let loop_block = result
        .graph
        .blocks_in_order()
        .find(|b| b.kind == BlockKind::Loop)
        .unwrap();

    let back: Vec<_> = result
        .graph
        .edges
        .iter()
        .filter(|e| e.kind == EdgeKind::LoopBack && e.to == loop_block.id)
        .collect();
    let exit: Vec<_> = result
        .graph
        .outgoing(loop_block.id)
        .filter(|e| e.kind == EdgeKind::LoopExit)
        .collect();

    assert_eq!(back.len(), 1);
    assert_eq!(exit.len(), 1);
    assert_eq!(exit[0].to, *result.graph.order.last().unwrap());
}

#[test]
fn test_for_loop_classifies_like_while() {
    assert_eq!(
        kinds("def f(items):\n    for x in items:\n        y = x"),
        vec![BlockKind::Start, BlockKind::Loop, BlockKind::Activity]
    );
}

#[test]
fn test_nested_loop_back_targets_dominating_header() {
    let source = "def f(n):\n    while n:\n        while n:\n            n = n - 1";
    let result = analyze(source).unwrap();

    let loops: Vec<_> = result
        .graph
        .blocks_in_order()
        .filter(|b| b.kind == BlockKind::Loop)
        .map(|b| b.id)
        .collect();
    assert_eq!(loops.len(), 2);

    // The inner body loops back to the inner header, the inner loop to
    // the outer header.
    assert!(result
        .graph
        .edges
        .iter()
        .any(|e| e.kind == EdgeKind::LoopBack && e.to == loops[1]));
    assert!(result
        .graph
        .edges
        .iter()
        .any(|e| e.kind == EdgeKind::LoopBack && e.from == loops[1] && e.to == loops[0]));
}

#[test]
fn test_loop_body_is_child_at_deeper_depth() {
    let result = analyze("def f(x):\n    while x:\n        x = 0").unwrap();
    let loop_block = result
        .graph
        .blocks_in_order()
        .find(|b| b.kind == BlockKind::Loop)
        .unwrap();
    let children = result.graph.children_of(loop_block.id);
    assert_eq!(children.len(), 1);
    assert_eq!(
        result.graph.block(children[0]).unwrap().depth,
        loop_block.depth + 1
    );
}

// ============================================================================
// Entry Guarantee
// ============================================================================

#[test]
fn test_single_start_with_in_degree_zero() {
    let source = "def f(x):\n    if x:\n        while x:\n            x = x - 1\n    return x";
    let result = analyze(source).unwrap();

    let starts: Vec<_> = result
        .graph
        .blocks_in_order()
        .filter(|b| b.kind == BlockKind::Start)
        .collect();
    assert_eq!(starts.len(), 1);
    assert_eq!(result.graph.in_degree(starts[0].id), 0);

    for block in result.graph.blocks_in_order() {
        if block.kind != BlockKind::Start {
            assert!(
                result.graph.in_degree(block.id) >= 1,
                "block {} is unreachable",
                block.id
            );
        }
    }
}

// ============================================================================
// Statement Stream Details
// ============================================================================

#[test]
fn test_bracket_continuation_joins_logical_line() {
    let result = analyze("def f(a):\n    x = (a +\n         1)\n    return x").unwrap();
    let activity = result.graph.block(result.graph.order[1]).unwrap();
    assert_eq!(activity.statements.len(), 1);
    assert_eq!(activity.statements[0].text, "x = (a + 1)");
    assert_eq!(activity.statements[0].source_line, 2);
}

#[test]
fn test_comments_and_blank_lines_are_skipped() {
    assert_eq!(
        kinds("def f():\n\n    # setup\n    x = 1  # inline\n\n    return x"),
        vec![BlockKind::Start, BlockKind::Activity, BlockKind::End]
    );
}

#[test]
fn test_empty_loop_body_gets_placeholder_child() {
    let result = analyze("def f(x):\n    while x:").unwrap();
    let loop_block = result
        .graph
        .blocks_in_order()
        .find(|b| b.kind == BlockKind::Loop)
        .unwrap();
    let children = result.graph.children_of(loop_block.id);
    assert_eq!(children.len(), 1);
    assert!(result.graph.block(children[0]).unwrap().statements.is_empty());
}
