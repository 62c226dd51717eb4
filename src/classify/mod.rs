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

//! Block classifier for the Blockflow engine.
//!
//! The classifier consumes the statement stream and partitions it into
//! typed blocks under the division policy:
//! - FUNCTION_DEF opens the unique START block
//! - LOOP/IF headers open nested LOOP/BRANCH blocks
//! - ELSE opens the alternate arm of the immediately preceding BRANCH
//! - RETURN seals an END block
//! - PLAIN statements accumulate into contiguous ACTIVITY runs
//!
//! The open-block stack is regular recursive-descent state scoped to a
//! single `classify` call; nothing is shared between invocations.

mod forest;

pub use forest::{BlockForest, ForestNode};

use crate::error::{AnalyzeError, ErrorCode, Result};
use crate::model::{Block, BlockId, BlockKind};
use crate::stream::{StatementKind, StatementRecord};

/// One arm of an open block: its finished children plus the pending
/// ACTIVITY run and the body indentation it settled on.
#[derive(Debug, Default)]
struct Arm {
    children: Vec<ForestNode>,
    activity: Vec<StatementRecord>,
    body_indent: Option<usize>,
}

impl Arm {
    fn new() -> Self {
        Self::default()
    }
}

/// An open LOOP or BRANCH block on the classifier stack.
#[derive(Debug)]
struct Frame {
    header: Block,
    header_indent: usize,
    true_arm: Arm,
    else_arm: Option<Arm>,
}

impl Frame {
    fn active_arm_mut(&mut self) -> &mut Arm {
        match self.else_arm.as_mut() {
            Some(arm) => arm,
            None => &mut self.true_arm,
        }
    }
}

/// The classifier state for a single `classify` invocation.
struct Classifier {
    frames: Vec<Frame>,
    root: Arm,
    next_id: u64,
    start_emitted: bool,
    func_indent: usize,
}

impl Classifier {
    fn new() -> Self {
        Self {
            frames: Vec::new(),
            root: Arm::new(),
            next_id: 0,
            start_emitted: false,
            func_indent: 0,
        }
    }

    fn alloc(&mut self) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Depth of blocks appended to the current arm.
    fn current_depth(&self) -> usize {
        self.frames.len()
    }

    /// Enclosing header of the current arm.
    fn current_parent(&self) -> Option<BlockId> {
        self.frames.last().map(|f| f.header.id)
    }

    fn current_arm_mut(&mut self) -> &mut Arm {
        match self.frames.last_mut() {
            Some(frame) => frame.active_arm_mut(),
            None => &mut self.root,
        }
    }

    /// Close the pending ACTIVITY run of the current arm, if any.
    /// A run with no statements is elided, never emitted.
    fn flush_current_activity(&mut self) {
        let depth = self.current_depth();
        let parent = self.current_parent();
        let run = std::mem::take(&mut self.current_arm_mut().activity);
        if run.is_empty() {
            return;
        }
        let id = self.alloc();
        let node = ForestNode::leaf(Block {
            id,
            kind: BlockKind::Activity,
            statements: run,
            depth,
            parent,
        });
        self.current_arm_mut().children.push(node);
    }

    /// Empty ACTIVITY placeholder so an empty LOOP/BRANCH body still has
    /// a node for the graph builder to attach edges to.
    fn placeholder(&mut self, depth: usize, parent: Option<BlockId>) -> ForestNode {
        let id = self.alloc();
        ForestNode::leaf(Block {
            id,
            kind: BlockKind::Activity,
            statements: Vec::new(),
            depth,
            parent,
        })
    }

    /// Close the topmost open LOOP/BRANCH, attaching it to its parent arm.
    fn close_top_frame(&mut self) {
        let mut frame = self.frames.pop().expect("no open frame to close");
        let depth = frame.header.depth + 1;
        let parent = Some(frame.header.id);

        // The true arm's run is still pending unless an else arm took over.
        let run = std::mem::take(&mut frame.true_arm.activity);
        if !run.is_empty() {
            let id = self.alloc();
            frame.true_arm.children.push(ForestNode::leaf(Block {
                id,
                kind: BlockKind::Activity,
                statements: run,
                depth,
                parent,
            }));
        }
        if let Some(else_arm) = frame.else_arm.as_mut() {
            let run = std::mem::take(&mut else_arm.activity);
            if !run.is_empty() {
                let id = self.alloc();
                else_arm.children.push(ForestNode::leaf(Block {
                    id,
                    kind: BlockKind::Activity,
                    statements: run,
                    depth,
                    parent,
                }));
            }
        }

        let mut children = frame.true_arm.children;
        if children.is_empty() {
            children.push(self.placeholder(depth, parent));
        }
        let else_children = match frame.else_arm {
            Some(arm) => {
                let mut nodes = arm.children;
                if nodes.is_empty() {
                    nodes.push(self.placeholder(depth, parent));
                }
                nodes
            }
            None => Vec::new(),
        };

        let node = ForestNode {
            block: frame.header,
            children,
            else_children,
        };
        self.current_arm_mut().children.push(node);
    }

    /// Handle the first statement, which must open the analyzed function.
    fn push_first_statement(&mut self, stmt: &StatementRecord) -> Result<()> {
        match stmt.kind {
            StatementKind::FunctionDef => {
                if !stmt.has_colon() {
                    return Err(missing_colon(stmt));
                }
                self.func_indent = stmt.indent;
                let id = self.alloc();
                self.root.children.push(ForestNode::leaf(Block {
                    id,
                    kind: BlockKind::Start,
                    statements: vec![stmt.clone()],
                    depth: 0,
                    parent: None,
                }));
                self.start_emitted = true;
                Ok(())
            }
            kind if kind.opens_block() && !stmt.has_colon() => Err(missing_colon(stmt)),
            _ => Err(AnalyzeError::new(
                ErrorCode::SyntaxMismatch,
                "Expected a function definition",
                stmt.source_line,
            )
            .with_hint("Analysis starts at a 'def name():' header")),
        }
    }

    /// Close frames the statement de-indents past, or hand an `else`
    /// header to the BRANCH it belongs to.
    ///
    /// Returns `true` when the statement was consumed as an else header.
    fn unwind_to(&mut self, stmt: &StatementRecord) -> Result<bool> {
        while let Some(frame) = self.frames.last() {
            if stmt.indent > frame.header_indent {
                break;
            }

            let takes_else = stmt.kind == StatementKind::ElseHeader
                && stmt.indent == frame.header_indent
                && frame.header.kind == BlockKind::Branch
                && frame.else_arm.is_none();
            if takes_else {
                if !stmt.has_colon() {
                    return Err(missing_colon(stmt));
                }
                self.flush_current_activity();
                let frame = self.frames.last_mut().expect("frame vanished");
                frame.header.statements.push(stmt.clone());
                frame.else_arm = Some(Arm::new());
                return Ok(true);
            }

            self.close_top_frame();
        }
        Ok(false)
    }

    /// Validate the statement's indentation against the current arm.
    fn check_indent(&mut self, stmt: &StatementRecord) -> Result<()> {
        if self.frames.is_empty() && stmt.indent <= self.func_indent {
            return Err(AnalyzeError::new(
                ErrorCode::SyntaxMismatch,
                "Statement outside the function body",
                stmt.source_line,
            ));
        }

        let arm = self.current_arm_mut();
        match arm.body_indent {
            None => {
                arm.body_indent = Some(stmt.indent);
                Ok(())
            }
            Some(expected) if stmt.indent == expected => Ok(()),
            Some(expected) if stmt.indent > expected => Err(AnalyzeError::new(
                ErrorCode::UnterminatedBlock,
                format!(
                    "Unexpected indentation ({} spaces, block uses {})",
                    stmt.indent, expected
                ),
                stmt.source_line,
            )),
            Some(expected) => Err(AnalyzeError::new(
                ErrorCode::UnterminatedBlock,
                format!(
                    "Inconsistent de-indent ({} spaces does not match any open block, expected {})",
                    stmt.indent, expected
                ),
                stmt.source_line,
            )),
        }
    }

    fn push_statement(&mut self, stmt: &StatementRecord) -> Result<()> {
        if !self.start_emitted {
            return self.push_first_statement(stmt);
        }
        if stmt.kind == StatementKind::FunctionDef {
            return Err(AnalyzeError::new(
                ErrorCode::SyntaxMismatch,
                "Only one function definition is analyzed per pass",
                stmt.source_line,
            ));
        }

        if self.unwind_to(stmt)? {
            return Ok(());
        }
        if stmt.kind == StatementKind::ElseHeader {
            return Err(AnalyzeError::new(
                ErrorCode::DanglingElse,
                "'else' without a matching 'if' at the same depth",
                stmt.source_line,
            ));
        }
        self.check_indent(stmt)?;

        match stmt.kind {
            StatementKind::Plain => {
                self.current_arm_mut().activity.push(stmt.clone());
                Ok(())
            }
            StatementKind::Return => {
                self.flush_current_activity();
                let depth = self.current_depth();
                let parent = self.current_parent();
                let id = self.alloc();
                self.current_arm_mut().children.push(ForestNode::leaf(Block {
                    id,
                    kind: BlockKind::End,
                    statements: vec![stmt.clone()],
                    depth,
                    parent,
                }));
                Ok(())
            }
            StatementKind::LoopHeader | StatementKind::IfHeader => {
                if !stmt.has_colon() {
                    return Err(missing_colon(stmt));
                }
                self.flush_current_activity();
                let depth = self.current_depth();
                let parent = self.current_parent();
                let id = self.alloc();
                let kind = if stmt.kind == StatementKind::LoopHeader {
                    BlockKind::Loop
                } else {
                    BlockKind::Branch
                };
                self.frames.push(Frame {
                    header: Block {
                        id,
                        kind,
                        statements: vec![stmt.clone()],
                        depth,
                        parent,
                    },
                    header_indent: stmt.indent,
                    true_arm: Arm::new(),
                    else_arm: None,
                });
                Ok(())
            }
            StatementKind::FunctionDef | StatementKind::ElseHeader => {
                unreachable!("handled before dispatch")
            }
        }
    }

    fn finish(mut self) -> Result<BlockForest> {
        // End of input closes all open nesting, Python-style.
        while !self.frames.is_empty() {
            self.close_top_frame();
        }
        self.flush_current_activity();
        Ok(BlockForest {
            roots: self.root.children,
        })
    }
}

fn missing_colon(stmt: &StatementRecord) -> AnalyzeError {
    AnalyzeError::new(
        ErrorCode::UnterminatedBlock,
        format!(
            "Header is missing its ':' structural closer: '{}'",
            stmt.text
        ),
        stmt.source_line,
    )
    .with_hint("Block headers end with ':'")
}

/// Classify a statement stream into an ordered forest of typed blocks.
///
/// Ids in the returned forest are provisional (0..n in lexical order);
/// the analysis session rewrites them for identity preservation.
pub fn classify(statements: &[StatementRecord]) -> Result<BlockForest> {
    let mut classifier = Classifier::new();
    for stmt in statements {
        classifier.push_statement(stmt)?;
    }
    classifier.finish()
}
