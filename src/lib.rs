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

//! # Blockflow
//!
//! An incremental structural-analysis engine for a restricted,
//! indentation-based statement syntax. Source text goes through a
//! fixed pipeline:
//!
//! 1. [`stream`] - tokenize into classified statement records
//! 2. [`classify`] - group statements into typed blocks
//! 3. [`graph`] - materialize the control-flow graph with typed edges
//! 4. [`vars`] - index variable definition and use sites per block
//! 5. [`session`] - re-run the pipeline on edits, preserving block ids
//! 6. [`export`] - JSON interchange, schema version 1
//!
//! One-shot callers use [`analyze`]; editors keep an
//! [`AnalysisSession`] and call [`AnalysisSession::reanalyze`] per
//! change so block ids stay stable across edits.

pub mod classify;
pub mod error;
pub mod export;
pub mod graph;
pub mod model;
pub mod session;
pub mod stream;
pub mod vars;

pub use classify::{classify, BlockForest};
pub use error::{format_error, AnalyzeError, ErrorCode, Result};
pub use export::{export_json, import_json};
pub use graph::build_graph;
pub use model::{
    AnalysisResult, Block, BlockId, BlockKind, ControlFlowGraph, Edge, EdgeKind, VariableRecord,
    VariableTable, SCHEMA_VERSION,
};
pub use session::AnalysisSession;
pub use stream::{tokenize, StatementKind, StatementRecord};
pub use vars::track_variables;

/// The name of this tool.
pub const NAME: &str = "blockflow";

/// The version of this tool.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the full pipeline once over `source`.
///
/// Block ids are assigned fresh from zero. For stable ids across
/// repeated analyses of an evolving document, use
/// [`AnalysisSession`] instead.
pub fn analyze(source: &str) -> Result<AnalysisResult> {
    let records = tokenize(source)?;
    let forest = classify(&records)?;
    let graph = build_graph(&forest)?;
    let variables = track_variables(&forest);
    Ok(AnalysisResult::new(graph, variables))
}
