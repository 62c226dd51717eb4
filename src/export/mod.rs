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

//! JSON interchange for analysis results.
//!
//! `schemaVersion` 1. Block ids travel as `"b<n>"` strings, blocks in
//! lexical order, variables sorted by name. Import validates before it
//! builds: unknown schema versions, duplicate block ids and dangling id
//! references are all `SchemaError` - nothing half-loaded ever reaches
//! the caller.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyzeError, ErrorCode, Result};
use crate::model::{
    AnalysisResult, Block, BlockId, BlockKind, ControlFlowGraph, EdgeKind, VariableRecord,
    VariableTable, SCHEMA_VERSION,
};
use crate::stream::{StatementKind, StatementRecord};

#[derive(Debug, Serialize, Deserialize)]
struct WireDocument {
    #[serde(rename = "schemaVersion")]
    schema_version: u32,
    blocks: Vec<WireBlock>,
    edges: Vec<WireEdge>,
    variables: Vec<WireVariable>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireBlock {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "parentId")]
    parent_id: Option<String>,
    depth: usize,
    statements: Vec<WireStatement>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireStatement {
    line: usize,
    text: String,
    kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireEdge {
    from: String,
    to: String,
    kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireVariable {
    name: String,
    definitions: Vec<String>,
    uses: Vec<String>,
}

fn schema_error(message: impl Into<String>) -> AnalyzeError {
    AnalyzeError::without_line(ErrorCode::SchemaError, message)
}

fn to_wire(result: &AnalysisResult) -> WireDocument {
    WireDocument {
        schema_version: result.schema_version,
        blocks: result
            .graph
            .blocks_in_order()
            .map(|block| WireBlock {
                id: block.id.to_string(),
                kind: block.kind.name().to_string(),
                parent_id: block.parent.map(|p| p.to_string()),
                depth: block.depth,
                statements: block
                    .statements
                    .iter()
                    .map(|s| WireStatement {
                        line: s.source_line,
                        text: s.text.clone(),
                        kind: s.kind.name().to_string(),
                    })
                    .collect(),
            })
            .collect(),
        edges: result
            .graph
            .edges
            .iter()
            .map(|e| WireEdge {
                from: e.from.to_string(),
                to: e.to.to_string(),
                kind: e.kind.name().to_string(),
            })
            .collect(),
        variables: result
            .variables
            .values()
            .map(|record| WireVariable {
                name: record.name.clone(),
                definitions: record.definitions.iter().map(BlockId::to_string).collect(),
                uses: record.uses.iter().map(BlockId::to_string).collect(),
            })
            .collect(),
    }
}

/// Serialize an analysis result into interchange JSON bytes.
pub fn export_json(result: &AnalysisResult, pretty: bool) -> Result<Vec<u8>> {
    let document = to_wire(result);
    let bytes = if pretty {
        serde_json::to_vec_pretty(&document)
    } else {
        serde_json::to_vec(&document)
    };
    bytes.map_err(|e| schema_error(format!("Serialization failed: {e}")))
}

fn parse_id(text: &str, context: &str) -> Result<BlockId> {
    BlockId::parse(text)
        .ok_or_else(|| schema_error(format!("Invalid block id '{text}' in {context}")))
}

fn require_known(id: BlockId, known: &HashSet<BlockId>, context: &str) -> Result<BlockId> {
    if known.contains(&id) {
        Ok(id)
    } else {
        Err(schema_error(format!(
            "Dangling block reference '{id}' in {context}"
        )))
    }
}

/// Deserialize interchange JSON bytes back into an analysis result.
///
/// Rejects with `SchemaError` instead of guessing: unknown versions,
/// malformed ids, duplicate block ids and references to blocks the
/// document does not declare all fail the whole import.
pub fn import_json(bytes: &[u8]) -> Result<AnalysisResult> {
    let document: WireDocument = serde_json::from_slice(bytes)
        .map_err(|e| schema_error(format!("Malformed analysis JSON: {e}")))?;

    if document.schema_version != SCHEMA_VERSION {
        return Err(schema_error(format!(
            "Unsupported schema version {} (expected {})",
            document.schema_version, SCHEMA_VERSION
        )));
    }

    let mut known = HashSet::new();
    for block in &document.blocks {
        let id = parse_id(&block.id, "blocks")?;
        if !known.insert(id) {
            return Err(schema_error(format!("Duplicate block id '{id}'")));
        }
    }

    let mut graph = ControlFlowGraph::new();
    for block in &document.blocks {
        let id = parse_id(&block.id, "blocks")?;
        let kind = BlockKind::from_name(&block.kind)
            .ok_or_else(|| schema_error(format!("Unknown block type '{}'", block.kind)))?;
        let parent = match &block.parent_id {
            Some(text) => Some(require_known(parse_id(text, "parentId")?, &known, "parentId")?),
            None => None,
        };
        let statements = block
            .statements
            .iter()
            .map(|s| {
                let kind = StatementKind::from_name(&s.kind).ok_or_else(|| {
                    schema_error(format!("Unknown statement kind '{}'", s.kind))
                })?;
                Ok(StatementRecord {
                    source_line: s.line,
                    text: s.text.clone(),
                    kind,
                    indent: 0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        graph.add_block(Block {
            id,
            kind,
            statements,
            depth: block.depth,
            parent,
        });
    }

    for edge in &document.edges {
        let from = require_known(parse_id(&edge.from, "edges")?, &known, "edges")?;
        let to = require_known(parse_id(&edge.to, "edges")?, &known, "edges")?;
        let kind = EdgeKind::from_name(&edge.kind)
            .ok_or_else(|| schema_error(format!("Unknown edge kind '{}'", edge.kind)))?;
        graph.add_edge(from, to, kind);
    }

    let mut variables = VariableTable::new();
    for variable in &document.variables {
        let mut record = VariableRecord::new(&variable.name);
        for text in &variable.definitions {
            record
                .definitions
                .insert(require_known(parse_id(text, "variables")?, &known, "variables")?);
        }
        for text in &variable.uses {
            record
                .uses
                .insert(require_known(parse_id(text, "variables")?, &known, "variables")?);
        }
        variables.insert(variable.name.clone(), record);
    }

    Ok(AnalysisResult::new(graph, variables))
}
