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

//! Variable tracker for the Blockflow engine.
//!
//! Walks the classified block forest and records, per block, which names
//! are defined (assignment, parameter binding, loop variable) and which
//! are read. This is a raw occurrence index for highlighting, not a
//! dataflow solver: no liveness, no reaching definitions, flat scoping.

use crate::classify::BlockForest;
use crate::model::{Block, BlockId, VariableRecord, VariableTable};
use crate::stream::{StatementKind, StatementRecord};

/// Words the identifier scanner never treats as variable names.
const KEYWORDS: &[&str] = &[
    "def", "while", "for", "in", "if", "else", "return", "and", "or", "not", "true", "false",
];

/// One identifier occurrence inside a statement text.
#[derive(Debug, PartialEq, Eq)]
struct Occurrence {
    name: String,
    /// Whether the name is immediately followed by `(` (a call target,
    /// not a variable reference).
    is_call: bool,
}

/// Scan the identifier occurrences of an expression, skipping string
/// literal contents and numeric literals.
fn scan_identifiers(text: &str) -> Vec<Occurrence> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == '"' {
            i += 1;
            while i < bytes.len() && bytes[i] as char != '"' {
                i += 1;
            }
            i += 1;
        } else if c.is_ascii_digit() {
            while i < bytes.len() && (bytes[i] as char).is_ascii_alphanumeric() {
                i += 1;
            }
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < bytes.len() {
                let c = bytes[i] as char;
                if c.is_ascii_alphanumeric() || c == '_' {
                    i += 1;
                } else {
                    break;
                }
            }
            let name = &text[start..i];
            if !KEYWORDS.contains(&name) {
                out.push(Occurrence {
                    name: name.to_string(),
                    is_call: i < bytes.len() && bytes[i] as char == '(',
                });
            }
        } else {
            i += 1;
        }
    }

    out
}

/// Variable names read by an expression.
fn reads(text: &str) -> Vec<String> {
    scan_identifiers(text)
        .into_iter()
        .filter(|occ| !occ.is_call)
        .map(|occ| occ.name)
        .collect()
}

/// Split a plain statement at its top-level assignment operator.
///
/// Returns `(target side, value side, compound)` - `compound` is true
/// for operators like `+=` where the target is read as well as written.
/// `==`, `!=`, `<=`, `>=` and `=` inside brackets do not count.
fn split_assignment(text: &str) -> Option<(&str, &str, bool)> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;

    for i in 0..bytes.len() {
        let c = bytes[i] as char;
        match c {
            '"' => in_string = !in_string,
            _ if in_string => {}
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            '=' if depth == 0 => {
                let prev = i.checked_sub(1).map(|j| bytes[j] as char);
                let next = bytes.get(i + 1).map(|&b| b as char);
                if next == Some('=') || matches!(prev, Some('=' | '!' | '<' | '>')) {
                    continue;
                }
                if let Some(op) = prev {
                    if "+-*/%".contains(op) {
                        return Some((text[..i - 1].trim_end(), &text[i + 1..], true));
                    }
                }
                return Some((text[..i].trim_end(), &text[i + 1..], false));
            }
            _ => {}
        }
    }
    None
}

/// Strip a trailing `:` for header statements.
fn header_body(text: &str) -> &str {
    text.trim_end().trim_end_matches(':')
}

/// Record defs/uses for one statement into the table.
fn track_statement(table: &mut VariableTable, block_id: BlockId, stmt: &StatementRecord) {
    let mut define = |table: &mut VariableTable, name: &str| {
        table
            .entry(name.to_string())
            .or_insert_with(|| VariableRecord::new(name))
            .definitions
            .insert(block_id);
    };
    let mut used = |table: &mut VariableTable, name: &str| {
        table
            .entry(name.to_string())
            .or_insert_with(|| VariableRecord::new(name))
            .uses
            .insert(block_id);
    };

    match stmt.kind {
        StatementKind::FunctionDef => {
            // Parameters are bound in the START block.
            if let (Some(open), Some(close)) = (stmt.text.find('('), stmt.text.rfind(')')) {
                if open < close {
                    for param in stmt.text[open + 1..close].split(',') {
                        if let Some(occ) = scan_identifiers(param).into_iter().next() {
                            define(table, &occ.name);
                        }
                    }
                }
            }
        }
        StatementKind::LoopHeader => {
            let body = header_body(&stmt.text);
            if let Some(rest) = body.strip_prefix("for ") {
                if let Some((var, iterable)) = rest.split_once(" in ") {
                    for occ in scan_identifiers(var) {
                        define(table, &occ.name);
                    }
                    for name in reads(iterable) {
                        used(table, &name);
                    }
                }
            } else if let Some(cond) = body.strip_prefix("while ") {
                for name in reads(cond) {
                    used(table, &name);
                }
            }
        }
        StatementKind::IfHeader => {
            if let Some(cond) = header_body(&stmt.text).strip_prefix("if ") {
                for name in reads(cond) {
                    used(table, &name);
                }
            }
        }
        StatementKind::ElseHeader => {}
        StatementKind::Return => {
            let rest = stmt.text.trim_start_matches("return").trim();
            for name in reads(rest) {
                used(table, &name);
            }
        }
        StatementKind::Plain => match split_assignment(&stmt.text) {
            Some((target, value, compound)) => {
                let mut target_names = scan_identifiers(target).into_iter();
                if let Some(head) = target_names.next() {
                    define(table, &head.name);
                    if compound {
                        used(table, &head.name);
                    }
                }
                // Index/subscript names on the target side are reads.
                for occ in target_names {
                    if !occ.is_call {
                        used(table, &occ.name);
                    }
                }
                for name in reads(value) {
                    used(table, &name);
                }
            }
            None => {
                for name in reads(&stmt.text) {
                    used(table, &name);
                }
            }
        },
    }
}

/// Track one block's statements.
fn track_block(table: &mut VariableTable, block: &Block) {
    for stmt in &block.statements {
        track_statement(table, block.id, stmt);
    }
}

/// Build the variable table for a classified block forest.
///
/// One record per distinct name; both sets may contain the same block
/// (`x = x + 1` defines and uses `x` there).
pub fn track_variables(forest: &BlockForest) -> VariableTable {
    let mut table = VariableTable::new();
    forest.for_each_block(&mut |block| track_block(&mut table, block));
    table
}
