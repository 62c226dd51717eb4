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

//! Statement record definitions for the statement stream.
//!
//! Every logical source line is classified into exactly one
//! [`StatementKind`] by a fixed, ordered set of pattern rules. The
//! enumeration is closed on purpose: adding a recognized construct is a
//! compile-time checked extension, not an open-ended string match.

use crate::error::{AnalyzeError, ErrorCode, Result};

/// The kind of a classified statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// `def name(params):` - function definition header.
    FunctionDef,
    /// `while cond:` or `for name in expr:` - loop header.
    LoopHeader,
    /// `if cond:` - conditional header.
    IfHeader,
    /// `else:` - alternate-branch header.
    ElseHeader,
    /// `return [expr]` - path terminator.
    Return,
    /// Any other recognized statement.
    Plain,
}

impl StatementKind {
    /// Get the schema name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            StatementKind::FunctionDef => "FUNCTION_DEF",
            StatementKind::LoopHeader => "LOOP_HEADER",
            StatementKind::IfHeader => "IF_HEADER",
            StatementKind::ElseHeader => "ELSE_HEADER",
            StatementKind::Return => "RETURN",
            StatementKind::Plain => "PLAIN",
        }
    }

    /// Parse a schema name back into a kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "FUNCTION_DEF" => Some(StatementKind::FunctionDef),
            "LOOP_HEADER" => Some(StatementKind::LoopHeader),
            "IF_HEADER" => Some(StatementKind::IfHeader),
            "ELSE_HEADER" => Some(StatementKind::ElseHeader),
            "RETURN" => Some(StatementKind::Return),
            "PLAIN" => Some(StatementKind::Plain),
            _ => None,
        }
    }

    /// Whether this kind opens a nested block when classified.
    pub fn opens_block(&self) -> bool {
        matches!(
            self,
            StatementKind::FunctionDef | StatementKind::LoopHeader | StatementKind::IfHeader
        )
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One classified logical source line. Immutable once produced.
#[derive(Debug, Clone, Eq)]
pub struct StatementRecord {
    /// 1-indexed physical line the logical line starts on.
    pub source_line: usize,
    /// The trimmed statement text (continuation lines joined).
    pub text: String,
    /// The statement kind.
    pub kind: StatementKind,
    /// Leading spaces of the first physical line. Nesting signal for the
    /// classifier; not part of the interchange schema.
    pub indent: usize,
}

impl PartialEq for StatementRecord {
    /// Two records are the same statement when line, text and kind
    /// agree. `indent` is a classifier working field and is not part
    /// of block identity or the interchange schema.
    fn eq(&self, other: &Self) -> bool {
        self.source_line == other.source_line && self.text == other.text && self.kind == other.kind
    }
}

impl StatementRecord {
    /// Whether the statement carries its trailing `:` structural closer.
    /// Only meaningful for header kinds.
    pub fn has_colon(&self) -> bool {
        self.text.trim_end().ends_with(':')
    }
}

/// Get the leading identifier-like word of a statement, if any.
fn leading_word(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphanumeric() && *c != '_')
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}

/// Strip one trailing `:` from a header line, returning the inner text.
fn strip_colon(text: &str) -> &str {
    text.trim_end().strip_suffix(':').unwrap_or(text).trim()
}

/// Classify one logical line's kind via the fixed, ordered pattern rules.
///
/// Fails with `SyntaxMismatch` when a line opens with a header keyword but
/// its trailing syntax is malformed; a missing `:` closer alone is *not* a
/// mismatch here - the classifier reports that as an unterminated block.
pub fn classify_line(text: &str, line: usize) -> Result<StatementKind> {
    let text = text.trim();

    match leading_word(text) {
        "def" => {
            let head = strip_colon(&text[3..]);
            let name = leading_word(head);
            let rest = head[name.len()..].trim_start();
            if name.is_empty() || !rest.starts_with('(') || !rest.ends_with(')') {
                return Err(AnalyzeError::new(
                    ErrorCode::SyntaxMismatch,
                    "Malformed function definition",
                    line,
                )
                .with_hint("Expected 'def name(params):'"));
            }
            Ok(StatementKind::FunctionDef)
        }
        "while" => {
            if strip_colon(&text[5..]).is_empty() {
                return Err(AnalyzeError::new(
                    ErrorCode::SyntaxMismatch,
                    "Missing condition in 'while' header",
                    line,
                ));
            }
            Ok(StatementKind::LoopHeader)
        }
        "for" => {
            let head = strip_colon(&text[3..]);
            let (var, iter) = match head.split_once(" in ") {
                Some((var, iter)) => (var.trim(), iter.trim()),
                None => {
                    return Err(AnalyzeError::new(
                        ErrorCode::SyntaxMismatch,
                        "Malformed 'for' header",
                        line,
                    )
                    .with_hint("Expected 'for name in expr:'"));
                }
            };
            if var.is_empty() || iter.is_empty() {
                return Err(AnalyzeError::new(
                    ErrorCode::SyntaxMismatch,
                    "Malformed 'for' header",
                    line,
                ));
            }
            Ok(StatementKind::LoopHeader)
        }
        "if" => {
            if strip_colon(&text[2..]).is_empty() {
                return Err(AnalyzeError::new(
                    ErrorCode::SyntaxMismatch,
                    "Missing condition in 'if' header",
                    line,
                ));
            }
            Ok(StatementKind::IfHeader)
        }
        "else" => {
            if !strip_colon(&text[4..]).is_empty() {
                return Err(AnalyzeError::new(
                    ErrorCode::SyntaxMismatch,
                    "Unexpected tokens after 'else'",
                    line,
                ));
            }
            Ok(StatementKind::ElseHeader)
        }
        "elif" => Err(AnalyzeError::new(
            ErrorCode::SyntaxMismatch,
            "'elif' is not a recognized statement",
            line,
        )
        .with_hint("Nest an 'if' inside the 'else' branch")),
        "return" => Ok(StatementKind::Return),
        _ => Ok(StatementKind::Plain),
    }
}
