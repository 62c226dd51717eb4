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

//! Statement stream module for the Blockflow engine.
//!
//! This module turns raw source text into an ordered sequence of
//! classified [`StatementRecord`]s, one per logical line. It handles:
//! - Logical-line splitting with a bracket continuation rule
//! - Blank and comment-only lines
//! - Indentation measurement (spaces only, tabs rejected)
//! - Statement kind classification via the fixed pattern rules
//!
//! Tokenization is all-or-nothing: a single malformed line fails the
//! whole call so the session never renders a half-built graph.

mod record;

pub use record::{classify_line, StatementKind, StatementRecord};

use crate::error::{AnalyzeError, ErrorCode, Result};

/// The scanner state for splitting source text into logical lines.
struct Scanner<'source> {
    /// Remaining physical lines, paired with their 1-indexed line numbers.
    lines: std::iter::Peekable<std::iter::Enumerate<std::str::Lines<'source>>>,
}

impl<'source> Scanner<'source> {
    fn new(source: &'source str) -> Self {
        Self {
            lines: source.lines().enumerate().peekable(),
        }
    }

    /// Produce the next logical line as `(line number, indent, text)`.
    fn next_logical_line(&mut self) -> Result<Option<(usize, usize, String)>> {
        loop {
            let (index, raw) = match self.lines.next() {
                Some(pair) => pair,
                None => return Ok(None),
            };
            let line_num = index + 1;

            let indent = measure_indent(raw, line_num)?;
            let text = strip_comment(raw).trim().to_string();
            if text.is_empty() {
                continue;
            }

            let mut text = text;
            let mut open = bracket_depth(&text);
            // Continuation rule: an open bracket joins following physical
            // lines into the same logical line.
            while open > 0 {
                let (_, continuation) = self.lines.next().ok_or_else(|| {
                    AnalyzeError::new(
                        ErrorCode::SyntaxMismatch,
                        "Unclosed bracket at end of input",
                        line_num,
                    )
                })?;
                let continuation = strip_comment(continuation).trim();
                if !continuation.is_empty() {
                    text.push(' ');
                    text.push_str(continuation);
                }
                open = bracket_depth(&text);
            }
            if open < 0 {
                return Err(AnalyzeError::new(
                    ErrorCode::SyntaxMismatch,
                    "Unbalanced closing bracket",
                    line_num,
                ));
            }

            return Ok(Some((line_num, indent, text)));
        }
    }
}

/// Count leading spaces; reject tab indentation.
fn measure_indent(raw: &str, line_num: usize) -> Result<usize> {
    let mut indent = 0;
    for c in raw.chars() {
        match c {
            ' ' => indent += 1,
            '\t' => {
                return Err(AnalyzeError::new(
                    ErrorCode::SyntaxMismatch,
                    "Tab character in indentation",
                    line_num,
                )
                .with_hint("Use spaces for indentation"));
            }
            _ => break,
        }
    }
    Ok(indent)
}

/// Strip an unquoted `#` comment from a line.
fn strip_comment(raw: &str) -> &str {
    let mut in_string = false;
    for (i, c) in raw.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &raw[..i],
            _ => {}
        }
    }
    raw
}

/// Net `(`/`[` nesting of a line, ignoring quoted strings.
fn bracket_depth(text: &str) -> i32 {
    let mut depth = 0;
    let mut in_string = false;
    for c in text.chars() {
        match c {
            '"' => in_string = !in_string,
            '(' | '[' if !in_string => depth += 1,
            ')' | ']' if !in_string => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Tokenize source text into an ordered sequence of statement records.
pub fn tokenize(source: &str) -> Result<Vec<StatementRecord>> {
    let mut scanner = Scanner::new(source);
    let mut records = Vec::new();

    while let Some((source_line, indent, text)) = scanner.next_logical_line()? {
        let kind = classify_line(&text, source_line)?;
        records.push(StatementRecord {
            source_line,
            text,
            kind,
            indent,
        });
    }

    Ok(records)
}
