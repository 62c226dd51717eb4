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

//! Error types for the Blockflow analysis engine.
//!
//! All analysis stages report failures through [`AnalyzeError`], a single
//! error type carrying a stable [`ErrorCode`], a human-readable message,
//! the source line the failure was detected on, and an optional hint.
//! A failed analysis pass is never partially applied: callers surface the
//! error and keep whatever result they already hold.

use thiserror::Error;

/// Error codes for the analysis engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Statement stream and classifier errors (E1xx)
    /// A line matches no recognized statement pattern.
    SyntaxMismatch,
    /// An `else` header without a preceding `if` at the same depth.
    DanglingElse,
    /// Input ends (or continues) with open nesting inconsistent with the
    /// source's own structural closers.
    UnterminatedBlock,

    // Graph builder errors (E2xx) - internal defect signals
    /// A non-entry block ended up with no incoming edge.
    UnreachableBlock,

    // Interchange format errors (E3xx)
    /// A malformed or unsupported JSON interchange document.
    SchemaError,
}

impl ErrorCode {
    /// Get the stable code string for this error.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::SyntaxMismatch => "E101",
            ErrorCode::DanglingElse => "E110",
            ErrorCode::UnterminatedBlock => "E120",
            ErrorCode::UnreachableBlock => "E200",
            ErrorCode::SchemaError => "E300",
        }
    }

    /// Whether this code signals an internal defect rather than a user
    /// syntax problem. Defect signals are logged and must never be
    /// presented as "fix your code".
    pub fn is_defect(&self) -> bool {
        matches!(self, ErrorCode::UnreachableBlock)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// An analysis error with source location.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("[{code}] {message}")]
pub struct AnalyzeError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// The 1-indexed source line the error was detected on, if any.
    /// Schema errors raised during import have no source line.
    pub line: Option<usize>,
    /// Optional hint for fixing the error.
    pub hint: Option<String>,
}

impl AnalyzeError {
    /// Create a new analysis error at the given source line.
    pub fn new(code: ErrorCode, message: impl Into<String>, line: usize) -> Self {
        Self {
            code,
            message: message.into(),
            line: Some(line),
            hint: None,
        }
    }

    /// Create an error that has no source location (import failures).
    pub fn without_line(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            line: None,
            hint: None,
        }
    }

    /// Add a hint to this error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Get the error code string.
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }
}

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalyzeError>;

/// Format an error with source context.
///
/// Produces the compiler-style report the editor shell shows in its
/// status panel: header, location, the offending line, and a hint.
pub fn format_error(error: &AnalyzeError, source: &str, filename: Option<&str>) -> String {
    let filename = filename.unwrap_or("<input>");

    let mut output = String::new();
    output.push_str(&format!("error[{}]: {}\n", error.code_str(), error.message));

    if let Some(line) = error.line {
        output.push_str(&format!("  --> {}:{}\n", filename, line));

        if let Some(content) = source.lines().nth(line.saturating_sub(1)) {
            let line_num_width = line.to_string().len();
            output.push_str(&format!("{:>width$} |\n", "", width = line_num_width));
            output.push_str(&format!(
                "{:>width$} | {}\n",
                line,
                content,
                width = line_num_width
            ));
            let underline_len = content.trim_end().len().max(1);
            output.push_str(&format!(
                "{:>width$} | {}\n",
                "",
                "^".repeat(underline_len),
                width = line_num_width
            ));
        }
    } else {
        output.push_str(&format!("  --> {}\n", filename));
    }

    if let Some(hint) = &error.hint {
        output.push_str(&format!("  = hint: {}\n", hint));
    }

    output
}
