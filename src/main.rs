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

//! Blockflow CLI
//!
//! Structural analysis of a restricted statement syntax, exported as
//! interchange JSON.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use blockflow::error::format_error;
use blockflow::{analyze, export_json, import_json};

/// Blockflow - Structural analysis for editor-embedded source code
#[derive(Parser, Debug)]
#[command(name = "blockflow")]
#[command(author = "Blockflow Team")]
#[command(version)]
#[command(about = "Analyze restricted-syntax source into a block graph")]
#[command(long_about = r#"
Blockflow tokenizes a source file written in a restricted,
indentation-based statement syntax, groups the statements into typed
blocks (START, LOOP, BRANCH, END, ACTIVITY), builds the control-flow
graph with typed edges and indexes variable definition/use sites.

The result is written as interchange JSON (schemaVersion 1), the same
document an embedding editor exchanges with its rendering and
highlighting collaborators.

Example usage:
  blockflow input.bf -o analysis.json
  blockflow input.bf --pretty
  blockflow --check analysis.json
"#)]
struct Cli {
    /// Source file to analyze. Not used with --check.
    source_file: Option<PathBuf>,

    /// Output file for the analysis JSON (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Validate an existing analysis JSON file instead of analyzing
    #[arg(long, value_name = "FILE")]
    check: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(path) = &cli.check {
        return check_file(path, cli.verbose);
    }

    let source_path = match &cli.source_file {
        Some(path) => path,
        None => {
            eprintln!("Error: Source file is required. Use blockflow <file> or --check <json>.");
            return ExitCode::from(2);
        }
    };

    let source = match std::fs::read_to_string(source_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error: Cannot read {}: {}", source_path.display(), e);
            return ExitCode::from(3);
        }
    };

    let filename = source_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("<input>");

    if cli.verbose {
        println!("Blockflow v{}", blockflow::VERSION);
        println!("Analyzing {}...", source_path.display());
    }

    let result = match analyze(&source) {
        Ok(result) => result,
        Err(e) => {
            eprint!("{}", format_error(&e, &source, Some(filename)));
            return ExitCode::from(1);
        }
    };

    if cli.verbose {
        println!(
            "{} blocks, {} edges, {} variables",
            result.graph.order.len(),
            result.graph.edges.len(),
            result.variables.len()
        );
    }

    let bytes = match export_json(&result, cli.pretty) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
    };

    match &cli.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &bytes) {
                eprintln!("Error: Cannot write {}: {}", path.display(), e);
                return ExitCode::from(1);
            }
            if cli.verbose {
                println!("Wrote {}", path.display());
            } else {
                println!("Analyzed {} -> {}", filename, path.display());
            }
        }
        None => {
            let mut text = String::from_utf8_lossy(&bytes).into_owned();
            if !text.ends_with('\n') {
                text.push('\n');
            }
            print!("{}", text);
        }
    }

    ExitCode::SUCCESS
}

/// Validate an analysis JSON file by re-importing it.
fn check_file(path: &PathBuf, verbose: bool) -> ExitCode {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: Cannot read {}: {}", path.display(), e);
            return ExitCode::from(3);
        }
    };

    match import_json(&bytes) {
        Ok(result) => {
            if verbose {
                println!(
                    "{}: {} blocks, {} edges, {} variables",
                    path.display(),
                    result.graph.order.len(),
                    result.graph.edges.len(),
                    result.variables.len()
                );
            } else {
                println!("{}: valid", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", path.display(), e);
            ExitCode::from(1)
        }
    }
}
