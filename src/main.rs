use clap::Parser;
use std::io::Read;
use std::path::Path;
use std::process;

mod cli;
mod edit;
mod error;
mod fileio;
mod format;
mod hash;
mod heuristics;
mod matcher;
mod parse;
mod usage;

use cli::{Cli, Commands};
use error::EditError;
use fileio::FileText;
use matcher::MatchOptions;
use usage::{log_event, UsageEvent, UsageResult};

fn record_usage(
    command: &'static str,
    result: UsageResult,
    emit_updated: bool,
    used_input_file: bool,
) {
    let _ = log_event(UsageEvent {
        command,
        result,
        emit_updated,
        used_input_file,
    });
}

fn exit_with(
    code: i32,
    command: &'static str,
    result: UsageResult,
    emit_updated: bool,
    used_input_file: bool,
) -> ! {
    record_usage(command, result, emit_updated, used_input_file);
    process::exit(code);
}

fn read_params_json(input: &Option<String>, command: &'static str, emit_updated: bool) -> String {
    if let Some(path) = input {
        match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error reading input file {}: {}", path, e);
                exit_with(2, command, UsageResult::Error, emit_updated, true);
            }
        }
    } else {
        let mut buf = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
            eprintln!("Error reading stdin: {}", e);
            exit_with(2, command, UsageResult::Error, emit_updated, false);
        }
        buf
    }
}

/// After a successful write, re-read the file and print a hashline window
/// around the first changed line so the caller gets fresh references.
fn print_updated_window(path: &str, first_line: usize, edits_count: usize) {
    let updated = FileText::read(Path::new(path))
        .map(|ft| ft.content)
        .unwrap_or_default();
    let all_lines: Vec<&str> = updated.split('\n').collect();
    let context = 2;
    let start = first_line.saturating_sub(1 + context);
    let end = all_lines
        .len()
        .min(start + (edits_count * 3).max(10) + context * 2);
    let slice = &all_lines[start..end];
    if !slice.is_empty() {
        let sliced_content = slice.join("\n");
        println!("---");
        println!("{}", format::format_hashlines(&sliced_content, start + 1));
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Read {
            file,
            start_line,
            lines,
        } => {
            let text = match FileText::read(Path::new(&file)) {
                Ok(ft) => ft,
                Err(e) => {
                    eprintln!("Error reading {}: {}", file, e);
                    exit_with(2, "read", UsageResult::Error, false, false);
                }
            };
            let all_lines: Vec<&str> = text.content.split('\n').collect();
            let start_idx = start_line.saturating_sub(1).min(all_lines.len());
            let end_idx = if let Some(n) = lines {
                (start_idx + n).min(all_lines.len())
            } else {
                all_lines.len()
            };
            let slice = &all_lines[start_idx..end_idx];
            if !slice.is_empty() {
                let sliced_content = slice.join("\n");
                println!("{}", format::format_hashlines(&sliced_content, start_line));
            }
            record_usage("read", UsageResult::Success, false, false);
        }
        Commands::Apply {
            input,
            emit_updated,
        } => {
            let used_input_file = input.is_some();
            let input_data = read_params_json(&input, "apply", emit_updated);

            let params: edit::HashlineParams = match serde_json::from_str(&input_data) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Invalid JSON input: {}", e);
                    exit_with(2, "apply", UsageResult::Error, emit_updated, used_input_file);
                }
            };

            let mut text = match FileText::read(Path::new(&params.path)) {
                Ok(ft) => ft,
                Err(e) => {
                    eprintln!("Error reading {}: {}", params.path, e);
                    exit_with(2, "apply", UsageResult::Error, emit_updated, used_input_file);
                }
            };

            let result = match edit::apply_hashline_edits(&text.content, &params.edits) {
                Ok(r) => r,
                Err(EditError::Mismatch(e)) => {
                    eprintln!("{}", e);
                    exit_with(
                        1,
                        "apply",
                        UsageResult::Mismatch,
                        emit_updated,
                        used_input_file,
                    );
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    exit_with(2, "apply", UsageResult::Error, emit_updated, used_input_file);
                }
            };

            text.content = result.content;
            if let Err(e) = text.write(Path::new(&params.path)) {
                eprintln!("Error writing {}: {}", params.path, e);
                exit_with(2, "apply", UsageResult::Error, emit_updated, used_input_file);
            }
            for w in &result.warnings {
                eprintln!("Warning: {}", w);
            }

            if let Some(first_line) = result.first_changed_line {
                if emit_updated {
                    print_updated_window(&params.path, first_line, params.edits.len());
                }
            } else {
                println!("No changes applied.");
            }
            record_usage("apply", UsageResult::Success, emit_updated, used_input_file);
        }
        Commands::Replace {
            input,
            emit_updated,
        } => {
            let used_input_file = input.is_some();
            let input_data = read_params_json(&input, "replace", emit_updated);

            let params: matcher::ReplaceParams = match serde_json::from_str(&input_data) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Invalid JSON input: {}", e);
                    exit_with(
                        2,
                        "replace",
                        UsageResult::Error,
                        emit_updated,
                        used_input_file,
                    );
                }
            };

            let mut text = match FileText::read(Path::new(&params.path)) {
                Ok(ft) => ft,
                Err(e) => {
                    eprintln!("Error reading {}: {}", params.path, e);
                    exit_with(
                        2,
                        "replace",
                        UsageResult::Error,
                        emit_updated,
                        used_input_file,
                    );
                }
            };

            let opts = MatchOptions {
                allow_fuzzy: params.allow_fuzzy,
                similarity_threshold: params.similarity_threshold,
            };
            let result = matcher::find_edit_match(&text.content, &params.old_text, &opts);
            let span = match result.span {
                Some(span) => span,
                None => {
                    if result.fuzzy_matches.len() > 1 {
                        let err = EditError::Ambiguity {
                            kind: error::AmbiguityKind::FuzzyMultiple,
                            candidates: result
                                .fuzzy_matches
                                .iter()
                                .map(|c| c.text.clone())
                                .collect(),
                        };
                        eprintln!("{}", err);
                    } else {
                        eprintln!("{}", matcher::format_match_failure(&params.old_text, &result));
                    }
                    exit_with(
                        1,
                        "replace",
                        UsageResult::Mismatch,
                        emit_updated,
                        used_input_file,
                    );
                }
            };

            let first_line = text.content[..span.start_index]
                .bytes()
                .filter(|b| *b == b'\n')
                .count()
                + 1;
            let mut next = String::with_capacity(
                text.content.len() + params.new_text.len() - span.actual_text.len(),
            );
            next.push_str(&text.content[..span.start_index]);
            next.push_str(&params.new_text);
            next.push_str(&text.content[span.start_index + span.actual_text.len()..]);
            text.content = next;

            if let Err(e) = text.write(Path::new(&params.path)) {
                eprintln!("Error writing {}: {}", params.path, e);
                exit_with(
                    2,
                    "replace",
                    UsageResult::Error,
                    emit_updated,
                    used_input_file,
                );
            }
            if emit_updated {
                print_updated_window(&params.path, first_line, 1);
            }
            record_usage(
                "replace",
                UsageResult::Success,
                emit_updated,
                used_input_file,
            );
        }
        Commands::Hash { file } => {
            let text = match FileText::read(Path::new(&file)) {
                Ok(ft) => ft,
                Err(e) => {
                    eprintln!("Error reading {}: {}", file, e);
                    exit_with(2, "hash", UsageResult::Error, false, false);
                }
            };
            for (i, line) in text.content.split('\n').enumerate() {
                let num = i + 1;
                println!("{}:{}", num, hash::compute_line_hash(num, line));
            }
            record_usage("hash", UsageResult::Success, false, false);
        }
    }
}
