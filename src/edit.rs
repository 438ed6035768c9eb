use crate::error::{AmbiguityKind, EditError, HashMismatch, HashlineMismatchError};
use crate::hash::compute_line_hash;
use crate::heuristics;
use crate::parse::{parse_edit_spec, EditSpec};
use serde::Deserialize;
use std::collections::HashSet;

/// One requested edit. `src` addresses the target (`"L:HH"`, a `".."`
/// range/insert form, or literal text to locate); `dst` is the
/// replacement text. Empty `dst` deletes, multi-line `dst` expands.
#[derive(Debug, Clone, Deserialize)]
pub struct Edit {
    pub src: String,
    pub dst: String,
}

/// JSON input format for the CLI `apply` command.
#[derive(Debug, Clone, Deserialize)]
pub struct HashlineParams {
    pub path: String,
    pub edits: Vec<Edit>,
}

/// Result of applying a batch of edits.
#[derive(Debug)]
pub struct ApplyResult {
    pub content: String,
    pub first_changed_line: Option<usize>,
    pub warnings: Vec<String>,
    pub noop_edits: Vec<NoopEdit>,
}

/// An edit whose repaired replacement equals what is already in the file.
#[derive(Debug)]
pub struct NoopEdit {
    pub edit_index: usize,
    pub loc: String,
    pub current_content: String,
}

struct ParsedEdit {
    index: usize,
    spec: EditSpec,
    dst_lines: Vec<String>,
}

fn split_dst_lines(dst: &str) -> Vec<String> {
    if dst.is_empty() {
        vec![]
    } else {
        dst.split('\n').map(|s| s.to_string()).collect()
    }
}

fn check_line_in_range(line: usize, file_lines: &[String]) -> Result<(), EditError> {
    if line < 1 || line > file_lines.len() {
        return Err(EditError::validation(format!(
            "Line {} does not exist (file has {} lines)",
            line,
            file_lines.len()
        )));
    }
    Ok(())
}

fn check_hash(
    line: usize,
    declared: &str,
    file_lines: &[String],
    mismatches: &mut Vec<HashMismatch>,
) {
    let actual = compute_line_hash(line, &file_lines[line - 1]);
    if actual != declared.to_lowercase() {
        mismatches.push(HashMismatch {
            line,
            expected: declared.to_string(),
            actual,
        });
    }
}

fn sort_line(spec: &EditSpec) -> usize {
    match spec {
        EditSpec::Single(r) => r.line,
        EditSpec::Range { end, .. } => end.line,
        EditSpec::InsertAfter(anchor) => anchor.line,
        EditSpec::InsertBefore(anchor) => anchor.line,
        EditSpec::Substring(_) => 0,
    }
}

fn precedence(spec: &EditSpec) -> u8 {
    match spec {
        EditSpec::Single(_) | EditSpec::Range { .. } => 0,
        EditSpec::InsertAfter(_) => 1,
        EditSpec::InsertBefore(_) => 2,
        EditSpec::Substring(_) => 3,
    }
}

fn spec_key(spec: &EditSpec) -> String {
    match spec {
        EditSpec::Single(r) => format!("s:{}", r.line),
        EditSpec::Range { start, end } => format!("r:{}:{}", start.line, end.line),
        EditSpec::InsertAfter(anchor) => format!("a:{}", anchor.line),
        EditSpec::InsertBefore(anchor) => format!("b:{}", anchor.line),
        EditSpec::Substring(needle) => format!("n:{}", needle),
    }
}

fn track_first_changed(first: &mut Option<usize>, line: usize) {
    if first.is_none() || line < first.unwrap() {
        *first = Some(line);
    }
}

/// Apply a batch of hashline edits to file content.
///
/// Every reference is validated before anything is spliced: out-of-range
/// lines, inverted ranges, empty insert text and multi-line substring
/// replacements fail immediately; stale hashes are collected across the
/// whole batch and raised as one aggregated mismatch report. Edits are
/// then applied bottom-up so earlier splices never invalidate later
/// indices.
///
/// Substring specs are applied last (they sort below every line
/// reference); mixing substring and line-reference edits that target the
/// same physical line has no defined order.
pub fn apply_hashline_edits(content: &str, edits: &[Edit]) -> Result<ApplyResult, EditError> {
    if edits.is_empty() {
        return Ok(ApplyResult {
            content: content.to_string(),
            first_changed_line: None,
            warnings: vec![],
            noop_edits: vec![],
        });
    }

    let original_file_lines: Vec<String> = content.split('\n').map(|s| s.to_string()).collect();
    let mut file_lines = original_file_lines.clone();
    let mut first_changed_line: Option<usize> = None;
    let mut noop_edits: Vec<NoopEdit> = Vec::new();

    // Parse all edits up front
    let mut parsed: Vec<ParsedEdit> = Vec::new();
    for (i, edit) in edits.iter().enumerate() {
        let spec = parse_edit_spec(&edit.src)?;
        let dst_lines = heuristics::strip_replacement_prefixes(&split_dst_lines(&edit.dst));
        parsed.push(ParsedEdit {
            index: i,
            spec,
            dst_lines,
        });
    }

    // Pre-validate: fatal checks first-error-wins, hash mismatches batched
    let mut mismatches: Vec<HashMismatch> = Vec::new();
    for p in &parsed {
        match &p.spec {
            EditSpec::Single(r) => {
                check_line_in_range(r.line, &file_lines)?;
                check_hash(r.line, &r.hash, &file_lines, &mut mismatches);
            }
            EditSpec::Range { start, end } => {
                check_line_in_range(start.line, &file_lines)?;
                check_line_in_range(end.line, &file_lines)?;
                if start.line > end.line {
                    return Err(EditError::validation(format!(
                        "Range start line {} must be <= end line {}",
                        start.line, end.line
                    )));
                }
                check_hash(start.line, &start.hash, &file_lines, &mut mismatches);
                check_hash(end.line, &end.hash, &file_lines, &mut mismatches);
            }
            EditSpec::InsertAfter(anchor) | EditSpec::InsertBefore(anchor) => {
                check_line_in_range(anchor.line, &file_lines)?;
                if p.dst_lines.is_empty() {
                    return Err(EditError::validation(format!(
                        "Insert at line {} requires non-empty replacement text",
                        anchor.line
                    )));
                }
                check_hash(anchor.line, &anchor.hash, &file_lines, &mut mismatches);
            }
            EditSpec::Substring(needle) => {
                if p.dst_lines.len() != 1 {
                    return Err(EditError::validation(format!(
                        "Substring edit for {:?} takes exactly one replacement line, got {}",
                        needle,
                        p.dst_lines.len()
                    )));
                }
            }
        }
    }

    if !mismatches.is_empty() {
        return Err(HashlineMismatchError::new(mismatches, file_lines).into());
    }

    // Lines explicitly referenced by the batch; merge detection must not
    // absorb them.
    let mut explicitly_touched_lines: HashSet<usize> = HashSet::new();
    for p in &parsed {
        match &p.spec {
            EditSpec::Single(r) => {
                explicitly_touched_lines.insert(r.line);
            }
            EditSpec::Range { start, end } => {
                explicitly_touched_lines.extend(start.line..=end.line);
            }
            EditSpec::InsertAfter(anchor) | EditSpec::InsertBefore(anchor) => {
                explicitly_touched_lines.insert(anchor.line);
            }
            EditSpec::Substring(_) => {}
        }
    }

    // Coalesce byte-identical edits; duplicates carry identical intent and
    // would double-apply inserts.
    let mut seen_edit_keys: HashSet<String> = HashSet::new();
    parsed.retain(|p| {
        seen_edit_keys.insert(format!("{}|{}", spec_key(&p.spec), p.dst_lines.join("\n")))
    });

    // Bottom-up: descending sort line, then the precedence ladder, then
    // submission order.
    parsed.sort_by(|a, b| {
        sort_line(&b.spec)
            .cmp(&sort_line(&a.spec))
            .then(precedence(&a.spec).cmp(&precedence(&b.spec)))
            .then(a.index.cmp(&b.index))
    });

    for p in &parsed {
        match &p.spec {
            EditSpec::Single(r) => {
                let line = r.line;

                // Merge expansion runs only for single-line replaces
                if let Some((start, delete_count, merged)) =
                    heuristics::maybe_expand_single_line_merge(
                        line,
                        &p.dst_lines,
                        &original_file_lines,
                        &explicitly_touched_lines,
                    )
                {
                    let orig_lines: Vec<String> =
                        original_file_lines[start - 1..start - 1 + delete_count].to_vec();
                    let mut new_lines = heuristics::restore_indent_for_paired_replacement(
                        &[orig_lines.first().cloned().unwrap_or_default()],
                        &merged,
                    );
                    if orig_lines.join("\n") == new_lines.join("\n")
                        && orig_lines
                            .iter()
                            .any(|l| heuristics::has_confusable_hyphens(l))
                    {
                        new_lines = heuristics::normalize_confusable_hyphens_in_lines(&new_lines);
                    }
                    if orig_lines.join("\n") == new_lines.join("\n") {
                        noop_edits.push(NoopEdit {
                            edit_index: p.index,
                            loc: format!("{}:{}", line, r.hash),
                            current_content: orig_lines.join("\n"),
                        });
                        continue;
                    }
                    file_lines.splice(start - 1..start - 1 + delete_count, new_lines);
                    track_first_changed(&mut first_changed_line, start);
                    continue;
                }

                let orig_lines: Vec<String> = original_file_lines[line - 1..line].to_vec();
                let stripped = heuristics::strip_range_boundary_echo(
                    &original_file_lines,
                    line,
                    line,
                    &p.dst_lines,
                );
                let mut new_lines = heuristics::repair_replacement_lines(&orig_lines, &stripped);
                if orig_lines.join("\n") == new_lines.join("\n")
                    && orig_lines
                        .iter()
                        .any(|l| heuristics::has_confusable_hyphens(l))
                {
                    new_lines = heuristics::normalize_confusable_hyphens_in_lines(&new_lines);
                }
                if orig_lines.join("\n") == new_lines.join("\n") {
                    noop_edits.push(NoopEdit {
                        edit_index: p.index,
                        loc: format!("{}:{}", line, r.hash),
                        current_content: orig_lines.join("\n"),
                    });
                    continue;
                }
                file_lines.splice(line - 1..line, new_lines);
                track_first_changed(&mut first_changed_line, line);
            }
            EditSpec::Range { start, end } => {
                let (start_line, end_line) = (start.line, end.line);
                let count = end_line - start_line + 1;
                let orig_lines: Vec<String> =
                    original_file_lines[start_line - 1..start_line - 1 + count].to_vec();
                let stripped = heuristics::strip_range_boundary_echo(
                    &original_file_lines,
                    start_line,
                    end_line,
                    &p.dst_lines,
                );
                let mut new_lines = heuristics::repair_replacement_lines(&orig_lines, &stripped);
                if orig_lines.join("\n") == new_lines.join("\n")
                    && orig_lines
                        .iter()
                        .any(|l| heuristics::has_confusable_hyphens(l))
                {
                    new_lines = heuristics::normalize_confusable_hyphens_in_lines(&new_lines);
                }
                if orig_lines.join("\n") == new_lines.join("\n") {
                    noop_edits.push(NoopEdit {
                        edit_index: p.index,
                        loc: format!("{}:{}", start_line, start.hash),
                        current_content: orig_lines.join("\n"),
                    });
                    continue;
                }
                file_lines.splice(start_line - 1..start_line - 1 + count, new_lines);
                track_first_changed(&mut first_changed_line, start_line);
            }
            EditSpec::InsertAfter(anchor) => {
                let line = anchor.line;
                let anchor_text = &original_file_lines[line - 1];
                let inserted =
                    heuristics::strip_insert_anchor_echo_after(anchor_text, &p.dst_lines);
                if inserted.is_empty() {
                    noop_edits.push(NoopEdit {
                        edit_index: p.index,
                        loc: format!("{}:{}", line, anchor.hash),
                        current_content: anchor_text.clone(),
                    });
                    continue;
                }
                file_lines.splice(line..line, inserted);
                track_first_changed(&mut first_changed_line, line + 1);
            }
            EditSpec::InsertBefore(anchor) => {
                let line = anchor.line;
                let anchor_text = &original_file_lines[line - 1];
                let inserted =
                    heuristics::strip_insert_anchor_echo_before(anchor_text, &p.dst_lines);
                if inserted.is_empty() {
                    noop_edits.push(NoopEdit {
                        edit_index: p.index,
                        loc: format!("{}:{}", line, anchor.hash),
                        current_content: anchor_text.clone(),
                    });
                    continue;
                }
                file_lines.splice(line - 1..line - 1, inserted);
                track_first_changed(&mut first_changed_line, line);
            }
            EditSpec::Substring(needle) => {
                let matches: Vec<usize> = file_lines
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| l.contains(needle.as_str()))
                    .map(|(i, _)| i)
                    .collect();
                match matches.len() {
                    0 => {
                        return Err(EditError::validation(format!(
                            "Text {:?} not found in file",
                            needle
                        )));
                    }
                    1 => {
                        let idx = matches[0];
                        let replaced =
                            file_lines[idx].replacen(needle.as_str(), &p.dst_lines[0], 1);
                        if replaced == file_lines[idx] {
                            noop_edits.push(NoopEdit {
                                edit_index: p.index,
                                loc: needle.clone(),
                                current_content: file_lines[idx].clone(),
                            });
                            continue;
                        }
                        file_lines[idx] = replaced;
                        track_first_changed(&mut first_changed_line, idx + 1);
                    }
                    _ => {
                        return Err(EditError::Ambiguity {
                            kind: AmbiguityKind::SubstringMultiple,
                            candidates: matches
                                .iter()
                                .map(|&i| file_lines[i].clone())
                                .collect(),
                        });
                    }
                }
            }
        }
    }

    let mut warnings = Vec::new();
    let mut diff_line_count =
        (file_lines.len() as isize - original_file_lines.len() as isize).unsigned_abs();
    for i in 0..std::cmp::min(file_lines.len(), original_file_lines.len()) {
        if file_lines[i] != original_file_lines[i] {
            diff_line_count += 1;
        }
    }
    if diff_line_count > edits.len() * 4 {
        warnings.push(format!(
            "Edit changed {} lines across {} operations. Verify no unintended reformatting.",
            diff_line_count,
            edits.len()
        ));
    }

    Ok(ApplyResult {
        content: file_lines.join("\n"),
        first_changed_line,
        warnings,
        noop_edits,
    })
}
