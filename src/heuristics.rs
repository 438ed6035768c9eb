use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Pattern matching an echoed display prefix: `LINE:HASH| CONTENT`
static DISPLAY_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:>>>|>>)?\s*\d+:[0-9a-fA-F]{1,16}\| ?").unwrap());

/// Check if a line starts with a unified-diff `+` prefix (but not `++`).
fn has_diff_plus_prefix(s: &str) -> bool {
    s.starts_with('+') && !s.starts_with("++")
}

fn strip_diff_plus(s: &str) -> String {
    if has_diff_plus_prefix(s) {
        s[1..].to_string()
    } else {
        s.to_string()
    }
}

/// Unicode confusable hyphens
static CONFUSABLE_HYPHENS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("[\u{2010}\u{2011}\u{2012}\u{2013}\u{2014}\u{2212}\u{FE63}\u{FF0D}]").unwrap()
});

/// Check if a string contains confusable hyphens.
pub fn has_confusable_hyphens(s: &str) -> bool {
    CONFUSABLE_HYPHENS_RE.is_match(s)
}

/// Replace confusable Unicode hyphens with ASCII hyphen.
pub fn normalize_confusable_hyphens(s: &str) -> String {
    CONFUSABLE_HYPHENS_RE.replace_all(s, "-").to_string()
}

pub fn normalize_confusable_hyphens_in_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|l| normalize_confusable_hyphens(l))
        .collect()
}

fn strip_all_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn leading_whitespace(s: &str) -> &str {
    let end = s.len() - s.trim_start().len();
    &s[..end]
}

fn restore_leading_indent(template_line: &str, line: &str) -> String {
    if line.is_empty() {
        return line.to_string();
    }
    let template_indent = leading_whitespace(template_line);
    if template_indent.is_empty() {
        return line.to_string();
    }
    if !leading_whitespace(line).is_empty() {
        return line.to_string();
    }
    format!("{}{}", template_indent, line)
}

fn equals_ignoring_whitespace(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    strip_all_whitespace(a) == strip_all_whitespace(b)
}

static TRAILING_CONTINUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:&&|\|\||\?\?|\?|:|=|,|\+|-|\*|/|\.|\()\s*$").unwrap());

fn strip_trailing_continuation_tokens(s: &str) -> String {
    TRAILING_CONTINUATION_RE.replace(s, "").to_string()
}

fn strip_merge_operator_chars(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '|' | '&' | '?'))
        .collect()
}

/// Strip echoed display prefixes and diff `+` markers from replacement lines.
///
/// Majority rule over non-empty lines: if at least half carry the hashline
/// display prefix, strip that from every line; otherwise if at least half
/// carry a leading `+`, strip that. Never both.
pub fn strip_replacement_prefixes(lines: &[String]) -> Vec<String> {
    let mut display_prefix_count = 0;
    let mut diff_plus_count = 0;
    let mut non_empty = 0;

    for l in lines {
        if l.is_empty() {
            continue;
        }
        non_empty += 1;
        if DISPLAY_PREFIX_RE.is_match(l) {
            display_prefix_count += 1;
        }
        if has_diff_plus_prefix(l) {
            diff_plus_count += 1;
        }
    }

    if non_empty == 0 {
        return lines.to_vec();
    }

    let strip_display = display_prefix_count > 0 && display_prefix_count * 2 >= non_empty;
    let strip_plus = !strip_display && diff_plus_count > 0 && diff_plus_count * 2 >= non_empty;

    if !strip_display && !strip_plus {
        return lines.to_vec();
    }

    lines
        .iter()
        .map(|l| {
            if strip_display {
                DISPLAY_PREFIX_RE.replace(l, "").to_string()
            } else {
                strip_diff_plus(l)
            }
        })
        .collect()
}

/// Restore indentation for paired old/new replacement lines.
///
/// When the line counts match, a replacement line with no leading indent
/// inherits the indent of the original line at the same position.
pub fn restore_indent_for_paired_replacement(
    old_lines: &[String],
    new_lines: &[String],
) -> Vec<String> {
    if old_lines.len() != new_lines.len() {
        return new_lines.to_vec();
    }
    let mut changed = false;
    let mut out = Vec::with_capacity(new_lines.len());
    for (old, new) in old_lines.iter().zip(new_lines.iter()) {
        let restored = restore_leading_indent(old, new);
        if restored != *new {
            changed = true;
        }
        out.push(restored);
    }
    if changed {
        out
    } else {
        new_lines.to_vec()
    }
}

/// Substitute the original line wherever a same-position replacement line
/// differs only in whitespace. Prevents spurious reformatting diffs.
pub fn preserve_paired_whitespace_only(
    old_lines: &[String],
    new_lines: &[String],
) -> Vec<String> {
    if old_lines.len() != new_lines.len() {
        return new_lines.to_vec();
    }
    old_lines
        .iter()
        .zip(new_lines.iter())
        .map(|(old, new)| {
            if old != new && strip_all_whitespace(old) == strip_all_whitespace(new) {
                old.clone()
            } else {
                new.clone()
            }
        })
        .collect()
}

/// Whitespace-only preservation for replacements whose line count changed.
///
/// Each replacement line whose whitespace-stripped signature matches exactly
/// one original line is substituted with that original line.
pub fn preserve_loose_whitespace_matches(
    old_lines: &[String],
    new_lines: &[String],
) -> Vec<String> {
    if old_lines.len() == new_lines.len() {
        return new_lines.to_vec();
    }

    // canon -> (occurrences in old, index of first occurrence)
    let mut canon_index: HashMap<String, (usize, usize)> = HashMap::new();
    for (i, line) in old_lines.iter().enumerate() {
        let canon = strip_all_whitespace(line);
        if canon.is_empty() {
            continue;
        }
        let entry = canon_index.entry(canon).or_insert((0, i));
        entry.0 += 1;
    }

    new_lines
        .iter()
        .map(|new| {
            let canon = strip_all_whitespace(new);
            if canon.is_empty() {
                return new.clone();
            }
            match canon_index.get(&canon) {
                Some(&(1, idx)) if old_lines[idx] != *new => old_lines[idx].clone(),
                _ => new.clone(),
            }
        })
        .collect()
}

/// Undo pure formatting rewrites where the replacement reflows a single
/// logical line into several, but the token stream is identical.
pub fn restore_old_wrapped_lines(old_lines: &[String], new_lines: &[String]) -> Vec<String> {
    if old_lines.is_empty() || new_lines.len() < 2 {
        return new_lines.to_vec();
    }

    let mut canon_to_old: HashMap<String, (String, usize)> = HashMap::new();
    for line in old_lines {
        let canon = strip_all_whitespace(line);
        let entry = canon_to_old
            .entry(canon)
            .or_insert_with(|| (line.clone(), 0));
        entry.1 += 1;
    }

    struct Candidate {
        start: usize,
        len: usize,
        replacement: String,
        canon: String,
    }

    let mut candidates = Vec::new();
    for start in 0..new_lines.len() {
        for len in 2..=6.min(new_lines.len() - start) {
            let joined: String = new_lines[start..start + len].concat();
            let canon_span = strip_all_whitespace(&joined);
            if let Some((old_line, count)) = canon_to_old.get(&canon_span) {
                if *count == 1 && canon_span.len() >= 6 {
                    candidates.push(Candidate {
                        start,
                        len,
                        replacement: old_line.clone(),
                        canon: canon_span,
                    });
                }
            }
        }
    }

    if candidates.is_empty() {
        return new_lines.to_vec();
    }

    // Keep only spans whose canonical match is unique in the new output
    let mut canon_counts: HashMap<String, usize> = HashMap::new();
    for c in &candidates {
        *canon_counts.entry(c.canon.clone()).or_insert(0) += 1;
    }
    let mut unique: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| canon_counts.get(&c.canon).copied().unwrap_or(0) == 1)
        .collect();

    if unique.is_empty() {
        return new_lines.to_vec();
    }

    // Back-to-front application keeps earlier indices stable
    unique.sort_by(|a, b| b.start.cmp(&a.start));

    let mut out: Vec<String> = new_lines.to_vec();
    for c in unique {
        out.splice(
            c.start..c.start + c.len,
            std::iter::once(c.replacement.clone()),
        );
    }
    out
}

/// Strip an echoed anchor line from the head of insert-after content.
pub fn strip_insert_anchor_echo_after(anchor_line: &str, dst_lines: &[String]) -> Vec<String> {
    if dst_lines.len() <= 1 {
        return dst_lines.to_vec();
    }
    if equals_ignoring_whitespace(&dst_lines[0], anchor_line) {
        dst_lines[1..].to_vec()
    } else {
        dst_lines.to_vec()
    }
}

/// Strip an echoed anchor line from the tail of insert-before content.
pub fn strip_insert_anchor_echo_before(anchor_line: &str, dst_lines: &[String]) -> Vec<String> {
    if dst_lines.len() <= 1 {
        return dst_lines.to_vec();
    }
    if equals_ignoring_whitespace(dst_lines.last().unwrap(), anchor_line) {
        dst_lines[..dst_lines.len() - 1].to_vec()
    } else {
        dst_lines.to_vec()
    }
}

/// Strip echoed boundary lines from range replacement content.
///
/// Only applies when the replacement is strictly larger than the deleted
/// span, and each individual strip keeps it at least as large as that
/// span, so a replace can never collapse into a deletion even when both
/// boundaries look echoed.
pub fn strip_range_boundary_echo(
    file_lines: &[String],
    start_line: usize,
    end_line: usize,
    dst_lines: &[String],
) -> Vec<String> {
    let count = end_line - start_line + 1;
    if dst_lines.len() <= 1 || dst_lines.len() <= count {
        return dst_lines.to_vec();
    }

    let mut out = dst_lines.to_vec();

    // First dst line echoing the line before the range
    if start_line >= 2 && out.len() > count {
        let before_idx = start_line - 2;
        if equals_ignoring_whitespace(&out[0], &file_lines[before_idx]) {
            out.remove(0);
        }
    }

    // Last dst line echoing the line after the range
    let after_idx = end_line; // 0-indexed position of the line after a 1-indexed range end
    if after_idx < file_lines.len()
        && out.len() > count
        && equals_ignoring_whitespace(out.last().unwrap(), &file_lines[after_idx])
    {
        out.pop();
    }

    out
}

/// Detect when the replacement for a single-line edit absorbed an adjacent
/// continuation line, and expand the splice to cover both.
///
/// Returns `(start_line, delete_count, replacement)` when a merge is
/// detected. The absorbed neighbor must not itself be explicitly
/// referenced by another edit in the batch.
pub fn maybe_expand_single_line_merge(
    line: usize,
    dst: &[String],
    file_lines: &[String],
    explicitly_touched_lines: &std::collections::HashSet<usize>,
) -> Option<(usize, usize, Vec<String>)> {
    if dst.len() != 1 {
        return None;
    }
    if line < 1 || line > file_lines.len() {
        return None;
    }

    let new_line = &dst[0];
    let new_canon = strip_all_whitespace(new_line);
    let new_canon_for_merge_ops = strip_merge_operator_chars(&new_canon);
    if new_canon.is_empty() {
        return None;
    }

    let orig = &file_lines[line - 1];
    let orig_canon = strip_all_whitespace(orig);
    let orig_canon_for_match = strip_trailing_continuation_tokens(&orig_canon);
    let orig_canon_for_merge_ops = strip_merge_operator_chars(&orig_canon);
    let orig_looks_like_continuation = orig_canon_for_match.len() < orig_canon.len();
    if orig_canon.is_empty() {
        return None;
    }

    let next_idx = line; // 0-indexed next line
    let prev_idx = if line >= 2 { Some(line - 2) } else { None };

    // Case A: dst absorbed the next continuation line
    if orig_looks_like_continuation
        && next_idx < file_lines.len()
        && !explicitly_touched_lines.contains(&(line + 1))
    {
        let next = &file_lines[next_idx];
        let next_canon = strip_all_whitespace(next);
        if !next_canon.is_empty() {
            if let (Some(a), Some(b)) = (
                new_canon.find(&*orig_canon_for_match),
                new_canon.find(&*next_canon),
            ) {
                if a < b && new_canon.len() <= orig_canon.len() + next_canon.len() + 32 {
                    return Some((line, 2, vec![new_line.clone()]));
                }
            }
        }
    }

    // Case B: dst absorbed the previous declaration/continuation line
    if let Some(prev_idx) = prev_idx {
        if !explicitly_touched_lines.contains(&(line - 1)) {
            let prev = &file_lines[prev_idx];
            let prev_canon = strip_all_whitespace(prev);
            let prev_canon_for_match = strip_trailing_continuation_tokens(&prev_canon);
            let prev_looks_like_continuation = prev_canon_for_match.len() < prev_canon.len();
            if !prev_looks_like_continuation {
                return None;
            }
            let a =
                new_canon_for_merge_ops.find(&strip_merge_operator_chars(&prev_canon_for_match));
            let b = new_canon_for_merge_ops.find(&orig_canon_for_merge_ops);
            if let (Some(a), Some(b)) = (a, b) {
                if a < b && new_canon.len() <= prev_canon.len() + orig_canon.len() + 32 {
                    return Some((line - 1, 2, vec![new_line.clone()]));
                }
            }
        }
    }

    None
}

/// The shared repair chain for replace-style edits, run on the replacement
/// derived from the computed splice indices. Each step is weaker than the
/// one before it; none moves text across non-adjacent regions.
pub fn repair_replacement_lines(old_lines: &[String], new_lines: &[String]) -> Vec<String> {
    let repaired = restore_old_wrapped_lines(old_lines, new_lines);
    let repaired = preserve_paired_whitespace_only(old_lines, &repaired);
    let repaired = preserve_loose_whitespace_matches(old_lines, &repaired);
    restore_indent_for_paired_replacement(old_lines, &repaired)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn strips_display_prefixes_by_majority() {
        let input = lines(&["12:ab| const x = 1", "13:cd| const y = 2"]);
        let out = strip_replacement_prefixes(&input);
        assert_eq!(out, lines(&["const x = 1", "const y = 2"]));
    }

    #[test]
    fn strips_display_prefix_without_space() {
        let input = lines(&["12:ab|const x = 1"]);
        let out = strip_replacement_prefixes(&input);
        assert_eq!(out, lines(&["const x = 1"]));
    }

    #[test]
    fn keeps_minority_prefix() {
        let input = lines(&["1:ab| prefixed", "plain one", "plain two"]);
        let out = strip_replacement_prefixes(&input);
        assert_eq!(out, input);
    }

    #[test]
    fn strips_diff_plus_by_majority() {
        let input = lines(&["+foo();", "+bar();"]);
        let out = strip_replacement_prefixes(&input);
        assert_eq!(out, lines(&["foo();", "bar();"]));
    }

    #[test]
    fn double_plus_is_not_a_diff_marker() {
        let input = lines(&["++counter;"]);
        let out = strip_replacement_prefixes(&input);
        assert_eq!(out, input);
    }

    #[test]
    fn never_strips_both_prefix_kinds() {
        // Display prefixes win; the inner '+' stays put
        let input = lines(&["1:ab| +kept", "2:cd| +kept too"]);
        let out = strip_replacement_prefixes(&input);
        assert_eq!(out, lines(&["+kept", "+kept too"]));
    }

    #[test]
    fn paired_whitespace_only_restores_original() {
        let old = lines(&["    let x = 1;", "    let y = 2;"]);
        let new = lines(&["let x  =  1;", "    let z = 3;"]);
        let out = preserve_paired_whitespace_only(&old, &new);
        assert_eq!(out, lines(&["    let x = 1;", "    let z = 3;"]));
    }

    #[test]
    fn loose_whitespace_match_restores_original() {
        let old = lines(&["    alpha();", "    beta();", "    gamma();"]);
        let new = lines(&["alpha();", "    replaced();"]);
        let out = preserve_loose_whitespace_matches(&old, &new);
        assert_eq!(out, lines(&["    alpha();", "    replaced();"]));
    }

    #[test]
    fn loose_match_ignores_duplicated_signatures() {
        let old = lines(&["    x();", "    x();", "    y();"]);
        let new = lines(&["x();"]);
        let out = preserve_loose_whitespace_matches(&old, &new);
        assert_eq!(out, lines(&["x();"]));
    }

    #[test]
    fn indent_restored_for_paired_lines() {
        let old = lines(&["    original();"]);
        let new = lines(&["replacement();"]);
        let out = restore_indent_for_paired_replacement(&old, &new);
        assert_eq!(out, lines(&["    replacement();"]));
    }

    #[test]
    fn indent_not_restored_when_new_line_has_indent() {
        let old = lines(&["    original();"]);
        let new = lines(&["  replacement();"]);
        let out = restore_indent_for_paired_replacement(&old, &new);
        assert_eq!(out, new);
    }

    #[test]
    fn wrapped_line_restored() {
        let old = lines(&["const x = aaaa + bbbb + cccc;"]);
        let new = lines(&["const x = aaaa", "+ bbbb", "+ cccc;"]);
        let out = restore_old_wrapped_lines(&old, &new);
        assert_eq!(out, old);
    }

    #[test]
    fn wrapped_line_not_restored_when_tokens_differ() {
        let old = lines(&["const x = aaaa + bbbb;"]);
        let new = lines(&["const x = aaaa", "+ dddd;"]);
        let out = restore_old_wrapped_lines(&old, &new);
        assert_eq!(out, new);
    }

    #[test]
    fn insert_after_echo_stripped() {
        let out = strip_insert_anchor_echo_after("anchor();", &lines(&["anchor();", "new();"]));
        assert_eq!(out, lines(&["new();"]));
    }

    #[test]
    fn insert_before_echo_stripped() {
        let out = strip_insert_anchor_echo_before("anchor();", &lines(&["new();", "anchor();"]));
        assert_eq!(out, lines(&["new();"]));
    }

    #[test]
    fn insert_echo_kept_for_single_line_content() {
        let out = strip_insert_anchor_echo_after("anchor();", &lines(&["anchor();"]));
        assert_eq!(out, lines(&["anchor();"]));
    }

    #[test]
    fn boundary_echo_not_applied_to_shrinking_replacement() {
        let file = lines(&["a", "b", "c", "d"]);
        // Replacing 2..=3 with a single line: same-size-or-smaller, untouched
        let out = strip_range_boundary_echo(&file, 2, 3, &lines(&["only"]));
        assert_eq!(out, lines(&["only"]));
    }

    #[test]
    fn boundary_echo_cannot_empty_single_line_replacement() {
        // Both replacement lines echo the neighbors; only the head strip may
        // fire, so the replacement keeps at least one line.
        let file = lines(&["A", "TARGET", "C"]);
        let out = strip_range_boundary_echo(&file, 2, 2, &lines(&["A", "C"]));
        assert_eq!(out, lines(&["C"]));
    }

    #[test]
    fn confusable_hyphens_normalized() {
        let s = "devtools\u{2013}bridge \u{2212}flag";
        assert!(has_confusable_hyphens(s));
        assert_eq!(normalize_confusable_hyphens(s), "devtools-bridge -flag");
    }

    #[test]
    fn ascii_hyphen_untouched() {
        assert!(!has_confusable_hyphens("plain-hyphen"));
    }

    #[test]
    fn merge_absorbs_next_continuation() {
        let file = lines(&["    a() &&", "    b()", "tail();"]);
        let touched: std::collections::HashSet<usize> = [1].into_iter().collect();
        let got = maybe_expand_single_line_merge(
            1,
            &lines(&["a() || b()"]),
            &file,
            &touched,
        );
        let (start, count, replacement) = got.expect("merge detected");
        assert_eq!((start, count), (1, 2));
        assert_eq!(replacement, lines(&["a() || b()"]));
    }

    #[test]
    fn merge_skipped_when_neighbor_is_referenced() {
        let file = lines(&["    a() &&", "    b()", "tail();"]);
        let touched: std::collections::HashSet<usize> = [1, 2].into_iter().collect();
        let got = maybe_expand_single_line_merge(
            1,
            &lines(&["a() || b()"]),
            &file,
            &touched,
        );
        assert!(got.is_none());
    }

    #[test]
    fn merge_rejected_when_replacement_too_long() {
        let file = lines(&["a +", "b"]);
        let touched = std::collections::HashSet::new();
        let padded = format!("a + b{}", "x".repeat(64));
        let got = maybe_expand_single_line_merge(1, &lines(&[padded.as_str()]), &file, &touched);
        assert!(got.is_none());
    }
}
