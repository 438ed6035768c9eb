use serde::Deserialize;
use strsim::normalized_levenshtein;

/// Minimum similarity for a fuzzy window to count as a candidate.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// How many scored windows a failure diagnostic shows.
const MAX_REPORTED_CANDIDATES: usize = 5;

/// Options for [`find_edit_match`].
#[derive(Debug, Clone)]
pub struct MatchOptions {
    pub allow_fuzzy: bool,
    pub similarity_threshold: f64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            allow_fuzzy: true,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// A located occurrence: byte offset into the content plus the verbatim
/// text to replace, so the caller can perform a byte-level splice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan {
    pub start_index: usize,
    pub actual_text: String,
}

/// A near-miss window with its similarity score.
#[derive(Debug, Clone)]
pub struct FuzzyCandidate {
    pub text: String,
    pub score: f64,
}

/// Outcome of a match attempt. Always a structured result, never an
/// error: the caller decides how to surface ambiguity or misses.
#[derive(Debug, Clone, Default)]
pub struct EditMatch {
    /// The unique span to replace, when one was found.
    pub span: Option<MatchSpan>,
    /// Exact occurrence count, when exact matching ran to completion.
    pub occurrences: Option<usize>,
    /// Closest candidate window for diagnostics when nothing matched.
    pub closest: Option<String>,
    /// All windows at or above the threshold (ambiguous when > 1).
    pub fuzzy_matches: Vec<FuzzyCandidate>,
}

/// JSON params for the CLI `replace` command.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceParams {
    pub path: String,
    pub old_text: String,
    pub new_text: String,
    #[serde(default = "default_allow_fuzzy")]
    pub allow_fuzzy: bool,
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f64,
}

fn default_allow_fuzzy() -> bool {
    true
}

fn default_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

/// Collapse runs of whitespace to single spaces and trim line edges,
/// keeping line boundaries. This is the equivalence used for scoring.
fn normalize_for_match(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            let mut out = String::with_capacity(line.len());
            let mut pending_space = false;
            for c in line.chars() {
                if c.is_whitespace() {
                    pending_space = !out.is_empty();
                } else {
                    if pending_space {
                        out.push(' ');
                        pending_space = false;
                    }
                    out.push(c);
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Locate a unique occurrence of `old_text` in `content`.
///
/// Exact matches are counted first: two or more report the occurrence
/// count and no span (the caller must disambiguate); exactly one is
/// returned directly. With no exact match, a fuzzy pass slides a window
/// of `old_text`'s line count over the content and scores each window by
/// normalized Levenshtein over whitespace-collapsed text. Exactly one
/// window at or above the threshold is a match; several are ambiguous;
/// none returns the closest window for diagnostics.
pub fn find_edit_match(content: &str, old_text: &str, opts: &MatchOptions) -> EditMatch {
    if old_text.is_empty() {
        return EditMatch::default();
    }

    let mut exact = content.match_indices(old_text);
    if let Some((pos, _)) = exact.next() {
        let extra = exact.count();
        if extra > 0 {
            return EditMatch {
                occurrences: Some(extra + 1),
                ..EditMatch::default()
            };
        }
        return EditMatch {
            span: Some(MatchSpan {
                start_index: pos,
                actual_text: old_text.to_string(),
            }),
            occurrences: Some(1),
            ..EditMatch::default()
        };
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let window = old_text.split('\n').count();
    if window > lines.len() {
        return EditMatch::default();
    }

    // Byte offset of each line start, for span extraction
    let mut offsets = Vec::with_capacity(lines.len());
    let mut acc = 0usize;
    for line in &lines {
        offsets.push(acc);
        acc += line.len() + 1;
    }

    let target = normalize_for_match(old_text);
    let mut hits: Vec<(usize, f64)> = Vec::new();
    let mut best: Option<(usize, f64)> = None;

    for start in 0..=(lines.len() - window) {
        let candidate = lines[start..start + window].join("\n");
        let score = normalized_levenshtein(&target, &normalize_for_match(&candidate));
        if best.map_or(true, |(_, b)| score > b) {
            best = Some((start, score));
        }
        if score >= opts.similarity_threshold {
            hits.push((start, score));
        }
    }

    let window_text =
        |start: usize| -> String { lines[start..start + window].join("\n") };
    let closest = best.map(|(start, _)| window_text(start));

    if !opts.allow_fuzzy {
        return EditMatch {
            closest,
            ..EditMatch::default()
        };
    }

    match hits.len() {
        1 => {
            let (start, _) = hits[0];
            EditMatch {
                span: Some(MatchSpan {
                    start_index: offsets[start],
                    actual_text: window_text(start),
                }),
                ..EditMatch::default()
            }
        }
        0 => EditMatch {
            closest,
            fuzzy_matches: best
                .map(|(start, score)| FuzzyCandidate {
                    text: window_text(start),
                    score,
                })
                .into_iter()
                .collect(),
            ..EditMatch::default()
        },
        _ => EditMatch {
            fuzzy_matches: hits
                .iter()
                .map(|&(start, score)| FuzzyCandidate {
                    text: window_text(start),
                    score,
                })
                .collect(),
            ..EditMatch::default()
        },
    }
}

/// Render a failed or ambiguous match as a retry-guiding message.
pub fn format_match_failure(old_text: &str, result: &EditMatch) -> String {
    let mut out = Vec::new();
    match result.occurrences {
        Some(n) if n > 1 => {
            out.push(format!(
                "old_text matches {} locations. Add surrounding context to make it unique.",
                n
            ));
        }
        _ if result.fuzzy_matches.len() > 1 => {
            out.push(format!(
                "old_text matches {} regions above the similarity threshold. Add surrounding context to make it unique.",
                result.fuzzy_matches.len()
            ));
        }
        _ => {
            out.push("old_text was not found in the file.".to_string());
        }
    }
    out.push(String::new());
    out.push("Provided text:".to_string());
    out.push(old_text.to_string());

    if let Some(closest) = &result.closest {
        out.push(String::new());
        out.push("Closest content:".to_string());
        out.push(closest.clone());
    }
    if !result.fuzzy_matches.is_empty() {
        out.push(String::new());
        out.push("Candidate regions:".to_string());
        for candidate in result.fuzzy_matches.iter().take(MAX_REPORTED_CANDIDATES) {
            out.push(format!(
                "  ({:.0}% similar) {}",
                candidate.score * 100.0,
                candidate.text.replace('\n', "\\n")
            ));
        }
        if result.fuzzy_matches.len() > MAX_REPORTED_CANDIDATES {
            out.push(format!(
                "  ... {} more",
                result.fuzzy_matches.len() - MAX_REPORTED_CANDIDATES
            ));
        }
    }
    out.join("\n")
}
