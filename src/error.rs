use crate::hash::compute_line_hash;
use std::fmt;

/// A single hash mismatch found during validation.
#[derive(Debug, Clone)]
pub struct HashMismatch {
    pub line: usize,
    pub expected: String,
    pub actual: String,
}

/// Number of context lines shown above/below each mismatched line.
const MISMATCH_CONTEXT: usize = 2;

/// How many candidate previews an ambiguity message shows.
const AMBIGUITY_PREVIEWS: usize = 5;

/// Error when one or more line references have stale hashes.
///
/// Mismatches are collected across the whole batch so the caller can
/// correct every stale reference in one round-trip.
#[derive(Debug, Clone)]
pub struct HashlineMismatchError {
    pub mismatches: Vec<HashMismatch>,
    pub file_lines: Vec<String>,
}

impl HashlineMismatchError {
    pub fn new(mismatches: Vec<HashMismatch>, file_lines: Vec<String>) -> Self {
        Self {
            mismatches,
            file_lines,
        }
    }

    pub fn format_message(&self) -> String {
        use std::fmt::Write as _;

        let total = self.file_lines.len();
        let stale: std::collections::BTreeSet<usize> =
            self.mismatches.iter().map(|m| m.line).collect();

        // Context windows around each stale line, merged wherever they
        // touch or overlap. Stale lines come out of the set sorted, so a
        // single pass over the last region suffices.
        let mut regions: Vec<(usize, usize)> = Vec::new();
        for &line in &stale {
            let lo = line.saturating_sub(MISMATCH_CONTEXT).max(1);
            let hi = (line + MISMATCH_CONTEXT).min(total);
            match regions.last_mut() {
                Some(last) if lo <= last.1 + 1 => last.1 = last.1.max(hi),
                _ => regions.push((lo, hi)),
            }
        }

        let count = self.mismatches.len();
        let mut report = format!(
            "{} line{} changed since last read. Use the updated LINE:HASH references shown below (>>> marks changed lines).\n",
            count,
            if count > 1 { "s have" } else { " has" }
        );
        for (i, &(lo, hi)) in regions.iter().enumerate() {
            if i > 0 {
                report.push_str("\n    ...");
            }
            for line_no in lo..=hi {
                let content = &self.file_lines[line_no - 1];
                let marker = if stale.contains(&line_no) { ">>>" } else { "   " };
                let _ = write!(
                    report,
                    "\n{} {}:{}| {}",
                    marker,
                    line_no,
                    compute_line_hash(line_no, content),
                    content
                );
            }
        }
        report
    }

    /// Build a map from old "LINE:HASH" → new "LINE:HASH" for each mismatch.
    pub fn remaps(&self) -> std::collections::HashMap<String, String> {
        self.mismatches
            .iter()
            .map(|m| {
                let fresh = compute_line_hash(m.line, &self.file_lines[m.line - 1]);
                (
                    format!("{}:{}", m.line, m.expected),
                    format!("{}:{}", m.line, fresh),
                )
            })
            .collect()
    }
}

impl fmt::Display for HashlineMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_message())
    }
}

impl std::error::Error for HashlineMismatchError {}

/// Which kind of unique-match requirement was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbiguityKind {
    SubstringMultiple,
    FuzzyMultiple,
}

impl AmbiguityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AmbiguityKind::SubstringMultiple => "substring-multiple",
            AmbiguityKind::FuzzyMultiple => "fuzzy-multiple",
        }
    }
}

/// Top-level error of the edit engine.
///
/// `Mismatch` is the only aggregated tier; everything else is fatal on
/// first occurrence. Any error leaves the file unmodified.
#[derive(Debug)]
pub enum EditError {
    Mismatch(HashlineMismatchError),
    Validation(String),
    Ambiguity {
        kind: AmbiguityKind,
        candidates: Vec<String>,
    },
}

impl EditError {
    pub fn validation(msg: impl Into<String>) -> Self {
        EditError::Validation(msg.into())
    }
}

impl From<HashlineMismatchError> for EditError {
    fn from(err: HashlineMismatchError) -> Self {
        EditError::Mismatch(err)
    }
}

impl From<String> for EditError {
    fn from(msg: String) -> Self {
        EditError::Validation(msg)
    }
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::Mismatch(err) => write!(f, "{}", err),
            EditError::Validation(msg) => write!(f, "{}", msg),
            EditError::Ambiguity { kind, candidates } => {
                writeln!(
                    f,
                    "Ambiguous match ({}): {} candidate lines. Add more context to make the target unique.",
                    kind.as_str(),
                    candidates.len()
                )?;
                for candidate in candidates.iter().take(AMBIGUITY_PREVIEWS) {
                    writeln!(f, "  {}", candidate)?;
                }
                if candidates.len() > AMBIGUITY_PREVIEWS {
                    write!(f, "  ... {} more", candidates.len() - AMBIGUITY_PREVIEWS)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for EditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EditError::Mismatch(err) => Some(err),
            _ => None,
        }
    }
}
