use regex::Regex;
use std::sync::LazyLock;

/// A parsed line reference: 1-indexed line number + hash string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRef {
    pub line: usize,
    pub hash: String,
}

/// The parsed form of an edit `src` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditSpec {
    /// Replace exactly one line (empty replacement = delete).
    Single(LineRef),
    /// Replace the inclusive line range `start.line..=end.line`.
    Range { start: LineRef, end: LineRef },
    /// Insert lines after the anchor; the anchor line is unchanged.
    InsertAfter(LineRef),
    /// Insert lines before the anchor; the anchor line is unchanged.
    InsertBefore(LineRef),
    /// Fallback: locate the unique line containing this needle.
    Substring(String),
}

static STRICT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):([0-9a-fA-F]{1,2})$").unwrap());
static PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):([0-9a-fA-F]{2})").unwrap());
static COLON_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*:\s*").unwrap());

/// First `LINE:HASH` token anywhere in a string.
static REF_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+:[0-9a-fA-F]").unwrap());
/// A comma followed by another ref token — the signature of a pasted ref list.
static MULTI_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*\d+:[0-9a-fA-F]").unwrap());

/// Parse a line reference string like `"5:ab"` into structured form.
///
/// Handles display-format suffixes (`5:ab| content`) and `>>>` prefixes
/// re-pasted from mismatch reports. Hash comparison downstream is
/// case-insensitive; widths from 1 up to the canonical 2 are accepted.
pub fn parse_line_ref(ref_str: &str) -> Result<LineRef, String> {
    // Strip display-format suffix and leading >>> markers
    let cleaned = ref_str.split('|').next().unwrap_or(ref_str);
    let cleaned = cleaned.trim_start_matches('>').trim();
    // Normalize whitespace around the colon
    let normalized = COLON_WS_RE.replace(cleaned, ":").to_string();

    // Try strict match first
    if let Some(caps) = STRICT_RE.captures(&normalized) {
        let line: usize = caps[1]
            .parse()
            .map_err(|_| format!("Line number too large in {:?}.", ref_str))?;
        if line < 1 {
            return Err(format!(
                "Line number must be >= 1, got {} in {:?}.",
                line, ref_str
            ));
        }
        return Ok(LineRef {
            line,
            hash: caps[2].to_string(),
        });
    }

    // Then try prefix match (canonical-width hash with trailing pollution)
    if let Some(caps) = PREFIX_RE.captures(&normalized) {
        let line: usize = caps[1]
            .parse()
            .map_err(|_| format!("Line number too large in {:?}.", ref_str))?;
        if line < 1 {
            return Err(format!(
                "Line number must be >= 1, got {} in {:?}.",
                line, ref_str
            ));
        }
        return Ok(LineRef {
            line,
            hash: caps[2].to_string(),
        });
    }

    Err(format!(
        "Invalid line reference {:?}. Expected format \"LINE:HASH\" (e.g. \"5:aa\").",
        ref_str
    ))
}

/// Parse an edit `src` string into an [`EditSpec`].
///
/// Dispatch is ordered and deterministic:
/// 1. embedded newlines are rejected;
/// 2. apparent multi-ref lists (`"3:ab, 7:cd"`) are rejected;
/// 3. `"..L:HH"` is an insert-before;
/// 4. around the first `".."`: `"L:HH.."` is an insert-after,
///    `"L:HH..L:HH"` a range (equal line numbers coerce to a single-line
///    replace);
/// 5. a bare `"L:HH"` is a single-line replace;
/// 6. anything else becomes a substring needle. A `".."` form whose refs
///    do not parse also falls through here — needles legitimately contain
///    `".."` (ranges, ellipses).
pub fn parse_edit_spec(src: &str) -> Result<EditSpec, String> {
    if src.contains('\n') {
        return Err(format!(
            "Edit src must be a single line, got {:?}.",
            src
        ));
    }

    if let Some(first) = REF_TOKEN_RE.find(src) {
        if MULTI_REF_RE.is_match(&src[first.end()..]) {
            return Err(format!(
                "Edit src {:?} looks like a list of line references. Pass one edit per reference.",
                src
            ));
        }
    }

    if let Some(rest) = src.strip_prefix("..") {
        if !rest.contains("..") {
            if let Ok(anchor) = parse_line_ref(rest) {
                return Ok(EditSpec::InsertBefore(anchor));
            }
        }
    }

    if let Some(pos) = src.find("..") {
        let lhs = &src[..pos];
        let rhs = &src[pos + 2..];
        if let Ok(start) = parse_line_ref(lhs) {
            if rhs.is_empty() {
                return Ok(EditSpec::InsertAfter(start));
            }
            if let Ok(end) = parse_line_ref(rhs) {
                if start.line == end.line {
                    // Sub-line ranges are not supported
                    return Ok(EditSpec::Single(start));
                }
                return Ok(EditSpec::Range { start, end });
            }
        }
    }

    if let Ok(r) = parse_line_ref(src) {
        return Ok(EditSpec::Single(r));
    }

    let needle = src.trim();
    if needle.is_empty() {
        return Err(
            "Edit src is empty. Expected \"LINE:HASH\", a \"..\" range, or literal text to locate."
                .to_string(),
        );
    }
    Ok(EditSpec::Substring(needle.to_string()))
}
