use crate::hash::compute_line_hash;

/// Format file content with hashline prefixes for display.
///
/// Each line becomes `LINENUM:HASH| CONTENT` where LINENUM is 1-indexed.
/// Stripping the prefix from every line recovers the input verbatim.
pub fn format_hashlines(content: &str, start_line: usize) -> String {
    content
        .split('\n')
        .enumerate()
        .map(|(i, line)| {
            let num = start_line + i;
            let hash = compute_line_hash(num, line);
            format!("{}:{}| {}", num, hash, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
