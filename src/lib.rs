pub mod edit;
pub mod error;
pub mod fileio;
pub mod format;
pub mod hash;
pub mod heuristics;
pub mod matcher;
pub mod parse;

pub use edit::{apply_hashline_edits, ApplyResult, Edit, HashlineParams, NoopEdit};
pub use error::{AmbiguityKind, EditError, HashMismatch, HashlineMismatchError};
pub use fileio::{FileText, LineEnding};
pub use format::format_hashlines;
pub use hash::compute_line_hash;
pub use matcher::{
    find_edit_match, format_match_failure, EditMatch, FuzzyCandidate, MatchOptions, MatchSpan,
    ReplaceParams,
};
pub use parse::{parse_edit_spec, parse_line_ref, EditSpec, LineRef};
