use clap::{builder::RangedU64ValueParser, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hashedit",
    version,
    about = "Line-addressable file editing with content hashes"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read a file and output hashline-formatted content
    Read {
        /// File path to read
        file: String,
        /// Starting line number (1-indexed, default 1)
        #[arg(long, default_value_t = 1, value_parser = RangedU64ValueParser::<usize>::new().range(1..=(u32::MAX as u64)))]
        start_line: usize,
        /// Maximum number of lines to output
        #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..=(u32::MAX as u64)))]
        lines: Option<usize>,
    },
    /// Apply hashline edits from JSON ({"path", "edits": [{"src", "dst"}]})
    Apply {
        /// Read params from this file instead of stdin
        #[arg(long)]
        input: Option<String>,
        /// Print updated hashline references around the first change
        #[arg(long)]
        emit_updated: bool,
    },
    /// Apply a find/replace edit from JSON ({"path", "old_text", "new_text"})
    Replace {
        /// Read params from this file instead of stdin
        #[arg(long)]
        input: Option<String>,
        /// Print updated hashline references around the change
        #[arg(long)]
        emit_updated: bool,
    },
    /// Output line hashes for a file
    Hash {
        /// File path to hash
        file: String,
    },
}
