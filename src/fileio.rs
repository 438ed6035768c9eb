use std::fs;
use std::io;
use std::path::Path;

const BOM: &str = "\u{FEFF}";

/// How many leading lines vote on the dominant line ending.
const ENDING_SAMPLE_LINES: usize = 100;

/// The line ending most common in a file; governs the output ending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// A decoded file: LF-normalized body plus everything needed to write it
/// back byte-faithfully (BOM, dominant ending, trailing newline).
///
/// All edit operations run on `content`; `render` re-encodes as
/// `BOM + rejoin(lines, original ending)`.
#[derive(Debug, Clone)]
pub struct FileText {
    pub content: String,
    pub bom: bool,
    pub ending: LineEnding,
    pub trailing_newline: bool,
}

/// Majority ending among the first [`ENDING_SAMPLE_LINES`] lines.
/// Empty files and files without newlines default to LF.
pub fn detect_dominant_ending(text: &str) -> LineEnding {
    let mut crlf = 0usize;
    let mut lf = 0usize;
    let mut rest = text;
    for _ in 0..ENDING_SAMPLE_LINES {
        match rest.find('\n') {
            None => break,
            Some(pos) => {
                if pos > 0 && rest.as_bytes()[pos - 1] == b'\r' {
                    crlf += 1;
                } else {
                    lf += 1;
                }
                rest = &rest[pos + 1..];
            }
        }
    }
    if crlf > lf {
        LineEnding::CrLf
    } else {
        LineEnding::Lf
    }
}

impl FileText {
    /// Decode raw file text: extract a leading UTF-8 BOM, detect the
    /// dominant line ending, normalize CRLF to LF, and strip (but record)
    /// a trailing newline.
    pub fn new(raw: &str) -> Self {
        let (bom, body) = match raw.strip_prefix(BOM) {
            Some(stripped) => (true, stripped),
            None => (false, raw),
        };
        let ending = detect_dominant_ending(body);
        let mut content = body.replace("\r\n", "\n");
        let trailing_newline = content.ends_with('\n');
        if trailing_newline {
            content.truncate(content.len() - 1);
        }
        FileText {
            content,
            bom,
            ending,
            trailing_newline,
        }
    }

    pub fn read(path: &Path) -> io::Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(Self::new(&raw))
    }

    /// Re-encode: BOM, body with the original ending restored at every
    /// inter-line boundary, original trailing newline.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.content.len() + 8);
        if self.bom {
            out.push_str(BOM);
        }
        match self.ending {
            LineEnding::Lf => out.push_str(&self.content),
            LineEnding::CrLf => out.push_str(&self.content.replace('\n', "\r\n")),
        }
        if self.trailing_newline {
            out.push_str(self.ending.as_str());
        }
        out
    }

    /// Single write-with-truncate; edits are single-file and
    /// caller-serialized, so no rename dance is needed.
    pub fn write(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.render())
    }
}
