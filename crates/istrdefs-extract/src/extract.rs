//! Symbol extraction
//!
//! Line-level matchers over preprocessor output:
//! - Line markers (`# 12 "file.c"` from GCC/Clang, `#line 12 "file.c"` from MSVC)
//! - `ISTR_FOO` tokens, emitted as `Q(FOO)`
//! - `ISTR_COMPRESSED_ROM_TEXT("...")` literals, emitted as their unescaped contents

use istrdefs_core::{ExtractionRecord, LineMarker, Mode};
use regex::Regex;

const MARKER_PATTERN: &str = r#"^#(?:line)?\s+(\d+)\s+"([^"]+)""#;
const ISTR_PATTERN: &str = r"ISTR_[_a-zA-Z0-9]+";
const COMPRESSED_PATTERN: &str = r#"ISTR_COMPRESSED_ROM_TEXT\("((?:[^"\\]|\\.)*)"\)"#;

const ISTR_PREFIX: &str = "ISTR_";

/// Parses line markers out of preprocessor output
pub struct MarkerParser {
    pattern: Regex,
}

impl MarkerParser {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(MARKER_PATTERN).expect("marker pattern is valid"),
        }
    }

    /// Parse a line marker; `None` if the line is not one
    pub fn parse(&self, line: &str) -> Option<LineMarker> {
        let caps = self.pattern.captures(line)?;
        Some(LineMarker {
            line: caps[1].parse().unwrap_or(0),
            file: caps[2].to_string(),
        })
    }
}

impl Default for MarkerParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Mode-specific macro matcher
pub struct Extractor {
    mode: Mode,
    pattern: Regex,
}

impl Extractor {
    /// Create the matcher for a run-wide mode
    pub fn new(mode: Mode) -> Self {
        let pattern = match mode {
            Mode::Istr => ISTR_PATTERN,
            Mode::Compress => COMPRESSED_PATTERN,
        };
        Self {
            mode,
            pattern: Regex::new(pattern).expect("extraction pattern is valid"),
        }
    }

    /// Extract every record on a line, in order of appearance
    pub fn extract_line(&self, line: &str, out: &mut Vec<ExtractionRecord>) {
        match self.mode {
            Mode::Istr => {
                for m in self.pattern.find_iter(line) {
                    let name = m.as_str().strip_prefix(ISTR_PREFIX).unwrap_or(m.as_str());
                    out.push(ExtractionRecord(format!("Q({})", name)));
                }
            }
            Mode::Compress => {
                for caps in self.pattern.captures_iter(line) {
                    out.push(ExtractionRecord(unescape_literal(&caps[1])));
                }
            }
        }
    }

    /// Convenience wrapper returning a fresh vector
    pub fn extract(&self, line: &str) -> Vec<ExtractionRecord> {
        let mut out = Vec::new();
        self.extract_line(line, &mut out);
        out
    }
}

/// Resolve `\"` and `\\`; every other escape sequence is kept verbatim for
/// the header generator.
pub fn unescape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next @ ('"' | '\\')) => out.push(next),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}
