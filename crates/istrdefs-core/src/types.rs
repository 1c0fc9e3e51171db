//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Extensions treated as C++ sources. Matching is case-sensitive.
const CXX_EXTENSIONS: &[&str] = &["cc", "cp", "cxx", "cpp", "CPP", "c++", "C"];

/// Source language, used to pick the flag set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    C,
    Cxx,
}

impl Language {
    /// Classify a path by its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext == "c" {
            Some(Language::C)
        } else if CXX_EXTENSIONS.contains(&ext) {
            Some(Language::Cxx)
        } else {
            None
        }
    }

    /// Whether a path names a recognized C or C++ source
    pub fn is_source(path: &Path) -> bool {
        Self::from_path(path).is_some()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::C => f.write_str("C"),
            Language::Cxx => f.write_str("C++"),
        }
    }
}

/// A source file with its classified language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub language: Language,
}

impl SourceFile {
    /// Classify a path; `None` for anything that is not C or C++
    pub fn classify(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let language = Language::from_path(&path)?;
        Some(Self { path, language })
    }
}

/// Ordered files of one language sharing a flag set
#[derive(Debug, Clone, Default)]
pub struct LanguageGroup {
    pub files: Vec<PathBuf>,
    pub flags: Vec<String>,
}

impl LanguageGroup {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A `# <n> "<file>"` or `#line <n> "<file>"` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMarker {
    /// Line number announced by the marker
    pub line: u64,
    /// File the following lines originate from
    pub file: String,
}

impl LineMarker {
    /// Whether the marker names a C or C++ source
    pub fn is_source(&self) -> bool {
        Language::is_source(Path::new(&self.file))
    }
}

/// One extracted symbol or literal, in its canonical text form
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExtractionRecord(pub String);

impl ExtractionRecord {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtractionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a split pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSummary {
    /// Artifacts written or rewritten
    pub artifacts: usize,
    /// Records extracted across all files
    pub records: usize,
    /// Stale artifacts removed
    pub removed: usize,
}

/// Outcome of the digest gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateStatus {
    Updated,
    NotUpdated,
}

impl fmt::Display for AggregateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateStatus::Updated => f.write_str("updated"),
            AggregateStatus::NotUpdated => f.write_str("not updated"),
        }
    }
}

/// Result of an aggregate pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub status: AggregateStatus,
    /// Hex digest of the merged output
    pub digest: String,
    /// Artifacts read
    pub artifacts: usize,
    /// Lines in the merged output
    pub lines: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_path() {
        assert_eq!(Language::from_path(Path::new("main.c")), Some(Language::C));
        assert_eq!(Language::from_path(Path::new("x/y.cpp")), Some(Language::Cxx));
        assert_eq!(Language::from_path(Path::new("y.c++")), Some(Language::Cxx));
        assert_eq!(Language::from_path(Path::new("Y.C")), Some(Language::Cxx));
        assert_eq!(Language::from_path(Path::new("Y.CPP")), Some(Language::Cxx));
        assert_eq!(Language::from_path(Path::new("Y.Cpp")), None);
        assert_eq!(Language::from_path(Path::new("istr.h")), None);
        assert_eq!(Language::from_path(Path::new("<built-in>")), None);
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_marker_is_source() {
        let marker = LineMarker { line: 1, file: "src/a.c".into() };
        assert!(marker.is_source());
        let marker = LineMarker { line: 1, file: "/usr/include/stdio.h".into() };
        assert!(!marker.is_source());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(AggregateStatus::Updated.to_string(), "updated");
        assert_eq!(AggregateStatus::NotUpdated.to_string(), "not updated");
    }
}
