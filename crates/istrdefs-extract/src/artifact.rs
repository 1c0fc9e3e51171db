//! Artifact Writer
//!
//! Persists the records extracted for one originating file to
//! `<sanitized-path>.<mode>` inside the artifact directory.

use crate::persist::{ensure_dir, write_atomic};
use istrdefs_core::{ExtractionRecord, Mode, Result, SplitSummary};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Substitutions applied in order when naming an artifact
const SANITIZE_RULES: &[(&str, &str)] = &[("/", "__"), ("\\", "__"), (":", "@"), ("..", "@@")];

/// Artifact file name for an originating file.
///
/// Distinct paths can map to the same name (`a/b.c` and `a__b.c`).
/// [`ArtifactWriter`] detects that within a run and merges the records.
pub fn sanitize_artifact_name(file: &str, mode: Mode) -> String {
    let mut name = file.to_string();
    for (from, to) in SANITIZE_RULES {
        name = name.replace(from, to);
    }
    format!("{}.{}", name, mode.as_str())
}

/// Receives each originating file's records when the splitter leaves it
pub trait ArtifactSink {
    /// Called once per file transition and at stream end; `records` may be
    /// empty when a source produced nothing.
    fn flush(&mut self, file: &str, records: &[ExtractionRecord]) -> Result<()>;
}

/// Writes artifacts into a directory
pub struct ArtifactWriter {
    dir: PathBuf,
    mode: Mode,
    /// Artifact names written this run, with the file that first claimed them
    written: HashMap<String, String>,
    summary: SplitSummary,
}

impl ArtifactWriter {
    /// Create a writer, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>, mode: Mode) -> Result<Self> {
        let dir = dir.into();
        ensure_dir(&dir)?;
        Ok(Self {
            dir,
            mode,
            written: HashMap::new(),
            summary: SplitSummary::default(),
        })
    }

    /// Path of the artifact for an originating file
    pub fn artifact_path(&self, file: &str) -> PathBuf {
        self.dir.join(sanitize_artifact_name(file, self.mode))
    }

    /// Counts for everything flushed so far
    pub fn summary(&self) -> &SplitSummary {
        &self.summary
    }

    pub fn into_summary(self) -> SplitSummary {
        self.summary
    }

    fn remove_stale(&mut self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!("Removed stale artifact {:?}", path);
                self.summary.removed += 1;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl ArtifactSink for ArtifactWriter {
    fn flush(&mut self, file: &str, records: &[ExtractionRecord]) -> Result<()> {
        let name = sanitize_artifact_name(file, self.mode);
        let path = self.dir.join(&name);

        match self.written.get(&name) {
            Some(owner) => {
                if owner != file {
                    warn!(
                        "Artifact name collision: {:?} and {:?} both map to {}; merging records",
                        owner, file, name
                    );
                }
                if records.is_empty() {
                    return Ok(());
                }
                // Revisited later in the stream: keep what this run already wrote.
                let mut contents = fs::read_to_string(&path)?;
                contents.push_str(&render(records));
                write_atomic(&path, contents.as_bytes())?;
                debug!("Appended {} records to {:?}", records.len(), path);
            }
            None => {
                if records.is_empty() {
                    return self.remove_stale(&path);
                }
                write_atomic(&path, render(records).as_bytes())?;
                debug!("Wrote {} records to {:?}", records.len(), path);
                self.written.insert(name, file.to_string());
                self.summary.artifacts += 1;
            }
        }

        self.summary.records += records.len();
        Ok(())
    }
}

/// One record per line, each newline-terminated
fn render(records: &[ExtractionRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(record.as_str());
        out.push('\n');
    }
    out
}
