//! Configuration types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Extraction mode, fixed for a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// `ISTR_FOO` tokens, emitted as `Q(FOO)`
    Istr,
    /// `ISTR_COMPRESSED_ROM_TEXT("...")` literals, emitted as their contents
    Compress,
}

impl Mode {
    /// Name used on the command line and as the artifact suffix
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Istr => "istr",
            Mode::Compress => "compress",
        }
    }

    /// Human-readable name used in status lines
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Istr => "ISTR",
            Mode::Compress => "Compressed data",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "istr" => Ok(Mode::Istr),
            "compress" => Ok(Mode::Compress),
            other => Err(Error::Config(format!(
                "mode {} unrecognised. Valid modes: istr, compress",
                other
            ))),
        }
    }
}

/// External preprocessor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessorConfig {
    /// Program followed by its leading arguments (e.g. `gcc -E -dD`)
    pub command: Vec<String>,

    /// Flags passed for C sources
    pub cflags: Vec<String>,

    /// Flags passed for C++ sources
    pub cxxflags: Vec<String>,

    /// Worker count; `None` uses the available parallelism
    pub jobs: Option<usize>,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            command: vec!["cc".into(), "-E".into()],
            cflags: Vec::new(),
            cxxflags: Vec::new(),
            jobs: None,
        }
    }
}

impl PreprocessorConfig {
    /// Check the configuration before any work begins
    pub fn validate(&self) -> Result<()> {
        match self.command.first() {
            Some(program) if !program.is_empty() => Ok(()),
            _ => Err(Error::Config("preprocessor command is empty".into())),
        }
    }

    /// Number of workers to fan chunks out to (at least 1)
    pub fn worker_count(&self) -> usize {
        self.jobs
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }
}

/// Which source files to preprocess this run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSelection {
    /// Full configured source list
    pub sources: Vec<PathBuf>,

    /// Sources changed since the last build
    pub changed: Vec<PathBuf>,

    /// Files that are already build dependencies
    pub dependencies: Vec<PathBuf>,
}

impl SourceSelection {
    /// Files to process: the full list when a changed file is already a
    /// dependency, otherwise the changed subset if any, otherwise the full list
    pub fn select(&self) -> &[PathBuf] {
        if self.changed.iter().any(|c| self.dependencies.contains(c)) {
            &self.sources
        } else if !self.changed.is_empty() {
            &self.changed
        } else {
            &self.sources
        }
    }
}
