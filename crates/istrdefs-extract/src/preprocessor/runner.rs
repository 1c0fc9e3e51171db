//! Parallel Preprocessor Runner
//!
//! Each language group is split into contiguous chunks, one preprocessor
//! invocation per chunk, run on a rayon pool sized to the worker count.
//! The first failing chunk aborts the whole run and nothing is written.

use crate::classify::{classify, SourceGroups};
use crate::persist::{ensure_dir, write_atomic};
use istrdefs_core::{LanguageGroup, PreprocessorConfig, SourceSelection};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during preprocessing
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("No preprocessor command configured")]
    NoCommand,

    #[error("Failed to run preprocessor {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Preprocessor {program} failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to build worker pool: {0}")]
    Pool(String),

    #[error("IO error")]
    IoError(#[from] std::io::Error),
}

impl From<PreprocessError> for istrdefs_core::Error {
    fn from(err: PreprocessError) -> Self {
        match err {
            PreprocessError::NoCommand => {
                istrdefs_core::Error::Config(PreprocessError::NoCommand.to_string())
            }
            PreprocessError::IoError(e) => istrdefs_core::Error::Io(e),
            other => istrdefs_core::Error::Preprocess(other.to_string()),
        }
    }
}

/// Result of a preprocess pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreprocessSummary {
    pub c_files: usize,
    pub cxx_files: usize,
    pub invocations: usize,
    pub bytes: usize,
}

/// Split files into contiguous chunks of `ceil(len / workers)`
pub fn chunk(files: &[PathBuf], workers: usize) -> Vec<&[PathBuf]> {
    let workers = workers.max(1);
    let size = ((files.len() + workers - 1) / workers).max(1);
    files.chunks(size).collect()
}

/// Runs the external preprocessor over language groups
pub struct PreprocessorRunner {
    config: PreprocessorConfig,
    workers: usize,
    pool: rayon::ThreadPool,
}

impl PreprocessorRunner {
    /// Create a runner with a pool sized to the configured worker count
    pub fn new(config: PreprocessorConfig) -> Result<Self, PreprocessError> {
        config.validate().map_err(|_| PreprocessError::NoCommand)?;

        let workers = config.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("istrdefs-pp-{}", i))
            .build()
            .map_err(|e| PreprocessError::Pool(e.to_string()))?;

        debug!("Preprocessor pool with {} workers", workers);
        Ok(Self { config, workers, pool })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn program(&self) -> &str {
        &self.config.command[0]
    }

    /// Build `command[0] command[1..] flags files`
    fn build_command(&self, flags: &[String], files: &[PathBuf]) -> Command {
        let mut cmd = Command::new(self.program());
        cmd.args(&self.config.command[1..]).args(flags).args(files);
        cmd
    }

    /// Preprocess one chunk, returning raw stdout
    fn run_chunk(&self, flags: &[String], files: &[PathBuf]) -> Result<Vec<u8>, PreprocessError> {
        debug!("Preprocessing chunk of {} files starting at {:?}", files.len(), files.first());

        let output = self
            .build_command(flags, files)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| PreprocessError::Spawn {
                program: self.program().to_string(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(PreprocessError::Failed {
                program: self.program().to_string(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        for line in stderr.lines().filter(|l| l.contains("warning:")) {
            warn!("{}", line);
        }

        Ok(output.stdout)
    }

    /// Preprocess one group; blocks until every chunk has finished
    pub fn run_group(&self, group: &LanguageGroup) -> Result<Vec<u8>, PreprocessError> {
        if group.is_empty() {
            return Ok(Vec::new());
        }

        let chunks = chunk(&group.files, self.workers);
        let outputs = self.pool.install(|| {
            chunks
                .par_iter()
                .map(|files| self.run_chunk(&group.flags, files))
                .collect::<Result<Vec<_>, _>>()
        })?;

        Ok(outputs.concat())
    }

    /// Preprocess both groups, C before C++, into one buffer
    pub fn run(&self, groups: SourceGroups) -> Result<(Vec<u8>, PreprocessSummary), PreprocessError> {
        let mut summary = PreprocessSummary {
            c_files: groups.c.len(),
            cxx_files: groups.cxx.len(),
            ..Default::default()
        };
        let mut stream = Vec::new();

        for (language, group) in groups.into_language_groups(&self.config) {
            if group.is_empty() {
                continue;
            }
            let invocations = chunk(&group.files, self.workers).len();
            info!(
                "Preprocessing {} {} files in {} invocations",
                group.files.len(),
                language,
                invocations
            );
            stream.extend(self.run_group(&group)?);
            summary.invocations += invocations;
        }

        summary.bytes = stream.len();
        Ok((stream, summary))
    }

    /// Preprocess both groups and replace `output` only if every chunk succeeded
    pub fn run_to_file(&self, groups: SourceGroups, output: &Path) -> Result<PreprocessSummary, PreprocessError> {
        if let Some(parent) = output.parent() {
            ensure_dir(parent)?;
        }

        let (stream, summary) = self.run(groups)?;
        write_atomic(output, &stream)?;
        Ok(summary)
    }
}

/// Select, classify and preprocess sources into `output`
pub fn preprocess(
    config: &PreprocessorConfig,
    selection: &SourceSelection,
    output: &Path,
) -> istrdefs_core::Result<PreprocessSummary> {
    let selected = selection.select();
    let groups = classify(selected.iter().cloned());
    debug!(
        "Selected {} of {} sources ({} C, {} C++)",
        selected.len(),
        selection.sources.len(),
        groups.c.len(),
        groups.cxx.len()
    );

    let runner = PreprocessorRunner::new(config.clone())?;
    let summary = runner.run_to_file(groups, output)?;
    info!("Wrote {} bytes of preprocessor output to {:?}", summary.bytes, output);
    Ok(summary)
}
