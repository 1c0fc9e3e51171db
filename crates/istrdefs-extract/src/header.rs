//! Header hand-off
//!
//! Runs the downstream header generator on the merged output and stores its
//! stdout verbatim. The header is only replaced when its bytes change.

use crate::persist::{ensure_dir, read_optional, write_atomic};
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the downstream header generator
#[derive(Debug, Error)]
pub enum HeaderToolError {
    #[error("No header tool configured")]
    NoCommand,

    #[error("Failed to run header tool {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Header tool {program} failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("IO error")]
    IoError(#[from] std::io::Error),
}

impl From<HeaderToolError> for istrdefs_core::Error {
    fn from(err: HeaderToolError) -> Self {
        match err {
            HeaderToolError::NoCommand => {
                istrdefs_core::Error::Config(HeaderToolError::NoCommand.to_string())
            }
            HeaderToolError::IoError(e) => istrdefs_core::Error::Io(e),
            other => istrdefs_core::Error::HeaderTool(other.to_string()),
        }
    }
}

/// Run `tool... <merged_output>` and write its stdout to `header`.
///
/// Returns `true` when the header was (re)written.
pub fn generate_header(tool: &[String], merged_output: &Path, header: &Path) -> Result<bool, HeaderToolError> {
    let (program, args) = match tool.split_first() {
        Some((program, args)) if !program.is_empty() => (program, args),
        _ => return Err(HeaderToolError::NoCommand),
    };

    debug!("Running {} on {:?}", program, merged_output);
    let output = Command::new(program)
        .args(args)
        .arg(merged_output)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| HeaderToolError::Spawn {
            program: program.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(HeaderToolError::Failed {
            program: program.clone(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    if read_optional(header)?.as_deref() == Some(output.stdout.as_slice()) {
        info!("Header {:?} unchanged", header);
        return Ok(false);
    }

    if let Some(parent) = header.parent() {
        ensure_dir(parent)?;
    }
    write_atomic(header, &output.stdout)?;
    info!("Generated header {:?}", header);
    Ok(true)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_header_captures_stdout() {
        let dir = TempDir::new().unwrap();
        let merged = dir.path().join("merged.h");
        fs::write(&merged, "Q(A)\nQ(B)\n").unwrap();
        let header = dir.path().join("gen/istrdefs.generated.h");

        let written = generate_header(&["cat".to_string()], &merged, &header).unwrap();
        assert!(written);
        assert_eq!(fs::read_to_string(&header).unwrap(), "Q(A)\nQ(B)\n");

        let written = generate_header(&["cat".to_string()], &merged, &header).unwrap();
        assert!(!written);
    }

    #[test]
    fn test_generate_header_failure_leaves_header() {
        let dir = TempDir::new().unwrap();
        let merged = dir.path().join("merged.h");
        fs::write(&merged, "Q(A)\n").unwrap();
        let header = dir.path().join("out.h");
        fs::write(&header, "old").unwrap();

        let tool = vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()];
        let err = generate_header(&tool, &merged, &header).unwrap_err();
        assert!(matches!(err, HeaderToolError::Failed { .. }));
        assert_eq!(fs::read_to_string(&header).unwrap(), "old");
    }

    #[test]
    fn test_generate_header_empty_tool() {
        let dir = TempDir::new().unwrap();
        let err = generate_header(&[], &dir.path().join("m"), &dir.path().join("h")).unwrap_err();
        assert!(matches!(err, HeaderToolError::NoCommand));
    }
}
