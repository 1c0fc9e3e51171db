//! Aggregator
//!
//! Merges every artifact of one mode into a single globally sorted list and
//! rewrites it only when its SHA-256 differs from the digest recorded by the
//! previous run. Downstream generation keys off that stability.

use crate::persist::{ensure_dir, read_optional, write_atomic};
use istrdefs_core::{AggregateReport, AggregateStatus, Mode, Result};
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Sidecar holding the digest of `merged_output`
pub fn digest_path(merged_output: &Path) -> PathBuf {
    let mut name = OsString::from(merged_output.as_os_str());
    name.push(".hash");
    PathBuf::from(name)
}

/// Lowercase hex SHA-256 of `bytes`
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Read the lines of every `*.<mode>` artifact directly inside `dir`.
///
/// Every record is newline-terminated, so only the piece after the final
/// `\n` is discarded; an empty record (`ISTR_COMPRESSED_ROM_TEXT("")`) is kept.
/// Returns the number of artifacts read alongside the lines.
pub fn collect_artifact_lines(mode: Mode, dir: &Path) -> Result<(usize, Vec<Vec<u8>>)> {
    let suffix = format!(".{}", mode.as_str());
    let mut artifacts = 0;
    let mut lines = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_artifact = entry
            .file_name()
            .to_str()
            .map(|name| name.ends_with(&suffix))
            .unwrap_or(false);
        if !is_artifact {
            continue;
        }

        let contents = fs::read(entry.path())?;
        if !contents.is_empty() {
            let body = contents.strip_suffix(b"\n").unwrap_or(&contents[..]);
            lines.extend(body.split(|b| *b == b'\n').map(|line| line.to_vec()));
        }
        artifacts += 1;
    }

    Ok((artifacts, lines))
}

/// Sort lines bytewise and join them, each newline-terminated
pub fn merge_lines(mut lines: Vec<Vec<u8>>) -> Vec<u8> {
    lines.sort();

    let mut merged = Vec::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in &lines {
        merged.extend_from_slice(line);
        merged.push(b'\n');
    }
    merged
}

/// Merge all artifacts for `mode` into `merged_output`, gated on its digest
pub fn aggregate(mode: Mode, artifact_dir: &Path, merged_output: &Path) -> Result<AggregateReport> {
    ensure_dir(artifact_dir)?;

    let (artifacts, lines) = collect_artifact_lines(mode, artifact_dir)?;
    let line_count = lines.len();
    let merged = merge_lines(lines);
    let digest = content_digest(&merged);

    let hash_file = digest_path(merged_output);
    let previous = read_optional(&hash_file)?
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string());
    debug!(
        "Merged {} lines from {} artifacts, digest {} (previous {:?})",
        line_count, artifacts, digest, previous
    );

    let status = if previous.as_deref() != Some(digest.as_str()) || !merged_output.exists() {
        if let Some(parent) = merged_output.parent() {
            ensure_dir(parent)?;
        }
        // Output first: a crash before the digest lands forces a rewrite next run.
        write_atomic(merged_output, &merged)?;
        write_atomic(&hash_file, digest.as_bytes())?;
        AggregateStatus::Updated
    } else {
        AggregateStatus::NotUpdated
    };

    info!("{} {} ({:?})", mode.display_name(), status, merged_output);
    Ok(AggregateReport {
        status,
        digest,
        artifacts,
        lines: line_count,
    })
}
